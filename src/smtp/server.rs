//! SMTP server implementation

use crate::smtp::commands::Command;
use crate::smtp::config::{SmtpConfig, TlsMode};
use crate::smtp::error::SmtpError;
use crate::smtp::message::Message;
use crate::smtp::response::SmtpResponse;
use crate::smtp::session::{SessionAction, SmtpSession};

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, mpsc};
use std::thread;

use tracing::{debug, error, info, warn};

/// Blocking SMTP listener that delivers parsed messages to a channel.
///
/// Each connection runs on its own thread with its own [`SmtpSession`].
/// This listener has no TLS layer: a STARTTLS upgrade ends the connection
/// after the 220 reply, and [`TlsMode::Implicit`] is refused at start.
#[derive(Debug, Clone)]
pub struct SmtpServer {
    config: Arc<SmtpConfig>,
}

impl SmtpServer {
    /// Create a new SMTP server
    pub fn new(config: SmtpConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &SmtpConfig {
        &self.config
    }

    /// Start the server on the specified address (blocking)
    /// Messages will be sent to the provided channel as they are received
    pub fn start(&self, addr: &str, sender: mpsc::Sender<Message>) -> Result<(), SmtpError> {
        let listener = TcpListener::bind(addr)?;
        self.start_with_listener(listener, sender)
    }

    /// Start the server with an existing listener (blocking)
    /// Messages will be sent to the provided channel as they are received
    pub fn start_with_listener(
        &self,
        listener: TcpListener,
        sender: mpsc::Sender<Message>,
    ) -> Result<(), SmtpError> {
        if self.config.tls_mode == TlsMode::Implicit {
            error!("Implicit TLS requested but this listener has no TLS layer");
            return Err(SmtpError::TlsUnavailable);
        }

        info!("SMTP server listening on {}", listener.local_addr()?);

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let config = Arc::clone(&self.config);
                    let sender = sender.clone();
                    thread::spawn(move || {
                        match handle_client(stream, config, &sender) {
                            Err(e) if e.is_fatal() => error!("Error handling client: {e}"),
                            Err(e) => warn!("Client session ended: {e}"),
                            Ok(()) => {}
                        }
                    });
                }
                Err(e) => {
                    warn!("Error accepting connection: {e}");
                }
            }
        }

        Ok(())
    }
}

/// Drive one connection to completion, then release the session buffers
fn handle_client(
    stream: TcpStream,
    config: Arc<SmtpConfig>,
    sender: &mpsc::Sender<Message>,
) -> Result<(), SmtpError> {
    let peer = stream.peer_addr()?;
    info!("Accepted connection from {peer}");

    let mut session = SmtpSession::new(Arc::clone(&config));
    let result = serve(stream, &mut session, config.max_data_size, sender);
    session.dispose();

    info!("Closed connection from {peer}");
    result
}

fn serve(
    mut stream: TcpStream,
    session: &mut SmtpSession,
    max_data_size: usize,
    sender: &mpsc::Sender<Message>,
) -> Result<(), SmtpError> {
    let mut reader = BufReader::new(stream.try_clone()?);

    send_response(&mut stream, &session.greeting())?;

    let mut buffer = Vec::new();
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            // Peer closed the connection
            session.parse(&[])?;
            return Ok(());
        }

        buffer.extend_from_slice(&line);
        if buffer.len() > max_data_size {
            let e = SmtpError::TooMuchData { max: max_data_size };
            warn!("{e}");
            send_response(
                &mut stream,
                &SmtpResponse::error(e.to_response_code(), &e.to_response_message()),
            )?;
            return Err(e);
        }

        // A DATA payload only ends on a bare "." line
        let awaiting_terminator = session.command() == Command::Data && line != b".\r\n";
        if awaiting_terminator || !session.input_complete(&buffer) {
            continue;
        }

        let action = session.parse(&buffer);
        buffer.clear();

        match action? {
            SessionAction::Close => return Ok(()),
            SessionAction::Reply(response) => {
                if response.is_error() {
                    debug!("Rejected input with {}", response.code);
                }
                send_response(&mut stream, &response)?;
            }
            SessionAction::UpgradeTls(response) => {
                send_response(&mut stream, &response)?;
                return Err(SmtpError::TlsUnavailable);
            }
        }

        if let Some(message) = session.take_message() {
            debug!("Delivering message from {:?}", message.from);
            // Errors when there are no listeners.
            // We ignore these errors for now.
            let _ = sender.send(message);
        }

        if session.command() == Command::Quit {
            return Ok(());
        }
    }
}

/// Send a response to the client
fn send_response(stream: &mut TcpStream, response: &SmtpResponse) -> Result<(), SmtpError> {
    stream.write_all(response.format().as_bytes())?;
    stream.flush()?;
    Ok(())
}
