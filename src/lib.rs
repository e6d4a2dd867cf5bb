//! # Postern
//!
//! Postern is an embeddable SMTP session engine with MIME message parsing.
//!
//! The core is [`SmtpSession`], a per-connection state machine that is fed
//! raw bytes and answers with the reply to send. It owns no socket, so it
//! can sit behind any transport. [`SmtpServer`] is a small blocking TCP
//! listener built on top of it.
//!
//! ## Quick Start
//!
//! ```rust
//! use postern::{SmtpConfig, SmtpServer};
//! use std::sync::mpsc;
//! use std::thread;
//! use std::time::Duration;
//!
//! // Create and start server
//! let (tx, rx) = mpsc::channel();
//! let server = SmtpServer::new(SmtpConfig::new("test.local"));
//!
//! thread::spawn(move || {
//!     let _ = server.start("127.0.0.1:2525", tx);
//! });
//!
//! // Application sends email to localhost:2525
//! // ...
//!
//! // Check the contents of the received message
//! if let Ok(message) = rx.recv_timeout(Duration::from_millis(100)) {
//!     println!("Received {:?} from: {}", message.subject, message.from);
//! }
//! ```
//!
//! ## Driving a session directly
//!
//! ```rust
//! use postern::{SessionAction, SmtpConfig, SmtpSession};
//! use std::sync::Arc;
//!
//! let mut session = SmtpSession::new(Arc::new(SmtpConfig::new("mx.local")));
//! for input in ["HELO client\r\n", "MAIL FROM:<a@b.c>\r\n", "RCPT TO:<d@e.f>\r\n", "DATA\r\n"] {
//!     assert!(session.input_complete(input.as_bytes()));
//!     session.parse(input.as_bytes()).unwrap();
//! }
//!
//! let data = b"Subject: Hi\r\n\r\nHello\r\n.\r\n";
//! assert!(session.input_complete(data));
//! let action = session.parse(data).unwrap();
//! assert!(matches!(action, SessionAction::Reply(ref r) if r.code == "250"));
//!
//! let message = session.take_message().unwrap();
//! assert_eq!(message.body, "Hello");
//! ```
//!
//! ## Supported SMTP commands
//!
//! - `HELO` / `EHLO` - Identify the sender
//! - `STARTTLS` - Upgrade the connection (explicit TLS listeners only)
//! - `MAIL FROM` - Specify the sender's address
//! - `RCPT TO` - Specify the destination (multiple destinations are supported)
//! - `DATA` - Send the message
//! - `RSET` - Reset the session
//! - `NOOP` - Do nothing
//! - `QUIT` - Close connection
//!
//! ## MIME handling
//!
//! Received messages are split into headers, a decoded text body and
//! attachments. Base64 and quoted-printable transfer encodings are decoded,
//! text is converted from UTF-7, UTF-8, UTF-16, UTF-32, ASCII or any
//! `charset=` label known to `encoding_rs`, and RFC 2047 encoded words in
//! the subject and attachment names are decoded.
//!
//! ## Notes
//!
//! - Runs in-memory only. Message persistence is not supported.
//! - SMTP authentication is not supported.
//! - The bundled listener has no TLS layer. Embedders that need TLS drive
//!   [`SmtpSession`] themselves and act on [`SessionAction::UpgradeTls`].
//! - Mail relay is not supported.

pub mod mime;
mod smtp;

pub use smtp::{
    Command, Message, SessionAction, SmtpConfig, SmtpError, SmtpResponse, SmtpServer, SmtpSession,
    StartType, TlsMode,
};
