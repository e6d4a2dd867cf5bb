//! SMTP session state management
//!
//! One [`SmtpSession`] belongs to one connection. The listener feeds it the
//! bytes buffered so far: first [`SmtpSession::input_complete`] decides
//! whether a full unit has arrived, then [`SmtpSession::parse`] acts on it
//! and tells the listener what to send back.

use std::mem;
use std::sync::Arc;
use std::time::SystemTime;

use tracing::{debug, info, trace, warn};

use crate::mime::attachment::release_all;
use crate::mime::body::{extract_body, is_body_valid};
use crate::mime::charset::decode_text;
use crate::mime::encoded_word::decode_words;
use crate::mime::headers::parse_header_block;
use crate::mime::multipart::split_parts;
use crate::mime::transfer::decode_body;
use crate::mime::{Attachment, Headers};
use crate::smtp::commands::{Command, StartType, parse_address};
use crate::smtp::config::{SmtpConfig, TlsMode};
use crate::smtp::error::SmtpError;
use crate::smtp::message::Message;
use crate::smtp::response::SmtpResponse;

/// What the connection should do after [`SmtpSession::parse`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// The peer sent nothing; close without replying
    Close,
    /// Send the response
    Reply(SmtpResponse),
    /// Send the response, then hand the stream to the TLS layer and report
    /// back with [`SmtpSession::set_tls_upgraded`]
    UpgradeTls(SmtpResponse),
}

impl SessionAction {
    /// The response to write, if any
    pub fn response(&self) -> Option<&SmtpResponse> {
        match self {
            SessionAction::Close => None,
            SessionAction::Reply(response) | SessionAction::UpgradeTls(response) => Some(response),
        }
    }
}

/// Manages the state and data for a single SMTP connection
#[derive(Debug)]
pub struct SmtpSession {
    config: Arc<SmtpConfig>,
    command: Command,
    start_type: StartType,
    tls_upgraded: bool,

    from: String,
    to: Vec<String>,

    headers: Headers,
    boundary: Option<String>,
    content_type: String,
    content_encoding: String,
    subject: String,
    is_urgent: bool,
    body: String,
    raw_body: Vec<u8>,
    attachments: Vec<Attachment>,

    can_process: bool,
}

impl SmtpSession {
    /// Create a new SMTP session
    pub fn new(config: Arc<SmtpConfig>) -> Self {
        Self {
            config,
            command: Command::None,
            start_type: StartType::None,
            tls_upgraded: false,
            from: String::new(),
            to: Vec::new(),
            headers: Headers::new(),
            boundary: None,
            content_type: String::new(),
            content_encoding: String::new(),
            subject: String::new(),
            is_urgent: false,
            body: String::new(),
            raw_body: Vec::new(),
            attachments: Vec::new(),
            can_process: false,
        }
    }

    /// The 220 greeting sent when the connection opens
    pub fn greeting(&self) -> SmtpResponse {
        SmtpResponse::greeting(&self.config.hostname, &self.config.banner)
    }

    /// Whether `bytes` form a complete unit for [`SmtpSession::parse`].
    ///
    /// Outside DATA any non-empty buffer is one command. During DATA the
    /// buffer must end with `.` CR LF. Nothing is consumed.
    pub fn input_complete(&self, bytes: &[u8]) -> bool {
        if bytes.is_empty() {
            return false;
        }

        if self.command == Command::Data {
            return bytes.ends_with(b".\r\n");
        }

        true
    }

    /// Act on one complete unit of input.
    ///
    /// Protocol rejections come back as `Ok` with a 5xx reply. The only error
    /// is [`SmtpError::UnexpectedContinuation`]: a non-command line while no
    /// DATA transfer is open, after which the connection must be dropped.
    pub fn parse(&mut self, bytes: &[u8]) -> Result<SessionAction, SmtpError> {
        self.can_process = false;

        if bytes.is_empty() {
            self.command = Command::None;
            return Ok(SessionAction::Close);
        }

        let content = String::from_utf8_lossy(bytes);
        if content.trim().is_empty() {
            self.command = Command::None;
            return Ok(SessionAction::Reply(SmtpResponse::invalid_command()));
        }

        let recognised = Command::recognise(&content);
        if let Some(command) = recognised {
            debug!("SMTP {}", command.verb().unwrap_or("?"));
        }

        if !matches!(recognised, Some(Command::Quit | Command::StartTls))
            && self.start_type == StartType::Ehlo
            && self.starttls_pending()
        {
            warn!("Rejecting command before STARTTLS on explicit TLS listener");
            self.command = Command::None;
            return Ok(SessionAction::Reply(SmtpResponse::starttls_required()));
        }

        let response = match recognised {
            Some(Command::Quit) => {
                self.command = Command::Quit;
                SmtpResponse::quit()
            }
            Some(Command::Helo) => {
                self.command = Command::Helo;
                self.start_type = StartType::Helo;
                SmtpResponse::ok()
            }
            Some(Command::Ehlo) => {
                self.command = Command::Ehlo;
                self.start_type = StartType::Ehlo;
                SmtpResponse::ehlo(&self.config.hostname, self.starttls_pending())
            }
            Some(Command::StartTls) => return Ok(self.start_tls()),
            Some(Command::Reset) => {
                self.reset();
                self.command = Command::Reset;
                SmtpResponse::ok()
            }
            Some(Command::NoOp) => {
                self.command = Command::NoOp;
                SmtpResponse::ok()
            }
            Some(Command::RcptTo) => {
                self.command = Command::RcptTo;
                self.to.push(parse_address(&content));
                SmtpResponse::ok()
            }
            Some(Command::MailFrom) => {
                self.command = Command::MailFrom;
                self.from = parse_address(&content);
                self.to.clear();
                SmtpResponse::ok()
            }
            Some(Command::Data) => {
                self.command = Command::Data;
                SmtpResponse::data_start()
            }
            Some(Command::None) | None => return self.continue_command(bytes, &content),
        };

        Ok(SessionAction::Reply(response))
    }

    fn starttls_pending(&self) -> bool {
        self.config.tls_mode == TlsMode::Explicit && !self.tls_upgraded
    }

    fn start_tls(&mut self) -> SessionAction {
        if self.config.tls_mode != TlsMode::Explicit {
            warn!("STARTTLS received but listener is not running explicit TLS");
            self.command = Command::None;
            return SessionAction::Reply(SmtpResponse::starttls_unavailable());
        }

        self.reset();
        self.command = Command::StartTls;
        SessionAction::UpgradeTls(SmtpResponse::starttls_ready())
    }

    fn continue_command(&mut self, bytes: &[u8], content: &str) -> Result<SessionAction, SmtpError> {
        match self.command {
            Command::Data => Ok(self.receive_data(bytes, content)),
            command => Err(SmtpError::UnexpectedContinuation { command }),
        }
    }

    /// Materialise a complete DATA payload into headers, body and attachments.
    fn receive_data(&mut self, bytes: &[u8], content: &str) -> SessionAction {
        self.raw_body = bytes.to_vec();
        release_all(&mut self.attachments);

        let block = parse_header_block(content);
        self.headers = block.headers;
        self.boundary = block.boundary;

        self.subject = decode_words(self.headers.get_or_empty("Subject")).into_owned();
        self.is_urgent = self.headers.get_or_empty("Priority").eq_ignore_ascii_case("urgent")
            || self.headers.get_or_empty("Importance").eq_ignore_ascii_case("high");
        self.content_encoding = self.headers.get_or_empty("Content-Transfer-Encoding").to_owned();

        self.content_type = self.headers.get_or_empty("Content-Type").to_owned();
        if let Some(ref boundary) = self.boundary {
            if !self.content_type.to_ascii_lowercase().contains("boundary=") {
                let trimmed = self.content_type.trim_end_matches(';').len();
                self.content_type.truncate(trimmed);
                self.content_type.push_str(&format!("; boundary={boundary}"));
            }
        }

        if !is_body_valid(content) {
            warn!("Rejecting DATA without a terminating '.' line");
            self.command = Command::None;
            return SessionAction::Reply(SmtpResponse::invalid_data());
        }

        let raw = extract_body(content, None);
        let bytes = match decode_body(&raw, &self.content_encoding) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to decode {} message body: {e}", self.content_encoding);
                Vec::new()
            }
        };
        self.body = decode_text(&bytes, &self.content_type);

        if let Some(ref boundary) = self.boundary {
            let parts = split_parts(&raw, boundary);
            if let Some(body) = parts.body {
                self.body = body;
            }
            self.attachments = parts.attachments;
        }

        self.can_process = true;
        info!(
            "Received message from {:?} to {} recipient(s): {} bytes, {} attachment(s)",
            self.from,
            self.to.len(),
            self.raw_body.len(),
            self.attachments.len()
        );

        SessionAction::Reply(SmtpResponse::ok())
    }

    /// Clear the envelope, message and greeting state.
    pub fn reset(&mut self) {
        trace!("Session reset");

        self.can_process = false;
        self.headers.clear();
        self.from.clear();
        self.to.clear();
        self.body.clear();
        self.raw_body = Vec::new();
        self.command = Command::None;
        self.boundary = None;
        self.content_type.clear();
        self.content_encoding.clear();
        self.subject.clear();
        self.is_urgent = false;
        self.start_type = StartType::None;
        release_all(&mut self.attachments);
    }

    /// Release the message buffers. Safe to call more than once, including
    /// in the middle of a DATA transfer.
    pub fn dispose(&mut self) {
        self.can_process = false;
        self.raw_body = Vec::new();
        self.body.clear();
        release_all(&mut self.attachments);
    }

    /// Hand off the completed message, if there is one.
    ///
    /// The session keeps its greeting and moves to [`Command::Reset`] so the
    /// next input is framed as a command again.
    pub fn take_message(&mut self) -> Option<Message> {
        if !self.is_processable() {
            return None;
        }

        let message = Message {
            from: mem::take(&mut self.from),
            to: mem::take(&mut self.to),
            headers: mem::take(&mut self.headers),
            subject: mem::take(&mut self.subject),
            is_urgent: mem::replace(&mut self.is_urgent, false),
            content_type: mem::take(&mut self.content_type),
            content_encoding: mem::take(&mut self.content_encoding),
            boundary: self.boundary.take(),
            body: mem::take(&mut self.body),
            raw_body: mem::take(&mut self.raw_body),
            attachments: mem::take(&mut self.attachments),
            timestamp: SystemTime::now(),
        };

        self.can_process = false;
        self.command = Command::Reset;
        Some(message)
    }

    /// Record that the transport finished the TLS handshake
    pub fn set_tls_upgraded(&mut self) {
        self.tls_upgraded = true;
    }

    pub fn is_tls_upgraded(&self) -> bool {
        self.tls_upgraded
    }

    pub fn tls_mode(&self) -> TlsMode {
        self.config.tls_mode
    }

    /// The connection should be closed (no command yet, rejected, or QUIT)
    pub fn close_immediately(&self) -> bool {
        matches!(self.command, Command::None | Command::Quit)
    }

    /// A DATA payload has just been parsed and is ready for delivery
    pub fn is_processable(&self) -> bool {
        !self.close_immediately() && self.can_process && self.command == Command::Data
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn start_type(&self) -> StartType {
        self.start_type
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &[String] {
        &self.to
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn boundary(&self) -> Option<&str> {
        self.boundary.as_deref()
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn content_encoding(&self) -> &str {
        &self.content_encoding
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn is_urgent(&self) -> bool {
        self.is_urgent
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn raw_body(&self) -> &[u8] {
        &self.raw_body
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }
}

impl Default for SmtpSession {
    fn default() -> Self {
        Self::new(Arc::new(SmtpConfig::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;

    fn session_with(tls_mode: TlsMode) -> SmtpSession {
        SmtpSession::new(Arc::new(
            SmtpConfig::new("test.local").with_tls_mode(tls_mode),
        ))
    }

    fn reply(session: &mut SmtpSession, input: &str) -> String {
        match session.parse(input.as_bytes()).unwrap() {
            SessionAction::Reply(response) => response.format(),
            other => panic!("unexpected action {other:?}"),
        }
    }

    fn open_data(session: &mut SmtpSession) {
        reply(session, "HELO client.local\r\n");
        reply(session, "MAIL FROM:<sender@example.com>\r\n");
        reply(session, "RCPT TO:<recipient@example.com>\r\n");
        assert_eq!(reply(session, "DATA\r\n"), "354 Start mail input; end with <CR><LF>.<CR><LF>\r\n");
    }

    fn multipart_payload(attachment: &[u8]) -> String {
        format!(
            "From: sender@example.com\r\n\
             Subject: Files\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: multipart/mixed; boundary=\"xyz\"\r\n\
             \r\n\
             --xyz\r\n\
             Content-Type: text/plain\r\n\
             \r\n\
             Hi\r\n\
             --xyz\r\n\
             Content-Type: text/plain; name=\"f.txt\"\r\n\
             Content-Disposition: attachment; filename=\"f.txt\"\r\n\
             Content-Transfer-Encoding: base64\r\n\
             \r\n\
             {}\r\n\
             --xyz--\r\n\
             .\r\n",
            STANDARD.encode(attachment)
        )
    }

    #[test]
    fn test_new_session() {
        let session = SmtpSession::default();
        assert_eq!(session.command(), Command::None);
        assert_eq!(session.start_type(), StartType::None);
        assert!(session.to().is_empty());
        assert!(session.headers().is_empty());
        assert!(session.close_immediately());
        assert!(!session.is_processable());
    }

    #[test]
    fn test_greeting() {
        let session = SmtpSession::new(Arc::new(SmtpConfig::new("mx.local").with_banner("Hello")));
        assert_eq!(session.greeting().format(), "220 mx.local -- Hello\r\n");

        let session = SmtpSession::new(Arc::new(SmtpConfig::new("mx.local")));
        assert_eq!(
            session.greeting().format(),
            "220 mx.local -- Postern SMTP Server\r\n"
        );
    }

    #[test]
    fn test_input_complete_outside_data() {
        let session = SmtpSession::default();
        assert!(!session.input_complete(b""));
        assert!(session.input_complete(b"N"));
        assert!(session.input_complete(b"HELO client.local\r\n"));
    }

    #[test]
    fn test_input_complete_during_data() {
        let mut session = SmtpSession::default();
        open_data(&mut session);

        assert!(!session.input_complete(b""));
        assert!(!session.input_complete(b".\r"));
        assert!(!session.input_complete(b"Subject: Hi\r\n"));
        assert!(!session.input_complete(b"Hello\r\n.\r\nmore"));
        assert!(session.input_complete(b".\r\n"));
        assert!(session.input_complete(b"Subject: Hi\r\n\r\nHello\r\n.\r\n"));
    }

    #[test]
    fn test_zero_length_input_closes() {
        let mut session = SmtpSession::default();
        reply(&mut session, "HELO client.local\r\n");

        assert_eq!(session.parse(b"").unwrap(), SessionAction::Close);
        assert_eq!(session.command(), Command::None);
        assert!(session.close_immediately());
    }

    #[test]
    fn test_blank_line_rejected() {
        let mut session = SmtpSession::default();
        assert_eq!(reply(&mut session, "   \r\n"), "501 Invalid command received\r\n");
        assert_eq!(session.command(), Command::None);
    }

    #[test]
    fn test_simple_commands() {
        let mut session = SmtpSession::default();

        assert_eq!(reply(&mut session, "helo client.local\r\n"), "250 OK\r\n");
        assert_eq!(session.command(), Command::Helo);
        assert_eq!(session.start_type(), StartType::Helo);

        assert_eq!(reply(&mut session, "NoOp\r\n"), "250 OK\r\n");
        assert_eq!(session.command(), Command::NoOp);

        assert_eq!(reply(&mut session, "mail from:<a@example.com>\r\n"), "250 OK\r\n");
        assert_eq!(session.command(), Command::MailFrom);
        assert_eq!(session.from(), "a@example.com");

        assert_eq!(reply(&mut session, "RCPT TO:<b@example.com>\r\n"), "250 OK\r\n");
        assert_eq!(reply(&mut session, "rcpt to: <c@example.com>\r\n"), "250 OK\r\n");
        assert_eq!(session.command(), Command::RcptTo);
        assert_eq!(session.to(), ["b@example.com", "c@example.com"]);

        assert_eq!(reply(&mut session, "QUIT\r\n"), "221 OK\r\n");
        assert_eq!(session.command(), Command::Quit);
        assert!(session.close_immediately());
    }

    #[test]
    fn test_mail_from_starts_new_envelope() {
        let mut session = SmtpSession::default();
        reply(&mut session, "MAIL FROM:<a@example.com>\r\n");
        reply(&mut session, "RCPT TO:<b@example.com>\r\n");
        reply(&mut session, "MAIL FROM:<c@example.com>\r\n");

        assert_eq!(session.from(), "c@example.com");
        assert!(session.to().is_empty());
    }

    #[test]
    fn test_ehlo_plain() {
        let mut session = session_with(TlsMode::None);
        assert_eq!(
            reply(&mut session, "EHLO client.local\r\n"),
            "250-test.local hello there\r\n250 OK\r\n"
        );
        assert_eq!(session.command(), Command::Ehlo);
        assert_eq!(session.start_type(), StartType::Ehlo);

        // No STARTTLS requirement without explicit TLS
        assert_eq!(reply(&mut session, "MAIL FROM:<a@example.com>\r\n"), "250 OK\r\n");
    }

    #[test]
    fn test_ehlo_offers_starttls() {
        let mut session = session_with(TlsMode::Explicit);
        assert_eq!(
            reply(&mut session, "EHLO client.local\r\n"),
            "250-test.local hello there\r\n250-STARTTLS\r\n250 OK\r\n"
        );
    }

    #[test]
    fn test_starttls_required_after_ehlo() {
        let mut session = session_with(TlsMode::Explicit);
        reply(&mut session, "EHLO client.local\r\n");

        assert_eq!(
            reply(&mut session, "MAIL FROM:<a@example.com>\r\n"),
            "530 Must issue a STARTTLS command first\r\n"
        );
        assert_eq!(session.command(), Command::None);
        assert_eq!(session.from(), "");

        // QUIT is always honoured
        assert_eq!(reply(&mut session, "QUIT\r\n"), "221 OK\r\n");
    }

    #[test]
    fn test_helo_does_not_require_starttls() {
        let mut session = session_with(TlsMode::Explicit);
        reply(&mut session, "HELO client.local\r\n");
        assert_eq!(reply(&mut session, "MAIL FROM:<a@example.com>\r\n"), "250 OK\r\n");
    }

    #[test]
    fn test_starttls_rejected_without_explicit_tls() {
        for mode in [TlsMode::None, TlsMode::Implicit] {
            let mut session = session_with(mode);
            reply(&mut session, "EHLO client.local\r\n");
            assert_eq!(
                reply(&mut session, "STARTTLS\r\n"),
                "501 SMTP server not running on Explicit TLS for the STARTTLS command\r\n"
            );
            assert_eq!(session.command(), Command::None);
        }
    }

    #[test]
    fn test_starttls_upgrade() {
        let mut session = session_with(TlsMode::Explicit);
        reply(&mut session, "EHLO client.local\r\n");

        let action = session.parse(b"starttls\r\n").unwrap();
        assert_eq!(action, SessionAction::UpgradeTls(SmtpResponse::starttls_ready()));
        assert_eq!(action.response().map(|r| r.format()), Some("220 Ready to start TLS\r\n".to_owned()));
        assert_eq!(session.command(), Command::StartTls);
        assert_eq!(session.start_type(), StartType::None);
        assert!(!session.is_processable());

        session.set_tls_upgraded();
        assert!(session.is_tls_upgraded());

        assert_eq!(
            reply(&mut session, "EHLO client.local\r\n"),
            "250-test.local hello there\r\n250 OK\r\n"
        );
        assert_eq!(reply(&mut session, "MAIL FROM:<a@example.com>\r\n"), "250 OK\r\n");
    }

    #[test]
    fn test_continuation_outside_data_is_fatal() {
        let mut session = SmtpSession::default();
        reply(&mut session, "HELO client.local\r\n");

        let result = session.parse(b"Subject: Hi\r\n");
        assert!(matches!(
            result,
            Err(SmtpError::UnexpectedContinuation { command: Command::Helo })
        ));

        let mut fresh = SmtpSession::default();
        assert!(matches!(
            fresh.parse(b"GARBAGE\r\n"),
            Err(SmtpError::UnexpectedContinuation { command: Command::None })
        ));
    }

    #[test]
    fn test_simple_message() {
        let mut session = SmtpSession::default();
        open_data(&mut session);

        let payload = "Subject: Hi\r\nContent-Type: text/plain\r\n\r\nHello\r\n.\r\n";
        assert_eq!(reply(&mut session, payload), "250 OK\r\n");

        assert_eq!(session.command(), Command::Data);
        assert!(session.is_processable());
        assert_eq!(session.subject(), "Hi");
        assert_eq!(session.body(), "Hello");
        assert_eq!(session.content_type(), "text/plain");
        assert!(session.attachments().is_empty());
        assert!(session.boundary().is_none());
        assert_eq!(session.raw_body(), payload.as_bytes());
        assert_eq!(session.headers().get("subject"), Some("Hi"));
    }

    #[test]
    fn test_multipart_message() {
        let mut session = SmtpSession::default();
        open_data(&mut session);

        let source = b"attachment bytes \x00\x01\xff";
        assert_eq!(reply(&mut session, &multipart_payload(source)), "250 OK\r\n");

        assert!(session.is_processable());
        assert_eq!(session.boundary(), Some("xyz"));
        assert_eq!(session.content_type(), "multipart/mixed; boundary=\"xyz\"");
        assert_eq!(session.body(), "Hi");
        assert_eq!(session.attachments().len(), 1);
        assert_eq!(session.attachments()[0].name, "f.txt");
        assert_eq!(session.attachments()[0].content(), source);
    }

    #[test]
    fn test_boundary_appended_to_content_type() {
        let mut session = SmtpSession::default();
        open_data(&mut session);

        let payload = "Content-Type: multipart/mixed;\r\n\
                       X-Layout: boundary=\"b1\"\r\n\
                       \r\n\
                       --b1\r\n\
                       Content-Type: text/plain\r\n\
                       \r\n\
                       part\r\n\
                       --b1--\r\n\
                       .\r\n";
        reply(&mut session, payload);

        assert_eq!(session.boundary(), Some("b1"));
        assert_eq!(session.content_type(), "multipart/mixed; boundary=b1");
        assert_eq!(session.body(), "part");
    }

    #[test]
    fn test_urgency_headers() {
        let mut session = SmtpSession::default();
        open_data(&mut session);
        reply(&mut session, "Priority: Urgent\r\n\r\nx\r\n.\r\n");
        assert!(session.is_urgent());

        let mut session = SmtpSession::default();
        open_data(&mut session);
        reply(&mut session, "Importance: HIGH\r\n\r\nx\r\n.\r\n");
        assert!(session.is_urgent());

        let mut session = SmtpSession::default();
        open_data(&mut session);
        reply(&mut session, "Importance: low\r\n\r\nx\r\n.\r\n");
        assert!(!session.is_urgent());
        assert_eq!(session.subject(), "");
    }

    #[test]
    fn test_quoted_printable_latin1_body() {
        let mut session = SmtpSession::default();
        open_data(&mut session);
        reply(
            &mut session,
            "Content-Type: text/plain; charset=iso-8859-1\r\n\
             Content-Transfer-Encoding: quoted-printable\r\n\
             \r\n\
             Caf=E9\r\n\
             .\r\n",
        );

        assert_eq!(session.body(), "Café");
        assert_eq!(session.content_encoding(), "quoted-printable");
    }

    #[test]
    fn test_malformed_base64_body_keeps_session() {
        let mut session = SmtpSession::default();
        open_data(&mut session);
        assert_eq!(
            reply(
                &mut session,
                "Content-Transfer-Encoding: base64\r\n\r\n@@@ not base64 @@@\r\n.\r\n"
            ),
            "250 OK\r\n"
        );

        assert!(session.is_processable());
        assert_eq!(session.body(), "");
    }

    #[test]
    fn test_encoded_subject() {
        let mut session = SmtpSession::default();
        open_data(&mut session);
        reply(&mut session, "Subject: =?utf-8?B?Q2Fmw6k=?=\r\n\r\nx\r\n.\r\n");
        assert_eq!(session.subject(), "Café");
    }

    #[test]
    fn test_invalid_data_rejected() {
        let mut session = SmtpSession::default();
        open_data(&mut session);

        assert_eq!(
            reply(&mut session, "Subject: Hi\r\n\r\nNo terminator here.\r\n"),
            "501 Invalid DATA received\r\n"
        );
        assert_eq!(session.command(), Command::None);
        assert!(!session.is_processable());
    }

    #[test]
    fn test_processable_only_right_after_data() {
        let mut session = SmtpSession::default();
        open_data(&mut session);
        assert!(!session.is_processable());

        reply(&mut session, "Subject: Hi\r\n\r\nHello\r\n.\r\n");
        assert!(session.is_processable());

        reply(&mut session, "NOOP\r\n");
        assert!(!session.is_processable());
    }

    #[test]
    fn test_rset_clears_state() {
        let mut session = SmtpSession::default();
        open_data(&mut session);
        reply(&mut session, &multipart_payload(b"data"));
        assert_eq!(session.attachments().len(), 1);

        assert_eq!(reply(&mut session, "RSET\r\n"), "250 OK\r\n");
        assert_eq!(session.command(), Command::Reset);
        assert_eq!(session.start_type(), StartType::None);
        assert_eq!(session.from(), "");
        assert!(session.to().is_empty());
        assert!(session.headers().is_empty());
        assert_eq!(session.body(), "");
        assert!(session.raw_body().is_empty());
        assert!(session.attachments().is_empty());
        assert!(session.boundary().is_none());
        assert_eq!(session.subject(), "");
        assert!(!session.is_processable());
        assert!(!session.close_immediately());
    }

    #[test]
    fn test_new_data_replaces_attachments() {
        let mut session = SmtpSession::default();
        open_data(&mut session);
        reply(&mut session, &multipart_payload(b"first"));

        reply(&mut session, "DATA\r\n");
        reply(&mut session, "Subject: Plain\r\n\r\nJust text\r\n.\r\n");

        assert!(session.attachments().is_empty());
        assert!(session.boundary().is_none());
        assert_eq!(session.body(), "Just text");
    }

    #[test]
    fn test_take_message() {
        let mut session = SmtpSession::default();
        assert!(session.take_message().is_none());

        open_data(&mut session);
        reply(&mut session, &multipart_payload(b"data"));

        let message = session.take_message().unwrap();
        assert_eq!(message.from, "sender@example.com");
        assert_eq!(message.to, vec!["recipient@example.com"]);
        assert_eq!(message.subject, "Files");
        assert_eq!(message.body, "Hi");
        assert_eq!(message.attachments.len(), 1);
        assert_eq!(message.boundary.as_deref(), Some("xyz"));

        assert_eq!(session.command(), Command::Reset);
        assert_eq!(session.start_type(), StartType::Helo);
        assert!(!session.is_processable());
        assert!(session.attachments().is_empty());
        assert!(session.take_message().is_none());
        assert!(session.input_complete(b"QUIT\r\n"));
    }

    #[test]
    fn test_dispose_twice() {
        let mut session = SmtpSession::default();
        open_data(&mut session);
        reply(&mut session, &multipart_payload(b"data"));

        session.dispose();
        session.dispose();

        assert!(session.attachments().is_empty());
        assert!(session.raw_body().is_empty());
        assert_eq!(session.body(), "");
        assert!(!session.is_processable());
    }

    #[test]
    fn test_dispose_mid_data() {
        let mut session = SmtpSession::default();
        open_data(&mut session);
        session.dispose();
        assert_eq!(session.command(), Command::Data);
        assert!(session.attachments().is_empty());
    }
}
