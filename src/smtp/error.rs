//! Error types for the SMTP engine

use thiserror::Error;

use crate::smtp::commands::Command;

#[derive(Error, Debug)]
pub enum SmtpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A line that is not a command arrived while no DATA transfer was open.
    /// The session cannot continue.
    #[error("Continuation line received outside of DATA (last command: {command:?})")]
    UnexpectedContinuation { command: Command },

    #[error("TLS upgrade requested on a transport without TLS support")]
    TlsUnavailable,

    #[error("Too much mail data (max {max} bytes)")]
    TooMuchData { max: usize },
}

/// Maps SMTP errors to appropriate response codes
impl SmtpError {
    pub fn to_response_code(&self) -> &'static str {
        match self {
            SmtpError::Io(_) => "421",
            SmtpError::UnexpectedContinuation { .. } => "500",
            SmtpError::TlsUnavailable => "454",
            SmtpError::TooMuchData { .. } => "552",
        }
    }

    pub fn to_response_message(&self) -> String {
        match self {
            SmtpError::Io(_) => "Service not available".to_string(),
            SmtpError::UnexpectedContinuation { .. } => "Bad sequence of commands".to_string(),
            SmtpError::TlsUnavailable => "TLS not available".to_string(),
            SmtpError::TooMuchData { max } => format!("Too much mail data (max {max} bytes)"),
        }
    }

    /// Whether the connection must be dropped without a reply
    pub fn is_fatal(&self) -> bool {
        matches!(self, SmtpError::UnexpectedContinuation { .. } | SmtpError::Io(_))
    }
}
