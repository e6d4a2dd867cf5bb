//! SMTP protocol engine and reference listener

pub mod commands;
pub mod config;
pub mod error;
pub mod message;
pub mod response;
pub mod server;
pub mod session;

pub use commands::{Command, StartType};
pub use config::{SmtpConfig, TlsMode};
pub use error::SmtpError;
pub use message::Message;
pub use response::SmtpResponse;
pub use server::SmtpServer;
pub use session::{SessionAction, SmtpSession};
