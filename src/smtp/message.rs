//! Parsed message handed off by a session

use std::time::SystemTime;

use crate::mime::{Attachment, Headers};

/// A fully parsed message received by the SMTP engine
#[derive(Debug, Clone)]
pub struct Message {
    /// The sender's email address
    pub from: String,

    /// List of recipient email addresses
    pub to: Vec<String>,

    pub headers: Headers,

    /// Decoded `Subject` header
    pub subject: String,

    /// Set by `Priority: urgent` or `Importance: high`
    pub is_urgent: bool,

    /// Top-level `Content-Type`, including the boundary of a multipart message
    pub content_type: String,

    /// Top-level `Content-Transfer-Encoding`
    pub content_encoding: String,

    /// Multipart boundary, if the message had one
    pub boundary: Option<String>,

    /// Decoded text of the primary message part
    pub body: String,

    /// The DATA payload exactly as received
    pub raw_body: Vec<u8>,

    pub attachments: Vec<Attachment>,

    /// When the message was received by the server
    pub timestamp: SystemTime,
}

impl Message {
    /// Check if this message was sent to a specific recipient
    pub fn has_recipient(&self, recipient: &str) -> bool {
        self.to.iter().any(|addr| addr == recipient)
    }

    /// Check if this message was sent from a specific sender
    pub fn is_from_sender(&self, sender: &str) -> bool {
        self.from == sender
    }

    /// Get the size of the raw DATA payload in bytes
    pub fn data_size(&self) -> usize {
        self.raw_body.len()
    }

    /// Look up a header value (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Find an attachment by file name
    pub fn attachment(&self, name: &str) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.name == name)
    }

    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }

    /// Check if the decoded body contains a specific text
    pub fn contains_text(&self, text: &str) -> bool {
        self.body.contains(text)
    }
}
