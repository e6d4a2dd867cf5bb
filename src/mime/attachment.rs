//! File attachments split out of multipart messages

/// A decoded file attachment owned by its session or message.
///
/// The content buffer is released explicitly with [`Attachment::release`];
/// releasing twice is harmless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name taken from the part's `name=` (or `filename=`) parameter
    pub name: String,
    /// The part's `Content-Type` header value
    pub content_type: String,
    /// The part's `Content-Transfer-Encoding` header value
    pub content_encoding: String,
    content: Vec<u8>,
    released: bool,
}

impl Attachment {
    /// Create a new attachment from already decoded bytes
    pub fn new(name: String, content: Vec<u8>, content_type: String, content_encoding: String) -> Self {
        Self {
            name,
            content_type,
            content_encoding,
            content,
            released: false,
        }
    }

    /// The decoded attachment bytes (empty once released)
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Size of the decoded content in bytes
    pub fn size(&self) -> usize {
        self.content.len()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Free the content buffer.
    pub fn release(&mut self) {
        self.content = Vec::new();
        self.released = true;
    }

    /// Consume the attachment and return its content
    pub fn into_content(self) -> Vec<u8> {
        self.content
    }
}

/// Release every attachment in `attachments` and leave it empty.
pub(crate) fn release_all(attachments: &mut Vec<Attachment>) {
    for attachment in attachments.iter_mut() {
        attachment.release();
    }
    attachments.clear();
}
