//! MIME message parsing: headers, bodies, multipart splitting and decoding

pub mod attachment;
pub mod body;
pub mod charset;
pub mod encoded_word;
pub mod headers;
pub mod multipart;
pub mod transfer;

pub use attachment::Attachment;
pub use charset::Charset;
pub use headers::{HeaderBlock, Headers};
pub use multipart::MultipartContent;
pub use transfer::{DecodeError, TransferEncoding};
