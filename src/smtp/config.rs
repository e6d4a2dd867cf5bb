//! Listener configuration shared by every session

/// How TLS is offered on a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsMode {
    /// Plaintext only
    #[default]
    None,
    /// The connection is encrypted from the first byte
    Implicit,
    /// Plaintext until the client issues STARTTLS
    Explicit,
}

/// Immutable per-listener settings injected into each session
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// Server hostname used in the greeting and EHLO reply
    pub hostname: String,
    /// Greeting banner shown after the hostname
    pub banner: String,
    pub tls_mode: TlsMode,
    /// Largest buffered command or DATA payload the listener accepts, in bytes
    pub max_data_size: usize,
}

impl SmtpConfig {
    pub const DEFAULT_BANNER: &'static str = "Postern SMTP Server";

    /// 10MB
    pub const DEFAULT_MAX_DATA_SIZE: usize = 10 * 1024 * 1024;

    /// Create a configuration with default banner, no TLS and default limits
    pub fn new(hostname: &str) -> Self {
        Self {
            hostname: hostname.to_owned(),
            banner: Self::DEFAULT_BANNER.to_owned(),
            tls_mode: TlsMode::None,
            max_data_size: Self::DEFAULT_MAX_DATA_SIZE,
        }
    }

    /// Replace the greeting banner. A blank banner keeps the default.
    pub fn with_banner(mut self, banner: &str) -> Self {
        if !banner.trim().is_empty() {
            self.banner = banner.to_owned();
        }
        self
    }

    pub fn with_tls_mode(mut self, tls_mode: TlsMode) -> Self {
        self.tls_mode = tls_mode;
        self
    }

    pub fn with_max_data_size(mut self, max_data_size: usize) -> Self {
        self.max_data_size = max_data_size;
        self
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self::new("localhost")
    }
}
