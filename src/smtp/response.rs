//! SMTP response handling

/// Represents an SMTP response that can be sent to a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpResponse {
    /// The SMTP response code (e.g., "250", "354", "501")
    pub code: String,
    /// The human-readable message
    pub message: String,
    /// Continuation lines for EHLO responses
    pub multiline: Option<Vec<String>>,
}

impl SmtpResponse {
    /// Create a new SMTP response
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            multiline: None,
        }
    }

    /// Create a new multiline SMTP response
    pub fn new_multiline(code: &str, message: &str, lines: Vec<String>) -> Self {
        Self {
            code: code.to_owned(),
            message: message.to_owned(),
            multiline: Some(lines),
        }
    }

    /// Create a success response (250 OK)
    pub fn ok() -> Self {
        Self::new("250", "OK")
    }

    /// Create a greeting response (220)
    pub fn greeting(hostname: &str, banner: &str) -> Self {
        Self::new("220", &format!("{hostname} -- {banner}"))
    }

    /// Create an EHLO response (250), offering STARTTLS when asked to
    pub fn ehlo(hostname: &str, offer_starttls: bool) -> Self {
        let mut lines = Vec::with_capacity(2);
        if offer_starttls {
            lines.push("STARTTLS".to_owned());
        }
        lines.push("OK".to_owned());

        Self::new_multiline("250", &format!("{hostname} hello there"), lines)
    }

    /// Create the reply to a blank or unreadable line (501)
    pub fn invalid_command() -> Self {
        Self::new("501", "Invalid command received")
    }

    /// Create a QUIT response (221)
    pub fn quit() -> Self {
        Self::new("221", "OK")
    }

    /// Create the rejection sent while STARTTLS is still outstanding (530)
    pub fn starttls_required() -> Self {
        Self::new("530", "Must issue a STARTTLS command first")
    }

    /// Create the rejection for STARTTLS on a listener without explicit TLS (501)
    pub fn starttls_unavailable() -> Self {
        Self::new(
            "501",
            "SMTP server not running on Explicit TLS for the STARTTLS command",
        )
    }

    /// Create the STARTTLS go-ahead (220)
    pub fn starttls_ready() -> Self {
        Self::new("220", "Ready to start TLS")
    }

    /// Create a DATA intermediate response (354)
    pub fn data_start() -> Self {
        Self::new("354", "Start mail input; end with <CR><LF>.<CR><LF>")
    }

    /// Create the rejection for a malformed DATA payload (501)
    pub fn invalid_data() -> Self {
        Self::new("501", "Invalid DATA received")
    }

    /// Create an error response from an error
    pub fn error(code: &str, message: &str) -> Self {
        Self::new(code, message)
    }

    /// Format the response for sending over the wire
    pub fn format(&self) -> String {
        if let Some(ref lines) = self.multiline {
            let mut result = format!("{}-{}\r\n", self.code, self.message);
            for (i, line) in lines.iter().enumerate() {
                if i == lines.len() - 1 {
                    // Last line uses space instead of dash
                    result.push_str(&format!("{} {}\r\n", self.code, line));
                } else {
                    result.push_str(&format!("{}-{}\r\n", self.code, line));
                }
            }
            result
        } else {
            format!("{} {}\r\n", self.code, self.message)
        }
    }

    /// Check if this is a success response (2xx)
    pub fn is_success(&self) -> bool {
        self.code.starts_with('2')
    }

    /// Check if this is an error response (4xx or 5xx)
    pub fn is_error(&self) -> bool {
        self.code.starts_with('4') || self.code.starts_with('5')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_creation() {
        let response = SmtpResponse::new("250", "OK");
        assert_eq!(response.code, "250");
        assert_eq!(response.message, "OK");
    }

    #[test]
    fn test_greeting_response() {
        let response = SmtpResponse::greeting("mail.local", "Welcome");
        assert_eq!(response.format(), "220 mail.local -- Welcome\r\n");
    }

    #[test]
    fn test_ehlo_without_starttls() {
        let response = SmtpResponse::ehlo("mail.local", false);
        assert_eq!(response.format(), "250-mail.local hello there\r\n250 OK\r\n");
    }

    #[test]
    fn test_ehlo_with_starttls() {
        let response = SmtpResponse::ehlo("mail.local", true);
        assert_eq!(
            response.format(),
            "250-mail.local hello there\r\n250-STARTTLS\r\n250 OK\r\n"
        );
    }

    #[test]
    fn test_fixed_replies() {
        assert_eq!(SmtpResponse::ok().format(), "250 OK\r\n");
        assert_eq!(SmtpResponse::quit().format(), "221 OK\r\n");
        assert_eq!(
            SmtpResponse::invalid_command().format(),
            "501 Invalid command received\r\n"
        );
        assert_eq!(
            SmtpResponse::starttls_required().format(),
            "530 Must issue a STARTTLS command first\r\n"
        );
        assert_eq!(
            SmtpResponse::starttls_unavailable().format(),
            "501 SMTP server not running on Explicit TLS for the STARTTLS command\r\n"
        );
        assert_eq!(
            SmtpResponse::starttls_ready().format(),
            "220 Ready to start TLS\r\n"
        );
        assert_eq!(
            SmtpResponse::data_start().format(),
            "354 Start mail input; end with <CR><LF>.<CR><LF>\r\n"
        );
        assert_eq!(
            SmtpResponse::invalid_data().format(),
            "501 Invalid DATA received\r\n"
        );
    }

    #[test]
    fn test_is_success() {
        assert!(SmtpResponse::ok().is_success());
        assert!(SmtpResponse::starttls_ready().is_success());
        assert!(!SmtpResponse::invalid_data().is_success());
    }

    #[test]
    fn test_is_error() {
        assert!(SmtpResponse::invalid_command().is_error());
        assert!(SmtpResponse::starttls_required().is_error());
        assert!(SmtpResponse::error("421", "Service not available").is_error());
        assert!(!SmtpResponse::data_start().is_error());
    }
}
