//! SMTP command recognition

/// The last command a session acted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Command {
    /// Nothing yet, or the last line was rejected / the peer went away
    #[default]
    None,
    Helo,
    Ehlo,
    StartTls,
    Reset,
    NoOp,
    RcptTo,
    MailFrom,
    Data,
    Quit,
}

/// How the client greeted the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartType {
    #[default]
    None,
    Helo,
    Ehlo,
}

/// Command prefixes in dispatch order
const VERBS: [(&str, Command); 9] = [
    ("QUIT", Command::Quit),
    ("HELO", Command::Helo),
    ("EHLO", Command::Ehlo),
    ("STARTTLS", Command::StartTls),
    ("RSET", Command::Reset),
    ("NOOP", Command::NoOp),
    ("RCPT TO", Command::RcptTo),
    ("MAIL FROM", Command::MailFrom),
    ("DATA", Command::Data),
];

impl Command {
    /// Recognise the command a line starts with (case-insensitive).
    ///
    /// Returns `None` for blank lines and for anything that is not a known
    /// command prefix, such as DATA payload text.
    pub fn recognise(line: &str) -> Option<Command> {
        if line.trim().is_empty() {
            return None;
        }

        VERBS
            .iter()
            .find(|(verb, _)| starts_with_ignore_case(line, verb))
            .map(|&(_, command)| command)
    }

    /// The command's wire verb
    pub fn verb(&self) -> Option<&'static str> {
        VERBS
            .iter()
            .find(|(_, command)| command == self)
            .map(|&(verb, _)| verb)
    }
}

fn starts_with_ignore_case(line: &str, prefix: &str) -> bool {
    line.len() >= prefix.len()
        && line.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Extract the mailbox from a `MAIL FROM:` or `RCPT TO:` line.
///
/// Everything after the first colon is taken, whitespace trimmed and the
/// angle brackets removed. Parameters after a bracketed path are dropped.
pub fn parse_address(line: &str) -> String {
    let Some((_, rest)) = line.split_once(':') else {
        return String::new();
    };
    let rest = rest.trim();

    if let Some(path) = rest.strip_prefix('<') {
        if let Some(end) = path.find('>') {
            return path[..end].trim().to_owned();
        }
    }

    rest.trim_matches(|c: char| c == '<' || c == '>' || c.is_whitespace())
        .to_owned()
}
