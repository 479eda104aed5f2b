//! Line model for shell-style configuration files
//!
//! A `ConfigLine` owns the exact raw text of one physical line and a derived
//! classification. Nothing here strips quotes from values; that is left to
//! the grammar handlers.

use std::fmt;

/// Classification of one physical line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Empty or whitespace-only
    Blank,
    /// Full-line comment; text without the leading `#`, trimmed
    Comment(String),
    /// `key=value` with an optional trailing `# comment`
    Assignment {
        key: String,
        value: String,
        inline_comment: Option<String>,
    },
    /// Text with no unquoted `=`; kept verbatim, never indexed
    Other,
}

/// Quote tracking for the comment splitter
///
/// An opening quote is remembered so only the same character closes it. A
/// quote that never closes leaves the scanner `Inside` until the end of the
/// line, which means no `#` after it is treated as a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QuoteState {
    Outside,
    Inside(char),
}

impl QuoteState {
    pub(crate) fn advance(self, ch: char, escaped: bool) -> Self {
        if escaped {
            return self;
        }
        match self {
            QuoteState::Outside if ch == '"' || ch == '\'' => QuoteState::Inside(ch),
            QuoteState::Inside(open) if ch == open => QuoteState::Outside,
            state => state,
        }
    }
}

/// Byte offsets of the first unquoted `=` and `#` in a line
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Delimiters {
    pub equals: Option<usize>,
    pub hash: Option<usize>,
}

pub(crate) fn scan_delimiters(text: &str) -> Delimiters {
    let mut state = QuoteState::Outside;
    let mut previous = None;
    let mut found = Delimiters::default();

    for (offset, ch) in text.char_indices() {
        let escaped = previous == Some('\\');
        if state == QuoteState::Outside && !escaped {
            match ch {
                '=' if found.equals.is_none() => found.equals = Some(offset),
                '#' => {
                    found.hash = Some(offset);
                    break;
                }
                _ => {}
            }
        }
        state = state.advance(ch, escaped);
        previous = Some(ch);
    }

    found
}

/// One physical line of a configuration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLine {
    raw: String,
    number: usize,
    kind: LineKind,
}

impl ConfigLine {
    /// Classify a raw line (including its trailing newline, if any)
    pub fn parse(raw: impl Into<String>, number: usize) -> Self {
        let raw = raw.into();
        let kind = classify(&raw);
        Self { raw, number, kind }
    }

    /// Build a fresh assignment line
    pub fn assignment(key: &str, value: &str, comment: Option<&str>, number: usize) -> Self {
        Self {
            raw: render_assignment(key, value, comment),
            number,
            kind: LineKind::Assignment {
                key: key.to_string(),
                value: value.to_string(),
                inline_comment: comment.map(str::to_string),
            },
        }
    }

    /// Build a full-line comment
    pub fn comment(text: &str, number: usize) -> Self {
        Self {
            raw: format!("# {}\n", text),
            number,
            kind: LineKind::Comment(text.trim().to_string()),
        }
    }

    /// Build an empty line
    pub fn blank(number: usize) -> Self {
        Self {
            raw: "\n".to_string(),
            number,
            kind: LineKind::Blank,
        }
    }

    /// Exact text of the line as it will be written
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// 1-based position in the document
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn kind(&self) -> &LineKind {
        &self.kind
    }

    pub fn key(&self) -> Option<&str> {
        match &self.kind {
            LineKind::Assignment { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Value as written, quotes included
    pub fn value(&self) -> Option<&str> {
        match &self.kind {
            LineKind::Assignment { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn inline_comment(&self) -> Option<&str> {
        match &self.kind {
            LineKind::Assignment { inline_comment, .. } => inline_comment.as_deref(),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self.kind, LineKind::Blank)
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, LineKind::Comment(_))
    }

    pub fn is_assignment(&self) -> bool {
        matches!(self.kind, LineKind::Assignment { .. })
    }

    /// Replace the value (and the inline comment, when one is given)
    ///
    /// Returns false and leaves the raw text alone when nothing would change.
    /// Otherwise the raw text is regenerated from key, value and comment.
    pub(crate) fn update(&mut self, new_value: &str, new_comment: Option<&str>) -> bool {
        let LineKind::Assignment {
            key,
            value,
            inline_comment,
        } = &mut self.kind
        else {
            return false;
        };

        let comment_unchanged = new_comment.map_or(true, |c| inline_comment.as_deref() == Some(c));
        if value.as_str() == new_value && comment_unchanged {
            return false;
        }

        *value = new_value.to_string();
        if let Some(c) = new_comment {
            *inline_comment = Some(c.to_string());
        }
        self.raw = render_assignment(key, value, inline_comment.as_deref());
        true
    }

    pub(crate) fn set_number(&mut self, number: usize) {
        self.number = number;
    }

    pub(crate) fn ends_with_newline(&self) -> bool {
        self.raw.ends_with('\n')
    }

    /// Give a final unterminated line its newline before another is appended
    pub(crate) fn terminate(&mut self) {
        if !self.ends_with_newline() {
            self.raw.push('\n');
        }
    }
}

impl fmt::Display for ConfigLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LineKind::Assignment { key, value, .. } => {
                write!(f, "{}: {}={}", self.number, key, value)
            }
            _ => write!(f, "{}: {}", self.number, self.raw.trim_end()),
        }
    }
}

fn render_assignment(key: &str, value: &str, comment: Option<&str>) -> String {
    match comment {
        Some(c) => format!("{}={}  # {}\n", key, value, c),
        None => format!("{}={}\n", key, value),
    }
}

fn classify(raw: &str) -> LineKind {
    let stripped = raw.trim();

    if stripped.is_empty() {
        return LineKind::Blank;
    }

    if let Some(text) = stripped.strip_prefix('#') {
        return LineKind::Comment(text.trim().to_string());
    }

    let delimiters = scan_delimiters(stripped);
    let content_end = delimiters.hash.unwrap_or(stripped.len());

    match delimiters.equals {
        Some(eq) if eq < content_end => {
            let key = stripped[..eq].trim();
            if key.is_empty() {
                return LineKind::Other;
            }
            LineKind::Assignment {
                key: key.to_string(),
                value: stripped[eq + 1..content_end].trim().to_string(),
                inline_comment: delimiters
                    .hash
                    .map(|h| stripped[h + 1..].trim().to_string()),
            }
        }
        _ => LineKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines() {
        assert!(ConfigLine::parse("\n", 1).is_blank());
        assert!(ConfigLine::parse("   \t\n", 1).is_blank());
        assert!(ConfigLine::parse("", 1).is_blank());
    }

    #[test]
    fn test_comment_line() {
        let line = ConfigLine::parse("   #  Network setup  \n", 3);
        assert_eq!(line.kind(), &LineKind::Comment("Network setup".into()));
        assert_eq!(line.number(), 3);
        assert!(line.key().is_none());
    }

    #[test]
    fn test_simple_assignment_keeps_quotes() {
        let line = ConfigLine::parse("hostname=\"freebsd.local\"\n", 1);
        assert_eq!(line.key(), Some("hostname"));
        assert_eq!(line.value(), Some("\"freebsd.local\""));
        assert_eq!(line.inline_comment(), None);
    }

    #[test]
    fn test_inline_comment_split() {
        let line = ConfigLine::parse("hostname=\"box\"  # Main hostname\n", 1);
        assert_eq!(line.value(), Some("\"box\""));
        assert_eq!(line.inline_comment(), Some("Main hostname"));
    }

    #[test]
    fn test_hash_inside_quotes_is_not_comment() {
        let line = ConfigLine::parse("ifconfig_em0=\"inet 10.0.0.1 # not a comment\"\n", 1);
        assert_eq!(line.value(), Some("\"inet 10.0.0.1 # not a comment\""));
        assert_eq!(line.inline_comment(), None);
    }

    #[test]
    fn test_single_quotes_protect_hash() {
        let line = ConfigLine::parse("motd='a#b' # trailing\n", 1);
        assert_eq!(line.value(), Some("'a#b'"));
        assert_eq!(line.inline_comment(), Some("trailing"));
    }

    #[test]
    fn test_mixed_quotes_only_close_on_same_char() {
        let line = ConfigLine::parse("x=\"it's # still quoted\" # real\n", 1);
        assert_eq!(line.value(), Some("\"it's # still quoted\""));
        assert_eq!(line.inline_comment(), Some("real"));
    }

    #[test]
    fn test_unbalanced_quote_swallows_rest_of_line() {
        let line = ConfigLine::parse("broken=\"oops # no close\n", 1);
        assert_eq!(line.key(), Some("broken"));
        assert_eq!(line.value(), Some("\"oops # no close"));
        assert_eq!(line.inline_comment(), None);
    }

    #[test]
    fn test_escaped_quote_does_not_toggle() {
        let line = ConfigLine::parse("x=\\\"a # b\n", 1);
        assert_eq!(line.value(), Some("\\\"a"));
        assert_eq!(line.inline_comment(), Some("b"));
    }

    #[test]
    fn test_hash_before_equals_is_other() {
        let line = ConfigLine::parse("word # key=value\n", 1);
        assert_eq!(line.kind(), &LineKind::Other);
    }

    #[test]
    fn test_text_without_equals_is_other() {
        let line = ConfigLine::parse("network={\n", 1);
        assert_eq!(line.kind(), &LineKind::Other);
        assert_eq!(line.raw(), "network={\n");
    }

    #[test]
    fn test_empty_key_is_other() {
        assert_eq!(ConfigLine::parse("=value\n", 1).kind(), &LineKind::Other);
    }

    #[test]
    fn test_value_split_on_first_equals() {
        let line = ConfigLine::parse("  ifconfig_em0 = \"a=b\"\n", 1);
        assert_eq!(line.key(), Some("ifconfig_em0"));
        assert_eq!(line.value(), Some("\"a=b\""));
    }

    #[test]
    fn test_raw_preserved_exactly() {
        let raw = "  sshd_enable =  \"YES\"   #  keep   spacing\r\n";
        let line = ConfigLine::parse(raw, 1);
        assert_eq!(line.raw(), raw);
    }

    #[test]
    fn test_update_regenerates_raw() {
        let mut line = ConfigLine::parse("hostname=\"old\"  # primary\n", 1);
        assert!(line.update("\"new\"", None));
        assert_eq!(line.raw(), "hostname=\"new\"  # primary\n");

        assert!(line.update("\"new\"", Some("renamed")));
        assert_eq!(line.raw(), "hostname=\"new\"  # renamed\n");
    }

    #[test]
    fn test_update_same_value_is_noop() {
        let raw = "  hostname = \"same\"\n";
        let mut line = ConfigLine::parse(raw, 1);
        assert!(!line.update("\"same\"", None));
        assert_eq!(line.raw(), raw);
    }

    #[test]
    fn test_quote_state_machine() {
        let state = QuoteState::Outside.advance('"', false);
        assert_eq!(state, QuoteState::Inside('"'));
        assert_eq!(state.advance('\'', false), QuoteState::Inside('"'));
        assert_eq!(state.advance('"', true), QuoteState::Inside('"'));
        assert_eq!(state.advance('"', false), QuoteState::Outside);
    }

    #[test]
    fn test_display() {
        let line = ConfigLine::parse("a=1\n", 4);
        assert_eq!(line.to_string(), "4: a=1");
        let comment = ConfigLine::parse("# hi\n", 5);
        assert_eq!(comment.to_string(), "5: # hi");
    }
}
