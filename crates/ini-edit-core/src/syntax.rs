use crate::error::{EditError, EditResult};

pub const DEFAULT_MARKERS: &[char] = &[';', '#', '/'];
pub const DEFAULT_WRITE_MARKER: char = ';';

/// Comment marker configuration: which characters introduce a commented
/// line, and which one is emitted when this tool comments a line itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syntax {
    markers: Vec<char>,
    write_marker: char,
}

impl Syntax {
    pub fn new(markers: Vec<char>, write_marker: char) -> EditResult<Self> {
        if markers.is_empty() {
            return Err(EditError::InvalidArguments(
                "at least one comment marker is required".to_string(),
            ));
        }

        for marker in &markers {
            validate_marker(*marker)?;
        }

        if !markers.contains(&write_marker) {
            return Err(EditError::InvalidArguments(format!(
                "write marker '{write_marker}' must be one of the configured markers"
            )));
        }

        Ok(Self {
            markers,
            write_marker,
        })
    }

    pub fn markers(&self) -> &[char] {
        &self.markers
    }

    pub fn write_marker(&self) -> char {
        self.write_marker
    }

    pub fn is_marker(&self, ch: char) -> bool {
        self.markers.contains(&ch)
    }

    /// True for blank lines and lines whose first non-whitespace character
    /// is a comment marker.
    pub fn is_blank_or_comment(&self, line: &str) -> bool {
        let trimmed = line.trim();
        trimmed.is_empty() || trimmed.starts_with(|ch| self.is_marker(ch))
    }

    pub fn is_comment(&self, line: &str) -> bool {
        line.trim_start().starts_with(|ch| self.is_marker(ch))
    }

    /// Strips leading and trailing marker characters and whitespace. Used to
    /// inspect the structure hiding behind a comment prefix, never to decide
    /// what gets written back.
    pub fn logical_content<'a>(&self, line: &'a str) -> &'a str {
        line.trim_matches(|ch: char| ch.is_whitespace() || self.is_marker(ch))
    }

    /// Recognizes `[name]` in the marker-stripped form of a line. Returns the
    /// trimmed inner name, or `None` when the line is not a section header.
    /// Malformed headers are plain content, never an error.
    pub fn section_name<'a>(&self, line: &'a str) -> Option<&'a str> {
        let content = self.logical_content(line);
        let inner = content.strip_prefix('[')?.strip_suffix(']')?;
        if inner.contains(']') {
            return None;
        }
        Some(inner.trim())
    }

    /// Splits `content` at the first `=` into a trimmed key and value.
    pub fn split_pair<'a>(&self, content: &'a str) -> Option<(&'a str, &'a str)> {
        let eq = content.find('=')?;
        let key = content[..eq].trim();
        let value = content[eq + 1..].trim();
        Some((key, value))
    }

    pub fn canonical_header(&self, name: &str) -> String {
        format!("[{name}]")
    }

    pub fn canonical_pair(&self, key: &str, value: &str) -> String {
        format!("{key} = {value}")
    }

    pub fn commented_header(&self, name: &str) -> String {
        format!("{} [{name}]", self.write_marker)
    }

    pub fn commented_pair(&self, key: &str, value: &str) -> String {
        format!("{} {key} = {value}", self.write_marker)
    }
}

impl Default for Syntax {
    fn default() -> Self {
        Self {
            markers: DEFAULT_MARKERS.to_vec(),
            write_marker: DEFAULT_WRITE_MARKER,
        }
    }
}

fn validate_marker(ch: char) -> EditResult<()> {
    if ch.is_alphanumeric() || ch.is_whitespace() || matches!(ch, '[' | ']' | '=') {
        return Err(EditError::InvalidArguments(format!(
            "'{ch}' cannot be used as a comment marker"
        )));
    }
    Ok(())
}

/// How section and key names are compared during lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchPolicy {
    #[default]
    Exact,
    IgnoreCase,
}

impl MatchPolicy {
    pub fn matches(self, candidate: &str, wanted: &str) -> bool {
        match self {
            MatchPolicy::Exact => candidate == wanted,
            MatchPolicy::IgnoreCase => candidate.eq_ignore_ascii_case(wanted),
        }
    }
}
