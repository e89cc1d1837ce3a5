/// Line terminator style detected when a document is parsed and reused when
/// it is rendered back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Newline {
    Lf,
    CrLf,
}

impl Newline {
    pub fn as_str(self) -> &'static str {
        match self {
            Newline::Lf => "\n",
            Newline::CrLf => "\r\n",
        }
    }
}

/// An ordered sequence of raw lines plus the detail needed to re-serialize
/// them byte-for-byte: the terminator flavor and whether the original text
/// ended with a final newline.
#[derive(Debug, Clone)]
pub struct Document {
    lines: Vec<String>,
    newline: Newline,
    trailing_newline: bool,
}

impl Document {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            newline: Newline::Lf,
            trailing_newline: true,
        }
    }

    pub fn parse(text: &str) -> Self {
        let newline = if text.contains("\r\n") {
            Newline::CrLf
        } else {
            Newline::Lf
        };
        let trailing_newline = text.is_empty() || text.ends_with('\n');

        let mut lines = Vec::new();
        let mut rest = text;
        while !rest.is_empty() {
            match rest.find('\n') {
                Some(pos) => {
                    let mut line = &rest[..pos];
                    if line.ends_with('\r') {
                        line = &line[..line.len() - 1];
                    }
                    lines.push(line.to_string());
                    rest = &rest[pos + 1..];
                }
                None => {
                    lines.push(rest.to_string());
                    rest = "";
                }
            }
        }

        Self {
            lines,
            newline,
            trailing_newline,
        }
    }

    pub fn render(&self) -> String {
        let mut output = String::new();
        for (index, line) in self.lines.iter().enumerate() {
            if index > 0 {
                output.push_str(self.newline.as_str());
            }
            output.push_str(line);
        }

        if self.trailing_newline && !self.lines.is_empty() {
            output.push_str(self.newline.as_str());
        }

        output
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> &str {
        &self.lines[index]
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn newline(&self) -> Newline {
        self.newline
    }

    pub fn replace(&mut self, index: usize, line: String) {
        self.lines[index] = line;
    }

    /// Inserts before `index`; an index at or past the end appends instead,
    /// so callers can pass an extent end without a bounds check.
    pub fn insert(&mut self, index: usize, line: String) {
        if index >= self.lines.len() {
            self.lines.push(line);
        } else {
            self.lines.insert(index, line);
        }
    }

    pub fn push(&mut self, line: String) {
        self.lines.push(line);
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_lf_text() {
        let text = "[core]\nname = demo\n";
        let document = Document::parse(text);
        assert_eq!(document.len(), 2);
        assert_eq!(document.render(), text);
    }

    #[test]
    fn round_trips_crlf_text() {
        let text = "[core]\r\nname = demo\r\n";
        let document = Document::parse(text);
        assert_eq!(document.newline(), Newline::CrLf);
        assert_eq!(document.line(1), "name = demo");
        assert_eq!(document.render(), text);
    }

    #[test]
    fn preserves_missing_final_newline() {
        let text = "[core]\nname = demo";
        let document = Document::parse(text);
        assert_eq!(document.render(), text);
    }

    #[test]
    fn empty_text_renders_empty() {
        let document = Document::parse("");
        assert!(document.is_empty());
        assert_eq!(document.render(), "");
    }

    #[test]
    fn insert_past_end_appends() {
        let mut document = Document::parse("a\n");
        document.insert(10, "b".to_string());
        assert_eq!(document.render(), "a\nb\n");
    }

    #[test]
    fn replace_swaps_single_line() {
        let mut document = Document::parse("a\nb\nc\n");
        document.replace(1, "B".to_string());
        assert_eq!(document.render(), "a\nB\nc\n");
    }
}
