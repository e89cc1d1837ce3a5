use std::ops::Range;

use crate::document::Document;
use crate::syntax::{MatchPolicy, Syntax};

/// One section header line. `commented` distinguishes a disabled header
/// (`; [cache]`) from a live one.
#[derive(Debug, Clone)]
pub struct SectionRecord {
    pub name: String,
    pub line: usize,
    pub commented: bool,
}

/// One `key = value` line inside a section extent. For commented records the
/// name and value come from the marker-stripped form of the line.
#[derive(Debug, Clone)]
pub struct KeyRecord {
    pub name: String,
    pub value: String,
    pub line: usize,
    pub commented: bool,
}

/// Flat list of every section header in document order, commented headers
/// included. Rebuilt from scratch after every mutation; line numbers in the
/// records are only valid against the document they were built from.
#[derive(Debug, Clone, Default)]
pub struct SectionIndex {
    records: Vec<SectionRecord>,
}

impl SectionIndex {
    pub fn build(document: &Document, syntax: &Syntax) -> Self {
        let mut records = Vec::new();

        for (line_idx, line) in document.lines().iter().enumerate() {
            if let Some(name) = syntax.section_name(line) {
                records.push(SectionRecord {
                    name: name.to_string(),
                    line: line_idx,
                    commented: syntax.is_comment(line),
                });
            }
        }

        Self { records }
    }

    pub fn records(&self) -> &[SectionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&self, index: usize) -> &SectionRecord {
        &self.records[index]
    }

    /// First record whose name matches, commented or not. Callers decide
    /// whether a commented hit counts.
    pub fn find(&self, name: &str, policy: MatchPolicy) -> Option<usize> {
        self.records
            .iter()
            .position(|record| policy.matches(&record.name, name))
    }

    /// Half-open line range of the section body: from the line after the
    /// header up to the next header of any kind, or the end of the document.
    pub fn extent(&self, index: usize, document_len: usize) -> Range<usize> {
        let start = self.records[index].line + 1;
        let end = self
            .records
            .get(index + 1)
            .map(|next| next.line)
            .unwrap_or(document_len);
        start..end
    }
}

/// First key in the extent whose name matches, active or commented.
pub fn find_key(
    document: &Document,
    syntax: &Syntax,
    extent: Range<usize>,
    key: &str,
    policy: MatchPolicy,
) -> Option<KeyRecord> {
    for line_idx in extent {
        let Some(record) = parse_key_line(document, syntax, line_idx) else {
            continue;
        };
        if policy.matches(&record.name, key) {
            return Some(record);
        }
    }
    None
}

/// All key records in the extent, in document order.
pub fn keys_in(document: &Document, syntax: &Syntax, extent: Range<usize>) -> Vec<KeyRecord> {
    extent
        .filter_map(|line_idx| parse_key_line(document, syntax, line_idx))
        .collect()
}

fn parse_key_line(document: &Document, syntax: &Syntax, line_idx: usize) -> Option<KeyRecord> {
    let line = document.line(line_idx);
    if line.trim().is_empty() || syntax.section_name(line).is_some() {
        return None;
    }

    let commented = syntax.is_comment(line);
    let content = if commented {
        syntax.logical_content(line)
    } else {
        line.trim()
    };

    let (name, value) = syntax.split_pair(content)?;
    Some(KeyRecord {
        name: name.to_string(),
        value: value.to_string(),
        line: line_idx,
        commented,
    })
}

/// Line index at which a new key should be inserted: directly after the last
/// non-blank line of the extent, so trailing blank separators stay below the
/// new entry. An empty extent inserts directly after the header.
pub fn insertion_line(document: &Document, extent: Range<usize>) -> usize {
    let mut idx = extent.end;
    while idx > extent.start {
        if !document.line(idx - 1).trim().is_empty() {
            return idx;
        }
        idx -= 1;
    }
    extent.start
}

/// True while the extent still holds at least one active line that is
/// neither blank, commented, nor a header.
pub fn has_active_content(document: &Document, syntax: &Syntax, extent: Range<usize>) -> bool {
    extent.into_iter().any(|line_idx| {
        let line = document.line(line_idx);
        !syntax.is_blank_or_comment(line) && syntax.section_name(line).is_none()
    })
}
