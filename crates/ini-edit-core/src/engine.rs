use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use similar::TextDiff;

use crate::document::Document;
use crate::error::{EditError, EditResult};
use crate::fs::write_atomic;
use crate::section::{
    find_key, has_active_content, insertion_line, keys_in, KeyRecord, SectionIndex, SectionRecord,
};
use crate::syntax::{MatchPolicy, Syntax};

#[derive(Debug, Clone)]
pub struct EditOptions {
    pub syntax: Syntax,
    pub policy: MatchPolicy,
    pub dry_run: bool,
    pub backup: bool,
}

impl Default for EditOptions {
    fn default() -> Self {
        Self {
            syntax: Syntax::default(),
            policy: MatchPolicy::Exact,
            dry_run: false,
            backup: true,
        }
    }
}

#[derive(Debug)]
pub struct EditOutcome {
    pub changed: bool,
    pub diff: Option<String>,
    pub result: String,
}

/// Handle over one INI file. Reads answer from the in-memory document;
/// mutations rewrite the touched lines, rebuild the section index and
/// persist the result, leaving every unrelated line byte-for-byte intact.
pub struct IniEditor {
    path: PathBuf,
    document: Document,
    index: SectionIndex,
    options: EditOptions,
    file_existed: bool,
}

impl IniEditor {
    /// Opens `path` for editing. A missing file yields an empty document:
    /// reads against it fail, toggles no-op, writes create the file.
    pub fn open(path: impl Into<PathBuf>, options: EditOptions) -> EditResult<Self> {
        let path = path.into();
        let (document, file_existed) = match std::fs::read_to_string(&path) {
            Ok(text) => (Document::parse(&text), true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => (Document::new(), false),
            Err(err) => return Err(err.into()),
        };
        let index = SectionIndex::build(&document, &options.syntax);

        Ok(Self {
            path,
            document,
            index,
            options,
            file_existed,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn is_backed(&self) -> bool {
        self.file_existed
    }

    /// Every section header in document order, commented ones included.
    pub fn sections(&self) -> &[SectionRecord] {
        self.index.records()
    }

    /// All key records of an active section, in document order. Commented
    /// records are included and carry their flag so callers can render
    /// disabled entries distinctly.
    pub fn keys(&self, section: &str) -> EditResult<Vec<KeyRecord>> {
        self.require_backed()?;
        let section_idx = self.active_section(section)?;
        let extent = self.index.extent(section_idx, self.document.len());
        Ok(keys_in(&self.document, &self.options.syntax, extent))
    }

    /// Strict read: the file, the section and the key must all exist and be
    /// active. A commented section or key is treated as absent.
    pub fn read_value(&self, section: &str, key: &str) -> EditResult<String> {
        self.require_backed()?;
        let section_idx = self.active_section(section)?;
        let extent = self.index.extent(section_idx, self.document.len());

        match find_key(
            &self.document,
            &self.options.syntax,
            extent,
            key,
            self.options.policy,
        ) {
            Some(record) if !record.commented => Ok(record.value),
            _ => Err(EditError::KeyNotFound {
                section: section.to_string(),
                key: key.to_string(),
            }),
        }
    }

    /// Default read: any failure, including a missing file, falls back to
    /// `default` without reporting an error.
    pub fn read_value_or(&self, section: &str, key: &str, default: &str) -> String {
        self.read_value(section, key)
            .unwrap_or_else(|_| default.to_string())
    }

    /// Bulk read of every active pair, grouped per section. Sections and
    /// keys come out sorted; duplicate names keep their first occurrence,
    /// and duplicate section names merge.
    pub fn read_all(&self) -> EditResult<BTreeMap<String, BTreeMap<String, String>>> {
        self.require_backed()?;

        let mut sections: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for (idx, record) in self.index.records().iter().enumerate() {
            if record.commented {
                continue;
            }

            let extent = self.index.extent(idx, self.document.len());
            let entries = sections.entry(record.name.clone()).or_default();
            for key in keys_in(&self.document, &self.options.syntax, extent) {
                if key.commented {
                    continue;
                }
                entries.entry(key.name).or_insert(key.value);
            }
        }

        Ok(sections)
    }

    /// Sets `key` to `value`, touching as little as possible: an existing
    /// key line (active or commented) is rewritten in place, a missing key
    /// is inserted after the section's last non-blank line, and a missing
    /// section is appended at the end of the document. A commented section
    /// header is reactivated before the key is written.
    pub fn write_value(&mut self, section: &str, key: &str, value: &str) -> EditResult<EditOutcome> {
        let before = self.document.render();

        match self.index.find(section, self.options.policy) {
            None => {
                let header = self.options.syntax.canonical_header(section);
                let pair = self.options.syntax.canonical_pair(key, value);
                self.document.push(header);
                self.document.push(pair);
            }
            Some(section_idx) => {
                if self.index.record(section_idx).commented {
                    // Rewriting the header in place shifts no lines, so the
                    // stale index extents stay valid below.
                    let record = self.index.record(section_idx);
                    let header = self.options.syntax.canonical_header(&record.name);
                    let header_line = record.line;
                    self.document.replace(header_line, header);
                }

                let extent = self.index.extent(section_idx, self.document.len());
                let pair = self.options.syntax.canonical_pair(key, value);
                match find_key(
                    &self.document,
                    &self.options.syntax,
                    extent.clone(),
                    key,
                    self.options.policy,
                ) {
                    Some(existing) => self.document.replace(existing.line, pair),
                    None => {
                        let at = insertion_line(&self.document, extent);
                        self.document.insert(at, pair);
                    }
                }
            }
        }

        self.finish(before)
    }

    /// Comments out an active key by rewriting its line with the write
    /// marker. When that leaves the section without any active content the
    /// header is commented out as well. Missing file, section or key, and
    /// already-commented targets, are silent no-ops.
    pub fn comment_key(&mut self, section: &str, key: &str) -> EditResult<EditOutcome> {
        if !self.file_existed {
            return Ok(self.unchanged());
        }

        let Some(section_idx) = self.index.find(section, self.options.policy) else {
            return Ok(self.unchanged());
        };
        if self.index.record(section_idx).commented {
            return Ok(self.unchanged());
        }

        let extent = self.index.extent(section_idx, self.document.len());
        let Some(record) = find_key(
            &self.document,
            &self.options.syntax,
            extent.clone(),
            key,
            self.options.policy,
        ) else {
            return Ok(self.unchanged());
        };
        if record.commented {
            return Ok(self.unchanged());
        }

        let before = self.document.render();
        let disabled = self
            .options
            .syntax
            .commented_pair(&record.name, &record.value);
        self.document.replace(record.line, disabled);

        if !has_active_content(&self.document, &self.options.syntax, extent) {
            let header = self.index.record(section_idx);
            let disabled_header = self.options.syntax.commented_header(&header.name);
            let header_line = header.line;
            self.document.replace(header_line, disabled_header);
        }

        self.finish(before)
    }

    fn require_backed(&self) -> EditResult<()> {
        if self.file_existed {
            Ok(())
        } else {
            Err(EditError::FileMissing {
                path: self.path.clone(),
            })
        }
    }

    fn active_section(&self, section: &str) -> EditResult<usize> {
        match self.index.find(section, self.options.policy) {
            Some(idx) if !self.index.record(idx).commented => Ok(idx),
            _ => Err(EditError::SectionNotFound {
                section: section.to_string(),
            }),
        }
    }

    fn unchanged(&self) -> EditOutcome {
        EditOutcome {
            changed: false,
            diff: None,
            result: self.document.render(),
        }
    }

    fn finish(&mut self, before: String) -> EditResult<EditOutcome> {
        self.index = SectionIndex::build(&self.document, &self.options.syntax);

        let result = self.document.render();
        if result == before {
            return Ok(EditOutcome {
                changed: false,
                diff: None,
                result,
            });
        }

        let diff = build_diff(&before, &result, &self.path);

        if !self.options.dry_run {
            write_atomic(&self.path, &result, self.options.backup)?;
            self.file_existed = true;
        }

        Ok(EditOutcome {
            changed: true,
            diff,
            result,
        })
    }
}

fn build_diff(original: &str, modified: &str, path: &Path) -> Option<String> {
    if original == modified {
        return None;
    }

    let name = path.display();
    let old_header = format!("a/{name}");
    let new_header = format!("b/{name}");

    let diff = TextDiff::from_lines(original, modified);
    let mut unified = diff.unified_diff();
    unified.header(&old_header, &new_header);
    Some(unified.to_string())
}
