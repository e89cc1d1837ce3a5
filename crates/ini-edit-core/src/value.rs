use std::io::{self, Read};
use std::path::PathBuf;

use crate::error::{EditError, EditResult};

/// Where a value to be written comes from. Inline text is used verbatim;
/// file and stdin sources lose one trailing line terminator so that
/// `echo value | ini-edit ... --value-from -` writes `value`, not a
/// two-line rejection.
#[derive(Debug, Clone)]
pub enum ValueSource {
    File(PathBuf),
    Stdin,
    Inline(String),
}

pub fn load_value(source: ValueSource) -> EditResult<String> {
    match source {
        ValueSource::File(path) => {
            let content = std::fs::read_to_string(&path).map_err(|err| {
                EditError::InvalidValue(format!(
                    "failed to read value file '{}': {err}",
                    path.display()
                ))
            })?;
            single_line(trim_terminator(content))
        }
        ValueSource::Stdin => {
            let mut buffer = String::new();
            let mut handle = io::stdin();
            handle.read_to_string(&mut buffer).map_err(|err| {
                EditError::InvalidValue(format!("failed to read value from stdin: {err}"))
            })?;
            single_line(trim_terminator(buffer))
        }
        ValueSource::Inline(raw) => single_line(raw),
    }
}

fn trim_terminator(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}

fn single_line(value: String) -> EditResult<String> {
    if value.contains(['\n', '\r']) {
        return Err(EditError::InvalidValue(
            "value must not span multiple lines".to_string(),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_value_is_used_verbatim() {
        let value = load_value(ValueSource::Inline("  spaced  ".into())).unwrap();
        assert_eq!(value, "  spaced  ");
    }

    #[test]
    fn rejects_multiline_values() {
        let err = load_value(ValueSource::Inline("one\ntwo".into())).unwrap_err();
        assert!(matches!(err, EditError::InvalidValue(_)));
    }

    #[test]
    fn terminator_trim_drops_one_newline() {
        assert_eq!(trim_terminator("value\n".into()), "value");
        assert_eq!(trim_terminator("value\r\n".into()), "value");
        assert_eq!(trim_terminator("value".into()), "value");
        assert_eq!(trim_terminator("value\n\n".into()), "value\n");
    }

    #[test]
    fn file_source_reads_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("value.txt");
        std::fs::write(&path, "from-file\n").unwrap();

        let value = load_value(ValueSource::File(path)).unwrap();
        assert_eq!(value, "from-file");

        let missing = load_value(ValueSource::File(dir.path().join("absent.txt")));
        assert!(matches!(missing, Err(EditError::InvalidValue(_))));
    }
}
