pub mod document;
pub mod engine;
pub mod error;
pub mod fs;
pub mod section;
pub mod syntax;
pub mod value;

pub use document::{Document, Newline};
pub use engine::{EditOptions, EditOutcome, IniEditor};
pub use error::{EditError, EditResult, ExitCode};
pub use section::{KeyRecord, SectionIndex, SectionRecord};
pub use syntax::{MatchPolicy, Syntax};
pub use value::{load_value, ValueSource};
