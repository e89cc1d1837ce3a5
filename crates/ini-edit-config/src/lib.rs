//! Settings primitives and loader for the ini-edit toolkit.
//!
//! Settings resolve through a precedence stack:
//! override flag → working directory → git root → built-in defaults.
//! Parsed values are normalised into the core engine's typed `Syntax` and
//! `MatchPolicy` so downstream crates never touch raw TOML.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ini_edit_core::syntax::{DEFAULT_MARKERS, DEFAULT_WRITE_MARKER};
use ini_edit_core::{MatchPolicy, Syntax};
use serde::Deserialize;
use thiserror::Error;

const SETTINGS_FILE_NAME: &str = ".ini-edit.toml";

/// Complete settings resolved from defaults and on-disk layers.
#[derive(Clone, Debug)]
pub struct Settings {
    pub syntax: Syntax,
    pub policy: MatchPolicy,
    pub backup: bool,
    pub sources: SettingsSources,
}

/// Provenance information for resolved settings.
#[derive(Clone, Debug)]
pub struct SettingsSources {
    pub working_directory: PathBuf,
    pub layers: Vec<SettingsSource>,
}

/// Specific layer of settings (default/git/local/override).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SettingsSource {
    pub kind: SettingsSourceKind,
    pub path: Option<PathBuf>,
}

impl SettingsSource {
    fn built_in() -> Self {
        SettingsSource {
            kind: SettingsSourceKind::Default,
            path: None,
        }
    }

    fn for_file(kind: SettingsSourceKind, path: PathBuf) -> Self {
        SettingsSource {
            kind,
            path: Some(path),
        }
    }

    pub fn describe(&self) -> String {
        match (&self.kind, &self.path) {
            (SettingsSourceKind::Default, _) => "built-in defaults".to_owned(),
            (kind, Some(path)) => format!("{} at {}", kind, path.display()),
            (kind, None) => kind.to_string(),
        }
    }
}

/// Kinds of settings sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SettingsSourceKind {
    Default,
    GitRoot,
    Local,
    Override,
}

impl fmt::Display for SettingsSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SettingsSourceKind::Default => "defaults",
            SettingsSourceKind::GitRoot => "git-root settings",
            SettingsSourceKind::Local => "local settings",
            SettingsSourceKind::Override => "override settings",
        };
        f.write_str(label)
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }
}

/// Errors surfaced while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to resolve working directory {}: {source}", .attempted.display())]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override settings {} not found", .path.display())]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read settings {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse settings {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("settings validation failed:\n{0}")]
    Validation(SettingsValidationErrors),
}

impl Settings {
    /// Loads settings using the precedence rules and returns typed values.
    pub fn load(options: LoadOptions) -> Result<Self, SettingsError> {
        let working_dir = resolve_working_dir(options.working_dir)?;
        let override_path = options
            .override_path
            .map(|path| make_absolute(&path, &working_dir));

        if let Some(path) = &override_path {
            if !path.exists() {
                return Err(SettingsError::OverrideNotFound { path: path.clone() });
            }
        }

        let default_source = SettingsSource::built_in();
        let mut merged = defaults_layer(default_source.clone());
        let mut source_layers = vec![default_source];

        let git_root = find_git_root(&working_dir);
        let git_settings_path = git_root.as_ref().map(|root| root.join(SETTINGS_FILE_NAME));
        let local_settings_path = working_dir.join(SETTINGS_FILE_NAME);

        if let Some(path) = git_settings_path.as_ref() {
            if path.exists() && Some(path) != override_path.as_ref() && path != &local_settings_path
            {
                let source = SettingsSource::for_file(SettingsSourceKind::GitRoot, path.clone());
                merged.merge(load_layer(path, source.clone())?);
                source_layers.push(source);
            }
        }

        if local_settings_path.exists() && Some(&local_settings_path) != override_path.as_ref() {
            let source =
                SettingsSource::for_file(SettingsSourceKind::Local, local_settings_path.clone());
            merged.merge(load_layer(&local_settings_path, source.clone())?);
            source_layers.push(source);
        }

        if let Some(path) = override_path {
            let source = SettingsSource::for_file(SettingsSourceKind::Override, path.clone());
            merged.merge(load_layer(&path, source.clone())?);
            source_layers.push(source);
        }

        let (syntax, policy, backup) = merged.finalize().map_err(SettingsError::Validation)?;
        Ok(Settings {
            syntax,
            policy,
            backup,
            sources: SettingsSources {
                working_directory: working_dir,
                layers: source_layers,
            },
        })
    }
}

impl Default for Settings {
    /// Built-in defaults without consulting the filesystem.
    fn default() -> Self {
        Settings {
            syntax: Syntax::default(),
            policy: MatchPolicy::Exact,
            backup: true,
            sources: SettingsSources {
                working_directory: PathBuf::from("."),
                layers: vec![SettingsSource::built_in()],
            },
        }
    }
}

fn resolve_working_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, SettingsError> {
    match override_dir {
        Some(path) => {
            fs::canonicalize(&path).map_err(|source| SettingsError::WorkingDirectory {
                attempted: path,
                source,
            })
        }
        None => env::current_dir().map_err(|source| SettingsError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

fn load_layer(path: &Path, source: SettingsSource) -> Result<PartialSettings, SettingsError> {
    let contents = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.into(),
        source,
    })?;
    let raw: RawSettings = toml::from_str(&contents).map_err(|source| SettingsError::Parse {
        path: path.into(),
        source,
    })?;
    Ok(raw.into_partial(source))
}

fn defaults_layer(source: SettingsSource) -> PartialSettings {
    PartialSettings {
        markers: Some(Located::new(
            DEFAULT_MARKERS.iter().map(|ch| ch.to_string()).collect(),
            source.clone(),
        )),
        write_marker: Some(Located::new(DEFAULT_WRITE_MARKER.to_string(), source.clone())),
        case_insensitive: Some(Located::new(false, source.clone())),
        backup: Some(Located::new(true, source)),
    }
}

#[derive(Clone, Debug, Default)]
struct PartialSettings {
    markers: Option<Located<Vec<String>>>,
    write_marker: Option<Located<String>>,
    case_insensitive: Option<Located<bool>>,
    backup: Option<Located<bool>>,
}

impl PartialSettings {
    fn merge(&mut self, other: PartialSettings) {
        if other.markers.is_some() {
            self.markers = other.markers;
        }
        if other.write_marker.is_some() {
            self.write_marker = other.write_marker;
        }
        if other.case_insensitive.is_some() {
            self.case_insensitive = other.case_insensitive;
        }
        if other.backup.is_some() {
            self.backup = other.backup;
        }
    }

    fn finalize(self) -> Result<(Syntax, MatchPolicy, bool), SettingsValidationErrors> {
        let mut errors = Vec::new();

        let markers_loc = self.markers.unwrap_or_else(|| {
            Located::new(
                DEFAULT_MARKERS.iter().map(|ch| ch.to_string()).collect(),
                SettingsSource::built_in(),
            )
        });
        let mut markers = Vec::new();
        for raw in &markers_loc.value {
            match single_char(raw) {
                Some(ch) => markers.push(ch),
                None => errors.push(ValidationError::new(
                    Some(markers_loc.source.clone()),
                    format!("syntax.markers entries must be a single character (received '{raw}')"),
                )),
            }
        }

        let write_loc = self.write_marker.unwrap_or_else(|| {
            Located::new(DEFAULT_WRITE_MARKER.to_string(), SettingsSource::built_in())
        });
        let write_marker = match single_char(&write_loc.value) {
            Some(ch) => Some(ch),
            None => {
                errors.push(ValidationError::new(
                    Some(write_loc.source.clone()),
                    format!(
                        "syntax.write_marker must be a single character (received '{}')",
                        write_loc.value
                    ),
                ));
                None
            }
        };

        let syntax = match write_marker {
            Some(write) if !markers.is_empty() && !markers.contains(&write) => {
                errors.push(ValidationError::new(
                    Some(write_loc.source.clone()),
                    format!("syntax.write_marker '{write}' must be one of syntax.markers"),
                ));
                Syntax::default()
            }
            Some(write) => match Syntax::new(markers, write) {
                Ok(syntax) => syntax,
                Err(err) => {
                    errors.push(ValidationError::new(
                        Some(markers_loc.source.clone()),
                        format!("syntax.markers: {err}"),
                    ));
                    Syntax::default()
                }
            },
            None => Syntax::default(),
        };

        let policy = match self.case_insensitive {
            Some(located) if located.value => MatchPolicy::IgnoreCase,
            _ => MatchPolicy::Exact,
        };

        let backup = self.backup.map(|located| located.value).unwrap_or(true);

        if !errors.is_empty() {
            return Err(SettingsValidationErrors(errors));
        }

        Ok((syntax, policy, backup))
    }
}

fn single_char(value: &str) -> Option<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Some(ch),
        _ => None,
    }
}

#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    source: SettingsSource,
}

impl<T> Located<T> {
    fn new(value: T, source: SettingsSource) -> Self {
        Located { value, source }
    }
}

/// Container for validation failures, formatted as a bullet list.
#[derive(Debug)]
pub struct SettingsValidationErrors(pub Vec<ValidationError>);

impl fmt::Display for SettingsValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "- {err}")?;
        }
        Ok(())
    }
}

impl SettingsValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }
}

/// Validation failure with optional provenance.
#[derive(Clone, Debug)]
pub struct ValidationError {
    pub source: Option<SettingsSource>,
    pub message: String,
}

impl ValidationError {
    fn new(source: Option<SettingsSource>, message: String) -> Self {
        ValidationError { source, message }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(source) = &self.source {
            write!(f, " ({})", source.describe())?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    #[serde(default)]
    syntax: Option<RawSyntax>,
    #[serde(default)]
    lookup: Option<RawLookup>,
    #[serde(default)]
    write: Option<RawWrite>,
}

impl RawSettings {
    fn into_partial(self, source: SettingsSource) -> PartialSettings {
        let mut partial = PartialSettings::default();
        if let Some(syntax) = self.syntax {
            partial.markers = syntax
                .markers
                .map(|value| Located::new(value, source.clone()));
            partial.write_marker = syntax
                .write_marker
                .map(|value| Located::new(value, source.clone()));
        }
        if let Some(lookup) = self.lookup {
            partial.case_insensitive = lookup
                .case_insensitive
                .map(|value| Located::new(value, source.clone()));
        }
        if let Some(write) = self.write {
            partial.backup = write.backup.map(|value| Located::new(value, source));
        }
        partial
    }
}

#[derive(Debug, Deserialize)]
struct RawSyntax {
    #[serde(default)]
    markers: Option<Vec<String>>,
    #[serde(default)]
    write_marker: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLookup {
    #[serde(default)]
    case_insensitive: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawWrite {
    #[serde(default)]
    backup: Option<bool>,
}
