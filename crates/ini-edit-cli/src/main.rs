use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use ini_edit_config::{LoadOptions, Settings, SettingsError};
use ini_edit_core::{
    load_value, EditError, EditOptions, EditOutcome, ExitCode, IniEditor, MatchPolicy, Syntax,
    ValueSource,
};
use regex::RegexBuilder;

#[derive(Parser, Debug)]
#[command(author, version, about = "Format-preserving INI editor", long_about = None)]
struct Cli {
    /// Path to the INI file
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Operation to perform (get, set, comment, sections, keys, dump)
    #[arg(value_name = "OPERATION")]
    operation: OperationArg,

    /// Section name ('sections' treats this as a regex pattern)
    #[arg(value_name = "SECTION")]
    section: Option<String>,

    /// Key name
    #[arg(value_name = "KEY")]
    key: Option<String>,

    /// Value to write
    #[arg(value_name = "VALUE", allow_hyphen_values = true)]
    value: Option<String>,

    /// Fallback printed when the lookup fails (makes 'get' non-strict)
    #[arg(long = "default", value_name = "TEXT", allow_hyphen_values = true)]
    default: Option<String>,

    /// Read the value from a file (use '-' for stdin)
    #[arg(long = "value-from", value_name = "PATH", allow_hyphen_values = true)]
    value_from: Option<PathBuf>,

    /// Comment marker character; repeat to replace the configured set
    #[arg(long = "marker", value_name = "CHAR")]
    markers: Vec<char>,

    /// Marker emitted when commenting lines out
    #[arg(long = "write-marker", value_name = "CHAR")]
    write_marker: Option<char>,

    /// Match section and key names case-insensitively
    #[arg(short = 'i', long = "ignore-case")]
    ignore_case: bool,

    /// Treat the 'sections' pattern as case sensitive
    #[arg(short = 's', long = "case-sensitive")]
    case_sensitive: bool,

    /// Print diff without writing changes
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Force creation of backup (default behaviour)
    #[arg(long = "backup")]
    backup: bool,

    /// Disable backup creation
    #[arg(long = "no-backup", conflicts_with = "backup")]
    no_backup: bool,

    /// Suppress informational output (diffs, success messages)
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Use an explicit settings file instead of the discovered ones
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Clone, Debug, ValueEnum)]
enum OperationArg {
    Get,
    Set,
    Comment,
    Sections,
    Keys,
    Dump,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(exit) | Err(exit) => std::process::ExitCode::from(exit as u8),
    }
}

fn run(cli: Cli) -> Result<ExitCode, ExitCode> {
    let settings = load_settings(&cli)?;
    let options = build_options(&cli, &settings)?;

    match cli.operation {
        OperationArg::Get => handle_get(&cli, options),
        OperationArg::Set => handle_set(&cli, options),
        OperationArg::Comment => handle_comment(&cli, options),
        OperationArg::Sections => handle_sections(&cli, options),
        OperationArg::Keys => handle_keys(&cli, options),
        OperationArg::Dump => handle_dump(&cli, options),
    }
}

fn load_settings(cli: &Cli) -> Result<Settings, ExitCode> {
    let mut options = LoadOptions::default();
    if let Some(path) = &cli.config {
        options = options.with_override_path(path);
    }

    Settings::load(options).map_err(|err| {
        eprintln!("{err}");
        match err {
            SettingsError::Io { .. } => ExitCode::Io,
            _ => ExitCode::InvalidArguments,
        }
    })
}

fn build_options(cli: &Cli, settings: &Settings) -> Result<EditOptions, ExitCode> {
    let syntax = if cli.markers.is_empty() && cli.write_marker.is_none() {
        settings.syntax.clone()
    } else {
        let markers = if cli.markers.is_empty() {
            settings.syntax.markers().to_vec()
        } else {
            cli.markers.clone()
        };
        let write_marker = match cli.write_marker {
            Some(marker) => marker,
            None if markers.contains(&settings.syntax.write_marker()) => {
                settings.syntax.write_marker()
            }
            None => markers[0],
        };
        Syntax::new(markers, write_marker).map_err(|err| {
            eprintln!("{err}");
            err.exit_code()
        })?
    };

    let policy = if cli.ignore_case {
        MatchPolicy::IgnoreCase
    } else {
        settings.policy
    };

    let backup = match (cli.backup, cli.no_backup) {
        (_, true) => false,
        (true, false) => true,
        (false, false) => settings.backup,
    };

    Ok(EditOptions {
        syntax,
        policy,
        dry_run: cli.dry_run,
        backup,
    })
}

fn open_editor(cli: &Cli, options: EditOptions) -> Result<IniEditor, ExitCode> {
    IniEditor::open(&cli.file, options).map_err(|err| report(cli, &err))
}

fn handle_get(cli: &Cli, options: EditOptions) -> Result<ExitCode, ExitCode> {
    let (section, key) = require_section_key(cli)?;
    ensure_no_value(cli)?;

    let editor = open_editor(cli, options)?;
    match &cli.default {
        Some(default) => {
            println!("{}", editor.read_value_or(section, key, default));
            Ok(ExitCode::Success)
        }
        None => match editor.read_value(section, key) {
            Ok(value) => {
                println!("{value}");
                Ok(ExitCode::Success)
            }
            Err(err) => Err(report(cli, &err)),
        },
    }
}

fn handle_set(cli: &Cli, options: EditOptions) -> Result<ExitCode, ExitCode> {
    let (section, key) = require_section_key(cli)?;
    let source = require_value(cli)?;
    let value = load_value(source).map_err(|err| {
        eprintln!("{err}");
        err.exit_code()
    })?;

    let mut editor = open_editor(cli, options)?;
    match editor.write_value(section, key, &value) {
        Ok(outcome) => {
            announce(cli, &outcome);
            Ok(ExitCode::Success)
        }
        Err(err) => Err(report(cli, &err)),
    }
}

fn handle_comment(cli: &Cli, options: EditOptions) -> Result<ExitCode, ExitCode> {
    let (section, key) = require_section_key(cli)?;
    ensure_no_value(cli)?;

    let mut editor = open_editor(cli, options)?;
    match editor.comment_key(section, key) {
        Ok(outcome) => {
            announce(cli, &outcome);
            Ok(ExitCode::Success)
        }
        Err(err) => Err(report(cli, &err)),
    }
}

fn handle_sections(cli: &Cli, options: EditOptions) -> Result<ExitCode, ExitCode> {
    if cli.key.is_some() {
        eprintln!("Operation 'sections' accepts at most a PATTERN");
        return Err(ExitCode::InvalidArguments);
    }
    ensure_no_value(cli)?;

    let filter = match &cli.section {
        Some(pattern) => Some(build_pattern(cli, pattern)?),
        None => None,
    };

    let marker = options.syntax.write_marker();
    let editor = open_editor(cli, options)?;
    if !editor.is_backed() {
        return Err(report(
            cli,
            &EditError::FileMissing {
                path: cli.file.clone(),
            },
        ));
    }

    for record in editor.sections() {
        if let Some(regex) = &filter {
            if !regex.is_match(&record.name) {
                continue;
            }
        }
        if record.commented {
            println!("{marker} [{}]", record.name);
        } else {
            println!("[{}]", record.name);
        }
    }

    Ok(ExitCode::Success)
}

fn handle_keys(cli: &Cli, options: EditOptions) -> Result<ExitCode, ExitCode> {
    let Some(section) = cli.section.as_deref() else {
        eprintln!("Operation 'keys' requires SECTION");
        return Err(ExitCode::InvalidArguments);
    };
    if cli.key.is_some() {
        eprintln!("Operation 'keys' takes SECTION only");
        return Err(ExitCode::InvalidArguments);
    }
    ensure_no_value(cli)?;

    let marker = options.syntax.write_marker();
    let editor = open_editor(cli, options)?;
    match editor.keys(section) {
        Ok(records) => {
            for record in records {
                if record.commented {
                    println!("{marker} {} = {}", record.name, record.value);
                } else {
                    println!("{} = {}", record.name, record.value);
                }
            }
            Ok(ExitCode::Success)
        }
        Err(err) => Err(report(cli, &err)),
    }
}

fn handle_dump(cli: &Cli, options: EditOptions) -> Result<ExitCode, ExitCode> {
    if cli.section.is_some() || cli.key.is_some() {
        eprintln!("Operation 'dump' takes no SECTION or KEY");
        return Err(ExitCode::InvalidArguments);
    }
    ensure_no_value(cli)?;

    let editor = open_editor(cli, options)?;
    match editor.read_all() {
        Ok(sections) => {
            for (idx, (name, entries)) in sections.iter().enumerate() {
                if idx > 0 {
                    println!();
                }
                println!("[{name}]");
                for (key, value) in entries {
                    println!("{key} = {value}");
                }
            }
            Ok(ExitCode::Success)
        }
        Err(err) => Err(report(cli, &err)),
    }
}

fn build_pattern(cli: &Cli, pattern: &str) -> Result<regex::Regex, ExitCode> {
    let mut builder = RegexBuilder::new(pattern);
    builder.case_insensitive(!cli.case_sensitive);
    builder.size_limit(1024 * 100);

    builder.build().map_err(|build_err| {
        eprintln!("Failed to compile pattern '{pattern}': {build_err}");
        ExitCode::InvalidArguments
    })
}

fn require_section_key(cli: &Cli) -> Result<(&str, &str), ExitCode> {
    match (&cli.section, &cli.key) {
        (Some(section), Some(key)) => Ok((section.as_str(), key.as_str())),
        _ => {
            eprintln!("Operation '{}' requires SECTION and KEY", cli.operation);
            Err(ExitCode::InvalidArguments)
        }
    }
}

fn ensure_no_value(cli: &Cli) -> Result<(), ExitCode> {
    if cli.value.is_some() || cli.value_from.is_some() {
        eprintln!("VALUE / --value-from cannot be used with '{}'", cli.operation);
        return Err(ExitCode::InvalidArguments);
    }
    Ok(())
}

fn require_value(cli: &Cli) -> Result<ValueSource, ExitCode> {
    match (&cli.value, &cli.value_from) {
        (Some(_), Some(_)) => {
            eprintln!("VALUE and --value-from cannot be used together");
            Err(ExitCode::InvalidArguments)
        }
        (Some(text), None) => Ok(ValueSource::Inline(text.clone())),
        (None, Some(path)) => {
            if path == Path::new("-") {
                Ok(ValueSource::Stdin)
            } else {
                Ok(ValueSource::File(path.clone()))
            }
        }
        (None, None) => {
            eprintln!("Operation 'set' requires VALUE or --value-from");
            Err(ExitCode::InvalidArguments)
        }
    }
}

fn announce(cli: &Cli, outcome: &EditOutcome) {
    if cli.quiet {
        return;
    }

    if cli.dry_run {
        if let Some(diff) = &outcome.diff {
            print!("{diff}");
            io::stdout().flush().ok();
        } else {
            println!("No changes (dry run)");
        }
        return;
    }

    if outcome.changed {
        if let Some(diff) = &outcome.diff {
            print!("{diff}");
        }
        println!("Updated {}", cli.file.display());
    } else {
        println!("No changes needed.");
    }
}

fn report(cli: &Cli, err: &EditError) -> ExitCode {
    eprintln!("{err}");
    if matches!(err, EditError::SectionNotFound { .. }) {
        if let Some(names) = candidate_sections(cli) {
            if !names.is_empty() {
                eprintln!("Candidate sections:");
                for name in names.iter().take(20) {
                    eprintln!("  - [{name}]");
                }
            }
        }
    }
    err.exit_code()
}

fn candidate_sections(cli: &Cli) -> Option<Vec<String>> {
    let editor = IniEditor::open(&cli.file, EditOptions::default()).ok()?;
    if !editor.is_backed() {
        return None;
    }
    Some(
        editor
            .sections()
            .iter()
            .map(|record| record.name.clone())
            .collect(),
    )
}

impl std::fmt::Display for OperationArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            OperationArg::Get => "get",
            OperationArg::Set => "set",
            OperationArg::Comment => "comment",
            OperationArg::Sections => "sections",
            OperationArg::Keys => "keys",
            OperationArg::Dump => "dump",
        })
    }
}
