//! Specification extraction and validation for target scripts.
//!
//! A script declares its arguments in a block embedded in its own source:
//!
//! ```sh
//! SHARGS_SPEC=(
//!     # Directory to operate on
//!     dir=$HOME
//!     ## maintainer note, never shown to users
//!     verbosity=1
//! )
//! SHARGS_POSITIONAL=1
//! ```
//!
//! Comment lines with a single marker and a space become the argument's
//! help text. The companion `SHARGS_POSITIONAL` flag opts the script into
//! positional-argument collection; completion tooling locates it by plain
//! text search, same as we do.

use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Line that opens the declaration block, compared after trimming.
pub const BLOCK_START: &str = "SHARGS_SPEC=(";
/// Line that terminates the declaration block, compared after trimming.
pub const BLOCK_END: &str = ")";

/// Accepted spellings of the positional-collection opt-in.
const POSITIONAL_FLAGS: [&str; 2] = ["SHARGS_POSITIONAL=1", "SHARGS_POSITIONAL=true"];

/// Errors raised while extracting or validating a script's declarations.
///
/// All of these indicate the script itself is broken, not its user; the
/// binary aborts before any argument processing happens.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("failed to read script {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no SHARGS_SPEC=( block found in script")]
    MissingBlock,

    #[error("declaration block is missing its closing ')'")]
    UnterminatedBlock,

    #[error("malformed declaration on line {line_no}: {text}")]
    MalformedEntry { line_no: usize, text: String },

    #[error("invalid argument name: {0}")]
    InvalidName(String),

    #[error("duplicate argument name: {0}")]
    DuplicateName(String),
}

/// One declared argument: the variable name, the default expression as
/// written, and the help comments that preceded the entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    pub name: String,
    pub default_expr: String,
    pub help_lines: Vec<String>,
}

impl ArgSpec {
    /// Dash-form option flag for this argument (`log_dir` -> `--log-dir`).
    pub fn flag(&self) -> String {
        format!("--{}", self.name.replace('_', "-"))
    }
}

/// The parsed specification of a target script. Immutable once built.
#[derive(Debug, Clone)]
pub struct ScriptSpec {
    pub path: PathBuf,
    pub args: Vec<ArgSpec>,
    pub positional: bool,
}

impl ScriptSpec {
    /// Read a script file and extract its specification.
    pub fn from_file(path: &Path) -> Result<ScriptSpec, SpecError> {
        let text = fs::read_to_string(path).map_err(|source| SpecError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_source(path, &text)
    }

    /// Extract the specification from already-loaded source text.
    pub fn from_source(path: &Path, text: &str) -> Result<ScriptSpec, SpecError> {
        let mut args = Vec::new();
        let mut in_block = false;
        let mut terminated = false;
        let mut pending_help: Vec<String> = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if !in_block {
                if line == BLOCK_START {
                    in_block = true;
                }
                continue;
            }
            if line == BLOCK_END {
                terminated = true;
                break;
            }
            if line.is_empty() {
                // Help comments must sit immediately above their entry.
                pending_help.clear();
                continue;
            }
            if let Some(comment) = line.strip_prefix('#') {
                if comment.starts_with('#') {
                    // Doubled marker: maintainer-only, never shown.
                    continue;
                }
                if comment.is_empty() {
                    pending_help.push(String::new());
                } else if let Some(help) = comment.strip_prefix(' ') {
                    pending_help.push(help.to_string());
                }
                continue;
            }
            let Some((name, default_expr)) = line.split_once('=') else {
                return Err(SpecError::MalformedEntry {
                    line_no: idx + 1,
                    text: line.to_string(),
                });
            };
            args.push(ArgSpec {
                name: name.to_string(),
                default_expr: default_expr.to_string(),
                help_lines: std::mem::take(&mut pending_help),
            });
        }

        if !in_block {
            return Err(SpecError::MissingBlock);
        }
        if !terminated {
            return Err(SpecError::UnterminatedBlock);
        }

        let spec = ScriptSpec {
            path: path.to_path_buf(),
            args,
            positional: detect_positional(text),
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Check every declared name against the identifier grammar and
    /// reject duplicates. Fails on the first offending name.
    fn validate(&self) -> Result<(), SpecError> {
        let mut seen = HashSet::new();
        for arg in &self.args {
            if !is_valid_name(&arg.name) {
                return Err(SpecError::InvalidName(arg.name.clone()));
            }
            if !seen.insert(arg.name.as_str()) {
                return Err(SpecError::DuplicateName(arg.name.clone()));
            }
        }
        Ok(())
    }

    /// Find a declared argument by its variable name (underscore form).
    pub fn lookup(&self, name: &str) -> Option<&ArgSpec> {
        self.args.iter().find(|a| a.name == name)
    }

    /// Widest dash-form flag across the table, seeded with `--help` so
    /// the always-present help row aligns with the rest.
    pub fn max_flag_width(&self) -> usize {
        self.args
            .iter()
            .map(|a| a.flag().len())
            .fold("--help".len(), usize::max)
    }

    /// Whether any argument carries long-form help text.
    pub fn has_help_text(&self) -> bool {
        self.args.iter().any(|a| !a.help_lines.is_empty())
    }

    /// Script file name for usage lines and diagnostics.
    pub fn script_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Machine-readable view for completion tooling.
    pub fn dump(&self) -> SpecDump<'_> {
        SpecDump {
            script: &self.path,
            positional: self.positional,
            args: self
                .args
                .iter()
                .map(|a| ArgDump {
                    name: &a.name,
                    flag: a.flag(),
                    default: &a.default_expr,
                    help: &a.help_lines,
                })
                .collect(),
        }
    }
}

/// JSON shape emitted by `shargs dump-spec`. Completion scripts consume
/// this instead of re-parsing the declaration block themselves.
#[derive(Debug, Serialize)]
pub struct SpecDump<'a> {
    pub script: &'a Path,
    pub positional: bool,
    pub args: Vec<ArgDump<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ArgDump<'a> {
    pub name: &'a str,
    pub flag: String,
    pub default: &'a str,
    pub help: &'a [String],
}

/// A legal name starts with a letter and continues with letters, digits,
/// or underscores.
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// The positional opt-in lives outside the block and is found by direct
/// text search, the same way completion tooling finds it.
fn detect_positional(text: &str) -> bool {
    text.lines()
        .map(str::trim)
        .any(|line| POSITIONAL_FLAGS.contains(&line))
}
