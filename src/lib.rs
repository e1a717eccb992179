//! shargs - declarative argument parsing for shell scripts.
//!
//! This library provides the core functionality: extracting a script's
//! argument specification from its source, resolving values with
//! precedence command line > environment > default, rendering help text
//! from the declaration comments, and generating sourceable output.

pub mod help;
pub mod output;
pub mod resolver;
pub mod spec;

pub use help::{render_brief, render_long};
pub use output::{
    effective_command_line, effective_tokens, render_error_file, render_exports,
    render_help_file, sh_quote, write_output,
};
pub use resolver::{finalize, resolve, scan, seed, HelpVariant, Outcome, Resolution, ResolveError};
pub use spec::{ArgSpec, ScriptSpec, SpecError};
