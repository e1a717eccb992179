//! Sourceable output generation and the effective-command-line report.
//!
//! The target script sources whatever file `shargs parse` writes, so
//! every outcome is delivered as shell text: assignments and `unset` for
//! a resolution, a heredoc plus `exit 0` for help, a diagnostic plus
//! `exit 1` for user errors.

use crate::resolver::Resolution;
use crate::spec::ScriptSpec;
use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// Heredoc delimiter for help output.
const HELP_DELIMITER: &str = "SHARGS_HELP";
/// Heredoc delimiter for error output.
const ERROR_DELIMITER: &str = "SHARGS_ERROR";

/// Characters that never need quoting.
const SAFE_CHARS: &str = "_-./:=%+@,";

/// Quote a token so the shell reads it back as one word, exactly.
pub fn sh_quote(token: &str) -> String {
    if token.is_empty() {
        return "''".to_string();
    }
    if token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || SAFE_CHARS.contains(c))
    {
        return token.to_string();
    }
    let mut quoted = String::with_capacity(token.len() + 2);
    quoted.push('\'');
    for c in token.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}

/// Shell statements realizing a resolution: assignments in declaration
/// order, `unset` for names that resolved blank, and a `set --` line
/// rebinding the positional parameters when collection is enabled.
pub fn render_exports(spec: &ScriptSpec, resolution: &Resolution) -> String {
    let mut out = String::new();
    for arg in &spec.args {
        match resolution.get(&arg.name) {
            Some(value) => {
                out.push_str(&arg.name);
                out.push('=');
                out.push_str(&sh_quote(value));
                out.push('\n');
            }
            None => {
                out.push_str("unset ");
                out.push_str(&arg.name);
                out.push('\n');
            }
        }
    }
    if spec.positional {
        // Emitted even when empty so stale parameters are cleared.
        let mut line = String::from("set --");
        for positional in &resolution.positionals {
            line.push(' ');
            line.push_str(&sh_quote(positional));
        }
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Raw token sequence of the invocation that would reproduce the current
/// state: script path, every option in declared order, then the delimiter
/// and positionals if any were collected. An unset name is emitted with
/// an empty value, which scans back to blank and unsets again.
pub fn effective_tokens(spec: &ScriptSpec, resolution: &Resolution) -> Vec<String> {
    let mut tokens = vec![spec.path.display().to_string()];
    for arg in &spec.args {
        tokens.push(arg.flag());
        tokens.push(resolution.get(&arg.name).unwrap_or("").to_string());
    }
    if !resolution.positionals.is_empty() {
        tokens.push("--".to_string());
        tokens.extend(resolution.positionals.iter().cloned());
    }
    tokens
}

/// The effective command line, quoted for safe re-entry. Diagnostic
/// only: callers write it to the error stream, never stdout.
pub fn effective_command_line(spec: &ScriptSpec, resolution: &Resolution) -> String {
    effective_tokens(spec, resolution)
        .iter()
        .map(|t| sh_quote(t))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Shell text that prints help and succeeds when sourced.
pub fn render_help_file(help: &str) -> String {
    format!("cat <<'{HELP_DELIMITER}'\n{help}{HELP_DELIMITER}\nexit 0\n")
}

/// Shell text that reports a user error with the brief help on stderr
/// and fails when sourced.
pub fn render_error_file(message: &str, brief_help: &str) -> String {
    format!(
        "cat <<'{ERROR_DELIMITER}' >&2\nERROR: {message}\n{brief_help}{ERROR_DELIMITER}\nexit 1\n"
    )
}

/// Persist content to a temporary file the caller can source. The file
/// outlives the process; returns its path.
pub fn write_output(content: &str) -> Result<PathBuf> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    let path = file.into_temp_path().keep()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{resolve, Outcome, Resolution};
    use crate::spec::ScriptSpec;
    use std::collections::HashMap;
    use std::path::Path;

    const DEMO: &str = "\
SHARGS_SPEC=(
    dir=/home
    verbosity=1
)
SHARGS_POSITIONAL=1
";

    fn spec_from(text: &str) -> ScriptSpec {
        ScriptSpec::from_source(Path::new("demo.sh"), text).unwrap()
    }

    fn resolved(spec: &ScriptSpec, args: &[&str]) -> Resolution {
        let argv: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        match resolve(spec, &HashMap::new(), &argv).unwrap() {
            Outcome::Done(res) => res,
            other => panic!("expected Done, got {:?}", other),
        }
    }

    #[test]
    fn test_quote_plain_tokens_pass_through() {
        for token in ["file.txt", "/tmp/a-b", "a=b", "x:y", "100%"] {
            assert_eq!(sh_quote(token), token);
        }
    }

    #[test]
    fn test_quote_empty_string() {
        assert_eq!(sh_quote(""), "''");
    }

    #[test]
    fn test_quote_spaces() {
        assert_eq!(sh_quote("two words"), "'two words'");
    }

    #[test]
    fn test_quote_expansion_characters() {
        assert_eq!(sh_quote("$HOME"), "'$HOME'");
        assert_eq!(sh_quote("`whoami`"), "'`whoami`'");
        assert_eq!(sh_quote("a\"b"), "'a\"b'");
        assert_eq!(sh_quote("a!b"), "'a!b'");
    }

    #[test]
    fn test_quote_embedded_single_quote() {
        assert_eq!(sh_quote("it's"), "'it'\\''s'");
    }

    #[test]
    fn test_exports_follow_declaration_order() {
        let spec = spec_from(DEMO);
        let out = render_exports(&spec, &resolved(&spec, &[]));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "dir=/home");
        assert_eq!(lines[1], "verbosity=1");
    }

    #[test]
    fn test_exports_quote_values() {
        let spec = spec_from(DEMO);
        let out = render_exports(&spec, &resolved(&spec, &["--dir", "two words"]));
        assert!(out.contains("dir='two words'"));
    }

    #[test]
    fn test_exports_unset_blank_values() {
        let spec = spec_from(DEMO);
        let out = render_exports(&spec, &resolved(&spec, &["--dir", ""]));
        assert!(out.contains("unset dir"));
        assert!(out.contains("verbosity=1"));
    }

    #[test]
    fn test_exports_rebind_positionals() {
        let spec = spec_from(DEMO);
        let out = render_exports(&spec, &resolved(&spec, &["one", "two words"]));
        assert!(out.contains("set -- one 'two words'"));
    }

    #[test]
    fn test_exports_clear_positionals_when_none_collected() {
        let spec = spec_from(DEMO);
        let out = render_exports(&spec, &resolved(&spec, &[]));
        assert!(out.ends_with("set --\n"));
    }

    #[test]
    fn test_exports_omit_set_line_without_positional_support() {
        let spec = spec_from("SHARGS_SPEC=(\n    dir=/home\n)\n");
        let out = render_exports(&spec, &resolved(&spec, &[]));
        assert!(!out.contains("set --"));
    }

    #[test]
    fn test_effective_command_line_shape() {
        let spec = spec_from(DEMO);
        let res = resolved(&spec, &["--dir", "/tmp", "file.txt"]);
        assert_eq!(
            effective_command_line(&spec, &res),
            "demo.sh --dir /tmp --verbosity 1 -- file.txt"
        );
    }

    #[test]
    fn test_effective_command_line_quotes_values() {
        let spec = spec_from(DEMO);
        let res = resolved(&spec, &["--dir", "two words"]);
        assert_eq!(
            effective_command_line(&spec, &res),
            "demo.sh --dir 'two words' --verbosity 1"
        );
    }

    #[test]
    fn test_effective_command_line_renders_unset_arguments_empty() {
        let spec = spec_from(DEMO);
        let res = resolved(&spec, &["--dir", ""]);
        assert_eq!(
            effective_command_line(&spec, &res),
            "demo.sh --dir '' --verbosity 1"
        );
    }

    #[test]
    fn test_effective_tokens_round_trip() {
        let spec = spec_from(DEMO);
        let first = resolved(&spec, &["--dir", "/tmp", "--", "one", "two words", "--x"]);
        let tokens = effective_tokens(&spec, &first);
        let second = resolved(
            &spec,
            &tokens[1..].iter().map(String::as_str).collect::<Vec<_>>(),
        );
        assert_eq!(first, second);
    }

    #[test]
    fn test_effective_tokens_round_trip_preserves_unset_state() {
        // Forcing an arg empty unsets it; the re-scan must not let the
        // default resurface.
        let spec = spec_from(DEMO);
        let first = resolved(&spec, &["--dir", ""]);
        assert_eq!(first.get("dir"), None);
        let tokens = effective_tokens(&spec, &first);
        let second = resolved(
            &spec,
            &tokens[1..].iter().map(String::as_str).collect::<Vec<_>>(),
        );
        assert_eq!(second.get("dir"), None);
        assert_eq!(first, second);
    }

    #[test]
    fn test_help_file_prints_and_succeeds() {
        let out = render_help_file("usage: demo.sh\n");
        assert!(out.starts_with("cat <<'SHARGS_HELP'\n"));
        assert!(out.contains("usage: demo.sh"));
        assert!(out.ends_with("SHARGS_HELP\nexit 0\n"));
    }

    #[test]
    fn test_error_file_reports_on_stderr_and_fails() {
        let out = render_error_file("unknown argument: --bogus", "usage: demo.sh\n");
        assert!(out.starts_with("cat <<'SHARGS_ERROR' >&2\n"));
        assert!(out.contains("ERROR: unknown argument: --bogus"));
        assert!(out.contains("usage: demo.sh"));
        assert!(out.ends_with("SHARGS_ERROR\nexit 1\n"));
    }

    #[test]
    fn test_write_output_persists_file() {
        let path = write_output("dir=/home\n").unwrap();
        assert!(path.exists());
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "dir=/home\n");
        std::fs::remove_file(path).unwrap();
    }
}
