//! Help text rendering for target scripts.
//!
//! Two verbosity levels: `-h` prints one row per argument with the value
//! currently in effect, `--help` expands the help comments declared in
//! the script's specification block.

use crate::resolver::Resolution;
use crate::spec::{ArgSpec, ScriptSpec};

/// Width of the rule printed between long-help entries.
const RULE_WIDTH: usize = 40;

fn usage_line(spec: &ScriptSpec) -> String {
    let mut usage = format!("usage: {} [--option value]...", spec.script_name());
    if spec.positional {
        usage.push_str(" [--] [arguments...]");
    }
    usage.push('\n');
    usage
}

fn positional_note(spec: &ScriptSpec) -> &'static str {
    if spec.positional {
        "positional arguments are collected; '--' ends option parsing\n"
    } else {
        ""
    }
}

/// One row per argument: the dash-form flag padded to the widest flag in
/// the table, then the value currently in effect.
pub fn render_brief(spec: &ScriptSpec, resolution: &Resolution) -> String {
    let width = spec.max_flag_width();
    let mut out = usage_line(spec);
    for arg in &spec.args {
        let current = resolution.get(&arg.name).unwrap_or("");
        out.push_str(&format!("  {:width$}  default: {}\n", arg.flag(), current));
    }
    out.push_str(&format!("  {:width$}  show this help text\n", "--help"));
    out.push_str(positional_note(spec));
    if spec.has_help_text() {
        out.push_str("run with '--help' for full descriptions\n");
    } else {
        out.push_str("run with '-h' to show this summary\n");
    }
    out
}

/// Full descriptions, one block per argument. Falls back to the brief
/// form when no argument carries help text.
pub fn render_long(spec: &ScriptSpec, resolution: &Resolution) -> String {
    if !spec.has_help_text() {
        return render_brief(spec, resolution);
    }
    let rule = "-".repeat(RULE_WIDTH);
    let mut out = usage_line(spec);
    out.push('\n');
    for arg in &spec.args {
        out.push_str(&render_entry(arg, resolution));
        out.push_str(&rule);
        out.push('\n');
    }
    out.push_str(positional_note(spec));
    out
}

fn render_entry(arg: &ArgSpec, resolution: &Resolution) -> String {
    let mut out = format!("{}\n", arg.flag());
    for line in &arg.help_lines {
        if line.is_empty() {
            out.push('\n');
        } else {
            out.push_str(&format!("    {line}\n"));
        }
    }
    let current = resolution.get(&arg.name).unwrap_or("");
    out.push_str(&format!("    default: {current}\n"));
    // Show what the declaration said when the effective value no longer
    // matches it textually.
    if current != arg.default_expr {
        out.push_str(&format!("    original: {}\n", arg.default_expr));
    }
    out
}
