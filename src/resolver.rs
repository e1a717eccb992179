//! Value resolution for target scripts.
//!
//! Precedence is command line > environment > default. Resolution runs in
//! three steps: seed every declared name from the environment or its
//! default expression, scan the raw argument vector once left to right,
//! then unset every name that resolved to the empty string so the script
//! can rely on "variable exists" meaning "non-empty".

use crate::spec::ScriptSpec;
use std::collections::HashMap;
use std::process::Command;
use thiserror::Error;

/// Errors raised while resolving a target script's arguments.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("unknown argument: {0}")]
    UnknownArgument(String),

    #[error("{0} requires a value")]
    MissingValue(String),

    #[error("failed to evaluate default for '{name}'")]
    DefaultEval {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl ResolveError {
    /// User errors are reported with the brief help; everything else is
    /// an environment failure surfaced as-is.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ResolveError::UnknownArgument(_) | ResolveError::MissingValue(_)
        )
    }
}

/// Requested help verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpVariant {
    /// `-h`: one row per argument.
    Brief,
    /// `--help`: full descriptions.
    Long,
}

/// Current value bound to each declared name, plus collected positionals.
///
/// The map holds at most one value per name. Rendering always iterates
/// the specification table so output follows declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub values: HashMap<String, String>,
    pub positionals: Vec<String>,
}

impl Resolution {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// What resolving the argument vector produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A help flag was seen; the resolution reflects every binding made
    /// before it, so the renderer shows current values.
    Help(HelpVariant, Resolution),
    Done(Resolution),
}

/// Classification of a single raw token while option scanning is live.
/// Tokens after the `--` delimiter are never classified.
#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Help(HelpVariant),
    Delimiter,
    Flag(&'a str),
    Word(&'a str),
}

fn classify(token: &str) -> Token<'_> {
    match token {
        "--help" => Token::Help(HelpVariant::Long),
        "-h" => Token::Help(HelpVariant::Brief),
        "--" => Token::Delimiter,
        t if t.starts_with("--") => Token::Flag(&t[2..]),
        t => Token::Word(t),
    }
}

/// Seed every declared name from the ambient environment or its default
/// expression. An environment value wins even when empty. Defaults are
/// evaluated in declaration order with every earlier resolution exported,
/// so an expression may reference names declared above it.
pub fn seed(
    spec: &ScriptSpec,
    env: &HashMap<String, String>,
) -> Result<Resolution, ResolveError> {
    let mut resolution = Resolution::default();
    for arg in &spec.args {
        let value = match env.get(&arg.name) {
            Some(value) => value.clone(),
            None => eval_default(&arg.name, &arg.default_expr, &resolution.values)?,
        };
        resolution.values.insert(arg.name.clone(), value);
    }
    Ok(resolution)
}

/// Expand a default expression. Plain literals pass through; anything
/// with shell expansion syntax runs through `sh` in assignment context,
/// which is how the declaration would behave inside the script itself.
fn eval_default(
    name: &str,
    expr: &str,
    resolved: &HashMap<String, String>,
) -> Result<String, ResolveError> {
    if !needs_shell(expr) {
        return Ok(expr.to_string());
    }
    let program = format!("__shargs_value={expr}\nprintf '%s' \"$__shargs_value\"");
    let output = Command::new("sh")
        .arg("-c")
        .arg(program)
        .envs(resolved)
        .output()
        .map_err(|source| ResolveError::DefaultEval {
            name: name.to_string(),
            source,
        })?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn needs_shell(expr: &str) -> bool {
    expr.starts_with('~') || expr.contains(&['$', '`', '\'', '"'][..])
}

/// One pass over the raw argument vector. Bindings mutate `resolution`
/// as they are made; a help token stops the scan and reports which
/// variant was requested.
pub fn scan(
    spec: &ScriptSpec,
    resolution: &mut Resolution,
    argv: &[String],
) -> Result<Option<HelpVariant>, ResolveError> {
    let mut iter = argv.iter();
    while let Some(token) = iter.next() {
        match classify(token) {
            Token::Help(variant) => return Ok(Some(variant)),
            Token::Delimiter if spec.positional => {
                // Everything after the delimiter is positional verbatim,
                // dashes and all.
                resolution.positionals.extend(iter.cloned());
                break;
            }
            Token::Delimiter => {
                return Err(ResolveError::UnknownArgument(token.clone()));
            }
            Token::Flag(body) => {
                let name = body.replace('-', "_");
                let arg = spec
                    .lookup(&name)
                    .ok_or_else(|| ResolveError::UnknownArgument(token.clone()))?;
                // A value may never start with a dash through normal
                // option syntax; `--` is the escape hatch.
                let value = match iter.next() {
                    Some(v) if !v.starts_with('-') => v.clone(),
                    _ => return Err(ResolveError::MissingValue(token.clone())),
                };
                resolution.values.insert(arg.name.clone(), value);
            }
            Token::Word(_) if spec.positional => {
                resolution.positionals.push(token.clone());
            }
            Token::Word(_) => {
                return Err(ResolveError::UnknownArgument(token.clone()));
            }
        }
    }
    Ok(None)
}

/// Drop every binding that resolved to the empty string. An explicit
/// empty value on the command line suppresses fallback during the scan
/// but still ends up unset here.
pub fn finalize(resolution: &mut Resolution) {
    resolution.values.retain(|_, v| !v.is_empty());
}

/// Full pipeline: seed, scan, unset blanks. A help request short-circuits
/// before finalization so the renderer sees the values in effect.
pub fn resolve(
    spec: &ScriptSpec,
    env: &HashMap<String, String>,
    argv: &[String],
) -> Result<Outcome, ResolveError> {
    let mut resolution = seed(spec, env)?;
    if let Some(variant) = scan(spec, &mut resolution, argv)? {
        return Ok(Outcome::Help(variant, resolution));
    }
    finalize(&mut resolution);
    Ok(Outcome::Done(resolution))
}
