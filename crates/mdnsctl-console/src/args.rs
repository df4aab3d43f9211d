//! Typed argument schemas and the validator.
//!
//! Each command declares its arguments as data: an ordered list of
//! [`ArgSpec`] descriptors covering positional and flagged arguments of
//! the four supported kinds (string, integer, boolean flag, repeated
//! string). [`validate`] checks one token vector against the list and
//! either fills a [`ParsedArgs`] map or reports every problem it found.
//! Domain defaulting (timeouts, result bounds) is deliberately not done
//! here; the validator only knows about shape and type.

use std::collections::HashMap;

use crate::error::{ValidationError, ValidationFailure};

/// Kind of value an argument carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Str,
    Int,
    /// Boolean presence flag, no value token.
    Flag,
    /// Trailing repeated strings, at most `max` of them.
    StrList { max: usize },
}

/// Descriptor of a single argument.
///
/// An argument with neither a short nor a long flag is positional and is
/// filled in declaration order; at most one positional may be a
/// `StrList`, and it swallows the remaining positional tokens.
#[derive(Debug, Clone)]
pub struct ArgSpec {
    pub name: &'static str,
    pub short: Option<char>,
    pub long: Option<&'static str>,
    pub kind: ArgKind,
    pub required: bool,
    pub help: &'static str,
}

impl ArgSpec {
    /// Required positional string, the `arg_str1` shape.
    pub fn positional(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            short: None,
            long: None,
            kind: ArgKind::Str,
            required: true,
            help,
        }
    }

    /// Required positional integer.
    pub fn positional_int(name: &'static str, help: &'static str) -> Self {
        Self {
            kind: ArgKind::Int,
            ..Self::positional(name, help)
        }
    }

    /// Optional flagged string.
    pub fn opt_str(
        name: &'static str,
        short: char,
        long: &'static str,
        help: &'static str,
    ) -> Self {
        Self {
            name,
            short: Some(short),
            long: Some(long),
            kind: ArgKind::Str,
            required: false,
            help,
        }
    }

    /// Optional flagged integer; reads as 0 when not supplied, which the
    /// orchestrator maps to its per-command default.
    pub fn opt_int(
        name: &'static str,
        short: char,
        long: &'static str,
        help: &'static str,
    ) -> Self {
        Self {
            kind: ArgKind::Int,
            ..Self::opt_str(name, short, long, help)
        }
    }

    /// Boolean flag.
    pub fn flag(name: &'static str, short: char, long: &'static str, help: &'static str) -> Self {
        Self {
            kind: ArgKind::Flag,
            ..Self::opt_str(name, short, long, help)
        }
    }

    /// Trailing repeated strings, zero up to `max`.
    pub fn rest(name: &'static str, max: usize, help: &'static str) -> Self {
        Self {
            name,
            short: None,
            long: None,
            kind: ArgKind::StrList { max },
            required: false,
            help,
        }
    }

    fn is_positional(&self) -> bool {
        self.short.is_none() && self.long.is_none()
    }
}

/// A typed argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Str(String),
    Int(i64),
    Flag(bool),
    List(Vec<String>),
}

/// The validated arguments of one invocation.
///
/// Transient: owned by the handler call and discarded when it returns.
/// Accessors mirror the forgiving shape of the original console's parser:
/// an absent optional string reads as `""`, an absent integer as `0`.
#[derive(Debug, Default)]
pub struct ParsedArgs {
    values: HashMap<&'static str, ArgValue>,
}

impl ParsedArgs {
    /// String value, `""` when the argument was not supplied.
    pub fn str(&self, name: &str) -> &str {
        match self.values.get(name) {
            Some(ArgValue::Str(s)) => s,
            _ => "",
        }
    }

    /// String value only when actually supplied.
    pub fn opt_str(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ArgValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Integer value, `0` when the argument was not supplied.
    pub fn int(&self, name: &str) -> i64 {
        match self.values.get(name) {
            Some(ArgValue::Int(i)) => *i,
            _ => 0,
        }
    }

    pub fn flag(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(ArgValue::Flag(true)))
    }

    pub fn list(&self, name: &str) -> &[String] {
        match self.values.get(name) {
            Some(ArgValue::List(items)) => items,
            _ => &[],
        }
    }
}

/// True for tokens that should be matched against flag descriptors.
/// Numeric-looking tokens (`-5`) are values, not flags.
fn is_flag_token(token: &str) -> bool {
    let mut chars = token.chars();
    chars.next() == Some('-')
        && matches!(chars.next(), Some(c) if !c.is_ascii_digit())
}

/// Validates `tokens` against `specs`.
///
/// Accumulates every problem instead of failing fast; on any error the
/// caller must not run the handler.
pub fn validate(
    command: &str,
    tokens: &[String],
    specs: &[ArgSpec],
) -> Result<ParsedArgs, ValidationFailure> {
    let mut values: HashMap<&'static str, ArgValue> = HashMap::new();
    let mut errors: Vec<ValidationError> = Vec::new();

    let positionals: Vec<&ArgSpec> = specs.iter().filter(|s| s.is_positional()).collect();
    let mut next_positional = 0usize;

    let mut i = 0usize;
    while i < tokens.len() {
        let token = &tokens[i];
        i += 1;

        if is_flag_token(token) {
            let (spec, inline) = lookup_flag(specs, token);
            let Some(spec) = spec else {
                errors.push(ValidationError::UnknownArgument(token.clone()));
                continue;
            };

            match spec.kind {
                ArgKind::Flag => {
                    if inline.is_some() {
                        errors.push(ValidationError::UnknownArgument(token.clone()));
                    } else {
                        values.insert(spec.name, ArgValue::Flag(true));
                    }
                }
                ArgKind::Str | ArgKind::Int => {
                    let value = match inline {
                        Some(v) => Some(v.to_string()),
                        None => {
                            let v = tokens.get(i).cloned();
                            if v.is_some() {
                                i += 1;
                            }
                            v
                        }
                    };
                    let Some(value) = value else {
                        errors.push(ValidationError::MissingArgument(spec.name.to_string()));
                        continue;
                    };
                    if values.contains_key(spec.name) {
                        errors.push(ValidationError::TooMany(spec.name.to_string(), 1));
                        continue;
                    }
                    store_scalar(&mut values, &mut errors, spec, &value);
                }
                ArgKind::StrList { .. } => {
                    // Lists are positional-only in this console.
                    errors.push(ValidationError::UnknownArgument(token.clone()));
                }
            }
        } else {
            match positionals.get(next_positional) {
                Some(spec) => match spec.kind {
                    ArgKind::StrList { .. } => {
                        match values.entry(spec.name).or_insert(ArgValue::List(Vec::new())) {
                            ArgValue::List(items) => items.push(token.clone()),
                            _ => unreachable!("list argument holds a non-list value"),
                        }
                        // stay on the list slot; it takes the rest
                    }
                    _ => {
                        store_scalar(&mut values, &mut errors, spec, token);
                        next_positional += 1;
                    }
                },
                None => errors.push(ValidationError::UnknownArgument(token.clone())),
            }
        }
    }

    for spec in specs {
        match values.get(spec.name) {
            Some(ArgValue::List(items)) => {
                if let ArgKind::StrList { max } = spec.kind {
                    if items.len() > max {
                        errors.push(ValidationError::TooMany(spec.name.to_string(), max));
                    }
                }
            }
            Some(_) => {}
            None => {
                if spec.required {
                    errors.push(ValidationError::MissingArgument(spec.name.to_string()));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(ParsedArgs { values })
    } else {
        Err(ValidationFailure {
            command: command.to_string(),
            errors,
        })
    }
}

/// Resolves a flag token to its descriptor, splitting `--name=value`.
fn lookup_flag<'s, 't>(
    specs: &'s [ArgSpec],
    token: &'t str,
) -> (Option<&'s ArgSpec>, Option<&'t str>) {
    if let Some(rest) = token.strip_prefix("--") {
        let (name, inline) = match rest.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (rest, None),
        };
        let spec = specs.iter().find(|s| s.long == Some(name));
        (spec, inline)
    } else if let Some(rest) = token.strip_prefix('-') {
        let mut chars = rest.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => (specs.iter().find(|s| s.short == Some(c)), None),
            _ => (None, None),
        }
    } else {
        (None, None)
    }
}

fn store_scalar(
    values: &mut HashMap<&'static str, ArgValue>,
    errors: &mut Vec<ValidationError>,
    spec: &ArgSpec,
    token: &str,
) {
    match spec.kind {
        ArgKind::Str => {
            values.insert(spec.name, ArgValue::Str(token.to_string()));
        }
        ArgKind::Int => match token.parse::<i64>() {
            Ok(value) => {
                values.insert(spec.name, ArgValue::Int(value));
            }
            Err(_) => errors.push(ValidationError::TypeMismatch(spec.name.to_string())),
        },
        ArgKind::Flag | ArgKind::StrList { .. } => {
            unreachable!("scalar store for non-scalar kind")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn query_specs() -> Vec<ArgSpec> {
        vec![
            ArgSpec::positional("hostname", "Hostname that is searched for"),
            ArgSpec::opt_int("timeout", 't', "timeout", "Timeout for this query"),
            ArgSpec::opt_int("max_results", 'm', "max_results", "Maximum results returned"),
        ]
    }

    #[test]
    fn test_positional_and_flagged() {
        let args = validate("q", &toks(&["host1", "-t", "500"]), &query_specs()).unwrap();
        assert_eq!(args.str("hostname"), "host1");
        assert_eq!(args.int("timeout"), 500);
        assert_eq!(args.int("max_results"), 0);
    }

    #[test]
    fn test_long_flag_with_equals() {
        let args = validate("q", &toks(&["host1", "--timeout=250"]), &query_specs()).unwrap();
        assert_eq!(args.int("timeout"), 250);
    }

    #[test]
    fn test_negative_int_value() {
        let args = validate("q", &toks(&["host1", "-m", "-5"]), &query_specs()).unwrap();
        assert_eq!(args.int("max_results"), -5);
    }

    #[test]
    fn test_missing_required() {
        let fail = validate("q", &toks(&["-t", "500"]), &query_specs()).unwrap_err();
        assert_eq!(fail.command, "q");
        assert_eq!(
            fail.errors,
            vec![ValidationError::MissingArgument("hostname".to_string())]
        );
    }

    #[test]
    fn test_type_mismatch() {
        let fail = validate("q", &toks(&["host1", "-t", "soon"]), &query_specs()).unwrap_err();
        assert_eq!(
            fail.errors,
            vec![ValidationError::TypeMismatch("timeout".to_string())]
        );
    }

    #[test]
    fn test_unknown_flag_and_excess_positional() {
        let fail = validate("q", &toks(&["host1", "extra", "-x"]), &query_specs()).unwrap_err();
        assert_eq!(
            fail.errors,
            vec![
                ValidationError::UnknownArgument("extra".to_string()),
                ValidationError::UnknownArgument("-x".to_string()),
            ]
        );
    }

    #[test]
    fn test_errors_accumulate() {
        let fail = validate("q", &toks(&["-t", "soon", "-x"]), &query_specs()).unwrap_err();
        assert_eq!(fail.errors.len(), 3); // bad int, unknown flag, missing hostname
    }

    #[test]
    fn test_trailing_list_within_bound() {
        let specs = vec![
            ArgSpec::positional("service", "Service"),
            ArgSpec::rest("item", 3, "TXT items"),
        ];
        let args = validate("add", &toks(&["_http", "a=1", "b=2"]), &specs).unwrap();
        assert_eq!(args.str("service"), "_http");
        assert_eq!(args.list("item"), &["a=1".to_string(), "b=2".to_string()]);
    }

    #[test]
    fn test_trailing_list_too_many() {
        let specs = vec![ArgSpec::rest("item", 2, "TXT items")];
        let fail = validate("add", &toks(&["a=1", "b=2", "c=3"]), &specs).unwrap_err();
        assert_eq!(
            fail.errors,
            vec![ValidationError::TooMany("item".to_string(), 2)]
        );
    }

    #[test]
    fn test_duplicate_scalar_flag() {
        let fail =
            validate("q", &toks(&["host1", "-t", "1", "-t", "2"]), &query_specs()).unwrap_err();
        assert_eq!(
            fail.errors,
            vec![ValidationError::TooMany("timeout".to_string(), 1)]
        );
    }

    #[test]
    fn test_boolean_flag() {
        let specs = vec![
            ArgSpec::positional("service", "Service"),
            ArgSpec::flag("delegated", 'd', "delegated", "Lookup delegated services"),
        ];
        let args = validate("lookup", &toks(&["_http", "-d"]), &specs).unwrap();
        assert!(args.flag("delegated"));

        let args = validate("lookup", &toks(&["_http"]), &specs).unwrap();
        assert!(!args.flag("delegated"));
    }
}
