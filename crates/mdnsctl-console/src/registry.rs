//! Command registry and dispatcher.
//!
//! The registry maps command names to their argument schema and handler.
//! It is populated once at console startup and read-only afterwards;
//! dispatch resolves the first token, validates the rest against the
//! schema and maps the handler outcome to a process-style exit code.

use std::collections::BTreeMap;
use std::fmt::Write;

use tracing::debug;

use crate::args::{validate, ArgKind, ArgSpec, ParsedArgs};
use crate::error::{CommandError, RegistryError, ValidationError};

/// Outcome of a command handler.
pub type CommandResult = Result<(), CommandError>;

/// Outcome of registering a batch of commands.
pub type RegistryResult = Result<(), RegistryError>;

/// A command handler. Receives the validated arguments; prints its own
/// success output and returns `Err` for a failure the dispatcher reports.
pub type Handler = Box<dyn Fn(&ParsedArgs) -> CommandResult + Send + Sync>;

/// A registered command: name, help line, argument schema and handler.
/// Immutable after registration.
pub struct CommandSpec {
    pub name: &'static str,
    pub help: &'static str,
    pub args: Vec<ArgSpec>,
    pub handler: Handler,
}

impl CommandSpec {
    pub fn new(
        name: &'static str,
        help: &'static str,
        args: Vec<ArgSpec>,
        handler: impl Fn(&ParsedArgs) -> CommandResult + Send + Sync + 'static,
    ) -> Self {
        // Argument names and flag letters must be unique within a command.
        debug_assert!(
            args.iter()
                .enumerate()
                .all(|(i, a)| args[..i].iter().all(|b| {
                    b.name != a.name
                        && (a.short.is_none() || b.short != a.short)
                        && (a.long.is_none() || b.long != a.long)
                })),
            "duplicate argument name or flag in command '{}'",
            name
        );
        Self {
            name,
            help,
            args,
            handler: Box::new(handler),
        }
    }

    /// One-line usage string, e.g.
    /// `mdns_query_ptr <service> <proto> [-t <timeout>] [-m <max_results>]`.
    fn usage(&self) -> String {
        let mut line = self.name.to_string();
        for arg in &self.args {
            match (arg.short, arg.kind) {
                (None, ArgKind::StrList { max }) => {
                    let _ = write!(line, " [{}...<={}]", arg.name, max);
                }
                (None, _) => {
                    let _ = write!(line, " <{}>", arg.name);
                }
                (Some(short), ArgKind::Flag) => {
                    let _ = write!(line, " [-{}]", short);
                }
                (Some(short), _) => {
                    let _ = write!(line, " [-{} <{}>]", short, arg.name);
                }
            }
        }
        line
    }
}

/// Process-wide command table. Populated once, then only read.
#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<&'static str, CommandSpec>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command; a second registration under the same name is
    /// a startup bug and fails.
    pub fn register(&mut self, spec: CommandSpec) -> Result<(), RegistryError> {
        if self.commands.contains_key(spec.name) {
            return Err(RegistryError::DuplicateCommand(spec.name.to_string()));
        }
        self.commands.insert(spec.name, spec);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Dispatches one tokenized line and returns its exit code.
    ///
    /// Validation errors go to stderr prefixed with the command name, all
    /// of them; the handler only runs on a fully valid line. A handler
    /// failure is reported as `ERROR: <message>`. No outcome terminates
    /// the dispatch loop.
    pub fn dispatch(&self, tokens: &[String]) -> i32 {
        let Some(name) = tokens.first() else {
            return 0;
        };

        // `help` is built into the shell, like the original console's.
        if name == "help" && !self.commands.contains_key(name.as_str()) {
            print!("{}", self.render_help());
            return 0;
        }

        let Some(spec) = self.commands.get(name.as_str()) else {
            eprintln!("{}", ValidationError::UnknownCommand(name.clone()));
            return 1;
        };

        match validate(name, &tokens[1..], &spec.args) {
            Ok(args) => {
                debug!(command = name.as_str(), "Dispatching");
                match (spec.handler)(&args) {
                    Ok(()) => 0,
                    Err(err) => {
                        eprintln!("ERROR: {}", err);
                        1
                    }
                }
            }
            Err(failure) => {
                for error in &failure.errors {
                    eprintln!("{}: {}", failure.command, error);
                }
                eprintln!("usage: {}", spec.usage());
                1
            }
        }
    }

    /// Command list with usage lines, sorted by name.
    pub fn render_help(&self) -> String {
        let mut out = String::new();
        for spec in self.commands.values() {
            let _ = writeln!(out, "{}", spec.usage());
            let _ = writeln!(out, "    {}", spec.help);
        }
        out
    }
}
