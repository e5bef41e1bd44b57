//! Error types surfaced by the registry and by the dispatch loop.

use std::io;

use thiserror::Error;

/// Failure to add a command to a [`CommandRegistry`](crate::command::CommandRegistry).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A command with the same case-insensitive name is already registered.
    #[error("command `{name}` is already registered")]
    DuplicateCommand {
        /// Normalized (lowercase) name of the rejected command.
        name: String,
    },
}

/// Failure raised while reading or dispatching a line.
///
/// Inside [`Shell::run`](crate::Shell::run) these never escape the loop: they
/// are handed to the "on error" listeners, or printed when there are none.
#[derive(Debug, Error)]
pub enum ShellError {
    /// A registered handler returned an error.
    #[error("command `{command}` failed: {source:#}")]
    Handler {
        command: String,
        #[source]
        source: anyhow::Error,
    },

    /// A registered handler panicked.
    #[error("command `{command}` panicked: {message}")]
    HandlerPanicked { command: String, message: String },

    /// A notification listener panicked while being told about `event`.
    #[error("{event} listener panicked: {message}")]
    ListenerPanicked { event: &'static str, message: String },

    /// The line source failed to produce a line.
    #[error("failed to read input: {0}")]
    Input(#[from] io::Error),

    /// The interactive line editor could not be created.
    #[error("failed to start line editor: {0}")]
    Editor(String),
}

impl ShellError {
    /// Name of the command that produced this error, if one was being run.
    pub fn command(&self) -> Option<&str> {
        match self {
            ShellError::Handler { command, .. } | ShellError::HandlerPanicked { command, .. } => {
                Some(command)
            }
            ShellError::ListenerPanicked { .. } | ShellError::Input(_) | ShellError::Editor(_) => {
                None
            }
        }
    }
}
