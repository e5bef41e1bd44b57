//! An embeddable interactive command console.
//!
//! A [`Shell`] reads lines from a [`LineSource`], splits each one into tokens
//! with [`tokenize`] (double quotes group words, a backslash escapes the next
//! character), and calls the handler registered under the first token. The
//! remaining tokens are passed to the handler as its arguments.
//!
//! Hosts observe the loop through listeners: every command that is seen,
//! every unknown command, and every error a handler raises. Errors never
//! end the loop; only [`Shell::stop`] or the end of input does.
//!
//! ```
//! use console_commands::{ReaderSource, Shell};
//! use std::io::Cursor;
//!
//! let shell = Shell::default();
//! let stop = shell.stop_handle();
//! shell.register("quit", move |_| {
//!     stop.stop();
//!     Ok(())
//! }).unwrap();
//! shell.on_unknown_command(|command, _| eprintln!("unknown command: {command}"));
//!
//! shell.run(&mut ReaderSource::new(Cursor::new("hello\nquit\nnever read\n")));
//! assert!(shell.is_stopped());
//! ```

mod builtin;
pub mod command;
mod config;
pub mod error;
pub mod events;
mod interpreter;
pub mod io_adapters;
mod lexer;

pub use builtin::install_builtins;
pub use command::{CommandHandler, CommandRegistry};
pub use config::ShellConfig;
pub use error::{RegistryError, ShellError};
pub use events::SubscriptionId;
pub use interpreter::{Dispatch, Shell, StopHandle};
pub use io_adapters::{EditorSource, LineSource, ReaderSource};

/// Splits a line into tokens. See [`split_into_tokens`].
pub use lexer::split_into_tokens as tokenize;
pub use lexer::split_into_tokens;
