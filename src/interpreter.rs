use crate::command::{CommandHandler, CommandRegistry, normalize_name};
use crate::config::ShellConfig;
use crate::error::{RegistryError, ShellError};
use crate::events::{Notifications, SubscriptionId};
use crate::io_adapters::{EditorSource, LineSource, SharedOutput, shared_output, write_line};
use crate::lexer;
use std::any::Any;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable handle that asks a running [`Shell`] to stop.
///
/// The request is cooperative: the loop checks it before each read, so a
/// read that is already blocking still returns one more line, which is
/// processed to completion before the loop exits.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    requested: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.requested.store(false, Ordering::SeqCst);
    }
}

/// What [`Shell::dispatch_line`] did with a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The line was blank or produced no tokens. No listener was notified.
    Ignored,
    /// A registered handler ran and returned successfully.
    Handled,
    /// No command with that name is registered.
    Unknown,
}

/// An embeddable command console.
///
/// A shell owns its command registry, its notification listeners and its
/// stop flag, so several shells can live in one process without sharing
/// state. Every method takes `&self`: commands and listeners may be added
/// from a handler or from another thread while [`Shell::run`] is looping.
///
/// Example
/// ```
/// use console_commands::{Dispatch, Shell};
/// let shell = Shell::default();
/// shell.register("greet", |args| {
///     println!("hello, {}", args.join(" "));
///     Ok(())
/// }).unwrap();
/// assert_eq!(shell.dispatch_line("GREET \"Ada Lovelace\"").unwrap(), Dispatch::Handled);
/// assert_eq!(shell.dispatch_line("wave").unwrap(), Dispatch::Unknown);
/// ```
pub struct Shell {
    config: ShellConfig,
    commands: Arc<CommandRegistry>,
    notifications: Notifications,
    stop: StopHandle,
    output: SharedOutput,
}

impl Shell {
    /// Create a shell with no commands, writing unhandled errors to stdout.
    pub fn new(config: ShellConfig) -> Self {
        Self {
            config,
            commands: Arc::new(CommandRegistry::new()),
            notifications: Notifications::default(),
            stop: StopHandle::default(),
            output: shared_output(std::io::stdout()),
        }
    }

    /// Replace the console channel used for unhandled errors and builtins.
    pub fn with_output(mut self, writer: impl Write + Send + 'static) -> Self {
        self.output = shared_output(writer);
        self
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn output(&self) -> SharedOutput {
        self.output.clone()
    }

    pub fn commands(&self) -> Arc<CommandRegistry> {
        self.commands.clone()
    }

    /// Register a command. See [`CommandRegistry::register`].
    pub fn register<F>(&self, name: &str, handler: F) -> Result<(), RegistryError>
    where
        F: Fn(&[String]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.commands.register(name, handler)
    }

    /// Listen for every non-empty command line, registered or not. Fires
    /// before the command is dispatched.
    pub fn on_command<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&str, &[String]) + Send + Sync + 'static,
    {
        self.notifications.command.subscribe(Arc::new(listener))
    }

    pub fn remove_command_listener(&self, id: SubscriptionId) -> bool {
        self.notifications.command.unsubscribe(id)
    }

    /// Listen for command names with no registered handler.
    pub fn on_unknown_command<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&str, &[String]) + Send + Sync + 'static,
    {
        self.notifications.unknown_command.subscribe(Arc::new(listener))
    }

    pub fn remove_unknown_command_listener(&self, id: SubscriptionId) -> bool {
        self.notifications.unknown_command.unsubscribe(id)
    }

    /// Listen for errors contained by the loop. While at least one error
    /// listener exists, nothing is printed for errors, unless an error
    /// listener panics; then the error is printed after all.
    pub fn on_error<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&ShellError) + Send + Sync + 'static,
    {
        self.notifications.error.subscribe(Arc::new(listener))
    }

    pub fn remove_error_listener(&self, id: SubscriptionId) -> bool {
        self.notifications.error.unsubscribe(id)
    }

    /// Request the loop to stop; see [`StopHandle`].
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_stop_requested()
    }

    /// Read and dispatch lines from `source` until stopped.
    ///
    /// Clears any earlier stop request first. Errors raised while reading or
    /// by handlers are reported and the loop carries on. End of input counts
    /// as a stop request.
    pub fn run<S: LineSource + ?Sized>(&self, source: &mut S) {
        self.stop.reset();
        tracing::info!("console loop started");

        while !self.stop.is_stop_requested() {
            let line = match source.read_line() {
                Ok(Some(line)) => line,
                Ok(None) => {
                    tracing::info!("end of input, stopping console loop");
                    self.stop.stop();
                    break;
                }
                Err(err) => {
                    self.report(ShellError::Input(err));
                    continue;
                }
            };

            if let Err(err) = self.dispatch_line(&line) {
                self.report(err);
            }
        }

        tracing::info!("console loop stopped");
    }

    /// Run the loop on the terminal, with line editing and the configured prompt.
    pub fn run_interactive(&self) -> Result<(), ShellError> {
        let mut source = EditorSource::new(self.config.prompt.clone())
            .map_err(|err| ShellError::Editor(err.to_string()))?;
        self.run(&mut source);
        Ok(())
    }

    /// Tokenize one line and dispatch it.
    ///
    /// The first token, lowercased, is the command; the rest are its
    /// arguments. Command listeners are told first, then either the handler
    /// runs or the unknown-command listeners are told.
    pub fn dispatch_line(&self, line: &str) -> Result<Dispatch, ShellError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Dispatch::Ignored);
        }

        let mut tokens = lexer::split_into_tokens(line).into_iter();
        let Some(first) = tokens.next() else {
            return Ok(Dispatch::Ignored);
        };
        let command = normalize_name(&first);
        let args: Vec<String> = tokens.collect();
        tracing::debug!(command = %command, ?args, "dispatching");

        self.guarded(|| self.notifications.command.notify(&command, &args))
            .map_err(|message| ShellError::ListenerPanicked {
                event: "command",
                message,
            })?;

        match self.commands.lookup(&command) {
            Some(handler) => {
                self.invoke(&command, &handler, &args)?;
                Ok(Dispatch::Handled)
            }
            None => {
                tracing::debug!(command = %command, "unknown command");
                self.guarded(|| self.notifications.unknown_command.notify(&command, &args))
                    .map_err(|message| ShellError::ListenerPanicked {
                        event: "unknown command",
                        message,
                    })?;
                Ok(Dispatch::Unknown)
            }
        }
    }

    /// Runs `f`, turning a panic into its message when panics are caught.
    fn guarded<T>(&self, f: impl FnOnce() -> T) -> Result<T, String> {
        if !self.config.catch_panics {
            return Ok(f());
        }
        panic::catch_unwind(AssertUnwindSafe(f))
            .map_err(|payload| panic_message(payload.as_ref()))
    }

    fn invoke(
        &self,
        command: &str,
        handler: &CommandHandler,
        args: &[String],
    ) -> Result<(), ShellError> {
        let outcome = self.guarded(|| handler(args)).map_err(|message| {
            ShellError::HandlerPanicked {
                command: command.to_string(),
                message,
            }
        })?;

        outcome.map_err(|source| ShellError::Handler {
            command: command.to_string(),
            source,
        })
    }

    fn report(&self, error: ShellError) {
        tracing::warn!(%error, "error in console loop");
        match self.guarded(|| self.notifications.error.notify(&error)) {
            Ok(true) => return,
            Ok(false) => {}
            Err(message) => tracing::warn!(%message, "error listener panicked"),
        }
        let text = format!("{}{}", self.config.error_prefix, error);
        if let Err(err) = write_line(&self.output, &text) {
            tracing::error!(%err, "failed to write error to console");
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new(ShellConfig::default())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
