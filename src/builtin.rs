use crate::command::CommandRegistry;
use crate::error::RegistryError;
use crate::interpreter::{Shell, StopHandle};
use crate::io_adapters::{SharedOutput, write_line};
use anyhow::Result;
use argh::{EarlyExit, FromArgs};
use std::io::Write;
use std::sync::{Arc, PoisonError};

/// Commands shipped with the crate that a host may install on its shell.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`), so `--help`
/// prints their usage and bad arguments fail like any other handler.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "echo" or "exit".
    fn name() -> &'static str;

    fn execute(self, ctx: &BuiltinContext) -> Result<()>;
}

/// What a builtin may touch: the console, the registry and the stop flag of
/// the shell it was installed on.
pub(crate) struct BuiltinContext {
    output: SharedOutput,
    commands: Arc<CommandRegistry>,
    stop: StopHandle,
}

fn install<T: BuiltinCommand + 'static>(
    shell: &Shell,
    ctx: Arc<BuiltinContext>,
) -> Result<(), RegistryError> {
    shell.register(T::name(), move |args: &[String]| {
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();
        match T::from_args(&[T::name()], &argv) {
            Ok(cmd) => cmd.execute(&ctx),
            Err(EarlyExit { output, status }) => match status {
                Ok(()) => {
                    write_line(&ctx.output, output.trim_end())?;
                    Ok(())
                }
                Err(()) => Err(anyhow::anyhow!(output.trim_end().to_string())),
            },
        }
    })
}

/// Register `echo`, `help` and `exit` on `shell`.
///
/// Fails if any of those names is already taken.
pub fn install_builtins(shell: &Shell) -> Result<(), RegistryError> {
    let ctx = Arc::new(BuiltinContext {
        output: shell.output(),
        commands: shell.commands(),
        stop: shell.stop_handle(),
    });
    install::<Echo>(shell, ctx.clone())?;
    install::<Help>(shell, ctx.clone())?;
    install::<Exit>(shell, ctx)
}

#[derive(FromArgs)]
/// write the arguments to the console, separated by spaces.
/// by default, a trailing newline is printed.
pub(crate) struct Echo {
    #[argh(switch, short = 'n')]
    /// do not output the trailing newline.
    pub no_newline: bool,

    #[argh(positional, greedy)]
    /// values to print as-is, separated by spaces.
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn execute(self, ctx: &BuiltinContext) -> Result<()> {
        let text = self.args.join(" ");
        if !self.no_newline {
            write_line(&ctx.output, &text)?;
            return Ok(());
        }
        let mut out = ctx.output.lock().unwrap_or_else(PoisonError::into_inner);
        out.write_all(text.as_bytes())?;
        out.flush()?;
        Ok(())
    }
}

#[derive(FromArgs)]
/// list the registered commands.
pub(crate) struct Help {}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn execute(self, ctx: &BuiltinContext) -> Result<()> {
        write_line(&ctx.output, "Available commands:")?;
        for name in ctx.commands.names() {
            write_line(&ctx.output, &format!("  {name}"))?;
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// stop the console once this command returns.
pub(crate) struct Exit {}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, ctx: &BuiltinContext) -> Result<()> {
        tracing::info!("exit requested");
        ctx.stop.stop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShellError;
    use crate::interpreter::Dispatch;
    use crate::io_adapters::{MemWriter, ReaderSource};
    use std::io::Cursor;

    fn shell_with_builtins() -> (Shell, MemWriter) {
        let writer = MemWriter::new();
        let shell = Shell::default().with_output(writer.clone());
        install_builtins(&shell).unwrap();
        (shell, writer)
    }

    #[test]
    fn test_echo_with_and_without_newline() {
        let (shell, writer) = shell_with_builtins();

        shell.dispatch_line("echo hello \"big world\"").unwrap();
        shell.dispatch_line("echo -n foo").unwrap();
        shell.dispatch_line("echo -n bar").unwrap();
        shell.dispatch_line("ECHO baz").unwrap();

        assert_eq!(writer.contents(), "hello big world\nfoobarbaz\n");
    }

    #[test]
    fn test_echo_parses_flags() {
        let Ok(echo) = Echo::from_args(&["echo"], &["-n", "a", "b"]) else {
            panic!("echo arguments should parse");
        };
        assert!(echo.no_newline);
        assert_eq!(echo.args, ["a", "b"]);
    }

    #[test]
    fn test_help_lists_commands_sorted() {
        let (shell, writer) = shell_with_builtins();
        shell.register("Zap", |_| Ok(())).unwrap();

        shell.dispatch_line("help").unwrap();

        assert_eq!(
            writer.contents(),
            "Available commands:\n  echo\n  exit\n  help\n  zap\n"
        );
    }

    #[test]
    fn test_help_flag_prints_usage() {
        let (shell, writer) = shell_with_builtins();

        assert_eq!(shell.dispatch_line("echo --help").unwrap(), Dispatch::Handled);
        assert!(writer.contents().contains("Usage: echo"));
    }

    #[test]
    fn test_bad_arguments_fail_the_handler() {
        let (shell, _) = shell_with_builtins();

        let err = shell.dispatch_line("exit now").unwrap_err();
        assert!(matches!(err, ShellError::Handler { .. }));
        assert_eq!(err.command(), Some("exit"));
        assert!(!shell.is_stopped());
    }

    #[test]
    fn test_exit_stops_the_loop() {
        let (shell, writer) = shell_with_builtins();

        let mut source = ReaderSource::new(Cursor::new("echo one\nexit\necho two\n"));
        shell.run(&mut source);

        assert!(shell.is_stopped());
        assert_eq!(writer.contents(), "one\n");
    }

    #[test]
    fn test_installing_twice_is_rejected() {
        let (shell, _) = shell_with_builtins();

        assert_eq!(
            install_builtins(&shell),
            Err(RegistryError::DuplicateCommand {
                name: "echo".to_string()
            })
        );
    }
}
