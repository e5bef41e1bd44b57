use anyhow::{Context, Result};
use argh::FromArgs;
use console_commands::io_adapters::write_line;
use console_commands::{ReaderSource, Shell, ShellConfig, install_builtins};
use std::fs::File;
use std::io::{BufReader, IsTerminal};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// interactive command console.
struct Args {
    #[argh(option, default = "String::from(\"> \")")]
    /// prompt shown before each line.
    prompt: String,

    #[argh(option)]
    /// read commands from this file instead of the terminal; piped
    /// standard input is read the same way.
    script: Option<PathBuf>,

    #[argh(option)]
    /// log filter such as `debug`; defaults to RUST_LOG, then `warn`.
    log: Option<String>,

    #[argh(switch)]
    /// do not register the builtin echo, help and exit commands.
    no_builtins: bool,
}

fn init_logging(filter: Option<&str>) -> Result<()> {
    let filter = match filter {
        Some(filter) => EnvFilter::try_new(filter)
            .with_context(|| format!("invalid log filter `{filter}`"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

/// Handler panics are contained and reported by the shell, so the hook only
/// logs them instead of printing the default panic banner.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        tracing::error!(panic = %info, "panic");
    }));
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();
    init_logging(args.log.as_deref())?;
    install_panic_hook();

    let shell = Shell::new(ShellConfig::default().with_prompt(args.prompt));
    if !args.no_builtins {
        install_builtins(&shell)?;
    }

    let output = shell.output();
    shell.on_unknown_command(move |command, _args| {
        if let Err(err) = write_line(&output, &format!("unknown command: {command}")) {
            tracing::error!(%err, "failed to write to console");
        }
    });

    match args.script {
        Some(path) => {
            let file = File::open(&path)
                .with_context(|| format!("can't open script {}", path.display()))?;
            shell.run(&mut ReaderSource::new(BufReader::new(file)));
        }
        None if !std::io::stdin().is_terminal() => shell.run(&mut ReaderSource::stdin()),
        None => shell.run_interactive()?,
    }
    Ok(())
}
