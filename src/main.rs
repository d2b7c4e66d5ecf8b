//! Eyebreak CLI - a periodic break reminder
//!
//! Reminds you to look away from the screen:
//! - 20 minutes of focused work
//! - a warning 30 seconds before the break
//! - a 20 second break, then back to work

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser};

use eyebreak::cli::{Cli, Commands, DaemonArgs, Display, IpcClient};
use eyebreak::daemon::ipc::default_socket_path;
use eyebreak::daemon::service::{self, DaemonOptions};

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose, matches!(cli.command, Some(Commands::Daemon(_))));

    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` wins; otherwise the daemon logs at `info` and the client at `warn`.
fn init_tracing(verbose: bool, daemon: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = match (verbose, daemon) {
        (true, _) => "debug",
        (false, true) => "info",
        (false, false) => "warn",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = fmt().with_env_filter(filter).with_target(false);
    if daemon {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    // Completions work without a home directory.
    let socket_path = cli.socket.map_or_else(default_socket_path, Ok);

    match command {
        Commands::Start => Display::show_result(&client(socket_path?).start().await?),
        Commands::Pause => Display::show_result(&client(socket_path?).pause().await?),
        Commands::Resume => Display::show_result(&client(socket_path?).resume().await?),
        Commands::Toggle => Display::show_result(&client(socket_path?).toggle().await?),
        Commands::Skip => Display::show_result(&client(socket_path?).skip().await?),
        Commands::Sleep => Display::show_result(&client(socket_path?).sleep().await?),
        Commands::Wake => Display::show_result(&client(socket_path?).wake().await?),
        Commands::Status => Display::show_status(&client(socket_path?).status().await?),
        Commands::Daemon(args) => run_daemon(socket_path?, args).await?,
        Commands::Completions { shell } => generate_completions(shell),
    }

    Ok(())
}

fn client(socket_path: PathBuf) -> IpcClient {
    IpcClient::with_socket_path(socket_path)
}

async fn run_daemon(socket_path: PathBuf, args: DaemonArgs) -> Result<()> {
    service::run(DaemonOptions {
        socket_path,
        config_path: args.config,
        detect_suspend: !args.no_suspend_detection,
    })
    .await
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
