//! `lilfetch`: provision the Python environment, then run the MCP server.

use clap::{Parser, Subcommand};

use launcher::bootstrap::{bootstrap, bootstrap_and_launch};
use launcher::error::LaunchError;
use launcher::exit_codes;
use launcher::io::command::SystemRunner;
use launcher::io::config::{LauncherSettings, load_launcher_config};
use launcher::io::progress::Progress;
use launcher::logging;

#[derive(Parser)]
#[command(
    name = "lilfetch",
    version,
    about = "Bootstrap a Python environment and launch the lilFetch MCP server"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve Python and provision the environment without starting the server.
    Setup,
}

fn main() {
    let cli = Cli::parse();
    logging::init();
    std::process::exit(run(&cli));
}

fn run(cli: &Cli) -> i32 {
    let config = match load_launcher_config() {
        Ok(config) => config,
        Err(err) => {
            let err = LaunchError::Config(format!("{err:#}"));
            Progress::new(LauncherSettings::default().display_name).line(&err);
            return err.exit_code();
        }
    };
    let progress = Progress::new(&config.display_name);
    let runner = SystemRunner;

    let result = match cli.command {
        Some(Command::Setup) => bootstrap(&runner, &config, &progress).map(|_| {
            println!("Python setup complete for {}!", config.display_name);
            exit_codes::OK
        }),
        None => bootstrap_and_launch(&runner, &config, &progress),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            progress.line(&err);
            err.exit_code()
        }
    }
}
