mod client;
mod config;
mod logging;
mod server;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result};

use client::{BridgeClient, ChargingEvent, ClientError};
use config::{LogLevel, UserConfig};
use logging::LogMode;

#[derive(Debug, Parser)]
#[command(
    name = "limit-battery",
    version,
    about = "Battery level queries and charging-state streaming over a local socket"
)]
struct Cli {
    /// Override the configured log level
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the bridge server
    #[command(alias = "s")]
    Serve {
        /// Detach and run in the background
        #[arg(short, long)]
        daemon: bool,
    },

    /// Print the current battery level (default)
    #[command(alias = "l")]
    Level,

    /// Stream charging-state events until interrupted
    #[command(alias = "w")]
    Watch,

    /// Stop a running server
    Stop,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = UserConfig::load();

    match cli.command.unwrap_or(Commands::Level) {
        Commands::Serve { daemon } => serve(daemon, config, cli.log_level),
        Commands::Level => level(),
        Commands::Watch => watch(),
        Commands::Stop => stop(),
    }
}

fn serve(daemon: bool, config: UserConfig, log_override: Option<LogLevel>) -> Result<()> {
    // The daemonized path initializes file logging after forking.
    let _guard = if !daemon {
        Some(logging::init(config.log_level, LogMode::Stderr, log_override))
    } else {
        None
    };

    server::run_server(!daemon, config, log_override)?;
    Ok(())
}

fn connect() -> Result<BridgeClient> {
    BridgeClient::connect_with_version_check().map_err(|e| match e {
        ClientError::Connection(_) => {
            eyre!("Could not connect to the server. Start it with: limit-battery serve")
        }
        other => eyre!(other),
    })
}

fn level() -> Result<()> {
    let mut client = connect()?;
    match client.get_battery_level() {
        Ok(level) => {
            println!("{}%", level);
            Ok(())
        }
        Err(ClientError::Channel(error)) => {
            eprintln!("{}", error.message);
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

fn watch() -> Result<()> {
    let mut client = connect()?;
    client.listen()?;
    eprintln!("Listening for charging-state changes (Ctrl-C to stop)");

    loop {
        match client.next_event()? {
            ChargingEvent::State(state) => println!("{}", state),
            ChargingEvent::Error(error) => eprintln!("{}: {}", error.code, error.message),
        }
    }
}

fn stop() -> Result<()> {
    if !server::is_server_running() {
        eprintln!("Server is not running");
        return Ok(());
    }

    let mut client = BridgeClient::connect()?;
    client.shutdown()?;
    println!("Server stopped");
    Ok(())
}
