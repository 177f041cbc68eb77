//! FlowLayer CLI - Command-line interface
//!
//! This binary provides a command-line interface to the FlowLayer library:
//! a headless simulation run, route file inspection, and configuration
//! management.

mod commands;
mod error;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::inspect::InspectArgs;
use commands::simulate::SimulateArgs;

#[derive(Debug, Parser)]
#[command(name = "flowlayer", version, about = "Animated particle-flow routes over external map renderers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the animation headlessly against a simulated host
    Simulate {
        /// Route file URLs (defaults to the configured routes.files)
        routes: Vec<String>,

        /// How long to run, in seconds
        #[arg(long, default_value_t = 10)]
        duration: u64,

        /// Host paint rate in frames per second
        #[arg(long, default_value_t = 30)]
        fps: u32,
    },

    /// Fetch route files and report their contents
    Inspect {
        /// Route file URLs (defaults to the configured routes.files)
        routes: Vec<String>,
    },

    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = flowlayer::config::ConfigFile::load()
        .map(|config| config.log_filter)
        .unwrap_or_else(|_| "info".to_string());
    flowlayer::logging::init(&filter);

    let result = match cli.command {
        Commands::Simulate {
            routes,
            duration,
            fps,
        } => commands::simulate::run(SimulateArgs {
            routes,
            duration_secs: duration,
            fps,
        }),
        Commands::Inspect { routes } => commands::inspect::run(InspectArgs { routes }),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
