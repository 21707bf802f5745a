use clap::{Parser, Subcommand};
use std::process;
use tracing::error;

mod cmd;
mod sinks;

#[derive(Parser, Debug)]
#[command(author, version, about = "nested sampling over parallel constrained walks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Run(cmd::run::RunArgs),
}

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            if let Err(e) = cmd::run::run(args) {
                error!("❌ {}", e);
                process::exit(e.exit_code());
            }
        }
    }
}
