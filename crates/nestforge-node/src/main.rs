use clap::{Parser, Subcommand};
use uuid::Uuid;

mod worker;

#[derive(Parser)]
#[command(author, version, about = "nestforge remote walk worker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Hive (dispatcher) URL
    #[arg(long, default_value = "http://localhost:3000")]
    hive: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Connects to the hive and starts processing walk shards
    Work,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    // Session id for this process; the hive hands out the canonical
    // worker id at registration.
    let session = format!(
        "node-{}",
        Uuid::new_v4().to_string().split('-').next().unwrap_or("0")
    );

    match cli.command {
        Commands::Work => worker::run_worker(cli.hive, session).await,
    }
}
