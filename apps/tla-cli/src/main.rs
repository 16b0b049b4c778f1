use clap::{Parser, Subcommand};

mod commands;

use commands::{AdviseArgs, SchemaArgs, SettlementArgs, WatchArgs};

#[derive(Parser)]
#[command(name = "tla-cli", version, about = "Game assistant collection and advice tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one collection cycle over fixtures and print snapshot + advice (JSON)
    Advise(AdviseArgs),
    /// Print the settlement overview after a fresh cycle (JSON)
    Settlement(SettlementArgs),
    /// Print or write the config JSON schema
    Schema(SchemaArgs),
    /// Run periodic cycles and print each winning recommendation
    Watch(WatchArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tla_otel::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Advise(args) => commands::advise::run(args).await,
        Commands::Settlement(args) => commands::settlement::run(args).await,
        Commands::Schema(args) => commands::schema::run(args),
        Commands::Watch(args) => commands::watch::run(args).await,
    };
    if let Err(e) = result {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}
