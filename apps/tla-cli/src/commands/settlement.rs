use anyhow::Result;
use clap::Args;
use tla_core::Aggregator;

use super::fixtures::SourceArgs;
use super::print_json;

#[derive(Args, Clone, Debug)]
pub struct SettlementArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Pretty-print JSON
    #[arg(long)]
    pub pretty: bool,
}

pub async fn run(args: SettlementArgs) -> Result<()> {
    let config = args.source.config()?;
    let aggregator = Aggregator::with_config(args.source.collectors(), &config);
    let overview = aggregator
        .settlement_overview(&args.source.observation(&config))
        .await;
    print_json(&overview, args.pretty)
}
