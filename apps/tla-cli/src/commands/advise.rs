use anyhow::Result;
use clap::Args;
use serde_json::json;
use tla_core::Aggregator;

use super::fixtures::SourceArgs;
use super::print_json;

#[derive(Args, Clone, Debug)]
pub struct AdviseArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Include the per-collector cycle report
    #[arg(long)]
    pub report: bool,
    /// Pretty-print JSON
    #[arg(long)]
    pub pretty: bool,
}

/// One cycle over the fixtures; prints the snapshot and its advice.
pub async fn run(args: AdviseArgs) -> Result<()> {
    let config = args.source.config()?;
    let aggregator = Aggregator::with_config(args.source.collectors(), &config);
    let report = aggregator
        .run_cycle(&args.source.observation(&config))
        .await;
    let mut out = json!({
        "snapshot": aggregator.snapshot(),
        "advice": aggregator.advice(),
    });
    if args.report {
        out["report"] = serde_json::to_value(&report)?;
    }
    print_json(&out, args.pretty)
}
