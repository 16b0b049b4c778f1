use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tla_core::Aggregator;
use tla_protocol::Advice;
use tokio::sync::Notify;

use super::fixtures::SourceArgs;

#[derive(Args, Clone, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Seconds between cycles; overrides collection.interval_secs
    #[arg(long)]
    pub interval_secs: Option<u64>,
    /// Stop after this many cycles (default: run until Ctrl-C)
    #[arg(long)]
    pub cycles: Option<usize>,
}

pub fn winner_line(time: &str, advice: &Advice) -> String {
    match &advice.pick {
        Some(p) => match &p.detail {
            Some(detail) => format!("{time} [{}] {} ({}): {detail}", p.priority, p.title, p.agent),
            None => format!("{time} [{}] {} ({})", p.priority, p.title, p.agent),
        },
        None => format!("{time} no recommendation"),
    }
}

pub async fn run(args: WatchArgs) -> Result<()> {
    let config = args.source.config()?;
    let period = args
        .interval_secs
        .map(|s| Duration::from_secs(s.max(1)))
        .unwrap_or_else(|| config.collection.interval());
    let observation = args.source.observation(&config);
    let aggregator = Aggregator::with_config(args.source.collectors(), &config);

    let done = Arc::new(Notify::new());
    let seen = Arc::new(AtomicUsize::new(0));
    let limit = args.cycles;
    let printer = {
        let done = done.clone();
        let seen = seen.clone();
        aggregator.advice_bus().subscribe(move |env| {
            println!("{}", winner_line(&env.time, &env.payload));
            let count = seen.fetch_add(1, Ordering::SeqCst) + 1;
            if limit.is_some_and(|n| count >= n) {
                done.notify_one();
            }
        })
    };

    let shutdown = async {
        tokio::select! {
            _ = done.notified() => {}
            res = tokio::signal::ctrl_c() => {
                if let Err(err) = res {
                    tracing::warn!(%err, "ctrl-c listener failed");
                    std::future::pending::<()>().await;
                }
            }
        }
    };
    let cycles = if limit == Some(0) {
        0
    } else {
        aggregator.run_periodic(&observation, period, shutdown).await
    };
    printer.unsubscribe();
    tracing::info!(cycles, "watch finished");
    Ok(())
}
