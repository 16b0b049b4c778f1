pub mod advise;
pub mod fixtures;
pub mod schema;
pub mod settlement;
pub mod watch;

pub use advise::AdviseArgs;
pub use schema::SchemaArgs;
pub use settlement::SettlementArgs;
pub use watch::WatchArgs;

pub(crate) fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}
