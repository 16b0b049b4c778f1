use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::print_json;

#[derive(Args, Clone, Debug)]
pub struct SchemaArgs {
    /// Write the schema here instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: SchemaArgs) -> Result<()> {
    match args.out {
        Some(path) => {
            let target = path.to_str().context("output path is not valid UTF-8")?;
            tla_core::write_schema_file(target)
                .with_context(|| format!("writing schema to {target}"))?;
            eprintln!("wrote {target}");
            Ok(())
        }
        None => print_json(&tla_core::config_schema_json(), true),
    }
}
