//! `lamina graph`: Print the declared resource graph.

use std::path::PathBuf;

use clap::Args;

use super::Globals;

/// Arguments for the `graph` command.
#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Path to the configuration record (YAML or JSON).
    #[arg(default_value = "function.yaml")]
    pub file: PathBuf,

    /// Emit the full graph as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `graph` command.
///
/// # Errors
///
/// Returns an error if resolution or serialization fails.
pub fn execute(args: &GraphArgs, globals: &Globals) -> anyhow::Result<()> {
    let (_, resolution) = globals.resolve_file(&args.file)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&resolution.graph)?);
        return Ok(());
    }

    for node in resolution.graph.nodes() {
        println!("{} [{}]", node.key, node.kind);
        for (name, value) in &node.fields {
            println!("    {name} = {value}");
        }
    }
    Ok(())
}
