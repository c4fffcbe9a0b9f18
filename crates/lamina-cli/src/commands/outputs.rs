//! `lamina outputs`: Print the module outputs.

use std::path::PathBuf;

use clap::Args;

use super::Globals;

/// Arguments for the `outputs` command.
#[derive(Args, Debug)]
pub struct OutputsArgs {
    /// Path to the configuration record (YAML or JSON).
    #[arg(default_value = "function.yaml")]
    pub file: PathBuf,
}

/// Executes the `outputs` command.
///
/// # Errors
///
/// Returns an error if resolution or serialization fails.
pub fn execute(args: &OutputsArgs, globals: &Globals) -> anyhow::Result<()> {
    let (_, resolution) = globals.resolve_file(&args.file)?;
    println!("{}", serde_json::to_string_pretty(&resolution.outputs)?);
    Ok(())
}
