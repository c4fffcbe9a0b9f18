//! `lamina flags`: Show derived flags.

use std::path::PathBuf;

use clap::Args;
use lamina_module::config::load::load_config;
use lamina_module::flags::DerivedFlags;
use lamina_module::validator::validate;

/// Arguments for the `flags` command.
#[derive(Args, Debug)]
pub struct FlagsArgs {
    /// Path to the configuration record (YAML or JSON).
    #[arg(default_value = "function.yaml")]
    pub file: PathBuf,
}

/// Executes the `flags` command.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or the record is invalid.
pub fn execute(args: &FlagsArgs) -> anyhow::Result<()> {
    let config = load_config(&args.file)?;
    validate(&config)?;
    let flags = DerivedFlags::resolve(&config);
    println!("{}", serde_json::to_string_pretty(&flags)?);
    Ok(())
}
