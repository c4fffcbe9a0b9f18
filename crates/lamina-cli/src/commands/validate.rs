//! `lamina validate`: Check a configuration record.

use std::path::PathBuf;

use clap::Args;
use lamina_module::config::load::load_config;
use lamina_module::validator::collect_violations;

/// Arguments for the `validate` command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the configuration record (YAML or JSON).
    #[arg(default_value = "function.yaml")]
    pub file: PathBuf,
}

/// Executes the `validate` command.
///
/// Prints every violation, not just the first.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or the record is invalid.
pub fn execute(args: &ValidateArgs) -> anyhow::Result<()> {
    tracing::info!(file = %args.file.display(), "validating configuration");
    let config = load_config(&args.file)?;
    let violations = collect_violations(&config);
    if violations.is_empty() {
        println!("{} is valid", args.file.display());
        return Ok(());
    }

    println!("{}: {} violation(s)", args.file.display(), violations.len());
    for violation in &violations {
        println!("  - {violation}");
    }
    anyhow::bail!("configuration is invalid")
}
