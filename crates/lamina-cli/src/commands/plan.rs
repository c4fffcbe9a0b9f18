//! `lamina plan`: Display the deployment order of the resolved resources.

use std::path::PathBuf;

use clap::Args;

use super::Globals;
use crate::output::heading;

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Path to the configuration record (YAML or JSON).
    #[arg(default_value = "function.yaml")]
    pub file: PathBuf,
}

/// Executes the `plan` command.
///
/// Resolves the record, orders the graph topologically, and prints each
/// resource after the resources it depends on.
///
/// # Errors
///
/// Returns an error if resolution or ordering fails.
pub fn execute(args: &PlanArgs, globals: &Globals) -> anyhow::Result<()> {
    let (config, resolution) = globals.resolve_file(&args.file)?;
    let order = resolution.plan()?;

    println!(
        "{}",
        heading(&format!("Deployment Plan for: {}", config.function_name))
    );
    println!();

    for key in &order {
        let Some(node) = resolution.graph.get(key.as_str()) else {
            continue;
        };
        println!("  + {key} ({})", node.kind);
        if !node.depends_on.is_empty() {
            let deps: Vec<&str> = node.depends_on.iter().map(|d| d.as_str()).collect();
            println!("      after: {}", deps.join(", "));
        }
    }

    println!();
    println!("  {} resource(s) will be declared.", order.len());
    Ok(())
}
