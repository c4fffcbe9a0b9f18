//! CLI command definitions and dispatch.

pub mod flags;
pub mod graph;
pub mod outputs;
pub mod package;
pub mod plan;
pub mod validate;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use lamina_common::config::ResolutionContext;
use lamina_common::constants::{DEFAULT_ARTIFACT_DIR, DEFAULT_PARTITION, DEFAULT_REGION};
use lamina_module::config::FunctionConfig;
use lamina_module::config::load::load_config;
use lamina_module::{Resolution, resolve};
use lamina_package::{ArtifactStore, ZipPackager};

/// Lamina: resolve serverless function modules into resource graphs.
#[derive(Parser, Debug)]
#[command(name = "lamina", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub globals: Globals,
}

/// Resolution context and runtime options.
#[derive(Args, Debug)]
pub struct Globals {
    /// Region the function is deployed into.
    #[arg(long, global = true, env = "LAMINA_REGION", default_value = DEFAULT_REGION)]
    pub region: String,

    /// Account the function is deployed into.
    #[arg(long, global = true, env = "LAMINA_ACCOUNT_ID")]
    pub account_id: Option<String>,

    /// ARN partition.
    #[arg(long, global = true, env = "LAMINA_PARTITION", default_value = DEFAULT_PARTITION)]
    pub partition: String,

    /// Directory packaged artifacts are written to.
    #[arg(long, global = true, env = "LAMINA_ARTIFACT_DIR", default_value = DEFAULT_ARTIFACT_DIR)]
    pub artifact_dir: PathBuf,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

impl Globals {
    /// Builds the resolution context from the global options.
    pub fn context(&self) -> ResolutionContext {
        let ctx = ResolutionContext::new(&self.region).with_partition(&self.partition);
        match &self.account_id {
            Some(account) => ctx.with_account_id(account),
            None => ctx,
        }
    }

    /// Opens the artifact store and returns a packager writing into it.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact directory cannot be created.
    pub fn packager(&self) -> anyhow::Result<ZipPackager> {
        Ok(ZipPackager::new(ArtifactStore::open(&self.artifact_dir)?))
    }

    /// Loads `file` and runs the full resolution.
    ///
    /// # Errors
    ///
    /// Returns an error if loading, validation, packaging, or assembly fails.
    pub fn resolve_file(&self, file: &Path) -> anyhow::Result<(FunctionConfig, Resolution)> {
        let config = load_config(file)?;
        let resolution = resolve(&config, &self.context(), &self.packager()?)?;
        Ok((config, resolution))
    }
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check a configuration record and report every violation.
    Validate(validate::ValidateArgs),
    /// Show the flags derived from a configuration record.
    Flags(flags::FlagsArgs),
    /// Display the deployment order of the resolved resources.
    Plan(plan::PlanArgs),
    /// Print the declared resource graph.
    Graph(graph::GraphArgs),
    /// Print the module outputs.
    Outputs(outputs::OutputsArgs),
    /// Package a source tree into the artifact directory.
    Package(package::PackageArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let globals = &cli.globals;
    match cli.command {
        Command::Validate(args) => validate::execute(&args),
        Command::Flags(args) => flags::execute(&args),
        Command::Plan(args) => plan::execute(&args, globals),
        Command::Graph(args) => graph::execute(&args, globals),
        Command::Outputs(args) => outputs::execute(&args, globals),
        Command::Package(args) => package::execute(&args, globals),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn globals_default_to_standard_context() {
        let cli = Cli::try_parse_from(["lamina", "plan", "function.yaml"]).expect("parse");
        let ctx = cli.globals.context();
        assert_eq!(ctx.partition, "aws");
        assert_eq!(ctx.account_id, None);
        assert_eq!(cli.globals.log_format, LogFormat::Text);
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "lamina",
            "outputs",
            "fn.json",
            "--region",
            "eu-central-1",
            "--account-id",
            "123456789012",
            "--log-format",
            "json",
        ])
        .expect("parse");
        let ctx = cli.globals.context();
        assert_eq!(ctx.region, "eu-central-1");
        assert_eq!(ctx.account_id.as_deref(), Some("123456789012"));
        assert_eq!(cli.globals.log_format, LogFormat::Json);
        assert!(matches!(cli.command, Command::Outputs(_)));
    }

    #[test]
    fn graph_accepts_json_switch() {
        let cli = Cli::try_parse_from(["lamina", "graph", "fn.yaml", "--json"]).expect("parse");
        match cli.command {
            Command::Graph(args) => assert!(args.json),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
