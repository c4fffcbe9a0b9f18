//! `lamina package`: Package a source tree into the artifact directory.

use std::path::PathBuf;

use clap::Args;
use lamina_package::Packager;

use super::Globals;
use crate::output::format_bytes;

/// Arguments for the `package` command.
#[derive(Args, Debug)]
pub struct PackageArgs {
    /// Source directory or single file to package.
    pub source: PathBuf,

    /// Path prefixes to leave out of the archive (repeatable).
    #[arg(long = "exclude")]
    pub excludes: Vec<String>,
}

/// Executes the `package` command.
///
/// # Errors
///
/// Returns an error if the source is missing or the archive cannot be
/// written.
pub fn execute(args: &PackageArgs, globals: &Globals) -> anyhow::Result<()> {
    let artifact = globals.packager()?.package(&args.source, &args.excludes)?;
    println!("artifact: {}", artifact.path.display());
    println!("hash:     {}", artifact.content_hash);
    println!("size:     {}", format_bytes(artifact.size_bytes));
    Ok(())
}
