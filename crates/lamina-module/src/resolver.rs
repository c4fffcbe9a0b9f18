//! Resolution entry point.
//!
//! Runs the four stages in order: validation, derived flags, graph assembly,
//! and output projection. Any stage error aborts the whole resolution.

use lamina_common::config::ResolutionContext;
use lamina_common::error::Result;
use lamina_common::types::ResourceKey;
use lamina_package::Packager;
use serde::Serialize;

use crate::assembler::assemble;
use crate::config::FunctionConfig;
use crate::flags::DerivedFlags;
use crate::graph::ResourceGraph;
use crate::outputs::{ModuleOutputs, project};
use crate::validator::validate;

/// A fully resolved module.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    /// Flags derived from the configuration.
    pub flags: DerivedFlags,
    /// Declared resource graph.
    pub graph: ResourceGraph,
    /// Projected outputs.
    pub outputs: ModuleOutputs,
}

impl Resolution {
    /// Returns the deployment order of the graph, dependencies first.
    ///
    /// # Errors
    ///
    /// Returns an assembly error if the graph is cyclic or references an
    /// undeclared node.
    pub fn plan(&self) -> Result<Vec<ResourceKey>> {
        self.graph.deployment_order()
    }
}

/// Resolves `config` into a declared resource graph and its outputs.
///
/// # Errors
///
/// Returns a validation error listing every violation, an assembly error
/// when an internal invariant breaks, or the packager's error.
pub fn resolve(
    config: &FunctionConfig,
    ctx: &ResolutionContext,
    packager: &dyn Packager,
) -> Result<Resolution> {
    validate(config)?;
    let flags = DerivedFlags::resolve(config);
    let graph = assemble(config, &flags, ctx, packager)?;
    let outputs = project(&graph, config, ctx);
    tracing::info!(
        function = %config.function_name,
        resources = graph.len(),
        "module resolved"
    );
    Ok(Resolution {
        flags,
        graph,
        outputs,
    })
}

#[cfg(test)]
mod tests {
    use lamina_common::error::LaminaError;

    use super::*;
    use crate::testing::{FailingPackager, StubPackager, base_config};

    #[test]
    fn resolve_runs_every_stage() {
        let resolution = resolve(&base_config(), &ResolutionContext::default(), &StubPackager)
            .expect("resolve");
        assert!(resolution.flags.needs_package_build);
        assert!(resolution.graph.contains("function"));
        assert_eq!(resolution.outputs.function_name, "my-fn");

        let order = resolution.plan().expect("plan");
        let position = |key: &str| {
            order
                .iter()
                .position(|k| k.as_str() == key)
                .expect("key in order")
        };
        assert!(position("role") < position("function"));
        assert!(position("log_group") < position("function"));
    }

    #[test]
    fn invalid_config_never_reaches_packaging() {
        let mut config = base_config();
        config.memory_size = 64;
        let err = resolve(&config, &ResolutionContext::default(), &FailingPackager)
            .expect_err("invalid");
        assert!(matches!(err, LaminaError::Validation { .. }), "got: {err}");
    }

    #[test]
    fn packaging_errors_propagate() {
        let err = resolve(&base_config(), &ResolutionContext::default(), &FailingPackager)
            .expect_err("packaging fails");
        assert!(err.is_collaborator());
    }
}
