//! Resource graph assembly.
//!
//! Given a validated configuration record and its derived flags, decides
//! which optional resources exist, fills in their fields from the record or
//! from sibling references, and wires their dependencies. Assembly is
//! fail-fast: any broken invariant aborts the whole graph.

mod function;
mod identity;
mod triggers;
mod versions;

pub use function::log_group_name;

use lamina_common::config::ResolutionContext;
use lamina_common::error::Result;
use lamina_common::types::ResourceKey;
use lamina_package::Packager;
use serde_json::Value;

use crate::config::FunctionConfig;
use crate::flags::DerivedFlags;
use crate::graph::ResourceGraph;

/// Stable keys and key prefixes of declared resources.
pub mod keys {
    /// Execution role.
    pub const ROLE: &str = "role";
    /// Log group.
    pub const LOG_GROUP: &str = "log_group";
    /// The function.
    pub const FUNCTION: &str = "function";
    /// Public HTTP endpoint.
    pub const FUNCTION_URL: &str = "function_url";
    /// Provisioned concurrency.
    pub const PROVISIONED_CONCURRENCY: &str = "provisioned_concurrency";
    /// Asynchronous invocation config.
    pub const EVENT_INVOKE_CONFIG: &str = "event_invoke_config";
    /// Prefix of managed policy attachments.
    pub const ATTACHMENT: &str = "role_policy_attachment";
    /// Prefix of inline policies.
    pub const INLINE_POLICY: &str = "inline_policy";
    /// Prefix of aliases.
    pub const ALIAS: &str = "alias";
    /// Prefix of event-source mappings.
    pub const MAPPING: &str = "event_source_mapping";
    /// Prefix of invoke permissions.
    pub const PERMISSION: &str = "permission";
    /// Name of the synthetic public-endpoint permission.
    pub const PUBLIC_URL_PERMISSION: &str = "function_url_public";
}

/// Assembles the resource graph for `config`.
///
/// `packager` is only invoked when the selected code source is a local
/// source tree.
///
/// # Errors
///
/// Returns an assembly error when an internal invariant does not hold, or
/// the packager's error when packaging fails.
pub fn assemble(
    config: &FunctionConfig,
    flags: &DerivedFlags,
    ctx: &ResolutionContext,
    packager: &dyn Packager,
) -> Result<ResourceGraph> {
    tracing::info!(function = %config.function_name, "assembling resource graph");
    let mut asm = Assembler {
        config,
        flags,
        ctx,
        graph: ResourceGraph::new(),
    };

    let role = asm.declare_identity()?;
    asm.declare_log_group()?;
    let code = asm.resolve_code(packager)?;
    asm.declare_function(&role, code)?;

    asm.declare_aliases()?;
    asm.declare_provisioned_concurrency()?;
    asm.declare_function_url()?;
    asm.declare_permissions()?;
    asm.declare_event_source_mappings()?;
    asm.declare_event_invoke_config()?;

    let order = asm.graph.deployment_order()?;
    tracing::info!(resources = order.len(), "resource graph assembled");
    Ok(asm.graph)
}

/// How the function obtains its execution identity.
#[derive(Debug)]
struct RoleBinding {
    /// Role ARN: a reference to the created role or the external ARN.
    arn: Value,
    /// Identity nodes the function must wait for.
    prerequisites: Vec<ResourceKey>,
}

/// Working state of one assembly pass.
struct Assembler<'a> {
    config: &'a FunctionConfig,
    flags: &'a DerivedFlags,
    ctx: &'a ResolutionContext,
    graph: ResourceGraph,
}

impl Assembler<'_> {
    /// Tags value, or `None` when no tags are configured.
    fn tags(&self) -> Option<Value> {
        (!self.config.tags.is_empty()).then(|| serde_json::json!(self.config.tags))
    }

    fn function_key() -> ResourceKey {
        ResourceKey::new(keys::FUNCTION)
    }

    /// Reference to the function's name, used by every dependent node.
    fn function_name_ref() -> Value {
        Self::function_key().attr("function_name").into()
    }

    /// Reference to the published version number.
    fn version_ref() -> Value {
        Self::function_key().attr("version").into()
    }
}
