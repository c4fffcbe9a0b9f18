//! Aliases and provisioned concurrency, both pinned to a published version.

use lamina_common::error::{LaminaError, Result};
use lamina_common::types::ResourceKey;
use serde_json::{Value, json};

use super::{Assembler, keys};
use crate::graph::{ResourceKind, ResourceNode};

impl Assembler<'_> {
    /// Returns `true` if the declared function publishes a numbered version.
    fn publishes_version(&self) -> bool {
        self.graph
            .get(keys::FUNCTION)
            .and_then(|f| f.field("publish"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub(super) fn declare_aliases(&mut self) -> Result<()> {
        let function = Self::function_key();
        for (name, alias) in &self.config.aliases {
            let version = match &alias.function_version {
                Some(explicit) => Value::from(explicit.as_str()),
                None if self.publishes_version() => Self::version_ref(),
                None => {
                    return Err(LaminaError::Assembly {
                        message: format!(
                            "alias \"{name}\" needs a published version but none is published"
                        ),
                    });
                }
            };

            let key = ResourceKey::scoped(keys::ALIAS, name);
            let mut node = ResourceNode::new(key, ResourceKind::Alias)
                .with("name", name.as_str())
                .with("function_name", Self::function_name_ref())
                .with("function_version", version)
                .with_opt("description", alias.description.clone())
                .after(&function);
            if !alias.routing_additional_version_weights.is_empty() {
                let weights = &alias.routing_additional_version_weights;
                node.set(
                    "routing_config",
                    json!({ "additional_version_weights": weights }),
                );
            }
            self.graph.insert(node)?;
        }
        Ok(())
    }

    pub(super) fn declare_provisioned_concurrency(&mut self) -> Result<()> {
        let Some(executions) = self.config.provisioned_concurrent_executions else {
            return Ok(());
        };
        if !self.publishes_version() {
            return Err(LaminaError::Assembly {
                message: "provisioned concurrency requires a published version".into(),
            });
        }
        let node = ResourceNode::new(
            ResourceKey::new(keys::PROVISIONED_CONCURRENCY),
            ResourceKind::ProvisionedConcurrencyConfig,
        )
        .with("function_name", Self::function_name_ref())
        .with("qualifier", Self::version_ref())
        .with("provisioned_concurrent_executions", executions)
        .after(&Self::function_key());
        self.graph.insert(node)
    }
}
