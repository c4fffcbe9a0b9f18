//! The function node, its log group, and code-source resolution.

use std::collections::BTreeMap;

use lamina_common::constants::LOG_GROUP_PREFIX;
use lamina_common::error::{LaminaError, Result};
use lamina_common::types::ResourceKey;
use lamina_package::Packager;
use serde_json::{Value, json};

use super::{Assembler, RoleBinding, keys};
use crate::config::PackageType;
use crate::flags::CodeSource;
use crate::graph::{ResourceKind, ResourceNode};

/// Code reference fields of the function node.
pub(super) type CodeFields = BTreeMap<String, Value>;

/// Returns the log group name of a function.
#[must_use]
pub fn log_group_name(function_name: &str) -> String {
    format!("{LOG_GROUP_PREFIX}{function_name}")
}

impl Assembler<'_> {
    pub(super) fn declare_log_group(&mut self) -> Result<()> {
        let node = ResourceNode::new(ResourceKey::new(keys::LOG_GROUP), ResourceKind::LogGroup)
            .with("name", log_group_name(&self.config.function_name))
            .with_opt(
                "retention_in_days",
                self.config.cloudwatch_logs_retention_in_days,
            )
            .with_opt("kms_key_id", self.config.cloudwatch_logs_kms_key_id.clone())
            .with_opt("tags", self.tags());
        self.graph.insert(node)
    }

    /// Resolves the selected code source into code reference fields.
    pub(super) fn resolve_code(&self, packager: &dyn Packager) -> Result<CodeFields> {
        let mut fields = CodeFields::new();
        match self.flags.code_source {
            Some(CodeSource::LocalTree) => {
                let Some(source) = &self.config.source_path else {
                    return Err(missing_source("source_path"));
                };
                let artifact = packager.package(source, &self.config.package_excludes)?;
                let _ = fields.insert(
                    "filename".into(),
                    json!(artifact.path.to_string_lossy()),
                );
                let _ = fields.insert(
                    "source_code_hash".into(),
                    json!(artifact.content_hash.as_hex()),
                );
            }
            Some(CodeSource::LocalPackage) => {
                let Some(package) = &self.config.local_existing_package else {
                    return Err(missing_source("local_existing_package"));
                };
                let _ = fields.insert("filename".into(), json!(package.to_string_lossy()));
            }
            Some(CodeSource::RemotePackage) => {
                let Some(s3) = &self.config.s3_existing_package else {
                    return Err(missing_source("s3_existing_package"));
                };
                let _ = fields.insert("s3_bucket".into(), json!(s3.bucket));
                let _ = fields.insert("s3_key".into(), json!(s3.key));
                if let Some(version) = &s3.version_id {
                    let _ = fields.insert("s3_object_version".into(), json!(version));
                }
            }
            Some(CodeSource::ContainerImage) => {
                let Some(image) = &self.config.image_uri else {
                    return Err(missing_source("image_uri"));
                };
                let _ = fields.insert("image_uri".into(), json!(image));
            }
            None => {
                return Err(LaminaError::Assembly {
                    message: "no code source is configured".into(),
                });
            }
        }
        Ok(fields)
    }

    pub(super) fn declare_function(&mut self, role: &RoleBinding, code: CodeFields) -> Result<()> {
        let config = self.config;
        let log_group = ResourceKey::new(keys::LOG_GROUP);

        let mut node = ResourceNode::new(Self::function_key(), ResourceKind::Function)
            .with("function_name", config.function_name.as_str())
            .with("role", role.arn.clone())
            .with("package_type", config.package_type.as_str())
            .with("architectures", json!(config.architectures))
            .with("memory_size", config.memory_size)
            .with("timeout", config.timeout)
            .with("ephemeral_storage", json!({ "size": config.ephemeral_storage_size }))
            .with("reserved_concurrent_executions", config.reserved_concurrent_executions)
            .with("publish", self.flags.needs_version_publish)
            .with_opt(
                "description",
                (!config.description.is_empty()).then(|| config.description.clone()),
            )
            .with_opt("kms_key_arn", config.kms_key_arn.clone())
            .with_opt("tags", self.tags())
            .after(&log_group);

        if config.package_type == PackageType::Zip {
            node = node
                .with_opt("runtime", config.runtime.clone())
                .with_opt("handler", config.handler.clone());
        }
        for (name, value) in code {
            node.set(&name, value);
        }
        for key in &role.prerequisites {
            node = node.after(key);
        }

        self.attach_blocks(&mut node);
        self.graph.insert(node)
    }

    /// Attaches the optional nested blocks, each only when its input is set.
    fn attach_blocks(&self, node: &mut ResourceNode) {
        let config = self.config;

        if !config.layers.is_empty() {
            node.set("layers", json!(config.layers));
        }
        if !config.environment_variables.is_empty() {
            node.set(
                "environment",
                json!({ "variables": config.environment_variables }),
            );
        }
        if config.has_vpc() {
            node.set(
                "vpc_config",
                json!({
                    "subnet_ids": config.vpc_subnet_ids,
                    "security_group_ids": config.vpc_security_group_ids,
                }),
            );
        }
        if let Some(mode) = config.tracing_mode {
            node.set("tracing_config", json!({ "mode": mode.as_str() }));
        }
        if let Some(target) = &config.dead_letter_target_arn {
            node.set("dead_letter_config", json!({ "target_arn": target }));
        }
        if self.flags.snap_start_effective {
            node.set("snap_start", json!({ "apply_on": "PublishedVersions" }));
        }
        if let Some(image) = config
            .image_config
            .as_ref()
            .filter(|_| config.package_type == PackageType::Image)
        {
            let mut block = serde_json::Map::new();
            if !image.entry_point.is_empty() {
                let _ = block.insert("entry_point".into(), json!(image.entry_point));
            }
            if !image.command.is_empty() {
                let _ = block.insert("command".into(), json!(image.command));
            }
            if let Some(dir) = &image.working_directory {
                let _ = block.insert("working_directory".into(), json!(dir));
            }
            node.set("image_config", Value::Object(block));
        }
        if let Some(logging) = &config.logging {
            let mut block = serde_json::Map::new();
            let _ = block.insert("log_format".into(), json!(logging.log_format.as_str()));
            let _ = block.insert(
                "log_group".into(),
                ResourceKey::new(keys::LOG_GROUP).attr("name").into(),
            );
            if let Some(level) = &logging.application_log_level {
                let _ = block.insert("application_log_level".into(), json!(level));
            }
            if let Some(level) = &logging.system_log_level {
                let _ = block.insert("system_log_level".into(), json!(level));
            }
            node.set("logging_config", Value::Object(block));
        }
        if let Some(fs) = &config.file_system {
            node.set(
                "file_system_config",
                json!({ "arn": fs.arn, "local_mount_path": fs.local_mount_path }),
            );
        }
    }
}

fn missing_source(field: &str) -> LaminaError {
    LaminaError::Assembly {
        message: format!("selected code source {field} is not set"),
    }
}
