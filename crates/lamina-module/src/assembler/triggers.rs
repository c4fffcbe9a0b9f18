//! Everything that invokes the function: the public endpoint, invoke
//! permissions, event-stream subscriptions, and asynchronous invocation
//! settings.

use lamina_common::error::Result;
use lamina_common::types::ResourceKey;
use serde_json::{Value, json};

use super::{Assembler, keys};
use crate::config::{AuthorizationType, CorsConfig};
use crate::graph::{ResourceKind, ResourceNode};

const DEFAULT_INVOKE_ACTION: &str = "lambda:InvokeFunction";
const URL_INVOKE_ACTION: &str = "lambda:InvokeFunctionUrl";

/// CORS block with each unset field defaulted on its own.
fn cors_block(cors: &CorsConfig) -> Value {
    let wildcard = || vec!["*".to_owned()];
    json!({
        "allow_credentials": cors.allow_credentials.unwrap_or(false),
        "allow_headers": cors.allow_headers.clone().unwrap_or_else(wildcard),
        "allow_methods": cors.allow_methods.clone().unwrap_or_else(wildcard),
        "allow_origins": cors.allow_origins.clone().unwrap_or_else(wildcard),
        "expose_headers": cors.expose_headers.clone().unwrap_or_default(),
        "max_age": cors.max_age.unwrap_or(0),
    })
}

impl Assembler<'_> {
    pub(super) fn declare_function_url(&mut self) -> Result<()> {
        if !self.config.create_function_url {
            return Ok(());
        }
        let function = Self::function_key();
        let url_key = ResourceKey::new(keys::FUNCTION_URL);
        let auth = self.config.function_url_authorization_type;

        let mut node = ResourceNode::new(url_key.clone(), ResourceKind::PublicEndpoint)
            .with("function_name", Self::function_name_ref())
            .with("authorization_type", auth.as_str())
            .with("invoke_mode", self.config.function_url_invoke_mode.as_str())
            .after(&function);
        if let Some(cors) = &self.config.cors {
            node.set("cors", cors_block(cors));
        }
        self.graph.insert(node)?;

        if auth == AuthorizationType::None {
            let permission = ResourceNode::new(
                ResourceKey::scoped(keys::PERMISSION, keys::PUBLIC_URL_PERMISSION),
                ResourceKind::InvokePermission,
            )
            .with("statement_id", "AllowPublicFunctionUrlInvoke")
            .with("action", URL_INVOKE_ACTION)
            .with("function_name", Self::function_name_ref())
            .with("principal", "*")
            .with("function_url_auth_type", auth.as_str())
            .after(&function)
            .after(&url_key);
            self.graph.insert(permission)?;
        }
        Ok(())
    }

    pub(super) fn declare_permissions(&mut self) -> Result<()> {
        let function = Self::function_key();
        for (name, trigger) in &self.config.allowed_triggers {
            let node = ResourceNode::new(
                ResourceKey::scoped(keys::PERMISSION, name),
                ResourceKind::InvokePermission,
            )
            .with("statement_id", name.as_str())
            .with(
                "action",
                trigger.action.as_deref().unwrap_or(DEFAULT_INVOKE_ACTION),
            )
            .with("function_name", Self::function_name_ref())
            .with("principal", trigger.principal.as_str())
            .with_opt("source_arn", trigger.source_arn.clone())
            .with_opt("source_account", trigger.source_account.clone())
            .with_opt("event_source_token", trigger.event_source_token.clone())
            .after(&function);
            self.graph.insert(node)?;
        }
        Ok(())
    }

    pub(super) fn declare_event_source_mappings(&mut self) -> Result<()> {
        let function = Self::function_key();
        let policy = ResourceKey::scoped(keys::INLINE_POLICY, "event_sources");
        let policy_declared = self.graph.contains(policy.as_str());
        let tags = self.tags();

        for (name, mapping) in &self.config.event_source_mappings {
            let mut node = ResourceNode::new(
                ResourceKey::scoped(keys::MAPPING, name),
                ResourceKind::EventSubscription,
            )
            .with("function_name", function.attr("arn"))
            .with("event_source_arn", mapping.event_source_arn.as_str())
            .with(
                "maximum_batching_window_in_seconds",
                mapping.maximum_batching_window_in_seconds,
            )
            .with("enabled", mapping.enabled)
            .with_opt("batch_size", mapping.batch_size)
            .with_opt(
                "starting_position",
                mapping.starting_position.map(|p| p.as_str()),
            )
            .with_opt(
                "starting_position_timestamp",
                mapping.starting_position_timestamp.clone(),
            )
            .with_opt("maximum_retry_attempts", mapping.maximum_retry_attempts)
            .with_opt(
                "bisect_batch_on_function_error",
                mapping.bisect_batch_on_function_error,
            )
            .with_opt(
                "maximum_record_age_in_seconds",
                mapping.maximum_record_age_in_seconds,
            )
            .with_opt("parallelization_factor", mapping.parallelization_factor)
            .with_opt("tags", tags.clone())
            .after(&function);

            if !mapping.filter_patterns.is_empty() {
                let filters: Vec<Value> = mapping
                    .filter_patterns
                    .iter()
                    .map(|p| json!({ "pattern": p }))
                    .collect();
                node.set("filter_criteria", json!({ "filters": filters }));
            }
            if let Some(dest) = &mapping.destination_on_failure {
                node.set(
                    "destination_config",
                    json!({ "on_failure": { "destination_arn": dest } }),
                );
            }
            if let Some(limit) = mapping.scaling_max_concurrency {
                node.set("scaling_config", json!({ "maximum_concurrency": limit }));
            }
            if !mapping.function_response_types.is_empty() {
                node.set(
                    "function_response_types",
                    json!(mapping.function_response_types),
                );
            }
            if policy_declared {
                node = node.after(&policy);
            }
            self.graph.insert(node)?;
        }
        Ok(())
    }

    pub(super) fn declare_event_invoke_config(&mut self) -> Result<()> {
        if !self.flags.needs_event_invoke_config {
            return Ok(());
        }
        let config = self.config;
        let mut node = ResourceNode::new(
            ResourceKey::new(keys::EVENT_INVOKE_CONFIG),
            ResourceKind::EventInvokeConfig,
        )
        .with("function_name", Self::function_name_ref())
        .with_opt(
            "maximum_event_age_in_seconds",
            config.maximum_event_age_in_seconds,
        )
        .with_opt("maximum_retry_attempts", config.maximum_retry_attempts)
        .after(&Self::function_key());

        let mut destinations = serde_json::Map::new();
        if let Some(dest) = &config.destination_on_success {
            let _ = destinations.insert("on_success".into(), json!({ "destination": dest }));
        }
        if let Some(dest) = &config.destination_on_failure {
            let _ = destinations.insert("on_failure".into(), json!({ "destination": dest }));
        }
        if !destinations.is_empty() {
            node.set("destination_config", Value::Object(destinations));
        }

        let policy = ResourceKey::scoped(keys::INLINE_POLICY, "async_destinations");
        if self.graph.contains(policy.as_str()) {
            node = node.after(&policy);
        }
        self.graph.insert(node)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::config::{
        AuthorizationType, CorsConfig, EventSourceMappingConfig, StartingPosition,
        TriggerPermission,
    };
    use crate::graph::ResourceKind;
    use crate::testing::{assemble_config, base_config};

    #[test]
    fn public_url_gets_public_permission() {
        let mut config = base_config();
        config.create_function_url = true;
        config.function_url_authorization_type = AuthorizationType::None;
        let graph = assemble_config(&config).expect("assemble");

        let url = graph.get("function_url").expect("url");
        assert_eq!(url.kind, ResourceKind::PublicEndpoint);
        assert_eq!(url.field_str("authorization_type"), Some("NONE"));
        assert!(url.field("cors").is_none());

        let permissions: Vec<_> = graph.nodes_of_kind(ResourceKind::InvokePermission).collect();
        assert_eq!(permissions.len(), 1);
        assert_eq!(permissions[0].field_str("principal"), Some("*"));
        assert_eq!(permissions[0].field_str("function_url_auth_type"), Some("NONE"));
        assert_eq!(permissions[0].field_str("action"), Some("lambda:InvokeFunctionUrl"));
    }

    #[test]
    fn iam_url_gets_no_permission() {
        let mut config = base_config();
        config.create_function_url = true;
        let graph = assemble_config(&config).expect("assemble");
        assert!(graph.contains("function_url"));
        assert_eq!(graph.nodes_of_kind(ResourceKind::InvokePermission).count(), 0);
    }

    #[test]
    fn cors_defaults_apply_per_field() {
        let mut config = base_config();
        config.create_function_url = true;
        config.cors = Some(CorsConfig {
            allow_origins: Some(vec!["https://example.com".into()]),
            max_age: Some(600),
            ..CorsConfig::default()
        });
        let graph = assemble_config(&config).expect("assemble");
        let cors = graph
            .get("function_url")
            .and_then(|n| n.field("cors"))
            .expect("cors");
        assert_eq!(
            cors,
            &json!({
                "allow_credentials": false,
                "allow_headers": ["*"],
                "allow_methods": ["*"],
                "allow_origins": ["https://example.com"],
                "expose_headers": [],
                "max_age": 600,
            })
        );
    }

    #[test]
    fn allowed_triggers_become_permissions() {
        let mut config = base_config();
        let _ = config.allowed_triggers.insert(
            "api".into(),
            TriggerPermission {
                principal: "apigateway.amazonaws.com".into(),
                source_arn: Some("arn:aws:execute-api:us-east-1:123456789012:abc/*/*".into()),
                ..TriggerPermission::default()
            },
        );
        let graph = assemble_config(&config).expect("assemble");
        let permission = graph.get("permission.api").expect("permission");
        assert_eq!(permission.field_str("action"), Some("lambda:InvokeFunction"));
        assert_eq!(permission.field_str("principal"), Some("apigateway.amazonaws.com"));
        assert!(permission.field("source_account").is_none());
        assert!(permission.depends_on.iter().any(|k| k.as_str() == "function"));
    }

    #[test]
    fn mapping_carries_only_supplied_blocks() {
        let mut config = base_config();
        let _ = config.event_source_mappings.insert(
            "stream".into(),
            EventSourceMappingConfig {
                event_source_arn: "arn:aws:kinesis:us-east-1:123456789012:stream/s".into(),
                starting_position: Some(StartingPosition::TrimHorizon),
                filter_patterns: vec![r#"{"data":{"kind":["order"]}}"#.into()],
                scaling_max_concurrency: None,
                ..EventSourceMappingConfig::default()
            },
        );
        let graph = assemble_config(&config).expect("assemble");
        let mapping = graph.get("event_source_mapping.stream").expect("mapping");
        assert_eq!(mapping.field_str("starting_position"), Some("TRIM_HORIZON"));
        assert_eq!(
            mapping.field("filter_criteria"),
            Some(&json!({ "filters": [{ "pattern": r#"{"data":{"kind":["order"]}}"# }] }))
        );
        assert!(mapping.field("scaling_config").is_none());
        assert!(mapping.field("destination_config").is_none());
        assert!(mapping.field("batch_size").is_none());
        assert!(
            mapping
                .depends_on
                .iter()
                .any(|k| k.as_str() == "inline_policy.event_sources")
        );
    }

    #[test]
    fn async_config_declared_with_destinations() {
        let mut config = base_config();
        config.maximum_retry_attempts = Some(1);
        config.destination_on_failure = Some("arn:aws:sqs:us-east-1:123456789012:failed".into());
        let graph = assemble_config(&config).expect("assemble");

        let node = graph.get("event_invoke_config").expect("config");
        assert_eq!(node.field("maximum_retry_attempts"), Some(&json!(1)));
        let failed = "arn:aws:sqs:us-east-1:123456789012:failed";
        assert_eq!(
            node.field("destination_config"),
            Some(&json!({ "on_failure": { "destination": failed } }))
        );
        assert!(graph.contains("inline_policy.async_destinations"));
        assert!(
            node.depends_on
                .iter()
                .any(|k| k.as_str() == "inline_policy.async_destinations")
        );
    }
}
