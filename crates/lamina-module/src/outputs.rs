//! Output projection: the stable set of named values a resolved module
//! exposes to downstream configuration.
//!
//! Projection never fails. Every value backed by an optional resource is
//! `None` when that resource was not declared.

use std::collections::BTreeMap;

use lamina_common::config::ResolutionContext;
use lamina_common::constants::LATEST_VERSION;
use lamina_common::types::ResourceKey;
use serde::Serialize;
use serde_json::Value;

use crate::arn::parse_arn;
use crate::assembler::keys;
use crate::config::FunctionConfig;
use crate::graph::{ResourceGraph, ResourceKind, ResourceNode};

/// Identifiers of one alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AliasOutput {
    /// Alias ARN.
    pub arn: String,
    /// Invoke ARN for API integrations.
    pub invoke_arn: String,
    /// Version the alias points at.
    pub function_version: Option<String>,
}

/// Identifiers of one event-source subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingOutput {
    /// Provider-assigned identifier.
    pub uuid: String,
    /// Subscribed source.
    pub event_source_arn: Option<String>,
    /// Reported subscription state.
    pub state: String,
}

/// Named values projected from a resolved graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleOutputs {
    /// Unqualified function ARN.
    pub function_arn: String,
    /// Invoke ARN for API integrations.
    pub function_invoke_arn: String,
    /// Function ARN qualified with [`Self::function_version`].
    pub function_qualified_arn: String,
    /// Function name.
    pub function_name: String,
    /// Published version reference, or `$LATEST` when nothing is published.
    pub function_version: String,
    /// Hex digest of the packaged code, when packaged locally.
    pub function_source_code_hash: Option<String>,
    /// Execution role ARN, created or external.
    pub role_arn: Option<String>,
    /// Execution role name.
    pub role_name: Option<String>,
    /// Log group name.
    pub log_group_name: Option<String>,
    /// Log group ARN.
    pub log_group_arn: Option<String>,
    /// Public endpoint URL, `None` when no endpoint was requested.
    pub function_url: Option<String>,
    /// Aliases by name.
    pub aliases: BTreeMap<String, AliasOutput>,
    /// Event-source subscriptions by name.
    pub event_source_mappings: BTreeMap<String, MappingOutput>,
    /// Shell command that invokes the function once.
    pub invoke_command: String,
    /// Shell command that follows the function's logs.
    pub tail_logs_command: String,
}

/// Projects the named outputs of `graph`.
#[must_use]
pub fn project(
    graph: &ResourceGraph,
    config: &FunctionConfig,
    ctx: &ResolutionContext,
) -> ModuleOutputs {
    let function = graph.get(keys::FUNCTION);
    let name = function
        .and_then(|f| f.field_str("function_name"))
        .unwrap_or(config.function_name.as_str())
        .to_owned();

    let function_arn = format!(
        "arn:{}:lambda:{}:{}:function:{name}",
        ctx.partition,
        ctx.region,
        ctx.account_segment()
    );
    let published = function
        .and_then(|f| f.field("publish"))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let function_version = if published {
        ResourceKey::new(keys::FUNCTION).attr("version").to_string()
    } else {
        LATEST_VERSION.to_owned()
    };

    let (role_arn, role_name) = role_identity(graph, config);
    let log_group = graph.get(keys::LOG_GROUP);
    let log_group_name = log_group
        .and_then(|g| g.field_str("name"))
        .map(str::to_owned);
    let log_group_arn = log_group_name.as_ref().map(|lg| {
        format!(
            "arn:{}:logs:{}:{}:log-group:{lg}",
            ctx.partition,
            ctx.region,
            ctx.account_segment()
        )
    });

    let aliases = graph
        .nodes_of_kind(ResourceKind::Alias)
        .filter_map(|node| {
            let alias = node.field_str("name")?;
            let arn = format!("{function_arn}:{alias}");
            Some((
                alias.to_owned(),
                AliasOutput {
                    invoke_arn: invoke_arn(ctx, &arn),
                    arn,
                    function_version: node.field_str("function_version").map(str::to_owned),
                },
            ))
        })
        .collect();

    let event_source_mappings = graph
        .nodes_of_kind(ResourceKind::EventSubscription)
        .map(|node| (mapping_name(node).to_owned(), mapping_output(node)))
        .collect();

    ModuleOutputs {
        function_invoke_arn: invoke_arn(ctx, &function_arn),
        function_qualified_arn: format!("{function_arn}:{function_version}"),
        function_source_code_hash: function
            .and_then(|f| f.field_str("source_code_hash"))
            .map(str::to_owned),
        function_url: graph
            .contains(keys::FUNCTION_URL)
            .then(|| ResourceKey::new(keys::FUNCTION_URL).attr("function_url").to_string()),
        invoke_command: format!(
            "aws lambda invoke --function-name {name} --region {} response.json",
            ctx.region
        ),
        tail_logs_command: format!(
            "aws logs tail {} --follow --region {}",
            crate::assembler::log_group_name(&name),
            ctx.region
        ),
        function_arn,
        function_name: name,
        function_version,
        role_arn,
        role_name,
        log_group_name,
        log_group_arn,
        aliases,
        event_source_mappings,
    }
}

fn invoke_arn(ctx: &ResolutionContext, target_arn: &str) -> String {
    format!(
        "arn:{}:apigateway:{}:lambda:path/2015-03-31/functions/{target_arn}/invocations",
        ctx.partition, ctx.region
    )
}

/// Created role identity, falling back to the externally supplied ARN.
fn role_identity(
    graph: &ResourceGraph,
    config: &FunctionConfig,
) -> (Option<String>, Option<String>) {
    if let Some(role) = graph.get(keys::ROLE) {
        return (
            Some(ResourceKey::new(keys::ROLE).attr("arn").to_string()),
            role.field_str("name").map(str::to_owned),
        );
    }
    let Some(external) = &config.lambda_role else {
        return (None, None);
    };
    let name = parse_arn(external)
        .and_then(|arn| arn.resource.rsplit('/').next())
        .filter(|name| !name.is_empty())
        .map(str::to_owned);
    (Some(external.clone()), name)
}

fn mapping_name(node: &ResourceNode) -> &str {
    node.key
        .as_str()
        .strip_prefix(keys::MAPPING)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or_else(|| node.key.as_str())
}

fn mapping_output(node: &ResourceNode) -> MappingOutput {
    MappingOutput {
        uuid: node.key.attr("uuid").to_string(),
        event_source_arn: node.field_str("event_source_arn").map(str::to_owned),
        state: node.key.attr("state").to_string(),
    }
}
