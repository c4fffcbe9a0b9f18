//! Execution identity: role, managed policy attachments, inline policies.

use std::collections::BTreeSet;

use lamina_common::constants::{
    BASIC_EXECUTION_POLICY, EVENT_SOURCE_ACTIONS, LAMBDA_SERVICE_PRINCIPAL, NETWORK_POLICY,
    TRACING_POLICY,
};
use lamina_common::error::{LaminaError, Result};
use lamina_common::types::ResourceKey;
use serde_json::{Value, json};

use super::{Assembler, RoleBinding, keys};
use crate::arn::parse_arn;
use crate::graph::{ResourceKind, ResourceNode};

impl Assembler<'_> {
    /// Declares the role and its policies, or binds the external role.
    pub(super) fn declare_identity(&mut self) -> Result<RoleBinding> {
        if !self.config.create_role {
            let Some(external) = &self.config.lambda_role else {
                return Err(LaminaError::Assembly {
                    message: "create_role is false but no lambda_role was supplied".into(),
                });
            };
            tracing::debug!(role = %external, "using externally managed role");
            return Ok(RoleBinding {
                arn: Value::from(external.as_str()),
                prerequisites: Vec::new(),
            });
        }

        let role_key = ResourceKey::new(keys::ROLE);
        let role = ResourceNode::new(role_key.clone(), ResourceKind::ExecutionRole)
            .with("name", self.role_name())
            .with("assume_role_policy", self.assume_role_policy())
            .with_opt("path", self.config.role_path.clone())
            .with_opt(
                "permissions_boundary",
                self.config.role_permissions_boundary.clone(),
            )
            .with_opt("tags", self.tags());
        self.graph.insert(role)?;

        let mut prerequisites = vec![role_key.clone()];
        for (concern, policy_arn) in self.managed_policies() {
            let key = ResourceKey::scoped(keys::ATTACHMENT, &concern);
            let node = ResourceNode::new(key.clone(), ResourceKind::RolePolicyAttachment)
                .with("role", role_key.attr("name"))
                .with("policy_arn", policy_arn)
                .after(&role_key);
            self.graph.insert(node)?;
            prerequisites.push(key);
        }

        for (bundle, document) in self.inline_policies() {
            let key = ResourceKey::scoped(keys::INLINE_POLICY, bundle);
            let node = ResourceNode::new(key.clone(), ResourceKind::InlinePolicy)
                .with("name", format!("{}-{bundle}", self.config.function_name))
                .with("role", role_key.attr("name"))
                .with("policy", document)
                .after(&role_key);
            self.graph.insert(node)?;
            prerequisites.push(key);
        }

        Ok(RoleBinding {
            arn: role_key.attr("arn").into(),
            prerequisites,
        })
    }

    fn role_name(&self) -> String {
        self.config
            .role_name
            .clone()
            .unwrap_or_else(|| self.config.function_name.clone())
    }

    fn assume_role_policy(&self) -> Value {
        let mut principals = vec![LAMBDA_SERVICE_PRINCIPAL.to_owned()];
        for entity in &self.config.trusted_entities {
            if !principals.contains(entity) {
                principals.push(entity.clone());
            }
        }
        policy_document(vec![json!({
            "Effect": "Allow",
            "Action": ["sts:AssumeRole"],
            "Principal": { "Service": principals },
        })])
    }

    /// One `(concern, policy ARN)` pair per managed policy to attach.
    fn managed_policies(&self) -> Vec<(String, String)> {
        let mut out = vec![(
            "basic_execution".to_owned(),
            self.ctx.managed_policy_arn(BASIC_EXECUTION_POLICY),
        )];
        if self.flags.needs_network_policy {
            out.push(("network".to_owned(), self.ctx.managed_policy_arn(NETWORK_POLICY)));
        }
        if self.flags.needs_tracing_policy {
            out.push(("tracing".to_owned(), self.ctx.managed_policy_arn(TRACING_POLICY)));
        }
        for (i, arn) in self.config.policies.iter().enumerate() {
            out.push((format!("additional_{i}"), arn.clone()));
        }
        out
    }

    /// One `(bundle, document)` pair per inline policy to create.
    fn inline_policies(&self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();

        if self.flags.needs_dead_letter_policy {
            if let Some(target) = &self.config.dead_letter_target_arn {
                let action = parse_arn(target)
                    .and_then(|arn| arn.family().delivery_action())
                    .unwrap_or("sns:Publish");
                out.push((
                    "dead_letter",
                    policy_document(vec![allow(&[action.to_owned()], &[target.clone()])]),
                ));
            }
        }

        if !self.config.policy_statements.is_empty() {
            let statements = self
                .config
                .policy_statements
                .iter()
                .map(|s| {
                    let mut statement = json!({
                        "Effect": s.effect.as_str(),
                        "Action": s.actions,
                        "Resource": s.resources,
                    });
                    if let Some(sid) = &s.sid {
                        statement["Sid"] = json!(sid);
                    }
                    if !s.conditions.is_empty() {
                        statement["Condition"] = conditions(s);
                    }
                    statement
                })
                .collect();
            out.push(("statements", policy_document(statements)));
        }

        if self.flags.needs_event_source_policy {
            out.push(("event_sources", self.event_source_policy()));
        }

        if self.flags.needs_async_destination_policy {
            let destinations = [
                &self.config.destination_on_success,
                &self.config.destination_on_failure,
            ];
            out.push((
                "async_destinations",
                delivery_policy(destinations.into_iter().flatten()),
            ));
        }

        out
    }

    fn event_source_policy(&self) -> Value {
        let mappings = self.config.event_source_mappings.values();
        let sources: BTreeSet<String> = mappings
            .clone()
            .map(|m| m.event_source_arn.clone())
            .collect();
        let actions: Vec<String> = EVENT_SOURCE_ACTIONS.iter().map(|&a| a.to_owned()).collect();
        let resources: Vec<String> = sources.into_iter().collect();

        let mut statements = vec![allow(&actions, &resources)];
        let failure_destinations: Vec<&String> = mappings
            .filter_map(|m| m.destination_on_failure.as_ref())
            .collect();
        if !failure_destinations.is_empty() {
            let delivery = delivery_policy(failure_destinations.into_iter());
            if let Some(extra) = delivery["Statement"].as_array() {
                statements.extend(extra.iter().cloned());
            }
        }
        policy_document(statements)
    }
}

fn policy_document(statements: Vec<Value>) -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": statements,
    })
}

fn allow(actions: &[String], resources: &[String]) -> Value {
    json!({
        "Effect": "Allow",
        "Action": actions,
        "Resource": resources,
    })
}

/// Groups destinations by the action needed to deliver to them.
fn delivery_policy<'a>(destinations: impl Iterator<Item = &'a String>) -> Value {
    let mut by_action: std::collections::BTreeMap<&'static str, BTreeSet<String>> =
        std::collections::BTreeMap::new();
    for dest in destinations {
        if let Some(action) = parse_arn(dest).and_then(|arn| arn.family().delivery_action()) {
            let _ = by_action.entry(action).or_default().insert(dest.clone());
        }
    }
    let statements = by_action
        .into_iter()
        .map(|(action, resources)| {
            allow(
                &[action.to_owned()],
                &resources.into_iter().collect::<Vec<_>>(),
            )
        })
        .collect();
    policy_document(statements)
}

fn conditions(statement: &crate::config::PolicyStatement) -> Value {
    let mut out = serde_json::Map::new();
    for c in &statement.conditions {
        let by_test = out
            .entry(c.test.clone())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        if let Value::Object(vars) = by_test {
            let _ = vars.insert(c.variable.clone(), json!(c.values));
        }
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use lamina_common::error::LaminaError;

    use crate::config::{
        EventSourceMappingConfig, PolicyCondition, PolicyStatement, TracingMode,
    };
    use crate::graph::ResourceKind;
    use crate::testing::{assemble_config, base_config};

    #[test]
    fn basic_role_has_single_attachment() {
        let graph = assemble_config(&base_config()).expect("assemble");
        assert!(graph.contains("role"));
        let attachments: Vec<_> = graph
            .nodes_of_kind(ResourceKind::RolePolicyAttachment)
            .collect();
        assert_eq!(attachments.len(), 1);
        assert_eq!(
            attachments[0].field_str("policy_arn"),
            Some("arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole")
        );
        assert_eq!(graph.nodes_of_kind(ResourceKind::InlinePolicy).count(), 0);
    }

    #[test]
    fn external_role_creates_no_identity_nodes() {
        let mut config = base_config();
        config.create_role = false;
        config.lambda_role = Some("arn:aws:iam::123456789012:role/existing".into());
        let graph = assemble_config(&config).expect("assemble");
        assert!(!graph.contains("role"));
        assert_eq!(graph.nodes_of_kind(ResourceKind::RolePolicyAttachment).count(), 0);
        let function = graph.get("function").expect("function");
        assert_eq!(
            function.field_str("role"),
            Some("arn:aws:iam::123456789012:role/existing")
        );
    }

    #[test]
    fn declined_role_without_reference_fails() {
        let mut config = base_config();
        config.create_role = false;
        let err = assemble_config(&config).unwrap_err();
        assert!(matches!(err, LaminaError::Assembly { .. }), "got: {err}");
        assert!(err.to_string().contains("lambda_role"));
    }

    #[test]
    fn network_tracing_and_extra_policies_attach() {
        let mut config = base_config();
        config.vpc_subnet_ids = vec!["subnet-1".into()];
        config.vpc_security_group_ids = vec!["sg-1".into()];
        config.tracing_mode = Some(TracingMode::Active);
        config.policies = vec!["arn:aws:iam::123456789012:policy/extra".into()];

        let graph = assemble_config(&config).expect("assemble");
        for key in [
            "role_policy_attachment.basic_execution",
            "role_policy_attachment.network",
            "role_policy_attachment.tracing",
            "role_policy_attachment.additional_0",
        ] {
            let node = graph.get(key).expect(key);
            assert!(node.depends_on.iter().any(|d| d.as_str() == "role"));
        }
    }

    #[test]
    fn dead_letter_policy_matches_target_family() {
        let mut config = base_config();
        config.dead_letter_target_arn = Some("arn:aws:sqs:us-east-1:123456789012:dlq".into());
        let graph = assemble_config(&config).expect("assemble");
        let policy = graph.get("inline_policy.dead_letter").expect("policy");
        let statement = &policy.field("policy").expect("doc")["Statement"][0];
        assert_eq!(statement["Action"][0], "sqs:SendMessage");
        assert_eq!(statement["Resource"][0], "arn:aws:sqs:us-east-1:123456789012:dlq");
    }

    #[test]
    fn custom_statements_pass_through() {
        let mut config = base_config();
        config.policy_statements = vec![PolicyStatement {
            sid: Some("ReadBucket".into()),
            actions: vec!["s3:GetObject".into()],
            resources: vec!["arn:aws:s3:::bucket/*".into()],
            conditions: vec![PolicyCondition {
                test: "StringEquals".into(),
                variable: "aws:PrincipalTag/team".into(),
                values: vec!["core".into()],
            }],
            ..PolicyStatement::default()
        }];
        let graph = assemble_config(&config).expect("assemble");
        let doc = graph
            .get("inline_policy.statements")
            .and_then(|n| n.field("policy"))
            .expect("doc");
        let statement = &doc["Statement"][0];
        assert_eq!(statement["Sid"], "ReadBucket");
        assert_eq!(statement["Effect"], "Allow");
        assert_eq!(statement["Action"][0], "s3:GetObject");
        assert_eq!(
            statement["Condition"]["StringEquals"]["aws:PrincipalTag/team"][0],
            "core"
        );
    }

    #[test]
    fn event_source_policy_scopes_sources_and_failure_destinations() {
        let mut config = base_config();
        let _ = config.event_source_mappings.insert(
            "q".into(),
            EventSourceMappingConfig {
                event_source_arn: "arn:aws:sqs:us-east-1:123456789012:orders".into(),
                destination_on_failure: Some("arn:aws:sns:us-east-1:123456789012:alerts".into()),
                ..EventSourceMappingConfig::default()
            },
        );
        let graph = assemble_config(&config).expect("assemble");
        let doc = graph
            .get("inline_policy.event_sources")
            .and_then(|n| n.field("policy"))
            .expect("doc");
        let statements = doc["Statement"].as_array().expect("statements");
        assert_eq!(statements.len(), 2);
        assert_eq!(
            statements[0]["Resource"],
            serde_json::json!(["arn:aws:sqs:us-east-1:123456789012:orders"])
        );
        let actions = statements[0]["Action"].as_array().expect("actions");
        assert!(actions.iter().any(|a| a == "sqs:ReceiveMessage"));
        assert!(actions.iter().any(|a| a == "kinesis:GetRecords"));
        assert_eq!(statements[1]["Action"][0], "sns:Publish");
    }

    #[test]
    fn trusted_entities_extend_assume_role_policy() {
        let mut config = base_config();
        config.trusted_entities = vec!["edgelambda.amazonaws.com".into()];
        let graph = assemble_config(&config).expect("assemble");
        let doc = graph
            .get("role")
            .and_then(|n| n.field("assume_role_policy"))
            .expect("doc");
        assert_eq!(
            doc["Statement"][0]["Principal"]["Service"],
            serde_json::json!(["lambda.amazonaws.com", "edgelambda.amazonaws.com"])
        );
    }
}
