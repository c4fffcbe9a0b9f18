//! Static validation of a configuration record.
//!
//! Every rule runs on every call, so the caller sees all problems at once.
//! Validation is pure: it never touches the filesystem.

use lamina_common::constants::{
    ARCHITECTURES, ASYNC_EVENT_AGE_RANGE, BATCH_SIZE_RANGE, EPHEMERAL_STORAGE_RANGE,
    LATEST_VERSION, LOG_RETENTION_DAYS, MAPPING_RETRY_RANGE, MAX_ALIAS_NAME_LENGTH,
    MAX_ASYNC_RETRY_ATTEMPTS, MAX_BATCHING_WINDOW_SECONDS, MAX_CORS_MAX_AGE,
    MAX_DESCRIPTION_LENGTH, MAX_FUNCTION_NAME_LENGTH, MAX_LAYERS, MEMORY_SIZE_RANGE,
    PARALLELIZATION_RANGE, RECORD_AGE_RANGE, SCALING_CONCURRENCY_RANGE, SUPPORTED_RUNTIMES,
    TIMEOUT_RANGE,
};
use lamina_common::error::{LaminaError, Result, Violation};

use crate::arn::{ServiceFamily, parse_arn};
use crate::assembler::keys::PUBLIC_URL_PERMISSION;
use crate::config::{
    EventSourceMappingConfig, FunctionConfig, LogFormat, PackageType, StartingPosition,
};

const APPLICATION_LOG_LEVELS: &[&str] = &["TRACE", "DEBUG", "INFO", "WARN", "ERROR", "FATAL"];
const SYSTEM_LOG_LEVELS: &[&str] = &["DEBUG", "INFO", "WARN"];

/// Validates a configuration record.
///
/// # Checks performed
///
/// 1. Identity: name alphabet and length, description length.
/// 2. Code source: required fields per package kind.
/// 3. Runtime parameters: runtime whitelist, architecture, numeric ranges.
/// 4. Network and identity references: ARN shape, file-system placement.
/// 5. Optional features: layers, concurrency, retention, CORS, aliases,
///    event-source mappings, triggers, asynchronous invocation.
///
/// # Errors
///
/// Returns `LaminaError::Validation` carrying every violated constraint.
pub fn validate(config: &FunctionConfig) -> Result<()> {
    tracing::info!(function = %config.function_name, "validating configuration");
    let violations = collect_violations(config);
    if violations.is_empty() {
        return Ok(());
    }
    tracing::debug!(count = violations.len(), "configuration rejected");
    Err(LaminaError::Validation { violations })
}

/// Runs every rule and returns the violations found, in check order.
#[must_use]
pub fn collect_violations(config: &FunctionConfig) -> Vec<Violation> {
    let mut out = Vec::new();
    check_identity(config, &mut out);
    check_code_source(config, &mut out);
    check_runtime_parameters(config, &mut out);
    check_references(config, &mut out);
    check_concurrency(config, &mut out);
    check_logs(config, &mut out);
    check_function_url(config, &mut out);
    check_aliases(config, &mut out);
    for (name, mapping) in &config.event_source_mappings {
        check_mapping(name, mapping, &mut out);
    }
    check_triggers(config, &mut out);
    check_async(config, &mut out);
    out
}

fn push(out: &mut Vec<Violation>, field: impl Into<String>, rule: impl Into<String>) {
    out.push(Violation::new(field, rule));
}

fn check_range<T>(out: &mut Vec<Violation>, field: &str, value: T, (min, max): (T, T))
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if value < min || value > max {
        push(
            out,
            field,
            format!("must be between {min} and {max}, got {value}"),
        );
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn check_identity(config: &FunctionConfig, out: &mut Vec<Violation>) {
    let name = &config.function_name;
    if name.is_empty() {
        push(out, "function_name", "must not be empty");
    } else {
        if name.len() > MAX_FUNCTION_NAME_LENGTH {
            push(
                out,
                "function_name",
                format!("must be at most {MAX_FUNCTION_NAME_LENGTH} characters"),
            );
        }
        if !name.chars().all(is_name_char) {
            push(
                out,
                "function_name",
                "may only contain letters, digits, hyphens, and underscores",
            );
        }
    }
    if config.description.chars().count() > MAX_DESCRIPTION_LENGTH {
        push(
            out,
            "description",
            format!("must be at most {MAX_DESCRIPTION_LENGTH} characters"),
        );
    }
}

fn check_code_source(config: &FunctionConfig, out: &mut Vec<Violation>) {
    match config.package_type {
        PackageType::Zip => {
            let has_source = config.source_path.is_some()
                || config.local_existing_package.is_some()
                || config.s3_existing_package.is_some();
            if !has_source {
                push(
                    out,
                    "source_path",
                    "a Zip package needs source_path, local_existing_package, \
                     or s3_existing_package",
                );
            }
            if config.runtime.is_none() {
                push(out, "runtime", "is required for Zip packages");
            }
            if config.handler.as_deref().is_none_or(str::is_empty) {
                push(out, "handler", "is required for Zip packages");
            }
            if config.image_config.is_some() {
                push(out, "image_config", "is only allowed for Image packages");
            }
        }
        PackageType::Image => {
            if config.image_uri.as_deref().is_none_or(str::is_empty) {
                push(out, "image_uri", "is required for Image packages");
            }
        }
    }

    if let Some(s3) = &config.s3_existing_package {
        if s3.bucket.is_empty() {
            push(out, "s3_existing_package.bucket", "must not be empty");
        }
        if s3.key.is_empty() {
            push(out, "s3_existing_package.key", "must not be empty");
        }
    }
}

fn check_runtime_parameters(config: &FunctionConfig, out: &mut Vec<Violation>) {
    if let Some(runtime) = &config.runtime {
        if !SUPPORTED_RUNTIMES.contains(&runtime.as_str()) {
            push(out, "runtime", format!("unsupported runtime \"{runtime}\""));
        }
    }

    match config.architectures.as_slice() {
        [arch] if ARCHITECTURES.contains(&arch.as_str()) => {}
        [arch] => push(
            out,
            "architectures",
            format!("unsupported architecture \"{arch}\", expected x86_64 or arm64"),
        ),
        _ => push(out, "architectures", "must contain exactly one element"),
    }

    check_range(out, "memory_size", config.memory_size, MEMORY_SIZE_RANGE);
    check_range(out, "timeout", config.timeout, TIMEOUT_RANGE);
    check_range(
        out,
        "ephemeral_storage_size",
        config.ephemeral_storage_size,
        EPHEMERAL_STORAGE_RANGE,
    );

    for key in config.environment_variables.keys() {
        let mut chars = key.chars();
        let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            push(
                out,
                format!("environment_variables.{key}"),
                "key must start with a letter and contain only letters, digits, and underscores",
            );
        }
    }

    if config.layers.len() > MAX_LAYERS {
        push(
            out,
            "layers",
            format!(
                "at most {MAX_LAYERS} layers are allowed, got {}",
                config.layers.len()
            ),
        );
    }

    if let Some(logging) = &config.logging {
        if let Some(level) = &logging.application_log_level {
            if !APPLICATION_LOG_LEVELS.contains(&level.as_str()) {
                push(out, "logging.application_log_level", format!("unknown level \"{level}\""));
            }
        }
        if let Some(level) = &logging.system_log_level {
            if !SYSTEM_LOG_LEVELS.contains(&level.as_str()) {
                push(out, "logging.system_log_level", format!("unknown level \"{level}\""));
            }
        }
        let has_levels =
            logging.application_log_level.is_some() || logging.system_log_level.is_some();
        if has_levels && logging.log_format != LogFormat::Json {
            push(out, "logging", "log levels require the JSON log format");
        }
    }
}

fn check_arn(out: &mut Vec<Violation>, field: &str, value: &str) {
    if parse_arn(value).is_none() {
        push(out, field, format!("\"{value}\" is not a valid ARN"));
    }
}

fn check_references(config: &FunctionConfig, out: &mut Vec<Violation>) {
    if let Some(role) = &config.lambda_role {
        check_arn(out, "lambda_role", role);
    }
    if let Some(boundary) = &config.role_permissions_boundary {
        check_arn(out, "role_permissions_boundary", boundary);
    }
    for (i, policy) in config.policies.iter().enumerate() {
        check_arn(out, &format!("policies[{i}]"), policy);
    }
    for (i, layer) in config.layers.iter().enumerate() {
        check_arn(out, &format!("layers[{i}]"), layer);
    }
    if let Some(key) = &config.kms_key_arn {
        check_arn(out, "kms_key_arn", key);
    }

    for (i, statement) in config.policy_statements.iter().enumerate() {
        if statement.actions.is_empty() {
            push(out, format!("policy_statements[{i}].actions"), "must not be empty");
        }
        if statement.resources.is_empty() {
            push(out, format!("policy_statements[{i}].resources"), "must not be empty");
        }
    }

    if let Some(target) = &config.dead_letter_target_arn {
        match parse_arn(target).map(|arn| arn.family()) {
            Some(ServiceFamily::Sns | ServiceFamily::Sqs) => {}
            Some(_) => push(
                out,
                "dead_letter_target_arn",
                "must reference an SNS topic or an SQS queue",
            ),
            None => check_arn(out, "dead_letter_target_arn", target),
        }
    }

    if let Some(fs) = &config.file_system {
        check_arn(out, "file_system.arn", &fs.arn);
        if !fs.local_mount_path.starts_with("/mnt/") {
            push(out, "file_system.local_mount_path", "must be under /mnt/");
        }
        if config.vpc_subnet_ids.is_empty() {
            push(out, "file_system", "requires vpc_subnet_ids");
        }
    }
}

fn check_concurrency(config: &FunctionConfig, out: &mut Vec<Violation>) {
    if config.reserved_concurrent_executions < -1 {
        push(
            out,
            "reserved_concurrent_executions",
            "must be -1 (unreserved) or a non-negative number",
        );
    }
    if let Some(provisioned) = config.provisioned_concurrent_executions {
        if provisioned <= 0 {
            push(out, "provisioned_concurrent_executions", "must be greater than 0");
        }
    }
}

fn check_logs(config: &FunctionConfig, out: &mut Vec<Violation>) {
    if let Some(days) = config.cloudwatch_logs_retention_in_days {
        if !LOG_RETENTION_DAYS.contains(&days) {
            push(
                out,
                "cloudwatch_logs_retention_in_days",
                format!("{days} is not an accepted retention period"),
            );
        }
    }
    if let Some(key) = &config.cloudwatch_logs_kms_key_id {
        check_arn(out, "cloudwatch_logs_kms_key_id", key);
    }
}

fn check_function_url(config: &FunctionConfig, out: &mut Vec<Violation>) {
    if let Some(cors) = &config.cors {
        if let Some(age) = cors.max_age {
            if age > MAX_CORS_MAX_AGE {
                push(
                    out,
                    "cors.max_age",
                    format!("must be at most {MAX_CORS_MAX_AGE} seconds"),
                );
            }
        }
    }
}

fn check_aliases(config: &FunctionConfig, out: &mut Vec<Violation>) {
    for (name, alias) in &config.aliases {
        let field = format!("aliases.{name}");
        let valid_name = !name.is_empty()
            && name.len() <= MAX_ALIAS_NAME_LENGTH
            && name.chars().all(is_name_char)
            && !name.chars().all(|c| c.is_ascii_digit());
        if !valid_name {
            push(
                out,
                field.clone(),
                "alias names use letters, digits, hyphens, and underscores \
                 and are not purely numeric",
            );
        }
        if alias.function_version.as_deref() == Some(LATEST_VERSION) {
            push(
                out,
                format!("{field}.function_version"),
                "must name a published version, not $LATEST",
            );
        }
        for (version, weight) in &alias.routing_additional_version_weights {
            if !(0.0..=1.0).contains(weight) {
                push(
                    out,
                    format!("{field}.routing_additional_version_weights.{version}"),
                    "weight must be between 0.0 and 1.0",
                );
            }
        }
    }
}

fn check_mapping(name: &str, mapping: &EventSourceMappingConfig, out: &mut Vec<Violation>) {
    let field = |suffix: &str| format!("event_source_mappings.{name}.{suffix}");

    match parse_arn(&mapping.event_source_arn) {
        Some(arn) if arn.family().is_event_source() => {
            let is_stream = matches!(
                arn.family(),
                ServiceFamily::Kinesis | ServiceFamily::DynamoDb | ServiceFamily::Kafka
            );
            if is_stream && mapping.starting_position.is_none() {
                push(out, field("starting_position"), "is required for stream sources");
            }
        }
        Some(_) => push(
            out,
            field("event_source_arn"),
            "must reference a queue, stream, or broker",
        ),
        None => push(
            out,
            field("event_source_arn"),
            format!("\"{}\" is not a valid ARN", mapping.event_source_arn),
        ),
    }

    if let Some(size) = mapping.batch_size {
        check_range(out, &field("batch_size"), size, BATCH_SIZE_RANGE);
    }
    if mapping.maximum_batching_window_in_seconds > MAX_BATCHING_WINDOW_SECONDS {
        push(
            out,
            field("maximum_batching_window_in_seconds"),
            format!("must be at most {MAX_BATCHING_WINDOW_SECONDS}"),
        );
    }
    if mapping.starting_position == Some(StartingPosition::AtTimestamp)
        && mapping.starting_position_timestamp.is_none()
    {
        push(
            out,
            field("starting_position_timestamp"),
            "is required when starting_position is AT_TIMESTAMP",
        );
    }
    if let Some(retries) = mapping.maximum_retry_attempts {
        check_range(out, &field("maximum_retry_attempts"), retries, MAPPING_RETRY_RANGE);
    }
    if let Some(age) = mapping.maximum_record_age_in_seconds {
        if age != -1 {
            check_range(out, &field("maximum_record_age_in_seconds"), age, RECORD_AGE_RANGE);
        }
    }
    if let Some(limit) = mapping.scaling_max_concurrency {
        check_range(out, &field("scaling_max_concurrency"), limit, SCALING_CONCURRENCY_RANGE);
    }
    if let Some(factor) = mapping.parallelization_factor {
        check_range(out, &field("parallelization_factor"), factor, PARALLELIZATION_RANGE);
    }
    if let Some(dest) = &mapping.destination_on_failure {
        check_arn(out, &field("destination_on_failure"), dest);
    }
    for (i, pattern) in mapping.filter_patterns.iter().enumerate() {
        if pattern.trim().is_empty() {
            push(out, field(&format!("filter_patterns[{i}]")), "must not be empty");
        }
    }
}

fn check_triggers(config: &FunctionConfig, out: &mut Vec<Violation>) {
    for (name, trigger) in &config.allowed_triggers {
        if name == PUBLIC_URL_PERMISSION {
            push(
                out,
                format!("allowed_triggers.{name}"),
                "is reserved for the public endpoint permission",
            );
        }
        if trigger.principal.is_empty() {
            push(out, format!("allowed_triggers.{name}.principal"), "must not be empty");
        }
        if let Some(source) = &trigger.source_arn {
            check_arn(out, &format!("allowed_triggers.{name}.source_arn"), source);
        }
    }
}

fn check_async(config: &FunctionConfig, out: &mut Vec<Violation>) {
    if let Some(age) = config.maximum_event_age_in_seconds {
        check_range(out, "maximum_event_age_in_seconds", age, ASYNC_EVENT_AGE_RANGE);
    }
    if let Some(retries) = config.maximum_retry_attempts {
        check_range(
            out,
            "maximum_retry_attempts",
            retries,
            (0, MAX_ASYNC_RETRY_ATTEMPTS),
        );
    }
    for (field, dest) in [
        ("destination_on_success", &config.destination_on_success),
        ("destination_on_failure", &config.destination_on_failure),
    ] {
        if let Some(dest) = dest {
            match parse_arn(dest) {
                Some(arn) if arn.family().delivery_action().is_some() => {}
                Some(_) => push(
                    out,
                    field,
                    "must reference a queue, topic, function, or event bus",
                ),
                None => check_arn(out, field, dest),
            }
        }
    }
}
