//! The configuration record: the sole input of a resolution.
//!
//! Field names match the module's input variables. Every field has a
//! default, so a document only needs to spell out what it changes.

pub mod load;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration record for one function module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FunctionConfig {
    /// Function name.
    pub function_name: String,
    /// Free-form description.
    pub description: String,

    /// Deployment package kind.
    pub package_type: PackageType,
    /// Local source tree to package.
    pub source_path: Option<PathBuf>,
    /// Entries under `source_path` to leave out of the package.
    pub package_excludes: Vec<String>,
    /// Prebuilt package on local disk.
    pub local_existing_package: Option<PathBuf>,
    /// Prebuilt package in object storage.
    pub s3_existing_package: Option<S3Package>,
    /// Container image reference.
    pub image_uri: Option<String>,
    /// Container image overrides.
    pub image_config: Option<ImageConfig>,

    /// Execution environment identifier.
    pub runtime: Option<String>,
    /// Entry point inside the package.
    pub handler: Option<String>,
    /// Instruction-set architecture; exactly one element.
    pub architectures: Vec<String>,
    /// Memory in MiB.
    pub memory_size: u32,
    /// Timeout in seconds.
    pub timeout: u32,
    /// Ephemeral `/tmp` storage in MiB.
    pub ephemeral_storage_size: u32,
    /// Environment variables exposed to the function.
    pub environment_variables: BTreeMap<String, String>,
    /// Key used to encrypt environment variables.
    pub kms_key_arn: Option<String>,
    /// Log format and level controls.
    pub logging: Option<LoggingConfig>,
    /// Shared file system mount.
    pub file_system: Option<FileSystemConfig>,

    /// Subnets for VPC placement.
    pub vpc_subnet_ids: Vec<String>,
    /// Security groups for VPC placement.
    pub vpc_security_group_ids: Vec<String>,
    /// Explicit override for attaching the network-access policy.
    pub attach_network_policy: Option<bool>,

    /// Whether to create the execution role.
    pub create_role: bool,
    /// Externally managed role, used when `create_role` is false.
    pub lambda_role: Option<String>,
    /// Name of the created role; defaults to the function name.
    pub role_name: Option<String>,
    /// Path of the created role.
    pub role_path: Option<String>,
    /// Permissions boundary of the created role.
    pub role_permissions_boundary: Option<String>,
    /// Extra service principals allowed to assume the created role.
    pub trusted_entities: Vec<String>,
    /// Custom permission statements granted to the created role.
    pub policy_statements: Vec<PolicyStatement>,
    /// Externally managed policies attached to the created role.
    pub policies: Vec<String>,

    /// Tracing mode.
    pub tracing_mode: Option<TracingMode>,
    /// Queue or topic receiving failed asynchronous events.
    pub dead_letter_target_arn: Option<String>,
    /// Reserved concurrency; `-1` means unreserved.
    pub reserved_concurrent_executions: i32,
    /// Provisioned concurrency on the published version.
    pub provisioned_concurrent_executions: Option<i32>,
    /// Whether to publish an immutable version.
    pub publish: bool,
    /// Layer version ARNs.
    pub layers: Vec<String>,
    /// Log retention in days.
    pub cloudwatch_logs_retention_in_days: Option<u32>,
    /// Key used to encrypt the log group.
    pub cloudwatch_logs_kms_key_id: Option<String>,
    /// Whether to enable fast-startup snapshots.
    pub snap_start: bool,

    /// Whether to create a public HTTP endpoint.
    pub create_function_url: bool,
    /// Authorization mode of the endpoint.
    pub function_url_authorization_type: AuthorizationType,
    /// Response mode of the endpoint.
    pub function_url_invoke_mode: InvokeMode,
    /// CORS rules of the endpoint.
    pub cors: Option<CorsConfig>,

    /// Named aliases.
    pub aliases: BTreeMap<String, AliasConfig>,
    /// Event-stream subscriptions.
    pub event_source_mappings: BTreeMap<String, EventSourceMappingConfig>,
    /// Principals allowed to invoke the function.
    pub allowed_triggers: BTreeMap<String, TriggerPermission>,

    /// Maximum age of an asynchronous event before it is discarded.
    pub maximum_event_age_in_seconds: Option<u32>,
    /// Retries for failed asynchronous invocations.
    pub maximum_retry_attempts: Option<u32>,
    /// Destination for successful asynchronous invocations.
    pub destination_on_success: Option<String>,
    /// Destination for failed asynchronous invocations.
    pub destination_on_failure: Option<String>,

    /// Tags applied to every taggable resource.
    pub tags: BTreeMap<String, String>,
}

impl Default for FunctionConfig {
    fn default() -> Self {
        Self {
            function_name: String::new(),
            description: String::new(),
            package_type: PackageType::default(),
            source_path: None,
            package_excludes: Vec::new(),
            local_existing_package: None,
            s3_existing_package: None,
            image_uri: None,
            image_config: None,
            runtime: None,
            handler: None,
            architectures: vec!["x86_64".to_owned()],
            memory_size: 128,
            timeout: 3,
            ephemeral_storage_size: 512,
            environment_variables: BTreeMap::new(),
            kms_key_arn: None,
            logging: None,
            file_system: None,
            vpc_subnet_ids: Vec::new(),
            vpc_security_group_ids: Vec::new(),
            attach_network_policy: None,
            create_role: true,
            lambda_role: None,
            role_name: None,
            role_path: None,
            role_permissions_boundary: None,
            trusted_entities: Vec::new(),
            policy_statements: Vec::new(),
            policies: Vec::new(),
            tracing_mode: None,
            dead_letter_target_arn: None,
            reserved_concurrent_executions: -1,
            provisioned_concurrent_executions: None,
            publish: false,
            layers: Vec::new(),
            cloudwatch_logs_retention_in_days: None,
            cloudwatch_logs_kms_key_id: None,
            snap_start: false,
            create_function_url: false,
            function_url_authorization_type: AuthorizationType::default(),
            function_url_invoke_mode: InvokeMode::default(),
            cors: None,
            aliases: BTreeMap::new(),
            event_source_mappings: BTreeMap::new(),
            allowed_triggers: BTreeMap::new(),
            maximum_event_age_in_seconds: None,
            maximum_retry_attempts: None,
            destination_on_success: None,
            destination_on_failure: None,
            tags: BTreeMap::new(),
        }
    }
}

impl FunctionConfig {
    /// Returns `true` when subnets or security groups are configured.
    #[must_use]
    pub fn has_vpc(&self) -> bool {
        !self.vpc_subnet_ids.is_empty() || !self.vpc_security_group_ids.is_empty()
    }

    /// Returns `true` when any asynchronous invocation control is set.
    #[must_use]
    pub const fn has_async_config(&self) -> bool {
        self.maximum_event_age_in_seconds.is_some()
            || self.maximum_retry_attempts.is_some()
            || self.destination_on_success.is_some()
            || self.destination_on_failure.is_some()
    }
}

/// Deployment package kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackageType {
    /// Archive of code and dependencies.
    #[default]
    Zip,
    /// Container image.
    Image,
}

impl PackageType {
    /// Platform string for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zip => "Zip",
            Self::Image => "Image",
        }
    }
}

/// Package stored in an object-storage bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct S3Package {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Object version.
    #[serde(default)]
    pub version_id: Option<String>,
}

/// Container image overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageConfig {
    /// Overrides the image `ENTRYPOINT`.
    pub entry_point: Vec<String>,
    /// Overrides the image `CMD`.
    pub command: Vec<String>,
    /// Overrides the image `WORKDIR`.
    pub working_directory: Option<String>,
}

/// Log output controls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Output format.
    pub log_format: LogFormat,
    /// Minimum application log level (structured format only).
    pub application_log_level: Option<String>,
    /// Minimum platform log level (structured format only).
    pub system_log_level: Option<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogFormat {
    /// Plain text lines.
    #[default]
    Text,
    /// Structured JSON records.
    #[serde(rename = "JSON")]
    Json,
}

impl LogFormat {
    /// Platform string for this format.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Json => "JSON",
        }
    }
}

/// Shared file system mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSystemConfig {
    /// Access point ARN.
    pub arn: String,
    /// Mount path, under `/mnt/`.
    pub local_mount_path: String,
}

/// A permission statement granted to the execution role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyStatement {
    /// Statement identifier.
    pub sid: Option<String>,
    /// Allow or deny.
    pub effect: Effect,
    /// Actions the statement covers.
    pub actions: Vec<String>,
    /// Resources the statement covers.
    pub resources: Vec<String>,
    /// Conditions restricting the statement.
    pub conditions: Vec<PolicyCondition>,
}

/// Statement effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Grants the actions.
    #[default]
    Allow,
    /// Denies the actions.
    Deny,
}

impl Effect {
    /// Policy-language string for this effect.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "Allow",
            Self::Deny => "Deny",
        }
    }
}

/// A single statement condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyCondition {
    /// Condition operator (`StringEquals`, `ArnLike`, ...).
    pub test: String,
    /// Context key.
    pub variable: String,
    /// Accepted values.
    pub values: Vec<String>,
}

/// Tracing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TracingMode {
    /// Sample and record incoming requests.
    Active,
    /// Only propagate upstream sampling decisions.
    PassThrough,
}

impl TracingMode {
    /// Platform string for this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::PassThrough => "PassThrough",
        }
    }
}

/// Authorization mode of the public endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationType {
    /// Unauthenticated public access.
    #[serde(rename = "NONE")]
    None,
    /// Signed requests only.
    #[default]
    #[serde(rename = "AWS_IAM")]
    AwsIam,
}

impl AuthorizationType {
    /// Platform string for this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::AwsIam => "AWS_IAM",
        }
    }
}

/// Response mode of the public endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvokeMode {
    /// Buffer the whole response.
    #[default]
    Buffered,
    /// Stream the response as it is produced.
    ResponseStream,
}

impl InvokeMode {
    /// Platform string for this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buffered => "BUFFERED",
            Self::ResponseStream => "RESPONSE_STREAM",
        }
    }
}

/// CORS rules of the public endpoint. Unset fields take per-field defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Whether cookies and credentials are allowed.
    pub allow_credentials: Option<bool>,
    /// Allowed request headers.
    pub allow_headers: Option<Vec<String>>,
    /// Allowed methods.
    pub allow_methods: Option<Vec<String>>,
    /// Allowed origins.
    pub allow_origins: Option<Vec<String>>,
    /// Response headers exposed to the browser.
    pub expose_headers: Option<Vec<String>>,
    /// Preflight cache age in seconds.
    pub max_age: Option<u32>,
}

/// A named alias.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AliasConfig {
    /// Alias description.
    pub description: Option<String>,
    /// Version the alias points at; defaults to the published version.
    pub function_version: Option<String>,
    /// Extra versions receiving a share of traffic, by weight.
    pub routing_additional_version_weights: BTreeMap<String, f64>,
}

/// Position in a stream to start reading from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StartingPosition {
    /// Only new records.
    Latest,
    /// Oldest retained record.
    TrimHorizon,
    /// Records from a timestamp on.
    AtTimestamp,
}

impl StartingPosition {
    /// Platform string for this position.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Latest => "LATEST",
            Self::TrimHorizon => "TRIM_HORIZON",
            Self::AtTimestamp => "AT_TIMESTAMP",
        }
    }
}

/// An event-stream subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EventSourceMappingConfig {
    /// Queue, stream, or cluster to read from.
    pub event_source_arn: String,
    /// Records per batch.
    pub batch_size: Option<u32>,
    /// Seconds to gather records before invoking.
    pub maximum_batching_window_in_seconds: u32,
    /// Whether the subscription is active.
    pub enabled: bool,
    /// Stream starting position.
    pub starting_position: Option<StartingPosition>,
    /// Timestamp for `AT_TIMESTAMP`.
    pub starting_position_timestamp: Option<String>,
    /// Retries for a failing batch.
    pub maximum_retry_attempts: Option<i32>,
    /// Whether to split a failing batch in two.
    pub bisect_batch_on_function_error: Option<bool>,
    /// Maximum record age in seconds.
    pub maximum_record_age_in_seconds: Option<i32>,
    /// Filter patterns, each an opaque serialized filter.
    pub filter_patterns: Vec<String>,
    /// Destination for discarded batches.
    pub destination_on_failure: Option<String>,
    /// Maximum concurrent invocations for queue sources.
    pub scaling_max_concurrency: Option<u32>,
    /// Concurrent batches per shard.
    pub parallelization_factor: Option<u32>,
    /// Partial-batch response types.
    pub function_response_types: Vec<String>,
}

impl Default for EventSourceMappingConfig {
    fn default() -> Self {
        Self {
            event_source_arn: String::new(),
            batch_size: None,
            maximum_batching_window_in_seconds: 0,
            enabled: true,
            starting_position: None,
            starting_position_timestamp: None,
            maximum_retry_attempts: None,
            bisect_batch_on_function_error: None,
            maximum_record_age_in_seconds: None,
            filter_patterns: Vec::new(),
            destination_on_failure: None,
            scaling_max_concurrency: None,
            parallelization_factor: None,
            function_response_types: Vec::new(),
        }
    }
}

/// A principal allowed to invoke the function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TriggerPermission {
    /// Service or account principal.
    pub principal: String,
    /// Action granted; defaults to `lambda:InvokeFunction`.
    pub action: Option<String>,
    /// Source resource restriction.
    pub source_arn: Option<String>,
    /// Source account restriction.
    pub source_account: Option<String>,
    /// Event token restriction.
    pub event_source_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_module_inputs() {
        let config = FunctionConfig::default();
        assert!(config.create_role);
        assert!(!config.publish);
        assert_eq!(config.architectures, vec!["x86_64"]);
        assert_eq!(config.memory_size, 128);
        assert_eq!(config.timeout, 3);
        assert_eq!(config.ephemeral_storage_size, 512);
        assert_eq!(config.reserved_concurrent_executions, -1);
        assert_eq!(config.function_url_authorization_type, AuthorizationType::AwsIam);
    }

    #[test]
    fn mapping_defaults_enable_subscription() {
        let mapping = EventSourceMappingConfig::default();
        assert!(mapping.enabled);
        assert_eq!(mapping.maximum_batching_window_in_seconds, 0);
    }

    #[test]
    fn has_vpc_checks_either_list() {
        let mut config = FunctionConfig::default();
        assert!(!config.has_vpc());
        config.vpc_security_group_ids.push("sg-1".into());
        assert!(config.has_vpc());
    }
}
