//! Platform limits, whitelists, and well-known names.

/// Maximum length of a function name.
pub const MAX_FUNCTION_NAME_LENGTH: usize = 64;

/// Maximum length of a function description.
pub const MAX_DESCRIPTION_LENGTH: usize = 256;

/// Maximum number of layers attached to a function.
pub const MAX_LAYERS: usize = 5;

/// Inclusive memory range in MiB.
pub const MEMORY_SIZE_RANGE: (u32, u32) = (128, 10_240);

/// Inclusive timeout range in seconds.
pub const TIMEOUT_RANGE: (u32, u32) = (1, 900);

/// Inclusive ephemeral storage range in MiB.
pub const EPHEMERAL_STORAGE_RANGE: (u32, u32) = (512, 10_240);

/// Accepted log retention periods in days (`0` keeps logs forever).
pub const LOG_RETENTION_DAYS: &[u32] = &[
    0, 1, 3, 5, 7, 14, 30, 60, 90, 120, 150, 180, 365, 400, 545, 731, 1096, 1827, 2192, 2557,
    2922, 3288, 3653,
];

/// Supported instruction-set architectures.
pub const ARCHITECTURES: &[&str] = &["x86_64", "arm64"];

/// Runtime identifiers accepted by the validator.
pub const SUPPORTED_RUNTIMES: &[&str] = &[
    "nodejs18.x",
    "nodejs20.x",
    "nodejs22.x",
    "python3.9",
    "python3.10",
    "python3.11",
    "python3.12",
    "python3.13",
    "java8.al2",
    "java11",
    "java17",
    "java21",
    "dotnet8",
    "ruby3.2",
    "ruby3.3",
    "provided.al2",
    "provided.al2023",
];

/// Runtime family prefix that supports fast-startup snapshots.
pub const SNAP_START_RUNTIME_PREFIX: &str = "java";

/// Maximum CORS preflight cache age in seconds.
pub const MAX_CORS_MAX_AGE: u32 = 86_400;

/// Maximum alias name length.
pub const MAX_ALIAS_NAME_LENGTH: usize = 128;

/// The mutable, unqualified version pointer.
pub const LATEST_VERSION: &str = "$LATEST";

/// Inclusive event-source batch size range.
pub const BATCH_SIZE_RANGE: (u32, u32) = (1, 10_000);

/// Maximum event-source batching window in seconds.
pub const MAX_BATCHING_WINDOW_SECONDS: u32 = 300;

/// Inclusive event-source retry range (`-1` retries until expiry).
pub const MAPPING_RETRY_RANGE: (i32, i32) = (-1, 10_000);

/// Inclusive event-source record age range when not `-1`.
pub const RECORD_AGE_RANGE: (i32, i32) = (60, 604_800);

/// Inclusive event-source scaling concurrency range.
pub const SCALING_CONCURRENCY_RANGE: (u32, u32) = (2, 1_000);

/// Inclusive event-source parallelization factor range.
pub const PARALLELIZATION_RANGE: (u32, u32) = (1, 10);

/// Inclusive asynchronous event age range in seconds.
pub const ASYNC_EVENT_AGE_RANGE: (u32, u32) = (60, 21_600);

/// Maximum asynchronous retry attempts.
pub const MAX_ASYNC_RETRY_ATTEMPTS: u32 = 2;

/// Service principal of the compute platform.
pub const LAMBDA_SERVICE_PRINCIPAL: &str = "lambda.amazonaws.com";

/// Log group name prefix for function logs.
pub const LOG_GROUP_PREFIX: &str = "/aws/lambda/";

/// Managed policy granting log stream writes.
pub const BASIC_EXECUTION_POLICY: &str = "service-role/AWSLambdaBasicExecutionRole";

/// Managed policy granting network interface management inside a VPC.
pub const NETWORK_POLICY: &str = "service-role/AWSLambdaENIManagementAccess";

/// Managed policy granting trace segment uploads.
pub const TRACING_POLICY: &str = "AWSXRayDaemonWriteAccess";

/// Actions granted for event-source subscriptions, covering every
/// supported stream and queue family.
pub const EVENT_SOURCE_ACTIONS: &[&str] = &[
    "dynamodb:DescribeStream",
    "dynamodb:GetRecords",
    "dynamodb:GetShardIterator",
    "dynamodb:ListStreams",
    "kafka:DescribeCluster",
    "kafka:GetBootstrapBrokers",
    "kinesis:DescribeStream",
    "kinesis:DescribeStreamSummary",
    "kinesis:GetRecords",
    "kinesis:GetShardIterator",
    "kinesis:ListShards",
    "kinesis:ListStreams",
    "kinesis:SubscribeToShard",
    "mq:DescribeBroker",
    "sqs:ChangeMessageVisibility",
    "sqs:DeleteMessage",
    "sqs:GetQueueAttributes",
    "sqs:ReceiveMessage",
];

/// Default partition when none is supplied.
pub const DEFAULT_PARTITION: &str = "aws";

/// Default region when none is supplied.
pub const DEFAULT_REGION: &str = "us-east-1";

/// SHA-256 digest length in hex characters.
pub const SHA256_HEX_LENGTH: usize = 64;

/// Extension of packaged artifacts.
pub const ARTIFACT_EXTENSION: &str = "zip";

/// Default directory for packaged artifacts, relative to the working directory.
pub const DEFAULT_ARTIFACT_DIR: &str = "builds";
