//! Derived flags: booleans implied by combinations of inputs that gate
//! which resources the assembler creates.

use lamina_common::constants::SNAP_START_RUNTIME_PREFIX;
use serde::Serialize;

use crate::config::{FunctionConfig, PackageType};

/// The mechanism that supplies function code.
///
/// The package kind decides which variants are eligible: an Image package
/// only ever uses a container image, a Zip package picks among the other
/// three in listed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeSource {
    /// Local source tree, packaged during resolution.
    LocalTree,
    /// Prebuilt package on local disk.
    LocalPackage,
    /// Prebuilt package in object storage.
    RemotePackage,
    /// Container image.
    ContainerImage,
}

impl CodeSource {
    /// Picks the code source for the configured package kind, or `None` when
    /// no eligible source is set.
    #[must_use]
    pub fn select(config: &FunctionConfig) -> Option<Self> {
        let candidates = Self::populated(config);
        if candidates.len() > 1 {
            tracing::warn!(
                function = %config.function_name,
                sources = ?candidates,
                selected = ?candidates[0],
                "several code sources are set; using the highest-precedence one"
            );
        }
        candidates.first().copied()
    }

    fn populated(config: &FunctionConfig) -> Vec<Self> {
        let eligible = match config.package_type {
            PackageType::Zip => vec![
                (config.source_path.is_some(), Self::LocalTree),
                (config.local_existing_package.is_some(), Self::LocalPackage),
                (config.s3_existing_package.is_some(), Self::RemotePackage),
            ],
            PackageType::Image => vec![(config.image_uri.is_some(), Self::ContainerImage)],
        };
        eligible
            .into_iter()
            .filter_map(|(set, source)| set.then_some(source))
            .collect()
    }
}

/// Flags computed from a validated configuration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedFlags {
    /// Selected code source.
    pub code_source: Option<CodeSource>,
    /// A local source tree must be packaged.
    pub needs_package_build: bool,
    /// The network-access policy is attached.
    pub needs_network_policy: bool,
    /// The tracing policy is attached.
    pub needs_tracing_policy: bool,
    /// The dead-letter publish policy is attached.
    pub needs_dead_letter_policy: bool,
    /// An immutable numbered version is published.
    pub needs_version_publish: bool,
    /// The event-source read policy is attached.
    pub needs_event_source_policy: bool,
    /// The asynchronous destination policy is attached.
    pub needs_async_destination_policy: bool,
    /// An asynchronous invocation config node is created.
    pub needs_event_invoke_config: bool,
    /// Fast-startup snapshots are enabled on the function.
    pub snap_start_effective: bool,
}

impl DerivedFlags {
    /// Computes the flags for `config`.
    #[must_use]
    pub fn resolve(config: &FunctionConfig) -> Self {
        let code_source = CodeSource::select(config);
        let snap_start_supported = config
            .runtime
            .as_deref()
            .is_some_and(|r| r.starts_with(SNAP_START_RUNTIME_PREFIX));
        if config.snap_start && !snap_start_supported {
            tracing::warn!(
                runtime = ?config.runtime,
                "snap_start is only supported for java runtimes; ignoring"
            );
        }

        let flags = Self {
            code_source,
            needs_package_build: code_source == Some(CodeSource::LocalTree),
            needs_network_policy: config.attach_network_policy.unwrap_or_else(|| config.has_vpc()),
            needs_tracing_policy: config.tracing_mode.is_some(),
            needs_dead_letter_policy: config.dead_letter_target_arn.is_some(),
            needs_version_publish: config.publish
                || config.provisioned_concurrent_executions.is_some()
                || !config.aliases.is_empty(),
            needs_event_source_policy: config.create_role
                && !config.event_source_mappings.is_empty(),
            needs_async_destination_policy: config.destination_on_success.is_some()
                || config.destination_on_failure.is_some(),
            needs_event_invoke_config: config.has_async_config(),
            snap_start_effective: config.snap_start && snap_start_supported,
        };
        tracing::debug!(?flags, "derived flags resolved");
        flags
    }
}
