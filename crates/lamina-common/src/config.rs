//! Resolution context: the account and region a module is resolved for.
//!
//! The host environment never injects these implicitly; callers thread a
//! [`ResolutionContext`] into every resolution.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PARTITION, DEFAULT_REGION};

/// Account, region, and partition used to build identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionContext {
    /// ARN partition (`aws`, `aws-cn`, `aws-us-gov`).
    pub partition: String,
    /// Region the function is deployed into.
    pub region: String,
    /// Account the function is deployed into. When absent, account-scoped
    /// identifiers are emitted as references for the provisioning engine.
    pub account_id: Option<String>,
}

impl ResolutionContext {
    /// Creates a context for `region` in the default partition.
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Self::default()
        }
    }

    /// Sets the account identifier.
    #[must_use]
    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// Sets the partition.
    #[must_use]
    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = partition.into();
        self
    }

    /// Returns the ARN of an AWS-managed policy in this partition.
    #[must_use]
    pub fn managed_policy_arn(&self, policy: &str) -> String {
        format!("arn:{}:iam::aws:policy/{policy}", self.partition)
    }

    /// Returns the account segment used in ARNs, or a provider reference
    /// when the account is unknown.
    #[must_use]
    pub fn account_segment(&self) -> String {
        self.account_id
            .clone()
            .unwrap_or_else(|| "${caller.account_id}".to_owned())
    }
}

impl Default for ResolutionContext {
    fn default() -> Self {
        Self {
            partition: DEFAULT_PARTITION.to_owned(),
            region: DEFAULT_REGION.to_owned(),
            account_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn managed_policy_arn_uses_partition() {
        let ctx = ResolutionContext::new("cn-north-1").with_partition("aws-cn");
        assert_eq!(
            ctx.managed_policy_arn("AWSXRayDaemonWriteAccess"),
            "arn:aws-cn:iam::aws:policy/AWSXRayDaemonWriteAccess"
        );
    }

    #[test]
    fn account_segment_falls_back_to_reference() {
        let ctx = ResolutionContext::default();
        assert_eq!(ctx.account_segment(), "${caller.account_id}");
        let ctx = ctx.with_account_id("123456789012");
        assert_eq!(ctx.account_segment(), "123456789012");
    }
}
