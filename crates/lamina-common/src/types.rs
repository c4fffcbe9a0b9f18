//! Domain primitive types used across the Lamina workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable key identifying a node in the resolved resource graph.
///
/// Singleton nodes use a bare key (`function`, `log_group`); keyed
/// collections use `<prefix>.<name>` (`alias.live`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceKey(String);

impl ResourceKey {
    /// Creates a key from a string value.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Creates a key for a named member of a keyed collection.
    #[must_use]
    pub fn scoped(prefix: &str, name: &str) -> Self {
        Self(format!("{prefix}.{name}"))
    }

    /// Returns a reference to `attribute` of the node with this key.
    #[must_use]
    pub fn attr(&self, attribute: &str) -> Reference {
        Reference {
            key: self.clone(),
            attribute: attribute.to_owned(),
        }
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reference to an attribute that only exists once a sibling node has
/// been materialized by the provisioning engine.
///
/// Rendered as `${key.attribute}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    /// Node the attribute belongs to.
    pub key: ResourceKey,
    /// Attribute name on that node.
    pub attribute: String,
}

impl Reference {
    /// Parses a `${key.attribute}` interpolation string.
    ///
    /// The attribute is the segment after the last dot, so keyed nodes
    /// (`${alias.live.arn}`) round-trip.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let inner = text.strip_prefix("${")?.strip_suffix('}')?;
        let (key, attribute) = inner.rsplit_once('.')?;
        if key.is_empty() || attribute.is_empty() {
            return None;
        }
        Some(Self {
            key: ResourceKey::new(key),
            attribute: attribute.to_owned(),
        })
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${{{}.{}}}", self.key, self.attribute)
    }
}

impl From<Reference> for serde_json::Value {
    fn from(reference: Reference) -> Self {
        Self::String(reference.to_string())
    }
}

/// SHA-256 hash digest used for content-addressed artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sha256Hash(String);

impl Sha256Hash {
    /// Creates a hash from a hex-encoded string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a valid 64-character hex string.
    pub fn from_hex(hex: impl Into<String>) -> crate::error::Result<Self> {
        let hex = hex.into();
        if hex.len() != crate::constants::SHA256_HEX_LENGTH
            || !hex.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(crate::error::LaminaError::Config {
                message: format!("invalid SHA-256 hex string: {hex}"),
            });
        }
        Ok(Self(hex.to_ascii_lowercase()))
    }

    /// Returns the hex-encoded hash string.
    #[must_use]
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sha256:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_key_joins_prefix_and_name() {
        let key = ResourceKey::scoped("alias", "live");
        assert_eq!(key.as_str(), "alias.live");
    }

    #[test]
    fn reference_renders_interpolation() {
        let reference = ResourceKey::new("function").attr("version");
        assert_eq!(reference.to_string(), "${function.version}");
    }

    #[test]
    fn reference_parse_handles_keyed_nodes() {
        let parsed = Reference::parse("${alias.live.arn}").expect("parse");
        assert_eq!(parsed.key.as_str(), "alias.live");
        assert_eq!(parsed.attribute, "arn");
        assert!(Reference::parse("$LATEST").is_none());
        assert!(Reference::parse("${function}").is_none());
    }

    #[test]
    fn sha256_rejects_short_input() {
        assert!(Sha256Hash::from_hex("abc").is_err());
    }

    #[test]
    fn sha256_display_is_prefixed() {
        let hash = Sha256Hash::from_hex("A".repeat(64)).expect("valid");
        assert_eq!(hash.to_string(), format!("sha256:{}", "a".repeat(64)));
    }
}
