//! Loading configuration records from YAML or JSON documents.

use std::path::Path;

use lamina_common::error::{LaminaError, Result};

use super::FunctionConfig;

/// Document format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// YAML document (`.yaml`, `.yml`).
    Yaml,
    /// JSON document (`.json`).
    Json,
}

impl Format {
    /// Picks the format from a file extension, defaulting to YAML.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Parses a configuration record from source text.
///
/// # Errors
///
/// Returns an error if the text is not a well-formed document or contains
/// unknown fields.
pub fn parse_config(input: &str, format: Format) -> Result<FunctionConfig> {
    match format {
        Format::Yaml => serde_yaml::from_str(input).map_err(|e| LaminaError::Config {
            message: format!("failed to parse YAML configuration: {e}"),
        }),
        Format::Json => Ok(serde_json::from_str(input)?),
    }
}

/// Loads a configuration record from a file.
///
/// Relative code-source paths are resolved against the file's directory.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<FunctionConfig> {
    tracing::info!(path = %path.display(), "loading configuration");
    let content = std::fs::read_to_string(path).map_err(|e| LaminaError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut config = parse_config(&content, Format::from_path(path))?;

    if let Some(base) = path.parent() {
        for slot in [&mut config.source_path, &mut config.local_existing_package] {
            if let Some(p) = slot.as_mut().filter(|p| p.is_relative()) {
                *p = base.join(&*p);
            }
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthorizationType, TracingMode};

    #[test]
    fn parse_yaml_applies_defaults() {
        let config = parse_config(
            "function_name: my-fn\nruntime: python3.12\nhandler: index.handler\n",
            Format::Yaml,
        )
        .expect("parse");
        assert_eq!(config.function_name, "my-fn");
        assert_eq!(config.runtime.as_deref(), Some("python3.12"));
        assert!(config.create_role);
        assert_eq!(config.timeout, 3);
    }

    #[test]
    fn parse_yaml_nested_blocks() {
        let input = r#"
function_name: api
tracing_mode: Active
create_function_url: true
function_url_authorization_type: NONE
aliases:
  live: {}
event_source_mappings:
  q:
    event_source_arn: arn:aws:sqs:us-east-1:123456789012:orders
    batch_size: 10
"#;
        let config = parse_config(input, Format::Yaml).expect("parse");
        assert_eq!(config.tracing_mode, Some(TracingMode::Active));
        assert_eq!(config.function_url_authorization_type, AuthorizationType::None);
        assert!(config.aliases.contains_key("live"));
        let q = &config.event_source_mappings["q"];
        assert_eq!(q.batch_size, Some(10));
        assert!(q.enabled);
    }

    #[test]
    fn parse_json_document() {
        let config = parse_config(
            r#"{"function_name": "f", "package_type": "Image", "image_uri": "repo/img:1"}"#,
            Format::Json,
        )
        .expect("parse");
        assert_eq!(config.image_uri.as_deref(), Some("repo/img:1"));
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = parse_config(r#"{"function_name": "f","#, Format::Json).unwrap_err();
        assert!(matches!(err, LaminaError::Serialization { .. }), "got: {err}");

        let err = parse_config(r#"{"function_name": "f", "memroy_size": 1}"#, Format::Json)
            .unwrap_err();
        assert!(err.to_string().contains("memroy_size"), "got: {err}");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = parse_config("function_name: f\nmemroy_size: 256\n", Format::Yaml).unwrap_err();
        assert!(err.to_string().contains("memroy_size"), "got: {err}");
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(Format::from_path(Path::new("fn.json")), Format::Json);
        assert_eq!(Format::from_path(Path::new("fn.yaml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("fn")), Format::Yaml);
    }

    #[test]
    fn load_resolves_relative_source_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fn.yaml");
        std::fs::write(&path, "function_name: f\nsource_path: src\n").expect("write");

        let config = load_config(&path).expect("load");
        assert_eq!(config.source_path, Some(dir.path().join("src")));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_config(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, LaminaError::Io { .. }));
    }
}
