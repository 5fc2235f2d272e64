//! Assistant configuration.
//!
//! Reads the `[assistant]` section from `config/default.toml`.  Every field
//! falls back to its default on its own, so a partial or malformed file
//! still yields a usable configuration.

use std::path::{Path, PathBuf};

use tracing::warn;

/// Settings loaded from the `[assistant]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantConfig {
    /// Default tracing filter; `RUST_LOG` wins when set.
    pub log_level: String,
    /// Where the workflow context is persisted between runs.
    pub context_file: PathBuf,
    /// Display names of the simulated document list.
    pub documents: Vec<String>,
    /// Printed in front of responses that would be spoken.
    pub speak_prefix: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            context_file: PathBuf::from("data/context.json"),
            documents: Vec::new(),
            speak_prefix: "🔊".to_string(),
        }
    }
}

/// Load the assistant configuration from `path`.
///
/// Falls back to defaults if the file is missing or the `[assistant]`
/// section is absent.
pub fn load_assistant_config(path: &Path) -> AssistantConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_assistant_config(&content),
        Err(_) => AssistantConfig::default(),
    }
}

/// Parse configuration text.  See [`load_assistant_config`].
pub fn parse_assistant_config(content: &str) -> AssistantConfig {
    let defaults = AssistantConfig::default();

    let table: toml::Table = match content.parse() {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, "config is not valid TOML, using defaults");
            return defaults;
        }
    };

    let assistant = match table.get("assistant") {
        Some(toml::Value::Table(a)) => a,
        _ => return defaults,
    };

    AssistantConfig {
        log_level: assistant
            .get("log_level")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .unwrap_or(defaults.log_level),
        context_file: assistant
            .get("context_file")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.context_file),
        documents: assistant
            .get("documents")
            .and_then(|v| v.as_array())
            .map(|docs| {
                docs.iter()
                    .filter_map(|d| d.as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or(defaults.documents),
        speak_prefix: assistant
            .get("speak_prefix")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or(defaults.speak_prefix),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_assistant_config(&dir.path().join("nope.toml"));
        assert_eq!(config, AssistantConfig::default());
    }

    #[test]
    fn reads_assistant_section() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[assistant]
log_level = "debug"
context_file = "state/ctx.json"
documents = ["a.pdf", "b.pdf", "c.pdf"]
speak_prefix = ">"
"#
        )
        .unwrap();

        let config = load_assistant_config(file.path());
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.context_file, PathBuf::from("state/ctx.json"));
        assert_eq!(config.documents.len(), 3);
        assert_eq!(config.speak_prefix, ">");
    }

    #[test]
    fn bad_fields_fall_back_one_by_one() {
        let config = parse_assistant_config(
            r#"
[assistant]
log_level = 3
documents = ["only.pdf", 7]
"#,
        );
        assert_eq!(config.log_level, "info");
        assert_eq!(config.documents, vec!["only.pdf".to_string()]);
        assert_eq!(config.context_file, PathBuf::from("data/context.json"));
    }

    #[test]
    fn broken_toml_gives_defaults() {
        assert_eq!(parse_assistant_config("[assistant"), AssistantConfig::default());
        assert_eq!(parse_assistant_config("[other]\nx = 1"), AssistantConfig::default());
    }
}
