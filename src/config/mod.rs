//! Configuration system for crd-gates.
//!
//! This module provides the configuration structure for crd-gates with sensible defaults
//! and support for deserialization via serde. Configuration is loaded from a TOML file,
//! either the user's default config file or one named on the command line.
//!
//! # Example
//!
//! ```
//! use crd_gates::config::{render_directive, Config};
//!
//! // Use default configuration
//! let config = Config::default();
//! assert_eq!(config.indent_size, 2);
//! assert_eq!(render_directive(&config.if_directive, "scaling"), "{{- if .scaling }}");
//!
//! // Create custom configuration
//! let custom = Config {
//!     indent_size: 4,
//!     if_directive: "{{ if .Values.gates.{gate} }}".to_string(),
//!     ..Config::default()
//! };
//! assert_eq!(render_directive(&custom.if_directive, "beta"), "{{ if .Values.gates.beta }}");
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Placeholder substituted with the gate name in directive templates.
pub const GATE_PLACEHOLDER: &str = "{gate}";

/// Configuration for crd-gates.
///
/// All fields have sensible defaults via `Config::default()`, and every field
/// may be omitted from the TOML file.
///
/// # Fields
///
/// * `indent_size` - Number of spaces per indentation level (default: 2)
/// * `indent_sequences` - Indent block sequences under their mapping key (default: false)
/// * `if_directive` - Head comment placed above a gated field (default: "{{- if .{gate} }}")
/// * `end_directive` - Foot comment placed below a gated field (default: "{{- end }}")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Number of spaces per indentation level
    #[serde(default = "default_indent_size")]
    pub indent_size: usize,

    /// Indent block sequences one level under their mapping key
    #[serde(default)]
    pub indent_sequences: bool,

    /// Template for the opening directive; `{gate}` is replaced by the gate name
    #[serde(default = "default_if_directive")]
    pub if_directive: String,

    /// Template for the closing directive
    #[serde(default = "default_end_directive")]
    pub end_directive: String,
}

/// Returns the default indentation size.
fn default_indent_size() -> usize {
    2
}

fn default_if_directive() -> String {
    "{{- if .{gate} }}".to_string()
}

fn default_end_directive() -> String {
    "{{- end }}".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            indent_size: default_indent_size(),
            indent_sequences: false,
            if_directive: default_if_directive(),
            end_directive: default_end_directive(),
        }
    }
}

impl Config {
    /// Returns the path to the config file.
    ///
    /// Uses `~/.config/crd-gates/config.toml` on all platforms.
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|mut path| {
            path.push(".config");
            path.push("crd-gates");
            path.push("config.toml");
            path
        })
    }

    /// Loads configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist or can't be read.
    pub fn load() -> Self {
        let config_path = match Self::config_path() {
            Some(path) => path,
            None => return Self::default(),
        };

        if !config_path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|err| {
                tracing::warn!(
                    "Ignoring invalid config file {}: {}",
                    config_path.display(),
                    err
                );
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Loads configuration from an explicit file, reporting any error.
    pub fn load_from<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }
}

/// Substitutes `gate` for every placeholder in `template`.
pub fn render_directive(template: &str, gate: &str) -> String {
    template.replace(GATE_PLACEHOLDER, gate)
}
