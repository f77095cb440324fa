// Chordrs Combo Configuration
// In-memory combo declarations with an optional TOML front end

use serde::Deserialize;

use crate::{ActionHandle, ComboDefinition, ComboRegistry, DefinitionError, KeyPosition};

/// Errors that can occur when loading combo configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("combo `{name}`: {source}")]
    Definition {
        name: String,
        #[source]
        source: DefinitionError,
    },
}

/// One declared combo, as written in configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComboSpec {
    /// Display name used in logs and error messages
    #[serde(default)]
    pub name: Option<String>,

    /// Required key positions, in any order
    pub key_positions: Vec<u16>,

    /// Window length in milliseconds granted to complete the combo
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Fire the release action after the last constituent key-up instead of
    /// the first
    #[serde(default)]
    pub slow_release: bool,

    /// Layers the combo is eligible on; absent means every layer
    #[serde(default)]
    pub layers: Option<Vec<u8>>,

    /// Opaque action-binding handle dispatched on press/release
    pub action: u32,
}

fn default_timeout_ms() -> u64 {
    50
}

impl ComboSpec {
    fn display_name(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("combo #{index}"))
    }
}

/// Static combo configuration, consumed once before the engine processes its
/// first event.
///
/// Can be assembled programmatically or parsed from a TOML document:
///
/// ```toml
/// [[combos]]
/// name = "copy"
/// key_positions = [12, 13]
/// timeout_ms = 150
/// action = 1
///
/// [[combos]]
/// name = "paste"
/// key_positions = [12, 13, 14]
/// slow_release = true
/// layers = [0, 1]
/// action = 2
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ComboConfig {
    #[serde(default)]
    pub combos: Vec<ComboSpec>,
}

impl ComboConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::TomlParse(e.to_string()))
    }

    /// Build the immutable registry from the declared combos.
    ///
    /// Definition validation errors are fatal; per-position index overflow is
    /// logged by the registry and fails open (that position has one fewer
    /// usable combo).
    pub fn build_registry(&self) -> Result<ComboRegistry, ConfigError> {
        let mut registry = ComboRegistry::new();
        for (index, spec) in self.combos.iter().enumerate() {
            let mut definition = ComboDefinition::new(
                spec.key_positions.iter().copied().map(KeyPosition::from),
                spec.timeout_ms,
                ActionHandle(spec.action),
            )
            .map_err(|source| ConfigError::Definition {
                name: spec.display_name(index),
                source,
            })?
            .with_slow_release(spec.slow_release);
            if let Some(layers) = &spec.layers {
                definition = definition.with_layers(layers.iter().copied());
            }
            registry.register(definition);
        }
        Ok(registry)
    }
}
