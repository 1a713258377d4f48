use std::{env, path::Path};

use anyhow::{Context, Result};
use config as cfg;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ArchGraphError, Direction, NodeId, RelationScope};

/// Inclusive bounds on the number of distinct neighbors an anchor may have.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NeighborBounds {
    #[serde(default)]
    pub min: Option<usize>,
    #[serde(default)]
    pub max: Option<usize>,
}

impl NeighborBounds {
    pub fn new(min: Option<usize>, max: Option<usize>) -> Self {
        Self { min, max }
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn contains(&self, count: usize) -> bool {
        self.min.map_or(true, |min| count >= min) && self.max.map_or(true, |max| count <= max)
    }
}

/// Per-request options honored by the abstraction pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestConfig {
    #[serde(default = "RequestConfig::default_name")]
    pub name: String,
    #[serde(default)]
    pub selected: Option<NodeId>,
    /// Containment edges deeper than this many levels are collapsed onto their ancestor.
    #[serde(default = "RequestDefaults::default_max_depth")]
    pub max_depth: usize,
    /// Longest dependency chain kept per record; `None` keeps all.
    #[serde(default)]
    pub dependency_depth: Option<usize>,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub scope: RelationScope,
    #[serde(default)]
    pub outgoing: NeighborBounds,
    #[serde(default)]
    pub incoming: NeighborBounds,
    #[serde(default = "RequestDefaults::default_self_edges")]
    pub self_edges: bool,
}

impl RequestConfig {
    fn default_name() -> String {
        "graph".to_string()
    }

    pub fn from_defaults(defaults: &RequestDefaults) -> Self {
        Self {
            name: Self::default_name(),
            selected: None,
            max_depth: defaults.max_depth,
            dependency_depth: defaults.dependency_depth,
            direction: defaults.direction,
            scope: RelationScope::All,
            outgoing: NeighborBounds::default(),
            incoming: NeighborBounds::default(),
            self_edges: defaults.self_edges,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_selected(mut self, id: impl Into<NodeId>) -> Self {
        self.selected = Some(id.into());
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_scope(mut self, scope: RelationScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_self_edges(mut self, enabled: bool) -> Self {
        self.self_edges = enabled;
        self
    }

    pub fn validate(&self) -> crate::Result<()> {
        for (name, bounds) in [("outgoing", &self.outgoing), ("incoming", &self.incoming)] {
            if let (Some(min), Some(max)) = (bounds.min, bounds.max) {
                if min > max {
                    return Err(ArchGraphError::InvalidConfig(format!(
                        "{} bounds: min {} exceeds max {}",
                        name, min, max
                    )));
                }
            }
        }
        if self.dependency_depth == Some(0) {
            return Err(ArchGraphError::InvalidConfig(
                "dependency depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self::from_defaults(&RequestDefaults::default())
    }
}

/// Service-wide defaults applied to requests that leave an option unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RequestDefaults {
    #[serde(default = "RequestDefaults::default_max_depth")]
    pub max_depth: usize,
    #[serde(default)]
    pub dependency_depth: Option<usize>,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default = "RequestDefaults::default_self_edges")]
    pub self_edges: bool,
}

impl RequestDefaults {
    fn default_max_depth() -> usize {
        1
    }

    fn default_self_edges() -> bool {
        true
    }
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            max_depth: Self::default_max_depth(),
            dependency_depth: None,
            direction: Direction::default(),
            self_edges: Self::default_self_edges(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Settings {
    #[serde(default = "Settings::default_env")]
    pub env: String,
    #[serde(default)]
    pub defaults: RequestDefaults,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            env: Self::default_env(),
            defaults: RequestDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Settings {
    fn default_env() -> String {
        env::var("APP_ENV")
            .ok()
            .or_else(|| env::var("RUST_ENV").ok())
            .unwrap_or_else(|| "development".to_string())
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.logging.level.trim().is_empty(),
            "logging.level cannot be empty"
        );
        anyhow::ensure!(
            self.defaults.max_depth <= 64,
            "defaults.max_depth must be 0..=64"
        );
        anyhow::ensure!(
            self.defaults.dependency_depth != Some(0),
            "defaults.dependency_depth must be at least 1"
        );
        Ok(())
    }

    /// Loads `default.*`, `{env}.*` and `local.toml` from `config_dir`, then `ARCHGRAPH__*`
    /// environment variables, later sources overriding earlier ones.
    pub fn load_from_sources(config_dir: &Path, env_name: &str) -> Result<Settings> {
        let builder = cfg::Config::builder()
            .add_source(cfg::File::from(config_dir.join("default.toml")).required(false))
            .add_source(cfg::File::from(config_dir.join("default.yaml")).required(false))
            .add_source(cfg::File::from(config_dir.join("default.json")).required(false))
            .add_source(
                cfg::File::from(config_dir.join(format!("{}.toml", env_name))).required(false),
            )
            .add_source(
                cfg::File::from(config_dir.join(format!("{}.yaml", env_name))).required(false),
            )
            .add_source(cfg::File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                cfg::Environment::with_prefix("ARCHGRAPH")
                    .separator("__")
                    .try_parsing(true),
            );

        let settings: Settings = builder
            .build()
            .context("building configuration")?
            .try_deserialize()
            .context("deserializing configuration")?;
        debug!(env = env_name, dir = ?config_dir, "configuration loaded");
        Ok(settings)
    }

    pub fn load(config_dir: &Path) -> Result<Settings> {
        let settings = Self::load_from_sources(config_dir, &Self::default_env())?;
        settings.validate()?;
        Ok(settings)
    }
}
