//! Router configuration loader.
//!
//! Loads the destination, batch size and ordered query list from YAML and
//! turns them into a validated [`QueryRegistry`].

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::runtime::query_registry::{Destination, QueryRegistry};
use crate::runtime::router::DEFAULT_BATCH_SIZE;

/// A single configured query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDef {
    /// Attribute name for the extracted value
    pub name: String,
    /// JSONPath expression
    pub path: String,
}

/// Router configuration.
///
/// ```yaml
/// destination: attribute
/// batch_size: 50
/// queries:
///   - name: json-name
///     path: $.data.name
///   - name: json-age
///     path: $.data.age
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default)]
    pub destination: Destination,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Queries in evaluation order
    #[serde(default)]
    pub queries: Vec<QueryDef>,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            destination: Destination::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            queries: Vec::new(),
        }
    }
}

impl RouterConfig {
    /// Load router configuration from a YAML file.
    ///
    /// # Errors
    /// Returns error if the file can't be read, isn't valid YAML, or has a
    /// zero batch size
    ///
    /// # Example
    /// ```ignore
    /// use pathroute::runtime::RouterConfig;
    ///
    /// let config = RouterConfig::load_from_file("config/router.yaml")?;
    /// let registry = config.build_registry()?;
    /// ```
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path).map_err(|e| ConfigurationError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::from_yaml_str(&contents)
    }

    /// Parse router configuration from a YAML string.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigurationError> {
        let config: RouterConfig =
            serde_yaml::from_str(contents).map_err(|e| ConfigurationError::Yaml(e.to_string()))?;

        if config.batch_size == 0 {
            return Err(ConfigurationError::InvalidBatchSize);
        }

        Ok(config)
    }

    /// Build the query registry described by this configuration.
    pub fn build_registry(&self) -> Result<QueryRegistry, ConfigurationError> {
        QueryRegistry::new(
            self.queries.iter().map(|q| (q.name.as_str(), q.path.as_str())),
            self.destination,
        )
    }
}
