//! Query registry holding the active name → JSONPath bindings.
//!
//! A registry is built once from configuration and never mutated afterwards.
//! Routers share it through `Arc`; a configuration change means building a
//! new registry.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json_path::JsonPath;

use crate::error::{ConfigurationError, EvalError};

/// Where extracted values are written on a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// Replace the record content with the single extracted value
    #[default]
    #[serde(alias = "flowfile-content")]
    Content,
    /// Attach each extracted value as an attribute named after its query
    #[serde(alias = "flowfile-attribute")]
    Attribute,
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Content => write!(f, "content"),
            Destination::Attribute => write!(f, "attribute"),
        }
    }
}

/// A named JSONPath expression.
#[derive(Debug)]
pub struct QueryBinding {
    name: String,
    expression: String,
    /// Compiled once; a compile failure is reported per record on evaluation
    compiled: Result<JsonPath, EvalError>,
}

impl QueryBinding {
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        let expression = expression.into();
        let compiled = JsonPath::parse(&expression).map_err(|e| EvalError::InvalidExpression {
            expression: expression.clone(),
            reason: e.to_string(),
        });

        Self {
            name: name.into(),
            expression,
            compiled,
        }
    }

    /// Attribute name the extracted value is stored under
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The compiled path, or the compile error to report for every record
    pub fn compiled(&self) -> Result<&JsonPath, &EvalError> {
        self.compiled.as_ref()
    }

    pub fn is_valid(&self) -> bool {
        self.compiled.is_ok()
    }
}

/// Ordered, immutable set of query bindings plus the output destination.
#[derive(Debug)]
pub struct QueryRegistry {
    bindings: Vec<QueryBinding>,
    destination: Destination,
}

impl QueryRegistry {
    /// Build a registry from ordered `(name, expression)` pairs.
    ///
    /// # Arguments
    /// * `bindings` - Query name and JSONPath expression, in evaluation order
    /// * `destination` - Where matches are written
    ///
    /// # Errors
    /// * `DuplicateName` - The same name appears twice
    /// * `EmptyName` - A name is empty
    /// * `TooManyQueriesForContent` - More than one query with `Destination::Content`
    ///
    /// # Example
    /// ```
    /// use pathroute::runtime::{Destination, QueryRegistry};
    ///
    /// let registry = QueryRegistry::new(
    ///     [("json-name", "$.data.name"), ("json-age", "$.data.age")],
    ///     Destination::Attribute,
    /// ).unwrap();
    /// assert_eq!(registry.len(), 2);
    /// ```
    pub fn new<I, K, V>(bindings: I, destination: Destination) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut compiled = Vec::new();

        for (name, expression) in bindings {
            let binding = QueryBinding::new(name, expression);

            if binding.name.is_empty() {
                return Err(ConfigurationError::EmptyName(binding.expression));
            }
            if !seen.insert(binding.name.clone()) {
                return Err(ConfigurationError::DuplicateName(binding.name));
            }
            if let Err(e) = &binding.compiled {
                tracing::warn!(
                    "Query '{}' will fail for every record: {}",
                    binding.name,
                    e
                );
            }

            compiled.push(binding);
        }

        if destination == Destination::Content && compiled.len() > 1 {
            return Err(ConfigurationError::TooManyQueriesForContent(compiled.len()));
        }

        if compiled.is_empty() {
            tracing::warn!("No queries configured; every record will be routed to 'unmatched'");
        }

        Ok(Self {
            bindings: compiled,
            destination,
        })
    }

    /// Bindings in evaluation order
    pub fn bindings(&self) -> &[QueryBinding] {
        &self.bindings
    }

    pub fn destination(&self) -> Destination {
        self.destination
    }

    pub fn get(&self, name: &str) -> Option<&QueryBinding> {
        self.bindings.iter().find(|b| b.name == name)
    }

    /// Query names in evaluation order
    pub fn names(&self) -> Vec<&str> {
        self.bindings.iter().map(|b| b.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_preserves_order() {
        let registry = QueryRegistry::new(
            [("zeta", "$.z"), ("alpha", "$.a"), ("mid", "$.m")],
            Destination::Attribute,
        )
        .unwrap();

        assert_eq!(registry.names(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(registry.destination(), Destination::Attribute);
    }

    #[test]
    fn test_content_destination_single_query() {
        let registry = QueryRegistry::new([("out", "$.data")], Destination::Content).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_content_destination_rejects_multiple_queries() {
        let result = QueryRegistry::new(
            [("a", "$.a"), ("b", "$.b")],
            Destination::Content,
        );

        assert_eq!(
            result.unwrap_err(),
            ConfigurationError::TooManyQueriesForContent(2)
        );
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let result = QueryRegistry::new(
            [("a", "$.a"), ("a", "$.b")],
            Destination::Attribute,
        );

        assert_eq!(
            result.unwrap_err(),
            ConfigurationError::DuplicateName("a".to_string())
        );
    }

    #[test]
    fn test_empty_name_rejected() {
        let result = QueryRegistry::new([("", "$.a")], Destination::Attribute);
        assert!(matches!(result, Err(ConfigurationError::EmptyName(_))));
    }

    #[test]
    fn test_invalid_expression_is_kept() {
        let registry = QueryRegistry::new(
            [("ok", "$.a"), ("broken", "$.[")],
            Destination::Attribute,
        )
        .unwrap();

        assert!(registry.get("ok").unwrap().is_valid());
        let broken = registry.get("broken").unwrap();
        assert!(!broken.is_valid());
        assert!(matches!(
            broken.compiled(),
            Err(EvalError::InvalidExpression { .. })
        ));
    }

    #[test]
    fn test_empty_registry_allowed() {
        let registry =
            QueryRegistry::new(Vec::<(String, String)>::new(), Destination::Content).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_destination_deserialize_aliases() {
        let d: Destination = serde_yaml::from_str("flowfile-attribute").unwrap();
        assert_eq!(d, Destination::Attribute);
        let d: Destination = serde_yaml::from_str("content").unwrap();
        assert_eq!(d, Destination::Content);
        assert_eq!(Destination::default(), Destination::Content);
    }
}
