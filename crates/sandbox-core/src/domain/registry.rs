//! Domain registry
//!
//! Maps incoming domain strings to their [`DomainConfig`]. Built once at
//! startup through [`DomainRegistryBuilder`] and read-only afterwards.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::domain_config::DomainConfig;

/// Collects domain configurations before the registry is frozen
#[derive(Debug, Default)]
pub struct DomainRegistryBuilder {
    configs: Vec<Arc<DomainConfig>>,
}

impl DomainRegistryBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a domain. Registering the same canonical identifier again
    /// replaces the earlier entry in place.
    pub fn register(&mut self, config: DomainConfig) -> &mut Self {
        let config = Arc::new(config);
        match self.configs.iter().position(|c| c.domain == config.domain) {
            Some(index) => {
                debug!(domain = %config.domain, "Replacing registered domain");
                self.configs[index] = config;
            }
            None => {
                info!(domain = %config.domain, "Domain registered");
                self.configs.push(config);
            }
        }
        self
    }

    /// Freeze into an immutable registry
    pub fn build(&self) -> DomainRegistry {
        let mut by_id = HashMap::new();
        let mut patterns: Vec<(String, Arc<DomainConfig>)> = Vec::new();
        let mut pattern_index: HashMap<String, usize> = HashMap::new();

        for config in &self.configs {
            by_id.insert(config.domain.clone(), config.clone());

            for pattern in &config.match_patterns {
                let pattern = pattern.to_lowercase();
                // A pattern claimed twice keeps its first position and points
                // at the most recent registration
                match pattern_index.get(&pattern) {
                    Some(&index) => patterns[index].1 = config.clone(),
                    None => {
                        pattern_index.insert(pattern.clone(), patterns.len());
                        patterns.push((pattern, config.clone()));
                    }
                }
            }
        }

        DomainRegistry {
            order: self.configs.iter().map(|c| c.domain.clone()).collect(),
            by_id,
            pattern_index,
            patterns,
        }
    }
}

/// Immutable lookup from domain strings to configurations
#[derive(Debug, Clone, Default)]
pub struct DomainRegistry {
    order: Vec<String>,
    by_id: HashMap<String, Arc<DomainConfig>>,
    pattern_index: HashMap<String, usize>,
    patterns: Vec<(String, Arc<DomainConfig>)>,
}

impl DomainRegistry {
    /// Start building a registry
    pub fn builder() -> DomainRegistryBuilder {
        DomainRegistryBuilder::new()
    }

    /// Resolve a domain string.
    ///
    /// Order: exact canonical identifier, then exact pattern (case
    /// insensitive), then the first pattern in registration order contained
    /// in the lower-cased string. `None` when nothing matches.
    pub fn resolve(&self, domain: &str) -> Option<Arc<DomainConfig>> {
        if let Some(config) = self.by_id.get(domain) {
            return Some(config.clone());
        }

        let lowered = domain.to_lowercase();
        if let Some(&index) = self.pattern_index.get(&lowered) {
            return Some(self.patterns[index].1.clone());
        }

        self.patterns
            .iter()
            .find(|(pattern, _)| lowered.contains(pattern.as_str()))
            .map(|(_, config)| config.clone())
    }

    /// Whether `domain` resolves to any configuration
    pub fn is_registered(&self, domain: &str) -> bool {
        self.resolve(domain).is_some()
    }

    /// Canonical identifiers in registration order
    pub fn domains(&self) -> &[String] {
        &self.order
    }

    /// Number of registered domains
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no domain is registered
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::domain_config::MessageStructure;
    use crate::domain::generator::GeneratorTable;

    fn config(id: &str, patterns: &[&str]) -> DomainConfig {
        DomainConfig::new(id, Arc::new(GeneratorTable::new())).with_patterns(patterns.iter().copied())
    }

    #[test]
    fn test_resolution_order() {
        let mut builder = DomainRegistry::builder();
        builder
            .register(config("d1", &["widget"]))
            .register(config("d2", &["widget-store", "gadget"]));
        let registry = builder.build();

        // Exact pattern beats the earlier substring match
        assert_eq!(registry.resolve("widget-store").unwrap().domain, "d2");
        // Exact canonical identifier
        assert_eq!(registry.resolve("d1").unwrap().domain, "d1");
        // Case-insensitive exact pattern
        assert_eq!(registry.resolve("GADGET").unwrap().domain, "d2");
        // Substring falls to the first registered pattern
        assert_eq!(registry.resolve("my-widget-store-v2").unwrap().domain, "d1");
        assert!(registry.resolve("retail").is_none());
        assert!(!registry.is_registered("retail"));
    }

    #[test]
    fn test_substring_order_is_registration_order() {
        let mut builder = DomainRegistry::builder();
        builder
            .register(config("first", &["ride"]))
            .register(config("second", &["ride-hailing"]));
        let registry = builder.build();

        for _ in 0..10 {
            assert_eq!(registry.resolve("beckn:ride-hailing:2.0").unwrap().domain, "first");
        }
    }

    #[test]
    fn test_reregistering_replaces_entry() {
        let mut builder = DomainRegistry::builder();
        builder.register(config("d1", &["widget"]));
        builder.register(config("d1", &["gizmo"]).with_message_structure(MessageStructure::Custom));
        let registry = builder.build();

        assert_eq!(registry.len(), 1);
        let resolved = registry.resolve("gizmo").unwrap();
        assert_eq!(resolved.message_structure, MessageStructure::Custom);
        assert!(registry.resolve("widget").is_none());
    }

    #[test]
    fn test_canonical_id_is_case_sensitive_but_patterns_are_not() {
        let mut builder = DomainRegistry::builder();
        builder.register(config("Beckn:EV", &["EV-CHARGING"]));
        let registry = builder.build();

        assert!(registry.resolve("Beckn:EV").is_some());
        assert!(registry.resolve("beckn:ev").is_none());
        assert!(registry.resolve("ev-charging").is_some());
        assert_eq!(registry.domains(), &["Beckn:EV".to_string()]);
    }
}
