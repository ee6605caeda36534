//! Domain layer: protocol model, registry, dependency table and contracts

/// Protocol envelope, requests, responses and action names
pub mod envelope;

/// Transaction context records
pub mod context_record;

/// Context store contract and key layout
pub mod context_store;

/// Response generator contract
pub mod generator;

/// Domain configuration and message structure policy
pub mod domain_config;

/// Domain registry
pub mod registry;

/// Action dependency table
pub mod dependencies;

/// Discovery service and adapter contracts
pub mod collaborators;
