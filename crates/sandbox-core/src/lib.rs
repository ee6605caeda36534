//!
//! Sandbox Core - context propagation and dispatch engine
//!
//! This crate defines the protocol model, the domain registry, the action
//! dependency table, the context store and generator contracts, and the
//! orchestrator that ties them together for every inbound action.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Domain layer - protocol model, registry and contracts
pub mod domain;

/// Application services - request orchestration
pub mod application;

/// Error types
pub mod error;

// Re-export key types
pub use application::flow_orchestrator::{ActionOutcome, FlowOrchestrator, FlowSettings, DEFAULT_DOMAIN};
pub use domain::collaborators::{AdapterForwarder, DiscoveryClient};
pub use domain::context_record::ContextRecord;
pub use domain::context_store::{
    context_key, transaction_keys, ContextStore, DEFAULT_KEY_PREFIX, DEFAULT_TTL_SECONDS,
};
pub use domain::dependencies::{DependencyOverride, DependencyTable};
pub use domain::domain_config::{DomainConfig, MessageStructure};
pub use domain::envelope::{
    to_response_action, InboundRequest, ProtocolContext, ProtocolResponse, ResponseAction,
};
pub use domain::generator::{GeneratorError, GeneratorInput, GeneratorTable, ResponseGenerator};
pub use domain::registry::{DomainRegistry, DomainRegistryBuilder};
pub use error::CoreError;
