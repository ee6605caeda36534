//! Application services

/// Request-handling orchestrator
pub mod flow_orchestrator;
