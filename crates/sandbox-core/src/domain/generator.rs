//! Response generator contract
//!
//! A generator is the domain-supplied function that builds the message body
//! for one response action. The orchestrator only calls it and wraps its
//! output; it never looks inside.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::domain::context_record::ContextRecord;
use crate::domain::envelope::{ProtocolContext, ResponseAction};

/// Arguments every generator receives
#[derive(Debug, Clone, Copy)]
pub struct GeneratorInput<'a> {
    /// Inbound `message` body
    pub message: &'a Value,
    /// Inbound envelope
    pub context: &'a ProtocolContext,
    /// Record of the prior action this one depends on, if one was found
    pub prior: Option<&'a ContextRecord>,
}

impl<'a> GeneratorInput<'a> {
    /// Inbound `message.order`, if present
    pub fn order(&self) -> Option<&'a Value> {
        self.message.get("order")
    }

    /// Order carried by the prior record, if present
    pub fn prior_order(&self) -> Option<&'a Value> {
        self.prior.and_then(ContextRecord::order)
    }
}

/// Error raised by a generator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    /// Generator has no behaviour for the action
    #[error("Unsupported action: {0}")]
    Unsupported(ResponseAction),

    /// Inbound payload cannot be used
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Any other failure
    #[error("{0}")]
    Failed(String),
}

/// Per-domain set of response generators
pub trait ResponseGenerator: Send + Sync {
    /// Whether a generator exists for `action`
    fn supports(&self, action: ResponseAction) -> bool;

    /// Build the message body for `action`
    fn generate(&self, action: ResponseAction, input: &GeneratorInput<'_>) -> Result<Value, GeneratorError>;
}

type GeneratorFn = dyn Fn(&GeneratorInput<'_>) -> Result<Value, GeneratorError> + Send + Sync;

/// Generator assembled from one closure per action
#[derive(Default)]
pub struct GeneratorTable {
    entries: HashMap<ResponseAction, Box<GeneratorFn>>,
}

impl GeneratorTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the generator for `action`, replacing any previous one
    pub fn with<F>(mut self, action: ResponseAction, generator: F) -> Self
    where
        F: Fn(&GeneratorInput<'_>) -> Result<Value, GeneratorError> + Send + Sync + 'static,
    {
        self.entries.insert(action, Box::new(generator));
        self
    }
}

impl fmt::Debug for GeneratorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut actions: Vec<_> = self.entries.keys().map(ResponseAction::as_str).collect();
        actions.sort_unstable();
        f.debug_struct("GeneratorTable").field("actions", &actions).finish()
    }
}

impl ResponseGenerator for GeneratorTable {
    fn supports(&self, action: ResponseAction) -> bool {
        self.entries.contains_key(&action)
    }

    fn generate(&self, action: ResponseAction, input: &GeneratorInput<'_>) -> Result<Value, GeneratorError> {
        match self.entries.get(&action) {
            Some(generator) => generator(input),
            None => Err(GeneratorError::Unsupported(action)),
        }
    }
}
