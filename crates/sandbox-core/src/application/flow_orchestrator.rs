//! Flow orchestrator
//!
//! Handles one inbound action per call: resolve domain, resolve dependency,
//! load prior context, invoke the domain generator, persist the new record
//! and return the response. Transaction state is whatever records exist in
//! the context store; there is no separate state machine.

use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::domain::collaborators::{AdapterForwarder, DiscoveryClient};
use crate::domain::context_record::ContextRecord;
use crate::domain::context_store::ContextStore;
use crate::domain::dependencies::DependencyTable;
use crate::domain::envelope::{
    to_response_action, InboundRequest, ProtocolContext, ProtocolResponse, ResponseAction,
};
use crate::domain::generator::GeneratorInput;
use crate::domain::registry::DomainRegistry;
use crate::error::CoreError;

/// Domain used when a request names none
pub const DEFAULT_DOMAIN: &str = "beckn.one:energy:ev-charging";

/// Orchestrator settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSettings {
    /// Domain used when the inbound envelope has none
    pub default_domain: String,
    /// Forward every generated action response to the adapter
    pub forward_action_responses: bool,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            default_domain: DEFAULT_DOMAIN.to_string(),
            forward_action_responses: false,
        }
    }
}

/// Result of handling an action
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// Body produced by the domain generator and persisted
    Generated(ProtocolResponse),
    /// Envelope-only response; nothing persisted
    Fallback {
        /// Fallback response
        response: ProtocolResponse,
        /// Why the generator path was not taken
        reason: CoreError,
    },
}

impl ActionOutcome {
    /// The response to return to the caller
    pub fn response(&self) -> &ProtocolResponse {
        match self {
            ActionOutcome::Generated(response) => response,
            ActionOutcome::Fallback { response, .. } => response,
        }
    }

    /// Consume into the response
    pub fn into_response(self) -> ProtocolResponse {
        match self {
            ActionOutcome::Generated(response) => response,
            ActionOutcome::Fallback { response, .. } => response,
        }
    }

    /// Whether the fallback path was taken
    pub fn is_fallback(&self) -> bool {
        matches!(self, ActionOutcome::Fallback { .. })
    }
}

/// Ties registry, dependency table, context store and generators together
#[derive(Clone)]
pub struct FlowOrchestrator {
    registry: Arc<DomainRegistry>,
    dependencies: DependencyTable,
    store: Arc<dyn ContextStore>,
    discovery: Arc<dyn DiscoveryClient>,
    forwarder: Option<Arc<dyn AdapterForwarder>>,
    settings: FlowSettings,
}

impl std::fmt::Debug for FlowOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowOrchestrator")
            .field("domains", &self.registry.domains())
            .field("forwarding", &self.forwarder.is_some())
            .field("settings", &self.settings)
            .finish()
    }
}

impl FlowOrchestrator {
    /// Create an orchestrator with the standard dependency table, default
    /// settings and no adapter forwarding
    pub fn new(
        registry: Arc<DomainRegistry>,
        store: Arc<dyn ContextStore>,
        discovery: Arc<dyn DiscoveryClient>,
    ) -> Self {
        Self {
            registry,
            dependencies: DependencyTable::standard(),
            store,
            discovery,
            forwarder: None,
            settings: FlowSettings::default(),
        }
    }

    /// Replace the dependency table
    pub fn with_dependencies(mut self, dependencies: DependencyTable) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Enable best-effort forwarding to a downstream adapter
    pub fn with_forwarder(mut self, forwarder: Arc<dyn AdapterForwarder>) -> Self {
        self.forwarder = Some(forwarder);
        self
    }

    /// Replace the settings
    pub fn with_settings(mut self, settings: FlowSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Domain registry
    pub fn registry(&self) -> &DomainRegistry {
        &self.registry
    }

    /// Context store
    pub fn store(&self) -> &Arc<dyn ContextStore> {
        &self.store
    }

    /// Discovery client
    pub fn discovery(&self) -> &Arc<dyn DiscoveryClient> {
        &self.discovery
    }

    /// Handle one inbound action.
    ///
    /// Errors are `MalformedRequest` (nothing done) and `GeneratorFailure`
    /// (nothing persisted). Unknown domains and actions without a generator
    /// produce [`ActionOutcome::Fallback`]. Context store failures are logged
    /// and never surface here.
    pub async fn handle_action(&self, request: InboundRequest) -> Result<ActionOutcome, CoreError> {
        let context = request
            .context
            .as_ref()
            .ok_or_else(|| CoreError::MalformedRequest("Missing context".to_string()))?;
        let transaction_id = context
            .transaction_id()
            .ok_or_else(|| CoreError::MalformedRequest("Missing transaction_id".to_string()))?
            .to_string();
        let action_name = context
            .action
            .as_deref()
            .filter(|action| !action.is_empty())
            .map(to_response_action)
            .ok_or_else(|| CoreError::MalformedRequest("Missing action".to_string()))?;
        let domain = context
            .domain
            .clone()
            .filter(|domain| !domain.is_empty())
            .unwrap_or_else(|| self.settings.default_domain.clone());

        info!(
            transaction_id = %transaction_id,
            action = %action_name,
            domain = %domain,
            bpp_uri = context.bpp_uri.as_deref().unwrap_or_default(),
            "Webhook action received"
        );

        let config = match self.registry.resolve(&domain) {
            Some(config) => config,
            None => {
                warn!(
                    domain = %domain,
                    registered = ?self.registry.domains(),
                    "Domain not registered, using fallback payload"
                );
                let reason = CoreError::UnresolvedDomain(domain.clone());
                return Ok(Self::fallback(context, &action_name, &domain, reason));
            }
        };

        let action = match action_name.parse::<ResponseAction>() {
            Ok(action) if config.generators.supports(action) => action,
            _ => {
                warn!(
                    domain = %config.domain,
                    action = %action_name,
                    "No generator for action, using fallback payload"
                );
                let reason = CoreError::MissingGenerator {
                    domain: config.domain.clone(),
                    action: action_name.clone(),
                };
                return Ok(Self::fallback(context, &action_name, &domain, reason));
            }
        };

        let prior = match self.dependencies.required_prior_action(action, &domain) {
            Some(prior_action) => self.load_prior(&transaction_id, prior_action).await,
            None => None,
        };

        let input = GeneratorInput {
            message: &request.message,
            context,
            prior: prior.as_ref(),
        };
        let body = config.generators.generate(action, &input).map_err(|e| {
            error!(
                transaction_id = %transaction_id,
                action = %action,
                domain = %domain,
                error = %e,
                "Response generator failed"
            );
            CoreError::GeneratorFailure {
                action: action.to_string(),
                reason: e.to_string(),
            }
        })?;

        let response = ProtocolResponse {
            context: context.reply(action.as_str(), Some(domain.as_str())),
            message: config.message_structure.shape(action, body),
        };
        let response_value = response.to_value();

        let record = ContextRecord::new(
            domain.as_str(),
            action.as_str(),
            response_value.clone(),
            request.to_value(),
        );
        self.persist(&transaction_id, action, &record).await;

        if self.settings.forward_action_responses {
            self.spawn_forward_response(action, response_value);
        }

        info!(
            transaction_id = %transaction_id,
            action = %action,
            domain = %domain,
            "Action handled successfully"
        );
        Ok(ActionOutcome::Generated(response))
    }

    /// Bootstrap the chain: forward `payload` to the discovery service,
    /// store its answer as `on_discover` and return it.
    ///
    /// Fails with `UpstreamDiscoveryFailure`; nothing is stored or forwarded
    /// in that case.
    pub async fn discover(&self, payload: Value) -> Result<Value, CoreError> {
        let context = payload.get("context");
        let transaction_id = context
            .and_then(|c| c.get("transaction_id"))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        let domain = context
            .and_then(|c| c.get("domain"))
            .and_then(Value::as_str)
            .filter(|domain| !domain.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.settings.default_domain.clone());

        info!(
            transaction_id = transaction_id.as_deref().unwrap_or_default(),
            domain = %domain,
            "Received discover request"
        );

        let response = self.discovery.discover(&payload).await.map_err(|e| {
            error!(
                transaction_id = transaction_id.as_deref().unwrap_or_default(),
                error = %e,
                "Discovery call failed"
            );
            match e {
                CoreError::UpstreamDiscoveryFailure(_) => e,
                other => CoreError::UpstreamDiscoveryFailure(other.to_string()),
            }
        })?;

        match &transaction_id {
            Some(transaction_id) => {
                let record = ContextRecord::new(
                    domain,
                    ResponseAction::OnDiscover.as_str(),
                    response.clone(),
                    payload,
                );
                self.persist(transaction_id, ResponseAction::OnDiscover, &record).await;
            }
            None => debug!("Discover request has no transaction_id, on_discover not stored"),
        }

        if let Some(forwarder) = &self.forwarder {
            let forwarder = forwarder.clone();
            let body = response.clone();
            tokio::spawn(async move {
                if let Err(e) = forwarder.forward_discovery(&body).await {
                    warn!(error = %e, "Failed to forward discover response to adapter");
                }
            });
        }

        Ok(response)
    }

    /// Read a prior record, treating every store failure as "no context"
    async fn load_prior(&self, transaction_id: &str, prior: ResponseAction) -> Option<ContextRecord> {
        match self.store.get(transaction_id, prior.as_str()).await {
            Ok(Some(record)) => {
                debug!(transaction_id = %transaction_id, prior = %prior, "Loaded prior context");
                Some(record)
            }
            Ok(None) => {
                debug!(transaction_id = %transaction_id, prior = %prior, "No prior context stored");
                None
            }
            Err(e) => {
                warn!(
                    transaction_id = %transaction_id,
                    prior = %prior,
                    error = %e,
                    "Context store read failed, continuing without prior context"
                );
                None
            }
        }
    }

    /// Write a record, logging instead of failing
    async fn persist(&self, transaction_id: &str, action: ResponseAction, record: &ContextRecord) {
        match self.store.put(transaction_id, action.as_str(), record).await {
            Ok(()) => debug!(transaction_id = %transaction_id, action = %action, "Context stored"),
            Err(e) => warn!(
                transaction_id = %transaction_id,
                action = %action,
                error = %e,
                "Context store write failed, context not persisted"
            ),
        }
    }

    fn spawn_forward_response(&self, action: ResponseAction, body: Value) {
        let Some(forwarder) = self.forwarder.clone() else {
            warn!(action = %action, "Adapter forwarding enabled but no adapter configured");
            return;
        };
        tokio::spawn(async move {
            if let Err(e) = forwarder.forward_response(action, &body).await {
                warn!(action = %action, error = %e, "Failed to forward response to adapter");
            }
        });
    }

    /// Envelope-only response used when no generator can run
    fn fallback(context: &ProtocolContext, action: &str, domain: &str, reason: CoreError) -> ActionOutcome {
        warn!(
            action = %action,
            transaction_id = context.transaction_id().unwrap_or_default(),
            reason = %reason,
            "Using fallback payload generation"
        );
        let mut reply = context.reply(action, Some(domain));
        reply.message_id = Some(format!("msg-{}-{}", action, Utc::now().timestamp_millis()));
        ActionOutcome::Fallback {
            response: ProtocolResponse {
                context: reply,
                message: json!({ "order": {} }),
            },
            reason,
        }
    }
}
