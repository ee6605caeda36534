//! Action dependency table
//!
//! Declares, for each response action, which earlier action's stored record
//! it needs as input.

use crate::domain::envelope::ResponseAction;

/// Override applying to domains whose identifier contains a marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyOverride {
    /// Lower-cased substring matched against the requested domain
    pub domain_marker: String,
    /// Action the override applies to
    pub action: ResponseAction,
    /// Replacement prior action; `None` removes the edge
    pub prior: Option<ResponseAction>,
}

/// Static `(action) -> prior action` table with per-domain overrides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyTable {
    base: Vec<(ResponseAction, ResponseAction)>,
    overrides: Vec<DependencyOverride>,
}

impl Default for DependencyTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl DependencyTable {
    /// Base chain shared by all domains, with no overrides
    pub fn base() -> Self {
        use ResponseAction::*;
        Self {
            base: vec![
                (OnSelect, OnDiscover),
                (OnInit, OnSelect),
                (OnConfirm, OnInit),
                (OnStatus, OnConfirm),
                (OnCancel, OnConfirm),
                (OnUpdate, OnConfirm),
                (OnRating, OnConfirm),
                (OnSupport, OnConfirm),
                (OnTrack, OnConfirm),
            ],
            overrides: Vec::new(),
        }
    }

    /// Base chain plus the built-in overrides.
    ///
    /// Demand-flexibility flows skip select and init: confirm reads the
    /// discovery result directly.
    pub fn standard() -> Self {
        Self::base()
            .with_override("demand-flexibility", ResponseAction::OnConfirm, Some(ResponseAction::OnDiscover))
            .with_override("demand-flexibility", ResponseAction::OnStatus, Some(ResponseAction::OnConfirm))
    }

    /// Add a domain-specific override
    pub fn with_override(
        mut self,
        domain_marker: impl Into<String>,
        action: ResponseAction,
        prior: Option<ResponseAction>,
    ) -> Self {
        self.overrides.push(DependencyOverride {
            domain_marker: domain_marker.into().to_lowercase(),
            action,
            prior,
        });
        self
    }

    /// Prior action whose record `action` needs, if any.
    ///
    /// Overrides are checked before the base table.
    pub fn required_prior_action(&self, action: ResponseAction, domain: &str) -> Option<ResponseAction> {
        let lowered = domain.to_lowercase();
        if let Some(found) = self
            .overrides
            .iter()
            .find(|o| o.action == action && lowered.contains(&o.domain_marker))
        {
            return found.prior;
        }

        self.base
            .iter()
            .find(|(current, _)| *current == action)
            .map(|(_, prior)| *prior)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ResponseAction::*;

    #[test]
    fn test_base_chain() {
        let table = DependencyTable::standard();
        let domain = "beckn.one:energy:ev-charging";

        assert_eq!(table.required_prior_action(OnSelect, domain), Some(OnDiscover));
        assert_eq!(table.required_prior_action(OnInit, domain), Some(OnSelect));
        assert_eq!(table.required_prior_action(OnConfirm, domain), Some(OnInit));
        for action in [OnStatus, OnCancel, OnUpdate, OnRating, OnSupport, OnTrack] {
            assert_eq!(table.required_prior_action(action, domain), Some(OnConfirm), "{}", action);
        }
        assert_eq!(table.required_prior_action(OnDiscover, domain), None);
    }

    #[test]
    fn test_demand_flexibility_override() {
        let table = DependencyTable::standard();
        let domain = "beckn.one:deg:demand-flexibility:1.0";

        assert_eq!(table.required_prior_action(OnConfirm, domain), Some(OnDiscover));
        assert_eq!(table.required_prior_action(OnStatus, domain), Some(OnConfirm));
        // Edges without an override fall back to the base table
        assert_eq!(table.required_prior_action(OnCancel, domain), Some(OnConfirm));
    }

    #[test]
    fn test_override_can_remove_edge() {
        let table = DependencyTable::base().with_override("Kiosk", OnSelect, None);
        assert_eq!(table.required_prior_action(OnSelect, "retail:kiosk"), None);
        assert_eq!(table.required_prior_action(OnSelect, "retail:web"), Some(OnDiscover));
    }
}
