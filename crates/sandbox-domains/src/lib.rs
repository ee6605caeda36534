//!
//! Sandbox Domains - built-in response generators
//!
//! Each module implements one industry's simulated seller: EV charging,
//! aviation, ride hailing and hospitality. Generators are pure functions of
//! the inbound message and the prior context record.
//!

#![forbid(unsafe_code)]

use sandbox_core::{DomainConfig, DomainRegistryBuilder};

pub mod order;

pub mod aviation;
pub mod ev_charging;
pub mod hospitality;
pub mod ride_hailing;

/// Configurations of every built-in domain, in registration order
pub fn builtin_domains() -> Vec<DomainConfig> {
    vec![
        ev_charging::config(),
        aviation::config(),
        ride_hailing::config(),
        hospitality::config(),
    ]
}

/// Register every built-in domain on `builder`
pub fn register_builtin_domains(builder: &mut DomainRegistryBuilder) -> &mut DomainRegistryBuilder {
    for config in builtin_domains() {
        builder.register(config);
    }
    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_domains_are_distinct() {
        let domains: Vec<String> = builtin_domains().into_iter().map(|c| c.domain).collect();
        assert_eq!(
            domains,
            vec![ev_charging::DOMAIN, aviation::DOMAIN, ride_hailing::DOMAIN, hospitality::DOMAIN]
        );
    }
}
