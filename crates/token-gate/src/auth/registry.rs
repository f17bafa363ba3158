//! Issuer registry: the ordered, immutable set of configured trust anchors.

use crate::config::{ConfigError, IssuerConfig};

/// Ordered collection of trust anchors, immutable after construction.
///
/// Lookup by exact `issuer` value narrows verification to one candidate;
/// when the token's issuer claim is unreadable or unknown, callers fall back
/// to trying [`all`](Self::all) in registration order.
#[derive(Debug, Clone)]
pub struct IssuerRegistry {
    issuers: Vec<IssuerConfig>,
}

impl IssuerRegistry {
    /// Build a registry.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::DuplicateIssuer` if two descriptors share an
    /// `issuer` value, which would make selection ambiguous.
    pub fn new(issuers: Vec<IssuerConfig>) -> Result<Self, ConfigError> {
        for (i, a) in issuers.iter().enumerate() {
            if issuers
                .iter()
                .skip(i + 1)
                .any(|b| b.issuer == a.issuer)
            {
                return Err(ConfigError::DuplicateIssuer(a.issuer.clone()));
            }
        }
        Ok(Self { issuers })
    }

    /// Look up a descriptor by exact `issuer` value.
    pub fn find(&self, issuer: &str) -> Option<&IssuerConfig> {
        self.issuers.iter().find(|c| c.issuer == issuer)
    }

    /// All descriptors in registration order.
    pub fn all(&self) -> &[IssuerConfig] {
        &self.issuers
    }

    pub fn len(&self) -> usize {
        self.issuers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issuers.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn issuer(name: &str, iss: &str) -> IssuerConfig {
        IssuerConfig {
            name: name.to_string(),
            authority: format!("https://{name}.example/"),
            audience: format!("api://{name}"),
            issuer: iss.to_string(),
            jwks_uri: format!("https://{name}.example/jwks.json"),
        }
    }

    #[test]
    fn test_find_by_issuer_value() {
        let registry = IssuerRegistry::new(vec![
            issuer("first", "https://first.example/"),
            issuer("second", "https://second.example/"),
        ])
        .unwrap();

        let found = registry.find("https://second.example/").unwrap();
        assert_eq!(found.name, "second");
        assert!(registry.find("https://third.example/").is_none());
    }

    #[test]
    fn test_all_preserves_registration_order() {
        let registry = IssuerRegistry::new(vec![
            issuer("first", "https://first.example/"),
            issuer("second", "https://second.example/"),
        ])
        .unwrap();

        let names: Vec<&str> = registry.all().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_duplicate_issuer_rejected() {
        let result = IssuerRegistry::new(vec![
            issuer("first", "https://dup.example/"),
            issuer("second", "https://dup.example/"),
        ]);

        assert!(
            matches!(result, Err(ConfigError::DuplicateIssuer(iss)) if iss == "https://dup.example/")
        );
    }

    #[test]
    fn test_empty_registry_allowed_here() {
        // Non-emptiness is enforced by GateConfig::build, not the registry.
        let registry = IssuerRegistry::new(vec![]).unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }
}
