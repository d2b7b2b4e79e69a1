//! Lock-free issuer configuration lookup.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

use super::config::IssuerConfig;
use crate::error::TokenValidationError;

/// Default number of distinct issuer identifiers warmed into the fast view.
pub const DEFAULT_WARM_CAPACITY: usize = 64;

/// Read-mostly resolver from an `iss` claim to its [`IssuerConfig`].
///
/// The registered configurations live in an immutable map keyed by the
/// normalized issuer. On top of that, the first N distinct identifier
/// strings seen at runtime are warmed into a copy-on-write view keyed by
/// the exact string, so steady-state lookups are a single hash probe with
/// no normalization and no lock. The warm view is bounded; identifiers
/// beyond the capacity simply stay on the normalizing path.
pub struct IssuerConfigResolver {
    base: HashMap<String, Arc<IssuerConfig>>,
    warm: ArcSwap<HashMap<String, Arc<IssuerConfig>>>,
    warm_capacity: usize,
}

impl IssuerConfigResolver {
    #[must_use]
    pub fn new(configs: impl IntoIterator<Item = IssuerConfig>) -> Self {
        let base = configs
            .into_iter()
            .map(|config| {
                let key = normalize(config.issuer()).to_string();
                (key, Arc::new(config))
            })
            .collect();
        Self {
            base,
            warm: ArcSwap::from_pointee(HashMap::new()),
            warm_capacity: DEFAULT_WARM_CAPACITY,
        }
    }

    /// Sets the warm-view capacity. Zero disables warming.
    #[must_use]
    pub fn with_warm_capacity(mut self, capacity: usize) -> Self {
        self.warm_capacity = capacity;
        self
    }

    /// Number of registered issuers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.base.len()
    }

    /// Returns `true` when no issuers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    /// Resolves an `iss` claim value to its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TokenValidationError::UnknownIssuer`] for unregistered
    /// issuers.
    pub fn resolve(&self, issuer: &str) -> Result<Arc<IssuerConfig>, TokenValidationError> {
        if let Some(config) = self.warm.load().get(issuer) {
            return Ok(Arc::clone(config));
        }

        let Some(config) = self.base.get(normalize(issuer)) else {
            return Err(TokenValidationError::UnknownIssuer(issuer.to_string()));
        };

        self.warm_insert(issuer, config);
        Ok(Arc::clone(config))
    }

    /// Promotes an identifier into the warm view. Bounded copy-on-write:
    /// the map is cloned at most `warm_capacity` times over the process
    /// lifetime, after which this is a no-op.
    fn warm_insert(&self, issuer: &str, config: &Arc<IssuerConfig>) {
        if self.warm_capacity == 0 {
            return;
        }
        self.warm.rcu(|warm| {
            if warm.len() >= self.warm_capacity || warm.contains_key(issuer) {
                Arc::clone(warm)
            } else {
                let mut next = HashMap::clone(warm);
                next.insert(issuer.to_string(), Arc::clone(config));
                Arc::new(next)
            }
        });
    }
}

fn normalize(issuer: &str) -> &str {
    issuer.trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issuer::config::IssuerConfigBuilder;
    use crate::security::SecurityEventCounter;
    use url::Url;

    fn config(issuer: &str) -> IssuerConfig {
        IssuerConfigBuilder::new(issuer)
            .with_jwks_url(Url::parse(&format!("{issuer}/keys")).unwrap())
            .build(Arc::new(SecurityEventCounter::new()))
            .unwrap()
    }

    fn resolver(issuers: &[&str]) -> IssuerConfigResolver {
        IssuerConfigResolver::new(issuers.iter().map(|issuer| config(issuer)))
    }

    #[test]
    fn test_resolves_registered_issuer() {
        let resolver = resolver(&["https://a.example.com", "https://b.example.com"]);
        assert_eq!(resolver.len(), 2);

        let config = resolver.resolve("https://a.example.com").unwrap();
        assert_eq!(config.issuer(), "https://a.example.com");
    }

    #[test]
    fn test_unknown_issuer_is_an_error() {
        let resolver = resolver(&["https://a.example.com"]);
        assert!(matches!(
            resolver.resolve("https://rogue.example.com"),
            Err(TokenValidationError::UnknownIssuer(_))
        ));
    }

    #[test]
    fn test_trailing_slash_variants_resolve() {
        let bare = resolver(&["https://a.example.com"]);
        assert!(bare.resolve("https://a.example.com/").is_ok());

        let slashed = resolver(&["https://b.example.com/"]);
        assert!(slashed.resolve("https://b.example.com").is_ok());
    }

    #[test]
    fn test_repeated_lookups_hit_the_warm_view() {
        let resolver = resolver(&["https://a.example.com"]);
        assert!(resolver.warm.load().is_empty());

        resolver.resolve("https://a.example.com/").unwrap();
        assert!(resolver.warm.load().contains_key("https://a.example.com/"));

        // The exact string is warmed, including the slash variant.
        resolver.resolve("https://a.example.com/").unwrap();
        assert_eq!(resolver.warm.load().len(), 1);
    }

    #[test]
    fn test_warm_view_is_bounded() {
        let resolver = resolver(&["https://a.example.com"]).with_warm_capacity(2);

        resolver.resolve("https://a.example.com").unwrap();
        resolver.resolve("https://a.example.com/").unwrap();
        resolver.resolve("https://a.example.com//").unwrap();

        assert_eq!(resolver.warm.load().len(), 2);
        // Beyond capacity everything still resolves via the base map.
        assert!(resolver.resolve("https://a.example.com//").is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_resolution_is_race_free() {
        let issuers: Vec<String> = (0..10)
            .map(|i| format!("https://idp-{i}.example.com"))
            .collect();
        let resolver = Arc::new(IssuerConfigResolver::new(
            issuers.iter().map(|issuer| config(issuer)),
        ));

        let mut tasks = Vec::new();
        for task in 0..100 {
            let resolver = Arc::clone(&resolver);
            let issuers = issuers.clone();
            tasks.push(tokio::spawn(async move {
                for round in 0..50 {
                    let issuer = &issuers[(task + round) % issuers.len()];
                    let config = resolver.resolve(issuer).unwrap();
                    assert_eq!(config.issuer(), *issuer);
                    assert!(resolver.resolve("https://rogue.example.com").is_err());
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
    }
}
