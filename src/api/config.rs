//! Configuration du client API (URL du backend, délais par endpoint).

use std::time::Duration;

/// URL du backend par défaut (serveur de développement local)
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Délai maximum accordé à chaque endpoint
///
/// Les endpoints légers (health, listes) répondent vite ; l'historique
/// peut demander jusqu'à 1000 chandelles à l'exchange, on lui laisse 10s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeouts {
    pub health: Duration,
    pub exchanges: Duration,
    pub ticker: Duration,
    pub markets: Duration,
    pub historical: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            health: Duration::from_secs(3),
            exchanges: Duration::from_secs(5),
            ticker: Duration::from_secs(5),
            markets: Duration::from_secs(5),
            historical: Duration::from_secs(10),
        }
    }
}

impl Timeouts {
    /// Même délai pour tous les endpoints
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            health: timeout,
            exchanges: timeout,
            ticker: timeout,
            markets: timeout,
            historical: timeout,
        }
    }
}

/// Configuration du DataClient
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// URL de base du backend (ex: http://localhost:8000)
    pub base_url: String,

    /// User-Agent envoyé avec chaque requête
    pub user_agent: String,

    /// Délais par endpoint
    pub timeouts: Timeouts,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: format!("cryptodash/{}", env!("CARGO_PKG_VERSION")),
            timeouts: Timeouts::default(),
        }
    }
}

impl ClientConfig {
    /// Configuration par défaut pointant sur un autre backend
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let timeouts = Timeouts::default();
        assert_eq!(timeouts.health, Duration::from_secs(3));
        assert_eq!(timeouts.historical, Duration::from_secs(10));
        assert_eq!(timeouts.markets, Duration::from_secs(5));
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new("http://api.example.com")
            .with_timeouts(Timeouts::uniform(Duration::from_millis(250)));

        assert_eq!(config.base_url, "http://api.example.com");
        assert_eq!(config.timeouts.ticker, Duration::from_millis(250));
        assert!(config.user_agent.starts_with("cryptodash/"));
    }
}
