// ============================================================================
// Module : config (configuration de l'application)
// ============================================================================
// Lue une seule fois au démarrage depuis les variables d'environnement :
// - CRYPTODASH_API_URL             : URL du backend (http://localhost:8000)
// - CRYPTODASH_TICKER_REFRESH_SECS : période d'auto-refresh du ticker (5)
// - CRYPTODASH_LOG_DIR             : répertoire des logs
//
// Le filtre de logs reste piloté par RUST_LOG (voir main.rs).
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::api::{ClientConfig, DEFAULT_BASE_URL};
use crate::refresh::DEFAULT_REFRESH_PERIOD;

pub const ENV_API_URL: &str = "CRYPTODASH_API_URL";
pub const ENV_TICKER_REFRESH_SECS: &str = "CRYPTODASH_TICKER_REFRESH_SECS";
pub const ENV_LOG_DIR: &str = "CRYPTODASH_LOG_DIR";

/// Configuration complète de l'application
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_url: String,
    pub ticker_refresh: Duration,
    pub log_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_BASE_URL.to_string(),
            ticker_refresh: DEFAULT_REFRESH_PERIOD,
            log_dir: default_log_dir(),
        }
    }
}

impl AppConfig {
    /// Lit la configuration depuis l'environnement du processus
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Lit la configuration depuis une source quelconque (testable)
    ///
    /// CONCEPT RUST : Closure en paramètre
    /// - impl Fn(&str) -> Option<String> : n'importe quelle source clé/valeur
    /// - En test on passe une HashMap, en prod std::env::var
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            config.api_url = url.trim().trim_end_matches('/').to_string();
        }

        if let Some(raw) = lookup(ENV_TICKER_REFRESH_SECS) {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number of seconds, got '{}'", ENV_TICKER_REFRESH_SECS, raw))?;
            if secs == 0 {
                bail!("{} must be at least 1 second", ENV_TICKER_REFRESH_SECS);
            }
            config.ticker_refresh = Duration::from_secs(secs);
        }

        if let Some(dir) = lookup(ENV_LOG_DIR).filter(|v| !v.trim().is_empty()) {
            config.log_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    /// Configuration du client API dérivée
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.api_url.clone())
    }
}

/// Répertoire de logs par défaut
///
/// - Linux/WSL : ~/.local/share/cryptodash/logs
/// - macOS : ~/Library/Application Support/cryptodash/logs
/// - Sinon : ./logs
fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("cryptodash").join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}
