// ============================================================================
// Module : api
// ============================================================================
// Ce module contient le client du backend REST (exchanges, tickers,
// historique, marchés) et son repli sur des données de démonstration
// quand le backend est injoignable.
// ============================================================================

pub mod client; // DataClient : appels HTTP + repli
pub mod config; // URL de base et délais par endpoint
pub mod error;  // Taxonomie des erreurs du client
pub mod mock;   // Données de démonstration

#[cfg(test)]
pub(crate) mod stub_server; // Serveur HTTP local pour les tests

// Re-export des types principaux
pub use client::DataClient;
pub use config::{ClientConfig, Timeouts, DEFAULT_BASE_URL};
pub use error::{ClientError, ClientResult};
