//! Erreurs du client API.
//!
//! Seul `InvalidInput` remonte jusqu'aux vues : les autres variantes sont
//! absorbées par le client et remplacées par les données de démonstration.

use std::time::Duration;

use thiserror::Error;

use crate::models::UnknownTimeframe;

/// Erreurs pouvant survenir lors d'un appel au backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Connexion impossible (DNS, refus, reset...)
    #[error("backend unreachable: {0}")]
    NetworkUnreachable(String),

    /// Pas de réponse complète dans le délai imparti
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Réponse avec un statut non 2xx
    #[error("backend returned HTTP {0}")]
    HttpError(u16),

    /// Corps de réponse illisible
    #[error("invalid response body: {0}")]
    Decode(String),

    /// Paramètres rejetés avant tout appel réseau
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration du client invalide (URL de base, client HTTP)
    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Classe une erreur reqwest dans la taxonomie du client
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(timeout)
        } else if let Some(status) = err.status() {
            ClientError::HttpError(status.as_u16())
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::NetworkUnreachable(err.to_string())
        }
    }
}

/// Une granularité inconnue est une entrée invalide
impl From<UnknownTimeframe> for ClientError {
    fn from(err: UnknownTimeframe) -> Self {
        ClientError::InvalidInput(err.to_string())
    }
}

/// Result type alias pour les opérations du client
pub type ClientResult<T> = Result<T, ClientError>;
