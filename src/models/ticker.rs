// ============================================================================
// Structure : Ticker
// ============================================================================
// Cotation instantanée d'une paire sur un exchange
// (réponse de GET /api/ticker/{exchange}/{symbol})
//
// CONCEPTS RUST :
// 1. Option<f64> : le backend peut omettre bid/ask/high/low/volume
// 2. #[serde(default)] : un champ absent devient None au lieu d'une erreur
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Paramètres d'une requête ticker (exchange + paire)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TickerQuery {
    /// Identifiant de l'exchange (ex: "binance")
    pub exchange: String,

    /// Paire (ex: "BTC/USDT")
    pub symbol: String,
}

impl TickerQuery {
    pub fn new(exchange: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            exchange: exchange.into(),
            symbol: symbol.into(),
        }
    }
}

/// Ticker : cotation d'une paire sur un exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    /// Identifiant de l'exchange (ex: "binance")
    pub exchange: String,

    /// Paire (ex: "BTC/USDT")
    pub symbol: String,

    /// Dernier prix échangé
    pub last: f64,

    /// Meilleur prix acheteur
    #[serde(default)]
    pub bid: Option<f64>,

    /// Meilleur prix vendeur
    #[serde(default)]
    pub ask: Option<f64>,

    /// Plus haut sur 24h
    #[serde(default)]
    pub high: Option<f64>,

    /// Plus bas sur 24h
    #[serde(default)]
    pub low: Option<f64>,

    /// Volume sur 24h
    #[serde(default)]
    pub volume: Option<f64>,

    /// Instant de la cotation
    #[serde(with = "crate::models::timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl Ticker {
    /// Écart entre le meilleur vendeur et le meilleur acheteur
    ///
    /// CONCEPT RUST : Option chaining avec ?
    /// - Retourne None dès qu'un des deux côtés manque
    pub fn spread(&self) -> Option<f64> {
        Some(self.ask? - self.bid?)
    }

    /// Position du dernier prix dans la fourchette 24h, en pourcentage
    ///
    /// 0% = au plus bas, 100% = au plus haut
    pub fn range_position_percent(&self) -> Option<f64> {
        let (high, low) = (self.high?, self.low?);
        if high <= low {
            return None;
        }
        Some(((self.last - low) / (high - low)) * 100.0)
    }

    /// Formatte un prix optionnel pour l'affichage
    pub fn format_price(value: Option<f64>) -> String {
        match value {
            Some(price) => format!("${:.2}", price),
            None => "N/A".to_string(),
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
