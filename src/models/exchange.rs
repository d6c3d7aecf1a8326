// ============================================================================
// Structures : ExchangeInfo, ExchangeList, MarketList, MarketStats
// ============================================================================
// Liste des exchanges supportés (GET /api/exchanges), marchés d'un exchange
// (GET /api/markets/{exchange}) et statistiques agrégées pour le dashboard
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Informations sur un exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeInfo {
    /// Identifiant unique (ex: "binance")
    pub id: String,

    /// Nom affiché (ex: "Binance")
    pub name: String,

    /// Exchange activé côté backend
    pub enabled: bool,

    /// Pays couverts (optionnel)
    #[serde(default)]
    pub countries: Option<Vec<String>>,
}

impl ExchangeInfo {
    pub fn new(id: &str, name: &str, countries: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            enabled: true,
            countries: Some(countries.iter().map(|c| c.to_string()).collect()),
        }
    }

    /// Pays joints par des virgules ("" si inconnus)
    pub fn countries_label(&self) -> String {
        self.countries
            .as_ref()
            .map(|countries| countries.join(", "))
            .unwrap_or_default()
    }
}

/// Réponse de /api/exchanges
///
/// Remplacée en bloc à chaque rafraîchissement, jamais modifiée sur place
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExchangeList {
    pub exchanges: Vec<ExchangeInfo>,
}

impl ExchangeList {
    /// Premier exchange de la liste (sélection par défaut des formulaires)
    pub fn first_id(&self) -> Option<&str> {
        self.exchanges.first().map(|ex| ex.id.as_str())
    }

    /// Cherche un exchange par identifiant
    pub fn find(&self, id: &str) -> Option<&ExchangeInfo> {
        self.exchanges.iter().find(|ex| ex.id == id)
    }

    /// Identifiant suivant dans la liste (cycle), pour le sélecteur
    pub fn next_id(&self, current: &str) -> Option<&str> {
        if self.exchanges.is_empty() {
            return None;
        }
        let next_index = match self.exchanges.iter().position(|ex| ex.id == current) {
            Some(index) => (index + 1) % self.exchanges.len(),
            None => 0,
        };
        Some(self.exchanges[next_index].id.as_str())
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }
}

/// Réponse de /api/markets/{exchange}
///
/// Les marchés sont des objets opaques (format ccxt), seul le nombre compte
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketList {
    #[serde(default)]
    pub exchange: String,

    pub markets: Vec<serde_json::Value>,
}

/// Statistiques agrégées affichées en haut du dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketStats {
    /// Nombre d'exchanges supportés
    pub exchanges: usize,

    /// Nombre de marchés du premier exchange (None si inconnu)
    pub total_markets: Option<usize>,

    /// Instant du calcul
    pub last_update: DateTime<Utc>,
}

impl MarketStats {
    /// Libellé du nombre de marchés ("1000+" quand inconnu)
    pub fn markets_label(&self) -> String {
        match self.total_markets {
            Some(count) if count > 0 => count.to_string(),
            _ => "1000+".to_string(),
        }
    }
}
