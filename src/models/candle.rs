// ============================================================================
// Structures : Timeframe, Candle, HistoricalData
// ============================================================================
// Données historiques OHLCV (Open, High, Low, Close, Volume) renvoyées par
// l'endpoint POST /api/historical
//
// CONCEPTS RUST :
// 1. DateTime<Utc> : type de chrono pour dates avec timezone UTC
// 2. f64 : floating point 64 bits pour les prix et le volume
// 3. #[serde(rename)] : les variants d'enum voyagent sous leur label ("1h")
// ============================================================================

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Nombre maximum de chandelles qu'on peut demander au backend
pub const MAX_LIMIT: u32 = 1000;

/// Nombre minimum de chandelles
pub const MIN_LIMIT: u32 = 1;

/// Nombre de chandelles demandé par défaut
pub const DEFAULT_LIMIT: u32 = 100;

/// Largeur d'une chandelle (granularité)
///
/// CONCEPT : Ensemble fermé
/// - Seules ces six valeurs sont acceptées par le backend
/// - Toute autre chaîne est rejetée par FromStr (entrée invalide)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    /// 1 minute
    #[serde(rename = "1m")]
    M1,
    /// 5 minutes
    #[serde(rename = "5m")]
    M5,
    /// 15 minutes
    #[serde(rename = "15m")]
    M15,
    /// 1 heure
    #[serde(rename = "1h")]
    H1,
    /// 4 heures
    #[serde(rename = "4h")]
    H4,
    /// 1 jour
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    /// Label utilisé sur le fil (JSON) et à l'affichage
    ///
    /// CONCEPT RUST : &'static str
    /// - Retourne une string littérale (dans le binaire)
    /// - Pas d'allocation
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }

    /// Libellé long pour le formulaire
    pub fn description(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1 Minute",
            Timeframe::M5 => "5 Minutes",
            Timeframe::M15 => "15 Minutes",
            Timeframe::H1 => "1 Hour",
            Timeframe::H4 => "4 Hours",
            Timeframe::D1 => "1 Day",
        }
    }

    /// Durée couverte par une chandelle
    pub fn duration(&self) -> Duration {
        match self {
            Timeframe::M1 => Duration::minutes(1),
            Timeframe::M5 => Duration::minutes(5),
            Timeframe::M15 => Duration::minutes(15),
            Timeframe::H1 => Duration::hours(1),
            Timeframe::H4 => Duration::hours(4),
            Timeframe::D1 => Duration::days(1),
        }
    }

    /// Retourne toutes les granularités (pour UI de sélection)
    pub fn all() -> Vec<Timeframe> {
        vec![
            Timeframe::M1,
            Timeframe::M5,
            Timeframe::M15,
            Timeframe::H1,
            Timeframe::H4,
            Timeframe::D1,
        ]
    }

    /// Granularité suivante (cycle)
    pub fn next(&self) -> Timeframe {
        match self {
            Timeframe::M1 => Timeframe::M5,
            Timeframe::M5 => Timeframe::M15,
            Timeframe::M15 => Timeframe::H1,
            Timeframe::H1 => Timeframe::H4,
            Timeframe::H4 => Timeframe::D1,
            Timeframe::D1 => Timeframe::M1, // Boucle
        }
    }

    /// Granularité précédente (cycle)
    pub fn previous(&self) -> Timeframe {
        match self {
            Timeframe::M1 => Timeframe::D1, // Boucle
            Timeframe::M5 => Timeframe::M1,
            Timeframe::M15 => Timeframe::M5,
            Timeframe::H1 => Timeframe::M15,
            Timeframe::H4 => Timeframe::H1,
            Timeframe::D1 => Timeframe::H4,
        }
    }
}

impl Default for Timeframe {
    /// 1 heure, comme le formulaire historique
    fn default() -> Self {
        Timeframe::H1
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Erreur de parsing d'une granularité inconnue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTimeframe(pub String);

impl fmt::Display for UnknownTimeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown timeframe '{}' (expected one of 1m, 5m, 15m, 1h, 4h, 1d)",
            self.0
        )
    }
}

impl std::error::Error for UnknownTimeframe {}

impl FromStr for Timeframe {
    type Err = UnknownTimeframe;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timeframe::all()
            .into_iter()
            .find(|tf| tf.label() == s.trim())
            .ok_or_else(|| UnknownTimeframe(s.to_string()))
    }
}

/// Ramène une limite quelconque dans [1, 1000]
///
/// CONCEPT RUST : clamp()
/// - i64 en entrée pour accepter les valeurs négatives saisies
/// - 0 et négatifs -> 1, au-delà de 1000 -> 1000
pub fn clamp_limit(limit: i64) -> u32 {
    limit.clamp(MIN_LIMIT as i64, MAX_LIMIT as i64) as u32
}

/// Une chandelle OHLCV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Début de la période
    #[serde(with = "crate::models::timestamp")]
    pub timestamp: DateTime<Utc>,

    /// Prix d'ouverture (Open)
    pub open: f64,

    /// Prix le plus haut (High)
    pub high: f64,

    /// Prix le plus bas (Low)
    pub low: f64,

    /// Prix de clôture (Close)
    pub close: f64,

    /// Volume échangé
    pub volume: f64,
}

impl Candle {
    /// Constructeur : crée une nouvelle chandelle
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Corps de la requête POST /api/historical
///
/// CONCEPT : Requête "écriture" pour un filtre complexe
/// - Les paramètres voyagent dans le body JSON, pas dans l'URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRequest {
    pub exchange: String,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub limit: u32,
}

impl HistoricalRequest {
    /// Crée une requête ; la limite est ramenée dans [1, 1000]
    pub fn new(
        exchange: impl Into<String>,
        symbol: impl Into<String>,
        timeframe: Timeframe,
        limit: i64,
    ) -> Self {
        Self {
            exchange: exchange.into(),
            symbol: symbol.into(),
            timeframe,
            limit: clamp_limit(limit),
        }
    }
}

/// Réponse de /api/historical : série de chandelles pour une paire
///
/// CONCEPT RUST : Vec<T>
/// - HistoricalData possède le Vec, le Vec possède les Candle
/// - Tout est libéré automatiquement au drop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalData {
    /// Identifiant de l'exchange (ex: "binance")
    pub exchange: String,

    /// Paire (ex: "BTC/USDT")
    pub symbol: String,

    /// Granularité des chandelles
    pub timeframe: Timeframe,

    /// Chandelles, de la plus ancienne à la plus récente
    pub data: Vec<Candle>,
}

impl HistoricalData {
    /// Crée une série vide
    pub fn new(exchange: String, symbol: String, timeframe: Timeframe) -> Self {
        Self {
            exchange,
            symbol,
            timeframe,
            data: Vec::new(),
        }
    }

    /// Ajoute une chandelle
    pub fn add_candle(&mut self, candle: Candle) {
        self.data.push(candle);
    }

    /// Ne garde que les `limit` chandelles les plus récentes
    pub fn truncate_to_newest(&mut self, limit: usize) {
        if self.data.len() > limit {
            let excess = self.data.len() - limit;
            self.data.drain(..excess);
        }
    }

    /// Retourne le nombre de chandelles
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Vérifie si la série est vide
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Chandelle la plus récente
    pub fn last(&self) -> Option<&Candle> {
        self.data.last()
    }

    /// Prix minimum sur toute la période
    ///
    /// CONCEPT RUST : fold
    /// - f64 n'implémente pas Ord (NaN), on replie avec f64::min
    pub fn min_price(&self) -> Option<f64> {
        if self.data.is_empty() {
            return None;
        }
        Some(self.data.iter().map(|c| c.low).fold(f64::INFINITY, f64::min))
    }

    /// Prix maximum sur toute la période
    pub fn max_price(&self) -> Option<f64> {
        if self.data.is_empty() {
            return None;
        }
        Some(
            self.data
                .iter()
                .map(|c| c.high)
                .fold(f64::NEG_INFINITY, f64::max),
        )
    }

    /// Variation totale en pourcentage (open de la première, close de la dernière)
    pub fn total_change_percent(&self) -> Option<f64> {
        let (first, last) = (self.data.first()?, self.data.last()?);
        if first.open == 0.0 {
            return None;
        }
        Some(((last.close - first.open) / first.open) * 100.0)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
