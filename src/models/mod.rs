// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données échangées avec le
// backend REST, et le mode (live / démo) du client
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : déclare un sous-module public (accessible depuis l'extérieur)
// - Sans "pub", le module serait privé au crate
// ============================================================================

pub mod candle;    // Chandelles OHLCV et granularités
pub mod exchange;  // Exchanges, marchés, statistiques
pub mod mode;      // ClientMode (Live / Mock)
pub mod ticker;    // Cotation instantanée
pub mod timestamp; // Helper serde pour les dates du backend

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use cryptodash::models::ticker::Ticker;
// On peut faire : use cryptodash::models::Ticker;
pub use candle::{
    clamp_limit, Candle, HistoricalData, HistoricalRequest, Timeframe, UnknownTimeframe,
    DEFAULT_LIMIT, MAX_LIMIT, MIN_LIMIT,
};
pub use exchange::{ExchangeInfo, ExchangeList, MarketList, MarketStats};
pub use mode::ClientMode;
pub use ticker::{Ticker, TickerQuery};
