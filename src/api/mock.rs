// ============================================================================
// Données de démonstration
// ============================================================================
// Jeu de données en mémoire servi quand le backend est injoignable.
// Chaque fonction renvoie exactement le même type que l'endpoint réel :
// l'UI n'a jamais besoin de savoir d'où viennent les données (sauf pour le
// bandeau "demo mode", qui lit ClientMode).
// ============================================================================

use chrono::Utc;
use rand::Rng;
use serde_json::json;

use crate::models::{
    Candle, ExchangeInfo, ExchangeList, HistoricalData, HistoricalRequest, MarketList, Ticker,
};

/// Cotation de référence (BTC/USDT)
pub const BASE_LAST: f64 = 43250.50;
pub const BASE_BID: f64 = 43248.00;
pub const BASE_ASK: f64 = 43252.00;
pub const BASE_HIGH: f64 = 43800.00;
pub const BASE_LOW: f64 = 42800.00;
pub const BASE_VOLUME: f64 = 1250000.50;

/// Amplitude maximale du bruit appliqué au dernier prix
pub const TICKER_JITTER: f64 = 500.0;

/// Taille de la série historique synthétique
pub const HISTORY_LEN: usize = 100;

/// Prix central de la série historique
const HISTORY_BASE_PRICE: f64 = 43000.0;

/// Amplitude de la sinusoïde
const HISTORY_AMPLITUDE: f64 = 1000.0;

/// Exchanges bien connus, tous activés
pub fn exchanges() -> ExchangeList {
    ExchangeList {
        exchanges: vec![
            ExchangeInfo::new("binance", "Binance", &["Global"]),
            ExchangeInfo::new("coinbase", "Coinbase", &["US", "UK"]),
            ExchangeInfo::new("kraken", "Kraken", &["US", "Global"]),
        ],
    }
}

/// Ticker simulé pour la paire demandée
///
/// CONCEPT : Jitter borné
/// - Le dernier prix bouge de ±TICKER_JITTER à chaque appel
/// - Un rafraîchissement en mode démo "a l'air vivant"
/// - bid/ask suivent le dernier prix, high/low l'encadrent toujours
pub fn ticker(exchange: &str, symbol: &str) -> Ticker {
    let jitter = rand::rng().random_range(-TICKER_JITTER..=TICKER_JITTER);
    let last = BASE_LAST + jitter;

    Ticker {
        exchange: exchange.to_string(),
        symbol: symbol.to_string(),
        last,
        bid: Some(last - (BASE_LAST - BASE_BID)),
        ask: Some(last + (BASE_ASK - BASE_LAST)),
        high: Some(BASE_HIGH.max(last)),
        low: Some(BASE_LOW.min(last)),
        volume: Some(BASE_VOLUME),
        timestamp: Utc::now(),
    }
}

/// Série historique synthétique (sinusoïde déterministe)
///
/// Les HISTORY_LEN points sont espacés d'une chandelle et se terminent
/// maintenant ; seuls les `limit` plus récents sont renvoyés.
pub fn historical(request: &HistoricalRequest) -> HistoricalData {
    let step = request.timeframe.duration();
    let now = Utc::now();

    let mut series = HistoricalData::new(
        request.exchange.clone(),
        request.symbol.clone(),
        request.timeframe,
    );

    for i in 0..HISTORY_LEN {
        let phase = i as f64 / 10.0;
        let close = HISTORY_BASE_PRICE + phase.sin() * HISTORY_AMPLITUDE;
        let volume = 750.0 + (i as f64 / 7.0).cos() * 250.0;
        let timestamp = now - step * (HISTORY_LEN - i) as i32;

        series.add_candle(Candle::new(
            timestamp,
            close - 50.0,
            close + 100.0,
            close - 100.0,
            close,
            volume,
        ));
    }

    series.truncate_to_newest(request.limit as usize);
    debug_assert!(series.len() <= request.limit as usize);
    series
}

/// Quelques paires populaires
pub fn markets(exchange: &str) -> MarketList {
    let markets = ["BTC/USDT", "ETH/USDT", "BNB/USDT", "SOL/USDT", "XRP/USDT"]
        .iter()
        .map(|symbol| {
            let (base, quote) = symbol.split_once('/').unwrap_or((*symbol, ""));
            json!({ "symbol": symbol, "base": base, "quote": quote, "active": true })
        })
        .collect();

    MarketList {
        exchange: exchange.to_string(),
        markets,
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
