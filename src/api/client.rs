// ============================================================================
// API Client : DataClient (backend REST + repli sur données de démo)
// ============================================================================
// Chaque opération :
// 1. valide ses paramètres (seule erreur qui remonte à l'appelant)
// 2. appelle le backend avec un délai borné
// 3. en cas d'échec (réseau, statut non 2xx, timeout, JSON illisible),
//    renvoie la donnée de démonstration de même forme au lieu d'échouer
//
// CONCEPTS RUST :
// 1. async/await : les appels réseau ne bloquent pas le thread
// 2. tokio::time::timeout : borne la durée totale (envoi + lecture du corps)
// 3. AtomicBool : le mode Live/Mock est partagé sans verrou
// 4. Arc<DataClient> : une instance par session, injectée dans les vues
// ============================================================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::api::config::ClientConfig;
use crate::api::error::{ClientError, ClientResult};
use crate::api::mock;
use crate::models::{
    clamp_limit, ClientMode, ExchangeList, HistoricalData, HistoricalRequest, MarketList,
    MarketStats, Ticker,
};

/// Réponse de GET /health
#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

/// Client du backend avec repli automatique sur les données de démonstration
///
/// CONCEPT : Injection de dépendance
/// - Pas de flag global "useMockData" : le mode est un champ de l'instance
/// - L'application crée un client et le partage (Arc) entre ses vues
#[derive(Debug)]
pub struct DataClient {
    config: ClientConfig,
    base_url: Url,
    http: reqwest::Client,
    mock_mode: AtomicBool,
}

impl DataClient {
    /// Crée un client pour la configuration donnée
    ///
    /// Échoue seulement si l'URL de base est inutilisable
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ClientError::Config(format!("base url '{}': {}", config.base_url, e)))?;

        if base_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "base url '{}' cannot carry a path",
                config.base_url
            )));
        }

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        debug!(base_url = %base_url, "Data client created");

        Ok(Self {
            config,
            base_url,
            http,
            mock_mode: AtomicBool::new(false),
        })
    }

    /// Mode courant : Live tant que le dernier appel a abouti
    pub fn mode(&self) -> ClientMode {
        if self.mock_mode.load(Ordering::Relaxed) {
            ClientMode::Mock
        } else {
            ClientMode::Live
        }
    }

    // ========================================================================
    // Opérations publiques
    // ========================================================================

    /// Vérifie que le backend répond `{status: "healthy"}`
    ///
    /// Met à jour le mode en conséquence et ne renvoie jamais d'erreur.
    #[instrument(skip(self))]
    pub async fn check_health(&self) -> bool {
        let timeout = self.config.timeouts.health;
        let result = match self.endpoint_url(&["health"]) {
            Ok(url) => {
                self.fetch_json::<HealthResponse>(self.http.get(url), timeout)
                    .await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(health) if health.status == "healthy" => {
                self.record_live();
                true
            }
            Ok(health) => {
                warn!(status = %health.status, "Backend reports unhealthy status");
                self.record_mock();
                false
            }
            Err(e) => {
                warn!(error = %e, "Backend not available, using mock data");
                self.record_mock();
                false
            }
        }
    }

    /// Liste des exchanges supportés (jamais en échec)
    #[instrument(skip(self))]
    pub async fn list_exchanges(&self) -> ExchangeList {
        let live = self.fetch_exchanges().await;
        self.settle("exchanges", live, mock::exchanges)
    }

    /// Ticker d'une paire sur un exchange
    ///
    /// CONCEPT RUST : Result<T, E> "presque infaillible"
    /// - Err uniquement pour une entrée invalide (avant tout appel réseau)
    /// - Tout échec réseau est remplacé par un ticker simulé
    ///
    /// # Exemple
    /// let ticker = client.get_ticker("binance", "BTC/USDT").await?;
    #[instrument(skip(self))]
    pub async fn get_ticker(&self, exchange: &str, symbol: &str) -> ClientResult<Ticker> {
        let exchange = require_non_empty("exchange", exchange)?;
        let symbol = require_non_empty("symbol", symbol)?;

        let live = match self.endpoint_url(&["api", "ticker", exchange, symbol]) {
            Ok(url) => {
                self.fetch_json::<Ticker>(self.http.get(url), self.config.timeouts.ticker)
                    .await
            }
            Err(e) => Err(e),
        };

        Ok(self.settle("ticker", live, || mock::ticker(exchange, symbol)))
    }

    /// Chandelles historiques (POST, la requête est le corps JSON)
    ///
    /// La limite est ramenée dans [1, 1000] ; la réponse, réelle ou simulée,
    /// ne contient jamais plus de `limit` chandelles.
    #[instrument(skip(self, request), fields(exchange = %request.exchange, symbol = %request.symbol, timeframe = %request.timeframe))]
    pub async fn get_historical(&self, request: &HistoricalRequest) -> ClientResult<HistoricalData> {
        let request = HistoricalRequest {
            exchange: require_non_empty("exchange", &request.exchange)?.to_string(),
            symbol: require_non_empty("symbol", &request.symbol)?.to_string(),
            timeframe: request.timeframe,
            limit: clamp_limit(request.limit as i64),
        };
        let limit = request.limit as usize;

        let live = match self.endpoint_url(&["api", "historical"]) {
            Ok(url) => {
                self.fetch_json::<HistoricalData>(
                    self.http.post(url).json(&request),
                    self.config.timeouts.historical,
                )
                .await
            }
            Err(e) => Err(e),
        };

        let mut data = self.settle("historical", live, || mock::historical(&request));
        data.truncate_to_newest(limit);
        debug!(candles = data.len(), limit, "Historical data ready");
        Ok(data)
    }

    /// Marchés disponibles sur un exchange
    #[instrument(skip(self))]
    pub async fn get_markets(&self, exchange: &str) -> ClientResult<MarketList> {
        let exchange = require_non_empty("exchange", exchange)?;
        let live = self.fetch_markets(exchange).await;
        Ok(self.settle("markets", live, || mock::markets(exchange)))
    }

    /// Statistiques agrégées du dashboard (jamais en échec)
    ///
    /// - nombre d'exchanges : liste réelle, ou liste de démo (backend en
    ///   échec ou liste vide)
    /// - nombre de marchés : premier exchange, backend réel uniquement ;
    ///   None si le backend ne répond pas (affiché "1000+")
    #[instrument(skip(self))]
    pub async fn get_stats(&self) -> MarketStats {
        let (exchanges, total_markets) = match self.fetch_exchanges().await {
            Ok(list) => {
                self.record_live();
                let total_markets = match list.first_id() {
                    Some(first) => match self.fetch_markets(first).await {
                        Ok(markets) => Some(markets.markets.len()),
                        Err(e) => {
                            debug!(exchange = %first, error = %e, "Market count unavailable");
                            None
                        }
                    },
                    None => None,
                };
                // Liste vide : nombre inconnu, on affiche celui de la démo
                let exchanges = if list.is_empty() {
                    debug!("Backend lists no exchange, showing demo count");
                    mock::exchanges().len()
                } else {
                    list.len()
                };
                (exchanges, total_markets)
            }
            Err(e) => {
                warn!(endpoint = "exchanges", error = %e, "Live request failed, serving mock data");
                self.record_mock();
                (mock::exchanges().len(), None)
            }
        };

        MarketStats {
            exchanges,
            total_markets,
            last_update: chrono::Utc::now(),
        }
    }

    // ========================================================================
    // Appels bruts (sans repli)
    // ========================================================================

    async fn fetch_exchanges(&self) -> ClientResult<ExchangeList> {
        let url = self.endpoint_url(&["api", "exchanges"])?;
        self.fetch_json(self.http.get(url), self.config.timeouts.exchanges)
            .await
    }

    async fn fetch_markets(&self, exchange: &str) -> ClientResult<MarketList> {
        let url = self.endpoint_url(&["api", "markets", exchange])?;
        let mut markets: MarketList = self
            .fetch_json(self.http.get(url), self.config.timeouts.markets)
            .await?;
        if markets.exchange.is_empty() {
            markets.exchange = exchange.to_string();
        }
        Ok(markets)
    }

    /// Construit l'URL d'un endpoint
    ///
    /// Chaque segment est encodé : "BTC/USDT" reste un seul segment
    /// (/api/ticker/binance/BTC%2FUSDT)
    fn endpoint_url(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Config(format!("base url '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Envoie la requête et désérialise la réponse, le tout en moins de `timeout`
    ///
    /// CONCEPT RUST : async block + timeout
    /// - L'async block regroupe envoi, contrôle du statut et lecture du corps
    /// - tokio::time::timeout annule le tout (drop de la future) à expiration
    async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        timeout: Duration,
    ) -> ClientResult<T> {
        let round_trip = async {
            let response = request
                .send()
                .await
                .map_err(|e| ClientError::from_reqwest(e, timeout))?;

            let status = response.status();
            debug!(status = %status, url = %response.url(), "Received HTTP response");

            if !status.is_success() {
                return Err(ClientError::HttpError(status.as_u16()));
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| ClientError::from_reqwest(e, timeout))?;

            serde_json::from_slice::<T>(&body).map_err(|e| ClientError::Decode(e.to_string()))
        };

        match tokio::time::timeout(timeout, round_trip).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout(timeout)),
        }
    }

    // ========================================================================
    // Repli et mode
    // ========================================================================

    /// Transforme le résultat d'un appel réel en valeur, via la démo si besoin
    fn settle<T>(&self, endpoint: &str, live: ClientResult<T>, fallback: impl FnOnce() -> T) -> T {
        match live {
            Ok(value) => {
                self.record_live();
                value
            }
            Err(e) => {
                warn!(endpoint, error = %e, "Live request failed, serving mock data");
                self.record_mock();
                fallback()
            }
        }
    }

    fn record_mock(&self) {
        if !self.mock_mode.swap(true, Ordering::Relaxed) {
            info!("Switching to demo mode");
        }
    }

    fn record_live(&self) {
        if self.mock_mode.swap(false, Ordering::Relaxed) {
            info!("Backend reachable again, leaving demo mode");
        }
    }
}

/// Valide un paramètre texte obligatoire et retire les espaces autour
fn require_non_empty<'a>(field: &str, value: &'a str) -> ClientResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClientError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(trimmed)
}

// ============================================================================
// Tests unitaires
// ============================================================================
// Les tests réseau tournent contre un serveur HTTP local (stub_server)
// qui renvoie des statuts, corps et délais choisis par le test.
// ============================================================================

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::api::config::Timeouts;
    use crate::api::stub_server::{unreachable_base_url, StubResponse, StubServer};
    use crate::models::Timeframe;

    const TICKER_JSON: &str = r#"{"exchange":"binance","symbol":"BTC/USDT","last":50000.0,"bid":49999.0,"ask":50001.0,"high":51000.0,"low":49000.0,"volume":1234.5,"timestamp":"2024-01-15T10:00:00"}"#;

    const EXCHANGES_JSON: &str = r#"{"exchanges":[{"id":"bitstamp","name":"Bitstamp","enabled":true,"countries":["EU"]},{"id":"okx","name":"OKX","enabled":true}]}"#;

    fn client_for(base_url: &str, timeout: Duration) -> DataClient {
        DataClient::new(ClientConfig::new(base_url).with_timeouts(Timeouts::uniform(timeout)))
            .unwrap()
    }

    fn historical_json(points: usize) -> String {
        let data: Vec<String> = (0..points)
            .map(|i| {
                format!(
                    r#"{{"timestamp":{},"open":1.0,"high":2.0,"low":0.5,"close":1.5,"volume":3.0}}"#,
                    1_705_000_000_000i64 + i as i64 * 3_600_000
                )
            })
            .collect();
        format!(
            r#"{{"exchange":"binance","symbol":"BTC/USDT","timeframe":"1h","data":[{}]}}"#,
            data.join(",")
        )
    }

    /// Noms des champs JSON d'une valeur sérialisée (pour comparer les formes)
    fn shape<T: serde::Serialize>(value: &T) -> Vec<String> {
        let json = serde_json::to_value(value).unwrap();
        let mut keys: Vec<String> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(matches!(
            DataClient::new(ClientConfig::new("not a url")),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn test_endpoint_url_encodes_symbol() {
        let client = client_for("http://localhost:8000", Duration::from_secs(1));
        let url = client
            .endpoint_url(&["api", "ticker", "binance", "BTC/USDT"])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/ticker/binance/BTC%2FUSDT");

        let nested = client_for("http://example.com/backend/", Duration::from_secs(1));
        assert_eq!(
            nested.endpoint_url(&["health"]).unwrap().as_str(),
            "http://example.com/backend/health"
        );
    }

    #[tokio::test]
    async fn test_live_ticker_keeps_live_mode() {
        let server = StubServer::start(|_, path, _| {
            if path.starts_with("/api/ticker/") {
                StubResponse::ok(TICKER_JSON)
            } else {
                StubResponse::status(404)
            }
        })
        .await;
        let client = client_for(&server.base_url, Duration::from_secs(2));

        let ticker = client.get_ticker("binance", "BTC/USDT").await.unwrap();

        assert_eq!(ticker.last, 50000.0);
        assert_eq!(client.mode(), ClientMode::Live);
        assert_eq!(server.requests(), vec!["GET /api/ticker/binance/BTC%2FUSDT"]);
    }

    #[tokio::test]
    async fn test_http_500_falls_back_with_same_shape() {
        let healthy = StubServer::start(|_, _, _| StubResponse::ok(TICKER_JSON)).await;
        let broken = StubServer::start(|_, _, _| StubResponse::status(500)).await;

        let live_client = client_for(&healthy.base_url, Duration::from_secs(2));
        let broken_client = client_for(&broken.base_url, Duration::from_secs(2));

        let live = live_client.get_ticker("binance", "BTC/USDT").await.unwrap();
        let mocked = broken_client.get_ticker("binance", "BTC/USDT").await.unwrap();

        assert_eq!(shape(&live), shape(&mocked));
        assert_eq!(mocked.exchange, "binance");
        assert_eq!(mocked.symbol, "BTC/USDT");
        assert!((mocked.last - mock::BASE_LAST).abs() <= mock::TICKER_JITTER);
        assert_eq!(broken_client.mode(), ClientMode::Mock);
    }

    #[tokio::test]
    async fn test_timeout_resolves_within_bound() {
        let server = StubServer::start(|_, _, _| {
            StubResponse::ok(TICKER_JSON).delayed(Duration::from_secs(5))
        })
        .await;
        let client = client_for(&server.base_url, Duration::from_millis(200));

        let started = Instant::now();
        let ticker = client.get_ticker("kraken", "ETH/USDT").await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(ticker.exchange, "kraken");
        assert_eq!(client.mode(), ClientMode::Mock);
    }

    #[tokio::test]
    async fn test_undecodable_body_falls_back() {
        let server = StubServer::start(|_, _, _| StubResponse::ok("<html>oops</html>")).await;
        let client = client_for(&server.base_url, Duration::from_secs(2));

        let list = client.list_exchanges().await;

        assert_eq!(list, mock::exchanges());
        assert_eq!(client.mode(), ClientMode::Mock);
    }

    #[tokio::test]
    async fn test_list_exchanges_backend_down() {
        let client = client_for(&unreachable_base_url().await, Duration::from_secs(2));
        assert_eq!(client.mode(), ClientMode::Live);

        let list = client.list_exchanges().await;

        let ids: Vec<&str> = list.exchanges.iter().map(|ex| ex.id.as_str()).collect();
        assert_eq!(ids, vec!["binance", "coinbase", "kraken"]);
        assert_eq!(client.mode(), ClientMode::Mock);
    }

    #[tokio::test]
    async fn test_mode_resets_after_successful_call() {
        let server = StubServer::start(|_, path, _| match path {
            "/api/exchanges" => StubResponse::ok(EXCHANGES_JSON),
            _ => StubResponse::status(503),
        })
        .await;
        let client = client_for(&server.base_url, Duration::from_secs(2));

        client.get_ticker("binance", "BTC/USDT").await.unwrap();
        assert_eq!(client.mode(), ClientMode::Mock);

        let list = client.list_exchanges().await;
        assert_eq!(list.first_id(), Some("bitstamp"));
        assert_eq!(client.mode(), ClientMode::Live);
    }

    #[tokio::test]
    async fn test_invalid_input_rejected_before_network() {
        let server = StubServer::start(|_, _, _| StubResponse::ok(TICKER_JSON)).await;
        let client = client_for(&server.base_url, Duration::from_secs(2));

        let empty_symbol = client.get_ticker("binance", "   ").await;
        let empty_exchange = client
            .get_historical(&HistoricalRequest::new("", "BTC/USDT", Timeframe::H1, 10))
            .await;

        assert!(matches!(empty_symbol, Err(ClientError::InvalidInput(_))));
        assert!(matches!(empty_exchange, Err(ClientError::InvalidInput(_))));
        assert!(server.requests().is_empty());
        assert_eq!(client.mode(), ClientMode::Live);
    }

    #[tokio::test]
    async fn test_historical_posts_clamped_body() {
        let server = StubServer::start(|_, _, _| StubResponse::ok(historical_json(3))).await;
        let client = client_for(&server.base_url, Duration::from_secs(2));

        let request = HistoricalRequest {
            exchange: "binance".into(),
            symbol: "BTC/USDT".into(),
            timeframe: Timeframe::H1,
            limit: 5000,
        };
        let data = client.get_historical(&request).await.unwrap();

        assert_eq!(data.len(), 3);
        let bodies = server.bodies();
        let body: serde_json::Value = serde_json::from_str(&bodies[0]).unwrap();
        assert_eq!(body["limit"], 1000);
        assert_eq!(body["timeframe"], "1h");
        assert_eq!(server.requests(), vec!["POST /api/historical"]);
    }

    #[tokio::test]
    async fn test_historical_live_response_truncated_to_limit() {
        let server = StubServer::start(|_, _, _| StubResponse::ok(historical_json(50))).await;
        let client = client_for(&server.base_url, Duration::from_secs(2));

        let data = client
            .get_historical(&HistoricalRequest::new("binance", "BTC/USDT", Timeframe::H1, 20))
            .await
            .unwrap();

        assert_eq!(data.len(), 20);
        // Les plus récentes sont conservées
        assert_eq!(
            data.last().unwrap().timestamp.timestamp_millis(),
            1_705_000_000_000 + 49 * 3_600_000
        );
    }

    #[tokio::test]
    async fn test_historical_mock_respects_limit() {
        let client = client_for(&unreachable_base_url().await, Duration::from_secs(2));

        let mut request = HistoricalRequest::new("binance", "BTC/USDT", Timeframe::M5, 7);
        assert_eq!(client.get_historical(&request).await.unwrap().len(), 7);

        request.limit = 0;
        assert_eq!(client.get_historical(&request).await.unwrap().len(), 1);

        request.limit = 5000;
        let data = client.get_historical(&request).await.unwrap();
        assert!(data.len() <= 1000);
        assert_eq!(data.len(), mock::HISTORY_LEN);
        assert_eq!(data.timeframe, Timeframe::M5);
    }

    #[tokio::test]
    async fn test_check_health() {
        let healthy = StubServer::start(|_, path, _| match path {
            "/health" => StubResponse::ok(r#"{"status":"healthy","service":"crypto-mcp-server"}"#),
            _ => StubResponse::status(404),
        })
        .await;
        let degraded = StubServer::start(|_, _, _| StubResponse::ok(r#"{"status":"degraded"}"#)).await;

        let client = client_for(&healthy.base_url, Duration::from_secs(2));
        assert!(client.check_health().await);
        assert_eq!(client.mode(), ClientMode::Live);

        let client = client_for(&degraded.base_url, Duration::from_secs(2));
        assert!(!client.check_health().await);
        assert_eq!(client.mode(), ClientMode::Mock);
    }

    #[tokio::test]
    async fn test_stats_counts_markets_of_first_exchange() {
        let server = StubServer::start(|_, path, _| match path {
            "/api/exchanges" => StubResponse::ok(EXCHANGES_JSON),
            "/api/markets/bitstamp" => {
                StubResponse::ok(r#"{"exchange":"bitstamp","markets":[{"symbol":"BTC/EUR"},{"symbol":"ETH/EUR"}]}"#)
            }
            _ => StubResponse::status(404),
        })
        .await;
        let client = client_for(&server.base_url, Duration::from_secs(2));

        let stats = client.get_stats().await;

        assert_eq!(stats.exchanges, 2);
        assert_eq!(stats.total_markets, Some(2));
        assert_eq!(client.mode(), ClientMode::Live);
    }

    #[tokio::test]
    async fn test_stats_backend_down() {
        let client = client_for(&unreachable_base_url().await, Duration::from_secs(2));

        let stats = client.get_stats().await;

        assert_eq!(stats.exchanges, 3);
        assert_eq!(stats.total_markets, None);
        assert_eq!(stats.markets_label(), "1000+");
        assert_eq!(client.mode(), ClientMode::Mock);
    }

    #[tokio::test]
    async fn test_stats_empty_exchange_list_uses_demo_count() {
        let server = StubServer::start(|_, path, _| match path {
            "/api/exchanges" => StubResponse::ok(r#"{"exchanges":[]}"#),
            _ => StubResponse::status(404),
        })
        .await;
        let client = client_for(&server.base_url, Duration::from_secs(2));

        let stats = client.get_stats().await;

        assert_eq!(stats.exchanges, mock::exchanges().len());
        assert_eq!(stats.total_markets, None);
        assert_eq!(client.mode(), ClientMode::Live);
        assert_eq!(server.requests(), vec!["GET /api/exchanges"]);
    }

    #[tokio::test]
    async fn test_markets_fallback() {
        let client = client_for(&unreachable_base_url().await, Duration::from_secs(2));

        let markets = client.get_markets("kraken").await.unwrap();

        assert_eq!(markets.exchange, "kraken");
        assert!(!markets.markets.is_empty());
        assert!(client.get_markets("").await.is_err());
    }
}
