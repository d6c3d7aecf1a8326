// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état global de l'application TUI
//
// CONCEPTS RUST :
// 1. State Management : centraliser l'état dans une seule structure
// 2. Mutabilité contrôlée : &mut self pour modifier l'état
// 3. Composition : chaque vue délègue ses fetchs à un RefreshController
//
// PATTERN : Cette structure suit le pattern "Application State"
// - Tous les composants de l'UI lisent depuis App
// - Toutes les modifications passent par les méthodes de App
// - Les données réseau arrivent dans les contrôleurs, jamais directement ici
// ============================================================================

use std::sync::Arc;

use tracing::{debug, info};

use crate::api::DataClient;
use crate::config::AppConfig;
use crate::models::{
    ClientMode, ExchangeList, HistoricalData, HistoricalRequest, MarketStats, Ticker,
    TickerQuery, Timeframe, DEFAULT_LIMIT,
};
use crate::refresh::RefreshController;

/// Paire affichée au démarrage
pub const DEFAULT_SYMBOL: &str = "BTC/USDT";

// ============================================================================
// Enum : Screen
// ============================================================================
// CONCEPT RUST : Enums pour state machines
// - Un seul écran actif à la fois
// - Tab fait défiler Dashboard → Historical → Exchanges → Dashboard
// ============================================================================

/// Écrans de l'application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Stats globales + ticker temps réel
    Dashboard,

    /// Graphique des chandelles historiques
    Historical,

    /// Liste des exchanges supportés
    Exchanges,
}

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Screen::Dashboard => "Dashboard",
            Screen::Historical => "Historical",
            Screen::Exchanges => "Exchanges",
        }
    }

    pub fn next(&self) -> Screen {
        match self {
            Screen::Dashboard => Screen::Historical,
            Screen::Historical => Screen::Exchanges,
            Screen::Exchanges => Screen::Dashboard,
        }
    }

    pub fn all() -> [Screen; 3] {
        [Screen::Dashboard, Screen::Historical, Screen::Exchanges]
    }
}

/// Champ en cours d'édition (mode saisie)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    Symbol,
    Limit,
}

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Écran actuellement affiché
    pub current_screen: Screen,

    /// Indique si l'utilisateur a demandé à quitter (attend confirmation)
    /// CONCEPT : Two-step quit pour éviter les sorties accidentelles
    /// - Première pression de 'q' : confirm_quit = true
    /// - Deuxième pression de 'q' : running = false (quit réel)
    /// - N'importe quelle autre touche : confirm_quit = false (annulation)
    pub confirm_quit: bool,

    /// Champ édité, None hors mode saisie
    /// CONCEPT : Modal input (Vim-like)
    /// - Enter valide, ESC annule
    pub input_field: Option<InputField>,

    /// Buffer de saisie
    pub input_buffer: String,

    /// Prompt affiché en mode saisie (ex: "Symbol: ")
    pub input_prompt: String,

    // ------------------------------------------------------------------------
    // Formulaire partagé par Dashboard et Historical
    // ------------------------------------------------------------------------
    /// Exchange sélectionné (vide tant que la liste n'est pas chargée)
    pub exchange: String,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub limit: u32,

    // ------------------------------------------------------------------------
    // Vues
    // ------------------------------------------------------------------------
    pub exchanges: RefreshController<(), ExchangeList>,
    pub stats: RefreshController<(), MarketStats>,
    pub ticker: RefreshController<TickerQuery, Ticker>,
    pub historical: RefreshController<HistoricalRequest, HistoricalData>,

    client: Arc<DataClient>,
}

impl App {
    /// Crée l'application et ses contrôleurs (aucun fetch lancé)
    ///
    /// Doit être appelé dans un contexte tokio : les contrôleurs capturent
    /// le runtime courant pour y lancer leurs fetchs.
    pub fn new(client: Arc<DataClient>, config: &AppConfig) -> Self {
        let exchanges = {
            let client = Arc::clone(&client);
            RefreshController::new("exchanges", (), move |_| {
                let client = Arc::clone(&client);
                async move { Ok(client.list_exchanges().await) }
            })
        };

        let stats = {
            let client = Arc::clone(&client);
            RefreshController::new("stats", (), move |_| {
                let client = Arc::clone(&client);
                async move { Ok(client.get_stats().await) }
            })
        };

        let ticker = {
            let client = Arc::clone(&client);
            RefreshController::new("ticker", TickerQuery::default(), move |query: TickerQuery| {
                let client = Arc::clone(&client);
                async move { client.get_ticker(&query.exchange, &query.symbol).await }
            })
            .with_period(config.ticker_refresh)
        };

        let historical = {
            let client = Arc::clone(&client);
            let request = HistoricalRequest::new("", DEFAULT_SYMBOL, Timeframe::default(), DEFAULT_LIMIT as i64);
            RefreshController::new("historical", request, move |request: HistoricalRequest| {
                let client = Arc::clone(&client);
                async move { client.get_historical(&request).await }
            })
        };

        Self {
            running: true,
            current_screen: Screen::Dashboard,
            confirm_quit: false,
            input_field: None,
            input_buffer: String::new(),
            input_prompt: String::new(),
            exchange: String::new(),
            symbol: DEFAULT_SYMBOL.to_string(),
            timeframe: Timeframe::default(),
            limit: DEFAULT_LIMIT,
            exchanges,
            stats,
            ticker,
            historical,
            client,
        }
    }

    /// Premier affichage : charge la liste des exchanges et monte le dashboard
    pub fn mount(&mut self) {
        self.exchanges.start();
        self.mount_screen(self.current_screen);
    }

    /// Mode du client (le bandeau démo en dépend)
    pub fn mode(&self) -> ClientMode {
        self.client.mode()
    }

    /// Quitte l'application
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Vérifie si l'application doit continuer
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Tick : appelé à chaque itération de la boucle
    ///
    /// Sélectionne le premier exchange dès que la liste est disponible.
    pub fn tick(&mut self) {
        if !self.exchange.is_empty() {
            return;
        }

        let first = self
            .exchanges
            .snapshot()
            .data
            .and_then(|list| list.first_id().map(str::to_string));

        if let Some(first) = first {
            info!(exchange = %first, "Default exchange selected");
            self.exchange = first;
        }
    }

    /// Arrête tous les contrôleurs (avant de quitter)
    pub fn shutdown(&mut self) {
        self.exchanges.stop();
        self.stats.stop();
        self.ticker.stop();
        self.historical.stop();
    }

    // ========================================================================
    // Navigation entre écrans
    // ========================================================================

    /// Passe à l'écran suivant
    ///
    /// CONCEPT : Montage / démontage
    /// - L'écran quitté arrête ses contrôleurs (timer + fetch en cours)
    /// - L'écran affiché lance son fetch initial
    pub fn next_screen(&mut self) {
        let previous = self.current_screen;
        self.unmount_screen(previous);
        self.current_screen = previous.next();
        info!(from = previous.title(), to = self.current_screen.title(), "Screen changed");
        self.mount_screen(self.current_screen);
    }

    fn mount_screen(&mut self, screen: Screen) {
        match screen {
            Screen::Dashboard => {
                self.stats.start();
            }
            Screen::Historical => {}
            Screen::Exchanges => {
                self.exchanges.start();
            }
        }
    }

    fn unmount_screen(&mut self, screen: Screen) {
        match screen {
            Screen::Dashboard => {
                self.stats.stop();
                self.ticker.stop();
            }
            Screen::Historical => self.historical.stop(),
            Screen::Exchanges => self.exchanges.stop(),
        }
    }

    pub fn is_on(&self, screen: Screen) -> bool {
        self.current_screen == screen
    }

    // ========================================================================
    // Formulaire
    // ========================================================================

    /// Passe à l'exchange suivant de la liste (cycle)
    pub fn next_exchange(&mut self) {
        let Some(list) = self.exchanges.snapshot().data else {
            debug!("Exchange list not loaded yet");
            return;
        };

        let next = list
            .next_id(&self.exchange)
            .or_else(|| list.first_id())
            .map(str::to_string);

        if let Some(next) = next {
            self.exchange = next;
        }
    }

    pub fn next_timeframe(&mut self) {
        self.timeframe = self.timeframe.next();
    }

    pub fn previous_timeframe(&mut self) {
        self.timeframe = self.timeframe.previous();
    }

    /// Paramètres courants du ticker
    pub fn ticker_query(&self) -> TickerQuery {
        TickerQuery::new(self.exchange.clone(), self.symbol.clone())
    }

    /// Requête historique courante (limite bornée à [1, 1000])
    pub fn historical_request(&self) -> HistoricalRequest {
        HistoricalRequest::new(
            self.exchange.clone(),
            self.symbol.clone(),
            self.timeframe,
            self.limit as i64,
        )
    }

    /// Enter sur le dashboard : fetch du ticker
    pub fn submit_ticker(&mut self) {
        let query = self.ticker_query();
        info!(exchange = %query.exchange, symbol = %query.symbol, "Ticker requested");
        self.ticker.submit(query);
    }

    /// Enter sur l'écran historique : fetch des chandelles
    pub fn submit_historical(&mut self) {
        let request = self.historical_request();
        info!(exchange = %request.exchange, symbol = %request.symbol, timeframe = %request.timeframe, limit = request.limit, "Historical data requested");
        self.historical.submit(request);
    }

    /// 'a' : bascule l'auto-refresh du ticker
    ///
    /// Le premier rafraîchissement automatique a lieu une période après
    /// l'activation ; les paramètres utilisés sont ceux du dernier Enter.
    pub fn toggle_ticker_auto_refresh(&mut self) -> bool {
        if self.ticker.params() != self.ticker_query() {
            self.ticker.submit(self.ticker_query());
        }
        let enabled = self.ticker.toggle_auto_refresh();
        info!(enabled, "Ticker auto-refresh toggled");
        enabled
    }

    /// 'r' sur l'écran exchanges
    pub fn refresh_exchanges(&mut self) {
        self.exchanges.trigger_now();
    }

    // ========================================================================
    // Quit Confirmation
    // ========================================================================

    /// Demande la confirmation de quitter
    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    /// Annule la demande de quit
    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    // ========================================================================
    // Input Mode Management
    // ========================================================================

    /// Entre en mode saisie pour un champ
    ///
    /// Le buffer part de la valeur actuelle du champ.
    pub fn start_input(&mut self, field: InputField) {
        let (prompt, current) = match field {
            InputField::Symbol => ("Symbol: ", self.symbol.clone()),
            InputField::Limit => ("Limit (1-1000): ", self.limit.to_string()),
        };
        self.input_field = Some(field);
        self.input_prompt = prompt.to_string();
        self.input_buffer = current;
    }

    /// Annule la saisie
    pub fn cancel_input(&mut self) {
        self.input_field = None;
        self.input_buffer.clear();
        self.input_prompt.clear();
    }

    /// Valide la saisie et l'applique au champ édité
    ///
    /// - Symbol : mis en majuscules, ignoré si vide
    /// - Limit : bornée à [1, 1000], ignorée si non numérique
    pub fn submit_input(&mut self) {
        let value = self.input_buffer.trim().to_string();

        match self.input_field {
            Some(InputField::Symbol) if !value.is_empty() => {
                self.symbol = value.to_uppercase();
            }
            Some(InputField::Limit) => match value.parse::<i64>() {
                Ok(limit) => self.limit = crate::models::clamp_limit(limit),
                Err(_) => debug!(input = %value, "Ignoring non numeric limit"),
            },
            _ => debug!("Empty input, ignoring"),
        }

        self.cancel_input();
    }

    /// Ajoute un caractère au buffer d'input
    pub fn append_char(&mut self, c: char) {
        self.input_buffer.push(c);
    }

    /// Supprime le dernier caractère du buffer
    pub fn backspace(&mut self) {
        self.input_buffer.pop();
    }

    pub fn is_in_input_mode(&self) -> bool {
        self.input_field.is_some()
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::api::stub_server::unreachable_base_url;
    use crate::api::ClientConfig;
    use crate::refresh::ViewStatus;

    async fn demo_app() -> App {
        let config = AppConfig {
            api_url: unreachable_base_url().await,
            ..AppConfig::default()
        };
        let client = DataClient::new(ClientConfig::new(config.api_url.clone())).unwrap();
        App::new(Arc::new(client), &config)
    }

    /// Attend qu'une condition devienne vraie (fetchs en tâche de fond)
    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn test_app_creation() {
        let app = demo_app().await;
        assert!(app.is_running());
        assert_eq!(app.current_screen, Screen::Dashboard);
        assert_eq!(app.symbol, "BTC/USDT");
        assert_eq!(app.limit, 100);
        assert_eq!(app.exchanges.status(), ViewStatus::Idle);
    }

    #[tokio::test]
    async fn test_mount_selects_first_exchange_in_demo_mode() {
        let mut app = demo_app().await;
        app.mount();

        wait_until(|| app.exchanges.status() == ViewStatus::Displaying).await;
        app.tick();

        assert_eq!(app.exchange, "binance");
        assert_eq!(app.mode(), ClientMode::Mock);

        app.next_exchange();
        assert_eq!(app.exchange, "coinbase");
    }

    #[tokio::test]
    async fn test_leaving_dashboard_stops_ticker() {
        let mut app = demo_app().await;
        app.exchange = "kraken".to_string();
        app.toggle_ticker_auto_refresh();
        assert!(app.ticker.is_auto_refresh());

        app.next_screen();

        assert_eq!(app.current_screen, Screen::Historical);
        assert!(!app.ticker.is_auto_refresh());
        assert_eq!(app.ticker.status(), ViewStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_screen_cycle() {
        let mut app = demo_app().await;
        for expected in [Screen::Historical, Screen::Exchanges, Screen::Dashboard] {
            app.next_screen();
            assert_eq!(app.current_screen, expected);
        }
    }

    #[tokio::test]
    async fn test_submit_historical_uses_form() {
        let mut app = demo_app().await;
        app.exchange = "binance".to_string();
        app.next_timeframe();
        app.start_input(InputField::Limit);
        app.input_buffer = "5000".to_string();
        app.submit_input();
        assert_eq!(app.limit, 1000);

        app.limit = 12;
        app.submit_historical();
        wait_until(|| app.historical.status() == ViewStatus::Displaying).await;

        let data = app.historical.snapshot().data.unwrap();
        assert_eq!(data.len(), 12);
        assert_eq!(data.timeframe, Timeframe::H4);
    }

    #[tokio::test]
    async fn test_empty_exchange_fails_ticker_view() {
        let mut app = demo_app().await;
        app.submit_ticker();
        wait_until(|| app.ticker.status() == ViewStatus::Failed).await;
        assert!(app.ticker.snapshot().error.unwrap().contains("exchange"));
    }

    #[tokio::test]
    async fn test_app_quit() {
        let mut app = demo_app().await;
        app.request_quit();
        assert!(app.is_awaiting_quit_confirmation());
        app.cancel_quit();
        assert!(!app.is_awaiting_quit_confirmation());

        app.quit();
        assert!(!app.is_running());
    }

    #[tokio::test]
    async fn test_input_mode() {
        let mut app = demo_app().await;
        app.start_input(InputField::Symbol);
        assert!(app.is_in_input_mode());
        assert_eq!(app.input_buffer, "BTC/USDT");

        app.input_buffer.clear();
        for c in "eth/usdt".chars() {
            app.append_char(c);
        }
        app.append_char('x');
        app.backspace();
        app.submit_input();

        assert!(!app.is_in_input_mode());
        assert_eq!(app.symbol, "ETH/USDT");

        app.start_input(InputField::Symbol);
        app.input_buffer.clear();
        app.submit_input();
        assert_eq!(app.symbol, "ETH/USDT");
    }
}
