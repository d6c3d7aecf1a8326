// ============================================================================
// Module : refresh (contrôleur de rafraîchissement d'une vue)
// ============================================================================
// Chaque vue (ticker, historique, exchanges, stats) possède un
// RefreshController qui décide QUAND appeler le DataClient :
// - au montage (start)
// - quand l'utilisateur change les paramètres (submit)
// - à la demande (trigger_now)
// - périodiquement si l'auto-refresh est actif
//
// Cycle de vie :
//   Idle → Loading → Displaying | Failed → Loading (nouveau fetch)
//                                       → Cancelled (stop / drop)
//
// CONCEPTS RUST :
// 1. Arc<Shared> : l'état est partagé entre la vue et les tâches tokio
// 2. CancellationToken : abandon coopératif d'un fetch ou du timer
// 3. tokio::select! : la future du fetch est droppée dès l'annulation
// 4. Drop : détruire le contrôleur annule tout ce qu'il a lancé
// ============================================================================

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::ClientResult;

/// Période d'auto-refresh par défaut (polling du ticker)
pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(5);

// ============================================================================
// État d'une vue
// ============================================================================

/// Statut du cycle de vie d'une vue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewStatus {
    #[default]
    Idle,
    Loading,
    Displaying,
    Failed,
    Cancelled,
}

impl ViewStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ViewStatus::Idle => "idle",
            ViewStatus::Loading => "loading",
            ViewStatus::Displaying => "ready",
            ViewStatus::Failed => "failed",
            ViewStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ViewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Instantané de l'état d'une vue, lu par le rendu
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState<T> {
    pub status: ViewStatus,

    /// Dernière donnée affichée (conservée en cas d'échec)
    pub data: Option<T>,

    /// Description de la dernière erreur (statut Failed)
    pub error: Option<String>,

    /// Date de la dernière donnée reçue
    pub last_updated: Option<DateTime<Utc>>,

    /// Nombre de fetchs lancés depuis la création
    pub fetch_count: u64,
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        Self {
            status: ViewStatus::Idle,
            data: None,
            error: None,
            last_updated: None,
            fetch_count: 0,
        }
    }
}

// ============================================================================
// Fetcher et handle d'annulation
// ============================================================================

/// Future renvoyée par un fetcher
pub type FetchFuture<T> = Pin<Box<dyn Future<Output = ClientResult<T>> + Send>>;

/// Fonction qui produit un fetch pour des paramètres donnés
///
/// CONCEPT RUST : Trait object dans un Arc
/// - dyn Fn : le contrôleur ne connaît pas le type concret de la closure
/// - Send + Sync : appelable depuis la tâche du timer
pub type Fetcher<P, T> = Arc<dyn Fn(P) -> FetchFuture<T> + Send + Sync>;

/// Poignée sur un fetch lancé
#[derive(Debug, Clone)]
pub struct FetchHandle {
    token: CancellationToken,
}

impl FetchHandle {
    /// Abandonne le fetch : son résultat ne sera jamais appliqué
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

// ============================================================================
// État partagé avec les tâches tokio
// ============================================================================

struct Slot<P, T> {
    /// Paramètres courants de la vue
    params: P,

    state: ViewState<T>,

    /// Token du fetch en cours (un seul à la fois)
    in_flight: Option<CancellationToken>,

    /// Incrémenté à chaque lancement ou arrêt ; un résultat d'une
    /// génération antérieure est ignoré
    generation: u64,
}

struct Shared<P, T> {
    label: String,
    fetcher: Fetcher<P, T>,
    runtime: Handle,
    slot: Mutex<Slot<P, T>>,
}

impl<P, T> Shared<P, T>
where
    P: Clone + Send + 'static,
    T: Send + 'static,
{
    /// Lance un fetch, avec de nouveaux paramètres si fournis
    ///
    /// Lecture des paramètres, supersession du fetch précédent et incrément
    /// de génération se font sous le même verrou que l'application d'un
    /// résultat : la génération la plus récente porte toujours les
    /// paramètres les plus récents.
    fn launch(self: &Arc<Self>, reason: &'static str, replace: Option<P>) -> FetchHandle {
        let token = CancellationToken::new();

        let (params, generation) = {
            let mut slot = self.slot.lock();
            if let Some(params) = replace {
                slot.params = params;
            }
            if let Some(previous) = slot.in_flight.replace(token.clone()) {
                previous.cancel();
            }
            slot.generation += 1;
            slot.state.status = ViewStatus::Loading;
            slot.state.fetch_count += 1;
            (slot.params.clone(), slot.generation)
        };

        debug!(view = %self.label, reason, generation, "Fetch launched");

        let fetch = (self.fetcher)(params);
        let shared = Arc::clone(self);
        let cancelled = token.clone();

        self.runtime.spawn(async move {
            tokio::select! {
                biased;
                _ = cancelled.cancelled() => shared.abandon(generation),
                result = fetch => shared.apply(generation, result),
            }
        });

        FetchHandle { token }
    }

    fn apply(&self, generation: u64, result: ClientResult<T>) {
        let mut slot = self.slot.lock();
        let current = slot.generation == generation
            && slot.in_flight.as_ref().is_some_and(|t| !t.is_cancelled());
        if !current {
            drop(slot);
            self.abandon(generation);
            return;
        }

        slot.in_flight = None;
        match result {
            Ok(data) => {
                slot.state.status = ViewStatus::Displaying;
                slot.state.data = Some(data);
                slot.state.error = None;
                slot.state.last_updated = Some(Utc::now());
                debug!(view = %self.label, generation, "Fetch applied");
            }
            Err(e) => {
                warn!(view = %self.label, error = %e, "Fetch failed, keeping previous data");
                slot.state.status = ViewStatus::Failed;
                slot.state.error = Some(e.to_string());
            }
        }
    }

    /// Fetch annulé : si c'était le plus récent, la vue passe en Cancelled
    fn abandon(&self, generation: u64) {
        let mut slot = self.slot.lock();
        if slot.generation == generation && slot.state.status == ViewStatus::Loading {
            slot.in_flight = None;
            slot.state.status = ViewStatus::Cancelled;
            debug!(view = %self.label, generation, "Fetch cancelled");
        }
    }

    fn cancel_in_flight(&self) {
        let mut slot = self.slot.lock();
        if let Some(token) = slot.in_flight.take() {
            token.cancel();
        }
        slot.generation += 1;
        slot.state.status = ViewStatus::Cancelled;
    }
}

// ============================================================================
// RefreshController
// ============================================================================

/// Contrôleur de rafraîchissement d'une vue
///
/// - `P` : paramètres de la vue (ex: TickerQuery)
/// - `T` : donnée affichée (ex: Ticker)
///
/// Les fetchs et le timer tournent sur le runtime tokio capturé à la
/// construction ; le rendu (synchrone) ne fait que lire `snapshot()`.
pub struct RefreshController<P, T> {
    shared: Arc<Shared<P, T>>,
    period: Duration,

    /// Token du timer d'auto-refresh (None = désactivé)
    auto_refresh: Mutex<Option<CancellationToken>>,
}

impl<P, T> RefreshController<P, T>
where
    P: Clone + Send + 'static,
    T: Clone + Send + 'static,
{
    /// Crée un contrôleur inactif (Idle)
    ///
    /// Doit être appelé depuis un contexte tokio (Handle::current).
    ///
    /// # Exemple
    /// let client = Arc::clone(&client);
    /// let ticker = RefreshController::new("ticker", query, move |q: TickerQuery| {
    ///     let client = Arc::clone(&client);
    ///     async move { client.get_ticker(&q.exchange, &q.symbol).await }
    /// });
    pub fn new<F, Fut>(label: impl Into<String>, params: P, fetch: F) -> Self
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ClientResult<T>> + Send + 'static,
    {
        let fetcher: Fetcher<P, T> = Arc::new(move |params| -> FetchFuture<T> { Box::pin(fetch(params)) });

        Self {
            shared: Arc::new(Shared {
                label: label.into(),
                fetcher,
                runtime: Handle::current(),
                slot: Mutex::new(Slot {
                    params,
                    state: ViewState::default(),
                    in_flight: None,
                    generation: 0,
                }),
            }),
            period: DEFAULT_REFRESH_PERIOD,
            auto_refresh: Mutex::new(None),
        }
    }

    /// Change la période d'auto-refresh (avant activation)
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn label(&self) -> &str {
        &self.shared.label
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Paramètres courants
    pub fn params(&self) -> P {
        self.shared.slot.lock().params.clone()
    }

    /// Copie de l'état courant
    pub fn snapshot(&self) -> ViewState<T> {
        self.shared.slot.lock().state.clone()
    }

    pub fn status(&self) -> ViewStatus {
        self.shared.slot.lock().state.status
    }

    /// Montage de la vue : premier fetch
    ///
    /// Possible aussi après `stop()` (la vue est remontée).
    pub fn start(&self) -> FetchHandle {
        info!(view = %self.shared.label, "View started");
        self.shared.launch("start", None)
    }

    /// Remplace les paramètres et relance un fetch
    pub fn submit(&self, params: P) -> FetchHandle {
        self.shared.launch("submit", Some(params))
    }

    /// Relance un fetch avec les paramètres courants
    pub fn trigger_now(&self) -> FetchHandle {
        self.shared.launch("manual", None)
    }

    pub fn is_auto_refresh(&self) -> bool {
        self.auto_refresh.lock().is_some()
    }

    /// Active ou désactive le rafraîchissement périodique
    ///
    /// CONCEPT : Timer unique
    /// - Activer deux fois ne crée pas de second timer
    /// - Premier tick une période après l'activation (pas immédiat)
    pub fn set_auto_refresh(&self, enabled: bool) {
        let mut auto_refresh = self.auto_refresh.lock();

        if !enabled {
            if let Some(token) = auto_refresh.take() {
                token.cancel();
                info!(view = %self.shared.label, "Auto-refresh disabled");
            }
            return;
        }

        if auto_refresh.is_some() {
            return;
        }

        let token = CancellationToken::new();
        let stopped = token.clone();
        let shared = Arc::clone(&self.shared);
        let period = self.period;

        self.shared.runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = stopped.cancelled() => break,
                    _ = ticker.tick() => {
                        shared.launch("auto-refresh", None);
                    }
                }
            }
        });

        info!(view = %self.shared.label, period_secs = period.as_secs_f64(), "Auto-refresh enabled");
        *auto_refresh = Some(token);
    }

    /// Bascule l'auto-refresh, renvoie le nouvel état
    pub fn toggle_auto_refresh(&self) -> bool {
        let enabled = !self.is_auto_refresh();
        self.set_auto_refresh(enabled);
        enabled
    }

    /// Démontage de la vue : timer et fetch en cours annulés
    pub fn stop(&self) {
        self.set_auto_refresh(false);
        self.shared.cancel_in_flight();
        info!(view = %self.shared.label, "View stopped");
    }
}

impl<P, T> Drop for RefreshController<P, T> {
    fn drop(&mut self) {
        if let Some(token) = self.auto_refresh.get_mut().take() {
            token.cancel();
        }
        if let Some(token) = self.shared.slot.lock().in_flight.take() {
            token.cancel();
        }
    }
}

impl<P, T> fmt::Debug for RefreshController<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshController")
            .field("label", &self.shared.label)
            .field("period", &self.period)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
// Horloge tokio en pause : les sleeps avancent le temps virtuel
// instantanément, les timers sont testés sans attendre réellement.
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::api::ClientError;

    const PERIOD: Duration = Duration::from_secs(5);

    /// Contrôleur dont chaque fetch renvoie le numéro d'appel
    fn counting_controller() -> (RefreshController<(), usize>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let controller = RefreshController::new("counter", (), move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok::<_, ClientError>(n) }
        })
        .with_period(PERIOD);
        (controller, calls)
    }

    /// Laisse tourner les tâches spawnées
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_fetches_once() {
        let (controller, calls) = counting_controller();
        assert_eq!(controller.status(), ViewStatus::Idle);

        controller.start();
        assert_eq!(controller.status(), ViewStatus::Loading);
        settle().await;

        let state = controller.snapshot();
        assert_eq!(state.status, ViewStatus::Displaying);
        assert_eq!(state.data, Some(1));
        assert_eq!(state.fetch_count, 1);
        assert!(state.last_updated.is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_refresh_polls_each_period() {
        let (controller, calls) = counting_controller();

        controller.set_auto_refresh(true);
        // Pas de tick immédiat
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(PERIOD * 2 + Duration::from_millis(10)).await;
        assert!(calls.load(Ordering::SeqCst) >= 2);

        controller.set_auto_refresh(false);
        let before = calls.load(Ordering::SeqCst);
        tokio::time::sleep(PERIOD * 2 + Duration::from_millis(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enabling_twice_does_not_stack_timers() {
        let (controller, calls) = counting_controller();

        controller.set_auto_refresh(true);
        controller.set_auto_refresh(true);
        assert!(controller.is_auto_refresh());

        tokio::time::sleep(PERIOD * 3 + Duration::from_millis(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_auto_refresh() {
        let (controller, _) = counting_controller();
        assert!(controller.toggle_auto_refresh());
        assert!(!controller.toggle_auto_refresh());
        assert!(!controller.is_auto_refresh());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_toggling_keeps_a_single_timer() {
        let (controller, calls) = counting_controller();

        // on, off, on dans la même période
        controller.toggle_auto_refresh();
        tokio::time::sleep(Duration::from_secs(1)).await;
        controller.toggle_auto_refresh();
        tokio::time::sleep(Duration::from_secs(1)).await;
        controller.toggle_auto_refresh();
        assert!(controller.is_auto_refresh());

        tokio::time::sleep(PERIOD * 2 + Duration::from_millis(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_latest_generation_carries_latest_params() {
        let controller = RefreshController::new("params", 0usize, |n: usize| async move {
            Ok::<_, ClientError>(n)
        });

        // Un tick et un submit concurrents, bloqués sur l'état de la vue
        std::thread::scope(|scope| {
            let guard = controller.shared.slot.lock();
            scope.spawn(|| controller.trigger_now());
            std::thread::sleep(Duration::from_millis(50));
            scope.spawn(|| controller.submit(1));
            std::thread::sleep(Duration::from_millis(50));
            drop(guard);
        });

        tokio::time::sleep(Duration::from_millis(100)).await;

        let state = controller.snapshot();
        assert_eq!(controller.params(), 1);
        assert_eq!(state.fetch_count, 2);
        assert_eq!(state.data, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_request_wins() {
        let slow_completed = Arc::new(AtomicUsize::new(0));
        let completed = Arc::clone(&slow_completed);

        let controller = RefreshController::new("latency", Duration::ZERO, move |delay: Duration| {
            let completed = Arc::clone(&completed);
            async move {
                tokio::time::sleep(delay).await;
                if delay > Duration::from_secs(1) {
                    completed.fetch_add(1, Ordering::SeqCst);
                }
                Ok::<_, ClientError>(delay)
            }
        });

        let slow = controller.submit(Duration::from_secs(5));
        let fast = controller.submit(Duration::from_millis(10));
        assert!(slow.is_cancelled());
        assert!(!fast.is_cancelled());

        tokio::time::sleep(Duration::from_secs(6)).await;

        let state = controller.snapshot();
        assert_eq!(state.status, ViewStatus::Displaying);
        assert_eq!(state.data, Some(Duration::from_millis(10)));
        assert_eq!(state.fetch_count, 2);
        assert_eq!(slow_completed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_previous_data() {
        let controller = RefreshController::new("flaky", "ok".to_string(), |symbol: String| async move {
            if symbol.is_empty() {
                Err(ClientError::InvalidInput("symbol must not be empty".into()))
            } else {
                Ok(symbol)
            }
        });

        controller.start();
        settle().await;
        controller.submit(String::new());
        settle().await;

        let state = controller.snapshot();
        assert_eq!(state.status, ViewStatus::Failed);
        assert_eq!(state.data.as_deref(), Some("ok"));
        assert_eq!(
            state.error.as_deref(),
            Some("invalid input: symbol must not be empty")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_everything() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let controller = RefreshController::new("slow", (), move |_| {
            let counter = Arc::clone(&counter);
            async move {
                tokio::time::sleep(Duration::from_secs(2)).await;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ClientError>(())
            }
        })
        .with_period(PERIOD);

        let handle = controller.start();
        controller.set_auto_refresh(true);
        controller.stop();

        assert!(handle.is_cancelled());
        assert!(!controller.is_auto_refresh());
        assert_eq!(controller.status(), ViewStatus::Cancelled);

        tokio::time::sleep(PERIOD * 3).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(controller.snapshot().fetch_count, 1);

        // Remontage
        controller.start();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(controller.status(), ViewStatus::Displaying);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_cancel_marks_view_cancelled() {
        let controller = RefreshController::new("slow", (), |_| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Ok::<_, ClientError>(42u32)
        });

        let handle = controller.trigger_now();
        handle.cancel();
        settle().await;

        let state = controller.snapshot();
        assert_eq!(state.status, ViewStatus::Cancelled);
        assert_eq!(state.data, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_timer() {
        let (controller, calls) = counting_controller();
        controller.set_auto_refresh(true);
        drop(controller);

        tokio::time::sleep(PERIOD * 3).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
