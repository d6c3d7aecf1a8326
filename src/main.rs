// ============================================================================
// CryptoDash - Dashboard crypto en terminal
// ============================================================================
// Programme TUI : stats globales, ticker temps réel, historique et liste des
// exchanges, servis par le backend REST ou par les données de démo
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : boucle infinie qui gère événements et rendering
// 3. Async dans sync : les fetchs tournent sur un Runtime tokio, la boucle
//    de rendu reste synchrone et ne lit que des instantanés
// 4. Cleanup : restauration du terminal même en cas d'erreur
// ============================================================================

use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use cryptodash::api::DataClient;
use cryptodash::app::{App, InputField, Screen};
use cryptodash::config::AppConfig;
use cryptodash::ui::events::{self, Event, EventHandler};
use cryptodash::ui::render;

// ============================================================================
// Initialisation du logging
// ============================================================================
// CONCEPT : Logging dans une app TUI
// - Les println! ne fonctionnent pas une fois le TUI lancé
// - On log vers un fichier à la place, avec rotation quotidienne
// ============================================================================

/// Initialise le système de logging vers fichier
///
/// CONCEPT RUST : Tracing subscriber
/// - Registry : point central des logs
/// - Layer : transforme et route les logs
/// - EnvFilter : filtre par niveau (RUST_LOG env var)
/// - RollingFileAppender : rotation automatique
///
/// # Utilisation
/// ```bash
/// # Voir les logs en temps réel
/// tail -f ~/.local/share/cryptodash/logs/cryptodash.log.*
///
/// # Contrôler le niveau de log
/// RUST_LOG=cryptodash=trace cargo run
/// ```
fn init_logging(log_dir: &Path) -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    std::fs::create_dir_all(log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "cryptodash.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender) // Écrit dans le fichier
                .with_ansi(false) // Pas de codes couleur dans le fichier
                .with_target(true) // Inclut le module (ex: cryptodash::api::client)
                .with_thread_ids(true) // Les fetchs tournent sur les workers tokio
                .with_line_number(true),
        )
        .with(
            // Par défaut : debug pour cryptodash, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cryptodash=debug,info".into()),
        )
        .try_init()
        .context("Échec de l'initialisation du subscriber")?;

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    let config = AppConfig::from_env().context("Configuration invalide")?;

    // Logging avant tout le reste ; si l'init échoue on continue sans logs
    init_logging(&config.log_dir).unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {:#}", e);
        eprintln!("   Continuing without logging...");
    });

    info!(api_url = %config.api_url, refresh_secs = config.ticker_refresh.as_secs(), "CryptoDash starting up");

    // CONCEPT RUST : Runtime tokio explicite
    // - Les contrôleurs y lancent leurs fetchs et timers
    // - Doit vivre jusqu'à la fin de la boucle d'événements
    let runtime = tokio::runtime::Runtime::new().context("Échec de la création du runtime tokio")?;

    let client = Arc::new(DataClient::new(config.client_config()).context("URL du backend invalide")?);

    println!("🔌 Connexion au backend {}...", config.api_url);
    if runtime.block_on(client.check_health()) {
        info!("Backend healthy");
    } else {
        warn!("Backend unavailable, starting in demo mode");
        println!("⚠️  Backend injoignable : mode démo");
    }

    // Les contrôleurs capturent Handle::current() à leur création
    let _guard = runtime.enter();
    let mut app = App::new(Arc::clone(&client), &config);
    app.mount();

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let event_handler = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, &mut app, &event_handler);

    // Annule timers et fetchs avant de rendre le terminal
    app.shutdown();

    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// CONCEPT : Game Loop / Event Loop Pattern
// - À chaque itération :
//   1. Dessiner l'interface (render) depuis les instantanés des contrôleurs
//   2. Traiter les événements (input)
//   3. Mettre à jour l'état (update)
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    while app.is_running() {
        terminal.draw(|frame| render(frame, app))?;

        match events.next() {
            Ok(event) => handle_event(app, event),
            Err(e) => warn!(error = %e, "Failed to read terminal event"),
        }

        app.tick();
    }

    Ok(())
}

// ============================================================================
// Gestion des événements
// ============================================================================

/// Traite un événement et met à jour l'état de l'application
///
/// CONCEPT RUST : Pattern matching avec guards
/// - Le mode saisie capture toutes les touches en priorité
/// - Puis les raccourcis globaux, puis ceux de l'écran courant
fn handle_event(app: &mut App, event: Event) {
    if let Event::Tick = event {
        return;
    }

    if events::is_interrupt_event(&event) {
        info!("User interrupted");
        app.quit();
        return;
    }

    // ========================================
    // Input Mode : Gestion de la saisie
    // ========================================
    if app.is_in_input_mode() {
        if events::is_escape_event(&event) {
            debug!("User cancelled input");
            app.cancel_input();
        } else if events::is_enter_event(&event) {
            app.submit_input();
        } else if events::is_backspace_event(&event) {
            app.backspace();
        } else if events::is_input_char_event(&event) {
            if let Some(c) = events::get_char_from_event(&event) {
                app.append_char(c);
            }
        }
        return;
    }

    // 'q' : quit confirmation two-step
    if events::is_quit_event(&event) {
        if app.is_awaiting_quit_confirmation() {
            info!("User confirmed quit");
            app.quit();
        } else {
            info!("User requested quit (awaiting confirmation)");
            app.request_quit();
        }
        return;
    }

    // Toute autre touche annule la confirmation
    app.cancel_quit();

    if events::is_tab_event(&event) {
        app.next_screen();
        return;
    }

    match app.current_screen {
        Screen::Dashboard => {
            if events::is_exchange_event(&event) {
                app.next_exchange();
            } else if events::is_symbol_event(&event) {
                app.start_input(InputField::Symbol);
            } else if events::is_enter_event(&event) {
                app.submit_ticker();
            } else if events::is_auto_refresh_event(&event) {
                app.toggle_ticker_auto_refresh();
            }
        }
        Screen::Historical => {
            if events::is_exchange_event(&event) {
                app.next_exchange();
            } else if events::is_symbol_event(&event) {
                app.start_input(InputField::Symbol);
            } else if events::is_limit_event(&event) {
                app.start_input(InputField::Limit);
            } else if events::is_next_timeframe_event(&event) {
                app.next_timeframe();
            } else if events::is_previous_timeframe_event(&event) {
                app.previous_timeframe();
            } else if events::is_enter_event(&event) {
                app.submit_historical();
            }
        }
        Screen::Exchanges => {
            if events::is_refresh_event(&event) {
                info!("User refreshed exchanges");
                app.refresh_exchanges();
            }
        }
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================
// IMPORTANT : Toujours restaurer le terminal avant de quitter !
// ============================================================================

/// Configure le terminal en mode TUI (raw mode + alternate screen)
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

/// Restaure le terminal à son état normal
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;

    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;

    terminal.show_cursor()?;

    Ok(())
}
