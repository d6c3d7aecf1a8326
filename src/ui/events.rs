// ============================================================================
// Gestion des événements
// ============================================================================
// Gère les événements clavier et les ticks de l'application
//
// CONCEPTS RUST :
// 1. Enums avec variants : représenter différents types d'événements
// 2. Polling avec timeout : la boucle se réveille même sans touche pressée
// 3. Error handling avec Result
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Intervalle de rafraîchissement de l'écran sans événement
pub const DEFAULT_TICK_RATE: Duration = Duration::from_millis(250);

/// Événements de l'application
#[derive(Debug, Clone)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Tick régulier (redessine les données arrivées en tâche de fond)
    Tick,
}

// ============================================================================
// Structure EventHandler
// ============================================================================

/// Gestionnaire d'événements
#[derive(Debug, Clone)]
pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    /// Crée un gestionnaire avec le tick par défaut (250ms)
    pub fn new() -> Self {
        Self::with_tick_rate(DEFAULT_TICK_RATE)
    }

    pub fn with_tick_rate(tick_rate: Duration) -> Self {
        Self { tick_rate }
    }

    /// Lit le prochain événement (bloquant avec timeout)
    ///
    /// CONCEPT : Non-blocking I/O avec timeout
    /// - poll(timeout) attend au plus tick_rate
    /// - Si pas d'événement, retourne Ok(Event::Tick)
    pub fn next(&self) -> Result<Event> {
        if !event::poll(self.tick_rate)? {
            return Ok(Event::Tick);
        }

        match event::read()? {
            // Sur certains OS, on reçoit Press ET Release : on ne garde que Press
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(Event::Key(key)),
            _ => Ok(Event::Tick),
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Helpers : Convertir KeyEvent en action
// ============================================================================

/// Vrai si l'événement est une touche dont le code satisfait `predicate`
///
/// CONCEPT RUST : Fonction générique avec closure
/// - Tous les helpers is_*_event partagent ce squelette
fn key_matches(event: &Event, predicate: impl Fn(KeyCode) -> bool) -> bool {
    match event {
        Event::Key(key) => predicate(key.code),
        Event::Tick => false,
    }
}

/// 'q' : quitter (deux pressions)
pub fn is_quit_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::Char('q') | KeyCode::Char('Q')))
}

/// Ctrl+C : sortie immédiate
pub fn is_interrupt_event(event: &Event) -> bool {
    match event {
        Event::Key(key) => {
            key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
        }
        Event::Tick => false,
    }
}

/// Tab : écran suivant
pub fn is_tab_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::Tab))
}

pub fn is_escape_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::Esc))
}

pub fn is_enter_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::Enter))
}

pub fn is_backspace_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::Backspace))
}

/// 'e' : exchange suivant
pub fn is_exchange_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::Char('e') | KeyCode::Char('E')))
}

/// 's' : éditer le symbole
pub fn is_symbol_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::Char('s') | KeyCode::Char('S')))
}

/// 'n' : éditer le nombre de chandelles
pub fn is_limit_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::Char('n') | KeyCode::Char('N')))
}

/// 'l' ou → : granularité suivante
pub fn is_next_timeframe_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::Char('l') | KeyCode::Right))
}

/// 'h' ou ← : granularité précédente
pub fn is_previous_timeframe_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::Char('h') | KeyCode::Left))
}

/// 'a' : bascule l'auto-refresh
pub fn is_auto_refresh_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::Char('a') | KeyCode::Char('A')))
}

/// 'r' : rafraîchir
pub fn is_refresh_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::Char('r') | KeyCode::Char('R')))
}

/// Caractère accepté en saisie (symbole "BTC/USDT" ou nombre)
pub fn is_input_char_event(event: &Event) -> bool {
    key_matches(event, |code| {
        matches!(code, KeyCode::Char(c) if c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '.' | ':'))
    })
}

/// Extrait le caractère d'un événement clavier si c'est un caractère
pub fn get_char_from_event(event: &Event) -> Option<char> {
    match event {
        Event::Key(KeyEvent { code: KeyCode::Char(c), .. }) => Some(*c),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::empty()))
    }

    #[test]
    fn test_is_quit_event() {
        assert!(is_quit_event(&key(KeyCode::Char('q'))));
        assert!(!is_quit_event(&key(KeyCode::Char('a'))));
        assert!(!is_quit_event(&Event::Tick));
    }

    #[test]
    fn test_interrupt_requires_control() {
        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(is_interrupt_event(&ctrl_c));
        assert!(!is_interrupt_event(&key(KeyCode::Char('c'))));
    }

    #[test]
    fn test_timeframe_keys() {
        assert!(is_next_timeframe_event(&key(KeyCode::Char('l'))));
        assert!(is_next_timeframe_event(&key(KeyCode::Right)));
        assert!(is_previous_timeframe_event(&key(KeyCode::Char('h'))));
        assert!(!is_previous_timeframe_event(&key(KeyCode::Char('l'))));
    }

    #[test]
    fn test_input_chars() {
        assert!(is_input_char_event(&key(KeyCode::Char('/'))));
        assert!(is_input_char_event(&key(KeyCode::Char('7'))));
        assert!(!is_input_char_event(&key(KeyCode::Char(' '))));
        assert_eq!(get_char_from_event(&key(KeyCode::Char('b'))), Some('b'));
        assert_eq!(get_char_from_event(&key(KeyCode::Enter)), None);
    }
}
