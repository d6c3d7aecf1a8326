// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Dessine le cadre commun (onglets, bandeau démo, footer) et l'écran
// Dashboard (stats globales + ticker temps réel)
//
// CONCEPTS RATATUI :
// 1. Frame : surface de dessin
// 2. Widgets : composants UI (Block, Paragraph, Tabs, etc.)
// 3. Layout : découpage de l'espace en zones
// 4. Style : couleurs et attributs de texte
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, Screen};
use crate::models::Ticker;
use crate::refresh::{ViewState, ViewStatus};
use crate::ui::{chart, exchanges};

// ============================================================================
// Fonction principale de rendu
// ============================================================================

/// Dessine l'interface complète
///
/// CONCEPT RUST : Routing avec match sur enum
/// - Le cadre (header, footer) est commun
/// - Le contenu dépend de app.current_screen
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    render_header(frame, app, chunks[0]);

    match app.current_screen {
        Screen::Dashboard => render_dashboard(frame, app, chunks[1]),
        Screen::Historical => chart::render_historical(frame, app, chunks[1]),
        Screen::Exchanges => exchanges::render_exchanges(frame, app, chunks[1]),
    }

    if app.is_in_input_mode() {
        render_input_footer(frame, app, chunks[2]);
    } else {
        render_footer(frame, app, chunks[2]);
    }
}

// ============================================================================
// Layout : Découpage de l'écran
// ============================================================================

/// Crée le layout principal (header, content, footer)
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header : onglets + bandeau
            Constraint::Min(0),    // Content : tout le reste
            Constraint::Length(4), // Footer : raccourcis ou saisie
        ])
        .split(area)
        .to_vec()
}

// ============================================================================
// Header : onglets et bandeau démo
// ============================================================================

/// Dessine les onglets ; en mode démo, le titre devient un avertissement
///
/// Le bandeau dépend uniquement de DataClient::mode(), jamais du contenu
/// des données affichées.
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let mode = app.mode();

    let (title, border) = if mode.is_mock() {
        (
            Span::styled(
                " ⚠ DEMO MODE : backend unreachable, showing sample data ",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Color::Yellow,
        )
    } else {
        (
            Span::styled(
                " CryptoDash ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Color::Cyan,
        )
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Line::from(title))
        .title_alignment(Alignment::Center);

    let titles: Vec<Line> = Screen::all()
        .iter()
        .map(|screen| Line::from(format!(" {} ", screen.title())))
        .collect();

    let selected = Screen::all()
        .iter()
        .position(|screen| *screen == app.current_screen)
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .block(block)
        .select(selected)
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD)
                .add_modifier(Modifier::REVERSED),
        )
        .divider(Span::raw("|"));

    frame.render_widget(tabs, area);
}

// ============================================================================
// Écran Dashboard
// ============================================================================

fn render_dashboard(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Stats
            Constraint::Length(3), // Formulaire
            Constraint::Min(0),    // Ticker
        ])
        .split(area)
        .to_vec();

    render_stats(frame, app, chunks[0]);
    render_ticker_form(frame, app, chunks[1]);
    render_ticker(frame, app, chunks[2]);
}

/// Barre de statistiques : exchanges, marchés, dernière mise à jour
fn render_stats(frame: &mut Frame, app: &App, area: Rect) {
    let state = app.stats.snapshot();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" 📊 Market Stats ");

    let line = match &state.data {
        Some(stats) => Line::from(vec![
            Span::raw("Exchanges: "),
            Span::styled(
                stats.exchanges.to_string(),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            Span::raw("   Markets: "),
            Span::styled(
                stats.markets_label(),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            Span::raw("   Updated: "),
            Span::styled(
                stats.last_update.format("%H:%M:%S UTC").to_string(),
                Style::default().fg(Color::Gray),
            ),
        ]),
        None => status_line(&state),
    };

    frame.render_widget(Paragraph::new(line).block(block).alignment(Alignment::Center), area);
}

/// Paramètres du ticker (exchange, symbole, auto-refresh)
fn render_ticker_form(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Query ");

    let auto = if app.ticker.is_auto_refresh() {
        Span::styled(
            format!("ON ({}s)", app.ticker.period().as_secs()),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled("OFF", Style::default().fg(Color::Gray))
    };

    let line = Line::from(vec![
        Span::raw("Exchange: "),
        field_value(&app.exchange),
        Span::raw("   Symbol: "),
        field_value(&app.symbol),
        Span::raw("   Auto-refresh: "),
        auto,
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}

/// Panneau du ticker : prix, fourchette, volume
fn render_ticker(frame: &mut Frame, app: &App, area: Rect) {
    let state = app.ticker.snapshot();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" 💹 Ticker ");

    let mut lines = vec![status_line(&state), Line::from("")];

    match &state.data {
        Some(ticker) => lines.extend(ticker_lines(ticker)),
        None => lines.push(Line::from(Span::styled(
            "Press [Enter] to fetch the ticker",
            Style::default().fg(Color::Gray),
        ))),
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn ticker_lines(ticker: &Ticker) -> Vec<Line<'static>> {
    let label = |name: &str| Span::styled(format!("{:<10}", name), Style::default().fg(Color::Gray));

    let mut lines = vec![
        Line::from(vec![
            label("Pair"),
            Span::styled(
                format!("{} on {}", ticker.symbol, ticker.exchange),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            label("Last"),
            Span::styled(
                Ticker::format_price(Some(ticker.last)),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![label("Bid"), Span::raw(Ticker::format_price(ticker.bid))]),
        Line::from(vec![label("Ask"), Span::raw(Ticker::format_price(ticker.ask))]),
        Line::from(vec![label("Spread"), Span::raw(Ticker::format_price(ticker.spread()))]),
        Line::from(vec![label("24h High"), Span::raw(Ticker::format_price(ticker.high))]),
        Line::from(vec![label("24h Low"), Span::raw(Ticker::format_price(ticker.low))]),
        Line::from(vec![label("Volume"), Span::raw(Ticker::format_price(ticker.volume))]),
    ];

    if let Some(position) = ticker.range_position_percent() {
        lines.push(Line::from(vec![
            label("Range"),
            Span::raw(format!("{:.0}% of 24h range", position)),
        ]));
    }

    lines.push(Line::from(vec![
        label("Time"),
        Span::styled(
            ticker.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            Style::default().fg(Color::Gray),
        ),
    ]));

    lines
}

// ============================================================================
// Helpers partagés par les écrans
// ============================================================================

/// Valeur d'un champ de formulaire ("-" si vide)
pub(crate) fn field_value(value: &str) -> Span<'static> {
    if value.is_empty() {
        Span::styled("-", Style::default().fg(Color::Gray))
    } else {
        Span::styled(
            value.to_string(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )
    }
}

/// Ligne d'état d'une vue (chargement, erreur, dernière mise à jour)
pub(crate) fn status_line<T>(state: &ViewState<T>) -> Line<'static> {
    let (text, color) = match state.status {
        ViewStatus::Idle => ("Idle".to_string(), Color::Gray),
        ViewStatus::Loading => ("⟳ Loading...".to_string(), Color::Yellow),
        ViewStatus::Displaying => (
            state
                .last_updated
                .map(|at| format!("Updated {}", at.format("%H:%M:%S")))
                .unwrap_or_else(|| "Ready".to_string()),
            Color::Green,
        ),
        ViewStatus::Failed => (
            format!("✗ {}", state.error.as_deref().unwrap_or("request failed")),
            Color::Red,
        ),
        ViewStatus::Cancelled => ("Cancelled".to_string(), Color::Gray),
    };

    Line::from(Span::styled(text, Style::default().fg(color)))
}

// ============================================================================
// Footer : Instructions
// ============================================================================

/// Dessine le footer avec les raccourcis clavier de l'écran courant
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let key = |k: &'static str| {
        Span::styled(k, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    };

    let shortcuts = if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled(
                "⚠  Appuyez sur ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "[q]",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ])
    } else {
        let mut spans = vec![key("[q]"), Span::raw(" Quit  "), key("[Tab]"), Span::raw(" Screen  ")];
        match app.current_screen {
            Screen::Dashboard => spans.extend([
                key("[e]"),
                Span::raw(" Exchange  "),
                key("[s]"),
                Span::raw(" Symbol  "),
                key("[Enter]"),
                Span::raw(" Fetch  "),
                key("[a]"),
                Span::raw(" Auto-refresh"),
            ]),
            Screen::Historical => spans.extend([
                key("[e]"),
                Span::raw(" Exchange  "),
                key("[s]"),
                Span::raw(" Symbol  "),
                key("[h/l]"),
                Span::raw(" Timeframe  "),
                key("[n]"),
                Span::raw(" Limit  "),
                key("[Enter]"),
                Span::raw(" Fetch"),
            ]),
            Screen::Exchanges => spans.extend([key("[r]"), Span::raw(" Refresh")]),
        }
        Line::from(spans)
    };

    let paragraph = Paragraph::new(vec![shortcuts])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Dessine le footer en mode saisie avec la ligne d'input
fn render_input_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green)); // Vert pour indiquer mode input

    let input_line = Line::from(vec![
        Span::styled(
            app.input_prompt.as_str(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(app.input_buffer.as_str(), Style::default().fg(Color::White)),
        Span::styled(
            "█", // Curseur
            Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK),
        ),
    ]);

    let help_line = Line::from(vec![
        Span::styled("[Enter]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Span::raw(" Confirm  "),
        Span::styled("[ESC]", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Span::raw(" Cancel"),
    ]);

    let paragraph = Paragraph::new(vec![input_line, help_line])
        .block(block)
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Tests
// ============================================================================
