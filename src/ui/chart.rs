// ============================================================================
// Chart - Écran historique
// ============================================================================
// Formulaire (exchange, paire, granularité, nombre de chandelles) et
// graphique ligne des prix de clôture
//
// CONCEPTS RATATUI :
// 1. Chart widget : graphique ligne
// 2. Dataset : série de données à afficher
// 3. Axis : configuration des axes X et Y
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::app::App;
use crate::models::HistoricalData;
use crate::ui::dashboard::{field_value, status_line};

/// Dessine l'écran historique
pub fn render_historical(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Formulaire
            Constraint::Length(3), // Résumé
            Constraint::Min(0),    // Graphique
        ])
        .split(area)
        .to_vec();

    render_form(frame, app, chunks[0]);

    let state = app.historical.snapshot();
    render_summary(frame, &state, chunks[1]);

    match &state.data {
        Some(data) if !data.is_empty() => render_chart_graph(frame, data, chunks[2]),
        Some(_) => render_no_data(frame, chunks[2], "No candles returned"),
        None => render_no_data(frame, chunks[2], "Press [Enter] to load historical data"),
    }
}

fn render_form(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Query ");

    let line = Line::from(vec![
        Span::raw("Exchange: "),
        field_value(&app.exchange),
        Span::raw("   Symbol: "),
        field_value(&app.symbol),
        Span::raw("   Timeframe: "),
        Span::styled(
            format!("{} ({})", app.timeframe.label(), app.timeframe.description()),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw("   Limit: "),
        field_value(&app.limit.to_string()),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}

/// Résumé de la série : état, bornes, variation totale
fn render_summary(frame: &mut Frame, state: &crate::refresh::ViewState<HistoricalData>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let mut spans = status_line(state).spans;

    if let Some(data) = &state.data {
        if let (Some(min), Some(max), Some(change)) =
            (data.min_price(), data.max_price(), data.total_change_percent())
        {
            let color = if change >= 0.0 { Color::Green } else { Color::Red };
            let arrow = if change >= 0.0 { "▲" } else { "▼" };

            spans.extend([
                Span::raw(format!("   {} candles   Low ${:.2}   High ${:.2}   ", data.len(), min, max)),
                Span::styled(format!("{} {:+.2}%", arrow, change), Style::default().fg(color)),
            ]);
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

// ============================================================================
// Graphique principal
// ============================================================================

/// Dessine le graphique ligne des clôtures
///
/// CONCEPT RUST : Iterator chaining
/// - .iter().enumerate().map() : chandelles → points (x, y)
fn render_chart_graph(frame: &mut Frame, data: &HistoricalData, area: Rect) {
    let points: Vec<(f64, f64)> = data
        .data
        .iter()
        .enumerate()
        .map(|(i, candle)| (i as f64, candle.close))
        .collect();

    let (min_price, max_price) = points.iter().fold(
        (f64::MAX, f64::MIN),
        |(min, max), &(_x, y)| (min.min(y), max.max(y)),
    );

    // Marge de 5% ; une série plate garde une hauteur non nulle
    let margin = ((max_price - min_price) * 0.05).max(1.0);
    let y_min = (min_price - margin).max(0.0);
    let y_max = max_price + margin;

    let color = match data.total_change_percent() {
        Some(change) if change < 0.0 => Color::Red,
        _ => Color::Green,
    };

    let datasets = vec![Dataset::default()
        .name(data.symbol.as_str())
        .marker(symbols::Marker::Dot)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&points)];

    let first = data.data.first().map(|c| c.timestamp.format("%m-%d %H:%M").to_string());
    let last = data.last().map(|c| c.timestamp.format("%m-%d %H:%M").to_string());

    let x_axis = Axis::default()
        .title(data.timeframe.label())
        .style(Style::default().fg(Color::Gray))
        .bounds([0.0, points.len().saturating_sub(1).max(1) as f64])
        .labels(vec![
            Span::raw(first.unwrap_or_default()),
            Span::raw(last.unwrap_or_default()),
        ]);

    let y_axis = Axis::default()
        .title("Price")
        .style(Style::default().fg(Color::Gray))
        .bounds([y_min, y_max])
        .labels(vec![
            Span::raw(format!("{:.0}", y_min)),
            Span::raw(format!("{:.0}", (y_min + y_max) / 2.0)),
            Span::raw(format!("{:.0}", y_max)),
        ]);

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(
                    " 📈 {} on {} - {} ",
                    data.symbol,
                    data.exchange,
                    data.timeframe.description()
                )),
        )
        .x_axis(x_axis)
        .y_axis(y_axis);

    frame.render_widget(chart, area);
}

/// Affiche un message à la place du graphique
fn render_no_data(frame: &mut Frame, area: Rect, message: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(Color::Gray))),
    ];

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}
