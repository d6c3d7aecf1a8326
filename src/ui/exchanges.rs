// ============================================================================
// Exchanges - Liste des exchanges supportés
// ============================================================================

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::app::App;
use crate::models::ExchangeList;
use crate::ui::dashboard::status_line;

/// Dessine la table des exchanges
///
/// L'exchange sélectionné dans les formulaires est mis en évidence.
pub fn render_exchanges(frame: &mut Frame, app: &App, area: Rect) {
    let state = app.exchanges.snapshot();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area)
        .to_vec();

    let status = Paragraph::new(status_line(&state)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(status, chunks[0]);

    let header = Row::new(vec!["ID", "Name", "Status", "Countries"]).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = state
        .data
        .as_ref()
        .map(|list| list.exchanges.as_slice())
        .unwrap_or_default()
        .iter()
        .map(|exchange| {
            let (status, color) = if exchange.enabled {
                ("● active", Color::Green)
            } else {
                ("○ disabled", Color::Gray)
            };

            let mut row = Row::new(vec![
                Cell::from(exchange.id.clone()),
                Cell::from(exchange.name.clone()),
                Cell::from(status).style(Style::default().fg(color)),
                Cell::from(exchange.countries_label()),
            ]);

            if exchange.id == app.exchange {
                row = row.style(Style::default().add_modifier(Modifier::REVERSED));
            }
            row
        })
        .collect();

    let title = table_title(state.data.as_ref(), &app.exchange);
    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(20),
            Constraint::Length(12),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title),
    );

    frame.render_widget(table, chunks[1]);
}

/// Titre de la table : nombre d'exchanges et nom de l'exchange sélectionné
fn table_title(list: Option<&ExchangeList>, selected: &str) -> String {
    let Some(list) = list else {
        return " 🏦 Exchanges ".to_string();
    };

    match list.find(selected) {
        Some(exchange) => format!(" 🏦 Exchanges ({}) · {} ", list.len(), exchange.name),
        None => format!(" 🏦 Exchanges ({}) ", list.len()),
    }
}
