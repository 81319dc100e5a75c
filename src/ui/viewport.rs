//! Module viewport rendering: loading indicator, live module, inline error.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::config::duration::format_duration;
use crate::loader::{LoadingIndicator, Viewport};

/// Spinner frames, advanced by elapsed time.
const SPINNER: [char; 8] = ['⣾', '⣽', '⣻', '⢿', '⡿', '⣟', '⣯', '⣷'];

/// Render whatever the viewport holds. The catalog is drawn elsewhere.
pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    match app.viewport().clone() {
        Viewport::Catalog => {}
        Viewport::Loading(indicator) => render_loading(frame, app, &indicator, area),
        Viewport::Module { id } => {
            if !app.render_module(frame, area) {
                render_error(frame, app, &id, "Module is not available", area);
            }
        }
        Viewport::Error { id, message } => render_error(frame, app, &id, &message, area),
    }
}

fn render_loading(frame: &mut Frame, app: &App, indicator: &LoadingIndicator, area: Rect) {
    let elapsed = indicator.shown_at.elapsed();
    let spinner = SPINNER[(elapsed.as_millis() / 100) as usize % SPINNER.len()];

    let lines = vec![
        Line::from(vec![
            Span::styled(format!("{} ", spinner), Style::default().fg(app.theme.loading)),
            Span::raw(format!("{} ", indicator.icon)),
            Span::styled(
                indicator.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::styled(
            format!("loading {}", format_duration(elapsed)),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));
    frame.render_widget(block, area);

    let [_, middle, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(2),
        Constraint::Fill(1),
    ])
    .areas(area);
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), middle);
}

fn render_error(frame: &mut Frame, app: &App, id: &str, message: &str, area: Rect) {
    let name = app
        .loader()
        .catalog()
        .by_id(id)
        .map(|d| d.display_name.as_str())
        .unwrap_or(id);

    let lines = vec![
        Line::styled(format!("{} could not be loaded", name), app.theme.error_style()),
        Line::from(""),
        Line::from(message.to_string()),
        Line::from(""),
        Line::styled(
            "Esc: back to catalog",
            Style::default().add_modifier(Modifier::DIM),
        ),
    ];

    let block = Block::default()
        .title(" Error ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.error));

    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: true }).block(block),
        area,
    );
}
