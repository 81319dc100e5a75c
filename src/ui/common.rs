//! Common UI components shared across views.
//!
//! This module contains the header bar, category tabs, status bar, and help
//! overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use crate::app::App;
use crate::loader::Viewport;

/// Render the header bar.
///
/// Displays: what is live, the current URL, and the history position.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let (icon, style) = match app.viewport() {
        Viewport::Catalog => ("○", Style::default().add_modifier(Modifier::DIM)),
        Viewport::Loading(_) => ("◌", Style::default().fg(app.theme.loading)),
        Viewport::Module { .. } => ("●", Style::default().fg(app.theme.highlight)),
        Viewport::Error { .. } => ("●", app.theme.error_style()),
    };
    let (position, len) = app.history_position();

    let line = Line::from(vec![
        Span::styled(format!(" {} ", icon), style),
        Span::styled("PLAYDECK ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::raw(app.navigation().current_url().to_string()),
        Span::raw(" │ "),
        Span::styled(
            format!("{}/{}", position, len),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the category tab bar. The first tab shows every category.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let categories: Vec<&str> = app
        .loader()
        .catalog()
        .categories()
        .into_iter()
        .filter(|c| !c.is_empty())
        .collect();

    let mut titles: Vec<Line> = vec![Line::from(" All ")];
    titles.extend(categories.iter().map(|c| Line::from(format!(" {} ", c))));

    let selected = app
        .category
        .as_deref()
        .and_then(|current| categories.iter().position(|c| *c == current))
        .map(|i| i + 1)
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows: breadcrumb trail and the controls for the current viewport.
/// Temporary status messages take precedence.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = match app.viewport() {
        Viewport::Catalog if app.filter_active => "Type to search | Enter:apply Esc:cancel",
        Viewport::Catalog => "/:search Tab:category Enter:open [/]:back/fwd ?:help q:quit",
        Viewport::Loading(_) => "Esc:cancel [:back",
        Viewport::Module { .. } => "Esc:catalog [/]:back/fwd ?:help",
        Viewport::Error { .. } => "Esc:catalog [:back q:quit",
    };

    let status = format!(" {} | {}", app.breadcrumb(), controls);
    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Catalog"),
        Line::from("  ↑/↓ j/k     Navigate list"),
        Line::from("  PgUp/PgDn   Jump 10 items"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from("  Enter       Open module"),
        Line::from("  Tab         Next category"),
        Line::from("  /           Start filter/search"),
        Line::from("  c           Clear filter"),
        Line::from(""),
        section(" Modules"),
        Line::from("  Esc         Back to catalog"),
        Line::from("  [ / ]       History back/forward"),
        Line::from("  Alt+←/→     History back/forward"),
        Line::from(""),
        section(" General"),
        Line::from("  ?           Toggle help"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 24u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    // Clear the area behind the help
    frame.render_widget(ratatui::widgets::Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
