//! Catalog view rendering.
//!
//! A plain table of the browsable modules: glyph, name, category and
//! description, with the selection highlighted.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;

/// Render the catalog list.
pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let modules = app.visible_modules();
    let total = app.loader().catalog().enabled().len();

    // Build title with filter info
    let filter_info = if app.filter_active {
        format!(" /{}_", app.filter_text)
    } else if !app.filter_text.is_empty() {
        format!(" /{}/ [c:clear]", app.filter_text)
    } else {
        String::new()
    };
    let title = format!(" Modules ({}/{}){} ", modules.len(), total, filter_info);

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if modules.is_empty() {
        let message = if total == 0 {
            "The catalog is empty"
        } else {
            "No modules match"
        };
        frame.render_widget(
            Paragraph::new(message)
                .style(Style::default().add_modifier(Modifier::DIM))
                .block(block),
            area,
        );
        app.catalog_offset = 0;
        return;
    }

    let header = Row::new(vec![
        Cell::from(""),
        Cell::from("Module"),
        Cell::from("Category"),
        Cell::from("Description"),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = modules
        .iter()
        .map(|d| {
            Row::new(vec![
                Cell::from(d.icon.clone()),
                Cell::from(d.display_name.clone()),
                Cell::from(d.category.clone()).style(Style::default().add_modifier(Modifier::DIM)),
                Cell::from(d.description.clone()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(2),
        Constraint::Fill(2),
        Constraint::Fill(1),
        Constraint::Fill(4),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default()
        .with_offset(app.catalog_offset)
        .with_selected(Some(app.selected_index.min(modules.len() - 1)));

    frame.render_stateful_widget(table, area, &mut state);
    app.catalog_offset = state.offset();
}
