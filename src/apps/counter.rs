use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::module::{Module, MountPoint};

/// A tally counter. Up/`+` increments, Down/`-` decrements, `0` resets.
#[derive(Debug, Default)]
pub struct Counter {
    title: String,
    value: i64,
    step: i64,
}

impl Counter {
    pub fn new() -> Self {
        Self {
            step: 1,
            ..Self::default()
        }
    }

    pub fn value(&self) -> i64 {
        self.value
    }
}

impl Module for Counter {
    fn init(&mut self, mount: &mut MountPoint) -> anyhow::Result<()> {
        self.title = mount.title().to_string();
        self.value = 0;
        Ok(())
    }

    fn cleanup(&mut self) -> anyhow::Result<()> {
        self.value = 0;
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let lines = vec![
            Line::from(""),
            Line::styled(
                self.value.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Line::from(""),
            Line::styled(
                format!("↑/+ add {0}  ↓/- take {0}  0 reset", self.step),
                Style::default().add_modifier(Modifier::DIM),
            ),
        ];
        let block = Block::default()
            .title(format!(" {} ", self.title))
            .borders(Borders::ALL);
        frame.render_widget(
            Paragraph::new(lines).alignment(Alignment::Center).block(block),
            area,
        );
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Up | KeyCode::Char('+') => self.value = self.value.saturating_add(self.step),
            KeyCode::Down | KeyCode::Char('-') => self.value = self.value.saturating_sub(self.step),
            KeyCode::Char('0') => self.value = 0,
            _ => return false,
        }
        true
    }
}
