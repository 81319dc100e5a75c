use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::module::{Module, MountPoint};

const TICK: Duration = Duration::from_millis(100);
const MAX_LAPS: usize = 20;

/// A tick-driven stopwatch. Space starts and stops, `l` records a lap,
/// `r` resets.
#[derive(Debug, Default)]
pub struct Stopwatch {
    title: String,
    elapsed: Duration,
    running: bool,
    laps: Vec<Duration>,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn laps(&self) -> &[Duration] {
        &self.laps
    }

    fn lap(&mut self) {
        if self.laps.len() == MAX_LAPS {
            self.laps.remove(0);
        }
        self.laps.push(self.elapsed);
    }
}

impl Module for Stopwatch {
    fn init(&mut self, mount: &mut MountPoint) -> anyhow::Result<()> {
        self.title = mount.title().to_string();
        mount.request_ticks(TICK);
        Ok(())
    }

    fn cleanup(&mut self) -> anyhow::Result<()> {
        self.running = false;
        self.laps.clear();
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(format!(" {} ", self.title))
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::vertical([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(inner);

        let state = if self.running { "running" } else { "stopped" };
        let clock = vec![
            Line::styled(
                format_clock(self.elapsed),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Line::styled(state, Style::default().add_modifier(Modifier::DIM)),
        ];
        frame.render_widget(Paragraph::new(clock).alignment(Alignment::Center), chunks[0]);

        let laps: Vec<ListItem> = self
            .laps
            .iter()
            .enumerate()
            .rev()
            .map(|(i, lap)| ListItem::new(format!("  lap {:>2}  {}", i + 1, format_clock(*lap))))
            .collect();
        frame.render_widget(List::new(laps), chunks[1]);

        frame.render_widget(
            Paragraph::new("space:start/stop  l:lap  r:reset")
                .alignment(Alignment::Center)
                .style(Style::default().add_modifier(Modifier::DIM)),
            chunks[2],
        );
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(' ') => self.running = !self.running,
            KeyCode::Char('l') => self.lap(),
            KeyCode::Char('r') => {
                self.running = false;
                self.elapsed = Duration::ZERO;
                self.laps.clear();
            }
            _ => return false,
        }
        true
    }

    fn tick(&mut self) {
        if self.running {
            self.elapsed += TICK;
        }
    }
}

/// Format as `mm:ss.t`.
fn format_clock(d: Duration) -> String {
    let tenths = d.as_millis() / 100;
    format!("{:02}:{:02}.{}", tenths / 600, (tenths / 10) % 60, tenths % 10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    fn started() -> Stopwatch {
        let mut sw = Stopwatch::new();
        let mut mount = MountPoint::new("stopwatch", "Stopwatch");
        sw.init(&mut mount).unwrap();
        assert_eq!(mount.tick_interval(), Some(TICK));
        sw
    }

    #[test]
    fn test_ticks_only_advance_while_running() {
        let mut sw = started();
        sw.tick();
        assert_eq!(sw.elapsed(), Duration::ZERO);

        sw.handle_key(key(' '));
        for _ in 0..15 {
            sw.tick();
        }
        assert_eq!(sw.elapsed(), Duration::from_millis(1500));

        sw.handle_key(key(' '));
        sw.tick();
        assert_eq!(sw.elapsed(), Duration::from_millis(1500));
    }

    #[test]
    fn test_laps_and_reset() {
        let mut sw = started();
        sw.handle_key(key(' '));
        sw.tick();
        sw.handle_key(key('l'));
        sw.tick();
        sw.handle_key(key('l'));
        assert_eq!(sw.laps(), &[Duration::from_millis(100), Duration::from_millis(200)]);

        sw.handle_key(key('r'));
        assert!(!sw.is_running());
        assert!(sw.laps().is_empty());
        assert_eq!(sw.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(Duration::ZERO), "00:00.0");
        assert_eq!(format_clock(Duration::from_millis(61_500)), "01:01.5");
    }
}
