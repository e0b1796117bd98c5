use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::collections::VecDeque;
use std::time::Instant;

/// A visual indicator that shows recent key presses with fade effect
pub struct KeyPressIndicator {
    /// Recent key presses with timestamps
    key_history: VecDeque<(String, Instant)>,
    /// Maximum number of keys to show
    max_keys: usize,
    /// How long before a key starts fading (milliseconds)
    fade_start_ms: u64,
    /// How long the fade takes (milliseconds)
    fade_duration_ms: u64,
    /// Whether the indicator is enabled
    pub enabled: bool,
}

impl KeyPressIndicator {
    pub fn new() -> Self {
        Self {
            key_history: VecDeque::with_capacity(10),
            max_keys: 10,
            fade_start_ms: 500,
            fade_duration_ms: 1500,
            enabled: true,
        }
    }

    /// Enable or disable the indicator
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.key_history.clear();
        }
    }

    /// Record a key press
    pub fn record_key(&mut self, key: String) {
        if !self.enabled {
            return;
        }

        self.key_history.push_back((key, Instant::now()));

        while self.key_history.len() > self.max_keys {
            self.key_history.pop_front();
        }

        // Drop keys that have fully faded
        let fade_complete = self.fade_start_ms + self.fade_duration_ms;
        self.key_history
            .retain(|(_, time)| time.elapsed().as_millis() < fade_complete as u128);
    }

    /// Render the indicator
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        if !self.enabled || self.key_history.is_empty() {
            return;
        }

        let mut spans = Vec::new();

        for (i, (key, time)) in self.key_history.iter().enumerate() {
            let elapsed_ms = time.elapsed().as_millis() as u64;

            let opacity = if elapsed_ms < self.fade_start_ms {
                1.0
            } else if elapsed_ms < self.fade_start_ms + self.fade_duration_ms {
                let fade_progress =
                    (elapsed_ms - self.fade_start_ms) as f32 / self.fade_duration_ms as f32;
                1.0 - fade_progress
            } else {
                0.0
            };

            if opacity > 0.0 {
                let color = self.opacity_to_color(opacity);

                if i > 0 {
                    spans.push(Span::styled(" → ", Style::default().fg(Color::DarkGray)));
                }

                spans.push(Span::styled(
                    key.clone(),
                    Style::default().fg(color).add_modifier(Modifier::ITALIC),
                ));
            }
        }

        if !spans.is_empty() {
            let paragraph = Paragraph::new(Line::from(spans)).block(
                Block::default()
                    .borders(Borders::NONE)
                    .style(Style::default()),
            );
            frame.render_widget(paragraph, area);
        }
    }

    /// Convert opacity (0.0 to 1.0) to a color
    fn opacity_to_color(&self, opacity: f32) -> Color {
        if opacity > 0.7 {
            Color::Cyan
        } else if opacity > 0.4 {
            Color::Gray
        } else {
            Color::DarkGray
        }
    }

    /// Formatted string of the visible keys, for debugging
    pub fn as_line(&self) -> String {
        if !self.enabled || self.key_history.is_empty() {
            return String::new();
        }

        self.key_history
            .iter()
            .map(|(key, _)| key.clone())
            .collect::<Vec<_>>()
            .join(" → ")
    }
}

impl Default for KeyPressIndicator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_format() {
        let mut indicator = KeyPressIndicator::new();
        indicator.record_key("j".to_string());
        indicator.record_key("k".to_string());
        indicator.record_key("Enter".to_string());
        assert_eq!(indicator.as_line(), "j → k → Enter");
    }

    #[test]
    fn test_disabled_indicator_records_nothing() {
        let mut indicator = KeyPressIndicator::new();
        indicator.set_enabled(false);
        indicator.record_key("x".to_string());
        assert!(indicator.as_line().is_empty());
    }

    #[test]
    fn test_history_is_capped() {
        let mut indicator = KeyPressIndicator::new();
        for i in 0..20 {
            indicator.record_key(format!("{}", i));
        }
        assert!(indicator.as_line().split(" → ").count() <= 10);
    }
}
