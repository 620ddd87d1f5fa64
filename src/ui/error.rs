//! Error overlay drawn on top of the plate.
//!
//! Failures that do not end the session (a refused start, a bad analysis
//! window) are shown in a red box with centered white text until the next key.

use ratatui::{
    prelude::*,
    widgets::{Clear, Paragraph, Wrap},
};

const ERROR_BG: Color = Color::Rgb(255, 0, 0);
const ERROR_FG: Color = Color::Rgb(255, 255, 255);

pub struct ErrorOverlay<'a> {
    message: &'a str,
}

impl<'a> ErrorOverlay<'a> {
    pub fn new(message: &'a str) -> Self {
        Self { message }
    }

    /// Box 80% as wide as `area`, tall enough for the wrapped message plus
    /// padding, centered vertically.
    fn placement(&self, area: Rect) -> Rect {
        let width = (area.width * 4 / 5).max(area.width.min(10));
        let text_width = usize::from(width.saturating_sub(2).max(1));
        let lines = self.message.chars().count().div_ceil(text_width).max(1);
        let height = (lines as u16).saturating_add(2).min(area.height);

        Rect {
            x: area.x + (area.width - width) / 2,
            y: area.y + (area.height - height) / 2,
            width,
            height,
        }
    }
}

impl Widget for ErrorOverlay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        let target = self.placement(area);
        Clear.render(target, buf);
        buf.set_style(target, Style::default().bg(ERROR_BG));

        let inner = Rect {
            x: target.x + 1,
            y: target.y + 1,
            width: target.width.saturating_sub(2),
            height: target.height.saturating_sub(2),
        };
        Paragraph::new(self.message)
            .style(Style::default().fg(ERROR_FG).bg(ERROR_BG))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_is_centered_and_red() {
        let area = Rect::new(0, 0, 50, 20);
        let mut buf = Buffer::empty(area);
        ErrorOverlay::new("window too small").render(area, &mut buf);

        // 40 wide, one text line plus padding
        assert_eq!(buf[(5, 9)].bg, ERROR_BG);
        assert_eq!(buf[(44, 10)].bg, ERROR_BG);
        assert_eq!(buf[(4, 9)].bg, Color::Reset);
        assert_eq!(buf[(20, 7)].bg, Color::Reset);

        let row: String = (0..50).map(|x| buf[(x, 9)].symbol().to_string()).collect();
        assert!(row.contains("window too small"));
    }

    #[test]
    fn test_long_message_grows_box() {
        let overlay = ErrorOverlay::new("analysis window of 256 samples yields 128 bins, at least 201 are needed");
        let placed = overlay.placement(Rect::new(0, 0, 30, 20));
        assert_eq!(placed.width, 24);
        assert!(placed.height > 3);
    }
}
