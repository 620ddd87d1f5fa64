//! Terminal front-end for the Chladni visualizer.
//!
//! The off-screen raster is shown with upper-half-block glyphs: every terminal
//! cell carries two vertically stacked pixels, the top one as foreground and
//! the bottom one as background color.

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    text::{Line, Span},
    widgets::Paragraph,
};
use std::io::{self, Stdout};
use std::time::Duration;

use super::error::ErrorOverlay;
use crate::playback::PlaybackState;
use crate::visualization::{ModalParams, Raster, Rgb, Surface};

const HALF_BLOCK: &str = "▀";
const FOOTER_FG: Color = Color::Rgb(185, 207, 212);

/// User input command while visualizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    /// No key pressed, or a key without a binding
    Continue,
    /// Start the test tone ('t')
    StartTone,
    /// Start the loaded file ('f')
    StartFile,
    /// Stop playback (Space or 'p')
    Pause,
    /// Smaller analysis window ('[')
    PreviousFftSize,
    /// Larger analysis window (']')
    NextFftSize,
    /// Exit (Escape, 'q' or Ctrl+C)
    Quit,
}

/// Maps a key press to a command.
pub fn command_for_key(key: KeyEvent) -> UiCommand {
    if key.kind != KeyEventKind::Press {
        return UiCommand::Continue;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => UiCommand::Quit,
        KeyCode::Char('q') | KeyCode::Esc => UiCommand::Quit,
        KeyCode::Char('t') => UiCommand::StartTone,
        KeyCode::Char('f') => UiCommand::StartFile,
        KeyCode::Char(' ') | KeyCode::Char('p') => UiCommand::Pause,
        KeyCode::Char('[') => UiCommand::PreviousFftSize,
        KeyCode::Char(']') => UiCommand::NextFftSize,
        _ => UiCommand::Continue,
    }
}

/// What the footer reports about the session.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    pub state: PlaybackState,
    pub source: Option<String>,
    pub params: Option<ModalParams>,
    pub fft_size: usize,
    /// Whether a file is loaded and can be started with 'f'
    pub file_loaded: bool,
}

impl StatusLine {
    fn line(&self) -> Line<'static> {
        let indicator = match self.state {
            PlaybackState::Playing => Span::styled("▶ ", Style::default().fg(Color::Green)),
            PlaybackState::Stopped => Span::styled("■ ", Style::default().fg(Color::Yellow)),
        };
        let source = self.source.clone().unwrap_or_else(|| "no source".to_string());
        let modes = self
            .params
            .map_or_else(|| "m=- n=-".to_string(), |p| format!("m={} n={}", p.m, p.n));
        let file_key = if self.file_loaded { "f file  " } else { "" };

        Line::from(vec![
            indicator,
            Span::raw(format!("{} / {} / {} / fft {}", self.state, source, modes, self.fft_size)),
            Span::styled(
                format!("   t tone  {file_key}space stop  [ ] window  q quit"),
                Style::default().fg(Color::DarkGray),
            ),
        ])
    }
}

/// Largest area inside `area` showing a `raster_width` x `raster_height`
/// raster at its own aspect ratio, centered. Each cell holds two pixel rows.
pub fn fit_area(raster_width: u32, raster_height: u32, area: Rect) -> Rect {
    if raster_width == 0 || raster_height == 0 || area.width == 0 || area.height == 0 {
        return Rect::new(area.x, area.y, 0, 0);
    }

    let scale = (f64::from(area.width) / f64::from(raster_width))
        .min(f64::from(area.height) * 2.0 / f64::from(raster_height));
    let width = ((f64::from(raster_width) * scale).round() as u16).clamp(1, area.width);
    let height = ((f64::from(raster_height) * scale / 2.0).round() as u16).clamp(1, area.height);

    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Widget drawing a raster by area-averaging it into half-block cells.
pub struct PlateView<'a> {
    raster: &'a Raster,
}

impl<'a> PlateView<'a> {
    pub fn new(raster: &'a Raster) -> Self {
        Self { raster }
    }
}

impl Widget for PlateView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (raster_w, raster_h) = (self.raster.width(), self.raster.height());
        let target = fit_area(raster_w, raster_h, area);
        if target.is_empty() {
            return;
        }

        let cols = u64::from(target.width);
        let pixel_rows = u64::from(target.height) * 2;
        let span = |index: u64, parts: u64, total: u32| -> (u32, u32) {
            let start = (index * u64::from(total) / parts) as u32;
            let end = ((index + 1) * u64::from(total) / parts) as u32;
            (start, end.max(start + 1))
        };

        for cy in 0..target.height {
            let (top_y0, top_y1) = span(u64::from(cy) * 2, pixel_rows, raster_h);
            let (bot_y0, bot_y1) = span(u64::from(cy) * 2 + 1, pixel_rows, raster_h);
            for cx in 0..target.width {
                let (x0, x1) = span(u64::from(cx), cols, raster_w);
                let top = self.raster.average(x0, top_y0, x1, top_y1);
                let bottom = self.raster.average(x0, bot_y0, x1, bot_y1);
                if let Some(cell) = buf.cell_mut((target.x + cx, target.y + cy)) {
                    cell.set_symbol(HALF_BLOCK)
                        .set_fg(to_color(top))
                        .set_bg(to_color(bottom));
                }
            }
        }
    }
}

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// Terminal session showing the plate and a one-line footer.
pub struct ChladniTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl ChladniTui {
    /// Creates a new TUI instance and enters alternate screen mode.
    ///
    /// # Errors
    /// - If raw mode cannot be enabled
    /// - If alternate screen cannot be entered
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.hide_cursor()?;

        Ok(Self { terminal })
    }

    /// Draws the raster, the footer and, when present, an error message.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn draw(
        &mut self,
        raster: &Raster,
        status: &StatusLine,
        error: Option<&str>,
    ) -> anyhow::Result<()> {
        self.terminal.draw(|frame| {
            let [plate_area, footer_area] =
                Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());

            frame.render_widget(PlateView::new(raster), plate_area);

            let footer = Paragraph::new(status.line())
                .style(Style::default().fg(FOOTER_FG).bg(Color::Rgb(0, 0, 0)));
            frame.render_widget(footer, footer_area);

            if let Some(message) = error {
                frame.render_widget(ErrorOverlay::new(message), plate_area);
            }
        })?;
        Ok(())
    }

    /// Waits up to `timeout` for a key press and returns its command.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self, timeout: Duration) -> anyhow::Result<UiCommand> {
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                let command = command_for_key(key);
                if command != UiCommand::Continue {
                    tracing::debug!("Key {:?}: {:?}", key.code, command);
                }
                return Ok(command);
            }
        }
        Ok(UiCommand::Continue)
    }

    /// Cleans up terminal state and exits alternate screen mode.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    /// - If cursor cannot be shown
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(command_for_key(key(KeyCode::Char('t'))), UiCommand::StartTone);
        assert_eq!(command_for_key(key(KeyCode::Char('f'))), UiCommand::StartFile);
        assert_eq!(command_for_key(key(KeyCode::Char(' '))), UiCommand::Pause);
        assert_eq!(command_for_key(key(KeyCode::Char('p'))), UiCommand::Pause);
        assert_eq!(command_for_key(key(KeyCode::Char('['))), UiCommand::PreviousFftSize);
        assert_eq!(command_for_key(key(KeyCode::Char(']'))), UiCommand::NextFftSize);
        assert_eq!(command_for_key(key(KeyCode::Esc)), UiCommand::Quit);
        assert_eq!(command_for_key(key(KeyCode::Char('x'))), UiCommand::Continue);
        assert_eq!(
            command_for_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            UiCommand::Quit
        );
    }

    #[test]
    fn test_key_release_is_ignored() {
        let mut release = key(KeyCode::Char('q'));
        release.kind = KeyEventKind::Release;
        assert_eq!(command_for_key(release), UiCommand::Continue);
    }

    #[test]
    fn test_fit_area_keeps_portrait_aspect() {
        let fitted = fit_area(600, 1064, Rect::new(0, 0, 80, 24));
        assert_eq!(fitted, Rect::new(26, 0, 27, 24));
    }

    #[test]
    fn test_fit_area_degenerate() {
        assert!(fit_area(600, 1064, Rect::new(3, 4, 0, 10)).is_empty());
        assert!(fit_area(0, 10, Rect::new(0, 0, 10, 10)).is_empty());
    }

    #[test]
    fn test_plate_view_stacks_two_rows_per_cell() {
        let mut raster = Raster::new(2, 4);
        let colors = [Rgb(255, 0, 0), Rgb(0, 0, 255), Rgb(0, 255, 0), Rgb(255, 255, 255)];
        for (row, color) in colors.iter().enumerate() {
            raster.fill_rect(0.0, row as f64, 2.0, 1.0, *color);
        }

        let area = Rect::new(0, 0, 2, 2);
        let mut buf = Buffer::empty(area);
        PlateView::new(&raster).render(area, &mut buf);

        let top = &buf[(0, 0)];
        assert_eq!(top.symbol(), HALF_BLOCK);
        assert_eq!(top.fg, Color::Rgb(255, 0, 0));
        assert_eq!(top.bg, Color::Rgb(0, 0, 255));

        let bottom = &buf[(1, 1)];
        assert_eq!(bottom.fg, Color::Rgb(0, 255, 0));
        assert_eq!(bottom.bg, Color::Rgb(255, 255, 255));
    }

    #[test]
    fn test_plate_view_averages_pixels() {
        let mut raster = Raster::new(4, 2);
        raster.fill_rect(1.0, 0.0, 1.0, 1.0, Rgb(200, 100, 50));

        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        PlateView::new(&raster).render(area, &mut buf);

        assert_eq!(buf[(0, 0)].fg, Color::Rgb(100, 50, 25));
        assert_eq!(buf[(0, 0)].bg, Color::Rgb(0, 0, 0));
    }

    #[test]
    fn test_status_line_text() {
        let status = StatusLine {
            state: PlaybackState::Playing,
            source: Some("test tone 440Hz".to_string()),
            params: Some(ModalParams { m: 3, n: 7 }),
            fft_size: 2048,
            file_loaded: false,
        };
        let text: String = status.line().spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.contains("playing / test tone 440Hz / m=3 n=7 / fft 2048"));
        assert!(!text.contains("f file"));
    }
}
