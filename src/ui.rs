pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, Confirm};
use screen::current_screen;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

/// Styles shared by every screen
pub(crate) struct Palette {
    pub bold: Style,
    pub dim: Style,
    pub italic: Style,
    pub good: Style,
    pub bad: Style,
    pub warn: Style,
    pub focus: Style,
    pub title: Style,
}

impl Palette {
    pub fn new() -> Self {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        Self {
            bold,
            dim: Style::default().add_modifier(Modifier::DIM),
            italic: Style::default().add_modifier(Modifier::ITALIC),
            good: bold.fg(Color::Green),
            bad: bold.fg(Color::Red),
            warn: bold.fg(Color::Yellow),
            focus: bold.fg(Color::Cyan).add_modifier(Modifier::REVERSED),
            title: bold.fg(Color::Magenta),
        }
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([Constraint::Min(0)])
            .split(area)[0];

        current_screen(self.game.phase()).render(self, inner, buf);

        if let Some(confirm) = self.confirm {
            render_confirm(confirm, area, buf);
        }
    }
}

pub fn draw(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

fn render_confirm(confirm: Confirm, area: Rect, buf: &mut Buffer) {
    let prompt = confirm.prompt();
    let width = (prompt.width() as u16 + 4).min(area.width);
    let height = 3.min(area.height);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    Clear.render(popup, buf);
    Paragraph::new(Line::from(Span::styled(prompt, Palette::new().warn)))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL))
        .render(popup, buf);
}

/// Left offset that centres a block of `lines` inside `width` columns
pub(crate) fn block_indent(lines: &[String], width: u16) -> u16 {
    let widest = lines.iter().map(|l| l.width()).max().unwrap_or(0) as u16;
    width.saturating_sub(widest) / 2
}

#[cfg(test)]
pub(crate) fn rendered_text(buffer: &Buffer) -> String {
    let area = buffer.area();
    (0..area.height)
        .map(|y| {
            (0..area.width)
                .map(|x| buffer[(area.x + x, area.y + y)].symbol())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
