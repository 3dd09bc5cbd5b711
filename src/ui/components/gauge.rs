use crate::models::ApplicationStatus;
use crate::ui::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Single-line bar: `████░░░░ 60%`.
pub struct ProgressBar {
    ratio: f64,
    color: Color,
    show_percent: bool,
}

impl ProgressBar {
    pub fn new(ratio: f64) -> Self {
        Self {
            ratio: ratio.clamp(0.0, 1.0),
            color: Theme::ACCENT,
            show_percent: true,
        }
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn show_percent(mut self, show: bool) -> Self {
        self.show_percent = show;
        self
    }

    /// Text form for table cells, `width` characters of bar.
    pub fn text(ratio: f64, width: usize) -> String {
        let ratio = ratio.clamp(0.0, 1.0);
        let filled = (width as f64 * ratio).round() as usize;
        format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
    }
}

impl Widget for ProgressBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width < 6 {
            return;
        }

        let label = format!(" {:>3.0}%", self.ratio * 100.0);
        let bar_width = if self.show_percent {
            area.width.saturating_sub(label.chars().count() as u16)
        } else {
            area.width
        };
        let filled = (bar_width as f64 * self.ratio).round() as u16;

        for x in area.x..area.x + bar_width {
            let ch = if x < area.x + filled { '█' } else { '░' };
            buf[(x, area.y)].set_char(ch).set_fg(self.color);
        }

        if self.show_percent {
            let line = Line::from(Span::styled(label, Style::default().fg(self.color)));
            buf.set_line(area.x + bar_width, area.y, &line, area.width - bar_width);
        }
    }
}

/// Boxed countdown for one application: status label over a progress bar.
pub struct WithdrawalGauge<'a> {
    title: &'a str,
    status: ApplicationStatus,
}

impl<'a> WithdrawalGauge<'a> {
    pub fn new(title: &'a str, status: ApplicationStatus) -> Self {
        Self { title, status }
    }
}

impl Widget for WithdrawalGauge<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 3 || area.width < 10 {
            return;
        }

        let block = Block::default()
            .title(self.title)
            .borders(Borders::ALL)
            .border_style(Theme::border());

        let inner = block.inner(area);
        block.render(area, buf);

        let color = Theme::withdrawal_color(&self.status);
        let label = Line::from(Span::styled(self.status.label(), Style::default().fg(color)));
        Paragraph::new(label).render(inner, buf);

        if inner.height >= 2 {
            let bar_area = Rect {
                x: inner.x,
                y: inner.y + 1,
                width: inner.width,
                height: 1,
            };
            ProgressBar::new(self.status.bar_ratio())
                .color(color)
                .show_percent(!self.status.is_safe)
                .render(bar_area, buf);
        }
    }
}
