use super::{nav_line, truncate};
use crate::app::{AddForm, FormField};
use crate::models::{ApplicationStatus, PesticideApplication};
use crate::ui::components::{InputWidget, ProgressBar, SelectWidget};
use crate::ui::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Widget},
};

pub struct WithdrawalsScreen<'a> {
    pub rows: &'a [(&'a PesticideApplication, ApplicationStatus)],
    pub selected_index: usize,
    pub form: Option<&'a AddForm>,
    pub status_message: Option<&'a str>,
}

impl<'a> WithdrawalsScreen<'a> {
    pub fn new(rows: &'a [(&'a PesticideApplication, ApplicationStatus)]) -> Self {
        Self {
            rows,
            selected_index: 0,
            form: None,
            status_message: None,
        }
    }

    pub fn with_selection(mut self, index: usize) -> Self {
        self.selected_index = index;
        self
    }

    pub fn with_form(mut self, form: Option<&'a AddForm>) -> Self {
        self.form = form;
        self
    }

    pub fn with_status(mut self, status: Option<&'a str>) -> Self {
        self.status_message = status;
        self
    }
}

impl Widget for WithdrawalsScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(10),   // Table
                Constraint::Length(1), // Status message
                Constraint::Length(1), // Nav
            ])
            .split(area);

        self.render_header(chunks[0], buf);
        self.render_table(chunks[1], buf);

        if let Some(msg) = self.status_message {
            Paragraph::new(Span::styled(msg, Theme::dim())).render(chunks[2], buf);
        }

        let nav = if self.form.is_some() {
            nav_line(&[
                ("[Tab]", "Next field"),
                ("[←→]", "Product"),
                ("[Enter]", "Save"),
                ("[Esc]", "Cancel"),
            ])
        } else {
            nav_line(&[
                ("[a]", "Add"),
                ("[d]", "Delete"),
                ("[↑↓]", "Navigate"),
                ("[Esc]", "Back"),
            ])
        };
        Paragraph::new(nav).render(chunks[3], buf);

        if let Some(form) = self.form {
            render_form(form, centered(area, 60, 16), buf);
        }
    }
}

impl WithdrawalsScreen<'_> {
    fn render_header(&self, area: Rect, buf: &mut Buffer) {
        let active = self.rows.iter().filter(|(_, s)| !s.is_safe).count();

        let block = Block::default()
            .title(Span::styled("Withdrawal Periods", Theme::title()))
            .borders(Borders::BOTTOM)
            .border_style(Theme::border());

        let info = Line::from(vec![
            Span::styled(format!("{} applications", self.rows.len()), Theme::dim()),
            Span::styled(format!(" ({} active)", active), Theme::dim()),
        ]);

        Paragraph::new(info).block(block).render(area, buf);
    }

    fn render_table(&self, area: Rect, buf: &mut Buffer) {
        let header_cells = ["Applied", "Product", "Days", "Safe On", "Status", "Progress", "Notes"]
            .iter()
            .map(|h| Cell::from(*h).style(Theme::header()));

        let header = Row::new(header_cells).height(1);

        let rows: Vec<Row> = self
            .rows
            .iter()
            .map(|(app, status)| {
                let status_style = Style::default().fg(Theme::withdrawal_color(status));
                let bar_style = if status.is_safe {
                    Theme::dim()
                } else {
                    status_style
                };

                Row::new(vec![
                    Cell::from(app.applied_date.format("%Y-%m-%d").to_string()),
                    Cell::from(truncate(&app.product_name, 20)),
                    Cell::from(app.withdrawal_days.to_string()),
                    Cell::from(app.safe_date.format("%Y-%m-%d").to_string()),
                    Cell::from(status.label()).style(status_style),
                    Cell::from(ProgressBar::text(status.bar_ratio(), 10)).style(bar_style),
                    Cell::from(truncate(app.display_notes(), 30)),
                ])
                .style(Theme::normal())
            })
            .collect();

        let widths = [
            Constraint::Length(12),
            Constraint::Length(20),
            Constraint::Length(5),
            Constraint::Length(12),
            Constraint::Length(13),
            Constraint::Length(12),
            Constraint::Min(10),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Theme::border()),
            )
            .row_highlight_style(Theme::selected());

        let mut state = TableState::default();
        if !self.rows.is_empty() {
            state.select(Some(self.selected_index));
        }

        ratatui::widgets::StatefulWidget::render(table, area, buf, &mut state);
    }
}

fn render_form(form: &AddForm, area: Rect, buf: &mut Buffer) {
    Clear.render(area, buf);

    let block = Block::default()
        .title(Span::styled("Log Application", Theme::title()))
        .borders(Borders::ALL)
        .border_style(Theme::border_focused());

    let inner = block.inner(area);
    block.render(area, buf);

    let fields = form.fields();
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();
    let slots = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (field, slot) in fields.iter().zip(slots.iter()) {
        let focused = form.focused == *field;
        match field {
            FormField::Product => {
                SelectWidget::new(field.label(), &form.options, form.product_index)
                    .focused(focused)
                    .render(*slot, buf);
            }
            FormField::CustomName => {
                InputWidget::new(field.label(), &form.custom_name)
                    .placeholder("required")
                    .focused(focused)
                    .render(*slot, buf);
            }
            FormField::Days => {
                InputWidget::new(field.label(), &form.days)
                    .focused(focused)
                    .render(*slot, buf);
            }
            FormField::Notes => {
                InputWidget::new(field.label(), &form.notes)
                    .placeholder("optional")
                    .focused(focused)
                    .render(*slot, buf);
            }
        }
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::ProductRegistry;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn buffer_text(buf: &Buffer) -> String {
        let area = buf.area;
        let mut out = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn application(product: &str, safe_day: u32) -> PesticideApplication {
        PesticideApplication {
            id: Uuid::new_v4(),
            product_name: product.into(),
            withdrawal_days: 5,
            applied_date: NaiveDate::from_ymd_opt(2024, 8, 1).unwrap(),
            safe_date: NaiveDate::from_ymd_opt(2024, 8, safe_day).unwrap(),
            notes: Some("Block B".into()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn table_shows_countdown_and_safe_rows() {
        let pending = application("Mancozeb", 6);
        let cleared = application("Neem Oil", 4);
        let rows = [
            (
                &pending,
                ApplicationStatus {
                    days_remaining: 1,
                    is_safe: false,
                    progress: 0.2,
                },
            ),
            (
                &cleared,
                ApplicationStatus {
                    days_remaining: -1,
                    is_safe: true,
                    progress: 0.0,
                },
            ),
        ];
        let area = Rect::new(0, 0, 120, 20);
        let mut buf = Buffer::empty(area);
        WithdrawalsScreen::new(&rows).render(area, &mut buf);

        let text = buffer_text(&buf);
        assert!(text.contains("2 applications (1 active)"));
        assert!(text.contains("1 day left"));
        assert!(text.contains("SAFE NOW"));
        assert!(text.contains("Block B"));
    }

    #[test]
    fn form_overlay_renders_fields() {
        let form = AddForm::new(&ProductRegistry::new());
        let area = Rect::new(0, 0, 100, 30);
        let mut buf = Buffer::empty(area);
        WithdrawalsScreen::new(&[])
            .with_form(Some(&form))
            .render(area, &mut buf);

        let text = buffer_text(&buf);
        assert!(text.contains("Log Application"));
        assert!(text.contains("< Carbofuran >"));
        assert!(text.contains("Withdrawal days"));
        assert!(text.contains("[Enter]Save"));
    }

    #[test]
    fn centered_fits_small_areas() {
        let rect = centered(Rect::new(0, 0, 40, 10), 60, 16);
        assert_eq!(rect, Rect::new(0, 0, 40, 10));
    }
}
