use super::{nav_line, truncate};
use crate::config::FarmConfig;
use crate::models::{AlertSummary, ApplicationStatus, FarmStatus, PesticideApplication, RiskAlert};
use crate::ui::components::WithdrawalGauge;
use crate::ui::Theme;
use chrono::NaiveDate;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Widget},
};

pub struct DashboardScreen<'a> {
    pub farm: &'a FarmConfig,
    pub today: NaiveDate,
    pub farm_status: FarmStatus,
    pub summary: AlertSummary,
    pub alerts: &'a [RiskAlert],
    pub upcoming: &'a [(&'a PesticideApplication, ApplicationStatus)],
    pub forecast_source: &'a str,
    pub status_message: Option<&'a str>,
}

impl<'a> DashboardScreen<'a> {
    pub fn new(
        farm: &'a FarmConfig,
        today: NaiveDate,
        farm_status: FarmStatus,
        upcoming: &'a [(&'a PesticideApplication, ApplicationStatus)],
    ) -> Self {
        Self {
            farm,
            today,
            farm_status,
            summary: AlertSummary::default(),
            alerts: &[],
            upcoming,
            forecast_source: "",
            status_message: None,
        }
    }

    pub fn with_alerts(mut self, alerts: &'a [RiskAlert], summary: AlertSummary) -> Self {
        self.alerts = alerts;
        self.summary = summary;
        self
    }

    pub fn with_source(mut self, source: &'a str) -> Self {
        self.forecast_source = source;
        self
    }

    pub fn with_status(mut self, status: Option<&'a str>) -> Self {
        self.status_message = status;
        self
    }
}

impl Widget for DashboardScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Length(5), // Status row
                Constraint::Min(8),    // Clearances and alerts
                Constraint::Length(1), // Status message
                Constraint::Length(1), // Nav bar
            ])
            .split(area);

        self.render_header(chunks[0], buf);

        let status_row = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);

        self.render_farm_status(status_row[0], buf);
        self.render_summary(status_row[1], buf);

        let middle = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[2]);

        self.render_clearances(middle[0], buf);
        self.render_alerts(middle[1], buf);

        self.render_status_message(chunks[3], buf);

        let nav = nav_line(&[
            ("[1]", "Dashboard"),
            ("[2]", "Withdrawals"),
            ("[3]", "Alerts"),
            ("[a]", "Log"),
            ("[r]", "Refresh"),
            ("[q]", "Quit"),
        ]);
        Paragraph::new(nav).render(chunks[4], buf);
    }
}

impl DashboardScreen<'_> {
    fn render_header(&self, area: Rect, buf: &mut Buffer) {
        let title = match &self.farm.crop {
            Some(crop) => format!("CropSafe - {} ({})", self.farm.name, crop),
            None => format!("CropSafe - {}", self.farm.name),
        };

        let block = Block::default()
            .title(Span::styled(title, Theme::title()))
            .borders(Borders::BOTTOM)
            .border_style(Theme::border());

        let mut info = vec![Span::styled(
            self.today.format("%A %d %B %Y").to_string(),
            Theme::dim(),
        )];
        if !self.forecast_source.is_empty() {
            info.push(Span::styled(
                format!("  |  Weather: {}", self.forecast_source),
                Theme::dim(),
            ));
        }

        Paragraph::new(Line::from(info)).block(block).render(area, buf);
    }

    fn render_farm_status(&self, area: Rect, buf: &mut Buffer) {
        let color = self.farm_status.color();
        let block = Block::default()
            .title(Span::styled("Harvest Status", Theme::header()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color));

        let headline = if self.farm_status.is_clear() {
            "SAFE TO HARVEST"
        } else {
            "DO NOT HARVEST"
        };

        let lines = vec![
            Line::from(Span::styled(
                headline,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(self.farm_status.describe(), Theme::normal())),
        ];

        Paragraph::new(lines).block(block).render(area, buf);
    }

    fn render_summary(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(Span::styled("Weather Risk", Theme::header()))
            .borders(Borders::ALL)
            .border_style(Theme::border());

        let lines = if self.summary.is_all_clear() {
            vec![Line::from(Span::styled(
                "No disease or weather risks forecast",
                Theme::success(),
            ))]
        } else {
            vec![
                Line::from(vec![
                    Span::styled(format!("{} high", self.summary.high_count), Theme::error()),
                    Span::styled("  ", Theme::dim()),
                    Span::styled(
                        format!("{} medium", self.summary.medium_count),
                        Theme::warning(),
                    ),
                    Span::styled("  ", Theme::dim()),
                    Span::styled(format!("{} low", self.summary.low_count), Theme::dim()),
                ]),
                Line::from(Span::styled(
                    format!("{} alerts across the forecast", self.summary.total()),
                    Theme::dim(),
                )),
            ]
        };

        Paragraph::new(lines).block(block).render(area, buf);
    }

    fn render_clearances(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(Span::styled("Next Safe Dates", Theme::header()))
            .borders(Borders::ALL)
            .border_style(Theme::border());

        let inner = block.inner(area);
        block.render(area, buf);

        let Some(((next_app, next_status), rest)) = self.upcoming.split_first() else {
            let para = Paragraph::new(Span::styled("No active withdrawal periods", Theme::dim()));
            para.render(inner, buf);
            return;
        };

        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0)])
            .split(inner);

        let title = format!(
            "{} - safe {}",
            truncate(&next_app.product_name, 20),
            next_app.safe_date.format("%d %b")
        );
        WithdrawalGauge::new(&title, *next_status).render(sections[0], buf);

        let items: Vec<ListItem> = rest
            .iter()
            .map(|(app, status)| {
                let color = Theme::withdrawal_color(status);
                ListItem::new(Line::from(vec![
                    Span::styled(app.safe_date.format("%m/%d").to_string(), Theme::dim()),
                    Span::raw(" "),
                    Span::styled(truncate(&app.product_name, 20), Theme::normal()),
                    Span::raw(" "),
                    Span::styled(status.label(), Style::default().fg(color)),
                ]))
            })
            .collect();

        List::new(items).render(sections[1], buf);
    }

    fn render_alerts(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(Span::styled("Active Alerts", Theme::header()))
            .borders(Borders::ALL)
            .border_style(Theme::border());

        let inner = block.inner(area);
        block.render(area, buf);

        if self.alerts.is_empty() {
            let para = Paragraph::new(Span::styled("No active alerts", Theme::dim()));
            para.render(inner, buf);
            return;
        }

        let items: Vec<ListItem> = self
            .alerts
            .iter()
            .take(3)
            .map(|alert| {
                let level_style = Style::default().fg(alert.risk_level.color());
                let title_line = Line::from(vec![
                    Span::styled(format!("{} ", alert.risk_level.symbol()), level_style),
                    Span::styled(&alert.title, level_style),
                    Span::styled(format!(" ({})", alert.observation_label), Theme::dim()),
                ]);
                let action_line = Line::from(vec![
                    Span::styled("  ", Theme::dim()),
                    Span::styled(&alert.recommended_action, Theme::dim()),
                ]);
                ListItem::new(vec![title_line, action_line])
            })
            .collect();

        List::new(items).render(inner, buf);
    }

    fn render_status_message(&self, area: Rect, buf: &mut Buffer) {
        if let Some(msg) = self.status_message {
            let style = if msg.contains("failed") || msg.contains("must") {
                Theme::warning()
            } else {
                Theme::success()
            };
            Paragraph::new(Span::styled(msg, style)).render(area, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
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

    fn farm() -> FarmConfig {
        FarmConfig {
            name: "Green Acres".into(),
            crop: Some("Chilli".into()),
        }
    }

    #[test]
    fn renders_clear_farm() {
        let farm = farm();
        let today = NaiveDate::from_ymd_opt(2024, 8, 5).unwrap();
        let area = Rect::new(0, 0, 100, 24);
        let mut buf = Buffer::empty(area);

        DashboardScreen::new(&farm, today, FarmStatus::Clear, &[]).render(area, &mut buf);

        let text = buffer_text(&buf);
        assert!(text.contains("CropSafe - Green Acres (Chilli)"));
        assert!(text.contains("SAFE TO HARVEST"));
        assert!(text.contains("No active withdrawal periods"));
    }

    #[test]
    fn renders_restricted_farm_with_next_clearance() {
        let farm = farm();
        let today = NaiveDate::from_ymd_opt(2024, 8, 5).unwrap();
        let app = PesticideApplication {
            id: Uuid::new_v4(),
            product_name: "Mancozeb".into(),
            withdrawal_days: 5,
            applied_date: NaiveDate::from_ymd_opt(2024, 8, 1).unwrap(),
            safe_date: NaiveDate::from_ymd_opt(2024, 8, 6).unwrap(),
            notes: None,
            created_at: Utc::now(),
        };
        let status = ApplicationStatus {
            days_remaining: 1,
            is_safe: false,
            progress: 0.2,
        };
        let upcoming = [(&app, status)];
        let farm_status = FarmStatus::Restricted {
            active_count: 1,
            min_days_remaining: 1,
        };
        let area = Rect::new(0, 0, 100, 24);
        let mut buf = Buffer::empty(area);

        DashboardScreen::new(&farm, today, farm_status, &upcoming).render(area, &mut buf);

        let text = buffer_text(&buf);
        assert!(text.contains("DO NOT HARVEST"));
        assert!(text.contains("Mancozeb - safe 06 Aug"));
        assert!(text.contains("1 day left"));
    }
}
