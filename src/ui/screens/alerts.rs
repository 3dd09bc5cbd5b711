use super::nav_line;
use crate::models::{AlertSummary, RiskAlert, WeatherObservation};
use crate::ui::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table, Widget, Wrap},
};

pub struct AlertsScreen<'a> {
    pub observations: &'a [WeatherObservation],
    pub alerts: &'a [RiskAlert],
    pub summary: AlertSummary,
    pub selected_index: usize,
    pub source: &'a str,
    pub refreshing: bool,
}

impl<'a> AlertsScreen<'a> {
    pub fn new(observations: &'a [WeatherObservation], alerts: &'a [RiskAlert]) -> Self {
        Self {
            observations,
            alerts,
            summary: AlertSummary::default(),
            selected_index: 0,
            source: "",
            refreshing: false,
        }
    }

    pub fn with_summary(mut self, summary: AlertSummary) -> Self {
        self.summary = summary;
        self
    }

    pub fn with_selection(mut self, index: usize) -> Self {
        self.selected_index = index;
        self
    }

    pub fn with_source(mut self, source: &'a str, refreshing: bool) -> Self {
        self.source = source;
        self.refreshing = refreshing;
        self
    }
}

impl Widget for AlertsScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let forecast_height = (self.observations.len() as u16 + 3).clamp(4, 10);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),               // Title
                Constraint::Length(forecast_height), // Forecast
                Constraint::Min(8),                  // Alerts
                Constraint::Length(1),               // Nav
            ])
            .split(area);

        let mut title = vec![
            Span::styled("Weather Alerts", Theme::title()),
            Span::styled(
                format!(
                    " ({} high, {} medium, {} low)",
                    self.summary.high_count, self.summary.medium_count, self.summary.low_count
                ),
                Theme::dim(),
            ),
        ];
        if self.refreshing {
            title.push(Span::styled("  refreshing...", Theme::warning()));
        }
        Paragraph::new(Line::from(title)).render(chunks[0], buf);

        self.render_forecast(chunks[1], buf);

        let content = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(chunks[2]);

        self.render_list(content[0], buf);
        self.render_details(content[1], buf);

        let nav = nav_line(&[
            ("[↑↓]", "Navigate"),
            ("[r]", "Refresh"),
            ("[Esc]", "Back"),
        ]);
        Paragraph::new(nav).render(chunks[3], buf);
    }
}

impl AlertsScreen<'_> {
    fn render_forecast(&self, area: Rect, buf: &mut Buffer) {
        let title = if self.source.is_empty() {
            "Forecast".to_string()
        } else {
            format!("Forecast - {}", self.source)
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Theme::border());

        if self.observations.is_empty() {
            let para = Paragraph::new(Span::styled("No forecast loaded", Theme::dim())).block(block);
            para.render(area, buf);
            return;
        }

        let header = Row::new(
            ["Day", "Temp", "Humidity", "Rain", "Wind"]
                .iter()
                .map(|h| Cell::from(*h).style(Theme::header())),
        );

        let rows: Vec<Row> = self
            .observations
            .iter()
            .map(|obs| {
                Row::new(vec![
                    Cell::from(obs.label.clone()),
                    Cell::from(format!("{:.1}°C", obs.temperature_c))
                        .style(Style::default().fg(Theme::temp_color(obs.temperature_c))),
                    Cell::from(format!("{:.0}%", obs.humidity_pct))
                        .style(Style::default().fg(Theme::humidity_color(obs.humidity_pct))),
                    Cell::from(format!("{:.1} mm", obs.rainfall_mm)),
                    Cell::from(format!("{:.0} km/h", obs.wind_speed_kmh)),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(14),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Min(9),
        ];

        Table::new(rows, widths)
            .header(header)
            .block(block)
            .render(area, buf);
    }

    fn render_list(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title("Alerts")
            .borders(Borders::ALL)
            .border_style(Theme::border());

        let inner = block.inner(area);
        block.render(area, buf);

        if self.alerts.is_empty() {
            let para = Paragraph::new(Span::styled("All clear", Theme::success()));
            para.render(inner, buf);
            return;
        }

        let items: Vec<ListItem> = self
            .alerts
            .iter()
            .enumerate()
            .map(|(i, alert)| {
                let style = if i == self.selected_index {
                    Theme::selected()
                } else {
                    Style::default()
                };
                let level_style = Style::default().fg(alert.risk_level.color());

                let line = Line::from(vec![
                    Span::styled(format!("{} ", alert.risk_level.symbol()), level_style),
                    Span::styled(&alert.title, level_style),
                    Span::styled(format!(" {}", alert.observation_label), Theme::dim()),
                ]);

                ListItem::new(line).style(style)
            })
            .collect();

        List::new(items).render(inner, buf);
    }

    fn render_details(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title("Details")
            .borders(Borders::ALL)
            .border_style(Theme::border());

        let inner = block.inner(area);
        block.render(area, buf);

        let Some(alert) = self.alerts.get(self.selected_index) else {
            let para = Paragraph::new(Span::styled("Select an alert to view details", Theme::dim()));
            para.render(inner, buf);
            return;
        };

        let lines = vec![
            Line::from(Span::styled(&alert.title, Theme::header())),
            Line::default(),
            Line::from(vec![
                Span::styled("Risk: ", Theme::dim()),
                Span::styled(
                    alert.risk_level.as_str(),
                    Style::default().fg(alert.risk_level.color()),
                ),
                Span::styled("  Day: ", Theme::dim()),
                Span::styled(&alert.observation_label, Theme::normal()),
                Span::styled(format!("  [{}]", alert.id), Theme::dim()),
            ]),
            Line::default(),
            Line::from(Span::styled("Why:", Theme::dim())),
            Line::from(Span::styled(&alert.description, Theme::normal())),
            Line::default(),
            Line::from(Span::styled("Recommended Action:", Theme::dim())),
            Line::from(Span::styled(&alert.recommended_action, Theme::success())),
        ];

        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasources::fixture::sample_forecast;
    use crate::logic::RiskEngine;
    use chrono::NaiveDate;

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

    #[test]
    fn renders_forecast_and_selected_alert() {
        let forecast = sample_forecast(NaiveDate::from_ymd_opt(2024, 8, 1).unwrap());
        let alerts = RiskEngine::new().evaluate(&forecast);
        let summary = RiskEngine::summarize(&alerts);

        let area = Rect::new(0, 0, 120, 30);
        let mut buf = Buffer::empty(area);
        AlertsScreen::new(&forecast, &alerts)
            .with_summary(summary)
            .with_selection(1)
            .with_source("Sample forecast", false)
            .render(area, &mut buf);

        let text = buffer_text(&buf);
        assert!(text.contains("(2 high, 0 medium, 0 low)"));
        assert!(text.contains("Forecast - Sample forecast"));
        assert!(text.contains("Tomorrow"));
        assert!(text.contains("[leaf-1]"));
    }

    #[test]
    fn empty_alerts_render_all_clear() {
        let area = Rect::new(0, 0, 80, 20);
        let mut buf = Buffer::empty(area);
        AlertsScreen::new(&[], &[]).render(area, &mut buf);

        let text = buffer_text(&buf);
        assert!(text.contains("No forecast loaded"));
        assert!(text.contains("All clear"));
    }
}
