pub mod alerts;
pub mod dashboard;
pub mod withdrawals;

pub use alerts::AlertsScreen;
pub use dashboard::DashboardScreen;
pub use withdrawals::WithdrawalsScreen;

use crate::ui::Theme;
use ratatui::text::{Line, Span};

/// Key hints rendered as `[k]Label [k]Label`.
fn nav_line(items: &[(&'static str, &'static str)]) -> Line<'static> {
    let spans: Vec<Span<'static>> = items
        .iter()
        .flat_map(|(key, label)| {
            [
                Span::styled(*key, Theme::nav_key()),
                Span::styled(format!("{} ", label), Theme::nav_label()),
            ]
        })
        .collect();
    Line::from(spans)
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
