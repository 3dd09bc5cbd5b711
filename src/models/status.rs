use serde::{Deserialize, Serialize};

/// Farm-wide harvest safety across every logged application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FarmStatus {
    Clear,
    Restricted {
        active_count: usize,
        min_days_remaining: i64,
    },
}

impl FarmStatus {
    pub fn is_clear(&self) -> bool {
        matches!(self, FarmStatus::Clear)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FarmStatus::Clear => "clear",
            FarmStatus::Restricted { .. } => "restricted",
        }
    }

    pub fn describe(&self) -> String {
        match self {
            FarmStatus::Clear => "All clear - no active withdrawal periods".to_string(),
            FarmStatus::Restricted {
                active_count,
                min_days_remaining,
            } => format!(
                "Restricted - {} active withdrawal{}, next clears in {} day{}",
                active_count,
                if *active_count == 1 { "" } else { "s" },
                min_days_remaining,
                if *min_days_remaining == 1 { "" } else { "s" },
            ),
        }
    }

    pub fn color(&self) -> ratatui::style::Color {
        use ratatui::style::Color;
        match self {
            FarmStatus::Clear => Color::Green,
            FarmStatus::Restricted { .. } => Color::Red,
        }
    }
}

impl std::fmt::Display for FarmStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
