use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }

    pub fn color(&self) -> ratatui::style::Color {
        use ratatui::style::Color;
        match self {
            RiskLevel::Low => Color::Blue,
            RiskLevel::Medium => Color::Yellow,
            RiskLevel::High => Color::Red,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            RiskLevel::Low => "→",
            RiskLevel::Medium => "⚠",
            RiskLevel::High => "!",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An alert raised by one rule for one observation.
///
/// The id is `"<rule_id>-<observation_index>"`, so re-evaluating the same
/// forecast always yields the same ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAlert {
    pub id: String,
    pub rule_id: String,
    pub observation_index: usize,
    pub observation_label: String,
    pub risk_level: RiskLevel,
    pub title: String,
    pub description: String,
    pub recommended_action: String,
}

impl RiskAlert {
    pub fn new(
        rule_id: &str,
        observation_index: usize,
        risk_level: RiskLevel,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: format!("{}-{}", rule_id, observation_index),
            rule_id: rule_id.to_string(),
            observation_index,
            observation_label: String::new(),
            risk_level,
            title: title.into(),
            description: description.into(),
            recommended_action: String::new(),
        }
    }

    pub fn for_day(mut self, label: impl Into<String>) -> Self {
        self.observation_label = label.into();
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.recommended_action = action.into();
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSummary {
    pub high_count: usize,
    pub medium_count: usize,
    pub low_count: usize,
}

impl AlertSummary {
    pub fn total(&self) -> usize {
        self.high_count + self.medium_count + self.low_count
    }

    pub fn is_all_clear(&self) -> bool {
        self.total() == 0
    }
}
