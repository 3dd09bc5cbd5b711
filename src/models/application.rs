use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A logged pesticide application and its derived safe-harvest date.
///
/// Records are immutable once created; `safe_date` is fixed at creation and
/// never recomputed from the wall clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PesticideApplication {
    pub id: Uuid,
    pub product_name: String,
    pub withdrawal_days: u32,
    pub applied_date: NaiveDate,
    pub safe_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PesticideApplication {
    /// Short form of the id for tables and CLI output.
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }

    pub fn display_notes(&self) -> &str {
        self.notes.as_deref().unwrap_or("-")
    }
}

/// Point-in-time view of one application, recomputed for every render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApplicationStatus {
    pub days_remaining: i64,
    pub is_safe: bool,
    pub progress: f64,
}

impl ApplicationStatus {
    /// Fill level for the countdown bar. A cleared application shows full.
    pub fn bar_ratio(&self) -> f64 {
        if self.is_safe {
            1.0
        } else {
            self.progress
        }
    }

    pub fn label(&self) -> String {
        if self.is_safe {
            "SAFE NOW".to_string()
        } else if self.days_remaining == 1 {
            "1 day left".to_string()
        } else {
            format!("{} days left", self.days_remaining)
        }
    }
}
