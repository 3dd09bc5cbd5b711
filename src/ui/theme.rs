use crate::models::ApplicationStatus;
use ratatui::style::{Color, Modifier, Style};

pub struct Theme;

impl Theme {
    // Base colors
    pub const FG: Color = Color::White;
    pub const DIM: Color = Color::DarkGray;
    pub const ACCENT: Color = Color::Green;
    pub const HIGHLIGHT: Color = Color::Cyan;

    // Status colors
    pub const SUCCESS: Color = Color::Green;
    pub const WARNING: Color = Color::Yellow;
    pub const ERROR: Color = Color::Red;

    // Weather colors
    pub const TEMP_COOL: Color = Color::Cyan;
    pub const TEMP_WARM: Color = Color::Yellow;
    pub const TEMP_HOT: Color = Color::Red;
    pub const HUMID: Color = Color::LightBlue;

    // Styles
    pub fn title() -> Style {
        Style::default()
            .fg(Self::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn header() -> Style {
        Style::default().fg(Self::FG).add_modifier(Modifier::BOLD)
    }

    pub fn normal() -> Style {
        Style::default().fg(Self::FG)
    }

    pub fn dim() -> Style {
        Style::default().fg(Self::DIM)
    }

    pub fn highlight() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn selected() -> Style {
        Style::default()
            .bg(Color::DarkGray)
            .fg(Self::FG)
            .add_modifier(Modifier::BOLD)
    }

    pub fn success() -> Style {
        Style::default().fg(Self::SUCCESS)
    }

    pub fn warning() -> Style {
        Style::default().fg(Self::WARNING)
    }

    pub fn error() -> Style {
        Style::default().fg(Self::ERROR)
    }

    /// Green once safe, amber in the last few days, red otherwise.
    pub fn withdrawal_color(status: &ApplicationStatus) -> Color {
        if status.is_safe {
            Self::SUCCESS
        } else if status.days_remaining <= 3 {
            Self::WARNING
        } else {
            Self::ERROR
        }
    }

    pub fn temp_color(temp_c: f64) -> Color {
        if temp_c < 20.0 {
            Self::TEMP_COOL
        } else if temp_c <= 27.0 {
            Self::TEMP_WARM
        } else {
            Self::TEMP_HOT
        }
    }

    pub fn humidity_color(humidity_pct: f64) -> Color {
        if humidity_pct > 80.0 {
            Self::WARNING
        } else if humidity_pct > 75.0 {
            Self::HUMID
        } else {
            Self::FG
        }
    }

    pub fn nav_key() -> Style {
        Style::default()
            .fg(Self::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn nav_label() -> Style {
        Style::default().fg(Self::DIM)
    }

    pub fn border() -> Style {
        Style::default().fg(Self::DIM)
    }

    pub fn border_focused() -> Style {
        Style::default().fg(Self::ACCENT)
    }
}
