//! Rating levels and their sentiment icons
//!
//! Each of the five rating levels has a fixed face icon and color. Anything
//! that is not a level (0, 6, "", "abc", NaN) has no icon; that is a display
//! fallback, not an error.

use serde::Serialize;

/// Face icon shown for a rating level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentIcon {
    VeryDissatisfied,
    Dissatisfied,
    Satisfied,
    SatisfiedAlt,
    VerySatisfied,
}

impl SentimentIcon {
    pub const ALL: [SentimentIcon; 5] = [
        SentimentIcon::VeryDissatisfied,
        SentimentIcon::Dissatisfied,
        SentimentIcon::Satisfied,
        SentimentIcon::SatisfiedAlt,
        SentimentIcon::VerySatisfied,
    ];

    /// Icon for an integer level 1..=5
    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            1 => Some(SentimentIcon::VeryDissatisfied),
            2 => Some(SentimentIcon::Dissatisfied),
            3 => Some(SentimentIcon::Satisfied),
            4 => Some(SentimentIcon::SatisfiedAlt),
            5 => Some(SentimentIcon::VerySatisfied),
            _ => None,
        }
    }

    /// Icon for a stored rating string such as "4"
    pub fn from_rating(value: &str) -> Option<Self> {
        value.trim().parse::<i64>().ok().and_then(Self::from_level)
    }

    /// Icon for an average, rounded half up to the nearest level
    pub fn from_average(average: f64) -> Option<Self> {
        if !average.is_finite() {
            return None;
        }
        Self::from_level((average + 0.5).floor() as i64)
    }

    pub fn level(&self) -> u8 {
        match self {
            SentimentIcon::VeryDissatisfied => 1,
            SentimentIcon::Dissatisfied => 2,
            SentimentIcon::Satisfied => 3,
            SentimentIcon::SatisfiedAlt => 4,
            SentimentIcon::VerySatisfied => 5,
        }
    }

    /// Icon color as a CSS hex string
    pub fn color(&self) -> &'static str {
        match self {
            SentimentIcon::VeryDissatisfied => "#f44336",
            SentimentIcon::Dissatisfied => "#ff9800",
            SentimentIcon::Satisfied => "#ffeb3b",
            SentimentIcon::SatisfiedAlt => "#8bc34a",
            SentimentIcon::VerySatisfied => "#4caf50",
        }
    }
}

/// Rating icon as sent to clients: `{"icon": "satisfied", "color": "#ffeb3b"}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IconView {
    pub icon: SentimentIcon,
    pub color: &'static str,
}

impl From<SentimentIcon> for IconView {
    fn from(icon: SentimentIcon) -> Self {
        Self {
            icon,
            color: icon.color(),
        }
    }
}
