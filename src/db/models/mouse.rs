use serde::{Deserialize, Serialize};

/// Names stored in `mouse_metrics.metric_name`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MouseMetric {
    ClicksLeft,
    ClicksRight,
    Scroll,
    Distance,
}

impl MouseMetric {
    pub const ALL: [MouseMetric; 4] = [
        MouseMetric::ClicksLeft,
        MouseMetric::ClicksRight,
        MouseMetric::Scroll,
        MouseMetric::Distance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MouseMetric::ClicksLeft => "clicks_left",
            MouseMetric::ClicksRight => "clicks_right",
            MouseMetric::Scroll => "scroll",
            MouseMetric::Distance => "distance",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        match value {
            "clicks_left" => Some(MouseMetric::ClicksLeft),
            "clicks_right" => Some(MouseMetric::ClicksRight),
            "scroll" => Some(MouseMetric::Scroll),
            "distance" => Some(MouseMetric::Distance),
            _ => None,
        }
    }
}
