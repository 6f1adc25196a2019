use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyCount {
    pub key: String,
    pub count: i64,
}

/// One point of a count series; `time` is a Unix timestamp.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimePoint {
    pub time: i64,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HeatmapPoint {
    #[serde(rename = "ts")]
    pub timestamp: i64,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct KpmStats {
    pub avg: f64,
    pub max: i64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct TypingStats {
    pub backspaces: i64,
    pub chars_per_backspace: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct MouseStats {
    /// Pixels travelled.
    pub distance: f64,
    pub clicks_left: i64,
    pub clicks_right: i64,
    pub scroll: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stats {
    pub total: i64,
    pub kpm: KpmStats,
    pub typing: TypingStats,
    pub top_keys: Vec<KeyCount>,
    pub history: Vec<TimePoint>,
    pub calendar: Vec<TimePoint>,
    pub mouse: MouseStats,
    /// 0-23, -1 when there is no data in range.
    pub busiest_hour: i32,
    /// 0 = Sunday .. 6 = Saturday, -1 when there is no data in range.
    pub busiest_day: i32,
    pub avg_call_minutes_per_day: f64,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            total: 0,
            kpm: KpmStats::default(),
            typing: TypingStats::default(),
            top_keys: Vec::new(),
            history: Vec::new(),
            calendar: Vec::new(),
            mouse: MouseStats::default(),
            busiest_hour: -1,
            busiest_day: -1,
            avg_call_minutes_per_day: 0.0,
        }
    }
}
