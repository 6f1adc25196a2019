use serde::{Deserialize, Serialize};

use super::stats::{HeatmapPoint, TimePoint};

/// One poll of the call-state source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallObservation {
    pub in_call: bool,
    #[serde(default)]
    pub camera_active: bool,
    #[serde(default)]
    pub microphone_active: bool,
    #[serde(default)]
    pub app: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppCallStats {
    pub app: String,
    pub minutes: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CallStats {
    pub total_minutes: i64,
    /// Estimated: in-call minutes separated by more than the call gap start a new call.
    pub total_calls: i64,
    pub camera_minutes: i64,
    pub microphone_minutes: i64,
    pub app_breakdown: Vec<AppCallStats>,
    pub daily_minutes: Vec<TimePoint>,
    pub heatmap: Vec<HeatmapPoint>,
}
