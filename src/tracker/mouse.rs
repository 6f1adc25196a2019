use serde::{Deserialize, Serialize};

use crate::db::MouseMetric;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
    #[serde(other)]
    Other,
}

/// Sub-minute mouse accumulators, drained by the periodic flush.
///
/// Positions are 16-bit like the virtual cursor that feeds relative-motion
/// devices, and distance uses wrapping differences so a cursor that wrapped
/// from 32767 to -32768 moved one pixel, not 65535.
#[derive(Debug, Default)]
pub struct MouseBuffer {
    clicks_left: u64,
    clicks_right: u64,
    scroll: u64,
    distance: f64,
    last_position: Option<(i16, i16)>,
}

/// Accumulated values taken out of a [`MouseBuffer`] in one flush.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct MouseDeltas {
    pub clicks_left: u64,
    pub clicks_right: u64,
    pub scroll: u64,
    pub distance: f64,
}

impl MouseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_click(&mut self, button: MouseButton) {
        match button {
            MouseButton::Left => self.clicks_left += 1,
            MouseButton::Right => self.clicks_right += 1,
            MouseButton::Other => {}
        }
    }

    pub fn record_scroll(&mut self, amount: i32) {
        self.scroll += u64::from(amount.unsigned_abs());
    }

    /// The first position after start (or after [`reset_position`]) only
    /// seeds the cursor; it never counts as travel.
    ///
    /// [`reset_position`]: MouseBuffer::reset_position
    pub fn record_move(&mut self, x: i16, y: i16) {
        if let Some((last_x, last_y)) = self.last_position {
            let dx = f64::from(x.wrapping_sub(last_x));
            let dy = f64::from(y.wrapping_sub(last_y));
            self.distance += (dx * dx + dy * dy).sqrt();
        }
        self.last_position = Some((x, y));
    }

    /// Forget the last cursor position, e.g. after a coordinate-system change.
    pub fn reset_position(&mut self) {
        self.last_position = None;
    }

    /// Read and zero all four accumulators. The cursor position survives so
    /// travel keeps accumulating across flushes.
    pub fn take(&mut self) -> MouseDeltas {
        let deltas = MouseDeltas {
            clicks_left: self.clicks_left,
            clicks_right: self.clicks_right,
            scroll: self.scroll,
            distance: self.distance,
        };
        self.clicks_left = 0;
        self.clicks_right = 0;
        self.scroll = 0;
        self.distance = 0.0;
        deltas
    }

    #[cfg(test)]
    pub fn pending(&self) -> MouseDeltas {
        MouseDeltas {
            clicks_left: self.clicks_left,
            clicks_right: self.clicks_right,
            scroll: self.scroll,
            distance: self.distance,
        }
    }
}

impl MouseDeltas {
    /// Metrics with a positive delta; zero entries would be no-op writes.
    pub fn non_zero(&self) -> Vec<(MouseMetric, f64)> {
        [
            (MouseMetric::ClicksLeft, self.clicks_left as f64),
            (MouseMetric::ClicksRight, self.clicks_right as f64),
            (MouseMetric::Scroll, self.scroll as f64),
            (MouseMetric::Distance, self.distance),
        ]
        .into_iter()
        .filter(|(_, value)| *value > 0.0)
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.non_zero().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_move_only_seeds_position() {
        let mut buffer = MouseBuffer::new();
        buffer.record_move(0, 0);
        assert_eq!(buffer.pending().distance, 0.0);
        buffer.record_move(3, 4);
        assert_eq!(buffer.pending().distance, 5.0);
        buffer.record_move(3, 4);
        assert_eq!(buffer.pending().distance, 5.0);
    }

    #[test]
    fn reset_position_avoids_spurious_jump() {
        let mut buffer = MouseBuffer::new();
        buffer.record_move(10, 10);
        buffer.reset_position();
        buffer.record_move(2_000, 1_000);
        assert_eq!(buffer.pending().distance, 0.0);
    }

    #[test]
    fn wrapped_coordinates_measure_short_hop() {
        let mut buffer = MouseBuffer::new();
        buffer.record_move(i16::MAX, 0);
        buffer.record_move(i16::MIN, 0);
        assert_eq!(buffer.pending().distance, 1.0);
    }

    #[test]
    fn take_zeroes_accumulators_but_keeps_cursor() {
        let mut buffer = MouseBuffer::new();
        buffer.record_click(MouseButton::Left);
        buffer.record_click(MouseButton::Left);
        buffer.record_click(MouseButton::Right);
        buffer.record_click(MouseButton::Other);
        buffer.record_scroll(-3);
        buffer.record_scroll(2);
        buffer.record_move(0, 0);
        buffer.record_move(6, 8);

        let deltas = buffer.take();
        assert_eq!(deltas.clicks_left, 2);
        assert_eq!(deltas.clicks_right, 1);
        assert_eq!(deltas.scroll, 5);
        assert_eq!(deltas.distance, 10.0);
        assert!(buffer.take().is_empty());

        buffer.record_move(6, 9);
        assert_eq!(buffer.pending().distance, 1.0);
    }

    #[test]
    fn non_zero_skips_idle_metrics() {
        let deltas = MouseDeltas {
            clicks_left: 0,
            clicks_right: 1,
            scroll: 0,
            distance: 2.5,
        };
        assert_eq!(
            deltas.non_zero(),
            vec![(MouseMetric::ClicksRight, 1.0), (MouseMetric::Distance, 2.5)]
        );
    }

    #[test]
    fn unknown_buttons_deserialize_as_other() {
        let button: MouseButton = serde_json::from_str("\"middle\"").unwrap();
        assert_eq!(button, MouseButton::Other);
        let button: MouseButton = serde_json::from_str("\"left\"").unwrap();
        assert_eq!(button, MouseButton::Left);
    }
}
