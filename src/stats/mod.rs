//! Range resolution and pure derivations behind the dashboard reports.

pub mod history;
pub mod range;

pub use history::{count_calls, fill_gaps};
pub use range::{RangeWindow, TimeRange};

/// Non-backspace keystrokes per backspace, 0 until a backspace is recorded.
pub fn chars_per_backspace(total: i64, backspaces: i64) -> f64 {
    if backspaces > 0 {
        (total - backspaces) as f64 / backspaces as f64
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chars_per_backspace_ratio() {
        assert_eq!(chars_per_backspace(6, 1), 5.0);
        assert_eq!(chars_per_backspace(10, 0), 0.0);
        assert_eq!(chars_per_backspace(0, 0), 0.0);
    }
}
