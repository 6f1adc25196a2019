//! Event boundary between OS capture sources and the tracker.
//!
//! Capture sources emit newline-delimited JSON records, one per event:
//! ```text
//! {"kind":"key","label":"a"}
//! {"kind":"move","x":120,"y":48}
//! {"kind":"relative_move","dx":-3,"dy":1}
//! {"kind":"click","button":"left"}
//! {"kind":"scroll","amount":-2}
//! {"kind":"call","in_call":true,"camera_active":false,"microphone_active":true,"app":"Zoom"}
//! ```

mod cursor;
mod reader;

pub use cursor::VirtualCursor;
pub use reader::{ingest, IngestSummary};

use serde::{Deserialize, Serialize};

use crate::db::CallObservation;
use crate::tracker::{MouseButton, Tracker};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputEvent {
    Key { label: String },
    Move { x: i32, y: i32 },
    RelativeMove { dx: i32, dy: i32 },
    Click { button: MouseButton },
    Scroll { amount: i32 },
    Call(CallObservation),
}

/// Map raw key characters to stored labels. Returns `None` for keys that
/// are not counted: empty labels and bare control characters.
pub fn normalize_key_label(raw: &str) -> Option<String> {
    let label = match raw {
        "" => return None,
        "\r" | "\n" | "\r\n" => "[ENTER]",
        "\t" => "[TAB]",
        "\u{8}" => "[BACKSPACE]",
        " " => "[SPACE]",
        "\u{1b}" => "[ESC]",
        other => {
            let mut chars = other.chars();
            if let (Some(ch), None) = (chars.next(), chars.next()) {
                if ch < ' ' {
                    return None;
                }
            }
            other
        }
    };
    Some(label.to_string())
}

/// Apply one event to the tracker. Relative motion goes through `cursor`
/// so it lands in the same 16-bit coordinate space as absolute moves.
pub async fn dispatch(tracker: &Tracker, cursor: &mut VirtualCursor, event: InputEvent) {
    match event {
        InputEvent::Key { label } => {
            if let Some(label) = normalize_key_label(&label) {
                tracker.increment_key(&label).await;
            }
        }
        InputEvent::Move { x, y } => {
            let (x, y) = cursor.set(x, y);
            tracker.record_move(x, y);
        }
        InputEvent::RelativeMove { dx, dy } => {
            if dx != 0 || dy != 0 {
                let (x, y) = cursor.shift(dx, dy);
                tracker.record_move(x, y);
            }
        }
        InputEvent::Click { button } => tracker.record_click(button),
        InputEvent::Scroll { amount } => tracker.record_scroll(amount),
        InputEvent::Call(observation) => tracker.record_call_observation(observation).await,
    }
}
