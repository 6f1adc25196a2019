/// Absolute cursor position synthesized for relative-motion devices.
///
/// Coordinates are 16-bit and wrap modulo 65536 instead of saturating, so
/// a long drag in one direction never pins the cursor to an edge.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct VirtualCursor {
    x: i16,
    y: i16,
}

impl VirtualCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> (i16, i16) {
        (self.x, self.y)
    }

    /// Jump to an absolute position reported by the OS.
    pub fn set(&mut self, x: i32, y: i32) -> (i16, i16) {
        self.x = wrap(x);
        self.y = wrap(y);
        self.position()
    }

    pub fn shift(&mut self, dx: i32, dy: i32) -> (i16, i16) {
        self.x = self.x.wrapping_add(wrap(dx));
        self.y = self.y.wrapping_add(wrap(dy));
        self.position()
    }
}

fn wrap(value: i32) -> i16 {
    value as i16
}
