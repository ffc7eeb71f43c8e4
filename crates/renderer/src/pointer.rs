/// Last known cursor position in window coordinates (top-left origin).
///
/// The effect works in pixels with a bottom-left origin, so
/// [`PointerState::shader_position`] flips the y axis against the current
/// viewport height. Until the cursor first moves the pointer sits at the
/// viewport centre.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    position: Option<(f64, f64)>,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn moved_to(&mut self, x: f64, y: f64) {
        self.position = Some((x, y));
    }

    /// Cursor position in bottom-left pixel space for a `width` x `height` viewport.
    pub fn shader_position(&self, width: u32, height: u32) -> [f32; 2] {
        let height = height as f32;
        match self.position {
            Some((x, y)) => [x as f32, height - y as f32],
            None => [width as f32 * 0.5, height * 0.5],
        }
    }
}
