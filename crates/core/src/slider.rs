//! Dual-thumb range slider geometry for the price filter.
//!
//! All math lives here, off the render path: a pixel offset inside a
//! fixed-width track maps to a value in `[min, max]` rounded to the
//! nearest 10 000 currency-unit step. Pointer and touch input share the
//! same entry points, so their semantics cannot drift apart.

/// Currency step the thumb values snap to.
pub const PRICE_STEP: u32 = 10_000;
/// Minimum separation between the thumbs, in percent of the track.
pub const MIN_SEPARATION_PCT: f64 = 5.0;

/// Which part of the slider a drag grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    /// The lower thumb.
    Lower,
    /// The upper thumb.
    Upper,
    /// The whole selected band; its width is preserved while dragging.
    Band,
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    mode: DragMode,
    /// For band drags: distance in percent from the lower edge to the
    /// grab point, so the band does not jump under the pointer.
    grab_offset_pct: f64,
}

/// Two-thumb slider over a fixed-width track.
#[derive(Debug, Clone)]
pub struct RangeSlider {
    min: u32,
    max: u32,
    track_width: f64,
    lower_pct: f64,
    upper_pct: f64,
    drag: Option<DragState>,
}

impl RangeSlider {
    /// A slider spanning `[min, max]` over a `track_width`-pixel track,
    /// with both thumbs at the extremes.
    pub fn new(min: u32, max: u32, track_width: f64) -> Self {
        Self {
            min,
            max: max.max(min + PRICE_STEP),
            track_width: track_width.max(1.0),
            lower_pct: 0.0,
            upper_pct: 100.0,
            drag: None,
        }
    }

    /// Seed thumb positions from existing values, e.g. restored filters.
    pub fn set_values(&mut self, lower: u32, upper: u32) {
        let lower_pct = self.pct_of_value(lower);
        let upper_pct = self.pct_of_value(upper);
        self.upper_pct = upper_pct.clamp(MIN_SEPARATION_PCT, 100.0);
        self.lower_pct = lower_pct.clamp(0.0, self.upper_pct - MIN_SEPARATION_PCT);
    }

    /// Lower thumb value, snapped to [`PRICE_STEP`].
    pub fn lower_value(&self) -> u32 {
        self.value_at_pct(self.lower_pct)
    }

    /// Upper thumb value, snapped to [`PRICE_STEP`].
    pub fn upper_value(&self) -> u32 {
        self.value_at_pct(self.upper_pct)
    }

    /// Lower thumb position in percent of the track.
    pub fn lower_pct(&self) -> f64 {
        self.lower_pct
    }

    /// Upper thumb position in percent of the track.
    pub fn upper_pct(&self) -> f64 {
        self.upper_pct
    }

    /// What the active drag grabbed, if one is in progress.
    pub fn drag_mode(&self) -> Option<DragMode> {
        self.drag.map(|drag| drag.mode)
    }

    /// Begin a drag at `px`. The grabbed part is the nearest thumb, or the
    /// band itself when the grab lands inside it away from both thumbs.
    pub fn pointer_down(&mut self, px: f64) {
        let pct = self.pct_of_px(px);
        let to_lower = (pct - self.lower_pct).abs();
        let to_upper = (pct - self.upper_pct).abs();
        let inside_band = pct > self.lower_pct && pct < self.upper_pct;
        let mode = if inside_band && to_lower > MIN_SEPARATION_PCT && to_upper > MIN_SEPARATION_PCT
        {
            DragMode::Band
        } else if to_lower <= to_upper {
            DragMode::Lower
        } else {
            DragMode::Upper
        };
        self.drag = Some(DragState {
            mode,
            grab_offset_pct: pct - self.lower_pct,
        });
    }

    /// Continue the active drag to `px`. No-op without an active drag.
    pub fn pointer_move(&mut self, px: f64) {
        let Some(drag) = self.drag else {
            return;
        };
        let pct = self.pct_of_px(px);
        match drag.mode {
            DragMode::Lower => {
                self.lower_pct = pct.clamp(0.0, self.upper_pct - MIN_SEPARATION_PCT);
            }
            DragMode::Upper => {
                self.upper_pct = pct.clamp(self.lower_pct + MIN_SEPARATION_PCT, 100.0);
            }
            DragMode::Band => {
                let width = self.upper_pct - self.lower_pct;
                let new_lower = (pct - drag.grab_offset_pct).clamp(0.0, 100.0 - width);
                self.lower_pct = new_lower;
                self.upper_pct = new_lower + width;
            }
        }
    }

    /// Release ends every drag mode; no drag state survives.
    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    /// Touch input shares pointer semantics exactly.
    pub fn touch_start(&mut self, px: f64) {
        self.pointer_down(px);
    }

    /// See [`pointer_move`](Self::pointer_move).
    pub fn touch_move(&mut self, px: f64) {
        self.pointer_move(px);
    }

    /// See [`pointer_up`](Self::pointer_up).
    pub fn touch_end(&mut self) {
        self.pointer_up();
    }

    fn pct_of_px(&self, px: f64) -> f64 {
        (px / self.track_width * 100.0).clamp(0.0, 100.0)
    }

    fn pct_of_value(&self, value: u32) -> f64 {
        let span = (self.max - self.min) as f64;
        ((value.clamp(self.min, self.max) - self.min) as f64 / span) * 100.0
    }

    fn value_at_pct(&self, pct: f64) -> u32 {
        let span = (self.max - self.min) as f64;
        let raw = self.min as f64 + span * pct / 100.0;
        let stepped = (raw / PRICE_STEP as f64).round() * PRICE_STEP as f64;
        (stepped as u32).clamp(self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slider() -> RangeSlider {
        // 0..100_000 over a 400px track: 4px per percent.
        RangeSlider::new(0, 100_000, 400.0)
    }

    #[test]
    fn px_maps_to_stepped_value() {
        let mut s = slider();
        s.pointer_down(0.0);
        s.pointer_move(98.0); // 24.5% -> 24_500 -> snaps to 20_000
        assert_eq!(s.lower_value(), 20_000);
        s.pointer_move(102.0); // 25.5% -> 25_500 -> snaps to 30_000
        assert_eq!(s.lower_value(), 30_000);
    }

    #[test]
    fn lower_thumb_never_crosses_separation() {
        let mut s = slider();
        s.set_values(0, 50_000);
        s.pointer_down(0.0);
        // Try to drag the lower thumb past the upper one.
        s.pointer_move(400.0);
        assert!(s.lower_pct() <= s.upper_pct() - MIN_SEPARATION_PCT + f64::EPSILON);
        // Step rounding may land both thumbs on the same step; order holds.
        assert!(s.lower_value() <= s.upper_value());
    }

    #[test]
    fn upper_thumb_never_crosses_separation() {
        let mut s = slider();
        s.set_values(50_000, 100_000);
        s.pointer_down(400.0);
        s.pointer_move(0.0);
        assert!(s.upper_pct() >= s.lower_pct() + MIN_SEPARATION_PCT - f64::EPSILON);
    }

    #[test]
    fn band_drag_preserves_width_and_clamps() {
        let mut s = slider();
        s.set_values(30_000, 60_000);
        let width = s.upper_pct() - s.lower_pct();

        // Grab the middle of the band and fling it past the right edge.
        s.pointer_down(180.0); // 45%
        assert_eq!(s.drag_mode(), Some(DragMode::Band));
        s.pointer_move(1_000.0);
        assert!((s.upper_pct() - 100.0).abs() < f64::EPSILON);
        assert!((s.upper_pct() - s.lower_pct() - width).abs() < 1e-9);

        // And past the left edge.
        s.pointer_move(-1_000.0);
        assert!(s.lower_pct().abs() < f64::EPSILON);
        assert!((s.upper_pct() - s.lower_pct() - width).abs() < 1e-9);
    }

    #[test]
    fn grab_near_thumb_moves_that_thumb() {
        let mut s = slider();
        s.set_values(30_000, 60_000);
        s.pointer_down(122.0); // just right of the lower thumb at 30%
        assert_eq!(s.drag_mode(), Some(DragMode::Lower));
        s.pointer_up();
        s.pointer_down(238.0); // just left of the upper thumb at 60%
        assert_eq!(s.drag_mode(), Some(DragMode::Upper));
    }

    #[test]
    fn release_clears_drag_state() {
        let mut s = slider();
        s.pointer_down(100.0);
        assert!(s.drag_mode().is_some());
        s.pointer_up();
        assert!(s.drag_mode().is_none());
        // Moves after release are inert.
        let before = s.lower_pct();
        s.pointer_move(300.0);
        assert!((s.lower_pct() - before).abs() < f64::EPSILON);
    }

    #[test]
    fn touch_matches_pointer_semantics() {
        let mut pointer = slider();
        let mut touch = slider();
        pointer.pointer_down(180.0);
        pointer.pointer_move(260.0);
        pointer.pointer_up();
        touch.touch_start(180.0);
        touch.touch_move(260.0);
        touch.touch_end();
        assert_eq!(pointer.lower_value(), touch.lower_value());
        assert_eq!(pointer.upper_value(), touch.upper_value());
    }
}
