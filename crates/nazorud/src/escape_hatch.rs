use std::time::{Duration, Instant};

/// KEY_BACKSPACE, KEY_ESC, KEY_ENTER
const PANIC_SEQ: [u16; 3] = [14, 1, 28];
const PANIC_WINDOW: Duration = Duration::from_millis(1000);

/// Detects Backspace → Escape → Enter within one second. Safety exit when the
/// keyboards are grabbed and the daemon stops responding to them.
pub struct EscapeHatch {
    ring: [Option<(u16, Instant)>; 3],
    idx: usize,
}

impl EscapeHatch {
    pub fn new() -> Self {
        Self {
            ring: [None; 3],
            idx: 0,
        }
    }

    /// Feed a key press; returns true when the combo just completed.
    pub fn observe(&mut self, code: u16, at: Instant) -> bool {
        self.ring[self.idx] = Some((code, at));
        self.idx = (self.idx + 1) % 3;

        let oldest = self.idx;
        let presses = [
            self.ring[oldest],
            self.ring[(oldest + 1) % 3],
            self.ring[(oldest + 2) % 3],
        ];
        let [Some(first), Some(second), Some(third)] = presses else {
            return false;
        };
        [first.0, second.0, third.0] == PANIC_SEQ
            && third.1.saturating_duration_since(first.1) < PANIC_WINDOW
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BACKSPACE: u16 = 14;
    const ESC: u16 = 1;
    const ENTER: u16 = 28;
    const KEY_A: u16 = 30;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn combo_within_window_triggers() {
        let mut hatch = EscapeHatch::new();
        let t0 = Instant::now();
        assert!(!hatch.observe(BACKSPACE, t0));
        assert!(!hatch.observe(ESC, t0 + ms(200)));
        assert!(hatch.observe(ENTER, t0 + ms(400)));
    }

    #[test]
    fn slow_combo_does_not_trigger() {
        let mut hatch = EscapeHatch::new();
        let t0 = Instant::now();
        hatch.observe(BACKSPACE, t0);
        hatch.observe(ESC, t0 + ms(600));
        assert!(!hatch.observe(ENTER, t0 + ms(1200)));
    }

    #[test]
    fn wrong_order_does_not_trigger() {
        let mut hatch = EscapeHatch::new();
        let t0 = Instant::now();
        hatch.observe(ESC, t0);
        hatch.observe(BACKSPACE, t0 + ms(10));
        assert!(!hatch.observe(ENTER, t0 + ms(20)));
    }

    #[test]
    fn combo_after_other_keys_triggers() {
        let mut hatch = EscapeHatch::new();
        let t0 = Instant::now();
        hatch.observe(KEY_A, t0);
        hatch.observe(KEY_A, t0 + ms(10));
        hatch.observe(BACKSPACE, t0 + ms(20));
        hatch.observe(ESC, t0 + ms(30));
        assert!(hatch.observe(ENTER, t0 + ms(40)));
    }

    #[test]
    fn fewer_than_three_presses_never_trigger() {
        let mut hatch = EscapeHatch::new();
        let t0 = Instant::now();
        assert!(!hatch.observe(ESC, t0));
        assert!(!hatch.observe(ENTER, t0));
    }
}
