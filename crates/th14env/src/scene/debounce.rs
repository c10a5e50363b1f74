/// Confirms a condition only after it held for `required` consecutive
/// observations; any miss starts the count over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debounce {
    required: u32,
    streak: u32,
}

impl Debounce {
    pub fn new(required: u32) -> Self {
        Self {
            required: required.max(1),
            streak: 0,
        }
    }

    /// Record one observation; returns whether the condition is confirmed
    pub fn observe(&mut self, holds: bool) -> bool {
        self.streak = if holds { self.streak + 1 } else { 0 };
        self.is_confirmed()
    }

    pub fn is_confirmed(&self) -> bool {
        self.streak >= self.required
    }
}
