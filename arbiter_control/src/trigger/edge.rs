//! Poll-and-compare edge detection.

/// Transition observed between two consecutive polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    None,
    Rising,
    Falling,
}

/// Remembers the previous sample of one boolean condition.
///
/// The very first sample only seeds the memory: a condition that is already
/// true when polling begins produces no rising edge.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeDetector {
    previous: Option<bool>,
}

impl EdgeDetector {
    pub const fn new() -> Self {
        Self { previous: None }
    }

    /// Record `current` and report the edge relative to the last sample.
    pub fn update(&mut self, current: bool) -> Edge {
        let edge = match (self.previous, current) {
            (Some(false), true) => Edge::Rising,
            (Some(true), false) => Edge::Falling,
            _ => Edge::None,
        };
        self.previous = Some(current);
        edge
    }

    #[inline]
    pub const fn previous(&self) -> Option<bool> {
        self.previous
    }
}
