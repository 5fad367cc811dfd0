//! Viewport size tracking.

/// Viewport size in px.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Drops resize notifications that repeat the last observed size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResizeFilter {
    last: ViewportSize,
}

impl ResizeFilter {
    /// Filter whose first notification counts as a change unless it is `initial`.
    pub fn new(initial: ViewportSize) -> Self {
        Self { last: initial }
    }

    /// Record `size`; `true` when width or height changed.
    pub fn observe(&mut self, size: ViewportSize) -> bool {
        let changed = size != self.last;
        self.last = size;
        changed
    }

    pub fn last(&self) -> ViewportSize {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_sizes_are_filtered() {
        let mut filter = ResizeFilter::default();
        assert!(filter.observe(ViewportSize::new(800, 600)));
        assert!(!filter.observe(ViewportSize::new(800, 600)));
        assert!(filter.observe(ViewportSize::new(800, 601)));
        assert!(filter.observe(ViewportSize::new(640, 601)));
        assert_eq!(filter.last(), ViewportSize::new(640, 601));
    }

    #[test]
    fn initial_size_is_not_a_change() {
        let mut filter = ResizeFilter::new(ViewportSize::new(1024, 768));
        assert!(!filter.observe(ViewportSize::new(1024, 768)));
    }
}
