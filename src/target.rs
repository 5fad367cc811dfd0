//! Render target abstraction and the height a pass measures against.

use core::num::NonZeroU32;

use crate::config::EllipsisConfig;
use crate::engine::{ContentKind, DisplayContent};

/// Box metrics of a rendered element, in px.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoxMetrics {
    /// Visible height.
    pub client_height: i32,
    /// Height the content needs.
    pub scroll_height: i32,
    /// Computed line height, when the target knows it.
    pub line_height: Option<i32>,
}

impl BoxMetrics {
    /// Content taller than the visible box.
    pub fn overflows(self) -> bool {
        self.scroll_height > self.client_height
    }
}

/// Inline style a pass may set on its element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InlineStyle {
    /// CSS font size, `None` to clear.
    FontSize(Option<String>),
    /// Max height in px, `None` to clear.
    MaxHeight(Option<i32>),
}

/// Element that displays truncated text and can be measured.
///
/// Setting content is expected to re-layout synchronously so the next
/// [`metrics`](RenderTarget::metrics) call reflects it.
pub trait RenderTarget {
    /// Replace the content with escaped plain text.
    fn set_text(&mut self, text: &str);

    /// Replace the content with markup.
    fn set_markup(&mut self, markup: &str);

    /// Current content as markup.
    fn markup(&self) -> String;

    fn metrics(&self) -> BoxMetrics;

    /// Metrics of the containing element, if attached to one.
    fn parent_metrics(&self) -> Option<BoxMetrics> {
        None
    }

    /// Client heights of the other children of the containing element.
    fn sibling_heights(&self) -> Vec<i32> {
        Vec::new()
    }

    fn set_style(&mut self, style: InlineStyle);

    /// Tag the element with `data-overflowed="true"|"false"`.
    fn set_overflowed(&mut self, overflowed: bool);

    fn render(&mut self, content: &DisplayContent) {
        match content.kind() {
            ContentKind::Plain => self.set_text(content.as_str()),
            ContentKind::Markup => self.set_markup(content.as_str()),
        }
    }
}

/// Height a pass measures candidates against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutConstraint {
    /// Available height in px.
    pub max_height: i32,
    /// Whether the height came from `max_lines`.
    pub from_lines: bool,
}

impl LayoutConstraint {
    pub fn height(max_height: i32) -> Self {
        Self {
            max_height,
            from_lines: false,
        }
    }

    /// `line_height × lines`.
    pub fn lines(line_height: i32, lines: NonZeroU32) -> Self {
        let lines = i32::try_from(lines.get()).unwrap_or(i32::MAX);
        Self {
            max_height: line_height.saturating_mul(lines),
            from_lines: true,
        }
    }

    /// Capture the constraint for one pass.
    ///
    /// With `max_lines`, measures one line of the target (replacing its
    /// content) unless it reports a computed line height. With `use_parent`,
    /// takes the parent's client height minus its other children. Otherwise
    /// the element's own client height.
    pub fn derive<T>(target: &mut T, config: &EllipsisConfig) -> Self
    where
        T: RenderTarget + ?Sized,
    {
        if let Some(lines) = config.max_lines {
            let line_height = measure_line_height(target);
            log::trace!("line height {}px x {} lines", line_height, lines);
            return Self::lines(line_height, lines);
        }
        if config.use_parent {
            if let Some(parent) = target.parent_metrics() {
                let siblings: i32 = target.sibling_heights().iter().sum();
                return Self::height((parent.client_height - siblings).max(0));
            }
            log::warn!("use_parent is set but the target has no parent; using its own height");
        }
        Self::height(target.metrics().client_height)
    }

    /// Strict overflow test of `metrics` against this constraint.
    pub fn is_overflowed_by(self, metrics: BoxMetrics) -> bool {
        metrics.scroll_height > self.max_height
    }
}

fn measure_line_height<T>(target: &mut T) -> i32
where
    T: RenderTarget + ?Sized,
{
    if let Some(line_height) = target.metrics().line_height {
        return line_height;
    }
    target.set_text("X");
    target.metrics().scroll_height
}
