//! embedded-graphics render target for `text-ellipsis`.
//!
//! [`MonoTextBox`] wraps text with a [`MonoFont`] so truncation is measured
//! in real glyph cells, then draws the result onto any binary display.

#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

use std::borrow::Cow;

use embedded_graphics::{
    mono_font::{
        ascii::{FONT_10X20, FONT_6X9, FONT_7X14, FONT_8X13},
        MonoFont, MonoTextStyle,
    },
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use text_ellipsis::cell_box::{parse_font_size_px, wrap_columns};
use text_ellipsis::{BoxMetrics, ContentKind, DisplayContent, InlineStyle, MarkupMap, RenderTarget};

/// Font size, in px, of the default face.
pub const BASE_FONT_PX: f32 = 16.0;

/// Mono face used for a CSS font size in px.
pub fn font_for_size_px(size_px: f32) -> &'static MonoFont<'static> {
    if size_px >= 24.0 {
        &FONT_10X20
    } else if size_px >= 20.0 {
        &FONT_8X13
    } else if size_px >= 16.0 {
        &FONT_7X14
    } else {
        &FONT_6X9
    }
}

/// Fixed-size text box laid out with a mono font.
#[derive(Clone, Debug)]
pub struct MonoTextBox {
    size: Size,
    font: &'static MonoFont<'static>,
    font_size: Option<String>,
    line_gap_px: i32,
    max_height: Option<i32>,
    content: DisplayContent,
    lines: Vec<String>,
    overflowed: Option<bool>,
}

impl MonoTextBox {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Size::new(width, height),
            font: font_for_size_px(BASE_FONT_PX),
            font_size: None,
            line_gap_px: 0,
            max_height: None,
            content: DisplayContent::plain(""),
            lines: Vec::new(),
            overflowed: None,
        }
    }

    /// Extra px between lines.
    pub fn with_line_gap(mut self, px: i32) -> Self {
        self.line_gap_px = px.max(0);
        self.relayout();
        self
    }

    pub fn font(&self) -> &'static MonoFont<'static> {
        self.font
    }

    pub fn font_size(&self) -> Option<&str> {
        self.font_size.as_deref()
    }

    pub fn content(&self) -> &DisplayContent {
        &self.content
    }

    /// Wrapped lines as they will be drawn.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Value of the `data-overflowed` tag, if set.
    pub fn overflowed(&self) -> Option<bool> {
        self.overflowed
    }

    /// Glyph columns per line.
    pub fn columns(&self) -> usize {
        let advance = self.font.character_size.width + self.font.character_spacing;
        let usable = self.size.width + self.font.character_spacing;
        (usable / advance.max(1)) as usize
    }

    pub fn line_height(&self) -> i32 {
        self.font.character_size.height as i32 + self.line_gap_px
    }

    fn client_height(&self) -> i32 {
        let height = i32::try_from(self.size.height).unwrap_or(i32::MAX);
        match self.max_height {
            Some(max) => height.min(max),
            None => height,
        }
    }

    fn relayout(&mut self) {
        let visible: Cow<'_, str> = match self.content.kind() {
            ContentKind::Plain => Cow::Borrowed(self.content.as_str()),
            ContentKind::Markup => {
                let markup = self.content.as_str();
                Cow::Owned(MarkupMap::scan(markup).visible_text(markup).into_owned())
            }
        };
        let normalized = normalize_text_for_mono(&visible);
        self.lines = wrap_columns(&normalized, self.columns());
    }

    /// Draw the lines that start inside the box at `origin`.
    ///
    /// Returns the number of lines drawn.
    pub fn draw<D>(&self, display: &mut D, origin: Point) -> Result<usize, D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let style = MonoTextStyle::new(self.font, BinaryColor::On);
        let line_height = self.line_height();
        let client_height = self.client_height();
        let mut drawn = 0usize;
        for (idx, line) in self.lines.iter().enumerate() {
            let top = i32::try_from(idx).unwrap_or(i32::MAX).saturating_mul(line_height);
            if top >= client_height {
                break;
            }
            Text::with_baseline(line, origin + Point::new(0, top), style, Baseline::Top)
                .draw(display)?;
            drawn += 1;
        }
        Ok(drawn)
    }
}

impl RenderTarget for MonoTextBox {
    fn set_text(&mut self, text: &str) {
        self.content = DisplayContent::plain(text);
        self.relayout();
    }

    fn set_markup(&mut self, markup: &str) {
        self.content = DisplayContent::markup(markup);
        self.relayout();
    }

    fn markup(&self) -> String {
        match self.content.kind() {
            ContentKind::Plain => quick_xml::escape::escape(self.content.as_str()).into_owned(),
            ContentKind::Markup => self.content.as_str().to_string(),
        }
    }

    fn metrics(&self) -> BoxMetrics {
        let line_height = self.line_height();
        let lines = i32::try_from(self.lines.len()).unwrap_or(i32::MAX);
        BoxMetrics {
            client_height: self.client_height(),
            scroll_height: lines.saturating_mul(line_height),
            line_height: Some(line_height),
        }
    }

    fn set_style(&mut self, style: InlineStyle) {
        match style {
            InlineStyle::FontSize(None) => {
                self.font_size = None;
                self.font = font_for_size_px(BASE_FONT_PX);
            }
            InlineStyle::FontSize(Some(value)) => match parse_font_size_px(&value, BASE_FONT_PX) {
                Some(px) => {
                    self.font = font_for_size_px(px);
                    self.font_size = Some(value);
                }
                None => log::warn!("ignoring unparsable font size {:?}", value),
            },
            InlineStyle::MaxHeight(max) => self.max_height = max,
        }
        self.relayout();
    }

    fn set_overflowed(&mut self, overflowed: bool) {
        self.overflowed = Some(overflowed);
    }
}

/// ASCII stand-in for a char the mono fonts lack.
fn mono_stand_in(ch: char) -> Option<&'static str> {
    match ch {
        '\u{00A0}' => Some(" "),                // nbsp
        '\u{2013}' | '\u{2014}' => Some("-"),   // en and em dash
        '\u{2018}' | '\u{2019}' => Some("'"),   // single quotes
        '\u{201C}' | '\u{201D}' => Some("\""),  // double quotes
        '\u{2026}' => Some("..."),              // ellipsis
        _ => None,
    }
}

/// Text as the mono fonts can draw it; borrowed when nothing changes.
pub fn normalize_text_for_mono(text: &str) -> Cow<'_, str> {
    let Some(first) = text.find(|ch| mono_stand_in(ch).is_some()) else {
        return Cow::Borrowed(text);
    };
    let mut out = String::with_capacity(text.len() + 2);
    out.push_str(&text[..first]);
    for ch in text[first..].chars() {
        match mono_stand_in(ch) {
            Some(ascii) => out.push_str(ascii),
            None => out.push(ch),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_buckets_follow_size() {
        let cell = |px| font_for_size_px(px).character_size;
        assert_eq!(cell(12.0), FONT_6X9.character_size);
        assert_eq!(cell(16.0), FONT_7X14.character_size);
        assert_eq!(cell(21.0), FONT_8X13.character_size);
        assert_eq!(cell(30.0), FONT_10X20.character_size);
    }

    #[test]
    fn columns_and_lines_come_from_the_font() {
        let mut text_box = MonoTextBox::new(70, 28);
        assert_eq!(text_box.columns(), 10);
        assert_eq!(text_box.line_height(), 14);
        text_box.set_text("The quick brown fox");
        assert_eq!(text_box.lines(), ["The quick", "brown fox"]);
        assert_eq!(text_box.metrics().scroll_height, 28);
    }

    #[test]
    fn ellipsis_is_measured_as_three_dots() {
        let mut text_box = MonoTextBox::new(70, 14);
        text_box.set_text("brown fox…");
        assert_eq!(text_box.lines(), ["brown", "fox..."]);
    }

    #[test]
    fn smaller_font_fits_more() {
        let mut text_box = MonoTextBox::new(70, 28);
        text_box.set_style(InlineStyle::FontSize(Some("12px".to_string())));
        assert_eq!(text_box.columns(), 11);
        assert_eq!(text_box.line_height(), 9);
        assert_eq!(text_box.font_size(), Some("12px"));
        text_box.set_style(InlineStyle::FontSize(None));
        assert_eq!(text_box.columns(), 10);
    }

    #[test]
    fn plain_text_reads_back_escaped() {
        let mut text_box = MonoTextBox::new(70, 14);
        text_box.set_text("a < b & c");
        assert_eq!(text_box.markup(), "a &lt; b &amp; c");
    }

    #[test]
    fn normalization_borrows_ascii_and_replaces_typography() {
        assert!(matches!(normalize_text_for_mono("plain text"), Cow::Borrowed(_)));
        assert_eq!(
            normalize_text_for_mono("caf\u{e9} \u{201C}hi\u{201D}\u{00A0}\u{2014} it\u{2019}s\u{2026}"),
            "caf\u{e9} \"hi\" - it's..."
        );
    }
}
