//! Headless character-cell render target.
//!
//! A [`CellBox`] lays text out on a fixed grid: every visible char is one
//! cell wide and every wrapped line is `line_height_px` tall. It is what the
//! tests and benches measure against, and a reasonable stand-in for terminal
//! style hosts.

use std::borrow::Cow;

use crate::engine::{ContentKind, DisplayContent};
use crate::markup::MarkupMap;
use crate::target::{BoxMetrics, InlineStyle, RenderTarget};

const DEFAULT_LINE_HEIGHT_PX: i32 = 20;
const DEFAULT_BASE_FONT_PX: f32 = 16.0;

/// Greedy word wrap of `text` into lines of at most `columns` chars.
///
/// Hard line breaks are kept. Words wider than a line are split at char
/// boundaries. Empty text has no lines.
pub fn wrap_columns(text: &str, columns: usize) -> Vec<String> {
    let columns = columns.max(1);
    let mut lines = Vec::new();
    if text.is_empty() {
        return lines;
    }
    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_chars = 0usize;
        for word in paragraph.split_whitespace() {
            let mut word = word;
            let mut word_chars = word.chars().count();
            let needed = if line_chars == 0 {
                word_chars
            } else {
                line_chars + 1 + word_chars
            };
            if needed <= columns {
                if line_chars > 0 {
                    line.push(' ');
                    line_chars += 1;
                }
                line.push_str(word);
                line_chars += word_chars;
                continue;
            }
            if line_chars > 0 {
                lines.push(core::mem::take(&mut line));
            }
            while word_chars > columns {
                let (head, tail) = split_at_chars(word, columns);
                lines.push(head.to_string());
                word = tail;
                word_chars -= columns;
            }
            line.push_str(word);
            line_chars = word_chars;
        }
        lines.push(line);
    }
    lines
}

fn split_at_chars(word: &str, chars: usize) -> (&str, &str) {
    let split = word
        .char_indices()
        .nth(chars)
        .map_or(word.len(), |(byte, _)| byte);
    word.split_at(split)
}

/// Font size in px for a CSS-like value (`12px`, `0.75em`, `0.75rem`, `12`).
pub fn parse_font_size_px(value: &str, base_px: f32) -> Option<f32> {
    let value = value.trim();
    let (number, scale) = if let Some(px) = value.strip_suffix("px") {
        (px, 1.0)
    } else if let Some(rem) = value.strip_suffix("rem") {
        (rem, base_px)
    } else if let Some(em) = value.strip_suffix("em") {
        (em, base_px)
    } else {
        (value, 1.0)
    };
    let size = number.trim().parse::<f32>().ok()? * scale;
    (size.is_finite() && size > 0.0).then_some(size)
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ParentBox {
    client_height: i32,
    siblings: Vec<i32>,
}

/// Fixed-size box of `columns × rows` cells.
#[derive(Clone, Debug)]
pub struct CellBox {
    columns: usize,
    rows: usize,
    line_height_px: i32,
    base_font_px: f32,
    reports_line_height: bool,
    font_size: Option<String>,
    font_px: f32,
    max_height: Option<i32>,
    content: DisplayContent,
    parent: Option<ParentBox>,
    overflowed: Option<bool>,
    renders: usize,
}

impl CellBox {
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns: columns.max(1),
            rows,
            line_height_px: DEFAULT_LINE_HEIGHT_PX,
            base_font_px: DEFAULT_BASE_FONT_PX,
            reports_line_height: false,
            font_size: None,
            font_px: DEFAULT_BASE_FONT_PX,
            max_height: None,
            content: DisplayContent::plain(""),
            parent: None,
            overflowed: None,
            renders: 0,
        }
    }

    pub fn with_line_height(mut self, px: i32) -> Self {
        self.line_height_px = px.max(1);
        self
    }

    /// Font size at which one char is one cell.
    pub fn with_base_font_px(mut self, px: f32) -> Self {
        if px.is_finite() && px > 0.0 {
            self.base_font_px = px;
            if self.font_size.is_none() {
                self.font_px = px;
            }
        }
        self
    }

    /// Report the computed line height in [`BoxMetrics`].
    pub fn reporting_line_height(mut self, reports: bool) -> Self {
        self.reports_line_height = reports;
        self
    }

    /// Place the box in a parent of `client_height` px with other children.
    pub fn with_parent(mut self, client_height: i32, siblings: Vec<i32>) -> Self {
        self.parent = Some(ParentBox {
            client_height,
            siblings,
        });
        self
    }

    pub fn set_rows(&mut self, rows: usize) {
        self.rows = rows;
    }

    pub fn set_columns(&mut self, columns: usize) {
        self.columns = columns.max(1);
    }

    pub fn content(&self) -> &DisplayContent {
        &self.content
    }

    /// Visible text of the current content.
    pub fn visible_text(&self) -> Cow<'_, str> {
        match self.content.kind() {
            ContentKind::Plain => Cow::Borrowed(self.content.as_str()),
            ContentKind::Markup => {
                let markup = self.content.as_str();
                Cow::Owned(MarkupMap::scan(markup).visible_text(markup).into_owned())
            }
        }
    }

    /// Current content wrapped to the effective column count.
    pub fn lines(&self) -> Vec<String> {
        wrap_columns(&self.visible_text(), self.effective_columns())
    }

    /// Value of the `data-overflowed` tag, if set.
    pub fn overflowed(&self) -> Option<bool> {
        self.overflowed
    }

    pub fn font_size(&self) -> Option<&str> {
        self.font_size.as_deref()
    }

    pub fn max_height(&self) -> Option<i32> {
        self.max_height
    }

    /// Number of content replacements so far.
    pub fn renders(&self) -> usize {
        self.renders
    }

    fn scale(&self) -> f32 {
        self.font_px / self.base_font_px
    }

    fn effective_columns(&self) -> usize {
        ((self.columns as f32 / self.scale()).floor() as usize).max(1)
    }

    fn effective_line_height(&self) -> i32 {
        ((self.line_height_px as f32 * self.scale()).round() as i32).max(1)
    }

    fn box_height(&self) -> i32 {
        let rows = i32::try_from(self.rows).unwrap_or(i32::MAX);
        let height = rows.saturating_mul(self.line_height_px);
        match self.max_height {
            Some(max) => height.min(max),
            None => height,
        }
    }

    fn replace(&mut self, content: DisplayContent) {
        self.content = content;
        self.renders += 1;
    }
}

impl RenderTarget for CellBox {
    fn set_text(&mut self, text: &str) {
        self.replace(DisplayContent::plain(text));
    }

    fn set_markup(&mut self, markup: &str) {
        self.replace(DisplayContent::markup(markup));
    }

    fn markup(&self) -> String {
        match self.content.kind() {
            ContentKind::Plain => quick_xml::escape::escape(self.content.as_str()).into_owned(),
            ContentKind::Markup => self.content.as_str().to_string(),
        }
    }

    fn metrics(&self) -> BoxMetrics {
        let line_height = self.effective_line_height();
        let lines = i32::try_from(self.lines().len()).unwrap_or(i32::MAX);
        BoxMetrics {
            client_height: self.box_height(),
            scroll_height: lines.saturating_mul(line_height),
            line_height: self.reports_line_height.then_some(line_height),
        }
    }

    fn parent_metrics(&self) -> Option<BoxMetrics> {
        self.parent.as_ref().map(|parent| {
            let own = self.metrics().scroll_height.max(self.box_height());
            let siblings: i32 = parent.siblings.iter().sum();
            BoxMetrics {
                client_height: parent.client_height,
                scroll_height: own.saturating_add(siblings),
                line_height: None,
            }
        })
    }

    fn sibling_heights(&self) -> Vec<i32> {
        self.parent
            .as_ref()
            .map(|parent| parent.siblings.clone())
            .unwrap_or_default()
    }

    fn set_style(&mut self, style: InlineStyle) {
        match style {
            InlineStyle::FontSize(None) => {
                self.font_size = None;
                self.font_px = self.base_font_px;
            }
            InlineStyle::FontSize(Some(value)) => {
                match parse_font_size_px(&value, self.base_font_px) {
                    Some(px) => {
                        self.font_px = px;
                        self.font_size = Some(value);
                    }
                    None => log::warn!("ignoring unparsable font size {:?}", value),
                }
            }
            InlineStyle::MaxHeight(max) => self.max_height = max,
        }
    }

    fn set_overflowed(&mut self, overflowed: bool) {
        self.overflowed = Some(overflowed);
    }
}
