//! Truncation search.
//!
//! The engine never computes layout. Each candidate is handed to an
//! [`OverflowProbe`], which renders it wherever the caller measures and
//! reports whether it overflows the captured height.

use crate::breakpoints::{CandidateBreakpoints, SYNTHETIC_START_CHARS};
use crate::config::{EllipsisConfig, SearchStrategy};
use crate::markup::MarkupMap;
use crate::source::TextSource;

/// Visible chars kept when not even the first breakpoint fits.
pub const MIN_SLICE_CHARS: usize = SYNTHETIC_START_CHARS;

/// How displayed content must be written to a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentKind {
    Plain,
    Markup,
}

/// Text as it should be displayed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayContent {
    text: String,
    kind: ContentKind,
}

impl DisplayContent {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: ContentKind::Plain,
        }
    }

    pub fn markup(markup: impl Into<String>) -> Self {
        Self {
            text: markup.into(),
            kind: ContentKind::Markup,
        }
    }

    fn of_source(source: &TextSource) -> Self {
        if source.is_markup() {
            Self::markup(source.effective())
        } else {
            Self::plain(source.effective())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    pub fn is_markup(&self) -> bool {
        self.kind == ContentKind::Markup
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

/// Renders a candidate and reports whether it overflows.
///
/// Overflow must be strict: content exactly as tall as the available height
/// fits.
pub trait OverflowProbe {
    fn overflows(&mut self, content: &DisplayContent) -> bool;
}

impl<F> OverflowProbe for F
where
    F: FnMut(&DisplayContent) -> bool,
{
    fn overflows(&mut self, content: &DisplayContent) -> bool {
        self(content)
    }
}

/// Outcome of one truncation pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TruncationResult {
    /// What should end up displayed.
    pub content: DisplayContent,
    /// Whether a suffix was added.
    pub is_truncated: bool,
    /// Byte length of the kept prefix of the source text, when cut.
    pub cut: Option<usize>,
    /// Number of probe calls made.
    pub measurements: usize,
}

impl TruncationResult {
    pub fn displayed_text(&self) -> &str {
        self.content.as_str()
    }
}

/// Stateless truncation engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TruncationEngine {
    strategy: Option<SearchStrategy>,
}

impl TruncationEngine {
    /// Engine using each config's own strategy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine forcing `strategy` regardless of config.
    pub fn with_strategy(strategy: SearchStrategy) -> Self {
        Self {
            strategy: Some(strategy),
        }
    }

    /// Cut `source` at the longest candidate whose display does not overflow.
    ///
    /// Empty text is returned untouched without probing. Text that fits is
    /// returned verbatim. Otherwise the longest fitting separator-bounded
    /// prefix is kept, followed by the ellipsis and append markup; if nothing
    /// fits, the shortest candidate is kept anyway.
    pub fn truncate<P>(
        &self,
        source: &TextSource,
        config: &EllipsisConfig,
        probe: &mut P,
    ) -> TruncationResult
    where
        P: OverflowProbe + ?Sized,
    {
        let full = DisplayContent::of_source(source);
        if source.is_empty() {
            return TruncationResult {
                content: full,
                is_truncated: false,
                cut: None,
                measurements: 0,
            };
        }

        let mut probe = CountingProbe { inner: probe, count: 0 };
        if !probe.overflows(&full) {
            log::trace!("text fits; no truncation");
            return TruncationResult {
                content: full,
                is_truncated: false,
                cut: None,
                measurements: probe.count,
            };
        }

        let text = source.effective();
        let map = if source.is_markup() {
            MarkupMap::scan(text)
        } else {
            MarkupMap::plain()
        };
        let breakpoints = CandidateBreakpoints::build(text, &config.separator, &map);
        let offsets = breakpoints.search_offsets(text, &map);
        let composer = Composer::new(source, config, &map);
        let strategy = self.strategy.unwrap_or(config.strategy);
        log::debug!(
            "truncating {} bytes: {} candidates ({}), {:?} search",
            text.len(),
            offsets.len(),
            if breakpoints.is_synthetic() {
                "synthetic"
            } else {
                "separator"
            },
            strategy
        );

        let mut fits = |idx: usize| !probe.overflows(&composer.compose(offsets[idx]));
        let found = match strategy {
            SearchStrategy::Linear => search_linear(offsets.len(), &mut fits),
            SearchStrategy::Binary => search_binary(offsets.len(), &mut fits),
        };
        let chosen = match found {
            Some(idx) => idx,
            None => {
                log::debug!("no candidate fits; keeping the minimal slice");
                0
            }
        };
        let cut = offsets[chosen];
        let content = composer.compose(cut);
        log::debug!(
            "kept {} of {} bytes after {} measurements",
            cut,
            text.len(),
            probe.count
        );
        TruncationResult {
            content,
            is_truncated: true,
            cut: Some(cut),
            measurements: probe.count,
        }
    }
}

/// Largest index in `0..count` that fits, scanning down from the end.
///
/// Stops at the first fit, so at most `count` calls.
pub fn search_linear<F>(count: usize, mut fits: F) -> Option<usize>
where
    F: FnMut(usize) -> bool,
{
    (0..count).rev().find(|&idx| fits(idx))
}

/// Largest index in `0..count` that fits, assuming fits are a prefix of the range.
///
/// Keeps `lo` fitting and `hi` overflowing (with virtual ends at `-1` and
/// `count`) until they are adjacent.
pub fn search_binary<F>(count: usize, mut fits: F) -> Option<usize>
where
    F: FnMut(usize) -> bool,
{
    let mut lo: Option<usize> = None;
    let mut hi = count;
    loop {
        let lower = lo.map_or(0, |idx| idx + 1);
        if lower >= hi {
            return lo;
        }
        let mid = lower + (hi - lower) / 2;
        if fits(mid) {
            lo = Some(mid);
        } else {
            hi = mid;
        }
    }
}

struct CountingProbe<'a, P: ?Sized> {
    inner: &'a mut P,
    count: usize,
}

impl<P> CountingProbe<'_, P>
where
    P: OverflowProbe + ?Sized,
{
    fn overflows(&mut self, content: &DisplayContent) -> bool {
        self.count += 1;
        let overflowed = self.inner.overflows(content);
        log::trace!(
            "probe #{} ({} bytes): {}",
            self.count,
            content.as_str().len(),
            if overflowed { "overflow" } else { "fits" }
        );
        overflowed
    }
}

/// Builds prefix + suffix displays for one source.
///
/// The suffix is markup. It goes inside the innermost element open at the
/// cut, so block elements do not push it onto a line of its own.
struct Composer<'a> {
    text: &'a str,
    markup_source: bool,
    map: &'a MarkupMap,
    suffix: String,
    suffix_is_markup: bool,
}

impl<'a> Composer<'a> {
    fn new(source: &'a TextSource, config: &EllipsisConfig, map: &'a MarkupMap) -> Self {
        let suffix = config.suffix();
        Self {
            text: source.effective(),
            markup_source: source.is_markup(),
            map,
            suffix_is_markup: suffix.contains(['&', '<']),
            suffix,
        }
    }

    fn compose(&self, cut: usize) -> DisplayContent {
        let prefix = &self.text[..cut];
        if self.markup_source {
            let closing = self.map.closing_tags_at(cut);
            let mut out = String::with_capacity(cut + self.suffix.len() + closing.len());
            out.push_str(prefix);
            out.push_str(&self.suffix);
            out.push_str(&closing);
            return DisplayContent::markup(out);
        }
        if self.suffix_is_markup {
            let mut out = quick_xml::escape::escape(prefix).into_owned();
            out.push_str(&self.suffix);
            return DisplayContent::markup(out);
        }
        // Markup-free suffix over plain text reads the same either way.
        let mut out = String::with_capacity(cut + self.suffix.len());
        out.push_str(prefix);
        out.push_str(&self.suffix);
        DisplayContent::plain(out)
    }
}
