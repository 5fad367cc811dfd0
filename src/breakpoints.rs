//! Candidate cut points.

use crate::config::Separator;
use crate::markup::MarkupMap;

/// Visible chars in the first synthetic breakpoint and in the minimal slice.
pub const SYNTHETIC_START_CHARS: usize = 5;

/// Strictly increasing byte offsets where a text may be cut.
///
/// Every offset is a char boundary outside any markup tag, and the last one
/// is always the text length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateBreakpoints {
    offsets: Vec<usize>,
    synthetic: bool,
}

impl CandidateBreakpoints {
    /// Breakpoints at separator boundaries, or the synthetic sequence when the
    /// text has no interior separator.
    pub fn build(text: &str, separator: &Separator, map: &MarkupMap) -> Self {
        let mut offsets = separator_offsets(text, separator, map);
        let first_visible = first_visible_offset(text, map);
        offsets.retain(|&offset| offset > first_visible && offset < text.len());
        offsets.sort_unstable();
        offsets.dedup();
        if offsets.is_empty() {
            return Self::synthetic(text, map);
        }
        offsets.push(text.len());
        Self {
            offsets,
            synthetic: false,
        }
    }

    /// Offsets after 5, 10, 20, 40, ... visible chars, ending at the text length.
    pub fn synthetic(text: &str, map: &MarkupMap) -> Self {
        let mut offsets = Vec::new();
        let mut chars = SYNTHETIC_START_CHARS;
        loop {
            let offset = map.offset_after_visible_chars(text, chars);
            if offset >= text.len() {
                break;
            }
            if offsets.last().is_none_or(|&last| offset > last) {
                offsets.push(offset);
            }
            chars = chars.saturating_mul(2);
        }
        offsets.push(text.len());
        Self {
            offsets,
            synthetic: true,
        }
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Whether these came from the exponential fallback.
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Cut offsets to search, shortest first.
    ///
    /// Excludes the full length and prepends the minimal slice (the first
    /// five visible chars) when it is shorter than the first breakpoint.
    /// A text too short to cut yields only its full length.
    pub fn search_offsets(&self, text: &str, map: &MarkupMap) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .offsets
            .iter()
            .copied()
            .filter(|&offset| offset < text.len())
            .collect();
        let min_slice = map.offset_after_visible_chars(text, SYNTHETIC_START_CHARS);
        if min_slice < text.len() && out.first().is_none_or(|&first| min_slice < first) {
            out.insert(0, min_slice);
        }
        if out.is_empty() {
            out.push(text.len());
        }
        out
    }
}

fn separator_offsets(text: &str, separator: &Separator, map: &MarkupMap) -> Vec<usize> {
    let mut out = Vec::new();
    match separator {
        Separator::Literal(lit) => {
            let mut prev_end = None;
            for (start, matched) in text.match_indices(lit.as_str()) {
                let end = start + matched.len();
                if map.is_markup_byte(start) {
                    continue;
                }
                if prev_end != Some(start) {
                    out.push(start);
                }
                prev_end = Some(end);
            }
        }
        Separator::Pattern(re) => {
            let mut prev_end = None;
            for m in re.find_iter(text) {
                if map.is_markup_byte(m.start()) {
                    continue;
                }
                if prev_end != Some(m.start()) {
                    out.push(m.start());
                }
                prev_end = Some(m.end());
            }
        }
        Separator::Tokens(re) => {
            for m in re.find_iter(text) {
                out.push(map.snap_out_of_span(m.end()));
            }
        }
    }
    if !map.is_plain() {
        for offset in &mut out {
            *offset = map.snap_out_of_span(*offset);
        }
    }
    out
}

/// Offset of the first char a reader would see, or the text length.
fn first_visible_offset(text: &str, map: &MarkupMap) -> usize {
    text.char_indices()
        .find(|&(idx, ch)| !ch.is_whitespace() && !map.is_markup_byte(idx))
        .map_or(text.len(), |(idx, _)| idx)
}
