use text_ellipsis::{CellBox, DisplayContent, RenderTarget};

pub const FOX: &str = "The quick brown fox jumps over the lazy dog";

pub const WORDS: &[&str] = &[
    "a", "an", "the", "ink", "quill", "margin", "folio", "vellum", "serif", "kerning", "leading",
    "glyph", "page", "spine", "gutter", "recto", "verso", "colophon", "octavo", "em",
];

/// Deterministic xorshift64 generator for property loops.
pub struct XorShift(u64);

impl XorShift {
    pub fn new(seed: u64) -> Self {
        Self(seed.max(1))
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    pub fn below(&mut self, bound: usize) -> usize {
        (self.next_u64() % bound.max(1) as u64) as usize
    }

    pub fn range(&mut self, lo: usize, hi: usize) -> usize {
        lo + self.below(hi - lo + 1)
    }
}

/// `count` words from [`WORDS`] joined by single spaces.
pub fn sentence(rng: &mut XorShift, count: usize) -> String {
    (0..count)
        .map(|_| WORDS[rng.below(WORDS.len())])
        .collect::<Vec<_>>()
        .join(" ")
}

/// Probe rendering each candidate into a fresh `columns × rows` cell box.
pub fn cell_probe(columns: usize, rows: usize) -> impl FnMut(&DisplayContent) -> bool {
    let mut cell = CellBox::new(columns, rows);
    move |content: &DisplayContent| {
        cell.render(content);
        cell.metrics().overflows()
    }
}

/// Text of `content` before the ellipsis and append affordance.
pub fn kept_prefix<'a>(content: &'a str, ellipsis: &str) -> &'a str {
    content.rfind(ellipsis).map_or(content, |idx| &content[..idx])
}
