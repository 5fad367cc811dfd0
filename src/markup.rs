//! Tag-aware offsets for markup text.
//!
//! Markup is cut as a byte string, so a cut must never split a tag or an
//! entity reference, and every element still open at the cut has to be
//! closed again before the suffix is appended.

use std::borrow::Cow;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use smallvec::SmallVec;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Clone, Debug, PartialEq, Eq)]
enum SpanKind {
    Open(Box<str>),
    Close(Box<str>),
    /// Self-contained tag: empty element, void element, comment, CDATA, PI.
    Atomic,
    /// `<br>`, one visible line break.
    LineBreak,
    /// Entity or character reference, one visible char.
    Entity,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
    kind: SpanKind,
}

/// Byte ranges of tags and references inside a markup string.
///
/// A map built with [`MarkupMap::plain`] has no spans, so every offset
/// helper degrades to plain char-boundary logic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkupMap {
    spans: Vec<Span>,
}

impl MarkupMap {
    /// Map for plain text.
    pub fn plain() -> Self {
        Self::default()
    }

    /// Scan `markup` for tags and references.
    ///
    /// HTML is looser than XML: a `<` or `&` that cannot start a tag or a
    /// reference is text. If the reader still rejects something, the rest is
    /// lexed tag by tag, so no `<…>` region is ever mistaken for text.
    pub fn scan(markup: &str) -> Self {
        let lenient = lenient_copy(markup);
        let mut reader = Reader::from_str(&lenient);
        reader.config_mut().trim_text(false);
        reader.config_mut().check_end_names = false;
        let mut spans = Vec::new();

        loop {
            let start = reader_offset(&reader);
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(err) => {
                    log::warn!(
                        "markup reader failed at byte {}: {:?}; lexing the rest leniently",
                        start,
                        err
                    );
                    lex_tags(markup, start, &mut spans);
                    break;
                }
            };
            let end = reader_offset(&reader);
            let kind = match event {
                Event::Start(e) => open_kind(tag_name(e.name().as_ref())),
                Event::Empty(e) if tag_name(e.name().as_ref()) == "br" => SpanKind::LineBreak,
                Event::End(e) => SpanKind::Close(tag_name(e.name().as_ref()).into_boxed_str()),
                Event::GeneralRef(_) => SpanKind::Entity,
                Event::Text(_) => continue,
                Event::Eof => break,
                _ => SpanKind::Atomic,
            };
            spans.push(Span { start, end, kind });
        }

        Self { spans }
    }

    pub fn is_plain(&self) -> bool {
        self.spans.is_empty()
    }

    /// Whether the byte at `offset` belongs to a tag or reference.
    pub fn is_markup_byte(&self, offset: usize) -> bool {
        self.first_span_ending_after(offset)
            .is_some_and(|span| span.start <= offset)
    }

    /// Move `offset` back to the start of the tag or reference enclosing it.
    pub fn snap_out_of_span(&self, offset: usize) -> usize {
        self.first_span_ending_after(offset)
            .filter(|span| span.start < offset)
            .map_or(offset, |span| span.start)
    }

    // Spans are sorted and disjoint, so `end <= offset` holds for a prefix.
    fn first_span_ending_after(&self, offset: usize) -> Option<&Span> {
        let idx = self.spans.partition_point(|span| span.end <= offset);
        self.spans.get(idx)
    }

    /// Byte offset just past the first `count` visible chars of `markup`.
    ///
    /// Tags count zero chars, references count one. Returns `markup.len()`
    /// when the text has fewer visible chars.
    pub fn offset_after_visible_chars(&self, markup: &str, count: usize) -> usize {
        if count == 0 {
            return 0;
        }
        let mut seen = 0usize;
        let mut spans = self.spans.iter().peekable();
        let mut offset = 0usize;
        while offset < markup.len() {
            while spans.peek().is_some_and(|span| span.end <= offset) {
                spans.next();
            }
            if let Some(span) = spans.peek().filter(|span| span.start == offset) {
                offset = span.end;
                if span.kind == SpanKind::Entity {
                    seen += 1;
                    if seen == count {
                        return offset;
                    }
                }
                continue;
            }
            let ch_len = markup[offset..].chars().next().map_or(1, char::len_utf8);
            offset += ch_len;
            seen += 1;
            if seen == count {
                return offset;
            }
        }
        markup.len()
    }

    /// Names of elements opened before `cut` and not yet closed, outermost first.
    pub fn open_elements_at(&self, cut: usize) -> SmallVec<[&str; 8]> {
        let mut stack: SmallVec<[&str; 8]> = SmallVec::new();
        for span in self.spans.iter().take_while(|span| span.end <= cut) {
            match &span.kind {
                SpanKind::Open(name) => stack.push(&**name),
                SpanKind::Close(name) => {
                    if let Some(pos) = stack.iter().rposition(|open| *open == &**name) {
                        stack.truncate(pos);
                    }
                }
                SpanKind::Atomic | SpanKind::LineBreak | SpanKind::Entity => {}
            }
        }
        stack
    }

    /// Closing tags for every element still open at `cut`, innermost first.
    pub fn closing_tags_at(&self, cut: usize) -> String {
        let mut out = String::new();
        for name in self.open_elements_at(cut).iter().rev() {
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        out
    }

    /// Text a reader would see: tags removed, references resolved.
    pub fn visible_text<'a>(&self, markup: &'a str) -> Cow<'a, str> {
        if self.spans.is_empty() {
            return Cow::Borrowed(markup);
        }
        let mut out = String::with_capacity(markup.len());
        let mut offset = 0usize;
        for span in &self.spans {
            if span.start > offset {
                out.push_str(&markup[offset..span.start]);
            }
            match span.kind {
                SpanKind::Entity => out.push_str(&resolve_reference(&markup[span.start..span.end])),
                SpanKind::LineBreak => out.push('\n'),
                _ => {}
            }
            offset = offset.max(span.end);
        }
        if offset < markup.len() {
            out.push_str(&markup[offset..]);
        }
        Cow::Owned(out)
    }
}

fn open_kind(name: String) -> SpanKind {
    if name == "br" {
        SpanKind::LineBreak
    } else if VOID_ELEMENTS.contains(&name.as_str()) {
        SpanKind::Atomic
    } else {
        SpanKind::Open(name.into_boxed_str())
    }
}

/// Whether `next`, the byte after a `<`, makes it a tag opener.
fn starts_tag(next: Option<u8>) -> bool {
    next.is_some_and(|b| b.is_ascii_alphabetic() || matches!(b, b'/' | b'!' | b'?'))
}

/// Length of the reference starting at `bytes[0] == b'&'`, if it is one.
fn reference_len(bytes: &[u8]) -> Option<usize> {
    let body = bytes.get(1..)?;
    let (skip, radix) = match body {
        [b'#', b'x' | b'X', ..] => (2, 16),
        [b'#', ..] => (1, 10),
        [first, ..] if first.is_ascii_alphabetic() => (0, 36),
        _ => return None,
    };
    let name = body.get(skip..)?;
    let len = name
        .iter()
        .take_while(|&&b| char::from(b).is_digit(radix))
        .count();
    (len > 0 && name.get(len) == Some(&b';')).then_some(1 + skip + len + 1)
}

/// `markup` with every stray `<` and `&` blanked out. Byte offsets are kept.
fn lenient_copy(markup: &str) -> Cow<'_, str> {
    let bytes = markup.as_bytes();
    let mut patched: Option<Vec<u8>> = None;
    for (idx, &byte) in bytes.iter().enumerate() {
        let stray = match byte {
            b'<' => !starts_tag(bytes.get(idx + 1).copied()),
            b'&' => reference_len(&bytes[idx..]).is_none(),
            _ => false,
        };
        if stray {
            if let Some(slot) = patched
                .get_or_insert_with(|| bytes.to_vec())
                .get_mut(idx)
            {
                *slot = b' ';
            }
        }
    }
    match patched {
        Some(bytes) => String::from_utf8(bytes).map_or(Cow::Borrowed(markup), Cow::Owned),
        None => Cow::Borrowed(markup),
    }
}

/// Hand lexer for whatever the reader gave up on, starting at `from`.
///
/// An unterminated tag runs to the end of the text.
fn lex_tags(markup: &str, from: usize, spans: &mut Vec<Span>) {
    let bytes = markup.as_bytes();
    let mut offset = from;
    while offset < bytes.len() {
        let tail = &bytes[offset..];
        match tail.first() {
            Some(b'<') if starts_tag(tail.get(1).copied()) => {
                let end = tail
                    .iter()
                    .position(|&b| b == b'>')
                    .map_or(bytes.len(), |pos| offset + pos + 1);
                spans.push(Span {
                    start: offset,
                    end,
                    kind: lexed_tag_kind(&markup[offset..end]),
                });
                offset = end;
            }
            Some(b'&') => match reference_len(tail) {
                Some(len) => {
                    spans.push(Span {
                        start: offset,
                        end: offset + len,
                        kind: SpanKind::Entity,
                    });
                    offset += len;
                }
                None => offset += 1,
            },
            _ => offset += 1,
        }
    }
}

fn lexed_tag_kind(raw: &str) -> SpanKind {
    let inner = raw.trim_start_matches('<');
    let inner = inner.strip_suffix('>').unwrap_or(inner);
    if inner.starts_with(['!', '?']) {
        return SpanKind::Atomic;
    }
    let (closing, inner) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };
    let name_len = inner
        .find(|c: char| c.is_ascii_whitespace() || c == '/')
        .unwrap_or(inner.len());
    let name = tag_name(inner[..name_len].as_bytes());
    if closing {
        SpanKind::Close(name.into_boxed_str())
    } else if inner.ends_with('/') {
        if name == "br" {
            SpanKind::LineBreak
        } else {
            SpanKind::Atomic
        }
    } else {
        open_kind(name)
    }
}

fn reader_offset(reader: &Reader<&[u8]>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

fn resolve_reference(reference: &str) -> Cow<'_, str> {
    match reference {
        "&nbsp;" => Cow::Borrowed("\u{00A0}"),
        "&hellip;" => Cow::Borrowed("\u{2026}"),
        "&mdash;" => Cow::Borrowed("\u{2014}"),
        "&ndash;" => Cow::Borrowed("\u{2013}"),
        _ => quick_xml::escape::unescape(reference).unwrap_or(Cow::Borrowed(reference)),
    }
}
