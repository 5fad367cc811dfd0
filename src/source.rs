//! Bound text content.

/// Text bound to an element, as plain text or markup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextSource {
    raw: String,
    markup: bool,
    trusted: Option<String>,
}

impl TextSource {
    /// Plain text, shown escaped.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            raw: text.into(),
            markup: false,
            trusted: None,
        }
    }

    /// Markup, shown as-is.
    pub fn markup(markup: impl Into<String>) -> Self {
        Self {
            raw: markup.into(),
            markup: true,
            trusted: None,
        }
    }

    /// Markup already vetted by the host's sanitizer.
    ///
    /// The trusted form replaces the raw value for display.
    pub fn trusted(raw: impl Into<String>, trusted: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            markup: true,
            trusted: Some(trusted.into()),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_markup(&self) -> bool {
        self.markup
    }

    pub fn is_trusted(&self) -> bool {
        self.trusted.is_some()
    }

    /// Text the engine works on: the trusted form when present, else the raw value.
    pub fn effective(&self) -> &str {
        self.trusted.as_deref().unwrap_or(&self.raw)
    }

    pub fn is_empty(&self) -> bool {
        self.effective().is_empty()
    }
}
