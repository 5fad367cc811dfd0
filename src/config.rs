//! Truncation configuration.

use core::num::NonZeroU32;
use core::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::EllipsisError;

/// Ellipsis used when none is configured.
pub const DEFAULT_ELLIPSIS: &str = "\u{2026}";

/// Class attribute of the span wrapping the append affordance.
pub const APPEND_CLASS: &str = "ellipsis-append";

/// Where a text may be cut.
#[derive(Clone, Debug)]
pub enum Separator {
    /// Cut before each run of this literal string.
    Literal(String),
    /// Cut before each run matched by this pattern.
    Pattern(Regex),
    /// Cut after each token matched by this pattern.
    Tokens(Regex),
}

impl Separator {
    /// Compile a serialized separator, rejecting empty literals and bad patterns.
    pub fn compile(spec: &SeparatorSpec) -> Result<Self, EllipsisError> {
        match spec {
            SeparatorSpec::Literal(lit) if lit.is_empty() => Err(EllipsisError::InvalidSeparator),
            SeparatorSpec::Literal(lit) => Ok(Self::Literal(lit.clone())),
            SeparatorSpec::Pattern(pattern) => compile_pattern(pattern).map(Self::Pattern),
            SeparatorSpec::Tokens(pattern) => compile_pattern(pattern).map(Self::Tokens),
        }
    }

    /// Serializable form of this separator.
    pub fn to_spec(&self) -> SeparatorSpec {
        match self {
            Self::Literal(lit) => SeparatorSpec::Literal(lit.clone()),
            Self::Pattern(re) => SeparatorSpec::Pattern(re.as_str().to_string()),
            Self::Tokens(re) => SeparatorSpec::Tokens(re.as_str().to_string()),
        }
    }
}

impl Default for Separator {
    fn default() -> Self {
        Self::Literal(" ".to_string())
    }
}

impl PartialEq for Separator {
    fn eq(&self, other: &Self) -> bool {
        self.to_spec() == other.to_spec()
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex, EllipsisError> {
    Regex::new(pattern).map_err(|source| EllipsisError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Serialized separator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeparatorSpec {
    Literal(String),
    Pattern(String),
    Tokens(String),
}

/// How the engine searches candidate cut points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Drop one candidate at a time from the end. O(n) measurements.
    Linear,
    /// Bisect the candidate list. O(log n) measurements.
    #[default]
    Binary,
}

/// Delays of the two update queues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Delay before text/visibility/refresh updates run.
    pub immediate_delay_ms: u64,
    /// Quiet period before resize-driven updates run.
    pub debounce_delay_ms: u64,
}

impl SchedulerConfig {
    pub fn immediate_delay(self) -> Duration {
        Duration::from_millis(self.immediate_delay_ms)
    }

    pub fn debounce_delay(self) -> Duration {
        Duration::from_millis(self.debounce_delay_ms)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            immediate_delay_ms: 0,
            debounce_delay_ms: 75,
        }
    }
}

/// Validated truncation options for one element.
#[derive(Clone, Debug, PartialEq)]
pub struct EllipsisConfig {
    /// Marker placed after the kept prefix. Always read as markup, so
    /// entities such as `&hellip;` are resolved.
    pub ellipsis_symbol: String,
    /// Optional affordance (text or markup) shown after the ellipsis.
    pub append: Option<String>,
    /// Cut policy.
    pub separator: Separator,
    /// Measure against the parent's height minus sibling heights.
    pub use_parent: bool,
    /// Clamp to this many lines instead of the element height.
    pub max_lines: Option<NonZeroU32>,
    /// Font size applied once the full text is found to overflow.
    pub fallback_font_size: Option<String>,
    /// Candidate search strategy.
    pub strategy: SearchStrategy,
    /// Update queue delays.
    pub scheduler: SchedulerConfig,
}

impl Default for EllipsisConfig {
    fn default() -> Self {
        Self {
            ellipsis_symbol: DEFAULT_ELLIPSIS.to_string(),
            append: None,
            separator: Separator::default(),
            use_parent: false,
            max_lines: None,
            fallback_font_size: None,
            strategy: SearchStrategy::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl EllipsisConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, EllipsisError> {
        let file: EllipsisConfigFile = serde_json::from_str(json)?;
        Self::try_from(file)
    }

    pub fn with_ellipsis_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.ellipsis_symbol = symbol.into();
        self
    }

    /// Set the append affordance. Empty strings disable it.
    pub fn with_append(mut self, append: impl Into<String>) -> Self {
        let append = append.into();
        self.append = (!append.is_empty()).then_some(append);
        self
    }

    pub fn with_separator(mut self, separator: Separator) -> Self {
        self.separator = separator;
        self
    }

    /// Cut before each run of `literal`.
    pub fn with_separator_literal(self, literal: &str) -> Result<Self, EllipsisError> {
        let separator = Separator::compile(&SeparatorSpec::Literal(literal.to_string()))?;
        Ok(self.with_separator(separator))
    }

    /// Cut before each match of `pattern`.
    pub fn with_separator_pattern(self, pattern: &str) -> Result<Self, EllipsisError> {
        let separator = Separator::compile(&SeparatorSpec::Pattern(pattern.to_string()))?;
        Ok(self.with_separator(separator))
    }

    /// Cut after each token matched by `pattern`.
    pub fn with_token_pattern(self, pattern: &str) -> Result<Self, EllipsisError> {
        let separator = Separator::compile(&SeparatorSpec::Tokens(pattern.to_string()))?;
        Ok(self.with_separator(separator))
    }

    pub fn with_use_parent(mut self, use_parent: bool) -> Self {
        self.use_parent = use_parent;
        self
    }

    pub fn with_max_lines(mut self, max_lines: u32) -> Result<Self, EllipsisError> {
        self.max_lines = Some(NonZeroU32::new(max_lines).ok_or(EllipsisError::InvalidMaxLines)?);
        Ok(self)
    }

    pub fn with_fallback_font_size(mut self, size: impl Into<String>) -> Self {
        self.fallback_font_size = Some(size.into());
        self
    }

    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Re-check invariants of a hand-assembled config.
    pub fn validate(&self) -> Result<(), EllipsisError> {
        if let Separator::Literal(lit) = &self.separator {
            if lit.is_empty() {
                return Err(EllipsisError::InvalidSeparator);
            }
        }
        Ok(())
    }

    /// Append affordance wrapped in its span, if one is configured.
    pub fn append_markup(&self) -> Option<String> {
        self.append
            .as_deref()
            .filter(|append| !append.is_empty())
            .map(|append| format!("<span class=\"{}\">{}</span>", APPEND_CLASS, append))
    }

    /// Everything placed after a cut prefix.
    pub fn suffix(&self) -> String {
        match self.append_markup() {
            Some(append) => format!("{}{}", self.ellipsis_symbol, append),
            None => self.ellipsis_symbol.clone(),
        }
    }
}

/// Serialized configuration, as loaded from JSON.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EllipsisConfigFile {
    pub ellipsis_symbol: Option<String>,
    pub append: Option<String>,
    pub separator: Option<SeparatorSpec>,
    pub use_parent: bool,
    pub max_lines: Option<u32>,
    pub fallback_font_size: Option<String>,
    pub strategy: SearchStrategy,
    pub scheduler: SchedulerConfig,
}

impl TryFrom<EllipsisConfigFile> for EllipsisConfig {
    type Error = EllipsisError;

    fn try_from(file: EllipsisConfigFile) -> Result<Self, Self::Error> {
        let separator = match &file.separator {
            Some(spec) => Separator::compile(spec)?,
            None => Separator::default(),
        };
        let max_lines = match file.max_lines {
            Some(lines) => Some(NonZeroU32::new(lines).ok_or(EllipsisError::InvalidMaxLines)?),
            None => None,
        };
        Ok(Self {
            ellipsis_symbol: file
                .ellipsis_symbol
                .unwrap_or_else(|| DEFAULT_ELLIPSIS.to_string()),
            append: file.append.filter(|append| !append.is_empty()),
            separator,
            use_parent: file.use_parent,
            max_lines,
            fallback_font_size: file.fallback_font_size,
            strategy: file.strategy,
            scheduler: file.scheduler,
        })
    }
}

impl From<&EllipsisConfig> for EllipsisConfigFile {
    fn from(config: &EllipsisConfig) -> Self {
        Self {
            ellipsis_symbol: Some(config.ellipsis_symbol.clone()),
            append: config.append.clone(),
            separator: Some(config.separator.to_spec()),
            use_parent: config.use_parent,
            max_lines: config.max_lines.map(NonZeroU32::get),
            fallback_font_size: config.fallback_font_size.clone(),
            strategy: config.strategy,
            scheduler: config.scheduler,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = EllipsisConfig::default();
        assert_eq!(cfg.ellipsis_symbol, "…");
        assert_eq!(cfg.separator, Separator::Literal(" ".to_string()));
        assert_eq!(cfg.strategy, SearchStrategy::Binary);
        assert_eq!(cfg.scheduler.immediate_delay(), Duration::ZERO);
        assert_eq!(cfg.scheduler.debounce_delay(), Duration::from_millis(75));
        assert_eq!(cfg.suffix(), "…");
    }

    #[test]
    fn append_is_wrapped_in_span() {
        let cfg = EllipsisConfig::default()
            .with_ellipsis_symbol("...")
            .with_append("read more");
        assert_eq!(
            cfg.suffix(),
            "...<span class=\"ellipsis-append\">read more</span>"
        );
        let cfg = cfg.with_append("");
        assert_eq!(cfg.append, None);
        assert_eq!(cfg.suffix(), "...");
    }

    #[test]
    fn json_config_is_validated() {
        let cfg = EllipsisConfig::from_json_str(
            r#"{
                "ellipsis_symbol": "---",
                "separator": { "pattern": "[ ,]+" },
                "max_lines": 3,
                "strategy": "linear",
                "scheduler": { "debounce_delay_ms": 120 }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.ellipsis_symbol, "---");
        assert!(matches!(cfg.separator, Separator::Pattern(ref re) if re.as_str() == "[ ,]+"));
        assert_eq!(cfg.max_lines.map(NonZeroU32::get), Some(3));
        assert_eq!(cfg.strategy, SearchStrategy::Linear);
        assert_eq!(cfg.scheduler.immediate_delay_ms, 0);
        assert_eq!(cfg.scheduler.debounce_delay_ms, 120);
    }

    #[test]
    fn json_rejects_bad_values() {
        assert!(matches!(
            EllipsisConfig::from_json_str(r#"{ "max_lines": 0 }"#),
            Err(EllipsisError::InvalidMaxLines)
        ));
        assert!(matches!(
            EllipsisConfig::from_json_str(r#"{ "separator": { "literal": "" } }"#),
            Err(EllipsisError::InvalidSeparator)
        ));
        assert!(matches!(
            EllipsisConfig::from_json_str(r#"{ "separator": { "tokens": "[" } }"#),
            Err(EllipsisError::InvalidPattern { .. })
        ));
        assert!(matches!(
            EllipsisConfig::from_json_str(r#"{ "ellipsis": "x" }"#),
            Err(EllipsisError::Config(_))
        ));
    }

    #[test]
    fn file_form_round_trips_through_json() {
        let cfg = EllipsisConfig::default()
            .with_append("more")
            .with_token_pattern(r"\S+")
            .unwrap()
            .with_max_lines(2)
            .unwrap();
        let json = serde_json::to_string(&EllipsisConfigFile::from(&cfg)).unwrap();
        assert_eq!(EllipsisConfig::from_json_str(&json).unwrap(), cfg);
    }

    #[test]
    fn validate_catches_hand_built_empty_literal() {
        let cfg = EllipsisConfig {
            separator: Separator::Literal(String::new()),
            ..EllipsisConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(EllipsisError::InvalidSeparator)));
        assert!(EllipsisConfig::default().validate().is_ok());
    }
}
