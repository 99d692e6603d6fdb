//! Locales and language-range preferences (RFC 4647 basic filtering).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A language with an optional country, e.g. `fr-FR`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale {
    language: String,
    country: Option<String>,
}

impl Locale {
    /// Creates a locale from a language code.
    pub fn language(language: impl Into<String>) -> Self {
        Self {
            language: language.into().to_ascii_lowercase(),
            country: None,
        }
    }

    /// Creates a locale from language and country codes.
    pub fn new(language: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            language: language.into().to_ascii_lowercase(),
            country: Some(country.into().to_ascii_uppercase()),
        }
    }

    /// English, the root of the built-in message bundles.
    pub fn english() -> Self {
        Self::language("en")
    }

    /// Language code.
    pub fn language_code(&self) -> &str {
        &self.language
    }

    /// Country code.
    pub fn country_code(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// BCP 47 tag, e.g. `fr-FR`.
    pub fn tag(&self) -> String {
        match &self.country {
            Some(country) => format!("{}-{}", self.language, country),
            None => self.language.clone(),
        }
    }

    /// Bundle suffixes to try, most specific first: `fr_FR`, `fr`, then root.
    pub fn fallback_chain(&self) -> Vec<String> {
        let mut chain = Vec::with_capacity(3);
        if let Some(country) = &self.country {
            chain.push(format!("{}_{}", self.language, country));
        }
        chain.push(self.language.clone());
        chain.push(String::new());
        chain
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

/// Error returned for malformed locale tags or language ranges.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid locale or language range '{0}'")]
pub struct LocaleParseError(pub String);

impl FromStr for Locale {
    type Err = LocaleParseError;

    /// Parses `fr`, `fr-FR` or `fr_FR`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut parts = input.trim().split(['-', '_']);
        let language = parts.next().unwrap_or_default();
        if language.is_empty() || !language.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(LocaleParseError(input.to_string()));
        }
        match (parts.next(), parts.next()) {
            (None, _) => Ok(Self::language(language)),
            (Some(country), None) if !country.is_empty() => Ok(Self::new(language, country)),
            _ => Err(LocaleParseError(input.to_string())),
        }
    }
}

impl TryFrom<String> for Locale {
    type Error = LocaleParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Locale> for String {
    fn from(value: Locale) -> Self {
        value.tag()
    }
}

/// A weighted language range, e.g. `fr;q=0.9`.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageRange {
    range: String,
    weight: f64,
}

impl LanguageRange {
    /// Maximum weight.
    pub const MAX_WEIGHT: f64 = 1.0;

    /// Creates a range with the given weight.
    pub fn new(range: impl Into<String>, weight: f64) -> Self {
        Self {
            range: range.into().to_ascii_lowercase(),
            weight,
        }
    }

    /// The range, lowercased.
    pub fn range(&self) -> &str {
        &self.range
    }

    /// The weight in `[0, 1]`.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Parses an `Accept-Language` style list, e.g. `fr-FR,fr;q=0.9`.
    ///
    /// The result is sorted by descending weight; ranges of equal weight
    /// keep their order. Ranges with weight 0 are dropped.
    pub fn parse(input: &str) -> Result<Vec<LanguageRange>, LocaleParseError> {
        let error = || LocaleParseError(input.to_string());
        let mut ranges = Vec::new();
        for item in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (range, weight) = match item.split_once(';') {
                Some((range, params)) => {
                    let q = params
                        .trim()
                        .strip_prefix("q=")
                        .ok_or_else(error)?
                        .trim()
                        .parse::<f64>()
                        .map_err(|_| error())?;
                    if !(0.0..=Self::MAX_WEIGHT).contains(&q) {
                        return Err(error());
                    }
                    (range.trim(), q)
                }
                None => (item, Self::MAX_WEIGHT),
            };
            let valid = range == "*"
                || range
                    .split('-')
                    .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '*'));
            if !valid {
                return Err(error());
            }
            if weight > 0.0 {
                ranges.push(LanguageRange::new(range, weight));
            }
        }
        ranges.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        Ok(ranges)
    }

    /// Basic filtering: the range equals the tag or is a prefix of it
    /// followed by `-`. `*` matches everything.
    pub fn matches(&self, locale: &Locale) -> bool {
        let tag = locale.tag().to_ascii_lowercase();
        self.range == "*"
            || tag == self.range
            || (tag.starts_with(&self.range) && tag[self.range.len()..].starts_with('-'))
    }

    /// Filters `locales` by `ranges` (highest weight first), without
    /// duplicates.
    pub fn filter(ranges: &[LanguageRange], locales: &[Locale]) -> Vec<Locale> {
        let mut matched: Vec<Locale> = Vec::new();
        for range in ranges {
            for locale in locales {
                if range.matches(locale) && !matched.contains(locale) {
                    matched.push(locale.clone());
                }
            }
        }
        matched
    }
}
