//! Text normalization
//!
//! The cleaning steps applied to email text before vectorization. The
//! vectorizer artifacts were fitted on text cleaned exactly this way, so the
//! order of the steps is frozen.

use regex::Regex;

/// Compiled cleaning patterns
pub struct TextNormalizer {
    url: Regex,
    non_alpha: Regex,
    whitespace: Regex,
}

impl TextNormalizer {
    /// Create a new normalizer
    pub fn new() -> Self {
        Self {
            url: Regex::new(r"http\S+").expect("URL pattern is valid"),
            non_alpha: Regex::new(r"[^a-z\s]").expect("character class pattern is valid"),
            whitespace: Regex::new(r"\s+").expect("whitespace pattern is valid"),
        }
    }

    /// Clean raw email text
    ///
    /// 1. lowercase
    /// 2. drop `http...` runs
    /// 3. drop everything except `a-z` and whitespace
    /// 4. collapse whitespace and trim
    pub fn normalize(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let without_urls = self.url.replace_all(&lowered, "");
        let letters_only = self.non_alpha.replace_all(&without_urls, "");
        let collapsed = self.whitespace.replace_all(&letters_only, " ");
        collapsed.trim().to_string()
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize a single text with a freshly compiled normalizer
pub fn normalize(text: &str) -> String {
    TextNormalizer::new().normalize(text)
}
