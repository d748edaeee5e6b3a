//! Sensitive value masking.

/// Replaces values of sensitive-looking field keys before they reach a
/// sink. A key is sensitive when it contains any configured keyword,
/// case-insensitively; the match is on the key only, values are replaced
/// wholesale.
#[derive(Debug, Clone)]
pub struct MaskPolicy {
    keywords: Vec<String>,
    mask: String,
}

impl Default for MaskPolicy {
    fn default() -> Self {
        Self {
            keywords: ["password", "token", "secret", "key"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            mask: "***".to_string(),
        }
    }
}

impl MaskPolicy {
    /// Policy that masks nothing.
    pub fn disabled() -> Self {
        Self {
            keywords: Vec::new(),
            mask: "***".to_string(),
        }
    }

    #[must_use]
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keywords.push(keyword.into().to_lowercase());
        self
    }

    #[must_use]
    pub fn with_mask(mut self, mask: impl Into<String>) -> Self {
        self.mask = mask.into();
        self
    }

    pub fn is_sensitive(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.keywords.iter().any(|kw| key.contains(kw.as_str()))
    }

    pub fn mask(&self) -> &str {
        &self.mask
    }
}
