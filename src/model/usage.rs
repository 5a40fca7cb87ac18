//! Token usage types.

use serde_json::Value;
use std::ops::AddAssign;

/// Token usage reported on one assistant message, or summed over many.
///
/// Cache tokens are tracked separately and do not count towards [`total`].
///
/// [`total`]: TokenUsage::total
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    /// Uncached input tokens.
    pub input_tokens: u64,
    /// Generated output tokens.
    pub output_tokens: u64,
    /// Tokens served from the prompt cache.
    pub cache_read_input_tokens: u64,
    /// Tokens written to the prompt cache.
    pub cache_creation_input_tokens: u64,
}

impl TokenUsage {
    /// Read a `usage` object. Missing or non-integer fields count as zero.
    pub fn from_json(usage: Option<&Value>) -> Self {
        let Some(Value::Object(map)) = usage else {
            return Self::default();
        };
        let field = |key: &str| map.get(key).and_then(Value::as_u64).unwrap_or(0);
        Self {
            input_tokens: field("input_tokens"),
            output_tokens: field("output_tokens"),
            cache_read_input_tokens: field("cache_read_input_tokens"),
            cache_creation_input_tokens: field("cache_creation_input_tokens"),
        }
    }

    /// Input plus output, saturating. Cache tokens excluded.
    pub fn total(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: Self) {
        self.input_tokens = self.input_tokens.saturating_add(rhs.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(rhs.output_tokens);
        self.cache_read_input_tokens = self
            .cache_read_input_tokens
            .saturating_add(rhs.cache_read_input_tokens);
        self.cache_creation_input_tokens = self
            .cache_creation_input_tokens
            .saturating_add(rhs.cache_creation_input_tokens);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_usage_total_excludes_cache() {
        let usage = TokenUsage {
            input_tokens: 100,
            output_tokens: 50,
            cache_creation_input_tokens: 20,
            cache_read_input_tokens: 30,
        };
        assert_eq!(usage.total(), 150);
    }

    #[test]
    fn test_token_usage_default() {
        let usage = TokenUsage::default();
        assert_eq!(usage.input_tokens, 0);
        assert_eq!(usage.output_tokens, 0);
        assert_eq!(usage.cache_creation_input_tokens, 0);
        assert_eq!(usage.cache_read_input_tokens, 0);
    }

    #[test]
    fn from_json_reads_all_four_categories() {
        let raw = json!({
            "input_tokens": 5,
            "output_tokens": 3,
            "cache_read_input_tokens": 7,
            "cache_creation_input_tokens": 11
        });
        let usage = TokenUsage::from_json(Some(&raw));
        assert_eq!(
            usage,
            TokenUsage {
                input_tokens: 5,
                output_tokens: 3,
                cache_read_input_tokens: 7,
                cache_creation_input_tokens: 11,
            }
        );
    }

    #[test]
    fn from_json_tolerates_missing_and_wrong_types() {
        let raw = json!({"input_tokens": "lots", "output_tokens": 4});
        let usage = TokenUsage::from_json(Some(&raw));
        assert_eq!(usage.input_tokens, 0);
        assert_eq!(usage.output_tokens, 4);

        assert_eq!(TokenUsage::from_json(None), TokenUsage::default());
        assert_eq!(
            TokenUsage::from_json(Some(&json!([1, 2]))),
            TokenUsage::default()
        );
    }

    #[test]
    fn total_and_add_assign_saturate() {
        let max = TokenUsage {
            input_tokens: u64::MAX,
            output_tokens: 1,
            cache_read_input_tokens: u64::MAX - 1,
            cache_creation_input_tokens: 0,
        };
        assert_eq!(max.total(), u64::MAX);

        let mut acc = max;
        acc += max;
        assert_eq!(acc.input_tokens, u64::MAX);
        assert_eq!(acc.output_tokens, 2);
        assert_eq!(acc.cache_read_input_tokens, u64::MAX);
        assert_eq!(acc.cache_creation_input_tokens, 0);
    }

    #[test]
    fn add_assign_sums_every_field() {
        let mut acc = TokenUsage {
            input_tokens: 1,
            output_tokens: 2,
            cache_read_input_tokens: 3,
            cache_creation_input_tokens: 4,
        };
        acc += acc;
        assert_eq!(acc.input_tokens, 2);
        assert_eq!(acc.output_tokens, 4);
        assert_eq!(acc.cache_read_input_tokens, 6);
        assert_eq!(acc.cache_creation_input_tokens, 8);
    }
}
