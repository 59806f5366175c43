//! Environmental cost arithmetic for token consumption.
//!
//! Converts token counts into approximate CO2 and water figures using fixed
//! linear coefficients, and provides the two token estimators used around
//! the completion call: a word-based pre-flight guess and a character-based
//! fallback for responses that arrive without usage metadata.

/// Conversion coefficients from tokens to environmental cost.
///
/// The defaults are rough literature estimates; actual values vary by model
/// and infrastructure. Both can be overridden through configuration.
#[derive(Debug, Clone, Copy)]
pub struct ImpactFactors {
    /// kg of CO2 per token.
    pub co2_per_token: f64,
    /// ml of water per token.
    pub water_per_token: f64,
}

impl ImpactFactors {
    /// CO2 estimate in kg for a token count.
    pub fn co2_for(&self, tokens: u64) -> f64 {
        tokens as f64 * self.co2_per_token
    }

    /// Water estimate in ml for a token count.
    pub fn water_for(&self, tokens: u64) -> f64 {
        tokens as f64 * self.water_per_token
    }
}

impl Default for ImpactFactors {
    fn default() -> Self {
        Self {
            co2_per_token: 0.000_000_4,
            water_per_token: 0.1,
        }
    }
}

/// Pre-flight token estimate for a question, used by the overflow gate
/// before the completion service is called.
///
/// Whitespace word count times `words_factor` (default 1.5). Deliberately
/// rough; the gate it feeds is soft admission control, not a guarantee.
pub fn estimate_question_tokens(question: &str, words_factor: f64) -> f64 {
    question.split_whitespace().count() as f64 * words_factor
}

/// Fallback token count for a completed exchange whose response carried no
/// usage metadata: combined character count divided by `chars_per_token`
/// (default 4), truncated.
///
/// Characters are Unicode scalar values, not bytes.
pub fn estimate_exchange_tokens(question: &str, response: &str, chars_per_token: f64) -> u64 {
    let chars = question.chars().count() + response.chars().count();
    (chars as f64 / chars_per_token) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn co2_and_water_scale_linearly() {
        let factors = ImpactFactors::default();
        assert!((factors.co2_for(13) - 0.0000052).abs() < 1e-12);
        assert!((factors.water_for(13) - 1.3).abs() < 1e-9);
        assert_eq!(factors.co2_for(0), 0.0);
        assert_eq!(factors.water_for(0), 0.0);
    }

    #[test]
    fn question_estimate_counts_whitespace_words() {
        assert_eq!(estimate_question_tokens("What is the capital of France?", 1.5), 9.0);
        // 20 words at the default factor is the classic gate example
        let twenty = vec!["word"; 20].join(" ");
        assert_eq!(estimate_question_tokens(&twenty, 1.5), 30.0);
        assert_eq!(estimate_question_tokens("", 1.5), 0.0);
        assert_eq!(estimate_question_tokens("   \t \n ", 1.5), 0.0);
    }

    #[test]
    fn exchange_estimate_truncates() {
        // 10 + 9 = 19 chars, / 4 = 4.75 -> 4
        assert_eq!(estimate_exchange_tokens("0123456789", "012345678", 4.0), 4);
        assert_eq!(estimate_exchange_tokens("", "", 4.0), 0);
    }

    #[test]
    fn exchange_estimate_counts_scalars_not_bytes() {
        // Four ideographs are 12 UTF-8 bytes but 4 chars each side.
        assert_eq!(estimate_exchange_tokens("日本語話", "日本語話", 4.0), 2);
    }
}
