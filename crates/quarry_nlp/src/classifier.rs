//! Keyword-scoring intent classifier.

use crate::keywords::{AGGREGATION_PHRASES, ENTITY_KEYWORDS, TIME_RANGE_PHRASES, intent_keywords};
use quarry_core::{Intent, IntentParameters, IntentResult};
use tracing::{debug, instrument};

/// Confidence reported when no keyword matches.
const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Classifies free text into an [`Intent`].
///
/// Stateless; one instance can serve any number of concurrent callers.
///
/// # Examples
///
/// ```
/// use quarry_core::Intent;
/// use quarry_nlp::IntentClassifier;
///
/// let result = IntentClassifier::new().classify("xyz123");
/// assert_eq!(*result.intent(), Intent::Statistics);
/// assert_eq!(*result.confidence(), 0.5);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    /// Create a classifier.
    pub fn new() -> Self {
        Self
    }

    /// Score every intent and pick the best; ties go to the earlier entry of
    /// [`Intent::PRIORITY`].
    #[instrument(skip(self, text), fields(len = text.len()))]
    pub fn classify(&self, text: &str) -> IntentResult {
        let lowered = text.to_lowercase();

        let mut best: Option<(Intent, usize)> = None;
        for intent in Intent::PRIORITY {
            let score = intent_keywords(intent)
                .iter()
                .filter(|keyword| lowered.contains(*keyword))
                .count();
            if score > best.map_or(0, |(_, top)| top) {
                best = Some((intent, score));
            }
        }

        let (intent, confidence) = match best {
            Some((intent, score)) => {
                let total = intent_keywords(intent).len() as f64;
                (intent, (score as f64 / total).min(1.0))
            }
            None => (Intent::Statistics, DEFAULT_CONFIDENCE),
        };

        let parameters = extract_parameters(&lowered);
        debug!(intent = %intent, confidence, ?parameters, "Classified request");

        IntentResult::new(intent, confidence, parameters, text)
    }
}

fn extract_parameters(lowered: &str) -> IntentParameters {
    IntentParameters {
        time_range: first_phrase(lowered, TIME_RANGE_PHRASES),
        aggregation: first_phrase(lowered, AGGREGATION_PHRASES),
        limit: first_number(lowered),
        entity: ENTITY_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
            .map(|(entity, _)| *entity),
    }
}

fn first_phrase(lowered: &str, phrases: &[&str]) -> Option<String> {
    phrases
        .iter()
        .find(|phrase| lowered.contains(*phrase))
        .map(|phrase| phrase.to_string())
}

/// First run of ASCII digits, if it fits in a `u64`.
pub(crate) fn first_number(text: &str) -> Option<u64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}
