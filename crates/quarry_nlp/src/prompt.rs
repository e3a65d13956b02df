//! Prompts sent to the language model, and the analysis used when it is
//! unavailable.

use quarry_core::{IntentResult, NluAnalysis};

/// System prompt asking for a single JSON analysis object.
pub const SYSTEM_PROMPT: &str = "You are a data analysis assistant. Analyse the user's query \
and reply with ONLY a JSON object containing these keys:
- data_entity: the business entity being queried (users, orders, products, logs)
- query_type: one of statistics, analysis, trend, comparison, filter, aggregation, ranking, distribution, correlation
- conditions: filter conditions, in prose
- aggregations: aggregation functions and grouping, in prose
- time_range: the time range, in prose
- output_requirements: the desired output (table, chart, csv), in prose
- description: a one-sentence description of the query
Use an empty string for anything the query does not mention.";

/// User prompt carrying the request and the classifier's verdict.
///
/// # Examples
///
/// ```
/// use quarry_nlp::{IntentClassifier, user_prompt};
///
/// let intent = IntentClassifier::new().classify("how many users");
/// assert!(user_prompt("how many users", &intent).contains("how many users"));
/// ```
pub fn user_prompt(text: &str, intent: &IntentResult) -> String {
    format!(
        "Query: {}\nDetected intent: {}\nConfidence: {:.2}\n\nReturn the JSON analysis.",
        text,
        intent.intent(),
        intent.confidence()
    )
}

/// Analysis built from classifier output alone.
pub fn fallback_analysis(intent: &IntentResult) -> NluAnalysis {
    let parameters = intent.parameters();
    NluAnalysis {
        data_entity: parameters.entity.map(|entity| entity.to_string()),
        query_type: Some(intent.intent().to_string()),
        conditions: None,
        aggregations: parameters.aggregation.clone(),
        time_range: parameters.time_range.clone(),
        output_requirements: None,
        description: Some(format!("{} query", intent.intent())),
        fallback: true,
    }
}
