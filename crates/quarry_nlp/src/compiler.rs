//! Free text to [`AnalyzedQuery`].

use crate::{
    IntentClassifier, SYSTEM_PROMPT, fallback_analysis, parse_analysis, rules::Rules, user_prompt,
};
use chrono::NaiveDate;
use quarry_core::{AnalyzedQuery, IntentResult, NluAnalysis, NluRequest, SourceCatalog};
use quarry_error::{BuilderError, QuarryResult};
use quarry_interface::NluDriver;
use tracing::{debug, instrument, warn};

const ENTITY_BOOST: f64 = 0.2;
const CONDITIONS_BOOST: f64 = 0.1;
const AGGREGATIONS_BOOST: f64 = 0.1;

/// Compiles analytic requests into the query IR.
///
/// The language-model round trip is best effort: any failure falls back to
/// an analysis built from the classifier alone, so [`compile`](Self::compile)
/// only fails if the IR itself cannot be assembled.
pub struct QueryCompiler<D: NluDriver> {
    classifier: IntentClassifier,
    nlu: D,
    catalog: SourceCatalog,
    temperature: f32,
    max_tokens: u32,
    rules: Rules,
    reference_date: Option<NaiveDate>,
}

impl<D: NluDriver> QueryCompiler<D> {
    /// Create a compiler over `nlu`, resolving tables through `catalog`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the phrase rules fail to compile.
    pub fn new(nlu: D, catalog: SourceCatalog) -> QuarryResult<Self> {
        Ok(Self {
            classifier: IntentClassifier::new(),
            nlu,
            catalog,
            temperature: 0.7,
            max_tokens: 4000,
            rules: Rules::new()?,
            reference_date: None,
        })
    }

    /// Override the sampling parameters sent with every request.
    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Pin "today" for relative time phrases.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// The classifier used for the first pass.
    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    /// The language-model driver.
    pub fn nlu(&self) -> &D {
        &self.nlu
    }

    /// The source catalog.
    pub fn catalog(&self) -> &SourceCatalog {
        &self.catalog
    }

    /// Compile one request.
    ///
    /// # Errors
    ///
    /// Returns a builder error if the assembled IR is rejected.
    #[instrument(skip(self, text), fields(provider = self.nlu.provider_name(), len = text.len()))]
    pub async fn compile(&self, text: &str) -> QuarryResult<AnalyzedQuery> {
        let intent = self.classifier.classify(text);
        let analysis = self.analyze(text, &intent).await;
        let lowered = text.to_lowercase();

        let data_source = self.catalog.resolve(analysis.data_entity.as_deref(), text);
        let conditions = self.rules.conditions(&lowered);
        let aggregation = self.rules.aggregation(&lowered).or_else(|| {
            analysis
                .aggregations
                .as_deref()
                .map(str::to_lowercase)
                .and_then(|described| self.rules.aggregation(&described))
        });
        let today = self
            .reference_date
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let time_window = self.rules.time_window(&lowered, today).or_else(|| {
            analysis
                .time_range
                .as_deref()
                .map(str::to_lowercase)
                .and_then(|described| self.rules.time_window(&described, today))
        });
        let output = self
            .rules
            .output(&lowered, &analysis, *intent.intent(), aggregation.as_ref());
        let confidence = combined_confidence(&intent, &analysis);
        let description = analysis
            .description
            .clone()
            .unwrap_or_else(|| format!("{} query", intent.intent()));

        debug!(
            intent = %intent.intent(),
            confidence,
            source = %data_source.name(),
            conditions = conditions.len(),
            fallback = analysis.fallback,
            "Compiled request"
        );

        let mut builder = AnalyzedQuery::builder();
        builder
            .original_query(text)
            .intent(intent)
            .data_source(data_source)
            .conditions(conditions)
            .output(output)
            .analysis(analysis)
            .description(description)
            .confidence_score(confidence);
        if let Some(aggregation) = aggregation {
            builder.aggregation(aggregation);
        }
        if let Some(window) = time_window {
            builder.time_window(window);
        }

        builder
            .build()
            .map_err(|e| BuilderError::incomplete("analyzed query", e.to_string()).into())
    }

    async fn analyze(&self, text: &str, intent: &IntentResult) -> NluAnalysis {
        let request = NluRequest::builder()
            .system_prompt(SYSTEM_PROMPT)
            .user_prompt(user_prompt(text, intent))
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build();
        let request = match request {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Could not build NLU request, using classifier fallback");
                return fallback_analysis(intent);
            }
        };

        match self
            .nlu
            .invoke(&request)
            .await
            .and_then(|reply| parse_analysis(&reply))
        {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(
                    error = %e,
                    provider = self.nlu.provider_name(),
                    "NLU analysis unavailable, using classifier fallback"
                );
                fallback_analysis(intent)
            }
        }
    }
}

fn combined_confidence(intent: &IntentResult, analysis: &NluAnalysis) -> f64 {
    let mut score = *intent.confidence();
    if analysis.data_entity.is_some() {
        score += ENTITY_BOOST;
    }
    if analysis.conditions.is_some() {
        score += CONDITIONS_BOOST;
    }
    if analysis.aggregations.is_some() {
        score += AGGREGATIONS_BOOST;
    }
    score.min(1.0)
}
