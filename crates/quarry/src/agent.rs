//! The request-to-result facade.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use quarry_backend::BackendRegistry;
use quarry_core::{
    AnalyzedQuery, BackendKind, ExecutionOutcome, OutputFormat, PipelineConfig, QuarryConfig,
    Task, TaskStatus,
};
use quarry_error::{JsonError, QuarryResult};
use quarry_interface::{BackendStatus, ExecutionBackend, NluDriver};
use quarry_nlp::QueryCompiler;
use quarry_result::{ResultEnvelope, ResultMetadata, ResultProcessor};
use quarry_sql::SqlGenerator;
use quarry_task::{CostEstimate, CostModel, TaskBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Per-request execution settings.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters,
)]
#[setters(prefix = "with_")]
pub struct QueryOptions {
    /// Task priority, 1..=5
    priority: u8,
    /// Backend timeout for the task
    timeout_secs: u64,
    /// Return only this 1-based page of rows
    #[setters(strip_option)]
    page: Option<usize>,
    /// Rows per page when paginating
    page_size: usize,
}

impl QueryOptions {
    /// Options taking priority and timeout from the pipeline section.
    pub fn from_config(pipeline: &PipelineConfig) -> Self {
        Self::default()
            .with_priority(*pipeline.priority())
            .with_timeout_secs(*pipeline.timeout_secs())
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            priority: 1,
            timeout_secs: 3600,
            page: None,
            page_size: 100,
        }
    }
}

/// What [`Agent::estimate_cost`] reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct CostReport {
    estimate: CostEstimate,
    /// Complexity factor of the analyzed request
    complexity: f64,
    /// `COUNT(*)` over the request's source and filters, when connected
    estimated_row_count: Option<u64>,
    sql: String,
}

/// What [`Agent::status`] reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct AgentStatus {
    connected: bool,
    backend: BackendKind,
    timestamp: DateTime<Utc>,
    backend_status: BackendStatus,
}

/// Runs analytic requests end to end against one backend.
///
/// Every request is compiled, turned into a task, dispatched and formatted.
/// [`query`](Self::query) never returns an error: failures at any stage come
/// back as failure envelopes.
pub struct Agent<D: NluDriver> {
    compiler: QueryCompiler<D>,
    generator: SqlGenerator,
    tasks: TaskBuilder,
    processor: ResultProcessor,
    backend: Box<dyn ExecutionBackend>,
    default_format: OutputFormat,
    defaults: QueryOptions,
    supported: Vec<BackendKind>,
    connected: AtomicBool,
}

impl<D: NluDriver> Agent<D> {
    /// Agent over already built parts. Starts disconnected.
    pub fn new(
        compiler: QueryCompiler<D>,
        tasks: TaskBuilder,
        backend: Box<dyn ExecutionBackend>,
    ) -> Self {
        Self {
            compiler,
            generator: *tasks.generator(),
            tasks,
            processor: ResultProcessor::new(),
            backend,
            default_format: OutputFormat::default(),
            defaults: QueryOptions::default(),
            supported: BackendKind::ALL.to_vec(),
            connected: AtomicBool::new(false),
        }
    }

    /// Agent wired from configuration.
    ///
    /// `engine` overrides the configured default backend.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the backend cannot be created or the
    /// compiler rules fail to build.
    pub fn from_config(
        config: &QuarryConfig,
        nlu: D,
        registry: &BackendRegistry,
        engine: Option<BackendKind>,
    ) -> QuarryResult<Self> {
        let pipeline = config.pipeline();
        let kind = engine.unwrap_or(*pipeline.default_backend());
        let backend = registry.create_kind(kind, config.backend(kind))?;

        let compiler = QueryCompiler::new(nlu, config.catalog())?
            .with_sampling(*config.nlu().temperature(), *config.nlu().max_tokens());
        let generator = SqlGenerator::new().with_sample_size(*pipeline.sample_size());
        let tasks = TaskBuilder::from_config(config, generator);

        info!(backend = %kind, "Agent configured");
        Ok(Self::new(compiler, tasks, backend)
            .with_default_format(*pipeline.default_format())
            .with_defaults(QueryOptions::from_config(pipeline))
            .with_supported(registry.supported()))
    }

    /// Format used when neither the caller nor the request names one.
    pub fn with_default_format(mut self, format: OutputFormat) -> Self {
        self.default_format = format;
        self
    }

    /// Options used by [`preview`](Self::preview),
    /// [`estimate_cost`](Self::estimate_cost) and
    /// [`batch_query`](Self::batch_query).
    pub fn with_defaults(mut self, defaults: QueryOptions) -> Self {
        self.defaults = defaults;
        self
    }

    /// Engines reported by [`supported_engines`](Self::supported_engines).
    pub fn with_supported(mut self, supported: Vec<BackendKind>) -> Self {
        self.supported = supported;
        self
    }

    /// Backend this agent dispatches to.
    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Default per-request options.
    pub fn defaults(&self) -> &QueryOptions {
        &self.defaults
    }

    /// Whether [`connect`](Self::connect) has succeeded.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Connect the backend.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the backend cannot be reached.
    #[instrument(skip(self), fields(backend = %self.kind()))]
    pub async fn connect(&self) -> QuarryResult<()> {
        self.backend.connect().await?;
        self.connected.store(true, Ordering::SeqCst);
        info!("Agent connected");
        Ok(())
    }

    /// Disconnect the backend. Safe to call twice.
    #[instrument(skip(self), fields(backend = %self.kind()))]
    pub async fn disconnect(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            self.backend.disconnect().await;
            info!("Agent disconnected");
        }
    }

    /// Answer one request.
    ///
    /// `format` wins over a format named in the request text, which wins
    /// over the configured default.
    #[instrument(skip(self, text, options), fields(backend = %self.kind(), len = text.len()))]
    pub async fn query(
        &self,
        text: &str,
        format: Option<OutputFormat>,
        options: &QueryOptions,
    ) -> ResultEnvelope {
        let started = Instant::now();
        let fallback_format = format.unwrap_or(self.default_format);
        if !self.is_connected() {
            warn!("Query rejected, backend not connected");
            return self.not_connected(fallback_format);
        }

        match self.run_query(text, format, options, started).await {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "Query failed before execution");
                ResultEnvelope::failure(
                    e.to_string(),
                    ResultMetadata::new(fallback_format)
                        .with_execution_time(started.elapsed().as_secs_f64()),
                )
            }
        }
    }

    async fn run_query(
        &self,
        text: &str,
        format: Option<OutputFormat>,
        options: &QueryOptions,
        started: Instant,
    ) -> QuarryResult<ResultEnvelope> {
        let query = self.compiler.compile(text).await?;
        let mut task = self
            .tasks
            .build(&query, self.kind(), options.priority, options.timeout_secs)?;
        let format = self.resolve_format(format, &query);

        let sql = task.sql().sql().clone();
        let outcome = self.dispatch(&mut task, &sql).await?;

        let mut envelope = self.processor.process(&outcome, &query, format);
        if let Some(page) = options.page {
            envelope = self.processor.paginate(envelope, page, options.page_size);
        }
        if *envelope.success() {
            let info = query_info(&query, &task, started.elapsed().as_secs_f64())?;
            envelope = envelope.with_query_info(info);
        }
        debug!(task_id = %task.id(), status = %task.status(), "Query finished");
        Ok(envelope)
    }

    /// Run `sql` for `task`, moving it through running to its final state.
    async fn dispatch(&self, task: &mut Task, sql: &str) -> QuarryResult<ExecutionOutcome> {
        task.transition(TaskStatus::Running)?;
        let outcome = self.backend.execute(sql, task).await;
        let next = if *outcome.success() {
            TaskStatus::Completed
        } else {
            TaskStatus::Failed
        };
        task.transition(next)?;
        Ok(outcome)
    }

    fn resolve_format(&self, format: Option<OutputFormat>, query: &AnalyzedQuery) -> OutputFormat {
        let requested = *query.output().format();
        format.unwrap_or(if requested == OutputFormat::default() {
            self.default_format
        } else {
            requested
        })
    }

    fn not_connected(&self, format: OutputFormat) -> ResultEnvelope {
        ResultEnvelope::failure(
            format!("{} backend is not connected", self.kind()),
            ResultMetadata::new(format),
        )
    }

    /// Run the request's sample statement and return it as a table.
    #[instrument(skip(self, text), fields(backend = %self.kind()))]
    pub async fn preview(&self, text: &str, sample_size: u64) -> ResultEnvelope {
        let started = Instant::now();
        if !self.is_connected() {
            return self.not_connected(OutputFormat::Table);
        }

        let result: QuarryResult<ResultEnvelope> = async {
            let query = self.compiler.compile(text).await?;
            let mut task = self.tasks.build(
                &query,
                self.kind(),
                self.defaults.priority,
                self.defaults.timeout_secs,
            )?;
            let bundle = self
                .generator
                .clone()
                .with_sample_size(sample_size)
                .generate(&query, self.kind().dialect())?;
            let outcome = self.dispatch(&mut task, bundle.sample_sql()).await?;
            Ok(self.processor.process(&outcome, &query, OutputFormat::Table))
        }
        .await;

        result.unwrap_or_else(|e| {
            warn!(error = %e, "Preview failed");
            ResultEnvelope::failure(
                e.to_string(),
                ResultMetadata::new(OutputFormat::Table)
                    .with_execution_time(started.elapsed().as_secs_f64()),
            )
        })
    }

    /// Estimate run time, and the row count when connected.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be compiled into a task.
    #[instrument(skip(self, text), fields(backend = %self.kind()))]
    pub async fn estimate_cost(&self, text: &str) -> QuarryResult<CostReport> {
        let query = self.compiler.compile(text).await?;
        let task = self.tasks.build(
            &query,
            self.kind(),
            self.defaults.priority,
            self.defaults.timeout_secs,
        )?;
        let estimate = self.tasks.estimate(&task);

        let estimated_row_count = if self.is_connected() {
            Some(self.backend.execute_count(task.sql().count_sql(), &task).await)
        } else {
            None
        };
        debug!(rows = ?estimated_row_count, seconds = *estimate.estimated_seconds(), "Cost estimated");

        Ok(CostReport {
            complexity: CostModel::complexity(&query),
            estimate,
            estimated_row_count,
            sql: task.sql().sql().clone(),
        })
    }

    /// Answer requests one after another.
    ///
    /// Envelopes keep the input order and carry a 1-based `batch_index`; a
    /// failure affects only its own envelope.
    #[instrument(skip(self, texts), fields(backend = %self.kind(), count = texts.len()))]
    pub async fn batch_query<S: AsRef<str>>(
        &self,
        texts: &[S],
        format: Option<OutputFormat>,
    ) -> Vec<ResultEnvelope> {
        let mut envelopes = Vec::with_capacity(texts.len());
        for (index, text) in texts.iter().enumerate() {
            let envelope = self
                .query(text.as_ref(), format, &self.defaults)
                .await
                .with_batch_index(index + 1);
            if !*envelope.success() {
                warn!(batch_index = index + 1, error = ?envelope.error(), "Batch item failed");
            }
            envelopes.push(envelope);
        }
        envelopes
    }

    /// Connection state plus the backend's own report.
    pub async fn status(&self) -> AgentStatus {
        AgentStatus {
            connected: self.is_connected(),
            backend: self.kind(),
            timestamp: Utc::now(),
            backend_status: self.backend.status().await,
        }
    }

    /// Engines this agent could have been built for.
    pub fn supported_engines(&self) -> &[BackendKind] {
        &self.supported
    }
}

fn query_info(query: &AnalyzedQuery, task: &Task, total_time: f64) -> QuarryResult<Value> {
    let analyzed = serde_json::to_value(query)
        .map_err(|e| JsonError::new(format!("Failed to serialize analyzed query: {}", e)))?;
    let resources = serde_json::to_value(task.resources())
        .map_err(|e| JsonError::new(format!("Failed to serialize resources: {}", e)))?;
    Ok(json!({
        "original_query": query.original_query(),
        "analyzed_query": analyzed,
        "task_info": {
            "task_id": task.id().to_string(),
            "task_type": task.config().task_type().to_string(),
            "status": task.status().to_string(),
            "backend": task.backend().kind().to_string(),
            "priority": task.config().priority(),
            "sql": task.sql().sql(),
            "count_sql": task.sql().count_sql(),
            "sample_sql": task.sql().sample_sql(),
            "resources": resources,
            "created_at": task.created_at().to_rfc3339(),
        },
        "total_time": total_time,
    }))
}
