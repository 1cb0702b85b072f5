//! Pipeline orchestration: parse, validate, execute.
//!
//! A [`Pipeline`] drives one request through the three stages and stops at
//! the first stage that fails. Parse and validation failures return their
//! diagnostics without data; everything past validation is the execution
//! stage's result, passed through as is.
//!
//! Each pipeline owns a multi-thread Tokio runtime used by
//! [`Pipeline::run_async`]. The blocking entry points never call
//! `Runtime::block_on`, so they may be called from threads that are
//! themselves driving another runtime.

use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::params::Params;
use graphweave_core::Diagnostic;
use graphweave_language::{parse, Source};
use graphweave_runtime::{execute, ExecuteParams, ExecutionResult, Scheduling};
use graphweave_validate::{validate, RuleSet};
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::Arc;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::AbortHandle;
use tracing::{debug, info_span, warn, Instrument, Span};

/// Request pipeline with its own worker pool
pub struct Pipeline {
    config: PipelineConfig,
    rules: RuleSet,
    handle: Handle,
    runtime: Option<Runtime>,
}

impl Pipeline {
    /// Start a pipeline and its worker runtime
    ///
    /// The rule set is the specified one, plus a depth limit when the
    /// configuration sets one.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is unusable or the runtime fails to start
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        config.check()?;
        let mut builder = Builder::new_multi_thread();
        builder.enable_all().thread_name(config.thread_name.clone());
        if let Some(threads) = config.worker_threads {
            builder.worker_threads(threads);
        }
        let runtime = builder.build()?;
        debug!(
            worker_threads = ?config.worker_threads,
            max_depth = config.max_depth,
            "Pipeline started"
        );

        Ok(Self {
            rules: RuleSet::specified().with_max_depth(config.max_depth),
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
            config,
        })
    }

    /// Replace the validation rules
    #[must_use]
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Active validation rules
    #[must_use]
    pub const fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Run a request with the given scheduling
    ///
    /// With [`Scheduling::WorkerPool`] the execution is spawned onto this
    /// pipeline's runtime, so the returned future may be awaited from any
    /// executor, including runtimes without timers. Dropping the future
    /// aborts the execution task. With [`Scheduling::SingleThread`]
    /// resolvers run inside the returned future.
    pub async fn execute(&self, params: Params, scheduling: Scheduling) -> ExecutionResult {
        let span = request_span(&params, scheduling);
        let execute_params = match span.in_scope(|| self.prepare(params)) {
            Ok(execute_params) => execute_params,
            Err(result) => return result,
        };
        let result = match scheduling {
            Scheduling::SingleThread => execute(execute_params, scheduling).instrument(span.clone()).await,
            Scheduling::WorkerPool => self.spawn_execution(execute_params, &span).await,
        };
        span.in_scope(|| finished(&result));
        result
    }

    /// Run a request on the worker pool, blocking until the result is complete
    #[must_use]
    pub fn run_async(&self, params: Params) -> ExecutionResult {
        futures::executor::block_on(self.execute(params, Scheduling::WorkerPool))
    }

    async fn spawn_execution(&self, params: ExecuteParams, span: &Span) -> ExecutionResult {
        let task = self
            .handle
            .spawn(execute(params, Scheduling::WorkerPool).instrument(span.clone()));
        let _abort = AbortOnDrop(task.abort_handle());
        match task.await {
            Ok(result) => result,
            Err(err) => {
                span.in_scope(|| warn!(error = %err, "Execution task failed"));
                ExecutionResult::from_errors(Diagnostic::new(format!("execution task failed: {}", err)))
            }
        }
    }

    /// Run a request entirely on the calling thread
    #[must_use]
    pub fn run_sync(&self, params: Params) -> ExecutionResult {
        futures::executor::block_on(self.execute(params, Scheduling::SingleThread))
    }

    /// Parse and validate; on failure, the result to return
    #[allow(clippy::result_large_err)]
    fn prepare(&self, params: Params) -> Result<ExecuteParams, ExecutionResult> {
        let Params {
            schema,
            request_string,
            root_value,
            variable_values,
            operation_name,
            context,
        } = params;

        debug!(bytes = request_string.len(), "Parsing request");
        let source = Source::new(request_string, self.config.source_name.as_str());
        let document = match parse(&source) {
            Ok(document) => document,
            Err(error) => {
                debug!(%error, "Request rejected by parser");
                return Err(ExecutionResult::from_errors(Diagnostic::from(error)));
            }
        };

        debug!(definitions = document.definitions.len(), rules = self.rules.len(), "Validating request");
        let verdict = validate(&schema, &document, &self.rules);
        if !verdict.is_valid {
            debug!(errors = verdict.diagnostics.len(), "Request rejected by validation");
            return Err(ExecutionResult::from_errors(verdict.diagnostics));
        }

        debug!("Executing request");
        Ok(ExecuteParams {
            schema,
            document: Arc::new(document),
            root: root_value,
            operation_name,
            args: variable_values,
            context,
        })
    }
}

impl Default for Pipeline {
    /// Pipeline with the default configuration
    ///
    /// # Panics
    ///
    /// Panics if the worker runtime cannot be started
    fn default() -> Self {
        Self::new(PipelineConfig::default()).expect("default pipeline runtime must start")
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        // Dropping a runtime blocks, which is not allowed inside async contexts
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

fn request_span(params: &Params, scheduling: Scheduling) -> Span {
    info_span!(
        "graphql_request",
        operation = params.operation_name.as_deref().unwrap_or(""),
        %scheduling
    )
}

fn finished(result: &ExecutionResult) {
    debug!(
        errors = result.errors.len(),
        has_data = result.data.is_some(),
        "Request finished"
    );
}

/// Aborts a spawned execution whose result is no longer awaited
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

static DEFAULT_PIPELINE: Lazy<Pipeline> = Lazy::new(Pipeline::default);

/// Run a request on the shared default pipeline's worker pool
///
/// Sibling fields and list items resolve concurrently; the call blocks
/// until the whole result is assembled.
#[must_use]
pub fn run_async(params: Params) -> ExecutionResult {
    DEFAULT_PIPELINE.run_async(params)
}

/// Run a request on the calling thread with no internal concurrency
#[must_use]
pub fn run_sync(params: Params) -> ExecutionResult {
    DEFAULT_PIPELINE.run_sync(params)
}
