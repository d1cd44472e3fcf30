//! The iterative refinement loop.
//!
//! Each iteration sends the full text (plus the previous snapshot as a
//! draft) to the model, parses and validates the reply, merges it over the
//! draft, and persists the result. Iterations run strictly one after
//! another with a configurable pause between calls; a failed iteration is
//! either skipped, leaving the last good snapshot as the next draft, or
//! aborts the run, depending on [`FailureMode`].

use crate::graph::{GraphSnapshot, SnapshotError};
use crate::merge;
use crate::model::TextModel;
use crate::prompt::{self, PromptPlan};
use crate::render;
use crate::schema::SchemaOptions;
use crate::stats::GraphStats;
use crate::store::SnapshotStore;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that end a run early.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to load seed snapshot from {}: {source}", .path.display())]
    Seed {
        path: PathBuf,
        source: SnapshotError,
    },

    #[error("failed to persist iteration {iteration}: {source}")]
    Persist {
        iteration: usize,
        source: SnapshotError,
    },

    #[error("iteration {iteration} failed: {source}")]
    Iteration {
        iteration: usize,
        source: IterationError,
    },
}

/// Why a single iteration produced no snapshot.
#[derive(Debug, Error)]
pub enum IterationError {
    #[error("model call failed: {0}")]
    Model(#[from] llmclient::Error),

    #[error(transparent)]
    Invalid(#[from] SnapshotError),
}

/// What a failed iteration does to the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Log the failure and move on; the next iteration reuses the last
    /// good snapshot as its draft.
    #[default]
    Skip,
    /// Stop the run with an error.
    Abort,
}

/// Configuration for an extraction run.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub iterations: u32,
    pub delay: Duration,
    pub seed_path: Option<PathBuf>,
    pub description_sentences: Option<u32>,
    pub portraits: bool,
    pub copies: u32,
    pub temperature: f32,
    pub render_images: bool,
    pub failure_mode: FailureMode,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            iterations: 1,
            delay: Duration::from_secs(10),
            seed_path: None,
            description_sentences: None,
            portraits: false,
            copies: 1,
            temperature: 1.0,
            render_images: false,
            failure_mode: FailureMode::default(),
        }
    }
}

impl ExtractorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Seed the first iteration with a previously persisted snapshot.
    pub fn with_seed(mut self, path: impl Into<PathBuf>) -> Self {
        self.seed_path = Some(path.into());
        self
    }

    /// Ask for per-character descriptions of at most `sentences` sentences.
    pub fn with_descriptions(mut self, sentences: u32) -> Self {
        self.description_sentences = Some(sentences);
        self
    }

    pub fn with_portraits(mut self) -> Self {
        self.portraits = true;
        self
    }

    pub fn with_copies(mut self, copies: u32) -> Self {
        self.copies = copies;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Render an SVG beside each persisted snapshot.
    pub fn with_images(mut self) -> Self {
        self.render_images = true;
        self
    }

    pub fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }
}

/// What one iteration came to.
#[derive(Debug)]
pub enum IterationOutcome {
    /// A snapshot was persisted.
    Completed { path: PathBuf, stats: GraphStats },
    /// The iteration failed and was skipped.
    Skipped { error: IterationError },
}

impl IterationOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, IterationOutcome::Completed { .. })
    }
}

/// Account of a finished run, one entry per requested iteration.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<IterationOutcome>,
}

impl RunReport {
    pub fn completed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.is_completed())
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.completed()
    }

    /// Path of the last persisted snapshot, if any iteration completed.
    pub fn final_snapshot(&self) -> Option<&Path> {
        self.outcomes.iter().rev().find_map(|outcome| match outcome {
            IterationOutcome::Completed { path, .. } => Some(path.as_path()),
            IterationOutcome::Skipped { .. } => None,
        })
    }
}

/// Drives a model through repeated refinement passes over one text.
pub struct Extractor<M> {
    model: M,
    config: ExtractorConfig,
}

/// Internal split between failures that sink the run and failures that
/// only sink the iteration.
enum IterationFailure {
    Recoverable(IterationError),
    Fatal(ExtractError),
}

impl<M: TextModel> Extractor<M> {
    pub fn new(model: M, config: ExtractorConfig) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Run the configured number of iterations, persisting each result
    /// through `store`.
    ///
    /// Returns `Ok` as long as the run itself completes, even if
    /// individual iterations were skipped; the report says which were.
    pub async fn run(&self, text: &str, store: &SnapshotStore) -> Result<RunReport, ExtractError> {
        let mut seed: Option<GraphSnapshot> = match &self.config.seed_path {
            Some(path) => {
                let snapshot = load_seed(path).await?;
                tracing::info!(
                    seed = %path.display(),
                    characters = snapshot.characters.len(),
                    "seeding from previous snapshot"
                );
                Some(snapshot)
            }
            None => None,
        };

        let options = SchemaOptions {
            descriptions: self.config.description_sentences.is_some(),
            portraits: self.config.portraits,
        };

        let mut report = RunReport::default();
        for iteration in 0..self.config.iterations as usize {
            if iteration > 0 {
                if !self.config.delay.is_zero() {
                    tracing::debug!(seconds = self.config.delay.as_secs(), "pausing between calls");
                }
                tokio::time::sleep(self.config.delay).await;
            }

            tracing::info!(
                iteration,
                total = self.config.iterations,
                "starting iteration"
            );

            match self
                .run_iteration(text, iteration, seed.as_ref(), options, store)
                .await
            {
                Ok((snapshot, path)) => {
                    let stats = GraphStats::from_snapshot(&snapshot);
                    if snapshot.is_empty() {
                        tracing::warn!(iteration, "model returned an empty graph");
                    }
                    tracing::info!(iteration, %stats, path = %path.display(), "iteration complete");
                    seed = Some(snapshot);
                    report.outcomes.push(IterationOutcome::Completed { path, stats });
                }
                Err(IterationFailure::Fatal(error)) => return Err(error),
                Err(IterationFailure::Recoverable(error)) => {
                    tracing::warn!(iteration, %error, "iteration failed");
                    match self.config.failure_mode {
                        FailureMode::Abort => {
                            return Err(ExtractError::Iteration {
                                iteration,
                                source: error,
                            })
                        }
                        FailureMode::Skip => {
                            report.outcomes.push(IterationOutcome::Skipped { error });
                        }
                    }
                }
            }
        }

        Ok(report)
    }

    async fn run_iteration(
        &self,
        text: &str,
        iteration: usize,
        seed: Option<&GraphSnapshot>,
        options: SchemaOptions,
        store: &SnapshotStore,
    ) -> Result<(GraphSnapshot, PathBuf), IterationFailure> {
        let prompt = prompt::build(&PromptPlan {
            text,
            draft: seed,
            description_sentences: self.config.description_sentences,
            portraits: self.config.portraits,
            copies: self.config.copies,
        })
        .map_err(|error| recoverable(SnapshotError::Json(error)))?;

        let raw = self
            .model
            .generate(&prompt, options, self.config.temperature)
            .await
            .map_err(|error| IterationFailure::Recoverable(error.into()))?;

        // The raw reply is kept even when it fails to parse; that is the
        // whole point of the debug files.
        store
            .write_debug(iteration, &raw)
            .await
            .map_err(|source| fatal(iteration, source))?;

        let mut response = GraphSnapshot::parse(&raw).map_err(recoverable)?;
        response.normalize().map_err(recoverable)?;

        let merged = match seed {
            Some(draft) => merge::refine(draft, response),
            None => response,
        };
        merged.validate().map_err(recoverable)?;

        let path = store
            .write_snapshot(iteration, &merged)
            .await
            .map_err(|source| fatal(iteration, source))?;

        if self.config.render_images {
            let svg = render::render_svg(&merged);
            store
                .write_image(iteration, &svg)
                .await
                .map_err(|source| fatal(iteration, source))?;
        }

        Ok((merged, path))
    }
}

async fn load_seed(path: &Path) -> Result<GraphSnapshot, ExtractError> {
    let seed = |source| ExtractError::Seed {
        path: path.to_path_buf(),
        source,
    };
    // A seed file may have been edited by hand; it gets the same repairs
    // as a model reply before anything downstream trusts it.
    let mut snapshot = GraphSnapshot::load(path).await.map_err(seed)?;
    snapshot.normalize().map_err(seed)?;
    snapshot.validate().map_err(seed)?;
    Ok(snapshot)
}

fn recoverable(source: SnapshotError) -> IterationFailure {
    IterationFailure::Recoverable(IterationError::Invalid(source))
}

fn fatal(iteration: usize, source: SnapshotError) -> IterationFailure {
    IterationFailure::Fatal(ExtractError::Persist { iteration, source })
}
