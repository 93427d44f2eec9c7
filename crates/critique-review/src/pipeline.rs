use std::fmt;
use std::path::Path;

use critique_core::{CodeReview, CritiqueError, ReviewConfig, RULE_WIDTH};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::discovery::{self, SourceFile};
use crate::llm::ReviewBackend;
use crate::loader;
use crate::pacing::{with_retry, Pacer, RetryPolicy};
use crate::prompt;

/// Outcome of a directory review.
///
/// # Examples
///
/// ```
/// use critique_review::pipeline::BatchReport;
///
/// let report = BatchReport::default();
/// assert!(report.reviews.is_empty());
/// assert!(report.skipped.is_empty());
/// ```
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// Number of matching files discovered.
    pub files_found: usize,
    /// Successful reviews, in discovery order.
    pub reviews: Vec<CodeReview>,
    /// Files that failed and were passed over.
    pub skipped: Vec<SkippedFile>,
}

/// A file left out of a batch, with the reason it failed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFile {
    /// Display path relative to the reviewed directory.
    pub path: String,
    pub reason: String,
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(f, "Reviewed {} files\n", self.reviews.len())?;
        if !self.skipped.is_empty() {
            writeln!(f, "Skipped {} files:", self.skipped.len())?;
            for s in &self.skipped {
                writeln!(f, "  {} ({})", s.path, s.reason)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "{rule}\n")?;

        for review in &self.reviews {
            write!(f, "{review}")?;
            writeln!(f, "\n{rule}\n")?;
        }
        Ok(())
    }
}

impl BatchReport {
    /// Render the batch as markdown.
    ///
    /// # Examples
    ///
    /// ```
    /// use critique_review::pipeline::BatchReport;
    ///
    /// let md = BatchReport::default().to_markdown();
    /// assert!(md.contains("# Review Results"));
    /// ```
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("# Review Results\n\n");
        out.push_str(&format!(
            "**Files:** {} | **Reviewed:** {} | **Skipped:** {}\n\n",
            self.files_found,
            self.reviews.len(),
            self.skipped.len(),
        ));
        for s in &self.skipped {
            out.push_str(&format!("- skipped `{}`: {}\n", s.path, s.reason));
        }
        if !self.skipped.is_empty() {
            out.push('\n');
        }
        for review in &self.reviews {
            out.push_str(&review.to_markdown());
            out.push('\n');
        }
        out
    }
}

/// Review orchestrator: discovery, loading, prompting, and the API call,
/// for one file or a whole directory.
///
/// Files are processed one at a time with at most one request in flight.
pub struct ReviewPipeline<B> {
    backend: B,
    config: ReviewConfig,
    retry: RetryPolicy,
}

impl<B: ReviewBackend> ReviewPipeline<B> {
    /// Create a pipeline; the retry policy is taken from `config`.
    pub fn new(backend: B, config: ReviewConfig) -> Self {
        let retry = RetryPolicy::from_config(&config);
        Self {
            backend,
            config,
            retry,
        }
    }

    /// Replace the retry policy derived from configuration.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Review a single file.
    ///
    /// The review is labeled with the file's base name. Any failure aborts
    /// the review.
    ///
    /// # Errors
    ///
    /// Path validation errors from [`discovery::locate_file`],
    /// [`CritiqueError::FileUnreadable`], or any API error.
    pub async fn review_file(&self, path: &Path) -> Result<CodeReview, CritiqueError> {
        info!(path = %path.display(), "starting review of file");
        let file = discovery::locate_file(path, &self.config)?;
        let prompt = self.prepare(&file)?;
        self.request(&file, &prompt).await
    }

    /// Review every matching file under `dir`.
    ///
    /// A failure on one file is logged and recorded in
    /// [`BatchReport::skipped`]; the remaining files are still reviewed.
    /// Successive API calls are separated by the configured request delay.
    ///
    /// # Errors
    ///
    /// Returns [`CritiqueError::NotFound`] or [`CritiqueError::NotADirectory`]
    /// for a bad `dir`, and [`CritiqueError::NoFilesFound`] if nothing
    /// matches. Per-file failures are never returned.
    pub async fn review_directory(&self, dir: &Path) -> Result<BatchReport, CritiqueError> {
        info!(dir = %dir.display(), "starting review of directory");
        let files = discovery::locate_dir(dir, &self.config)?;
        if files.is_empty() {
            return Err(CritiqueError::NoFilesFound(dir.to_path_buf()));
        }
        info!(count = files.len(), "found files to review");

        let mut pacer = Pacer::new(self.config.request_delay());
        let mut report = BatchReport {
            files_found: files.len(),
            ..BatchReport::default()
        };

        for file in &files {
            match self.review_paced(file, &mut pacer).await {
                Ok(review) => report.reviews.push(review),
                Err(e) => {
                    error!(path = %file.path.display(), error = %e, "failed to review file, skipping");
                    report.skipped.push(SkippedFile {
                        path: file.display_path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            reviewed = report.reviews.len(),
            skipped = report.skipped.len(),
            "directory review finished"
        );
        Ok(report)
    }

    async fn review_paced(
        &self,
        file: &SourceFile,
        pacer: &mut Pacer,
    ) -> Result<CodeReview, CritiqueError> {
        let prompt = self.prepare(file)?;
        pacer.wait().await;
        self.request(file, &prompt).await
    }

    /// Load the file and render its prompt.
    fn prepare(&self, file: &SourceFile) -> Result<String, CritiqueError> {
        let code = loader::load(&file.path, self.config.max_file_size)?;
        debug!(path = %file.display_path, chars = code.chars().count(), "loaded");
        let prompt = prompt::build_review_prompt_for(&self.config.aspects, &file.display_path, &code);
        debug!(path = %file.display_path, "prompt built");
        Ok(prompt)
    }

    async fn request(&self, file: &SourceFile, prompt: &str) -> Result<CodeReview, CritiqueError> {
        debug!(path = %file.display_path, "requested");
        let review_text = with_retry(&self.retry, || self.backend.review(prompt)).await?;
        info!(path = %file.display_path, "received review");
        Ok(CodeReview {
            filename: file.display_path.clone(),
            review_text,
        })
    }
}
