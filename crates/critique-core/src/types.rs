use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The review of a single file, as returned by the model.
///
/// `review_text` is the model's free-text answer, verbatim.
///
/// # Examples
///
/// ```
/// use critique_core::CodeReview;
///
/// let review = CodeReview {
///     filename: "Foo.java".into(),
///     review_text: "LOOKS GOOD".into(),
/// };
/// assert_eq!(review.filename, "Foo.java");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeReview {
    /// Display name: base name for single files, root-relative path in batches.
    pub filename: String,
    /// Review text surfaced to the user.
    pub review_text: String,
}

/// Width of the separator rules printed around reviews.
pub const RULE_WIDTH: usize = 80;

impl fmt::Display for CodeReview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(RULE_WIDTH);
        writeln!(f, "File: {}", self.filename)?;
        writeln!(f, "{rule}")?;
        writeln!(f, "{}", self.review_text)?;
        writeln!(f, "{rule}")
    }
}

impl CodeReview {
    /// Render the review as a markdown section.
    ///
    /// # Examples
    ///
    /// ```
    /// use critique_core::CodeReview;
    ///
    /// let review = CodeReview {
    ///     filename: "Foo.java".into(),
    ///     review_text: "Looks fine.".into(),
    /// };
    /// assert!(review.to_markdown().starts_with("## `Foo.java`"));
    /// ```
    pub fn to_markdown(&self) -> String {
        format!("## `{}`\n\n{}\n", self.filename, self.review_text.trim_end())
    }
}

/// A review aspect the model is asked to cover.
///
/// # Examples
///
/// ```
/// use critique_core::Category;
///
/// let c: Category = serde_json::from_str("\"CODE_QUALITY\"").unwrap();
/// assert_eq!(c, Category::CodeQuality);
/// assert_eq!(c.to_string(), "CODE_QUALITY");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    CodeQuality,
    Bugs,
    Performance,
    Security,
}

impl Category {
    /// Every aspect, in prompt order.
    pub const ALL: [Category; 4] = [
        Category::CodeQuality,
        Category::Bugs,
        Category::Performance,
        Category::Security,
    ];

    /// Label used when addressing the model, e.g. `CODE QUALITY`.
    pub fn heading(self) -> &'static str {
        match self {
            Category::CodeQuality => "CODE QUALITY",
            Category::Bugs => "BUGS",
            Category::Performance => "PERFORMANCE",
            Category::Security => "SECURITY",
        }
    }

    /// What the model should look for under this aspect.
    pub fn focus(self) -> &'static str {
        match self {
            Category::CodeQuality => {
                "Best practices, code organization, naming conventions, readability"
            }
            Category::Bugs => "Potential bugs, logic errors, edge cases not handled",
            Category::Performance => {
                "Performance issues, inefficient algorithms, resource usage"
            }
            Category::Security => "Security vulnerabilities, input validation, data exposure",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::CodeQuality => write!(f, "CODE_QUALITY"),
            Category::Bugs => write!(f, "BUGS"),
            Category::Performance => write!(f, "PERFORMANCE"),
            Category::Security => write!(f, "SECURITY"),
        }
    }
}

/// Issue severity the model is asked to assign.
///
/// # Examples
///
/// ```
/// use critique_core::Severity;
///
/// let s: Severity = serde_json::from_str("\"MEDIUM\"").unwrap();
/// assert_eq!(s, Severity::Medium);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// Every severity, highest first.
    pub const ALL: [Severity; 3] = [Severity::High, Severity::Medium, Severity::Low];
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::High => write!(f, "HIGH"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::Low => write!(f, "LOW"),
        }
    }
}

/// The shape of one issue as the prompt asks the model to describe it.
///
/// Reviews are returned as free text; nothing in critique builds a `Finding`
/// from a model answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub category: Category,
    pub severity: Severity,
    pub line: Option<u32>,
    pub description: String,
}

/// Output format for review results.
///
/// # Examples
///
/// ```
/// use critique_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain console text with separator rules.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
