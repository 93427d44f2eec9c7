use std::fmt::Write;
use std::path::Path;

use critique_core::{Category, Severity};

/// Build the review prompt for `filename` covering every aspect.
///
/// Deterministic: the same inputs always produce the same prompt.
///
/// # Examples
///
/// ```
/// use critique_review::prompt::build_review_prompt;
///
/// let prompt = build_review_prompt("Foo.java", "class Foo {}");
/// assert!(prompt.contains("File: Foo.java"));
/// assert!(prompt.contains("class Foo {}"));
/// assert!(prompt.contains("SECURITY"));
/// ```
pub fn build_review_prompt(filename: &str, code: &str) -> String {
    build_review_prompt_for(&Category::ALL, filename, code)
}

/// Build the review prompt restricted to `aspects`, in the given order.
///
/// # Examples
///
/// ```
/// use critique_core::Category;
/// use critique_review::prompt::build_review_prompt_for;
///
/// let prompt = build_review_prompt_for(&[Category::Bugs], "a.rs", "fn main() {}");
/// assert!(prompt.contains("1. BUGS"));
/// assert!(!prompt.contains("PERFORMANCE:"));
/// ```
pub fn build_review_prompt_for(aspects: &[Category], filename: &str, code: &str) -> String {
    let mut prompt = String::from(
        "You are an expert code reviewer. Review the following code and provide feedback on:\n\n",
    );
    for (i, aspect) in aspects.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {}: {}", i + 1, aspect.heading(), aspect.focus());
    }

    let _ = writeln!(prompt, "\nFor each issue found:");
    let _ = writeln!(prompt, "- Categorize it ({})", join_labels(aspects));
    let _ = writeln!(prompt, "- Indicate severity ({})", join_labels(&Severity::ALL));
    let _ = writeln!(prompt, "- Specify the line number if applicable");
    let _ = writeln!(
        prompt,
        "- Provide a clear description and suggestion for improvement"
    );

    let _ = writeln!(prompt, "\nFile: {filename}\n");
    let _ = writeln!(prompt, "Code:\n```{}\n{code}\n```\n", fence_tag(filename));
    prompt.push_str(
        "Provide a structured review with clear sections for each category.\n\
         Be specific and actionable in your feedback.\n",
    );
    prompt
}

fn join_labels<T: ToString>(items: &[T]) -> String {
    let labels: Vec<String> = items.iter().map(ToString::to_string).collect();
    match labels.split_last() {
        None => String::new(),
        Some((only, [])) => only.clone(),
        Some((last, [first])) => format!("{first} or {last}"),
        Some((last, rest)) => format!("{}, or {last}", rest.join(", ")),
    }
}

/// Language tag for the code fence, taken from the file extension.
fn fence_tag(filename: &str) -> &str {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
}
