//! Prompt rendering: template selection, budgeted truncation and
//! placeholder substitution.
//!
//! Templates reference fields with `{camelCase}` tokens. Substitution is a
//! single pass over the template text, so a substituted value that happens
//! to contain `{...}` is never expanded again.

pub mod templates;

use crate::agents::Capability;
use regex::{Captures, Regex};
use std::fmt;
use std::sync::OnceLock;

pub use templates::template_for;

/// Soft cap on the total size of the long prompt fields
pub const DEFAULT_BUDGET_CHARS: usize = 6000;

pub const TRUNCATION_MARKER: &str = "\n[... truncated]";

/// Fallback for a known placeholder whose value is absent
pub const NO_DATA: &str = "(no data provided)";

/// Fallback for a placeholder the context does not know about
pub const UNKNOWN_PLACEHOLDER: &str = "(not available)";

/// Share of the budget given to each truncated field, in percent
const FEATURE_SHARE: usize = 35;
const SUMMARY_SHARE: usize = 15;
const FILE_CONTENT_SHARE: usize = 20;
const IMPORTANT_FILES_SHARE: usize = 20;
const IMPLEMENTATION_SHARE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Questionnaire,
    ImplementationPlan,
}

impl Operation {
    pub const ALL: &'static [Operation] = &[Operation::Questionnaire, Operation::ImplementationPlan];

    /// Value passed to the tool's `--task` flag
    pub fn task_label(&self) -> &'static str {
        match self {
            Operation::Questionnaire => "generate-questions",
            Operation::ImplementationPlan => "implementation-plan",
        }
    }

    pub fn capability(&self) -> Capability {
        match self {
            Operation::Questionnaire => Capability::Questionnaire,
            Operation::ImplementationPlan => Capability::ImplementationPlan,
        }
    }

    /// Markdown heading of the section appended to the spec file
    pub fn section_heading(&self) -> &'static str {
        match self {
            Operation::Questionnaire => "## Clarifying Questions",
            Operation::ImplementationPlan => "## Implementation Plan",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.task_label())
    }
}

/// Values available to a template. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptContext {
    pub project_summary: Option<String>,
    pub feature_content: Option<String>,
    pub implementation_context: Option<String>,
    pub file_content: Option<String>,
    pub file_path: Option<String>,
    pub important_files_analysis: Option<String>,
}

impl PromptContext {
    /// Value for a template placeholder. `None` for unknown names.
    fn lookup(&self, placeholder: &str) -> Option<Option<&str>> {
        let value = match placeholder {
            "projectSummary" => &self.project_summary,
            "featureContent" => &self.feature_content,
            "implementationContext" => &self.implementation_context,
            "fileContent" => &self.file_content,
            "filePath" => &self.file_path,
            "importantFilesAnalysis" => &self.important_files_analysis,
            _ => return None,
        };
        Some(value.as_deref().filter(|v| !v.trim().is_empty()))
    }

    /// Copy with every long field cut to its share of `budget`
    pub fn truncated(&self, budget: usize) -> PromptContext {
        let cut = |value: &Option<String>, share: usize| {
            value
                .as_deref()
                .map(|v| truncate_field(v, budget * share / 100))
        };

        PromptContext {
            project_summary: cut(&self.project_summary, SUMMARY_SHARE),
            feature_content: cut(&self.feature_content, FEATURE_SHARE),
            implementation_context: cut(&self.implementation_context, IMPLEMENTATION_SHARE),
            file_content: cut(&self.file_content, FILE_CONTENT_SHARE),
            file_path: self.file_path.clone(),
            important_files_analysis: cut(&self.important_files_analysis, IMPORTANT_FILES_SHARE),
        }
    }
}

/// Cut `value` to at most `max` characters including the marker.
///
/// A truncated value is exactly `max` characters long, so truncating it
/// again is a no-op.
pub fn truncate_field(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let keep = max.saturating_sub(TRUNCATION_MARKER.chars().count());
    let mut out: String = value.chars().take(keep).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([A-Za-z][A-Za-z0-9]*)\}").expect("placeholder regex is valid"))
}

/// Names of every `{placeholder}` in `template`, in order of appearance
pub fn placeholders(template: &str) -> Vec<&str> {
    placeholder_regex()
        .captures_iter(template)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

/// Substitute every placeholder of `template` from `context`
pub fn render(template: &str, context: &PromptContext) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &Captures| match context.lookup(&caps[1]) {
            Some(Some(value)) => value.to_string(),
            Some(None) => NO_DATA.to_string(),
            None => {
                tracing::debug!("unknown placeholder in template: {}", &caps[0]);
                UNKNOWN_PLACEHOLDER.to_string()
            }
        })
        .into_owned()
}

/// Select, truncate and render the prompt for `operation` on `agent_id`
pub fn build_prompt(
    operation: Operation,
    agent_id: &str,
    context: &PromptContext,
    budget: usize,
) -> String {
    let template = template_for(operation, agent_id);
    render(template, &context.truncated(budget))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_context() -> PromptContext {
        PromptContext {
            project_summary: Some("Project Type: python".into()),
            feature_content: Some("# Login\nUsers can log in.".into()),
            implementation_context: Some("auth.py exists".into()),
            file_content: Some("def login(): pass".into()),
            file_path: Some("specs/login.md".into()),
            important_files_analysis: Some("### auth.py".into()),
        }
    }

    #[test]
    fn test_render_leaves_no_template_placeholders() {
        for operation in Operation::ALL {
            for agent in ["codegen", "cloudai", "other"] {
                let template = template_for(*operation, agent);
                let rendered = build_prompt(*operation, agent, &full_context(), DEFAULT_BUDGET_CHARS);
                for name in placeholders(template) {
                    assert!(
                        !rendered.contains(&format!("{{{}}}", name)),
                        "{} left in {:?}/{}",
                        name,
                        operation,
                        agent
                    );
                }
            }
        }
    }

    #[test]
    fn test_missing_values_get_fallback() {
        let rendered = render("A {projectSummary} B {fileContent}", &PromptContext::default());
        assert_eq!(rendered, format!("A {} B {}", NO_DATA, NO_DATA));
    }

    #[test]
    fn test_empty_value_counts_as_absent() {
        let context = PromptContext {
            feature_content: Some("  \n".into()),
            ..Default::default()
        };
        assert_eq!(render("{featureContent}", &context), NO_DATA);
    }

    #[test]
    fn test_unknown_placeholder_gets_fallback() {
        assert_eq!(
            render("x {mystery} y", &PromptContext::default()),
            format!("x {} y", UNKNOWN_PLACEHOLDER)
        );
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        let context = PromptContext {
            feature_content: Some("literal {projectSummary} text".into()),
            project_summary: Some("SUMMARY".into()),
            ..Default::default()
        };
        assert_eq!(
            render("{featureContent}", &context),
            "literal {projectSummary} text"
        );
    }

    #[test]
    fn test_truncate_field() {
        assert_eq!(truncate_field("short", 100), "short");

        let long = "x".repeat(500);
        let cut = truncate_field(&long, 100);
        assert_eq!(cut.chars().count(), 100);
        assert!(cut.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_truncation_is_idempotent() {
        let context = PromptContext {
            feature_content: Some("é".repeat(10_000)),
            project_summary: Some("s".repeat(3_000)),
            important_files_analysis: Some("f".repeat(50)),
            ..Default::default()
        };
        let once = context.truncated(DEFAULT_BUDGET_CHARS);
        let twice = once.truncated(DEFAULT_BUDGET_CHARS);
        assert_eq!(once, twice);

        assert_eq!(once.feature_content.unwrap().chars().count(), 2100);
        assert_eq!(once.project_summary.unwrap().chars().count(), 900);
        assert_eq!(once.important_files_analysis.unwrap(), "f".repeat(50));
    }

    #[test]
    fn test_tiny_budget_is_still_idempotent() {
        let once = truncate_field("abcdefghijklmnopqrstuvwxyz", 3);
        assert_eq!(truncate_field(&once, 3), once);
    }

    #[test]
    fn test_operation_labels() {
        assert_eq!(Operation::Questionnaire.task_label(), "generate-questions");
        assert_eq!(
            Operation::ImplementationPlan.capability(),
            Capability::ImplementationPlan
        );
        assert_eq!(
            Operation::ImplementationPlan.section_heading(),
            "## Implementation Plan"
        );
    }
}
