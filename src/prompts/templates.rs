//! Fixed prompt template table, keyed by operation and agent id.

use super::Operation;

struct TemplateEntry {
    operation: Operation,
    /// `None` marks the per-operation default
    agent: Option<&'static str>,
    text: &'static str,
}

const QUESTIONNAIRE_DEFAULT: &str = "\
You are reviewing a feature specification before any code is written.

Project context:
{projectSummary}

Feature specification ({filePath}):
{featureContent}

Relevant files:
{importantFilesAnalysis}

Write 5 to 10 clarifying questions that would remove ambiguity from this \
specification. Group them by topic (scope, data, edge cases, UX, testing). \
Answer in Markdown as a numbered list, without restating the specification.";

const QUESTIONNAIRE_CODEGEN: &str = "\
Task: generate clarifying questions for the feature spec at {filePath}.

## Project
{projectSummary}

## Feature spec
{featureContent}

## Files the author flagged as important
{importantFilesAnalysis}

Ask only what a developer on this codebase would need answered before \
starting. Reference concrete files, modules or dependencies from the \
project where it helps. Output a numbered Markdown list.";

const PLAN_DEFAULT: &str = "\
You are planning the implementation of a feature.

Project context:
{projectSummary}

Feature specification ({filePath}):
{featureContent}

Existing implementation notes:
{implementationContext}

Relevant files:
{importantFilesAnalysis}

Produce a step-by-step implementation plan in Markdown. For each step list \
the files to create or change, the tests to add and any risks. Finish with \
a short checklist.";

const PLAN_CODEGEN: &str = "\
Task: write an implementation plan for the feature spec at {filePath}.

## Project
{projectSummary}

## Feature spec
{featureContent}

## Current implementation context
{implementationContext}

## Current file content
{fileContent}

## Files the author flagged as important
{importantFilesAnalysis}

Plan in small, independently testable steps that follow the conventions \
already used in this project. Name exact file paths. Output Markdown with \
one `###` heading per step.";

const PLAN_CLOUDAI: &str = "\
Act as a senior engineer writing a design and implementation plan.

Project summary:
{projectSummary}

Feature specification from {filePath}:
{featureContent}

Implementation context:
{implementationContext}

Important files:
{importantFilesAnalysis}

Return Markdown with these sections: Overview, Components, Data Model, \
Steps, Testing Strategy, Open Risks.";

const TEMPLATES: &[TemplateEntry] = &[
    TemplateEntry {
        operation: Operation::Questionnaire,
        agent: Some("codegen"),
        text: QUESTIONNAIRE_CODEGEN,
    },
    TemplateEntry {
        operation: Operation::Questionnaire,
        agent: None,
        text: QUESTIONNAIRE_DEFAULT,
    },
    TemplateEntry {
        operation: Operation::ImplementationPlan,
        agent: Some("codegen"),
        text: PLAN_CODEGEN,
    },
    TemplateEntry {
        operation: Operation::ImplementationPlan,
        agent: Some("cloudai"),
        text: PLAN_CLOUDAI,
    },
    TemplateEntry {
        operation: Operation::ImplementationPlan,
        agent: None,
        text: PLAN_DEFAULT,
    },
];

/// Template for `operation` as sent to `agent_id`, falling back to the
/// operation's default
pub fn template_for(operation: Operation, agent_id: &str) -> &'static str {
    let for_operation = || TEMPLATES.iter().filter(move |t| t.operation == operation);

    for_operation()
        .find(|t| t.agent == Some(agent_id))
        .or_else(|| for_operation().find(|t| t.agent.is_none()))
        .map(|t| t.text)
        .unwrap_or(QUESTIONNAIRE_DEFAULT)
}
