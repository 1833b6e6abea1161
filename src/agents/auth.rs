//! Login-state heuristics for agent CLIs.
//!
//! None of the supported tools expose a machine-readable auth API, so
//! login state is inferred from the text their status subcommands print.
//! Each descriptor names one [`AuthHeuristicKind`]; swapping or tuning a
//! heuristic only touches this module.

use super::definition::AuthHeuristicKind;
use regex::Regex;
use std::sync::OnceLock;

/// Phrases that mean "not logged in" in any tool's status output
const UNAUTHENTICATED_PHRASES: &[&str] = &[
    "not authenticated",
    "unauthenticated",
    "not logged in",
    "not signed in",
    "login required",
    "please log in",
    "please login",
    "no credentialed accounts",
    "no active account",
];

/// Phrases that positively confirm a login in prose-style status output
const AUTHENTICATED_PHRASES: &[&str] = &["logged in", "authenticated", "signed in"];

/// Classifies a tool's status output as logged in or not.
pub trait AuthHeuristic: Send + Sync {
    fn is_authenticated(&self, status_output: &str) -> bool;
}

/// Status commands that answer in prose ("Logged in as alice@example.com").
pub struct StatusPhrase;

impl AuthHeuristic for StatusPhrase {
    fn is_authenticated(&self, status_output: &str) -> bool {
        let lower = status_output.to_lowercase();
        if has_unauthenticated_phrase(&lower) {
            return false;
        }
        has_account_line(status_output) || AUTHENTICATED_PHRASES.iter().any(|p| lower.contains(p))
    }
}

/// Status commands that list credentialed accounts, one per line.
pub struct AccountLine;

impl AuthHeuristic for AccountLine {
    fn is_authenticated(&self, status_output: &str) -> bool {
        let lower = status_output.to_lowercase();
        !has_unauthenticated_phrase(&lower) && has_account_line(status_output)
    }
}

/// Resolve the heuristic configured for a descriptor
pub fn heuristic_for(kind: AuthHeuristicKind) -> &'static dyn AuthHeuristic {
    match kind {
        AuthHeuristicKind::StatusPhrase => &StatusPhrase,
        AuthHeuristicKind::AccountLine => &AccountLine,
    }
}

fn has_unauthenticated_phrase(lower: &str) -> bool {
    UNAUTHENTICATED_PHRASES.iter().any(|p| lower.contains(p))
}

fn has_account_line(output: &str) -> bool {
    output.lines().any(|line| {
        line.split_whitespace().any(|word| {
            let word = word.trim_matches(|c: char| !c.is_alphanumeric() && c != '@' && c != '.');
            match word.split_once('@') {
                Some((user, domain)) => !user.is_empty() && domain.contains('.'),
                None => false,
            }
        })
    })
}

/// Matches credential errors at the start of a line, optionally behind
/// `prefix:` labels such as `Error:` or `codegen: error:`. Prose that only
/// mentions a status code mid-sentence does not match.
fn auth_failure_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?im)^\s*(?:[\w.\[\]-]+:\s*)*(?:(?:your|the)\s+)?(?:not authenticated|unauthenticated|authentication (?:required|failed)|login required|please (?:log ?in|sign in|authenticate)|not logged in|unauthori[sz]ed|invalid (?:api key|credentials|token)|(?:token|credentials|session) (?:has )?expired|no credentialed accounts|(?:http\s+)?401\b)",
        )
        .expect("auth failure pattern is valid")
    })
}

/// Whether a command's combined output reads like a credentials rejection
pub fn output_indicates_auth_failure(output: &str) -> bool {
    auth_failure_pattern().is_match(output)
}
