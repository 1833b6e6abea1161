//! Advisory screening of command lines before they are run.
//!
//! `CommandBuilder` never calls this; callers decide what to do with the
//! verdict.

use regex::Regex;
use std::sync::OnceLock;

const METACHARACTERS: &[char] = &[';', '&', '|', '`', '$', '(', ')'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub is_valid: bool,
    /// A known destructive pattern matched, not just a metacharacter
    pub dangerous: bool,
    pub issues: Vec<String>,
}

fn dangerous_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (r"\bsudo\b", "privilege escalation (sudo)"),
            (r"\bsu\s+-", "privilege escalation (su)"),
            (r"\brm\s+-[a-zA-Z]*r[a-zA-Z]*f|\brm\s+-[a-zA-Z]*f[a-zA-Z]*r", "recursive delete (rm -rf)"),
            (r"\b(curl|wget)\b[^|]*\|\s*(ba|z)?sh\b", "pipe to shell"),
            (r"\bmkfs(\.\w+)?\b", "filesystem format (mkfs)"),
            (r"\bdd\s+if=", "raw disk write (dd)"),
            (r"\bchmod\s+(-R\s+)?777\b", "world-writable permissions (chmod 777)"),
            (r":\(\)\s*\{\s*:\|:&\s*\};:", "fork bomb"),
        ]
        .into_iter()
        .filter_map(|(pattern, label)| Regex::new(pattern).ok().map(|re| (re, label)))
        .collect()
    })
}

/// Flag shell metacharacters associated with injection and well-known
/// dangerous commands. Every issue found is reported.
pub fn validate_command(command: &str) -> Validation {
    let mut issues = Vec::new();

    let mut found: Vec<char> = command.chars().filter(|c| METACHARACTERS.contains(c)).collect();
    found.sort_unstable();
    found.dedup();
    if !found.is_empty() {
        let list: Vec<String> = found.iter().map(|c| format!("'{}'", c)).collect();
        issues.push(format!("contains shell metacharacters: {}", list.join(" ")));
    }

    let mut dangerous = false;
    for (re, label) in dangerous_patterns() {
        if re.is_match(command) {
            dangerous = true;
            issues.push(format!("contains dangerous pattern: {}", label));
        }
    }

    Validation {
        is_valid: issues.is_empty(),
        dangerous,
        issues,
    }
}
