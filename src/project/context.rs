//! Inferred metadata about a workspace.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

pub const MAX_DEPENDENCIES: usize = 20;
pub const MAX_STRUCTURE_ENTRIES: usize = 50;
pub const MAX_CONFIG_CHARS: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    TypeScript,
    JavaScript,
    Python,
    Java,
    Other,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::TypeScript => "typescript",
            ProjectType::JavaScript => "javascript",
            ProjectType::Python => "python",
            ProjectType::Java => "java",
            ProjectType::Other => "other",
        }
    }

    /// TypeScript and JavaScript projects share the npm manifest
    pub fn is_js_family(&self) -> bool {
        matches!(self, ProjectType::TypeScript | ProjectType::JavaScript)
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    pub name: String,
    pub version: String,
    pub dev: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

#[derive(Debug, Clone, Serialize)]
pub struct StructureEntry {
    /// Path relative to the workspace root
    pub path: PathBuf,
    pub kind: EntryKind,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigFile {
    pub name: String,
    pub path: PathBuf,
    pub content: String,
    pub truncated: bool,
}

/// Everything the analyzer learned about one workspace. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectContext {
    pub root: PathBuf,
    pub project_type: ProjectType,
    pub framework: Option<String>,
    pub package_manager: Option<String>,
    pub build_tools: Vec<String>,
    pub test_framework: Option<String>,
    pub dependencies: Vec<Dependency>,
    pub structure: Vec<StructureEntry>,
    pub config_files: Vec<ConfigFile>,
}

impl ProjectContext {
    pub fn production_dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies.iter().filter(|d| !d.dev)
    }
}
