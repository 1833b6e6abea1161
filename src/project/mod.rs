//! Workspace discovery and project analysis.

pub mod analyzer;
pub mod cache;
pub mod context;
pub mod files;
pub mod summary;

pub use analyzer::ProjectAnalyzer;
pub use cache::{Clock, ContextCache, ManualClock, SystemClock};
pub use context::{ProjectContext, ProjectType};
pub use files::{analyze_important_files, format_file_analyses, FileAnalysis};
pub use summary::project_summary;

use crate::error::{Result, SpecPilotError};
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Detect the workspace containing the current directory
    pub fn detect() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Self::detect_from(&cwd)
    }

    /// Detect the workspace containing `start`.
    /// Priority: enclosing git repo/worktree root, then `start` itself
    pub fn detect_from(start: &Path) -> Result<Self> {
        if !start.is_dir() {
            return Err(SpecPilotError::WorkspaceNotFound(start.to_path_buf()));
        }

        if let Ok(output) = Command::new("git")
            .arg("-C")
            .arg(start)
            .args(["rev-parse", "--show-toplevel"])
            .output()
        {
            if output.status.success() {
                let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if let Ok(canonical) = PathBuf::from(root).canonicalize() {
                    return Ok(Self { root: canonical });
                }
            }
        }

        Self::from_path(start)
    }

    /// Use `path` as the workspace root as-is
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.is_dir() {
            return Err(SpecPilotError::WorkspaceNotFound(path.to_path_buf()));
        }
        let root = path.canonicalize()?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a user-supplied path against the workspace root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}
