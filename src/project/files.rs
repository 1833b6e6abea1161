//! Per-file analysis of the "important files" a user attaches to a prompt.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Files above this size are summarized by size only
pub const MAX_FILE_BYTES: u64 = 10 * 1024;

pub const READ_ERROR_SUMMARY: &str = "Error reading file";

#[derive(Debug, Clone, Serialize)]
pub struct FileAnalysis {
    pub path: PathBuf,
    pub content: String,
    pub size: u64,
    pub language: String,
    pub modified: Option<DateTime<Utc>>,
    pub summary: String,
}

/// Language name for a file extension
pub fn detect_language(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "ts" | "tsx" | "mts" | "cts" => "TypeScript",
        "js" | "jsx" | "mjs" | "cjs" => "JavaScript",
        "py" => "Python",
        "java" => "Java",
        "kt" | "kts" => "Kotlin",
        "rs" => "Rust",
        "go" => "Go",
        "rb" => "Ruby",
        "php" => "PHP",
        "cs" => "C#",
        "cpp" | "cc" | "cxx" | "hpp" => "C++",
        "c" | "h" => "C",
        "swift" => "Swift",
        "md" | "markdown" => "Markdown",
        "json" => "JSON",
        "yaml" | "yml" => "YAML",
        "toml" => "TOML",
        "html" | "htm" => "HTML",
        "css" | "scss" | "sass" | "less" => "CSS",
        "sh" | "bash" | "zsh" => "Shell",
        "sql" => "SQL",
        _ => "Unknown",
    }
}

/// Analyze user-supplied files. Relative paths resolve against `root`.
///
/// Missing files are skipped; files that exist but cannot be read yield an
/// entry whose summary is [`READ_ERROR_SUMMARY`]. Never fails as a whole.
pub fn analyze_important_files(root: &Path, paths: &[PathBuf]) -> Vec<FileAnalysis> {
    paths
        .iter()
        .filter_map(|path| {
            let full = if path.is_absolute() {
                path.clone()
            } else {
                root.join(path)
            };
            if !full.exists() {
                tracing::warn!("important file not found, skipping: {}", path.display());
                return None;
            }
            Some(analyze_file(path, &full))
        })
        .collect()
}

fn analyze_file(display_path: &Path, full: &Path) -> FileAnalysis {
    let language = detect_language(full).to_string();

    let metadata = match fs::metadata(full) {
        Ok(metadata) => metadata,
        Err(e) => return read_error(display_path, language, &e),
    };
    let size = metadata.len();
    let modified = metadata.modified().ok().map(DateTime::<Utc>::from);

    if size > MAX_FILE_BYTES {
        return FileAnalysis {
            path: display_path.to_path_buf(),
            content: format!(
                "[File too large to include: {} bytes, limit is {} bytes]",
                size, MAX_FILE_BYTES
            ),
            size,
            language,
            modified,
            summary: format!("Large file ({} bytes), content omitted", size),
        };
    }

    match fs::read(full) {
        Ok(bytes) => {
            let content = String::from_utf8_lossy(&bytes).into_owned();
            let summary = summarize(&content, &language);
            FileAnalysis {
                path: display_path.to_path_buf(),
                content,
                size,
                language,
                modified,
                summary,
            }
        }
        Err(e) => read_error(display_path, language, &e),
    }
}

fn read_error(path: &Path, language: String, error: &std::io::Error) -> FileAnalysis {
    tracing::warn!("failed to read {}: {}", path.display(), error);
    FileAnalysis {
        path: path.to_path_buf(),
        content: format!("[Error reading file: {}]", error),
        size: 0,
        language,
        modified: None,
        summary: READ_ERROR_SUMMARY.to_string(),
    }
}

/// Line count plus a few language-specific counts
pub fn summarize(content: &str, language: &str) -> String {
    let lines: Vec<&str> = content.lines().map(str::trim_start).collect();
    let count = |pred: fn(&str) -> bool| lines.iter().filter(|l| pred(l)).count();

    let mut parts = vec![format!("{} lines", lines.len())];
    match language {
        "TypeScript" | "JavaScript" => {
            let imports = count(|l| l.starts_with("import ") || l.contains("require("));
            let exports = count(|l| l.starts_with("export "));
            let functions = count(|l| {
                l.contains("function ") || (l.contains("=>") && (l.contains("const ") || l.contains("let ")))
            });
            parts.push(format!("{} imports", imports));
            parts.push(format!("{} exports", exports));
            parts.push(format!("{} functions", functions));
        }
        "Python" => {
            let imports = count(|l| l.starts_with("import ") || l.starts_with("from "));
            let functions = count(|l| l.starts_with("def ") || l.starts_with("async def "));
            let classes = count(|l| l.starts_with("class "));
            parts.push(format!("{} imports", imports));
            parts.push(format!("{} functions", functions));
            parts.push(format!("{} classes", classes));
        }
        "Java" | "Kotlin" => {
            let imports = count(|l| l.starts_with("import "));
            let classes = count(|l| {
                l.contains("class ") || l.contains("interface ") || l.contains("enum ")
            });
            parts.push(format!("{} imports", imports));
            parts.push(format!("{} types", classes));
        }
        _ => {}
    }
    parts.join(", ")
}

/// Render analyses as Markdown for inclusion in a prompt
pub fn format_file_analyses(analyses: &[FileAnalysis]) -> String {
    analyses
        .iter()
        .map(|a| {
            let fence = a.language.to_lowercase();
            format!(
                "### {} ({}, {} bytes)\nSummary: {}\n\n```{}\n{}\n```",
                a.path.display(),
                a.language,
                a.size,
                a.summary,
                fence,
                a.content.trim_end()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language(Path::new("a/b.tsx")), "TypeScript");
        assert_eq!(detect_language(Path::new("setup.PY")), "Python");
        assert_eq!(detect_language(Path::new("Makefile")), "Unknown");
    }

    #[test]
    fn test_missing_file_skipped() {
        let temp = TempDir::new().unwrap();
        let result = analyze_important_files(temp.path(), &[PathBuf::from("missing.ts")]);
        assert!(result.is_empty());
    }

    #[test]
    fn test_small_file_analyzed() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("app.ts"),
            "import x from 'y';\nexport function run() {}\nconst f = () => 1;\n",
        )
        .unwrap();

        let result = analyze_important_files(temp.path(), &[PathBuf::from("app.ts")]);
        assert_eq!(result.len(), 1);
        let analysis = &result[0];
        assert_eq!(analysis.path, PathBuf::from("app.ts"));
        assert_eq!(analysis.language, "TypeScript");
        assert_eq!(
            analysis.summary,
            "3 lines, 1 imports, 1 exports, 2 functions"
        );
        assert!(analysis.modified.is_some());
    }

    #[test]
    fn test_large_file_placeholder() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("big.py"), "x = 1\n".repeat(3000)).unwrap();

        let result = analyze_important_files(temp.path(), &[PathBuf::from("big.py")]);
        assert_eq!(result.len(), 1);
        assert!(result[0].content.starts_with("[File too large"));
        assert!(result[0].size > MAX_FILE_BYTES);
    }

    #[test]
    fn test_unreadable_file_gives_error_entry() {
        let temp = TempDir::new().unwrap();
        // A directory exists but cannot be read as a file
        fs::create_dir(temp.path().join("notafile.ts")).unwrap();

        let result = analyze_important_files(temp.path(), &[PathBuf::from("notafile.ts")]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].summary, READ_ERROR_SUMMARY);
    }

    #[test]
    fn test_invalid_utf8_is_analyzed_lossily() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("legacy.js"), b"export const name = 'caf\xe9';\n").unwrap();

        let result = analyze_important_files(temp.path(), &[PathBuf::from("legacy.js")]);
        assert_eq!(result.len(), 1);
        assert_ne!(result[0].summary, READ_ERROR_SUMMARY);
        assert!(result[0].content.contains('\u{FFFD}'));
        assert!(result[0].content.starts_with("export const name"));
        assert_eq!(result[0].size, 28);
    }

    #[test]
    fn test_python_summary() {
        let summary = summarize(
            "import os\nfrom x import y\n\nclass A:\n    def m(self):\n        pass\n",
            "Python",
        );
        assert_eq!(summary, "6 lines, 2 imports, 1 functions, 1 classes");
    }

    #[test]
    fn test_format_file_analyses() {
        let analyses = vec![FileAnalysis {
            path: PathBuf::from("src/main.py"),
            content: "print('hi')\n".into(),
            size: 12,
            language: "Python".into(),
            modified: None,
            summary: "1 lines".into(),
        }];
        let text = format_file_analyses(&analyses);
        assert!(text.starts_with("### src/main.py (Python, 12 bytes)"));
        assert!(text.contains("```python\nprint('hi')\n```"));
    }
}
