//! Infer project type, tooling and dependencies from a workspace's files.

use super::cache::ContextCache;
use super::context::{
    ConfigFile, Dependency, EntryKind, ProjectContext, ProjectType, StructureEntry,
    MAX_CONFIG_CHARS, MAX_DEPENDENCIES, MAX_STRUCTURE_ENTRIES,
};
use crate::error::{Result, SpecPilotError};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Directories that never describe the project itself
pub const IGNORED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "out",
    "target",
    "coverage",
    "__pycache__",
    ".venv",
    "venv",
    ".next",
    ".cache",
];

/// Config files whose content is captured for prompts
const CONFIG_FILES: &[&str] = &[
    "package.json",
    "tsconfig.json",
    "jsconfig.json",
    "pyproject.toml",
    "requirements.txt",
    "setup.py",
    "setup.cfg",
    "Pipfile",
    "pom.xml",
    "build.gradle",
    "build.gradle.kts",
    "vite.config.ts",
    "vite.config.js",
    "webpack.config.js",
    "jest.config.js",
    "vitest.config.ts",
    ".eslintrc.json",
    ".prettierrc",
    "Dockerfile",
    "Makefile",
];

const PYTHON_MARKERS: &[&str] = &["requirements.txt", "setup.py", "pyproject.toml", "Pipfile"];
const JAVA_MARKERS: &[&str] = &["pom.xml", "build.gradle", "build.gradle.kts"];

/// Maximum directory depth scanned for source file extensions
const SCAN_DEPTH: usize = 3;
const MAX_SCANNED_FILES: usize = 5000;

pub const TRUNCATION_NOTE: &str = "\n... (truncated)";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageManifest {
    #[serde(default)]
    dependencies: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, serde_json::Value>,
}

impl PackageManifest {
    fn has(&self, name: &str) -> bool {
        self.dependencies.contains_key(name) || self.dev_dependencies.contains_key(name)
    }
}

/// Analyzes workspaces, caching results per path.
pub struct ProjectAnalyzer {
    cache: ContextCache,
}

impl ProjectAnalyzer {
    pub fn new() -> Self {
        Self::with_cache(ContextCache::default())
    }

    pub fn with_cache(cache: ContextCache) -> Self {
        Self { cache }
    }

    /// Analyze a workspace. Only a missing workspace root is an error; any
    /// individual unreadable file degrades the result instead.
    pub fn analyze(&self, workspace: &Path) -> Result<Arc<ProjectContext>> {
        if !workspace.is_dir() {
            return Err(SpecPilotError::WorkspaceNotFound(workspace.to_path_buf()));
        }
        let key = workspace
            .canonicalize()
            .unwrap_or_else(|_| workspace.to_path_buf());

        if let Some(context) = self.cache.get(&key) {
            tracing::debug!("project context cache hit for {}", key.display());
            return Ok(context);
        }

        tracing::debug!("analyzing project at {}", key.display());
        let context = Arc::new(compute_context(&key));
        self.cache.insert(key, Arc::clone(&context));
        Ok(context)
    }

    /// Drop the cached context of a workspace
    pub fn invalidate(&self, workspace: &Path) {
        let key = workspace
            .canonicalize()
            .unwrap_or_else(|_| workspace.to_path_buf());
        self.cache.invalidate(&key);
    }

    pub fn cache(&self) -> &ContextCache {
        &self.cache
    }
}

impl Default for ProjectAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Full, uncached analysis of `root`
pub fn compute_context(root: &Path) -> ProjectContext {
    let files = scan_files(root);
    let manifest = read_manifest(root);
    let project_type = detect_project_type(root, &files);
    let python_markers = read_markers(root, PYTHON_MARKERS);

    ProjectContext {
        root: root.to_path_buf(),
        project_type,
        framework: detect_framework(root, project_type, manifest.as_ref(), &python_markers),
        package_manager: detect_package_manager(root),
        build_tools: detect_build_tools(root),
        test_framework: detect_test_framework(
            root,
            project_type,
            manifest.as_ref(),
            &python_markers,
        ),
        dependencies: extract_dependencies(root),
        structure: list_structure(root),
        config_files: read_config_files(root),
    }
}

/// Classify by fixed precedence: TypeScript > JavaScript > Python > Java > other
pub fn detect_project_type(root: &Path, files: &[PathBuf]) -> ProjectType {
    let has_file = |name: &str| root.join(name).is_file();

    if has_file("tsconfig.json") || files.iter().any(|f| is_typescript_source(f)) {
        ProjectType::TypeScript
    } else if has_file("package.json") || has_extension(files, &["js", "jsx", "mjs", "cjs"]) {
        ProjectType::JavaScript
    } else if PYTHON_MARKERS.iter().any(|m| has_file(m)) || has_extension(files, &["py"]) {
        ProjectType::Python
    } else if JAVA_MARKERS.iter().any(|m| has_file(m)) || has_extension(files, &["java"]) {
        ProjectType::Java
    } else {
        ProjectType::Other
    }
}

fn is_typescript_source(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    (name.ends_with(".ts") && !name.ends_with(".d.ts")) || name.ends_with(".tsx")
}

fn has_extension(files: &[PathBuf], extensions: &[&str]) -> bool {
    files.iter().any(|f| {
        f.extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.contains(&e))
            .unwrap_or(false)
    })
}

fn detect_framework(
    root: &Path,
    project_type: ProjectType,
    manifest: Option<&PackageManifest>,
    python_markers: &str,
) -> Option<String> {
    const JS_FRAMEWORKS: &[(&str, &str)] = &[
        ("next", "Next.js"),
        ("nuxt", "Nuxt"),
        ("@angular/core", "Angular"),
        ("@nestjs/core", "NestJS"),
        ("react", "React"),
        ("vue", "Vue"),
        ("svelte", "Svelte"),
        ("express", "Express"),
    ];
    const PYTHON_FRAMEWORKS: &[(&str, &str)] = &[
        ("django", "Django"),
        ("fastapi", "FastAPI"),
        ("flask", "Flask"),
    ];

    match project_type {
        ProjectType::TypeScript | ProjectType::JavaScript => {
            let manifest = manifest?;
            JS_FRAMEWORKS
                .iter()
                .find(|(dep, _)| manifest.has(dep))
                .map(|(_, name)| name.to_string())
        }
        ProjectType::Python => PYTHON_FRAMEWORKS
            .iter()
            .find(|(marker, _)| python_markers.contains(marker))
            .map(|(_, name)| name.to_string()),
        ProjectType::Java => {
            let build = read_markers(root, JAVA_MARKERS);
            build
                .contains("spring-boot")
                .then(|| "Spring Boot".to_string())
        }
        ProjectType::Other => None,
    }
}

fn detect_package_manager(root: &Path) -> Option<String> {
    const LOCKFILES: &[(&str, &str)] = &[
        ("pnpm-lock.yaml", "pnpm"),
        ("yarn.lock", "yarn"),
        ("bun.lockb", "bun"),
        ("bun.lock", "bun"),
        ("package-lock.json", "npm"),
        ("poetry.lock", "poetry"),
        ("Pipfile.lock", "pipenv"),
        ("uv.lock", "uv"),
    ];
    const MANIFESTS: &[(&str, &str)] = &[
        ("package.json", "npm"),
        ("requirements.txt", "pip"),
        ("pyproject.toml", "pip"),
        ("pom.xml", "maven"),
        ("build.gradle", "gradle"),
        ("build.gradle.kts", "gradle"),
    ];

    LOCKFILES
        .iter()
        .chain(MANIFESTS.iter())
        .find(|(file, _)| root.join(file).is_file())
        .map(|(_, name)| name.to_string())
}

fn detect_build_tools(root: &Path) -> Vec<String> {
    const BUILD_TOOLS: &[(&[&str], &str)] = &[
        (&["vite.config.ts", "vite.config.js", "vite.config.mjs"], "Vite"),
        (&["webpack.config.js", "webpack.config.ts"], "Webpack"),
        (&["rollup.config.js", "rollup.config.mjs", "rollup.config.ts"], "Rollup"),
        (&["esbuild.config.js", "esbuild.config.mjs"], "esbuild"),
        (&["tsconfig.json"], "TypeScript"),
        (&["babel.config.js", "babel.config.json", ".babelrc"], "Babel"),
        (&["pom.xml"], "Maven"),
        (&["build.gradle", "build.gradle.kts"], "Gradle"),
        (&["Makefile"], "Make"),
        (&["Dockerfile"], "Docker"),
    ];

    BUILD_TOOLS
        .iter()
        .filter(|(files, _)| files.iter().any(|f| root.join(f).is_file()))
        .map(|(_, name)| name.to_string())
        .collect()
}

fn detect_test_framework(
    root: &Path,
    project_type: ProjectType,
    manifest: Option<&PackageManifest>,
    python_markers: &str,
) -> Option<String> {
    const JS_TEST_FRAMEWORKS: &[(&str, &str)] = &[
        ("vitest", "Vitest"),
        ("jest", "Jest"),
        ("mocha", "Mocha"),
        ("@playwright/test", "Playwright"),
        ("cypress", "Cypress"),
    ];

    match project_type {
        ProjectType::TypeScript | ProjectType::JavaScript => {
            let from_deps = manifest.and_then(|m| {
                JS_TEST_FRAMEWORKS
                    .iter()
                    .find(|(dep, _)| m.has(dep))
                    .map(|(_, name)| name.to_string())
            });
            from_deps.or_else(|| {
                if root.join("vitest.config.ts").is_file() {
                    Some("Vitest".to_string())
                } else if root.join("jest.config.js").is_file() {
                    Some("Jest".to_string())
                } else {
                    None
                }
            })
        }
        ProjectType::Python => {
            if python_markers.contains("pytest")
                || root.join("pytest.ini").is_file()
                || root.join("conftest.py").is_file()
            {
                Some("pytest".to_string())
            } else if root.join("tests").is_dir() {
                Some("unittest".to_string())
            } else {
                None
            }
        }
        ProjectType::Java => read_markers(root, JAVA_MARKERS)
            .contains("junit")
            .then(|| "JUnit".to_string()),
        ProjectType::Other => None,
    }
}

/// Dependencies from `package.json` (production first) or `requirements.txt`,
/// capped at [`MAX_DEPENDENCIES`]
pub fn extract_dependencies(root: &Path) -> Vec<Dependency> {
    if let Some(manifest) = read_manifest(root) {
        let production = manifest.dependencies.iter().map(|(n, v)| (n, v, false));
        let dev = manifest.dev_dependencies.iter().map(|(n, v)| (n, v, true));
        return production
            .chain(dev)
            .take(MAX_DEPENDENCIES)
            .map(|(name, version, dev)| Dependency {
                name: name.clone(),
                version: version
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| version.to_string()),
                dev,
            })
            .collect();
    }

    match fs::read_to_string(root.join("requirements.txt")) {
        Ok(content) => parse_requirements(&content),
        Err(_) => Vec::new(),
    }
}

fn parse_requirements(content: &str) -> Vec<Dependency> {
    const SPECIFIERS: &[&str] = &["==", ">=", "<=", "~=", "!=", ">", "<"];

    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty() && !line.starts_with('-'))
        .take(MAX_DEPENDENCIES)
        .map(|line| {
            let split_at = SPECIFIERS
                .iter()
                .filter_map(|s| line.find(s))
                .min()
                .unwrap_or(line.len());
            let (name, version) = line.split_at(split_at);
            let version = version.trim();
            Dependency {
                name: name.trim().to_string(),
                version: if version.is_empty() {
                    "*".to_string()
                } else {
                    version.to_string()
                },
                dev: false,
            }
        })
        .collect()
}

/// Top-level entries, noise directories excluded, sorted by name
pub fn list_structure(root: &Path) -> Vec<StructureEntry> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("cannot list {}: {}", root.display(), e);
            return Vec::new();
        }
    };

    let mut entries: Vec<_> = entries
        .flatten()
        .filter(|e| {
            let name = e.file_name();
            !IGNORED_DIRS.contains(&name.to_string_lossy().as_ref())
        })
        .collect();
    entries.sort_by_key(|e| e.file_name());

    entries
        .into_iter()
        .take(MAX_STRUCTURE_ENTRIES)
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            let kind = if metadata.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            Some(StructureEntry {
                path: PathBuf::from(entry.file_name()),
                kind,
                size: if metadata.is_dir() { 0 } else { metadata.len() },
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            })
        })
        .collect()
}

fn read_config_files(root: &Path) -> Vec<ConfigFile> {
    CONFIG_FILES
        .iter()
        .filter_map(|name| {
            let path = root.join(name);
            if !path.is_file() {
                return None;
            }
            match fs::read_to_string(&path) {
                Ok(content) => {
                    let (content, truncated) = truncate_chars(&content, MAX_CONFIG_CHARS);
                    Some(ConfigFile {
                        name: name.to_string(),
                        path,
                        content,
                        truncated,
                    })
                }
                Err(e) => {
                    tracing::warn!("skipping config file {}: {}", path.display(), e);
                    None
                }
            }
        })
        .collect()
}

/// Keep the first `max` characters, appending a note when anything was cut
pub fn truncate_chars(content: &str, max: usize) -> (String, bool) {
    match content.char_indices().nth(max) {
        Some((byte_idx, _)) => (format!("{}{}", &content[..byte_idx], TRUNCATION_NOTE), true),
        None => (content.to_string(), false),
    }
}

fn read_manifest(root: &Path) -> Option<PackageManifest> {
    let content = fs::read_to_string(root.join("package.json")).ok()?;
    match serde_json::from_str(&content) {
        Ok(manifest) => Some(manifest),
        Err(e) => {
            tracing::warn!("package.json is not valid JSON: {}", e);
            None
        }
    }
}

/// Lowercased concatenation of whichever marker files exist
fn read_markers(root: &Path, markers: &[&str]) -> String {
    markers
        .iter()
        .filter_map(|m| fs::read_to_string(root.join(m)).ok())
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase()
}

/// Relative paths of files up to [`SCAN_DEPTH`] levels deep
fn scan_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut pending = vec![(root.to_path_buf(), 0usize)];

    while let Some((dir, depth)) = pending.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };

            if file_type.is_dir() {
                if depth < SCAN_DEPTH
                    && !IGNORED_DIRS.contains(&name.as_ref())
                    && !name.starts_with('.')
                {
                    pending.push((path, depth + 1));
                }
            } else if file_type.is_file() {
                if let Ok(relative) = path.strip_prefix(root) {
                    files.push(relative.to_path_buf());
                }
                if files.len() >= MAX_SCANNED_FILES {
                    return files;
                }
            }
        }
    }
    files
}
