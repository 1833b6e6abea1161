//! Human-readable project digest embedded verbatim in agent prompts.
//!
//! Field order and wording are relied upon by the prompt templates, so
//! changes here change what every agent sees.

use super::context::ProjectContext;

const TOP_DEPENDENCIES: usize = 5;

pub fn project_summary(context: &ProjectContext) -> String {
    let mut lines = vec![format!("Project Type: {}", context.project_type)];

    if let Some(framework) = &context.framework {
        lines.push(format!("Framework: {}", framework));
    }
    if let Some(package_manager) = &context.package_manager {
        lines.push(format!("Package Manager: {}", package_manager));
    }
    if !context.build_tools.is_empty() {
        lines.push(format!("Build Tools: {}", context.build_tools.join(", ")));
    }
    if let Some(test_framework) = &context.test_framework {
        lines.push(format!("Test Framework: {}", test_framework));
    }

    let production: Vec<_> = context.production_dependencies().collect();
    if !production.is_empty() {
        let shown: Vec<String> = production
            .iter()
            .take(TOP_DEPENDENCIES)
            .map(|d| format!("{}@{}", d.name, d.version))
            .collect();
        let mut line = format!("Key Dependencies: {}", shown.join(", "));
        if production.len() > TOP_DEPENDENCIES {
            line.push_str(&format!(" (+{} more)", production.len() - TOP_DEPENDENCIES));
        }
        lines.push(line);
    }

    lines.push(format!("Project Structure: {} items", context.structure.len()));
    lines.join("\n")
}
