use crate::config::Config;
use crate::error::Result;
use crate::project::{analyze_important_files, project_summary, ContextCache, ProjectAnalyzer, Workspace};

pub fn execute(workspace: &Workspace, config: &Config, json: bool) -> Result<()> {
    let analyzer = ProjectAnalyzer::with_cache(ContextCache::new(config.cache_ttl()));
    let context = analyzer.analyze(workspace.root())?;
    let important = analyze_important_files(workspace.root(), &config.analysis.important_files);

    if json {
        let value = serde_json::json!({
            "context": context.as_ref(),
            "important_files": &important,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Workspace: {}", workspace.root().display());
    println!();
    println!("{}", project_summary(&context));

    if !context.config_files.is_empty() {
        println!("\nConfig Files:");
        for file in &context.config_files {
            let note = if file.truncated { " (truncated)" } else { "" };
            println!("  - {}{}", file.name, note);
        }
    }

    if !important.is_empty() {
        println!("\nImportant Files:");
        for file in &important {
            println!("  - {} [{}]: {}", file.path.display(), file.language, file.summary);
        }
    }

    Ok(())
}
