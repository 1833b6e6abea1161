use super::helpers::spinner;
use crate::cli::GenerateFlags;
use crate::error::Result;
use crate::prompts::Operation;
use crate::workflow::{GenerateRequest, RunMode, Workflow};
use tokio_util::sync::CancellationToken;

/// Run one generation for the `questions` or `plan` command.
///
/// Returns whether the agent succeeded; dry-run and terminal mode always
/// count as success.
pub async fn execute(
    workflow: &Workflow,
    operation: Operation,
    flags: &GenerateFlags,
    cancel: CancellationToken,
) -> Result<bool> {
    if let Some(agent) = &flags.agent {
        workflow.manager().switch_agent(agent)?;
    }

    let mode = if flags.dry_run {
        RunMode::DryRun
    } else if flags.terminal {
        RunMode::Terminal
    } else {
        RunMode::Capture
    };

    let request = GenerateRequest {
        operation,
        spec_file: flags.spec_file.clone(),
        important_files: flags.important_files.clone(),
        implementation_context: flags.implementation_context.clone(),
        context_file: flags.context_file.clone(),
        mode,
        cancel: Some(cancel),
    };

    let progress = (mode == RunMode::Capture).then(|| {
        let agent = workflow
            .manager()
            .selected()
            .map(|s| s.name().to_string())
            .unwrap_or_default();
        spinner(format!("Running {} ({})", operation, agent))
    });

    let report = workflow.generate(request).await;
    if let Some(bar) = &progress {
        bar.finish_and_clear();
    }
    let report = report?;

    match mode {
        RunMode::DryRun => {
            println!("{}", report.command);
            Ok(true)
        }
        RunMode::Terminal => {
            println!("Sent to terminal session with {}.", report.agent);
            println!("Paste the output into {} when it finishes.", report.spec_file.display());
            Ok(true)
        }
        RunMode::Capture => {
            let result = match report.result {
                Some(result) => result,
                None => return Ok(false),
            };
            if !result.success {
                eprintln!(
                    "Error: {}",
                    result.error.as_deref().unwrap_or("Command failed")
                );
                return Ok(false);
            }
            if report.appended {
                println!(
                    "✓ Added {} to {}",
                    operation.section_heading().trim_start_matches("## "),
                    report.spec_file.display()
                );
            } else {
                println!("{} produced no output; {} was not changed.", report.agent, report.spec_file.display());
            }
            Ok(true)
        }
    }
}
