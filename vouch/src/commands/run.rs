// vouch/src/commands/run.rs
//
// USE CASE: Run a checkpoint.

use std::collections::BTreeMap;
use std::path::Path;

use miette::WrapErr;
use vouch_core::application::{DataContext, ValidationRequest};
use vouch_core::domain::checkpoint::ActionStatus;

use super::outcome_table;

pub async fn execute(
    project_dir: &Path,
    checkpoint: &str,
    sources: &[String],
    suite: Option<String>,
    identifiers: Vec<(String, String)>,
) -> miette::Result<()> {
    let start = std::time::Instant::now();

    println!("⚙️  Loading configuration...");
    let ctx = DataContext::open(project_dir)
        .wrap_err_with(|| format!("Failed to load project configuration from {:?}", project_dir))?;
    println!("   Project: {} (engine: {})", ctx.config().name, ctx.engine_name());

    let extra: BTreeMap<String, String> = identifiers.into_iter().collect();
    let requests = sources
        .iter()
        .map(|source| -> miette::Result<ValidationRequest> {
            Ok(ValidationRequest {
                locator: ctx.source_locator(source, &extra)?,
                registry_name: suite.clone(),
            })
        })
        .collect::<miette::Result<Vec<_>>>()?;

    let result = ctx
        .run_checkpoint(checkpoint, &requests, chrono::Utc::now())
        .await?;

    println!("\n🏁 Checkpoint '{}' (run {})", result.checkpoint_name, result.run_name);
    for pair in &result.run_results {
        let validation = &pair.validation;
        println!(
            "\n📦 {} against '{}': {}/{} expectations met ({:.1}%)",
            validation.batch_id,
            validation.registry_name,
            validation.statistics.successful,
            validation.statistics.evaluated,
            validation.statistics.success_percent
        );
        println!("{}", outcome_table(validation));
        for action in &pair.actions {
            match &action.status {
                ActionStatus::Succeeded { .. } => println!("   ✔️  {}", action.action),
                ActionStatus::Skipped => println!("   ⏭️  {} (skipped)", action.action),
                ActionStatus::Failed { error } => eprintln!("   ⚠️  {}: {}", action.action, error),
            }
        }
    }

    if result.success {
        println!("\n✨ SUCCESS! Validation passed in {:.2?}", start.elapsed());
    } else {
        eprintln!("\n❌ FAILURE. Validation did not pass ({}).", result.state);
        // Exit with error code for CI/CD
        std::process::exit(1);
    }
    Ok(())
}
