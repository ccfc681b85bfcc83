// vouch/src/commands/profile.rs
//
// USE CASE: Profile a source into a candidate suite.

use std::collections::BTreeMap;
use std::path::Path;

use vouch_core::application::DataContext;

use super::outcome_table;

pub async fn execute(project_dir: &Path, source: &str, save: bool) -> miette::Result<()> {
    let ctx = DataContext::open(project_dir)?;
    let locator = ctx.source_locator(source, &BTreeMap::new())?;

    println!("🔬 Profiling '{}'...", source);
    let report = ctx.profile(&locator, save).await?;

    println!("{}", outcome_table(&report.baseline));
    println!(
        "   Suite '{}' inferred with {} rule(s)",
        report.registry.name(),
        report.registry.len()
    );
    if save {
        println!("💾 Suite '{}' saved", report.registry.name());
    }
    println!("📄 Profile page: {}", report.page.display());
    Ok(())
}
