// vouch/src/commands/docs.rs
//
// USE CASE: Rebuild the local data docs site.

use std::path::Path;

use vouch_core::application::DataContext;

pub fn execute(project_dir: &Path) -> miette::Result<()> {
    println!("📚 Building data docs...");
    let ctx = DataContext::open(project_dir)?;
    let report = ctx.build_data_docs()?;
    println!(
        "✨ {} page(s) rendered, index at {}",
        report.pages,
        report.index.display()
    );
    Ok(())
}
