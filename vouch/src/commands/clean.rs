// vouch/src/commands/clean.rs
//
// USE CASE: Remove uncommitted artifacts.

use std::path::Path;

use vouch_core::application::{DataContext, clean_project};

pub fn execute(project_dir: &Path) -> miette::Result<()> {
    let ctx = DataContext::open(project_dir)?;
    match clean_project(&ctx) {
        Ok(removed) if removed.is_empty() => println!("🧹 Nothing to clean"),
        Ok(removed) => {
            for target in removed {
                println!("   🗑️  Artifact removed: {}", target);
            }
        }
        Err(e) => {
            eprintln!("❌ Clean failed: {}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}
