// vouch/src/commands/checkpoint.rs
//
// USE CASE: Declare checkpoints.

use std::path::Path;

use vouch_core::application::DataContext;
use vouch_core::domain::checkpoint::{Action, Checkpoint};

pub fn add(
    project_dir: &Path,
    name: &str,
    suite: &str,
    run_name_template: Option<String>,
    notify_channel: Option<String>,
) -> miette::Result<()> {
    let ctx = DataContext::open(project_dir)?;

    let mut checkpoint = Checkpoint::new(name, suite);
    if let Some(template) = run_name_template {
        checkpoint = checkpoint.with_run_name_template(template);
    }
    if let Some(channel) = notify_channel {
        for action in &mut checkpoint.actions {
            if let Action::NotifyOnFailure { channel: slot } = action {
                *slot = Some(channel.clone());
            }
        }
    }

    ctx.add_checkpoint(&checkpoint)?;
    let actions: Vec<&str> = checkpoint.actions.iter().map(Action::name).collect();
    println!("🏁 Checkpoint '{}' saved (suite '{}')", name, suite);
    println!("   Actions: {}", actions.join(" → "));
    Ok(())
}

pub fn list(project_dir: &Path) -> miette::Result<()> {
    let ctx = DataContext::open(project_dir)?;
    let names = ctx.list_checkpoints()?;
    if names.is_empty() {
        println!("No checkpoints yet.");
    }
    for name in names {
        let checkpoint = ctx.load_checkpoint(&name)?;
        println!("🏁 {} → {}", checkpoint.name, checkpoint.registry_name);
    }
    Ok(())
}
