// vouch/src/commands/suite.rs
//
// USE CASE: Author expectation suites.

use std::collections::BTreeMap;
use std::path::Path;

use miette::WrapErr;
use comfy_table::{Table, presets::UTF8_FULL};
use serde_json::{Map, Value as Json, json};
use vouch_core::application::{DataContext, RuleSpec};
use vouch_core::domain::Severity;
use vouch_core::domain::registry::EvaluationMode;

pub struct AddArgs {
    pub suite: String,
    pub rule: String,
    pub column: String,
    pub params: Vec<(String, Json)>,
    pub severity: String,
    pub tolerance: Option<f64>,
    pub notes: Option<String>,
    pub source: Option<String>,
    pub discard_failed: bool,
}

pub fn create(project_dir: &Path, name: &str, overwrite: bool) -> miette::Result<()> {
    let ctx = DataContext::open(project_dir)?;
    ctx.create_registry(name, overwrite)?;
    println!("📋 Suite '{}' created", name);
    Ok(())
}

pub async fn add(project_dir: &Path, args: AddArgs) -> miette::Result<()> {
    let ctx = DataContext::open(project_dir)?;

    let severity: Severity = args.severity.parse()?;
    let spec = RuleSpec {
        rule_type: args.rule,
        column: args.column,
        params: args.params.into_iter().collect::<Map<String, Json>>(),
        severity,
        tolerance: args.tolerance,
        meta: args
            .notes
            .map(|content| json!({ "notes": { "format": "markdown", "content": content } })),
    };
    let expectation = spec.into_expectation()?;

    let batch = match (ctx.config().evaluation_mode, &args.source) {
        (EvaluationMode::Eager, Some(source)) => {
            let locator = ctx.source_locator(source, &BTreeMap::new())?;
            Some(ctx.load_batch(&locator).await?)
        }
        (EvaluationMode::Eager, None) => {
            miette::bail!("This project authors eagerly: pass --source to evaluate the new rule")
        }
        (EvaluationMode::Deferred, _) => None,
    };

    let mut author = ctx.author(&args.suite, batch.as_ref())?;
    let description = format!("{} on '{}'", expectation.rule.describe(), expectation.column);
    let (handle, outcome) = author.add(expectation)?;
    if let Some(outcome) = outcome {
        let status = if outcome.met { "✅ met" } else { "❌ not met" };
        println!(
            "   {} ({} unexpected of {})",
            status, outcome.observed.unexpected_count, outcome.observed.element_count
        );
    }

    let saved = ctx
        .save_registry(&author, args.discard_failed)
        .wrap_err_with(|| format!("Failed to save suite '{}'", args.suite))?;
    println!(
        "➕ Expectation #{} ({}) recorded, suite '{}' now has {} rule(s)",
        handle.index() + 1,
        description,
        saved.name(),
        saved.len()
    );
    Ok(())
}

pub fn show(project_dir: &Path, name: &str) -> miette::Result<()> {
    let ctx = DataContext::open(project_dir)?;
    let registry = ctx.load_registry(name)?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["#", "Column", "Rule", "Expectation", "Tolerance", "Severity"]);
    for (i, e) in registry.expectations().iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            e.column.clone(),
            e.rule.name().to_string(),
            e.rule.describe(),
            e.tolerance.map(|t| t.to_string()).unwrap_or_default(),
            e.severity.to_string(),
        ]);
    }
    println!("📋 Suite '{}' ({} rule(s))", registry.name(), registry.len());
    println!("{table}");
    Ok(())
}

pub fn list(project_dir: &Path) -> miette::Result<()> {
    let ctx = DataContext::open(project_dir)?;
    let names = ctx.list_registries()?;
    if names.is_empty() {
        println!("No suites yet.");
    }
    for name in names {
        println!("📋 {}", name);
    }
    Ok(())
}
