// vouch-core/src/infrastructure/render/html.rs

// Turns results and registries into self-contained HTML pages. Every number
// is formatted here, before it reaches a template, so the same input always
// renders byte for byte the same page.

use minijinja::Environment;
use serde_json::{Value as Json, json};

use super::templates;
use crate::application::ports::renderer::{Document, IndexEntry, ReportRenderer};
use crate::domain::registry::ExpectationRegistry;
use crate::domain::validation::{ExpectationOutcome, ValidationResult};
use crate::error::VouchError;
use crate::infrastructure::error::InfrastructureError;

pub struct HtmlReportRenderer {
    env: Environment<'static>,
}

impl HtmlReportRenderer {
    pub fn new() -> Result<Self, InfrastructureError> {
        let mut env = Environment::new();
        // `.html` names turn HTML auto-escaping on
        env.add_template("base.html", templates::BASE)?;
        env.add_template("validation.html", templates::VALIDATION)?;
        env.add_template("registry.html", templates::REGISTRY)?;
        env.add_template("profile.html", templates::PROFILE)?;
        env.add_template("index.html", templates::INDEX)?;
        Ok(Self { env })
    }

    fn render(&self, template: &str, title: String, mut ctx: Json) -> Result<Document, VouchError> {
        if let Some(map) = ctx.as_object_mut() {
            map.insert("title".to_string(), Json::String(title.clone()));
        }
        let html = self
            .env
            .get_template(template)
            .and_then(|t| t.render(&ctx))
            .map_err(InfrastructureError::TemplateError)?;
        Ok(Document { title, html })
    }
}

fn percent(value: f64) -> String {
    format!("{:.1}", value)
}

fn observed_text(outcome: &ExpectationOutcome) -> String {
    let o = &outcome.observed;
    if outcome.expectation.rule.is_aggregate() {
        return match o.observed_value {
            Some(v) => format!("observed {:.4}", v),
            None => "no values".to_string(),
        };
    }
    format!(
        "{} unexpected ({:.2}%), {} missing, {} total",
        o.unexpected_count,
        o.unexpected_fraction * 100.0,
        o.missing_count,
        o.element_count
    )
}

fn partial_text(outcome: &ExpectationOutcome) -> String {
    outcome
        .observed
        .partial_unexpected
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ReportRenderer for HtmlReportRenderer {
    fn render_validation(&self, result: &ValidationResult, run_name: Option<&str>) -> Result<Document, VouchError> {
        let rows: Vec<Json> = result
            .results
            .iter()
            .map(|o| {
                json!({
                    "column": o.expectation.column,
                    "rule": o.expectation.rule.name(),
                    "description": o.expectation.rule.describe(),
                    "severity": o.expectation.severity.to_string(),
                    "notes": o.expectation.notes(),
                    "met": o.met,
                    "observed": observed_text(o),
                    "partial": partial_text(o),
                })
            })
            .collect();
        let stats = &result.statistics;
        let ctx = json!({
            "batch": result.batch_id.to_string(),
            "run_name": run_name,
            "success": result.success,
            "stats": {
                "evaluated": stats.evaluated,
                "successful": stats.successful,
                "unsuccessful": stats.unsuccessful,
                "success_percent": percent(stats.success_percent),
            },
            "rows": rows,
        });
        self.render(
            "validation.html",
            format!("Validation of '{}'", result.registry_name),
            ctx,
        )
    }

    fn render_registry(&self, registry: &ExpectationRegistry) -> Result<Document, VouchError> {
        let rules: Vec<Json> = registry
            .expectations()
            .iter()
            .map(|e| {
                json!({
                    "column": e.column,
                    "rule": e.rule.name(),
                    "description": e.rule.describe(),
                    "tolerance": e.tolerance.map(|t| format!("{:.4}", t)).unwrap_or_default(),
                    "severity": e.severity.to_string(),
                    "notes": e.notes().unwrap_or_default(),
                })
            })
            .collect();
        let meta = if registry.meta().is_empty() {
            String::new()
        } else {
            serde_json::to_string_pretty(registry.meta())?
        };
        self.render(
            "registry.html",
            format!("Expectation registry '{}'", registry.name()),
            json!({ "rules": rules, "meta": meta }),
        )
    }

    fn render_profile(&self, registry: &ExpectationRegistry, baseline: &ValidationResult) -> Result<Document, VouchError> {
        // One section per column, in the order columns first appear.
        let mut columns: Vec<(String, Json, Vec<String>)> = Vec::new();
        for outcome in &baseline.results {
            let column = &outcome.expectation.column;
            let line = format!("{}: {}", outcome.expectation.rule.name(), outcome.expectation.rule.describe());
            match columns.iter_mut().find(|(name, _, _)| name == column) {
                Some((_, _, rules)) => rules.push(line),
                None => columns.push((
                    column.clone(),
                    json!({
                        "elements": outcome.observed.element_count,
                        "missing": outcome.observed.missing_count,
                    }),
                    vec![line],
                )),
            }
        }
        let row_count = columns
            .first()
            .and_then(|(_, counts, _)| counts.get("elements").cloned())
            .unwrap_or(Json::from(0));
        let columns: Vec<Json> = columns
            .into_iter()
            .map(|(name, counts, rules)| {
                json!({
                    "name": name,
                    "elements": counts["elements"],
                    "missing": counts["missing"],
                    "rules": rules,
                })
            })
            .collect();
        self.render(
            "profile.html",
            format!("Profile of '{}'", baseline.batch_id.data_asset_name),
            json!({
                "batch": baseline.batch_id.to_string(),
                "registry": registry.name(),
                "row_count": row_count,
                "columns": columns,
            }),
        )
    }

    fn render_index(&self, entries: &[IndexEntry], registries: &[String]) -> Result<Document, VouchError> {
        let entries: Vec<Json> = entries
            .iter()
            .map(|e| {
                json!({
                    "registry": e.key.registry_name,
                    "run_name": e.key.run_name,
                    "fingerprint": e.key.batch_fingerprint,
                    "batch": e.batch,
                    "success": e.success,
                    "success_percent": percent(e.success_percent),
                })
            })
            .collect();
        self.render(
            "index.html",
            "Data Docs".to_string(),
            json!({ "entries": entries, "registries": registries }),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::batch::{Batch, BatchIdentifier, ScalarType, Value};
    use crate::domain::expectation::Expectation;
    use crate::domain::validation::evaluate;
    use crate::ports::store::ValidationKey;
    use anyhow::Result;

    fn failing_result() -> Result<(ExpectationRegistry, ValidationResult)> {
        let batch = Batch::builder(BatchIdentifier::new("trips").with("stage", "prod"))
            .column(
                "<b>fare</b>",
                ScalarType::Double,
                vec![Value::Double(1.0), Value::Double(-3.5), Value::Null],
            )
            .build()?;
        let mut reg = ExpectationRegistry::new("taxi");
        reg.add(Expectation::between("<b>fare</b>", 0.0, 100.0))?;
        reg.add(Expectation::not_null("<b>fare</b>").with_meta(json!({"notes": "fares are mandatory"})))?;
        let res = evaluate(&batch, &reg)?;
        Ok((reg, res))
    }

    #[test]
    fn test_validation_page_is_deterministic() -> Result<()> {
        let renderer = HtmlReportRenderer::new()?;
        let (_, res) = failing_result()?;

        let first = renderer.render_validation(&res, Some("20240301-run"))?;
        let second = renderer.render_validation(&res, Some("20240301-run"))?;

        assert_eq!(first, second);
        assert!(first.html.contains("Failed"));
        assert!(first.html.contains("20240301-run"));
        assert!(first.html.contains("fares are mandatory"));
        assert!(first.html.contains("-3.5"));
        Ok(())
    }

    #[test]
    fn test_values_are_escaped() -> Result<()> {
        let renderer = HtmlReportRenderer::new()?;
        let (reg, res) = failing_result()?;

        let page = renderer.render_validation(&res, None)?;
        assert!(!page.html.contains("<b>fare</b>"));
        assert!(page.html.contains("&lt;b&gt;fare"));

        let page = renderer.render_registry(&reg)?;
        assert!(!page.html.contains("<b>fare</b>"));
        Ok(())
    }

    #[test]
    fn test_observed_text() -> Result<()> {
        let (_, res) = failing_result()?;
        insta::assert_snapshot!(observed_text(&res.results[0]), @"1 unexpected (50.00%), 1 missing, 3 total");
        Ok(())
    }

    #[test]
    fn test_index_lists_results() -> Result<()> {
        let renderer = HtmlReportRenderer::new()?;
        let (_, res) = failing_result()?;
        let key = ValidationKey::new(&res, "run-1");
        let entry = IndexEntry {
            key,
            batch: res.batch_id.to_string(),
            success: res.success,
            success_percent: res.statistics.success_percent,
        };

        let page = renderer.render_index(&[entry], &["taxi".to_string()])?;
        assert!(page.html.contains("validations/taxi/run-1/"));
        assert!(page.html.contains("expectations/taxi.html"));

        let empty = renderer.render_index(&[], &[])?;
        assert!(empty.html.contains("No validation results yet."));
        Ok(())
    }
}
