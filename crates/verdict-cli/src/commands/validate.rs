//! Data validation command

use super::session::Session;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use verdict_constraint::{ModelValidator, ValidationReport};
use verdict_core::Value;

pub struct ValidateArgs {
    pub data: String,
    pub schemas: String,
    pub groups: Vec<String>,
    pub format: String,
}

/// Validation result of one instance from the data file
struct InstanceReport {
    model: String,
    index: usize,
    report: ValidationReport,
}

pub fn run(args: ValidateArgs) -> Result<()> {
    let session = Session::load(&args.schemas)?;
    let validator = session.validator()?;

    let content = std::fs::read_to_string(&args.data)
        .with_context(|| format!("Failed to read {}", args.data))?;
    let data: toml::Table =
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", args.data))?;

    let results = validate_data(&validator, data, &args.groups)?;

    let mut total = ValidationReport::new();
    for result in &results {
        total.merge(result.report.clone());
    }

    if args.format == "json" {
        print_report_json(&results, &total)?;
    } else {
        print_report_text(&results, &total);
    }

    if !total.is_valid() {
        std::process::exit(1);
    }
    Ok(())
}

fn validate_data(
    validator: &ModelValidator,
    data: toml::Table,
    groups: &[String],
) -> Result<Vec<InstanceReport>> {
    let mut results = Vec::new();

    for (model, instances) in data {
        let toml::Value::Array(instances) = instances else {
            anyhow::bail!("`{}` must be an array of tables", model);
        };

        for (index, instance) in instances.into_iter().enumerate() {
            let toml::Value::Table(table) = instance else {
                anyhow::bail!("`{}[{}]` must be a table", model, index);
            };
            let instance: BTreeMap<String, Value> = table
                .into_iter()
                .map(|(field, value)| (field, Value::from(value)))
                .collect();

            let report = validator
                .validate(&model, &instance, groups)
                .with_context(|| format!("Failed to validate {}[{}]", model, index))?;
            results.push(InstanceReport {
                model: model.clone(),
                index,
                report,
            });
        }
    }

    Ok(results)
}

fn print_report_text(results: &[InstanceReport], total: &ValidationReport) {
    if total.is_valid() {
        println!("All {} instance(s) passed.", results.len());
        return;
    }

    println!("{}", total.summary());

    for result in results.iter().filter(|r| !r.report.is_valid()) {
        println!();
        println!("{}[{}]:", result.model, result.index);
        for violation in &result.report.violations {
            println!("  {}", violation);
        }
    }
}

fn print_report_json(results: &[InstanceReport], total: &ValidationReport) -> Result<()> {
    let instances: Vec<serde_json::Value> = results
        .iter()
        .map(|r| {
            serde_json::json!({
                "model": r.model,
                "index": r.index,
                "valid": r.report.is_valid(),
                "violations": r.report.violations,
            })
        })
        .collect();

    let output = serde_json::json!({
        "valid": total.is_valid(),
        "summary": total.summary(),
        "violations": total.len(),
        "instances": instances,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
