//! Compiled criteria listing command

use super::session::Session;
use anyhow::Result;

pub fn run(model: &str, schemas_path: &str) -> Result<()> {
    let session = Session::load(schemas_path)?;
    let validator = session.validator()?;

    let Some(compiled) = validator.model(model) else {
        let known = validator.model_names().join(", ");
        anyhow::bail!("Unknown model '{}'. Known models: {}", model, known);
    };

    println!("Model: {}", compiled.name);
    if let Some(desc) = session
        .schemas
        .get_model(model)
        .and_then(|m| m.description.as_deref())
    {
        println!("Description: {}", desc);
    }

    for field in &compiled.fields {
        println!();
        println!("{} : {}", field.name, field.shape);
        if field.criteria.is_empty() {
            println!("  (no criteria)");
        }
        for criterion in &field.criteria {
            for line in criterion.to_string().lines() {
                println!("  {}", line);
            }
        }
    }

    Ok(())
}
