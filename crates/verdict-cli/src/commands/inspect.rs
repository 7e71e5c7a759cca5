//! Definition introspection command

use super::session::Session;
use anyhow::{Context, Result};

pub fn run(name: &str, schemas_path: &str) -> Result<()> {
    let session = Session::load(schemas_path)?;

    let Some(definition) = session.resolver.definitions().get(name) else {
        let known = session.resolver.definitions().names().join(", ");
        anyhow::bail!("Unknown definition '{}'. Known definitions: {}", name, known);
    };

    println!("Definition: {}", definition.name);
    if let Some(desc) = &definition.description {
        println!("Description: {}", desc);
    }
    match &definition.handler {
        Some(handler) if !definition.is_marker() => println!("Handler: {}", handler),
        _ => println!("Handler: (marker)"),
    }
    println!();

    let md = session
        .resolver
        .resolve(name)
        .with_context(|| format!("Failed to resolve '{}'", name))?;
    print!("{}", md);

    Ok(())
}
