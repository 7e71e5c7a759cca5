//! Shape descriptor parser

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use verdict_core::{Result, ValueShape, VerdictError};

#[derive(Parser)]
#[grammar = "shape.pest"]
struct ShapeParser;

/// Parse a shape descriptor such as `map<string, list<i64>>`
pub fn parse_shape(input: &str) -> Result<ValueShape> {
    let mut pairs = ShapeParser::parse(Rule::shape, input)
        .map_err(|e| VerdictError::ParseError(e.to_string()))?;

    let shape = pairs
        .next()
        .and_then(|pair| pair.into_inner().next())
        .ok_or_else(|| VerdictError::ParseError(format!("empty shape `{}`", input)))?;

    build_shape(shape)
}

fn build_shape(pair: Pair<Rule>) -> Result<ValueShape> {
    let rule = pair.as_rule();
    let text = pair.as_str().to_string();
    let mut inner = pair.into_inner();
    let mut next = || {
        inner
            .next()
            .ok_or_else(|| VerdictError::ParseError(format!("incomplete shape `{}`", text)))
            .and_then(build_shape)
    };

    match rule {
        Rule::optional => Ok(ValueShape::optional(next()?)),
        Rule::list => Ok(ValueShape::list(next()?)),
        Rule::array => Ok(ValueShape::array(next()?)),
        Rule::map => {
            let key = next()?;
            let value = next()?;
            Ok(ValueShape::map(key, value))
        }
        Rule::scalar => ValueShape::from_scalar_name(&text)
            .ok_or_else(|| VerdictError::ParseError(format!("unknown shape `{}`", text))),
        _ => Err(VerdictError::ParseError(format!(
            "unexpected token `{}`",
            text
        ))),
    }
}
