//! Parser for the compact tag syntax, e.g. `required,oneof=redirect qr,required_if=Type redirect|mobile_application`.
//!
//! Rules are separated by commas. An operator's parameters follow `=` and are separated by whitespace. Within a
//! `required_if` or `omit_with` value, `|` separates alternative values. `should_exist_field` takes `trigger:field`
//! entries. `omitempty` is accepted and ignored, since every check other than the `required` family already skips
//! empty values.
use crate::validation::{Condition, Rule, RuleKind, ValidationConfigError};

pub fn parse_tag(tag: &str) -> Result<Vec<Rule>, ValidationConfigError> {
    let mut rules = Vec::new();
    for expr in tag.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if let Some(rule) = parse_rule(expr)? {
            rules.push(rule);
        }
    }
    Ok(rules)
}

/// Parses a single `operator[=params]` expression. Returns `None` for `omitempty`.
pub fn parse_rule(expr: &str) -> Result<Option<Rule>, ValidationConfigError> {
    let (op, param) = match expr.split_once('=') {
        Some((op, param)) => (op.trim(), param.trim()),
        None => (expr.trim(), ""),
    };
    let tokens = param.split_whitespace().collect::<Vec<&str>>();
    let rule = match op {
        "omitempty" => return Ok(None),
        "required" => no_params(RuleKind::Required, expr, &tokens).map(|_| Rule::Required)?,
        "money" => no_params(RuleKind::Money, expr, &tokens).map(|_| Rule::Money)?,
        "currency" => no_params(RuleKind::Currency, expr, &tokens).map(|_| Rule::Currency)?,
        "numeric" => no_params(RuleKind::Numeric, expr, &tokens).map(|_| Rule::Numeric)?,
        "url" => no_params(RuleKind::Url, expr, &tokens).map(|_| Rule::Url)?,
        "e164" => no_params(RuleKind::E164, expr, &tokens).map(|_| Rule::E164)?,
        "min" => Rule::Min(length(RuleKind::Min, expr, &tokens)?),
        "max" => Rule::Max(length(RuleKind::Max, expr, &tokens)?),
        "required_if" => {
            if tokens.is_empty() || tokens.len() % 2 != 0 {
                return Err(wrong_count(RuleKind::RequiredIf, "field/value pairs", expr, tokens.len()));
            }
            let conditions =
                tokens.chunks(2).map(|pair| Condition::new(pair[0], alternatives(pair[1]))).collect::<Vec<_>>();
            Rule::RequiredIf(conditions)
        },
        "omit_with" => {
            if tokens.len() != 2 {
                return Err(wrong_count(RuleKind::OmitWith, "exactly one field and one value", expr, tokens.len()));
            }
            Rule::OmitWith(Condition::new(tokens[0], alternatives(tokens[1])))
        },
        "should_exist_field" => {
            if tokens.is_empty() {
                return Err(wrong_count(RuleKind::ShouldExistField, "at least one trigger:field entry", expr, 0));
            }
            let table = tokens
                .iter()
                .map(|entry| match entry.split_once(':') {
                    Some((trigger, field)) if !trigger.is_empty() && !field.is_empty() => {
                        Ok((trigger.to_string(), field.to_string()))
                    },
                    _ => Err(ValidationConfigError::MalformedTableEntry(entry.to_string())),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Rule::ShouldExistField(table)
        },
        "oneof" => {
            if tokens.is_empty() {
                return Err(wrong_count(RuleKind::OneOf, "at least one value", expr, 0));
            }
            Rule::one_of(tokens)
        },
        other => return Err(ValidationConfigError::UnknownOperator(other.to_string())),
    };
    Ok(Some(rule))
}

fn alternatives(value: &str) -> Vec<String> {
    value.split('|').filter(|s| !s.is_empty()).map(String::from).collect()
}

fn length(rule: RuleKind, expr: &str, tokens: &[&str]) -> Result<usize, ValidationConfigError> {
    match tokens {
        [n] => n.parse().map_err(|_| ValidationConfigError::InvalidParameter { rule, expr: expr.to_string() }),
        _ => Err(wrong_count(rule, "exactly one length", expr, tokens.len())),
    }
}

fn no_params(rule: RuleKind, expr: &str, tokens: &[&str]) -> Result<(), ValidationConfigError> {
    if tokens.is_empty() {
        Ok(())
    } else {
        Err(wrong_count(rule, "no parameters", expr, tokens.len()))
    }
}

fn wrong_count(rule: RuleKind, expected: &'static str, expr: &str, found: usize) -> ValidationConfigError {
    ValidationConfigError::WrongTokenCount { rule, expected, found, expr: expr.to_string() }
}
