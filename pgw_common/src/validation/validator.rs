use std::collections::{HashMap, HashSet};

use log::*;
use regex::Regex;

use crate::validation::{
    FieldError,
    FieldRule,
    FieldValue,
    Rule,
    Schema,
    SchemaBuilder,
    Validate,
    ValidationConfigError,
    ValidationErrors,
};

pub const DEFAULT_CURRENCIES: [&str; 1] = ["RUB"];
const MONEY_PATTERN: &str = r"^\d+(\.\d{2})?$";
const NUMERIC_PATTERN: &str = r"^\d+$";
const URL_PATTERN: &str = r"^https?://[^\s/$.?#][^\s]*$";
const E164_PATTERN: &str = r"^\+?[1-9]\d{1,14}$";

/// The compiled patterns behind the format rules.
#[derive(Debug, Clone)]
struct Patterns {
    money: Regex,
    numeric: Regex,
    url: Regex,
    e164: Regex,
}

impl Patterns {
    fn compile() -> Result<Self, ValidationConfigError> {
        let compile = |p: &str| Regex::new(p).map_err(|e| ValidationConfigError::InvalidPattern(e.to_string()));
        Ok(Self {
            money: compile(MONEY_PATTERN)?,
            numeric: compile(NUMERIC_PATTERN)?,
            url: compile(URL_PATTERN)?,
            e164: compile(E164_PATTERN)?,
        })
    }
}

/// An immutable rule interpreter. Build it once at startup and share it by reference (or `Arc`).
#[derive(Debug, Clone)]
pub struct Validator {
    schemas: HashMap<&'static str, Schema>,
    currencies: HashSet<String>,
    patterns: Patterns,
}

#[derive(Debug, Default)]
pub struct ValidatorBuilder {
    schemas: Vec<SchemaBuilder>,
    currencies: Option<Vec<String>>,
}

impl ValidatorBuilder {
    /// Replaces the set of accepted currency codes. Defaults to [`DEFAULT_CURRENCIES`].
    pub fn currencies<I, S>(mut self, currencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.currencies = Some(currencies.into_iter().map(Into::into).collect());
        self
    }

    pub fn schema(mut self, schema: SchemaBuilder) -> Self {
        self.schemas.push(schema);
        self
    }

    pub fn build(self) -> Result<Validator, ValidationConfigError> {
        let patterns = Patterns::compile()?;
        let mut schemas = HashMap::with_capacity(self.schemas.len());
        for builder in self.schemas {
            let schema = builder.build()?;
            let name = schema.name();
            if schemas.insert(name, schema).is_some() {
                return Err(ValidationConfigError::DuplicateSchema(name));
            }
        }
        let currencies = match self.currencies {
            Some(c) => c.into_iter().collect(),
            None => DEFAULT_CURRENCIES.iter().map(|c| c.to_string()).collect(),
        };
        debug!("🛂️ Validator built with {} schema(s)", schemas.len());
        Ok(Validator { schemas, currencies, patterns })
    }
}

impl Validator {
    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::default()
    }

    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    /// Evaluates every registered rule against `value` and its nested children. An empty result means the value is
    /// valid.
    pub fn validate(&self, value: &dyn Validate) -> Vec<FieldError> {
        let mut errors = Vec::new();
        self.validate_into("", value, &mut errors);
        errors
    }

    /// Like [`Self::validate`], but packs any violations into an error.
    pub fn check(&self, value: &dyn Validate) -> Result<(), ValidationErrors> {
        let errors = self.validate(value);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(errors))
        }
    }

    fn validate_into(&self, prefix: &str, value: &dyn Validate, errors: &mut Vec<FieldError>) {
        match self.schemas.get(value.schema_name()) {
            Some(schema) => {
                for rule in schema.rules() {
                    self.evaluate(prefix, rule, value, errors);
                }
            },
            None => trace!("🛂️ No schema registered for {}", value.schema_name()),
        }
        for (name, child) in value.children() {
            self.validate_into(&join_path(prefix, name), child, errors);
        }
    }

    fn evaluate(&self, prefix: &str, field_rule: &FieldRule, instance: &dyn Validate, errors: &mut Vec<FieldError>) {
        let FieldRule { field, rule } = field_rule;
        let value = instance.field(field);
        let kind = rule.kind();
        let mut fail =
            |path: &str, message: String| errors.push(FieldError::new(join_path(prefix, path), kind, message));
        match rule {
            Rule::Required => {
                if value.is_empty() {
                    fail(field.as_str(), "is required".into());
                }
            },
            Rule::RequiredIf(conditions) => {
                if value.is_empty() && conditions.iter().all(|c| c.holds(instance)) {
                    let when = conditions.iter().map(|c| c.describe()).collect::<Vec<String>>().join(" and ");
                    fail(field.as_str(), format!("is required when {when}"));
                }
            },
            Rule::OmitWith(condition) => {
                if !value.is_empty() && !condition.holds(instance) {
                    fail(field.as_str(), format!("must be omitted unless {}", condition.describe()));
                }
            },
            Rule::ShouldExistField(table) => {
                for (trigger, sibling) in table {
                    if value.matches(trigger) && instance.field(sibling).is_empty() {
                        fail(sibling.as_str(), format!("is required when {field} is {trigger}"));
                    }
                }
            },
            Rule::OneOf(values) => {
                if !value.is_empty() && !values.iter().any(|v| value.matches(v)) {
                    fail(field.as_str(), format!("must be one of [{}]", values.join(", ")));
                }
            },
            Rule::Money => {
                if !matches_pattern(value, &self.patterns.money) {
                    fail(field.as_str(), "is not a valid money amount".into());
                }
            },
            Rule::Numeric => {
                if !matches_pattern(value, &self.patterns.numeric) {
                    fail(field.as_str(), "must contain digits only".into());
                }
            },
            Rule::Url => {
                if !matches_pattern(value, &self.patterns.url) {
                    fail(field.as_str(), "is not a valid http(s) URL".into());
                }
            },
            Rule::E164 => {
                if !matches_pattern(value, &self.patterns.e164) {
                    fail(field.as_str(), "is not a valid E.164 phone number".into());
                }
            },
            Rule::Min(min) => {
                if text_len(value).is_some_and(|len| len > 0 && len < *min) {
                    fail(field.as_str(), format!("must be at least {min} characters long"));
                }
            },
            Rule::Max(max) => {
                if text_len(value).is_some_and(|len| len > *max) {
                    fail(field.as_str(), format!("must be at most {max} characters long"));
                }
            },
            Rule::Currency => {
                if !value.is_empty() && !value.as_text().is_some_and(|s| self.currencies.contains(s)) {
                    fail(field.as_str(), "is not a supported currency".into());
                }
            },
        }
    }
}

/// Empty values pass; anything else must be text matching `pattern`.
fn matches_pattern(value: FieldValue<'_>, pattern: &Regex) -> bool {
    value.is_empty() || value.as_text().is_some_and(|s| pattern.is_match(s))
}

fn text_len(value: FieldValue<'_>) -> Option<usize> {
    value.as_text().map(|s| s.chars().count())
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}
