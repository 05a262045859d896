use std::fmt::Display;

use thiserror::Error;

/// The operators understood by the validation engine. The `Display` form is the operator's tag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Required,
    RequiredIf,
    OmitWith,
    ShouldExistField,
    OneOf,
    Money,
    Currency,
    Min,
    Max,
    Numeric,
    Url,
    E164,
}

impl RuleKind {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::RequiredIf => "required_if",
            Self::OmitWith => "omit_with",
            Self::ShouldExistField => "should_exist_field",
            Self::OneOf => "oneof",
            Self::Money => "money",
            Self::Currency => "currency",
            Self::Min => "min",
            Self::Max => "max",
            Self::Numeric => "numeric",
            Self::Url => "url",
            Self::E164 => "e164",
        }
    }
}

impl Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Raised while registering schemas. These are programming errors, and a validator that cannot be built should stop
/// the process at startup rather than let requests through unchecked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationConfigError {
    #[error("Unknown validation operator '{0}'")]
    UnknownOperator(String),
    #[error("Rule '{rule}' expects {expected}, but '{expr}' has {found} token(s)")]
    WrongTokenCount { rule: RuleKind, expected: &'static str, found: usize, expr: String },
    #[error("Rule '{rule}' expects a non-negative integer, but got '{expr}'")]
    InvalidParameter { rule: RuleKind, expr: String },
    #[error("Malformed should_exist_field entry '{0}'. Expected trigger:field")]
    MalformedTableEntry(String),
    #[error("Rule '{rule}' on {schema}.{field} has no values to compare against")]
    EmptyCondition { schema: &'static str, field: String, rule: RuleKind },
    #[error("{schema} has no field named '{field}'")]
    UnknownField { schema: &'static str, field: String },
    #[error("Schema {0} is registered more than once")]
    DuplicateSchema(&'static str),
    #[error("Invalid built-in pattern. {0}")]
    InvalidPattern(String),
}

/// A single rule violation, identifying the offending field (as a dotted path from the validated root) and the rule
/// that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub path: String,
    pub rule: RuleKind,
    pub message: String,
}

impl FieldError {
    pub fn new<P: Into<String>, M: Into<String>>(path: P, rule: RuleKind, message: M) -> Self {
        Self { path: path.into(), rule, message: message.into() }
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} [{}]", self.path, self.message, self.rule)
    }
}

/// All the violations found in one validated value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msgs = self.0.iter().map(|e| e.to_string()).collect::<Vec<String>>().join("; ");
        write!(f, "{} validation error(s): {msgs}", self.0.len())
    }
}
