use crate::validation::{RuleKind, Validate};

/// A field's value as seen by the rule interpreter.
///
/// Nested objects only report whether they were supplied; their own fields are validated through
/// [`Validate::children`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Flag(bool),
    Present,
    Absent,
}

impl<'a> FieldValue<'a> {
    /// The "zero value" test used by `required`-style rules: empty strings, `false` and missing values are empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::Flag(b) => !b,
            Self::Present => false,
            Self::Absent => true,
        }
    }

    pub fn matches(&self, expected: &str) -> bool {
        match self {
            Self::Text(s) => *s == expected,
            Self::Flag(b) => expected == if *b { "true" } else { "false" },
            Self::Present | Self::Absent => false,
        }
    }

    pub fn as_text(&self) -> Option<&'a str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn presence<T>(value: &Option<T>) -> Self {
        if value.is_some() {
            Self::Present
        } else {
            Self::Absent
        }
    }
}

impl<'a> From<&'a str> for FieldValue<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(value)
    }
}

impl<'a> From<&'a String> for FieldValue<'a> {
    fn from(value: &'a String) -> Self {
        Self::Text(value.as_str())
    }
}

impl<'a> From<&'a Option<String>> for FieldValue<'a> {
    fn from(value: &'a Option<String>) -> Self {
        value.as_deref().map(Self::Text).unwrap_or(Self::Absent)
    }
}

impl From<bool> for FieldValue<'_> {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<Option<bool>> for FieldValue<'_> {
    fn from(value: Option<bool>) -> Self {
        value.map(Self::Flag).unwrap_or(Self::Absent)
    }
}

/// `field` holds one of `values`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub field: String,
    pub values: Vec<String>,
}

impl Condition {
    pub fn new<F, I, S>(field: F, values: I) -> Self
    where
        F: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { field: field.into(), values: values.into_iter().map(Into::into).collect() }
    }

    pub fn holds(&self, instance: &dyn Validate) -> bool {
        let value = instance.field(&self.field);
        self.values.iter().any(|v| value.matches(v))
    }

    pub fn describe(&self) -> String {
        format!("{} is {}", self.field, self.values.join(" or "))
    }
}

/// A typed validation rule attached to one field of a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// The field must not be empty.
    Required,
    /// The field must not be empty when every condition holds.
    RequiredIf(Vec<Condition>),
    /// The field must be empty unless the condition holds.
    OmitWith(Condition),
    /// `(trigger, sibling)` pairs: when the field equals `trigger`, `sibling` must not be empty.
    ShouldExistField(Vec<(String, String)>),
    /// Non-empty values must be one of the listed values.
    OneOf(Vec<String>),
    /// Non-empty values must be a decimal amount with zero or two fractional digits.
    Money,
    /// Non-empty values must be one of the validator's supported currencies.
    Currency,
    /// Non-empty values must be at least this many characters long.
    Min(usize),
    /// Values must be at most this many characters long.
    Max(usize),
    /// Non-empty values must consist of ASCII digits only.
    Numeric,
    /// Non-empty values must be an absolute http(s) URL.
    Url,
    /// Non-empty values must be a phone number in E.164 form. The leading `+` is optional.
    E164,
}

impl Rule {
    pub fn required_if<F, I, S>(field: F, values: I) -> Self
    where
        F: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::RequiredIf(vec![Condition::new(field, values)])
    }

    pub fn omit_with<F, I, S>(field: F, values: I) -> Self
    where
        F: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::OmitWith(Condition::new(field, values))
    }

    pub fn should_exist_field<I, T, F>(entries: I) -> Self
    where
        I: IntoIterator<Item = (T, F)>,
        T: Into<String>,
        F: Into<String>,
    {
        Self::ShouldExistField(entries.into_iter().map(|(t, f)| (t.into(), f.into())).collect())
    }

    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::OneOf(values.into_iter().map(Into::into).collect())
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            Self::Required => RuleKind::Required,
            Self::RequiredIf(_) => RuleKind::RequiredIf,
            Self::OmitWith(_) => RuleKind::OmitWith,
            Self::ShouldExistField(_) => RuleKind::ShouldExistField,
            Self::OneOf(_) => RuleKind::OneOf,
            Self::Money => RuleKind::Money,
            Self::Currency => RuleKind::Currency,
            Self::Min(_) => RuleKind::Min,
            Self::Max(_) => RuleKind::Max,
            Self::Numeric => RuleKind::Numeric,
            Self::Url => RuleKind::Url,
            Self::E164 => RuleKind::E164,
        }
    }

    /// True when the rule has nothing to compare against, e.g. a `required_if` without conditions.
    pub(crate) fn is_degenerate(&self) -> bool {
        match self {
            Self::RequiredIf(conditions) => conditions.is_empty() || conditions.iter().any(|c| c.values.is_empty()),
            Self::OmitWith(condition) => condition.values.is_empty(),
            Self::ShouldExistField(table) => table.is_empty(),
            Self::OneOf(values) => values.is_empty(),
            Self::Required
            | Self::Money
            | Self::Currency
            | Self::Min(_)
            | Self::Max(_)
            | Self::Numeric
            | Self::Url
            | Self::E164 => false,
        }
    }

    /// Rewrites every sibling field name the rule refers to.
    pub(crate) fn try_map_siblings<E, F>(self, mut f: F) -> Result<Self, E>
    where F: FnMut(String) -> Result<String, E> {
        let rule = match self {
            Self::RequiredIf(conditions) => Self::RequiredIf(
                conditions
                    .into_iter()
                    .map(|c| Ok(Condition { field: f(c.field)?, values: c.values }))
                    .collect::<Result<_, E>>()?,
            ),
            Self::OmitWith(c) => Self::OmitWith(Condition { field: f(c.field)?, values: c.values }),
            Self::ShouldExistField(table) => Self::ShouldExistField(
                table.into_iter().map(|(t, field)| Ok((t, f(field)?))).collect::<Result<_, E>>()?,
            ),
            other => other,
        };
        Ok(rule)
    }
}
