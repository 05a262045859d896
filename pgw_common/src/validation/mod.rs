//! # Conditional request validation
//!
//! A small rule interpreter for cross-field business rules on request payloads, such as "`return_url` is required
//! when `type` is `redirect` or `mobile_application`".
//!
//! Rules are registered per type in a [`Schema`], either with the typed [`Rule`] constructors or with the compact
//! tag syntax (see [`parser`]). Schemas are resolved once when the [`Validator`] is built; malformed rules are
//! reported then as a [`ValidationConfigError`], never at request time.
//!
//! Values expose their fields through the [`Validate`] trait, which replaces reflection: the validator asks for a
//! field by name and receives a [`FieldValue`].
mod errors;
pub mod parser;
mod rules;
mod schema;
mod validator;

pub use errors::{FieldError, RuleKind, ValidationConfigError, ValidationErrors};
pub use rules::{Condition, FieldValue, Rule};
pub use schema::{FieldRule, Schema, SchemaBuilder};
pub use validator::{Validator, ValidatorBuilder, DEFAULT_CURRENCIES};

/// Implemented by every type that the [`Validator`] can check.
pub trait Validate {
    /// The name of the [`Schema`] holding this type's rules.
    fn schema_name(&self) -> &'static str;

    /// The value of the field `name`. Unknown names should return [`FieldValue::Absent`].
    fn field(&self, name: &str) -> FieldValue<'_>;

    /// Nested values that should be validated with their own schemas.
    fn children(&self) -> Vec<(&'static str, &dyn Validate)> {
        Vec::new()
    }
}
