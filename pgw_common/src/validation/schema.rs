use crate::validation::{parser::parse_tag, Rule, ValidationConfigError};

/// A rule bound to one field of a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    pub field: String,
    pub rule: Rule,
}

/// The resolved rule set for one type. Field names in every rule have been checked against the declared fields,
/// so evaluation never has to deal with typos.
#[derive(Debug, Clone)]
pub struct Schema {
    name: &'static str,
    fields: Vec<String>,
    rules: Vec<FieldRule>,
}

impl Schema {
    /// Starts a schema for the type whose [`crate::validation::Validate::schema_name`] is `name`, with the given
    /// field names.
    pub fn builder<I, S>(name: &'static str, fields: I) -> SchemaBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SchemaBuilder {
            name,
            fields: fields.into_iter().map(Into::into).collect(),
            rules: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }
}

#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: &'static str,
    fields: Vec<String>,
    rules: Vec<(String, Rule)>,
    tags: Vec<(String, String)>,
}

impl SchemaBuilder {
    pub fn rule(mut self, field: &str, rule: Rule) -> Self {
        self.rules.push((field.to_string(), rule));
        self
    }

    /// Registers the rules described by a tag expression. The tag is only parsed in [`Self::build`].
    pub fn tag(mut self, field: &str, tag: &str) -> Self {
        self.tags.push((field.to_string(), tag.to_string()));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn build(self) -> Result<Schema, ValidationConfigError> {
        let Self { name, fields, rules, tags } = self;
        let mut pending = rules;
        for (field, tag) in tags {
            pending.extend(parse_tag(&tag)?.into_iter().map(|r| (field.clone(), r)));
        }
        let mut resolved = Vec::with_capacity(pending.len());
        for (field, rule) in pending {
            let field = resolve(name, &fields, &field)?;
            if rule.is_degenerate() {
                return Err(ValidationConfigError::EmptyCondition { schema: name, field, rule: rule.kind() });
            }
            let rule = rule.try_map_siblings(|sibling| resolve(name, &fields, &sibling))?;
            resolved.push(FieldRule { field, rule });
        }
        Ok(Schema { name, fields, rules: resolved })
    }
}

/// Finds the declared field that `name` refers to. Matching ignores case and underscores, so that tag expressions
/// written against Go-style names (`BankID`, `Type`) resolve to `bank_id` and `type`.
fn resolve(schema: &'static str, fields: &[String], name: &str) -> Result<String, ValidationConfigError> {
    let wanted = normalise(name);
    fields
        .iter()
        .find(|f| normalise(f) == wanted)
        .cloned()
        .ok_or_else(|| ValidationConfigError::UnknownField { schema, field: name.to_string() })
}

fn normalise(name: &str) -> String {
    name.chars().filter(|c| *c != '_').flat_map(char::to_lowercase).collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::validation::{Condition, RuleKind};

    fn destination() -> SchemaBuilder {
        Schema::builder("PayoutDestination", ["type", "bank_id", "phone", "account_number"])
    }

    #[test]
    fn tags_resolve_go_style_names() {
        let schema = destination().tag("BankID", "required_if=Type sbp").build().unwrap();
        assert_eq!(schema.rules().len(), 1);
        assert_eq!(schema.rules()[0].field, "bank_id");
        assert_eq!(schema.rules()[0].rule, Rule::RequiredIf(vec![Condition::new("type", ["sbp"])]));
    }

    #[test]
    fn unknown_target_field() {
        let err = destination().rule("card", Rule::Required).build().unwrap_err();
        assert_eq!(err, ValidationConfigError::UnknownField { schema: "PayoutDestination", field: "card".into() });
    }

    #[test]
    fn unknown_sibling_field() {
        let err = destination().rule("phone", Rule::required_if("Kind", ["sbp"])).build().unwrap_err();
        assert_eq!(err, ValidationConfigError::UnknownField { schema: "PayoutDestination", field: "Kind".into() });
    }

    #[test]
    fn empty_conditions_fail_fast() {
        let err = destination().rule("phone", Rule::required_if("type", Vec::<String>::new())).build().unwrap_err();
        assert!(matches!(err, ValidationConfigError::EmptyCondition { rule: RuleKind::RequiredIf, .. }));
        let err = destination().rule("type", Rule::RequiredIf(Vec::new())).build().unwrap_err();
        assert!(matches!(err, ValidationConfigError::EmptyCondition { .. }));
    }

    #[test]
    fn malformed_tags_fail_at_build_time() {
        let err = destination().tag("phone", "required_if=Type").build().unwrap_err();
        assert!(matches!(err, ValidationConfigError::WrongTokenCount { .. }));
    }
}
