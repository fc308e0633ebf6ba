//! Field-scoped validation of form payloads.
//!
//! A [`Schema`] is an ordered list of [`FieldSpec`]s, each carrying rules.
//! Validation never stops at the first failure: every field is checked and
//! all messages are collected into [`FieldErrors`], so a form can show each
//! problem next to its input.
//!
//! Absent values (missing key, `null`, empty or whitespace-only string) only
//! fail the `required` rule; every other rule applies to present values.

pub mod patterns;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::FieldErrors;

/// A single validation rule
#[derive(Debug, Clone)]
pub enum Rule {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Email,
    Phone,
    Pattern(Regex, String),
    OneOf(Vec<String>),
    Min(f64),
    Max(f64),
    Integer,
    Boolean,
    Date,
}

/// Rules and defaults for one field
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    rules: Vec<Rule>,
    default: Option<Value>,
}

impl FieldSpec {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rules: Vec::new(),
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.rules.push(Rule::Required);
        self
    }

    pub fn min_len(mut self, n: usize) -> Self {
        self.rules.push(Rule::MinLength(n));
        self
    }

    pub fn max_len(mut self, n: usize) -> Self {
        self.rules.push(Rule::MaxLength(n));
        self
    }

    pub fn email(mut self) -> Self {
        self.rules.push(Rule::Email);
        self
    }

    pub fn phone(mut self) -> Self {
        self.rules.push(Rule::Phone);
        self
    }

    pub fn pattern(mut self, regex: &Regex, message: &str) -> Self {
        self.rules
            .push(Rule::Pattern(regex.clone(), message.to_string()));
        self
    }

    pub fn one_of(mut self, options: &[&str]) -> Self {
        self.rules
            .push(Rule::OneOf(options.iter().map(|s| s.to_string()).collect()));
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.rules.push(Rule::Min(min));
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.rules.push(Rule::Max(max));
        self
    }

    pub fn integer(mut self) -> Self {
        self.rules.push(Rule::Integer);
        self
    }

    pub fn boolean(mut self) -> Self {
        self.rules.push(Rule::Boolean);
        self
    }

    pub fn date(mut self) -> Self {
        self.rules.push(Rule::Date);
        self
    }

    /// Initial value used when an add form is opened
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.rules.iter().any(|r| matches!(r, Rule::Required))
    }

    fn check(&self, value: Option<&Value>, errors: &mut FieldErrors) {
        let value = value.filter(|v| !is_absent(v));

        let Some(value) = value else {
            if self.is_required() {
                errors.add(&self.name, "is required");
            }
            return;
        };

        for rule in &self.rules {
            if let Some(message) = check_rule(rule, value) {
                errors.add(&self.name, message);
            }
        }
    }
}

fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn check_rule(rule: &Rule, value: &Value) -> Option<String> {
    match rule {
        Rule::Required => None,
        Rule::MinLength(n) => match value.as_str() {
            Some(s) if s.trim().chars().count() < *n => {
                Some(format!("must be at least {n} characters"))
            }
            Some(_) => None,
            None => Some("must be text".to_string()),
        },
        Rule::MaxLength(n) => match value.as_str() {
            Some(s) if s.trim().chars().count() > *n => {
                Some(format!("must be at most {n} characters"))
            }
            Some(_) => None,
            None => Some("must be text".to_string()),
        },
        Rule::Email => match value.as_str() {
            Some(s) if patterns::EMAIL.is_match(s.trim()) => None,
            _ => Some("must be a valid email address".to_string()),
        },
        Rule::Phone => match value.as_str() {
            Some(s) if patterns::SAUDI_PHONE.is_match(&patterns::normalize_phone(s)) => None,
            _ => Some("must be a valid mobile number".to_string()),
        },
        Rule::Pattern(regex, message) => match value.as_str() {
            Some(s) if regex.is_match(s.trim()) => None,
            _ => Some(message.clone()),
        },
        Rule::OneOf(options) => match value.as_str() {
            Some(s) if options.iter().any(|o| o == s) => None,
            _ => Some(format!("must be one of: {}", options.join(", "))),
        },
        Rule::Min(min) => match as_number(value) {
            Some(n) if n < *min => Some(format!("must be at least {min}")),
            Some(_) => None,
            None => Some("must be a number".to_string()),
        },
        Rule::Max(max) => match as_number(value) {
            Some(n) if n > *max => Some(format!("must be at most {max}")),
            Some(_) => None,
            None => Some("must be a number".to_string()),
        },
        Rule::Integer => match as_number(value) {
            Some(n) if n.fract() == 0.0 => None,
            _ => Some("must be a whole number".to_string()),
        },
        Rule::Boolean => match value {
            Value::Bool(_) => None,
            _ => Some("must be true or false".to_string()),
        },
        Rule::Date => match value.as_str() {
            Some(s) if is_date(s.trim()) => None,
            _ => Some("must be a date (YYYY-MM-DD)".to_string()),
        },
    }
}

fn is_date(s: &str) -> bool {
    s.parse::<jiff::civil::Date>().is_ok() || s.parse::<jiff::Timestamp>().is_ok()
}

/// Ordered set of field specs for one resource
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validate a payload, collecting every field error
    pub fn validate(&self, values: &Map<String, Value>) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        for field in &self.fields {
            field.check(values.get(&field.name), &mut errors);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Initial values for an empty form
    pub fn default_values(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .filter_map(|f| f.default.clone().map(|v| (f.name.clone(), v)))
            .collect()
    }
}

/// Builder for [`Schema`]
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<FieldSpec>,
}

impl SchemaBuilder {
    pub fn field(mut self, name: &str, configure: impl FnOnce(FieldSpec) -> FieldSpec) -> Self {
        self.fields.push(configure(FieldSpec::new(name)));
        self
    }

    pub fn build(self) -> Schema {
        Schema {
            fields: self.fields,
        }
    }
}
