//! # Validation Schema
//!
//! Declarative per-field constraints, used both to validate a draft before
//! submission and to drive field-level error display.
//!
//! Validation runs synchronously, never mutates the draft, and happens only on
//! explicit submission — not on every keystroke or blur. Incomplete drafts
//! would otherwise produce noisy errors while the user is still typing.
//!
//! Schema fields are a subset of the entity's fields; a field absent from the
//! schema is never required and never checked.

use crate::error::FieldErrors;
use serde::Serialize;
use serde_json::Value;

/// The constraint kind for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text { max_len: Option<usize> },
    Number { min: Option<f64>, max: Option<f64> },
}

/// One field rule: presence plus the kind-specific constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
    pub kind: FieldKind,
}

/// The declarative rule set for one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    entity: &'static str,
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            fields: Vec::new(),
        }
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Declares a text field. `max_len` of `None` means unbounded.
    pub fn text(mut self, name: &'static str, required: bool, max_len: Option<usize>) -> Self {
        self.fields.push(FieldSpec {
            name,
            required,
            kind: FieldKind::Text { max_len },
        });
        self
    }

    /// Declares a numeric field with optional bounds.
    pub fn number(
        mut self,
        name: &'static str,
        required: bool,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Self {
        self.fields.push(FieldSpec {
            name,
            required,
            kind: FieldKind::Number { min, max },
        });
        self
    }

    /// Validates a draft against the schema.
    ///
    /// The draft is inspected through its JSON projection so one schema type
    /// serves every entity. Each violated rule produces exactly one error
    /// keyed by its field name.
    pub fn validate<D: Serialize>(&self, draft: &D) -> Result<(), FieldErrors> {
        let value = match serde_json::to_value(draft) {
            Ok(value) => value,
            Err(e) => {
                let mut errors = FieldErrors::new();
                errors.insert("draft".to_string(), format!("not serializable: {e}"));
                return Err(errors);
            }
        };
        self.validate_value(&value)
    }

    fn validate_value(&self, draft: &Value) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        for spec in &self.fields {
            let field = draft.get(spec.name);
            if let Some(message) = check_field(spec, field) {
                errors.insert(spec.name.to_string(), message);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_field(spec: &FieldSpec, value: Option<&Value>) -> Option<String> {
    let value = match value {
        None | Some(Value::Null) => {
            return spec.required.then(|| "is required".to_string());
        }
        Some(value) => value,
    };

    match &spec.kind {
        FieldKind::Text { max_len } => {
            let text = match value.as_str() {
                Some(text) => text,
                None => return Some("must be text".to_string()),
            };
            if text.is_empty() {
                return spec.required.then(|| "is required".to_string());
            }
            if let Some(max) = max_len {
                if text.chars().count() > *max {
                    return Some(format!("must be at most {max} characters"));
                }
            }
            None
        }
        FieldKind::Number { min, max } => {
            let number = match value.as_f64() {
                Some(number) => number,
                None => return Some("must be a number".to_string()),
            };
            if let Some(min) = min {
                if number < *min {
                    return Some(format!("must be at least {min}"));
                }
            }
            if let Some(max) = max {
                if number > *max {
                    return Some(format!("must be at most {max}"));
                }
            }
            None
        }
    }
}
