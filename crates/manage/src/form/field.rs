//! Form fields: submitted value, declarative validators, and error list.

use serde::{Deserialize, Serialize};

use crate::error::ManageResult;

use super::validators::{ValidationError, Validator};

/// Message recorded when a select field receives a value outside its choices.
pub const NOT_A_VALID_CHOICE: &str = "Not a valid choice";

/// Field type variants with type-specific configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementType {
    /// Single-line text input.
    Textfield {
        #[serde(skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
    },

    /// Email input.
    Email,

    /// Password input. The submitted value is never rendered back.
    Password,

    /// Dropdown select of `(value, label)` pairs.
    Select { options: Vec<(String, String)> },
}

impl ElementType {
    /// Get the type name as a string.
    pub fn type_name(&self) -> &'static str {
        match self {
            ElementType::Textfield { .. } => "textfield",
            ElementType::Email => "email",
            ElementType::Password => "password",
            ElementType::Select { .. } => "select",
        }
    }
}

/// A single named input bound to its validators.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    element_type: ElementType,
    title: Option<String>,
    description: Option<String>,
    placeholder: Option<String>,
    data: Option<String>,
    validators: Vec<Validator>,

    /// Messages recorded by the last validation run.
    pub errors: Vec<String>,
}

impl Field {
    /// Create a text field.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ElementType::Textfield { max_length: None })
    }

    /// Create an email field.
    pub fn email(name: impl Into<String>) -> Self {
        Self::new(name, ElementType::Email)
    }

    /// Create a password field.
    pub fn password(name: impl Into<String>) -> Self {
        Self::new(name, ElementType::Password)
    }

    /// Create a select field.
    pub fn select(name: impl Into<String>, options: Vec<(String, String)>) -> Self {
        Self::new(name, ElementType::Select { options })
    }

    fn new(name: impl Into<String>, element_type: ElementType) -> Self {
        Self {
            name: name.into(),
            element_type,
            title: None,
            description: None,
            placeholder: None,
            data: None,
            validators: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Set the submitted value.
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set the submitted value, which may be absent.
    pub fn with_optional_data(mut self, data: Option<String>) -> Self {
        self.data = data;
        self
    }

    /// Set the field title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the field description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set placeholder text.
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Set max length for a text field. Only affects rendering.
    pub fn max_length(mut self, max: usize) -> Self {
        if let ElementType::Textfield { ref mut max_length } = self.element_type {
            *max_length = Some(max);
        }
        self
    }

    /// Append a validator to the chain.
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field type.
    pub fn element_type(&self) -> &ElementType {
        &self.element_type
    }

    /// Submitted value, if any.
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    /// Submitted value, or the empty string.
    pub fn value(&self) -> &str {
        self.data.as_deref().unwrap_or("")
    }

    /// Whether a `DataRequired` validator is attached.
    pub fn is_required(&self) -> bool {
        self.validators
            .iter()
            .any(|v| matches!(v, Validator::DataRequired { .. }))
    }

    /// Whether the last validation run left no errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Clear errors, then run choice checking and the validator chain.
    ///
    /// Returns `true` when the chain ran to completion, meaning the form's
    /// own check for this field should run next.
    pub fn run_validators(&mut self, siblings: &[&Field]) -> bool {
        self.errors.clear();

        if let ElementType::Select { options } = &self.element_type {
            let known = self
                .data
                .as_deref()
                .is_some_and(|value| options.iter().any(|(key, _)| key == value));
            if !known {
                self.errors.push(NOT_A_VALID_CHOICE.to_string());
                return false;
            }
        }

        let mut messages = Vec::new();
        let mut stopped = false;
        for validator in &self.validators {
            match validator.check(self, siblings) {
                Ok(()) => {}
                Err(ValidationError::Stop(message)) => {
                    messages.push(message);
                    stopped = true;
                    break;
                }
                Err(err) => {
                    if let Some(message) = err.message() {
                        messages.push(message.to_string());
                    }
                }
            }
        }
        self.errors.extend(messages);

        !stopped
    }

    /// Record the outcome of a form-level check for this field.
    ///
    /// Field failures become error messages; collaborator failures are
    /// handed back to the caller.
    pub fn record(&mut self, outcome: Result<(), ValidationError>) -> ManageResult<()> {
        match outcome {
            Ok(()) => Ok(()),
            Err(ValidationError::Invalid(message) | ValidationError::Stop(message)) => {
                self.errors.push(message);
                Ok(())
            }
            Err(ValidationError::Service(e)) => Err(e),
        }
    }

    /// Serializable view for template rendering.
    pub fn view(&self) -> FieldView<'_> {
        let value = match self.element_type {
            ElementType::Password => None,
            _ => self.data.as_deref(),
        };
        FieldView {
            name: &self.name,
            element_type: &self.element_type,
            title: self.title.as_deref(),
            description: self.description.as_deref(),
            placeholder: self.placeholder.as_deref(),
            required: self.is_required(),
            value,
            errors: &self.errors,
        }
    }
}

/// Template-facing snapshot of a field.
#[derive(Debug, Serialize)]
pub struct FieldView<'a> {
    pub name: &'a str,
    #[serde(flatten)]
    pub element_type: &'a ElementType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'a str>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<&'a str>,
    pub errors: &'a [String],
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::ManageError;

    fn choices() -> Vec<(String, String)> {
        vec![
            (String::new(), "Pick one".to_string()),
            ("a".to_string(), "A".to_string()),
        ]
    }

    #[test]
    fn test_select_rejects_unknown_and_absent() {
        let mut unknown = Field::select("pick", choices()).with_data("zzz");
        assert!(!unknown.run_validators(&[]));
        assert_eq!(unknown.errors, vec![NOT_A_VALID_CHOICE.to_string()]);

        let mut absent = Field::select("pick", choices());
        assert!(!absent.run_validators(&[]));
        assert_eq!(absent.errors, vec![NOT_A_VALID_CHOICE.to_string()]);
    }

    #[test]
    fn test_chain_stops_on_required() {
        let mut field = Field::text("name")
            .validator(Validator::data_required_with("Need it"))
            .validator(Validator::Length {
                min: Some(3),
                max: None,
                message: None,
            });

        assert!(!field.run_validators(&[]));
        assert_eq!(field.errors, vec!["Need it".to_string()]);
    }

    #[test]
    fn test_chain_collects_non_stopping_errors() {
        let mut field = Field::text("name")
            .with_data("ab")
            .validator(Validator::Length {
                min: Some(3),
                max: None,
                message: Some("short".to_string()),
            })
            .validator(Validator::Email {
                message: "not email".to_string(),
            });

        assert!(field.run_validators(&[]));
        assert_eq!(field.errors, vec!["short".to_string(), "not email".to_string()]);
    }

    #[test]
    fn test_rerun_clears_previous_errors() {
        let mut field = Field::text("name").validator(Validator::data_required());
        field.run_validators(&[]);
        field.run_validators(&[]);
        assert_eq!(field.errors.len(), 1);
    }

    #[test]
    fn test_record_propagates_service_errors() {
        let mut field = Field::text("name");
        field
            .record(Err(ValidationError::invalid("nope")))
            .unwrap();
        assert_eq!(field.errors, vec!["nope".to_string()]);

        let err = field
            .record(Err(ValidationError::Service(ManageError::EmailTaken(
                "x@y.z".to_string(),
            ))))
            .unwrap_err();
        assert!(matches!(err, ManageError::EmailTaken(_)));
    }

    #[test]
    fn test_password_value_not_rendered() {
        let field = Field::password("password").with_data("secret");
        let json = serde_json::to_value(field.view()).unwrap();
        assert_eq!(json["type"], "password");
        assert!(json.get("value").is_none());

        let field = Field::text("username").with_data("alice").max_length(50);
        let json = serde_json::to_value(field.view()).unwrap();
        assert_eq!(json["value"], "alice");
        assert_eq!(json["max_length"], 50);
    }
}
