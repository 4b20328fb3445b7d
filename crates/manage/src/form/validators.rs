//! Built-in field validators and the validation error type.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::error::ManageError;

use super::field::Field;

#[allow(clippy::expect_used)]
static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex literal"));

/// Outcome of a failed field check.
///
/// `Invalid` and `Stop` end up in the field's error list. `Service` means a
/// collaborator could not answer at all, and aborts form validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{0}")]
    Invalid(String),

    /// Like `Invalid`, but no further validators run for the field.
    #[error("{0}")]
    Stop(String),

    #[error(transparent)]
    Service(#[from] ManageError),
}

impl ValidationError {
    /// Create an error that lets the rest of the chain run.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    /// Create an error that halts the chain.
    pub fn stop(message: impl Into<String>) -> Self {
        Self::Stop(message.into())
    }

    /// The field message, if this is a field-level failure.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Invalid(m) | Self::Stop(m) => Some(m),
            Self::Service(_) => None,
        }
    }
}

/// A declarative check attached to a field.
#[derive(Debug, Clone)]
pub enum Validator {
    /// Value must be present and not blank. Stops the chain on failure.
    DataRequired { message: String },

    /// Character count bounds.
    Length {
        min: Option<usize>,
        max: Option<usize>,
        message: Option<String>,
    },

    /// Value must match the pattern.
    Regexp { pattern: Regex, message: String },

    /// Value must look like an email address.
    Email { message: String },

    /// Value must equal the value of a sibling field.
    EqualTo { other: String, message: String },
}

impl Validator {
    /// Required field with the default message.
    pub fn data_required() -> Self {
        Self::DataRequired {
            message: "This field is required.".to_string(),
        }
    }

    /// Required field with a custom message.
    pub fn data_required_with(message: impl Into<String>) -> Self {
        Self::DataRequired {
            message: message.into(),
        }
    }

    /// Run this validator against a field. `EqualTo` looks its partner up
    /// among `siblings`.
    pub fn check(&self, field: &Field, siblings: &[&Field]) -> Result<(), ValidationError> {
        match self {
            Self::DataRequired { message } => match field.data() {
                Some(value) if !value.trim().is_empty() => Ok(()),
                _ => Err(ValidationError::stop(message.clone())),
            },
            Self::Length { min, max, message } => {
                let len = field.value().chars().count();
                let too_short = min.is_some_and(|min| len < min);
                let too_long = max.is_some_and(|max| len > max);
                if too_short || too_long {
                    let message = message
                        .clone()
                        .unwrap_or_else(|| length_message(*min, *max));
                    return Err(ValidationError::invalid(message));
                }
                Ok(())
            }
            Self::Regexp { pattern, message } => {
                if pattern.is_match(field.value()) {
                    Ok(())
                } else {
                    Err(ValidationError::invalid(message.clone()))
                }
            }
            Self::Email { message } => {
                if EMAIL_SHAPE.is_match(field.value()) {
                    Ok(())
                } else {
                    Err(ValidationError::invalid(message.clone()))
                }
            }
            Self::EqualTo { other, message } => {
                let other_value = siblings
                    .iter()
                    .find(|s| s.name() == other)
                    .and_then(|s| s.data());
                if other_value == field.data() {
                    Ok(())
                } else {
                    Err(ValidationError::invalid(message.clone()))
                }
            }
        }
    }
}

fn length_message(min: Option<usize>, max: Option<usize>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("Field must be between {min} and {max} characters long."),
        (Some(min), None) => format!("Field must be at least {min} characters long."),
        (None, Some(max)) => format!("Field cannot be longer than {max} characters."),
        (None, None) => "Field has an invalid length.".to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_data_required_rejects_blank() {
        let v = Validator::data_required();
        let blank = Field::text("name").with_data("   ");
        let missing = Field::text("name");

        assert!(matches!(v.check(&blank, &[]), Err(ValidationError::Stop(_))));
        assert!(matches!(v.check(&missing, &[]), Err(ValidationError::Stop(_))));
        assert!(v.check(&Field::text("name").with_data("x"), &[]).is_ok());
    }

    #[test]
    fn test_length_default_messages() {
        let v = Validator::Length {
            min: Some(2),
            max: Some(4),
            message: None,
        };
        let err = v.check(&Field::text("f").with_data("abcde"), &[]).unwrap_err();
        assert_eq!(
            err.message(),
            Some("Field must be between 2 and 4 characters long.")
        );

        let v = Validator::Length {
            min: None,
            max: Some(1),
            message: None,
        };
        let err = v.check(&Field::text("f").with_data("ab"), &[]).unwrap_err();
        assert_eq!(err.message(), Some("Field cannot be longer than 1 characters."));
    }

    #[test]
    fn test_length_counts_characters() {
        let v = Validator::Length {
            min: None,
            max: Some(3),
            message: None,
        };
        assert!(v.check(&Field::text("f").with_data("äöü"), &[]).is_ok());
    }

    #[test]
    fn test_email_shape() {
        let v = Validator::Email {
            message: "bad".to_string(),
        };
        assert!(v.check(&Field::text("e").with_data("a@b.io"), &[]).is_ok());
        assert!(v.check(&Field::text("e").with_data("a@b"), &[]).is_err());
        assert!(v.check(&Field::text("e").with_data("a b@c.io"), &[]).is_err());
    }

    #[test]
    fn test_equal_to_compares_sibling() {
        let v = Validator::EqualTo {
            other: "new_password".to_string(),
            message: "mismatch".to_string(),
        };
        let new_password = Field::password("new_password").with_data("hunter22");
        let same = Field::password("password_confirm").with_data("hunter22");
        let different = Field::password("password_confirm").with_data("hunter23");

        assert!(v.check(&same, &[&new_password]).is_ok());
        assert_eq!(
            v.check(&different, &[&new_password]).unwrap_err().message(),
            Some("mismatch")
        );
    }
}
