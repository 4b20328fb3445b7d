//! Form layer: submitted data, fields, and validators.
//!
//! A form owns one [`Field`] per input. Validation of a field runs in three
//! stages:
//! - choice checking for select fields
//! - the declarative [`Validator`] chain, where `DataRequired` stops early
//! - the owning form's own check (user lookups, OTP verification, ...)
//!
//! Field failures are collected into `Field::errors`. Collaborator failures
//! abort validation and surface as `Err`.

mod data;
mod field;
mod validators;

use std::collections::BTreeMap;

pub use data::FormData;
pub use field::{ElementType, Field, FieldView, NOT_A_VALID_CHOICE};
pub use validators::{ValidationError, Validator};

use crate::error::ManageResult;

/// Behaviour shared by every account-management form.
pub trait Form {
    /// Stable identifier, e.g. for template lookup.
    fn form_id(&self) -> &'static str;

    /// Fields in display order.
    fn fields(&self) -> Vec<&Field>;

    /// Validate every field, returning whether the form is valid.
    fn validate(&mut self) -> ManageResult<bool>;

    /// Non-empty error lists keyed by field name.
    fn errors(&self) -> BTreeMap<String, Vec<String>> {
        self.fields()
            .into_iter()
            .filter(|f| !f.errors.is_empty())
            .map(|f| (f.name().to_string(), f.errors.clone()))
            .collect()
    }

    /// Whether every field is currently free of errors.
    fn is_valid(&self) -> bool {
        self.fields().iter().all(|f| f.is_valid())
    }

    /// Serializable field views for rendering.
    fn views(&self) -> Vec<FieldView<'_>> {
        self.fields().into_iter().map(Field::view).collect()
    }
}
