//! Request body validation
//!
//! Input structs implement [`Validate`] and are extracted with
//! [`ValidatedJson`], which answers 400 with a field-level error list before
//! the handler runs.

use std::sync::OnceLock;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use regex::Regex;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::ApiError;

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Accumulates field errors for one input struct
#[derive(Debug, Default)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    /// Non-empty after trimming
    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.add(field, "is required");
        }
        self
    }

    /// Character count within `min..=max`
    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let len = value.chars().count();
        if len < min || len > max {
            self.add(field, format!("must be between {} and {} characters", min, max));
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if !is_email(value) {
            self.add(field, "must be a valid email address");
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<FieldError> {
        self.0
    }

    /// `Ok(())` when nothing was recorded
    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Declarative constraints for a request body
pub trait Validate {
    /// Canonicalize fields before they are checked, so the checked value is
    /// the stored value
    fn normalize(&mut self) {}

    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Strip surrounding whitespace in place
pub fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

pub fn is_email(value: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    let re = EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
    });
    value.len() <= 255 && re.is_match(value)
}

/// JSON body that has been parsed and validated
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(mut value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::invalid_json(rejection.body_text()))?;
        value.normalize();
        value.validate()?;
        Ok(Self(value))
    }
}

/// Parse a numeric path id, naming the resource in the 400 message
pub fn parse_id(raw: &str, resource: &str) -> Result<i64, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ApiError::bad_request(format!("Invalid or missing {} ID", resource)));
    }
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::bad_request(format!("Invalid {} ID format", resource))),
    }
}
