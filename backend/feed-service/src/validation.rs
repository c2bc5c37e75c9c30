//! Field rules for post and comment input.
//!
//! Lengths are checked on the raw input; the accepted values are then
//! HTML-escaped before they reach the store.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::error::{AppError, Result};

/// One failed field, shaped the way clients already parse it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub param: String,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    pub location: &'static str,
}

impl FieldError {
    pub fn body(param: &str, msg: &str, value: Option<serde_json::Value>) -> Self {
        Self {
            param: param.to_string(),
            msg: msg.to_string(),
            value,
            location: "body",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PostInput {
    #[validate(length(min = 5, message = "Title must be atleast 5 char long"))]
    #[serde(default)]
    pub title: String,
    #[validate(length(min = 120, message = "Description must be atleast 120 char long"))]
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CommentInput {
    #[validate(length(min = 5, message = "Comment must be atleast 5 char long"))]
    #[serde(default)]
    pub comment: String,
}

impl PostInput {
    /// Validate, then return the escaped values.
    pub fn sanitized(self) -> Result<Self> {
        self.validate().map_err(into_app_error)?;
        Ok(Self {
            title: escape(&self.title),
            description: escape(&self.description),
        })
    }
}

impl CommentInput {
    pub fn sanitized(self) -> Result<Self> {
        self.validate().map_err(into_app_error)?;
        Ok(Self {
            comment: escape(&self.comment),
        })
    }
}

/// Flatten validator output into a stable, field-ordered list.
pub fn into_app_error(errors: ValidationErrors) -> AppError {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter()
                .map(|e| {
                    let msg = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string());
                    FieldError::body(&field, &msg, e.params.get("value").cloned())
                })
                .collect::<Vec<_>>()
        })
        .collect();

    fields.sort_by(|a, b| a.param.cmp(&b.param));
    AppError::Validation(fields)
}

/// Replace HTML-significant characters with entities.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '/' => out.push_str("&#x2F;"),
            '\\' => out.push_str("&#x5C;"),
            '`' => out.push_str("&#96;"),
            _ => out.push(c),
        }
    }
    out
}
