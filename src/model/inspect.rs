// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of pmedit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Generic descriptions of node fields for property panels.
//!
//! Every node variant lists its fields explicitly as [`Inspectable`]s. The editor reads and
//! patches fields by name through this list, so new variants need no per-field editor code.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Basic type tag of an inspectable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Enum,
    /// Displayed but never editable.
    Info,
    /// Never displayed.
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Inspectable {
    pub name: String,
    pub label: String,
    pub value: Value,
    pub field_kind: FieldKind,
    pub mutable: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl Inspectable {
    pub fn text(name: &str, value: &str) -> Self {
        Self::new(name, Value::from(value), FieldKind::Text)
    }

    pub fn number(name: &str, value: impl Into<Value>) -> Self {
        Self::new(name, value.into(), FieldKind::Number)
    }

    pub fn choice(name: &str, value: &str, options: &[&str]) -> Self {
        let mut field = Self::new(name, Value::from(value), FieldKind::Enum);
        field.options = options.iter().map(|option| (*option).to_owned()).collect();
        field
    }

    pub fn info(name: &str, value: Value) -> Self {
        Self::new(name, value, FieldKind::Info)
    }

    fn new(name: &str, value: Value, field_kind: FieldKind) -> Self {
        Self {
            name: name.to_owned(),
            label: label_for(name),
            value,
            field_kind,
            mutable: !matches!(field_kind, FieldKind::Info | FieldKind::Hidden),
            options: Vec::new(),
        }
    }

    pub fn read_only(mut self) -> Self {
        self.mutable = false;
        if self.field_kind != FieldKind::Hidden {
            self.field_kind = FieldKind::Info;
        }
        self
    }
}

/// `ball_count` -> `Ball count`.
pub fn label_for(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InspectError {
    #[error("invalid value for field '{field}': expected {expected}, got {found}")]
    InvalidValue {
        field: String,
        expected: &'static str,
        found: String,
    },
}

impl InspectError {
    fn invalid(field: &str, expected: &'static str, found: &Value) -> Self {
        Self::InvalidValue {
            field: field.to_owned(),
            expected,
            found: found.to_string(),
        }
    }
}

/// Explicit field table of a node variant.
pub trait FieldSet {
    /// Variant fields in display order, hidden fields excluded.
    fn fields(&self) -> Vec<Inspectable>;

    /// Writes one field. Returns `Ok(false)` for unknown or read-only names.
    fn set_field(&mut self, name: &str, value: &Value) -> Result<bool, InspectError>;
}

pub(crate) fn expect_text(field: &str, value: &Value) -> Result<String, InspectError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(InspectError::invalid(field, "text", other)),
    }
}

/// Accepts JSON numbers and numeric strings (form-encoded panels submit strings).
pub(crate) fn expect_count(field: &str, value: &Value) -> Result<u32, InspectError> {
    let parsed = match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed
        .and_then(|count| u32::try_from(count).ok())
        .ok_or_else(|| InspectError::invalid(field, "non-negative integer", value))
}

pub(crate) fn expect_choice<'a>(
    field: &str,
    value: &Value,
    options: &[&'a str],
) -> Result<&'a str, InspectError> {
    let Value::String(text) = value else {
        return Err(InspectError::invalid(field, "one of the listed options", value));
    };
    options
        .iter()
        .copied()
        .find(|option| *option == text)
        .ok_or_else(|| InspectError::invalid(field, "one of the listed options", value))
}
