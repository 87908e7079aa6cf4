use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use models::InstanceKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cache key of a target: `"<instance>/<context_instance_id>"`.
pub fn cache_key(instance: InstanceKind, context_instance_id: i64) -> String {
    format!("{}/{}", instance.as_str(), context_instance_id)
}

/// Stored extended info of one target; `vars` is the JSON object text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoRecord {
    pub id: Uuid,
    pub instance: InstanceKind,
    pub context_instance_id: i64,
    pub vars: String,
    pub updated_at: DateTime<Utc>,
}

impl InfoRecord {
    pub fn cache_key(&self) -> String {
        cache_key(self.instance, self.context_instance_id)
    }
}

impl TryFrom<models::extended_info::Model> for InfoRecord {
    type Error = models::errors::ModelError;

    fn try_from(m: models::extended_info::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: m.id,
            instance: m.instance.parse()?,
            context_instance_id: m.context_instance_id,
            vars: m.vars,
            updated_at: m.updated_at.with_timezone(&Utc),
        })
    }
}

/// Output format requested by page-rendering code.
///
/// Numeric codes follow the host's text format constants; `-1` means raw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Placeholders substituted, no formatting.
    Raw,
    /// Host auto-format: sanitised HTML with line breaks preserved.
    Auto,
    #[default]
    Html,
    Plain,
    /// Legacy wiki-like text, rendered as plain text.
    Wiki,
    Markdown,
}

impl OutputFormat {
    pub fn code(self) -> i32 {
        match self {
            Self::Raw => -1,
            Self::Auto => 0,
            Self::Html => 1,
            Self::Plain => 2,
            Self::Wiki => 3,
            Self::Markdown => 4,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::Raw),
            0 => Some(Self::Auto),
            1 => Some(Self::Html),
            2 => Some(Self::Plain),
            3 => Some(Self::Wiki),
            4 => Some(Self::Markdown),
            _ => None,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(code) = s.parse::<i32>() {
            return Self::from_code(code).ok_or_else(|| format!("unknown format code {code}"));
        }
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "auto" | "moodle" => Ok(Self::Auto),
            "html" => Ok(Self::Html),
            "plain" => Ok(Self::Plain),
            "wiki" => Ok(Self::Wiki),
            "markdown" => Ok(Self::Markdown),
            other => Err(format!("unknown format `{other}`")),
        }
    }
}

/// One row of an edit submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarSubmission {
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub delete: bool,
}

impl VarSubmission {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into(), delete: false }
    }

    pub fn deleting(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into(), delete: true }
    }
}

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(InfoRecord),
    /// The submission left no variables; `existed` tells whether a record was removed.
    Deleted { existed: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    InvalidName,
    Duplicate,
}

/// Validation failure of one submitted row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Index of the row in the submission.
    pub index: usize,
    /// Form field name, `varname-<index>`.
    pub field: String,
    pub kind: FieldErrorKind,
    pub message: String,
}

impl FieldError {
    pub fn new(index: usize, kind: FieldErrorKind) -> Self {
        let message = match kind {
            FieldErrorKind::InvalidName => "Can only contain letters, digits, '.' and '-'.",
            FieldErrorKind::Duplicate => "Duplicate variable names not allowed.",
        };
        Self { index, field: format!("varname-{index}"), kind, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub fields: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool { self.fields.is_empty() }

    pub fn push(&mut self, error: FieldError) { self.fields.push(error); }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.fields.iter().map(|e| format!("{}: {}", e.field, e.message)).collect();
        f.write_str(&parts.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_format() {
        assert_eq!(cache_key(InstanceKind::Course, 5), "course/5");
        assert_eq!(cache_key(InstanceKind::Dashboard, -1), "dashboard/-1");
    }

    #[test]
    fn output_format_accepts_names_and_codes() {
        assert_eq!("raw".parse::<OutputFormat>().unwrap(), OutputFormat::Raw);
        assert_eq!("-1".parse::<OutputFormat>().unwrap(), OutputFormat::Raw);
        assert_eq!("moodle".parse::<OutputFormat>().unwrap(), OutputFormat::Auto);
        assert_eq!("4".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("HTML".parse::<OutputFormat>().unwrap(), OutputFormat::Html);
        assert!("9".parse::<OutputFormat>().is_err());
        assert!("rtf".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::default(), OutputFormat::Html);
    }

    #[test]
    fn validation_errors_display_lists_fields() {
        let mut errs = ValidationErrors::default();
        errs.push(FieldError::new(0, FieldErrorKind::InvalidName));
        errs.push(FieldError::new(2, FieldErrorKind::Duplicate));
        let text = errs.to_string();
        assert!(text.contains("varname-0"));
        assert!(text.contains("varname-2: Duplicate variable names not allowed."));
    }
}
