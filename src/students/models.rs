//! Student record models

use crate::grading::{self, Grade, MAX_SUBJECT_MARKS};
use serde::{Deserialize, Serialize};

/// A stored student record. Derived fields always match the stored marks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub roll_number: String,
    pub math_marks: u8,
    pub science_marks: u8,
    pub english_marks: u8,
    pub total_marks: u32,
    pub percentage: f64,
    pub grade: Grade,
}

/// Raw mark as sent by a client: a JSON number or a numeric form string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MarkValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<u8> for MarkValue {
    fn from(v: u8) -> Self {
        MarkValue::Integer(v as i64)
    }
}

/// Create/replace payload. Every field must be supplied; there are no
/// partial updates. Fields are optional here only so that a missing or
/// `null` field is reported by [`StudentInput::validate`] like any other
/// invalid field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub roll_number: Option<String>,
    pub math_marks: Option<MarkValue>,
    pub science_marks: Option<MarkValue>,
    pub english_marks: Option<MarkValue>,
}

/// A payload that passed validation, normalized and ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentFields {
    pub name: String,
    pub email: String,
    pub roll_number: String,
    pub math_marks: u8,
    pub science_marks: u8,
    pub english_marks: u8,
}

impl StudentFields {
    /// Attach derived fields to produce the record stored under `id`.
    pub fn into_student(self, id: i64) -> Student {
        let derived = grading::derive(self.math_marks, self.science_marks, self.english_marks);
        Student {
            id,
            name: self.name,
            email: self.email,
            roll_number: self.roll_number,
            math_marks: self.math_marks,
            science_marks: self.science_marks,
            english_marks: self.english_marks,
            total_marks: derived.total_marks,
            percentage: derived.percentage,
            grade: derived.grade,
        }
    }
}

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All field violations of one payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("validation failed: {}", summary(.fields))]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

fn summary(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{} {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            fields: vec![FieldError {
                field,
                message: message.into(),
            }],
        }
    }
}

/// Emails are compared case-insensitively and stored lowercase.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl StudentInput {
    /// Check every field and collect all violations at once.
    pub fn validate(&self) -> Result<StudentFields, ValidationError> {
        let mut errors = Vec::new();

        let name = required_text("name", self.name.as_deref(), &mut errors);
        let email = required_text("email", self.email.as_deref(), &mut errors)
            .map(|e| normalize_email(&e));
        let roll_number = required_text("rollNumber", self.roll_number.as_deref(), &mut errors);

        if let Some(email) = &email {
            if !email.contains('@') {
                errors.push(FieldError {
                    field: "email",
                    message: "must be a valid email address".to_string(),
                });
            }
        }

        let math_marks = mark("mathMarks", self.math_marks.as_ref(), &mut errors);
        let science_marks = mark("scienceMarks", self.science_marks.as_ref(), &mut errors);
        let english_marks = mark("englishMarks", self.english_marks.as_ref(), &mut errors);

        match (name, email, roll_number, math_marks, science_marks, english_marks) {
            (Some(name), Some(email), Some(roll_number), Some(math), Some(science), Some(english))
                if errors.is_empty() =>
            {
                Ok(StudentFields {
                    name,
                    email,
                    roll_number,
                    math_marks: math,
                    science_marks: science,
                    english_marks: english,
                })
            }
            _ => Err(ValidationError { fields: errors }),
        }
    }
}

fn required_text(
    field: &'static str,
    value: Option<&str>,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    let trimmed = value.unwrap_or_default().trim();
    if trimmed.is_empty() {
        errors.push(FieldError {
            field,
            message: "is required".to_string(),
        });
        return None;
    }
    Some(trimmed.to_string())
}

fn mark(field: &'static str, value: Option<&MarkValue>, errors: &mut Vec<FieldError>) -> Option<u8> {
    let Some(value) = value else {
        errors.push(FieldError {
            field,
            message: "is required".to_string(),
        });
        return None;
    };

    let parsed = match value {
        MarkValue::Integer(n) => Some(*n),
        MarkValue::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
        MarkValue::Float(_) => None,
        MarkValue::Text(s) => s.trim().parse::<i64>().ok(),
    };

    match parsed {
        Some(n) if (0..=MAX_SUBJECT_MARKS as i64).contains(&n) => Some(n as u8),
        Some(_) => {
            errors.push(FieldError {
                field,
                message: format!("must be between 0 and {}", MAX_SUBJECT_MARKS),
            });
            None
        }
        None => {
            errors.push(FieldError {
                field,
                message: "must be a whole number".to_string(),
            });
            None
        }
    }
}
