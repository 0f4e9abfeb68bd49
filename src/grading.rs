//! Grade computation.
//!
//! Percentages are kept in integer hundredths until the last step so band
//! boundaries such as 90.00 compare exactly.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Highest mark a single subject can carry.
pub const MAX_SUBJECT_MARKS: u8 = 100;

/// Number of graded subjects (math, science, english).
const SUBJECT_COUNT: u32 = 3;

/// Letter grade bands, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "F")]
    F,
}

/// Label that is not one of `A+`, `A`, `B`, `C`, `D`, `F`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown grade {0:?}")]
pub struct UnknownGrade(pub String);

impl FromStr for Grade {
    type Err = UnknownGrade;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A+" => Ok(Grade::APlus),
            "A" => Ok(Grade::A),
            "B" => Ok(Grade::B),
            "C" => Ok(Grade::C),
            "D" => Ok(Grade::D),
            "F" => Ok(Grade::F),
            _ => Err(UnknownGrade(s.to_string())),
        }
    }
}

/// Lower bound of each band in hundredths of a percent.
const BANDS: [(u32, Grade); 5] = [
    (9000, Grade::APlus),
    (7500, Grade::A),
    (6000, Grade::B),
    (4000, Grade::C),
    (3300, Grade::D),
];

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }

    /// Band lookup on a percentage expressed in hundredths (9000 == 90.00%).
    pub fn for_hundredths(hundredths: u32) -> Self {
        BANDS
            .iter()
            .find(|(floor, _)| hundredths >= *floor)
            .map(|(_, grade)| *grade)
            .unwrap_or(Grade::F)
    }

    /// Band lookup on a two-decimal percentage such as `89.99`.
    pub fn for_percentage(percentage: f64) -> Self {
        let hundredths = (percentage * 100.0).round().max(0.0) as u32;
        Self::for_hundredths(hundredths)
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived result fields of a student record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Derived {
    pub total_marks: u32,
    pub percentage: f64,
    pub grade: Grade,
}

/// Compute total, percentage and grade. Marks are expected in `0..=100`.
pub fn derive(math_marks: u8, science_marks: u8, english_marks: u8) -> Derived {
    let total_marks = math_marks as u32 + science_marks as u32 + english_marks as u32;
    let hundredths = percentage_hundredths(total_marks);

    Derived {
        total_marks,
        percentage: hundredths as f64 / 100.0,
        grade: Grade::for_hundredths(hundredths),
    }
}

/// `total / 3` in hundredths, rounded half-up, in exact integer arithmetic.
fn percentage_hundredths(total_marks: u32) -> u32 {
    (total_marks * 200 + SUBJECT_COUNT) / (SUBJECT_COUNT * 2)
}
