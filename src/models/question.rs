// src/models/question.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Label of one of the four answer options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

impl OptionLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionLabel::A => "A",
            OptionLabel::B => "B",
            OptionLabel::C => "C",
            OptionLabel::D => "D",
        }
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(OptionLabel::A),
            "B" => Ok(OptionLabel::B),
            "C" => Ok(OptionLabel::C),
            "D" => Ok(OptionLabel::D),
            other => Err(format!("'{}' is not one of A, B, C, D", other)),
        }
    }
}

/// The four answer options of a multiple-choice question.
///
/// Modeled as a struct rather than a list so a question with a missing or
/// surplus option cannot be constructed past the generation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOptions {
    pub a: String,
    pub b: String,
    pub c: String,
    pub d: String,
}

impl QuestionOptions {
    pub fn get(&self, label: OptionLabel) -> &str {
        match label {
            OptionLabel::A => &self.a,
            OptionLabel::B => &self.b,
            OptionLabel::C => &self.c,
            OptionLabel::D => &self.d,
        }
    }
}

/// A generated practice question. Immutable once created; the blob store is
/// the durable owner, the cache holds a denormalized copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Opaque unique id, assigned when the question is persisted.
    pub id: String,

    /// Course the question belongs to (e.g. "AP Biology").
    pub subject: String,

    /// Concrete unit within the subject (e.g. "Unit 3").
    pub topic: String,

    /// The question text shown to the student.
    pub prompt: String,

    pub options: QuestionOptions,

    pub correct_option: OptionLabel,

    /// Why the correct option is correct.
    pub explanation: String,
}

/// Response DTO for question fetches.
#[derive(Debug, Serialize, Deserialize)]
pub struct FetchQuestionResponse {
    pub question: Question,
    pub served_from_cache: bool,
}
