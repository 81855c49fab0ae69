use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::model::ids::{BatchId, CourseId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BatchError {
    #[error("batch name cannot be empty")]
    EmptyName,

    #[error("batch ends ({end}) before it starts ({start})")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
}

/// A scheduled cohort of a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub id: BatchId,
    pub course_id: CourseId,
    pub name: String,
    pub start_date: NaiveDate,
    /// `None` for an ongoing batch.
    pub end_date: Option<NaiveDate>,
}

/// Fields an admin fills in to open a new batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDraft {
    pub name: String,
    pub start_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl BatchDraft {
    /// # Errors
    ///
    /// Returns `BatchError` for a blank name or an end date before the start date.
    /// An open-ended batch has no end date to check.
    pub fn validate(self) -> Result<Self, BatchError> {
        let name = self.name.trim().to_owned();
        if name.is_empty() {
            return Err(BatchError::EmptyName);
        }
        if let Some(end) = self.end_date.filter(|end| *end < self.start_date) {
            return Err(BatchError::InvalidDateRange {
                start: self.start_date,
                end,
            });
        }
        Ok(Self { name, ..self })
    }
}
