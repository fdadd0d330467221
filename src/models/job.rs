use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{new_id, timestamp};
use crate::error::AppError;

pub const JOB_CATEGORIES: &[&str] = &[
    "Plumbing",
    "Electrical",
    "Carpentry",
    "Painting",
    "Cleaning",
    "Gardening",
    "AC Repair",
    "Appliance Repair",
    "Pest Control",
    "Moving & Packing",
    "Home Renovation",
    "Interior Design",
    "Beauty & Wellness",
    "IT & Tech Support",
    "Other Services",
];

const MIN_TITLE_CHARS: usize = 10;
const MIN_DESCRIPTION_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Open => "open",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobLocation {
    pub city: String,
    pub area: String,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(rename = "_id", default = "new_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub budget: f64,
    #[serde(with = "timestamp")]
    pub deadline: DateTime<Utc>,
    pub location: JobLocation,
    pub client: String,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub proposals_count: i64,
    #[serde(default)]
    pub assigned_provider: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

/// Body of `POST /jobs`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub category: String,
    pub budget: f64,
    #[serde(with = "timestamp")]
    pub deadline: DateTime<Utc>,
    pub location: JobLocation,
    #[serde(default)]
    pub attachments: Vec<String>,
}

impl NewJob {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_title(&self.title)?;
        validate_description(&self.description)?;
        validate_budget(self.budget)?;
        if !JOB_CATEGORIES.contains(&self.category.as_str()) {
            return Err(AppError::bad_request(format!(
                "Unknown category '{}'",
                self.category
            )));
        }
        if self.location.city.trim().is_empty() || self.location.area.trim().is_empty() {
            return Err(AppError::bad_request("Location city and area are required"));
        }
        Ok(())
    }

    pub fn into_job(self, client: &str, now: DateTime<Utc>) -> Job {
        Job {
            id: new_id(),
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            category: self.category,
            budget: self.budget,
            deadline: self.deadline,
            location: self.location,
            client: client.to_string(),
            status: JobStatus::Open,
            proposals_count: 0,
            assigned_provider: None,
            attachments: self.attachments,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Body of `PUT /jobs/{id}`. Only these fields may change.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct JobUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub budget: Option<f64>,
    #[serde(default, with = "timestamp::option")]
    pub deadline: Option<DateTime<Utc>>,
    pub location: Option<JobLocation>,
    pub status: Option<JobStatus>,
}

impl JobUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        if let Some(budget) = self.budget {
            validate_budget(budget)?;
        }
        Ok(())
    }
}

fn validate_title(title: &str) -> Result<(), AppError> {
    if title.trim().chars().count() < MIN_TITLE_CHARS {
        return Err(AppError::bad_request("Title must be at least 10 characters"));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), AppError> {
    if description.trim().chars().count() < MIN_DESCRIPTION_CHARS {
        return Err(AppError::bad_request(
            "Description must be at least 50 characters",
        ));
    }
    Ok(())
}

fn validate_budget(budget: f64) -> Result<(), AppError> {
    if !budget.is_finite() || budget < 0.0 {
        return Err(AppError::bad_request("Budget must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewJob {
        NewJob {
            title: "Fix the kitchen sink".into(),
            description: "The kitchen sink has been leaking for two days and needs a plumber."
                .into(),
            category: "Plumbing".into(),
            budget: 1500.0,
            deadline: timestamp::now(),
            location: JobLocation {
                city: "Hyderabad".into(),
                area: "Madhapur".into(),
                address: None,
            },
            attachments: vec![],
        }
    }

    #[test]
    fn valid_job_passes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn short_title_and_unknown_category_are_rejected() {
        let mut job = sample();
        job.title = "Sink".into();
        assert!(job.validate().is_err());

        let mut job = sample();
        job.category = "Astrology".into();
        assert!(job.validate().is_err());
    }

    #[test]
    fn negative_budget_is_rejected() {
        let mut job = sample();
        job.budget = -1.0;
        assert!(job.validate().is_err());
    }

    #[test]
    fn new_jobs_start_open() {
        let job = sample().into_job("client-1", timestamp::now());
        assert_eq!(job.status, JobStatus::Open);
        assert!(job.is_active);
        assert_eq!(job.proposals_count, 0);
    }
}
