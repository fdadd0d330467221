use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{new_id, timestamp};
use crate::error::AppError;

const MIN_COVER_LETTER_CHARS: usize = 50;

/// A provider's bid on a posted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::Rejected => "rejected",
            ProposalStatus::Withdrawn => "withdrawn",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    #[serde(rename = "_id", default = "new_id")]
    pub id: String,
    pub job: String,
    pub provider: String,
    pub cover_letter: String,
    pub proposed_budget: f64,
    pub estimated_duration: String,
    #[serde(default)]
    pub status: ProposalStatus,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProposal {
    pub job_id: String,
    pub cover_letter: String,
    pub proposed_budget: f64,
    pub estimated_duration: String,
    #[serde(default)]
    pub attachments: Vec<String>,
}

impl NewProposal {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.job_id.trim().is_empty() || self.estimated_duration.trim().is_empty() {
            return Err(AppError::bad_request("Please provide all required fields"));
        }
        validate_cover_letter(&self.cover_letter)?;
        validate_budget(self.proposed_budget)
    }

    pub fn into_proposal(self, job_id: String, provider: &str, now: DateTime<Utc>) -> Proposal {
        Proposal {
            id: new_id(),
            job: job_id,
            provider: provider.to_string(),
            cover_letter: self.cover_letter.trim().to_string(),
            proposed_budget: self.proposed_budget,
            estimated_duration: self.estimated_duration,
            status: ProposalStatus::Pending,
            attachments: self.attachments,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProposalUpdate {
    pub cover_letter: Option<String>,
    pub proposed_budget: Option<f64>,
    pub estimated_duration: Option<String>,
    pub attachments: Option<Vec<String>>,
}

impl ProposalUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(letter) = &self.cover_letter {
            validate_cover_letter(letter)?;
        }
        if let Some(budget) = self.proposed_budget {
            validate_budget(budget)?;
        }
        Ok(())
    }
}

/// The two decisions a job owner can make on a pending proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalDecision {
    Accepted,
    Rejected,
}

impl ProposalDecision {
    pub fn status(&self) -> ProposalStatus {
        match self {
            ProposalDecision::Accepted => ProposalStatus::Accepted,
            ProposalDecision::Rejected => ProposalStatus::Rejected,
        }
    }
}

fn validate_cover_letter(letter: &str) -> Result<(), AppError> {
    if letter.trim().chars().count() < MIN_COVER_LETTER_CHARS {
        return Err(AppError::bad_request(
            "Cover letter must be at least 50 characters",
        ));
    }
    Ok(())
}

fn validate_budget(budget: f64) -> Result<(), AppError> {
    if !budget.is_finite() || budget <= 0.0 {
        return Err(AppError::bad_request("Budget must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_cover_letters_are_rejected() {
        let proposal = NewProposal {
            job_id: new_id(),
            cover_letter: "I can do it".into(),
            proposed_budget: 100.0,
            estimated_duration: "2 days".into(),
            attachments: vec![],
        };
        assert!(proposal.validate().is_err());
    }

    #[test]
    fn decision_maps_to_status() {
        let decision: ProposalDecision = serde_json::from_str("\"accepted\"").unwrap();
        assert_eq!(decision.status(), ProposalStatus::Accepted);
        assert!(serde_json::from_str::<ProposalDecision>("\"withdrawn\"").is_err());
    }
}
