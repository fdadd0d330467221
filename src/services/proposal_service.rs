use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};

use crate::error::{AppError, AppResult};
use crate::models::job::{Job, JobStatus};
use crate::models::notification::Notification;
use crate::models::proposal::{
    NewProposal, Proposal, ProposalDecision, ProposalStatus, ProposalUpdate,
};
use crate::models::timestamp;
use crate::models::user::UserModel;
use crate::services::{job_service, notification_service, order_service};
use crate::state::AppState;

/// Statuses that block a provider from bidding on the same job again.
const LIVE_STATUSES: [&str; 2] = ["pending", "accepted"];

/// Submits a bid. The job must be open, not the provider's own, and the
/// provider may only hold one live proposal on it.
pub async fn submit(
    state: &AppState,
    provider: &UserModel,
    input: NewProposal,
) -> AppResult<Proposal> {
    input.validate()?;
    let job_id = crate::models::parse_id(&input.job_id, "job")?;
    let job = job_service::find_active(state, &job_id).await?;

    if job.status != JobStatus::Open {
        return Err(AppError::bad_request("This job is no longer accepting proposals"));
    }
    if job.client == provider.id {
        return Err(AppError::bad_request("You cannot submit a proposal to your own job"));
    }

    let existing = state
        .proposals_collection
        .count_documents(
            doc! {
                "job": job_id.as_str(),
                "provider": provider.id.as_str(),
                "status": { "$in": LIVE_STATUSES.to_vec() },
            },
            None,
        )
        .await?;
    if existing > 0 {
        return Err(AppError::Conflict(
            "You have already submitted a proposal for this job".into(),
        ));
    }

    let now = timestamp::now();
    let proposal = input.into_proposal(job_id.clone(), &provider.id, now);
    state.proposals_collection.insert_one(&proposal, None).await?;
    state
        .jobs_collection
        .update_one(
            doc! { "_id": job_id.as_str() },
            doc! { "$inc": { "proposalsCount": 1_i64 } },
            None,
        )
        .await?;

    notification_service::notify(
        &state.notifications_collection,
        Notification::new(
            &job.client,
            "proposal_received",
            format!("📝 {} sent a proposal for \"{}\"", provider.full_name, job.title),
            now,
        )
        .from_user(&provider.id)
        .linking_to(format!("/jobs/{}", job.id)),
    )
    .await;

    Ok(proposal)
}

pub async fn find(state: &AppState, id: &str) -> AppResult<Proposal> {
    state
        .proposals_collection
        .find_one(doc! { "_id": id }, None)
        .await?
        .ok_or_else(|| AppError::not_found("Proposal not found"))
}

pub async fn list(state: &AppState, filter: Document) -> AppResult<Vec<Proposal>> {
    let options = FindOptions::builder().sort(doc! { "createdAt": -1 }).build();
    Ok(state
        .proposals_collection
        .find(filter, options)
        .await?
        .try_collect()
        .await?)
}

/// Loads a proposal the provider owns and that is still pending.
pub async fn find_pending_owned(state: &AppState, id: &str, provider: &str) -> AppResult<Proposal> {
    let proposal = find(state, id).await?;
    if proposal.provider != provider {
        return Err(AppError::forbidden("Not authorized to modify this proposal"));
    }
    if proposal.status != ProposalStatus::Pending {
        return Err(AppError::bad_request("Only pending proposals can be changed"));
    }
    Ok(proposal)
}

fn after() -> Option<FindOneAndUpdateOptions> {
    Some(
        FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build(),
    )
}

pub async fn update(state: &AppState, id: &str, update: ProposalUpdate) -> AppResult<Proposal> {
    update.validate()?;
    let mut set = doc! { "updatedAt": timestamp::format(&timestamp::now()) };
    if let Some(letter) = &update.cover_letter {
        set.insert("coverLetter", letter.trim());
    }
    if let Some(budget) = update.proposed_budget {
        set.insert("proposedBudget", budget);
    }
    if let Some(duration) = &update.estimated_duration {
        set.insert("estimatedDuration", duration.as_str());
    }
    if let Some(attachments) = update.attachments {
        set.insert("attachments", attachments);
    }

    // The status guard keeps a concurrent accept from being overwritten.
    state
        .proposals_collection
        .find_one_and_update(
            doc! { "_id": id, "status": "pending" },
            doc! { "$set": set },
            after(),
        )
        .await?
        .ok_or_else(|| AppError::bad_request("Only pending proposals can be changed"))
}

pub async fn withdraw(state: &AppState, proposal: &Proposal) -> AppResult<Proposal> {
    let updated = state
        .proposals_collection
        .find_one_and_update(
            doc! { "_id": proposal.id.as_str(), "status": "pending" },
            doc! { "$set": {
                "status": ProposalStatus::Withdrawn.as_str(),
                "updatedAt": timestamp::format(&timestamp::now()),
            } },
            after(),
        )
        .await?
        .ok_or_else(|| AppError::bad_request("Only pending proposals can be withdrawn"))?;

    state
        .jobs_collection
        .update_one(
            doc! { "_id": proposal.job.as_str(), "proposalsCount": { "$gt": 0_i64 } },
            doc! { "$inc": { "proposalsCount": -1_i64 } },
            None,
        )
        .await?;
    Ok(updated)
}

/// Claims an open job for `provider`. Only one accept can win: the filter
/// requires the job to still be open.
pub fn claim_job_filter(job_id: &str) -> Document {
    doc! { "_id": job_id, "status": JobStatus::Open.as_str(), "isActive": true }
}

/// Puts a claimed job back on the marketplace when the proposal it was
/// claimed for could not be accepted.
async fn release_claim(state: &AppState, job_id: &str, provider: &str, now: &str) -> AppResult<()> {
    state
        .jobs_collection
        .update_one(
            doc! {
                "_id": job_id,
                "status": JobStatus::InProgress.as_str(),
                "assignedProvider": provider,
            },
            doc! {
                "$set": { "status": JobStatus::Open.as_str(), "updatedAt": now },
                "$unset": { "assignedProvider": "" },
            },
            None,
        )
        .await?;
    Ok(())
}

/// Accepts or rejects a pending proposal on the caller's job. Accepting
/// assigns the job, rejects every other pending bid on it and opens an
/// order for the agreed budget.
pub async fn decide(
    state: &AppState,
    job: &Job,
    proposal: &Proposal,
    decision: ProposalDecision,
) -> AppResult<Proposal> {
    let now = timestamp::format(&timestamp::now());
    let status = decision.status();

    if decision == ProposalDecision::Accepted {
        let claimed = state
            .jobs_collection
            .update_one(
                claim_job_filter(&job.id),
                doc! { "$set": {
                    "status": JobStatus::InProgress.as_str(),
                    "assignedProvider": proposal.provider.as_str(),
                    "updatedAt": now.as_str(),
                } },
                None,
            )
            .await?;
        if claimed.matched_count == 0 {
            return Err(AppError::bad_request(
                "This job already has an accepted proposal",
            ));
        }
    }

    let updated = state
        .proposals_collection
        .find_one_and_update(
            doc! { "_id": proposal.id.as_str(), "status": "pending" },
            doc! { "$set": { "status": status.as_str(), "updatedAt": now.as_str() } },
            after(),
        )
        .await?;
    let Some(updated) = updated else {
        if decision == ProposalDecision::Accepted {
            release_claim(state, &job.id, &proposal.provider, &now).await?;
        }
        return Err(AppError::bad_request("This proposal has already been processed"));
    };

    if decision == ProposalDecision::Accepted {
        let rejected = state
            .proposals_collection
            .update_many(
                doc! {
                    "job": job.id.as_str(),
                    "_id": { "$ne": proposal.id.as_str() },
                    "status": "pending",
                },
                doc! { "$set": {
                    "status": ProposalStatus::Rejected.as_str(),
                    "updatedAt": now.as_str(),
                } },
                None,
            )
            .await?;
        log::info!(
            "job {} assigned to {}; {} other proposals rejected",
            job.id,
            proposal.provider,
            rejected.modified_count
        );
        order_service::open_for_accepted(state, job, &updated).await?;
    }

    let (kind, message) = match decision {
        ProposalDecision::Accepted => (
            "proposal_accepted",
            format!("🎉 Your proposal for \"{}\" was accepted", job.title),
        ),
        ProposalDecision::Rejected => (
            "proposal_rejected",
            format!("Your proposal for \"{}\" was not selected", job.title),
        ),
    };
    notification_service::notify(
        &state.notifications_collection,
        Notification::new(&proposal.provider, kind, message, timestamp::now())
            .from_user(&job.client)
            .linking_to(format!("/jobs/{}", job.id)),
    )
    .await;

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_open_active_jobs_can_be_claimed() {
        let filter = claim_job_filter("65f0c2a9e4b0a1b2c3d4e5f6");
        assert_eq!(filter.get_str("_id").unwrap(), "65f0c2a9e4b0a1b2c3d4e5f6");
        assert_eq!(filter.get_str("status").unwrap(), "open");
        assert!(filter.get_bool("isActive").unwrap());
    }
}
