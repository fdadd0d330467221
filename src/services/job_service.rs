use futures::TryStreamExt;
use mongodb::bson::{self, doc, Document};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::job::{Job, JobStatus, JobUpdate};
use crate::models::user::Role;
use crate::models::{timestamp, Page, Pagination};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct JobFilters {
    pub category: Option<String>,
    pub status: Option<JobStatus>,
    pub city: Option<String>,
    pub search: Option<String>,
}

/// Escapes regex metacharacters so user search text matches literally.
pub fn escape_regex(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Active jobs only. Providers browsing the marketplace only see open jobs
/// whatever status they ask for.
pub fn list_filter(filters: &JobFilters, viewer_role: Role) -> Document {
    let mut filter = doc! { "isActive": true };
    if let Some(category) = filters.category.as_deref().filter(|c| !c.is_empty()) {
        filter.insert("category", category);
    }
    let status = match viewer_role {
        Role::Provider => Some(JobStatus::Open),
        _ => filters.status,
    };
    if let Some(status) = status {
        filter.insert("status", status.as_str());
    }
    if let Some(city) = filters.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        filter.insert(
            "location.city",
            doc! { "$regex": format!("^{}$", escape_regex(city)), "$options": "i" },
        );
    }
    if let Some(search) = filters.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = escape_regex(search);
        filter.insert(
            "$or",
            vec![
                doc! { "title": { "$regex": pattern.as_str(), "$options": "i" } },
                doc! { "description": { "$regex": pattern.as_str(), "$options": "i" } },
            ],
        );
    }
    filter
}

pub async fn list(
    state: &AppState,
    filter: Document,
    page: Page,
) -> AppResult<(Vec<Job>, Pagination)> {
    let options = FindOptions::builder()
        .sort(doc! { "createdAt": -1 })
        .skip(page.skip())
        .limit(page.limit as i64)
        .build();
    let jobs = state
        .jobs_collection
        .find(filter.clone(), options)
        .await?
        .try_collect()
        .await?;
    let total = state.jobs_collection.count_documents(filter, None).await?;
    Ok((jobs, page.pagination(total)))
}

pub async fn find_active(state: &AppState, id: &str) -> AppResult<Job> {
    state
        .jobs_collection
        .find_one(doc! { "_id": id, "isActive": true }, None)
        .await?
        .ok_or_else(|| AppError::not_found("Job not found"))
}

/// Loads the job and checks `user_id` posted it.
pub async fn find_owned(state: &AppState, id: &str, user_id: &str) -> AppResult<Job> {
    let job = find_active(state, id).await?;
    if job.client != user_id {
        return Err(AppError::forbidden("Not authorized to modify this job"));
    }
    Ok(job)
}

/// Builds the `$set` document for a whitelisted update.
pub fn update_document(update: &JobUpdate) -> AppResult<Document> {
    let mut set = doc! { "updatedAt": timestamp::format(&timestamp::now()) };
    if let Some(title) = &update.title {
        set.insert("title", title.trim());
    }
    if let Some(description) = &update.description {
        set.insert("description", description.trim());
    }
    if let Some(budget) = update.budget {
        set.insert("budget", budget);
    }
    if let Some(deadline) = &update.deadline {
        set.insert("deadline", timestamp::format(deadline));
    }
    if let Some(location) = &update.location {
        set.insert("location", bson::to_bson(location)?);
    }
    if let Some(status) = update.status {
        set.insert("status", status.as_str());
    }
    Ok(set)
}

pub async fn apply_update(state: &AppState, id: &str, set: Document) -> AppResult<Job> {
    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();
    state
        .jobs_collection
        .find_one_and_update(doc! { "_id": id }, doc! { "$set": set }, options)
        .await?
        .ok_or_else(|| AppError::not_found("Job not found"))
}

pub async fn soft_delete(state: &AppState, id: &str) -> AppResult<()> {
    state
        .jobs_collection
        .update_one(
            doc! { "_id": id },
            doc! { "$set": {
                "isActive": false,
                "updatedAt": timestamp::format(&timestamp::now()),
            } },
            None,
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn providers_only_see_open_jobs() {
        let filters = JobFilters {
            status: Some(JobStatus::Completed),
            ..Default::default()
        };
        let filter = list_filter(&filters, Role::Provider);
        assert_eq!(filter.get_str("status").unwrap(), "open");

        let filter = list_filter(&filters, Role::Client);
        assert_eq!(filter.get_str("status").unwrap(), "completed");
    }

    #[test]
    fn search_text_is_matched_literally() {
        assert_eq!(escape_regex("c++ (senior)"), r"c\+\+ \(senior\)");
        let filters = JobFilters {
            search: Some("a.b".into()),
            ..Default::default()
        };
        let filter = list_filter(&filters, Role::Client);
        assert_eq!(filter.get_array("$or").unwrap().len(), 2);
    }

    #[test]
    fn updates_only_touch_supplied_fields() {
        let update = JobUpdate {
            budget: Some(2500.0),
            ..Default::default()
        };
        let set = update_document(&update).unwrap();
        assert_eq!(set.get_f64("budget").unwrap(), 2500.0);
        assert!(set.get("title").is_none());
        assert!(set.get("client").is_none());
    }
}
