use super::{SortOrder, StateEvent, join_labels, project_endpoint, require, require_id, wire_name};
use crate::{
    client::{GitLabClient, Query},
    error::Result,
    models::{Comment, MergeRequest},
    pagination::validate_paging,
};
use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_with::skip_serializing_none;

const DRAFT_PREFIX: &str = "Draft: ";

#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MergeRequestState {
    Opened,
    Closed,
    Locked,
    Merged,
    All,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MergeRequestSort {
    CreatedAt,
    UpdatedAt,
    Title,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct MergeRequestFilters {
    #[schemars(description = "Filter merge requests by state")]
    pub state: Option<MergeRequestState>,
    #[schemars(description = "Filter by target branch")]
    pub target_branch: Option<String>,
    #[schemars(description = "Filter by source branch")]
    pub source_branch: Option<String>,
    #[schemars(description = "Comma-separated list of label names")]
    pub labels: Option<String>,
    #[schemars(description = "Milestone title")]
    pub milestone: Option<String>,
    #[schemars(description = "User ID of assignee")]
    pub assignee_id: Option<u64>,
    #[schemars(description = "User ID of author")]
    pub author_id: Option<u64>,
    #[schemars(description = "Search against title and description")]
    pub search: Option<String>,
    #[schemars(description = "Return MRs created after date (ISO 8601)")]
    pub created_after: Option<String>,
    #[schemars(description = "Return MRs created before date (ISO 8601)")]
    pub created_before: Option<String>,
    #[schemars(description = "Return MRs updated after date (ISO 8601)")]
    pub updated_after: Option<String>,
    #[schemars(description = "Return MRs updated before date (ISO 8601)")]
    pub updated_before: Option<String>,
    #[serde(skip_serializing)]
    #[schemars(description = "Sort merge requests")]
    pub sort: Option<MergeRequestSort>,
    #[serde(skip_serializing)]
    #[schemars(description = "Sort order")]
    pub order_by: Option<SortOrder>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListMergeRequestsParams {
    #[schemars(description = "Project ID or URL-encoded path")]
    pub project_id: String,
    #[serde(flatten)]
    pub filters: MergeRequestFilters,
    #[schemars(description = "Page number for pagination (default: 1)")]
    pub page: Option<i64>,
    #[schemars(description = "Number of results per page (default: 20)")]
    pub per_page: Option<i64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateMergeRequestParams {
    #[schemars(description = "Project ID or URL-encoded path")]
    pub project_id: String,
    #[schemars(description = "Merge request title")]
    pub title: String,
    #[schemars(description = "Merge request description")]
    pub description: Option<String>,
    #[schemars(description = "Branch containing changes")]
    pub source_branch: String,
    #[schemars(description = "Branch to merge into")]
    pub target_branch: String,
    #[schemars(description = "Create as draft merge request")]
    pub draft: Option<bool>,
    #[schemars(description = "Allow commits from upstream members")]
    pub allow_collaboration: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateMergeRequestParams {
    #[schemars(description = "Project ID or URL-encoded path")]
    pub project_id: String,
    #[schemars(description = "Merge request internal ID")]
    pub merge_request_iid: i64,
    #[schemars(description = "New merge request title")]
    pub title: Option<String>,
    #[schemars(description = "New merge request description")]
    pub description: Option<String>,
    #[schemars(description = "Change merge request state")]
    pub state_event: Option<StateEvent>,
    #[schemars(description = "New target branch")]
    pub target_branch: Option<String>,
    #[schemars(description = "Array of label names")]
    pub labels: Option<Vec<String>>,
    #[schemars(description = "Array of user IDs to assign")]
    pub assignee_ids: Option<Vec<u64>>,
    #[schemars(description = "Milestone ID to assign")]
    pub milestone_id: Option<u64>,
    #[schemars(description = "Remove source branch when merged")]
    pub remove_source_branch: Option<bool>,
}

#[skip_serializing_none]
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct MergeOptions {
    #[schemars(description = "Custom merge commit message")]
    pub merge_commit_message: Option<String>,
    #[schemars(description = "Remove source branch after merge")]
    pub should_remove_source_branch: Option<bool>,
    #[schemars(description = "Merge when pipeline succeeds")]
    pub merge_when_pipeline_succeeds: Option<bool>,
    #[schemars(description = "SHA that must match the source branch HEAD")]
    pub sha: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MergeMergeRequestParams {
    #[schemars(description = "Project ID or URL-encoded path")]
    pub project_id: String,
    #[schemars(description = "Merge request internal ID")]
    pub merge_request_iid: i64,
    #[serde(flatten)]
    pub options: MergeOptions,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddMergeRequestCommentParams {
    #[schemars(description = "Project ID or URL-encoded path")]
    pub project_id: String,
    #[schemars(description = "Merge request internal ID")]
    pub merge_request_iid: i64,
    #[schemars(description = "Content of the comment")]
    pub body: String,
}

#[skip_serializing_none]
#[derive(Serialize)]
struct NewMergeRequest<'a> {
    title: String,
    description: Option<&'a str>,
    source_branch: &'a str,
    target_branch: &'a str,
    allow_collaboration: Option<bool>,
}

#[skip_serializing_none]
#[derive(Serialize)]
struct MergeRequestChanges<'a> {
    title: Option<&'a str>,
    description: Option<&'a str>,
    state_event: Option<StateEvent>,
    target_branch: Option<&'a str>,
    labels: Option<String>,
    assignee_ids: Option<&'a [u64]>,
    milestone_id: Option<u64>,
    remove_source_branch: Option<bool>,
}

/// GitLab marks drafts by title prefix.
fn draft_title(title: &str, draft: bool) -> String {
    let lower = title.to_ascii_lowercase();
    if draft && !lower.starts_with("draft:") && !lower.starts_with("[draft]") {
        format!("{DRAFT_PREFIX}{title}")
    } else {
        title.to_string()
    }
}

pub async fn list_merge_requests(
    client: &GitLabClient,
    params: ListMergeRequestsParams,
) -> Result<Vec<MergeRequest>> {
    require(&params.project_id, "Project ID is required")?;
    validate_paging(params.page, params.per_page)?;

    let endpoint = project_endpoint(&params.project_id, "/merge_requests");
    let mut query = Query::from_serializable(&params.filters)?;
    query.push_opt("order_by", params.filters.sort.as_ref().and_then(wire_name));
    query.push_opt("sort", params.filters.order_by.as_ref().and_then(wire_name));
    query.push_opt("page", params.page);
    query.push_opt("per_page", params.per_page);

    client.get(&endpoint, &query).await
}

pub async fn create_merge_request(
    client: &GitLabClient,
    params: CreateMergeRequestParams,
) -> Result<MergeRequest> {
    require(&params.project_id, "Project ID is required")?;
    require(&params.title, "Merge request title is required")?;
    require(&params.source_branch, "Source branch is required")?;
    require(&params.target_branch, "Target branch is required")?;

    let endpoint = project_endpoint(&params.project_id, "/merge_requests");
    let body = NewMergeRequest {
        title: draft_title(params.title.trim(), params.draft.unwrap_or(false)),
        description: params.description.as_deref(),
        source_branch: params.source_branch.trim(),
        target_branch: params.target_branch.trim(),
        allow_collaboration: params.allow_collaboration,
    };
    client.post(&endpoint, Some(&body)).await
}

pub async fn update_merge_request(
    client: &GitLabClient,
    params: UpdateMergeRequestParams,
) -> Result<MergeRequest> {
    require(&params.project_id, "Project ID is required")?;
    let iid = require_id(params.merge_request_iid, "Valid merge request IID is required")?;

    let endpoint = project_endpoint(&params.project_id, &format!("/merge_requests/{iid}"));
    let body = MergeRequestChanges {
        title: params.title.as_deref(),
        description: params.description.as_deref(),
        state_event: params.state_event,
        target_branch: params.target_branch.as_deref(),
        labels: join_labels(&params.labels),
        assignee_ids: params.assignee_ids.as_deref(),
        milestone_id: params.milestone_id,
        remove_source_branch: params.remove_source_branch,
    };
    client.put(&endpoint, Some(&body)).await
}

pub async fn merge_merge_request(
    client: &GitLabClient,
    params: MergeMergeRequestParams,
) -> Result<MergeRequest> {
    require(&params.project_id, "Project ID is required")?;
    let iid = require_id(params.merge_request_iid, "Valid merge request IID is required")?;

    let endpoint = project_endpoint(
        &params.project_id,
        &format!("/merge_requests/{iid}/merge"),
    );
    client.put(&endpoint, Some(&params.options)).await
}

pub async fn add_merge_request_comment(
    client: &GitLabClient,
    params: AddMergeRequestCommentParams,
) -> Result<Comment> {
    require(&params.project_id, "Project ID is required")?;
    let iid = require_id(params.merge_request_iid, "Valid merge request IID is required")?;
    require(&params.body, "Comment body is required")?;

    let endpoint = project_endpoint(
        &params.project_id,
        &format!("/merge_requests/{iid}/notes"),
    );
    client
        .post(&endpoint, Some(&json!({ "body": params.body })))
        .await
}
