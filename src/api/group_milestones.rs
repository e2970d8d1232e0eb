use super::{
    group_endpoint, require,
    milestones::{MilestoneChanges, MilestoneState, NewMilestone, require_milestone_id, require_title},
};
use crate::{
    client::{GitLabClient, Query},
    error::Result,
    models::{Deleted, GroupMilestone},
    pagination::validate_paging,
};
use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct GroupMilestoneFilters {
    #[schemars(description = "Return only active or closed milestones")]
    pub state: Option<MilestoneState>,
    #[schemars(description = "Return only milestones with the given title (case-sensitive)")]
    pub title: Option<String>,
    #[schemars(description = "Return only milestones with title or description matching the string")]
    pub search: Option<String>,
    #[schemars(description = "Return only milestones with title matching the string")]
    pub search_title: Option<String>,
    #[schemars(description = "Include milestones for all parent groups")]
    pub include_ancestors: Option<bool>,
    #[schemars(description = "Include milestones for group and its descendants")]
    pub include_descendants: Option<bool>,
    #[schemars(description = "Return only milestones updated before the given datetime (ISO 8601)")]
    pub updated_before: Option<String>,
    #[schemars(description = "Return only milestones updated after the given datetime (ISO 8601)")]
    pub updated_after: Option<String>,
    #[schemars(description = "Return only milestones containing the given date")]
    pub containing_date: Option<String>,
    #[schemars(description = "Return only milestones where due_date >= start_date")]
    pub start_date: Option<String>,
    #[schemars(description = "Return only milestones where start_date <= end_date")]
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListGroupMilestonesParams {
    #[schemars(description = "Group ID or URL-encoded path")]
    pub group_id: String,
    #[serde(flatten)]
    pub filters: GroupMilestoneFilters,
    #[schemars(description = "Page number for pagination (default: 1)")]
    pub page: Option<i64>,
    #[schemars(description = "Number of results per page (default: 20)")]
    pub per_page: Option<i64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateGroupMilestoneParams {
    #[schemars(description = "Group ID or URL-encoded path")]
    pub group_id: String,
    #[serde(flatten)]
    pub milestone: NewMilestone,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateGroupMilestoneParams {
    #[schemars(description = "Group ID or URL-encoded path")]
    pub group_id: String,
    #[schemars(description = "The ID of the group milestone")]
    pub milestone_id: i64,
    #[serde(flatten)]
    pub changes: MilestoneChanges,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteGroupMilestoneParams {
    #[schemars(description = "Group ID or URL-encoded path")]
    pub group_id: String,
    #[schemars(description = "The ID of the group milestone")]
    pub milestone_id: i64,
}

pub async fn list_group_milestones(
    client: &GitLabClient,
    params: ListGroupMilestonesParams,
) -> Result<Vec<GroupMilestone>> {
    require(&params.group_id, "Group ID is required")?;
    validate_paging(params.page, params.per_page)?;

    let mut query = Query::from_serializable(&params.filters)?;
    query.push_opt("page", params.page);
    query.push_opt("per_page", params.per_page);

    client
        .get(&group_endpoint(&params.group_id, "/milestones"), &query)
        .await
}

pub async fn create_group_milestone(
    client: &GitLabClient,
    params: CreateGroupMilestoneParams,
) -> Result<GroupMilestone> {
    require(&params.group_id, "Group ID is required")?;
    require_title(&params.milestone)?;

    let endpoint = group_endpoint(&params.group_id, "/milestones");
    client.post(&endpoint, Some(&params.milestone)).await
}

pub async fn update_group_milestone(
    client: &GitLabClient,
    params: UpdateGroupMilestoneParams,
) -> Result<GroupMilestone> {
    require(&params.group_id, "Group ID is required")?;
    let id = require_milestone_id(params.milestone_id)?;

    let endpoint = group_endpoint(&params.group_id, &format!("/milestones/{id}"));
    client.put(&endpoint, Some(&params.changes)).await
}

pub async fn delete_group_milestone(
    client: &GitLabClient,
    params: DeleteGroupMilestoneParams,
) -> Result<Deleted> {
    require(&params.group_id, "Group ID is required")?;
    let id = require_milestone_id(params.milestone_id)?;

    client
        .delete(&group_endpoint(&params.group_id, &format!("/milestones/{id}")))
        .await?;
    Ok(Deleted::OK)
}
