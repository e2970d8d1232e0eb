use super::{project_endpoint, require, require_id, wire_name};
use crate::{
    client::{GitLabClient, Query},
    error::Result,
    models::{Deleted, Milestone},
    pagination::apply_paging,
};
use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneState {
    Active,
    Closed,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneStateEvent {
    Close,
    Activate,
}

/// Fields of a new milestone. Shared by project and group milestones.
#[skip_serializing_none]
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct NewMilestone {
    #[schemars(description = "The title of the milestone")]
    pub title: String,
    #[schemars(description = "The description of the milestone")]
    pub description: Option<String>,
    #[schemars(description = "The due date of the milestone (YYYY-MM-DD)")]
    pub due_date: Option<String>,
    #[schemars(description = "The start date of the milestone (YYYY-MM-DD)")]
    pub start_date: Option<String>,
}

/// Changes to an existing milestone. Unset fields are left alone.
#[skip_serializing_none]
#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct MilestoneChanges {
    #[schemars(description = "The title of the milestone")]
    pub title: Option<String>,
    #[schemars(description = "The description of the milestone")]
    pub description: Option<String>,
    #[schemars(description = "The due date of the milestone (YYYY-MM-DD)")]
    pub due_date: Option<String>,
    #[schemars(description = "The start date of the milestone (YYYY-MM-DD)")]
    pub start_date: Option<String>,
    #[schemars(description = "The state event of the milestone")]
    pub state_event: Option<MilestoneStateEvent>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListMilestonesParams {
    #[schemars(description = "Project ID or URL-encoded path")]
    pub project_id: String,
    #[schemars(description = "Return only active or closed milestones")]
    pub state: Option<MilestoneState>,
    #[schemars(description = "Page number for pagination (default: 1)")]
    pub page: Option<i64>,
    #[schemars(description = "Number of results per page (default: 20)")]
    pub per_page: Option<i64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateMilestoneParams {
    #[schemars(description = "Project ID or URL-encoded path")]
    pub project_id: String,
    #[serde(flatten)]
    pub milestone: NewMilestone,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateMilestoneParams {
    #[schemars(description = "Project ID or URL-encoded path")]
    pub project_id: String,
    #[schemars(description = "The ID of the milestone")]
    pub milestone_id: i64,
    #[serde(flatten)]
    pub changes: MilestoneChanges,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteMilestoneParams {
    #[schemars(description = "Project ID or URL-encoded path")]
    pub project_id: String,
    #[schemars(description = "The ID of the milestone")]
    pub milestone_id: i64,
}

pub(crate) fn require_title(milestone: &NewMilestone) -> Result<()> {
    require(&milestone.title, "Milestone title is required")
}

pub(crate) fn require_milestone_id(milestone_id: i64) -> Result<u64> {
    require_id(milestone_id, "Valid milestone ID is required")
}

pub async fn list_milestones(
    client: &GitLabClient,
    params: ListMilestonesParams,
) -> Result<Vec<Milestone>> {
    require(&params.project_id, "Project ID is required")?;

    let mut query = Query::new();
    query.push_opt("state", params.state.as_ref().and_then(wire_name));
    apply_paging(&mut query, params.page, params.per_page)?;

    client
        .get(&project_endpoint(&params.project_id, "/milestones"), &query)
        .await
}

pub async fn create_milestone(
    client: &GitLabClient,
    params: CreateMilestoneParams,
) -> Result<Milestone> {
    require(&params.project_id, "Project ID is required")?;
    require_title(&params.milestone)?;

    let endpoint = project_endpoint(&params.project_id, "/milestones");
    client.post(&endpoint, Some(&params.milestone)).await
}

pub async fn update_milestone(
    client: &GitLabClient,
    params: UpdateMilestoneParams,
) -> Result<Milestone> {
    require(&params.project_id, "Project ID is required")?;
    let id = require_milestone_id(params.milestone_id)?;

    let endpoint = project_endpoint(&params.project_id, &format!("/milestones/{id}"));
    client.put(&endpoint, Some(&params.changes)).await
}

pub async fn delete_milestone(
    client: &GitLabClient,
    params: DeleteMilestoneParams,
) -> Result<Deleted> {
    require(&params.project_id, "Project ID is required")?;
    let id = require_milestone_id(params.milestone_id)?;

    client
        .delete(&project_endpoint(&params.project_id, &format!("/milestones/{id}")))
        .await?;
    Ok(Deleted::OK)
}
