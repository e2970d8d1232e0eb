use super::{project_endpoint, require};
use crate::{
    client::{GitLabClient, Query, encode_segment},
    error::Result,
    models::{Deleted, Label},
    pagination::apply_paging,
};
use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListLabelsParams {
    #[schemars(description = "Project ID or URL-encoded path")]
    pub project_id: String,
    #[schemars(description = "Page number for pagination (default: 1)")]
    pub page: Option<i64>,
    #[schemars(description = "Number of results per page (default: 20)")]
    pub per_page: Option<i64>,
}

#[skip_serializing_none]
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CreateLabelParams {
    #[serde(skip_serializing)]
    #[schemars(description = "Project ID or URL-encoded path")]
    pub project_id: String,
    #[schemars(description = "Name of the label")]
    pub name: String,
    #[schemars(description = "Color of the label in 6-digit hex notation with leading '#'")]
    pub color: String,
    #[schemars(description = "Description of the label")]
    pub description: Option<String>,
    #[schemars(description = "Priority of the label")]
    pub priority: Option<i64>,
}

#[skip_serializing_none]
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct UpdateLabelParams {
    #[serde(skip_serializing)]
    #[schemars(description = "Project ID or URL-encoded path")]
    pub project_id: String,
    #[serde(skip_serializing)]
    #[schemars(description = "Current name of the label")]
    pub name: String,
    #[schemars(description = "New name for the label")]
    pub new_name: Option<String>,
    #[schemars(description = "New color of the label")]
    pub color: Option<String>,
    #[schemars(description = "New description of the label")]
    pub description: Option<String>,
    #[schemars(description = "New priority of the label")]
    pub priority: Option<i64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteLabelParams {
    #[schemars(description = "Project ID or URL-encoded path")]
    pub project_id: String,
    #[schemars(description = "Name of the label to delete")]
    pub name: String,
}

fn label_endpoint(project_id: &str, name: &str) -> String {
    project_endpoint(project_id, &format!("/labels/{}", encode_segment(name)))
}

pub async fn list_labels(client: &GitLabClient, params: ListLabelsParams) -> Result<Vec<Label>> {
    require(&params.project_id, "Project ID is required")?;

    let mut query = Query::new();
    apply_paging(&mut query, params.page, params.per_page)?;
    client
        .get(&project_endpoint(&params.project_id, "/labels"), &query)
        .await
}

pub async fn create_label(client: &GitLabClient, params: CreateLabelParams) -> Result<Label> {
    require(&params.project_id, "Project ID is required")?;
    require(&params.name, "Label name is required")?;
    require(&params.color, "Label color is required")?;

    let endpoint = project_endpoint(&params.project_id, "/labels");
    client.post(&endpoint, Some(&params)).await
}

/// Labels are addressed by their current name.
pub async fn update_label(client: &GitLabClient, params: UpdateLabelParams) -> Result<Label> {
    require(&params.project_id, "Project ID is required")?;
    require(&params.name, "Label name is required")?;

    let endpoint = label_endpoint(&params.project_id, &params.name);
    client.put(&endpoint, Some(&params)).await
}

pub async fn delete_label(client: &GitLabClient, params: DeleteLabelParams) -> Result<Deleted> {
    require(&params.project_id, "Project ID is required")?;
    require(&params.name, "Label name is required")?;

    client
        .delete(&label_endpoint(&params.project_id, &params.name))
        .await?;
    Ok(Deleted::OK)
}
