use super::{project_endpoint, require, search_response};
use crate::{
    client::{GitLabClient, Query},
    error::Result,
    models::{Fork, Repository, SearchResponse},
    pagination::apply_paging,
};
use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_with::skip_serializing_none;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchRepositoriesParams {
    #[schemars(description = "Search query")]
    pub search: String,
    #[schemars(description = "Page number for pagination (default: 1)")]
    pub page: Option<i64>,
    #[schemars(description = "Number of results per page (default: 20)")]
    pub per_page: Option<i64>,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Internal,
    Public,
}

#[skip_serializing_none]
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CreateRepositoryParams {
    #[schemars(description = "Repository name")]
    pub name: String,
    #[schemars(description = "Repository description")]
    pub description: Option<String>,
    #[schemars(description = "Repository visibility level")]
    pub visibility: Option<Visibility>,
    #[schemars(description = "Initialize with README.md")]
    pub initialize_with_readme: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ForkRepositoryParams {
    #[schemars(description = "Project ID or URL-encoded path")]
    pub project_id: String,
    #[schemars(description = "Namespace to fork to (full path)")]
    pub namespace: Option<String>,
}

pub async fn search_repositories(
    client: &GitLabClient,
    params: SearchRepositoriesParams,
) -> Result<SearchResponse<Repository>> {
    require(&params.search, "Search query is required")?;

    let mut query = Query::new();
    query.push("search", params.search.trim());
    apply_paging(&mut query, params.page, params.per_page)?;

    let (items, headers) = client.get_with_headers("/projects", &query).await?;
    Ok(search_response(items, &headers))
}

pub async fn create_repository(
    client: &GitLabClient,
    params: CreateRepositoryParams,
) -> Result<Repository> {
    require(&params.name, "Repository name is required")?;
    client.post("/projects", Some(&params)).await
}

pub async fn fork_repository(client: &GitLabClient, params: ForkRepositoryParams) -> Result<Fork> {
    require(&params.project_id, "Project ID is required")?;

    let endpoint = project_endpoint(&params.project_id, "/fork");
    let body = params
        .namespace
        .as_deref()
        .map(str::trim)
        .filter(|ns| !ns.is_empty())
        .map(|namespace| json!({ "namespace": namespace }));
    client.post(&endpoint, body.as_ref()).await
}
