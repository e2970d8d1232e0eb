use super::{require, search_response};
use crate::{
    client::{GitLabClient, Query},
    error::Result,
    models::{Group, SearchResponse},
    pagination::apply_paging,
};
use rmcp::schemars::{self, JsonSchema};
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchGroupsParams {
    #[schemars(description = "Search query for groups")]
    pub search: String,
    #[schemars(description = "Page number for pagination (default: 1)")]
    pub page: Option<i64>,
    #[schemars(description = "Number of results per page (default: 20)")]
    pub per_page: Option<i64>,
    #[schemars(description = "Limit by groups owned by the current user")]
    pub owned: Option<bool>,
    #[schemars(
        description = "Limit by minimum access level (10=Guest, 20=Reporter, 30=Developer, 40=Maintainer, 50=Owner)"
    )]
    pub min_access_level: Option<u32>,
}

pub async fn search_groups(
    client: &GitLabClient,
    params: SearchGroupsParams,
) -> Result<SearchResponse<Group>> {
    require(&params.search, "Search query is required")?;

    let mut query = Query::new();
    query.push("search", params.search.trim());
    apply_paging(&mut query, params.page, params.per_page)?;
    query.push_opt("owned", params.owned);
    query.push_opt("min_access_level", params.min_access_level);

    let (items, headers) = client.get_with_headers("/groups", &query).await?;
    Ok(search_response(items, &headers))
}
