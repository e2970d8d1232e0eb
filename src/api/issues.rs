use super::{SortOrder, StateEvent, join_labels, project_endpoint, require, require_id, wire_name};
use crate::{
    client::{GitLabClient, Query},
    error::Result,
    markdown,
    models::{Comment, Issue},
    pagination::{fetch_all_pages, validate_paging},
};
use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_with::skip_serializing_none;

#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Opened,
    Closed,
    All,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IssueSort {
    CreatedAt,
    UpdatedAt,
    Priority,
    DueDate,
    RelativePosition,
    LabelPriority,
    MilestoneDue,
    Popularity,
    Weight,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct IssueFilters {
    #[schemars(description = "Filter issues by state")]
    pub state: Option<IssueState>,
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
    #[schemars(description = "Return issues created after date (ISO 8601)")]
    pub created_after: Option<String>,
    #[schemars(description = "Return issues created before date (ISO 8601)")]
    pub created_before: Option<String>,
    #[schemars(description = "Return issues updated after date (ISO 8601)")]
    pub updated_after: Option<String>,
    #[schemars(description = "Return issues updated before date (ISO 8601)")]
    pub updated_before: Option<String>,
    #[serde(skip_serializing)]
    #[schemars(description = "Sort issues")]
    pub sort: Option<IssueSort>,
    #[serde(skip_serializing)]
    #[schemars(description = "Sort order")]
    pub order_by: Option<SortOrder>,
    #[schemars(
        description = "If true, returns more details for each label. Default is false."
    )]
    pub with_labels_details: Option<bool>,
}

impl IssueFilters {
    fn to_query(&self) -> Result<Query> {
        let mut query = Query::from_serializable(self)?;
        // GitLab calls the sort key `order_by` and the direction `sort`.
        query.push_opt("order_by", self.sort.as_ref().and_then(wire_name));
        query.push_opt("sort", self.order_by.as_ref().and_then(wire_name));
        Ok(query)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListIssuesParams {
    #[schemars(description = "Project ID or URL-encoded path")]
    pub project_id: String,
    #[serde(flatten)]
    pub filters: IssueFilters,
    #[schemars(
        description = "Page number for pagination. ONLY specify this if you need a specific page - by default ALL issues are fetched automatically"
    )]
    pub page: Option<i64>,
    #[schemars(description = "Number of results per page (default: 20)")]
    pub per_page: Option<i64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchIssuesParams {
    #[schemars(description = "Project ID or URL-encoded path")]
    pub project_id: String,
    #[schemars(description = "Search term for title and description")]
    pub search: String,
    #[schemars(description = "Filter issues by state")]
    pub state: Option<IssueState>,
    #[schemars(description = "Comma-separated list of label names")]
    pub labels: Option<String>,
    #[schemars(
        description = "Page number for pagination. ONLY specify this if you need a specific page - by default ALL matching issues are fetched automatically"
    )]
    pub page: Option<i64>,
    #[schemars(description = "Number of results per page (default: 20)")]
    pub per_page: Option<i64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateIssueParams {
    #[schemars(description = "Project ID or URL-encoded path")]
    pub project_id: String,
    #[schemars(description = "Issue title")]
    pub title: String,
    #[schemars(description = "Issue description")]
    pub description: Option<String>,
    #[schemars(description = "Array of user IDs to assign")]
    pub assignee_ids: Option<Vec<u64>>,
    #[schemars(description = "Array of label names")]
    pub labels: Option<Vec<String>>,
    #[schemars(description = "Milestone ID to assign")]
    pub milestone_id: Option<u64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateIssueParams {
    #[schemars(description = "Project ID or URL-encoded path")]
    pub project_id: String,
    #[schemars(description = "Issue internal ID")]
    pub issue_iid: i64,
    #[schemars(description = "New issue title")]
    pub title: Option<String>,
    #[schemars(description = "New issue description")]
    pub description: Option<String>,
    #[schemars(description = "Change issue state")]
    pub state_event: Option<StateEvent>,
    #[schemars(description = "Array of label names")]
    pub labels: Option<Vec<String>>,
    #[schemars(description = "Array of user IDs to assign")]
    pub assignee_ids: Option<Vec<u64>>,
    #[schemars(description = "Milestone ID to assign")]
    pub milestone_id: Option<u64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddIssueCommentParams {
    #[schemars(description = "Project ID or URL-encoded path")]
    pub project_id: String,
    #[schemars(description = "Issue internal ID")]
    pub issue_iid: i64,
    #[schemars(description = "Content of the comment")]
    pub body: String,
}

#[skip_serializing_none]
#[derive(Serialize)]
struct IssueChanges<'a> {
    title: Option<&'a str>,
    description: Option<&'a str>,
    state_event: Option<StateEvent>,
    assignee_ids: Option<&'a [u64]>,
    milestone_id: Option<u64>,
    labels: Option<String>,
}

fn plain_description(mut issue: Issue) -> Issue {
    issue.description = issue
        .description
        .map(|description| markdown::to_plain_text(&description));
    issue
}

/// Lists issues. Without an explicit `page`, every page is fetched.
pub async fn list_issues(client: &GitLabClient, params: ListIssuesParams) -> Result<Vec<Issue>> {
    require(&params.project_id, "Project ID is required")?;

    let endpoint = project_endpoint(&params.project_id, "/issues");
    let mut query = params.filters.to_query()?;

    let issues: Vec<Issue> = match params.page {
        Some(page) => {
            validate_paging(Some(page), params.per_page)?;
            query.set("page", page);
            query.push_opt("per_page", params.per_page);
            client.get(&endpoint, &query).await?
        }
        None => fetch_all_pages(client, &endpoint, &query, params.per_page).await?,
    };

    Ok(issues.into_iter().map(plain_description).collect())
}

pub async fn search_issues(client: &GitLabClient, params: SearchIssuesParams) -> Result<Vec<Issue>> {
    require(&params.search, "Search term is required")?;

    let list = ListIssuesParams {
        project_id: params.project_id,
        filters: IssueFilters {
            search: Some(params.search.trim().to_string()),
            state: params.state,
            labels: params.labels,
            ..Default::default()
        },
        page: params.page,
        per_page: params.per_page,
    };
    list_issues(client, list).await
}

pub async fn create_issue(client: &GitLabClient, params: CreateIssueParams) -> Result<Issue> {
    require(&params.project_id, "Project ID is required")?;
    require(&params.title, "Issue title is required")?;

    let endpoint = project_endpoint(&params.project_id, "/issues");
    let body = IssueChanges {
        title: Some(params.title.trim()),
        description: params.description.as_deref(),
        state_event: None,
        assignee_ids: params.assignee_ids.as_deref(),
        milestone_id: params.milestone_id,
        labels: join_labels(&params.labels),
    };
    let issue: Issue = client.post(&endpoint, Some(&body)).await?;
    Ok(plain_description(issue))
}

pub async fn update_issue(client: &GitLabClient, params: UpdateIssueParams) -> Result<Issue> {
    require(&params.project_id, "Project ID is required")?;
    let iid = require_id(params.issue_iid, "Valid issue IID is required")?;

    let endpoint = project_endpoint(&params.project_id, &format!("/issues/{iid}"));
    let body = IssueChanges {
        title: params.title.as_deref(),
        description: params.description.as_deref(),
        state_event: params.state_event,
        assignee_ids: params.assignee_ids.as_deref(),
        milestone_id: params.milestone_id,
        labels: join_labels(&params.labels),
    };
    let issue: Issue = client.put(&endpoint, Some(&body)).await?;
    Ok(plain_description(issue))
}

pub async fn add_issue_comment(
    client: &GitLabClient,
    params: AddIssueCommentParams,
) -> Result<Comment> {
    require(&params.project_id, "Project ID is required")?;
    let iid = require_id(params.issue_iid, "Valid issue IID is required")?;
    require(&params.body, "Comment body is required")?;

    let endpoint = project_endpoint(&params.project_id, &format!("/issues/{iid}/notes"));
    client
        .post(&endpoint, Some(&json!({ "body": params.body })))
        .await
}
