//! The tool catalogue and the `tools/call` dispatcher.
//!
//! Every tool is declared once in `gitlab_tools!`: its name, description,
//! argument type and the API operation it runs. The input schema of each tool
//! is generated from its argument type.

use crate::{api, client::GitLabClient};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content, ErrorCode, JsonObject, Tool},
    schemars::{JsonSchema, schema_for},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::sync::Arc;

fn input_schema<T: JsonSchema>() -> Arc<JsonObject> {
    let schema = match serde_json::to_value(schema_for!(T)) {
        Ok(Value::Object(map)) => map,
        _ => JsonObject::default(),
    };
    Arc::new(schema)
}

fn parse_arguments<T: DeserializeOwned>(arguments: JsonObject) -> Result<T, McpError> {
    serde_json::from_value(Value::Object(arguments))
        .map_err(|e| McpError::invalid_params(format!("Invalid arguments: {e}"), None))
}

fn respond<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| {
        McpError::internal_error(format!("Failed to serialize result: {e}"), None)
    })?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

macro_rules! gitlab_tools {
    ($($name:literal => $module:ident::$operation:ident($params:ty): $description:literal;)*) => {
        /// Names of every tool, in catalogue order.
        pub const TOOL_NAMES: &[&str] = &[$($name),*];

        pub fn tool_definitions() -> Vec<Tool> {
            vec![$(Tool::new($name, $description, input_schema::<$params>())),*]
        }

        /// Runs the tool called `name` against GitLab and returns its result
        /// as pretty-printed JSON text.
        pub async fn call_tool(
            client: &GitLabClient,
            name: &str,
            arguments: Option<JsonObject>,
        ) -> Result<CallToolResult, McpError> {
            let Some(arguments) = arguments else {
                return Err(McpError::invalid_params("Arguments are required", None));
            };

            match name {
                $($name => {
                    let params: $params = parse_arguments(arguments)?;
                    respond(&api::$module::$operation(client, params).await?)
                })*
                _ => Err(McpError::new(
                    ErrorCode::METHOD_NOT_FOUND,
                    format!("Unknown tool: {name}"),
                    None,
                )),
            }
        }
    };
}

gitlab_tools! {
    "create_or_update_file" => files::create_or_update_file(api::files::CreateOrUpdateFileParams):
        "Create or update a single file in a GitLab project";
    "search_repositories" => projects::search_repositories(api::projects::SearchRepositoriesParams):
        "Search for GitLab projects";
    "search_groups" => groups::search_groups(api::groups::SearchGroupsParams):
        "Search for GitLab groups";
    "create_repository" => projects::create_repository(api::projects::CreateRepositoryParams):
        "Create a new GitLab project";
    "get_file_contents" => files::get_file_contents(api::files::GetFileContentsParams):
        "Get the contents of a file or directory from a GitLab project";
    "push_files" => files::push_files(api::files::PushFilesParams):
        "Push multiple files to a GitLab project in a single commit";
    "create_issue" => issues::create_issue(api::issues::CreateIssueParams):
        "Create a new issue in a GitLab project";
    "create_merge_request" => merge_requests::create_merge_request(api::merge_requests::CreateMergeRequestParams):
        "Create a new merge request in a GitLab project";
    "fork_repository" => projects::fork_repository(api::projects::ForkRepositoryParams):
        "Fork a GitLab project to your account or specified namespace";
    "create_branch" => branches::create_branch(api::branches::CreateBranchParams):
        "Create a new branch in a GitLab project";
    "list_labels" => labels::list_labels(api::labels::ListLabelsParams):
        "List all labels in a GitLab project";
    "create_label" => labels::create_label(api::labels::CreateLabelParams):
        "Create a new label in a GitLab project";
    "update_label" => labels::update_label(api::labels::UpdateLabelParams):
        "Update an existing label in a GitLab project";
    "delete_label" => labels::delete_label(api::labels::DeleteLabelParams):
        "Delete a label from a GitLab project";
    "list_milestones" => milestones::list_milestones(api::milestones::ListMilestonesParams):
        "List all milestones in a GitLab project";
    "create_milestone" => milestones::create_milestone(api::milestones::CreateMilestoneParams):
        "Create a new milestone in a GitLab project";
    "update_milestone" => milestones::update_milestone(api::milestones::UpdateMilestoneParams):
        "Update an existing milestone in a GitLab project";
    "delete_milestone" => milestones::delete_milestone(api::milestones::DeleteMilestoneParams):
        "Delete a milestone from a GitLab project";
    "list_group_milestones" => group_milestones::list_group_milestones(api::group_milestones::ListGroupMilestonesParams):
        "List all milestones in a GitLab group";
    "create_group_milestone" => group_milestones::create_group_milestone(api::group_milestones::CreateGroupMilestoneParams):
        "Create a new milestone in a GitLab group";
    "update_group_milestone" => group_milestones::update_group_milestone(api::group_milestones::UpdateGroupMilestoneParams):
        "Update an existing milestone in a GitLab group";
    "delete_group_milestone" => group_milestones::delete_group_milestone(api::group_milestones::DeleteGroupMilestoneParams):
        "Delete a milestone from a GitLab group";
    "list_issues" => issues::list_issues(api::issues::ListIssuesParams):
        "List all issues in a GitLab project";
    "update_issue" => issues::update_issue(api::issues::UpdateIssueParams):
        "Update an existing issue in a GitLab project";
    "search_issues" => issues::search_issues(api::issues::SearchIssuesParams):
        "Search for issues in a GitLab project";
    "add_issue_comment" => issues::add_issue_comment(api::issues::AddIssueCommentParams):
        "Add a comment to an issue in a GitLab project";
    "list_merge_requests" => merge_requests::list_merge_requests(api::merge_requests::ListMergeRequestsParams):
        "List all merge requests in a GitLab project";
    "update_merge_request" => merge_requests::update_merge_request(api::merge_requests::UpdateMergeRequestParams):
        "Update an existing merge request in a GitLab project";
    "merge_merge_request" => merge_requests::merge_merge_request(api::merge_requests::MergeMergeRequestParams):
        "Merge a merge request in a GitLab project";
    "add_merge_request_comment" => merge_requests::add_merge_request_comment(api::merge_requests::AddMergeRequestCommentParams):
        "Add a comment to a merge request in a GitLab project";
}
