use super::{branches::DEFAULT_REF, project_endpoint, require};
use crate::{
    client::{GitLabClient, Query, encode_segment},
    error::{GitLabError, Result},
    models::{Commit, Contents, FileCommit, FileContent},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetFileContentsParams {
    #[schemars(description = "Project ID or URL-encoded path")]
    pub project_id: String,
    #[schemars(description = "Path to the file or directory")]
    pub file_path: String,
    #[serde(rename = "ref")]
    #[schemars(description = "Branch/tag/commit to get contents from")]
    pub source_ref: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateOrUpdateFileParams {
    #[schemars(description = "Project ID or URL-encoded path")]
    pub project_id: String,
    #[schemars(description = "Path where to create/update the file")]
    pub file_path: String,
    #[schemars(description = "Content of the file")]
    pub content: String,
    #[schemars(description = "Commit message")]
    pub commit_message: String,
    #[schemars(description = "Branch to create/update the file in")]
    pub branch: String,
    #[schemars(description = "Path of the file to move/rename")]
    pub previous_path: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FileToPush {
    #[schemars(description = "Path where to create the file")]
    pub file_path: String,
    #[schemars(description = "Content of the file")]
    pub content: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PushFilesParams {
    #[schemars(description = "Project ID or URL-encoded path")]
    pub project_id: String,
    #[schemars(description = "Branch to push to")]
    pub branch: String,
    #[schemars(description = "Array of files to push")]
    pub files: Vec<FileToPush>,
    #[schemars(description = "Commit message")]
    pub commit_message: String,
}

#[skip_serializing_none]
#[derive(Serialize)]
struct FileChange<'a> {
    branch: &'a str,
    content: &'a str,
    commit_message: &'a str,
    previous_path: Option<&'a str>,
}

#[derive(Serialize)]
struct CommitAction<'a> {
    action: &'static str,
    file_path: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct NewCommit<'a> {
    branch: &'a str,
    commit_message: &'a str,
    actions: Vec<CommitAction<'a>>,
}

fn file_endpoint(project_id: &str, file_path: &str) -> String {
    project_endpoint(
        project_id,
        &format!("/repository/files/{}", encode_segment(file_path.trim())),
    )
}

/// Replaces base64 content with its text. Invalid UTF-8 is replaced lossily.
fn decode_content(mut file: FileContent) -> Result<FileContent> {
    if file.encoding.as_deref().is_some_and(|e| e != "base64") {
        return Ok(file);
    }
    let raw: String = file.content.split_whitespace().collect();
    let bytes = STANDARD
        .decode(raw.as_bytes())
        .map_err(|source| GitLabError::Decode {
            path: file.file_path.clone(),
            source,
        })?;
    file.content = String::from_utf8_lossy(&bytes).into_owned();
    file.encoding = None;
    Ok(file)
}

async fn fetch_contents(
    client: &GitLabClient,
    project_id: &str,
    file_path: &str,
    source_ref: &str,
) -> Result<Contents> {
    let mut query = Query::new();
    query.push("ref", source_ref);
    let contents: Contents = client
        .get(&file_endpoint(project_id, file_path), &query)
        .await?;
    match contents {
        Contents::File(file) => Ok(Contents::File(decode_content(file)?)),
        directory => Ok(directory),
    }
}

/// Returns a file with its content decoded, or the entries of a directory.
pub async fn get_file_contents(
    client: &GitLabClient,
    params: GetFileContentsParams,
) -> Result<Contents> {
    require(&params.project_id, "Project ID is required")?;
    require(&params.file_path, "File path is required")?;

    let source_ref = params
        .source_ref
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_REF);
    fetch_contents(client, &params.project_id, &params.file_path, source_ref).await
}

/// Updates the file when it already exists on `branch`, creates it otherwise.
pub async fn create_or_update_file(
    client: &GitLabClient,
    params: CreateOrUpdateFileParams,
) -> Result<FileCommit> {
    require(&params.project_id, "Project ID is required")?;
    require(&params.file_path, "File path is required")?;
    require(&params.content, "File content is required")?;
    require(&params.commit_message, "Commit message is required")?;
    require(&params.branch, "Branch is required")?;

    let exists = match fetch_contents(
        client,
        &params.project_id,
        &params.file_path,
        params.branch.trim(),
    )
    .await
    {
        Ok(_) => true,
        Err(e) if e.is_not_found() => false,
        Err(e) => return Err(e),
    };

    let endpoint = file_endpoint(&params.project_id, &params.file_path);
    let body = FileChange {
        branch: params.branch.trim(),
        content: &params.content,
        commit_message: &params.commit_message,
        previous_path: params
            .previous_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty()),
    };

    if exists {
        tracing::debug!("Updating existing file {}", params.file_path);
        client.put(&endpoint, Some(&body)).await
    } else {
        tracing::debug!("Creating new file {}", params.file_path);
        client.post(&endpoint, Some(&body)).await
    }
}

/// Creates all `files` on `branch` in a single commit.
pub async fn push_files(client: &GitLabClient, params: PushFilesParams) -> Result<Commit> {
    require(&params.project_id, "Project ID is required")?;
    require(&params.commit_message, "Commit message is required")?;
    require(&params.branch, "Branch is required")?;
    if params.files.is_empty() {
        return Err(GitLabError::validation(
            "At least one file action is required",
        ));
    }
    for file in &params.files {
        require(&file.file_path, "File path is required")?;
    }

    let endpoint = project_endpoint(&params.project_id, "/repository/commits");
    let body = NewCommit {
        branch: params.branch.trim(),
        commit_message: &params.commit_message,
        actions: params
            .files
            .iter()
            .map(|file| CommitAction {
                action: "create",
                file_path: file.file_path.trim(),
                content: &file.content,
            })
            .collect(),
    };
    client.post(&endpoint, Some(&body)).await
}
