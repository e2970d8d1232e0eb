//! One module per GitLab resource. Every operation validates its arguments
//! before touching the network and returns typed models.

pub mod branches;
pub mod files;
pub mod group_milestones;
pub mod groups;
pub mod issues;
pub mod labels;
pub mod merge_requests;
pub mod milestones;
pub mod projects;

use crate::{
    client::encode_segment,
    error::{GitLabError, Result},
    models::SearchResponse,
    pagination::PageInfo,
};
use reqwest::header::HeaderMap;
use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// State transition for issues and merge requests.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StateEvent {
    Close,
    Reopen,
}

/// Fails with `message` when `value` is empty or whitespace.
pub(crate) fn require(value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(GitLabError::validation(message));
    }
    Ok(())
}

/// Fails with `message` unless `value` is a positive id.
pub(crate) fn require_id(value: i64, message: &str) -> Result<u64> {
    u64::try_from(value)
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| GitLabError::validation(message))
}

pub(crate) fn project_endpoint(project_id: &str, rest: &str) -> String {
    format!("/projects/{}{rest}", encode_segment(project_id.trim()))
}

pub(crate) fn group_endpoint(group_id: &str, rest: &str) -> String {
    format!("/groups/{}{rest}", encode_segment(group_id.trim()))
}

/// The value GitLab expects on the wire for a serde enum.
pub(crate) fn wire_name<T: Serialize>(value: &T) -> Option<String> {
    match serde_json::to_value(value).ok()? {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    }
}

/// `count` comes from `x-total` when GitLab reports it.
pub(crate) fn search_response<T>(items: Vec<T>, headers: &HeaderMap) -> SearchResponse<T> {
    let count = PageInfo::from_headers(headers)
        .total
        .unwrap_or(items.len() as u64);
    SearchResponse { count, items }
}

pub(crate) fn join_labels(labels: &Option<Vec<String>>) -> Option<String> {
    labels.as_ref().map(|labels| labels.join(","))
}
