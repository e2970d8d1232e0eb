//! GitLab response shapes.
//!
//! Only the fields callers rely on are typed. Everything else GitLab sends is
//! kept in `extra` and serialized back out unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Extra = Map<String, Value>;

/// Declares a pass-through resource that only requires a numeric `id`.
macro_rules! resource {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
        pub struct $name {
            pub id: u64,
            #[serde(flatten)]
            pub extra: Extra,
        }
    };
}

resource!(
    /// A project.
    Repository
);
resource!(Group);
resource!(Label);
resource!(Milestone);
resource!(GroupMilestone);
resource!(MergeRequest);
resource!(
    /// A note on an issue or merge request.
    Comment
);

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Issue {
    pub id: u64,
    // Present on every issue, but may be null.
    #[serde(deserialize_with = "Option::deserialize")]
    pub description: Option<String>,
    #[serde(default)]
    pub labels: Vec<Value>,
    #[serde(default)]
    pub milestone: Option<Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ForkOwner {
    pub username: String,
    pub id: u64,
    pub avatar_url: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ForkedFromProject {
    pub name: String,
    pub path_with_namespace: String,
    pub web_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<ForkOwner>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Fork {
    pub id: u64,
    pub forked_from_project: ForkedFromProject,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct FileContent {
    pub file_name: String,
    pub file_path: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// One entry of a repository tree listing.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct TreeEntry {
    pub name: String,
    pub path: String,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A single file, or the entries of a directory.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Contents {
    File(FileContent),
    Directory(Vec<TreeEntry>),
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct FileCommit {
    pub file_path: String,
    pub branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Commit {
    pub id: String,
    pub short_id: String,
    pub title: String,
    pub author_name: String,
    pub author_email: String,
    pub authored_date: String,
    pub committer_name: String,
    pub committer_email: String,
    pub committed_date: String,
    pub web_url: String,
    pub parent_ids: Vec<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct CommitRef {
    pub id: String,
    pub web_url: String,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A branch as returned when it is created.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Reference {
    pub name: String,
    pub commit: CommitRef,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SearchResponse<T> {
    pub count: u64,
    pub items: Vec<T>,
}

/// Result of a delete.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Deleted {
    pub success: bool,
}

impl Deleted {
    pub const OK: Deleted = Deleted { success: true };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_keeps_unknown_fields() {
        let repo: Repository = serde_json::from_value(json!({
            "id": 42,
            "name": "demo",
            "namespace": {"full_path": "group"}
        }))
        .unwrap();
        assert_eq!(repo.id, 42);
        assert_eq!(repo.extra["name"], "demo");

        let out = serde_json::to_value(&repo).unwrap();
        assert_eq!(out["namespace"]["full_path"], "group");
        assert_eq!(out["id"], 42);
    }

    #[test]
    fn test_resource_requires_id() {
        assert!(serde_json::from_value::<Label>(json!({"name": "bug"})).is_err());
        assert!(serde_json::from_value::<MergeRequest>(json!({"id": "abc"})).is_err());
    }

    #[test]
    fn test_issue_optional_fields_degrade() {
        let issue: Issue = serde_json::from_value(json!({
            "id": 1,
            "iid": 3,
            "description": null,
            "title": "Broken"
        }))
        .unwrap();
        assert_eq!(issue.description, None);
        assert!(issue.labels.is_empty());
        assert_eq!(issue.milestone, None);
        assert_eq!(issue.extra["title"], "Broken");
    }

    #[test]
    fn test_issue_requires_description_field() {
        let missing = serde_json::from_value::<Issue>(json!({"id": 1, "title": "Broken"}));
        assert!(missing.unwrap_err().to_string().contains("description"));
    }

    #[test]
    fn test_contents_file_or_directory() {
        let file: Contents = serde_json::from_value(json!({
            "file_name": "README.md",
            "file_path": "README.md",
            "content": "aGk=",
            "encoding": "base64",
            "ref": "main"
        }))
        .unwrap();
        assert!(matches!(file, Contents::File(ref f) if f.content == "aGk="));

        let dir: Contents = serde_json::from_value(json!([
            {"name": "src", "path": "src", "type": "tree"},
            {"name": "README.md", "path": "README.md", "type": "blob"}
        ]))
        .unwrap();
        assert!(matches!(dir, Contents::Directory(ref entries) if entries.len() == 2));

        assert!(serde_json::from_value::<Contents>(json!({"invalid": "data"})).is_err());
    }

    #[test]
    fn test_commit_requires_all_fields() {
        let commit = json!({
            "id": "abc123",
            "short_id": "abc",
            "title": "Add files",
            "author_name": "Dev",
            "author_email": "dev@example.com",
            "authored_date": "2024-01-01T00:00:00Z",
            "committer_name": "Dev",
            "committer_email": "dev@example.com",
            "committed_date": "2024-01-01T00:00:00Z",
            "web_url": "https://gitlab.com/g/p/-/commit/abc123",
            "parent_ids": ["def456"]
        });
        assert!(serde_json::from_value::<Commit>(commit.clone()).is_ok());

        let mut partial = commit;
        partial.as_object_mut().unwrap().remove("web_url");
        assert!(serde_json::from_value::<Commit>(partial).is_err());
    }

    #[test]
    fn test_fork_owner_is_optional() {
        let fork: Fork = serde_json::from_value(json!({
            "id": 7,
            "forked_from_project": {
                "name": "upstream",
                "path_with_namespace": "group/upstream",
                "web_url": "https://gitlab.com/group/upstream"
            }
        }))
        .unwrap();
        assert!(fork.forked_from_project.owner.is_none());
        assert!(serde_json::from_value::<Fork>(json!({"id": 7})).is_err());
    }

    #[test]
    fn test_deleted_serializes_success() {
        assert_eq!(serde_json::to_value(Deleted::OK).unwrap(), json!({"success": true}));
    }
}
