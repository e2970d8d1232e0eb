use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const PRIVATE_TOKEN_HEADER: &str = "PRIVATE-TOKEN";

/// How requests authenticate against GitLab.
#[derive(Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AuthConfig {
    /// `Authorization: Bearer <token>`. Works for personal, project and OAuth tokens.
    Bearer { token: String },
    /// The `PRIVATE-TOKEN` header.
    PrivateToken { token: String },
}

impl AuthConfig {
    pub fn token(&self) -> &str {
        match self {
            AuthConfig::Bearer { token } | AuthConfig::PrivateToken { token } => token,
        }
    }
}

// Tokens never reach the logs.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthConfig::Bearer { .. } => f.debug_struct("Bearer").field("token", &"***").finish(),
            AuthConfig::PrivateToken { .. } => f
                .debug_struct("PrivateToken")
                .field("token", &"***")
                .finish(),
        }
    }
}

pub trait Authenticator {
    /// Adds the authentication header for `auth` to the request.
    fn add_auth(self, auth: &AuthConfig) -> RequestBuilder;
}

impl Authenticator for RequestBuilder {
    fn add_auth(self, auth: &AuthConfig) -> RequestBuilder {
        match auth {
            AuthConfig::Bearer { token } => self.bearer_auth(token),
            AuthConfig::PrivateToken { token } => self.header(PRIVATE_TOKEN_HEADER, token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::{Client, header::AUTHORIZATION};

    #[test]
    fn test_add_auth_bearer() {
        let request = Client::new()
            .get("https://gitlab.example.com/api/v4/projects")
            .add_auth(&AuthConfig::Bearer {
                token: "glpat-123".to_string(),
            })
            .build()
            .unwrap();

        assert_eq!(
            request.headers().get(AUTHORIZATION).unwrap(),
            "Bearer glpat-123"
        );
        assert!(request.headers().get(PRIVATE_TOKEN_HEADER).is_none());
    }

    #[test]
    fn test_add_auth_private_token() {
        let request = Client::new()
            .get("https://gitlab.example.com/api/v4/projects")
            .add_auth(&AuthConfig::PrivateToken {
                token: "glpat-456".to_string(),
            })
            .build()
            .unwrap();

        assert_eq!(
            request.headers().get(PRIVATE_TOKEN_HEADER).unwrap(),
            "glpat-456"
        );
        assert!(request.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_auth_config_deserialize() {
        let auth: AuthConfig = serde_yaml::from_str("type: private-token\ntoken: abc").unwrap();
        assert_eq!(
            auth,
            AuthConfig::PrivateToken {
                token: "abc".to_string()
            }
        );

        let auth: AuthConfig = serde_json::from_str(r#"{"type":"bearer","token":"xyz"}"#).unwrap();
        assert_eq!(auth.token(), "xyz");
    }

    #[test]
    fn test_auth_config_debug_hides_token() {
        let auth = AuthConfig::Bearer {
            token: "super-secret".to_string(),
        };
        let printed = format!("{auth:?}");
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("Bearer"));
    }
}
