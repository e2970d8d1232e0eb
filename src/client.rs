use crate::{
    auth::{AuthConfig, Authenticator},
    config::{Config, MISSING_TOKEN_MESSAGE},
    error::{GitLabError, Result},
};
use anyhow::{Context, anyhow};
use reqwest::{Method, RequestBuilder, Response, header::HeaderMap};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::time::Duration;
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Percent-encodes a project id, group id, file path or label name for use
/// as a single path segment (`group/project` becomes `group%2Fproject`).
pub fn encode_segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Ordered query parameters. Unset values are skipped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query(Vec<(String, String)>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flattens a struct of filters into parameters. `None` fields are skipped.
    pub fn from_serializable<T: Serialize>(value: &T) -> Result<Self> {
        let mut query = Self::new();
        if let Value::Object(map) = serde_json::to_value(value).map_err(GitLabError::Serialize)? {
            for (key, value) in map {
                match value {
                    Value::Null => {}
                    Value::String(s) => query.push(key, s),
                    Value::Array(items) => {
                        let joined: Vec<String> = items.iter().map(scalar_text).collect();
                        query.push(key, joined.join(","));
                    }
                    other => query.push(key, scalar_text(&other)),
                }
            }
        }
        Ok(query)
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl ToString) {
        self.0.push((key.into(), value.to_string()));
    }

    pub fn push_opt<V: ToString>(&mut self, key: impl Into<String>, value: Option<V>) {
        if let Some(value) = value {
            self.push(key, value);
        }
    }

    /// Replaces any existing value for `key`.
    pub fn set(&mut self, key: &str, value: impl ToString) {
        self.0.retain(|(k, _)| k != key);
        self.push(key, value);
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A thin wrapper around the GitLab REST API v4.
#[derive(Clone, Debug)]
pub struct GitLabClient {
    http: reqwest::Client,
    base_url: String,
    auth: AuthConfig,
}

impl GitLabClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let auth = config
            .auth
            .clone()
            .ok_or_else(|| anyhow!(MISSING_TOKEN_MESSAGE))?;

        let base_url = Url::parse(&config.api_url)
            .with_context(|| format!("Invalid GitLab API URL {}", config.api_url))?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .user_agent(config.user_agent.as_deref().unwrap_or(USER_AGENT))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            auth,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        tracing::debug!("{method} {endpoint}");
        self.http
            .request(method, format!("{}{endpoint}", self.base_url))
            .add_auth(&self.auth)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = GitLabError::from_response(status, &body);
        tracing::debug!("{error}");
        Err(error)
    }

    async fn parse<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| GitLabError::Parse {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str, query: &Query) -> Result<T> {
        let (value, _) = self.get_with_headers(endpoint, query).await?;
        Ok(value)
    }

    /// Like [`GitLabClient::get`] but also returns the response headers,
    /// which carry pagination and totals.
    pub async fn get_with_headers<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &Query,
    ) -> Result<(T, HeaderMap)> {
        let mut request = self.request(Method::GET, endpoint);
        if !query.is_empty() {
            request = request.query(query.pairs());
        }
        let response = self.send(request).await?;
        let headers = response.headers().clone();
        let value = Self::parse(endpoint, response).await?;
        Ok((value, headers))
    }

    pub async fn post<B, T>(&self, endpoint: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::POST, endpoint, body).await
    }

    pub async fn put<B, T>(&self, endpoint: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PUT, endpoint, body).await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<()> {
        self.send(self.request(Method::DELETE, endpoint)).await?;
        Ok(())
    }

    async fn send_json<B, T>(&self, method: Method, endpoint: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.request(method, endpoint);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = self.send(request).await?;
        Self::parse(endpoint, response).await
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, header, method, path, query_param},
    };

    #[derive(Debug, Deserialize)]
    struct Thing {
        id: u64,
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("group/project"), "group%2Fproject");
        assert_eq!(encode_segment("src/main.rs"), "src%2Fmain.rs");
        assert_eq!(encode_segment("needs review"), "needs%20review");
        assert_eq!(encode_segment("123"), "123");
    }

    #[test]
    fn test_query_from_serializable() {
        #[derive(Serialize)]
        struct Filters {
            state: Option<&'static str>,
            labels: Option<Vec<&'static str>>,
            author_id: Option<u64>,
            confidential: Option<bool>,
            search: Option<String>,
        }

        let query = Query::from_serializable(&Filters {
            state: Some("opened"),
            labels: Some(vec!["bug", "ui"]),
            author_id: Some(7),
            confidential: Some(false),
            search: None,
        })
        .unwrap();

        assert_eq!(query.get("state"), Some("opened"));
        assert_eq!(query.get("labels"), Some("bug,ui"));
        assert_eq!(query.get("author_id"), Some("7"));
        assert_eq!(query.get("confidential"), Some("false"));
        assert_eq!(query.get("search"), None);
    }

    #[test]
    fn test_query_set_replaces() {
        let mut query = Query::new();
        query.push("page", 1);
        query.push_opt("per_page", None::<u32>);
        query.set("page", 3);
        assert_eq!(query.pairs(), &[("page".to_string(), "3".to_string())]);
    }

    #[test]
    fn test_new_requires_token() {
        let config = Config::default();
        let err = GitLabClient::new(&config).unwrap_err();
        assert_eq!(err.to_string(), MISSING_TOKEN_MESSAGE);
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let config = Config {
            api_url: "https://gitlab.example.com/api/v4/".to_string(),
            auth: Some(AuthConfig::Bearer {
                token: "t".to_string(),
            }),
            ..Default::default()
        };
        let client = GitLabClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "https://gitlab.example.com/api/v4");
    }

    #[tokio::test]
    async fn test_get_sends_auth_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects"))
            .and(query_param("search", "mcp"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}, {"id": 2}])))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let mut query = Query::new();
        query.push("search", "mcp");
        let things: Vec<Thing> = client.get("/projects", &query).await.unwrap();
        assert_eq!(things.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_encoded_path_reaches_server_unchanged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/group%2Fproject"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 9})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let endpoint = format!("/projects/{}", encode_segment("group/project"));
        let thing: Thing = client.get(&endpoint, &Query::new()).await.unwrap();
        assert_eq!(thing.id, 9);
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v4/projects/1/labels"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"name": "bug", "color": "#ff0000"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 5})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let thing: Thing = client
            .post(
                "/projects/1/labels",
                Some(&json!({"name": "bug", "color": "#ff0000"})),
            )
            .await
            .unwrap();
        assert_eq!(thing.id, 5);
    }

    #[tokio::test]
    async fn test_error_status_becomes_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/404"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"message": "404 Project Not Found"})),
            )
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .get::<Thing>("/projects/404", &Query::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "GitLab API error: 404 Not Found: 404 Project Not Found"
        );
    }

    #[tokio::test]
    async fn test_malformed_response_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/v4/projects/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"invalid": "data"})))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .put::<Value, Thing>("/projects/1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, GitLabError::Parse { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn test_delete_ignores_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v4/projects/1/labels/bug"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        client.delete("/projects/1/labels/bug").await.unwrap();
    }
}
