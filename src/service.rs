use crate::{
    client::GitLabClient,
    config::{Config, SkipTools},
    tools,
};
use anyhow::Result;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    model::*,
    service::{NotificationContext, RequestContext, RoleServer},
};
use std::{ops::Deref, sync::Arc};

pub struct GitLabServiceInner {
    client: GitLabClient,
    skip_tools: Option<SkipTools>,
}

impl GitLabServiceInner {
    fn is_skipped(&self, tool_name: &str) -> bool {
        self.skip_tools
            .as_ref()
            .is_some_and(|skip_tools| skip_tools.is_match(tool_name))
    }
}

/// MCP server exposing GitLab operations as tools. Cheap to clone; every
/// transport session shares the same HTTP client.
pub struct GitLabService(Arc<GitLabServiceInner>);

impl Clone for GitLabService {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl Deref for GitLabService {
    type Target = Arc<GitLabServiceInner>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl GitLabService {
    pub fn new(config: &Config) -> Result<Self> {
        let client = GitLabClient::new(config)?;
        tracing::info!(
            "Serving {} tools against {}",
            tools::TOOL_NAMES.len(),
            client.base_url()
        );
        if let Some(skip_tools) = &config.skip_tools {
            tracing::info!("Skipping tools matching {:?}", skip_tools.patterns());
        }
        Ok(Self(Arc::new(GitLabServiceInner {
            client,
            skip_tools: config.skip_tools.clone(),
        })))
    }
}

impl ServerHandler for GitLabService {
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!("got tools/call request for {}", request.name);
        let tool_name = &*request.name;
        if self.is_skipped(tool_name) {
            tracing::warn!("Tool {tool_name} in skip_tools");
            return Err(McpError::method_not_found::<CallToolRequestMethod>());
        }

        tools::call_tool(&self.client, tool_name, request.arguments)
            .await
            .inspect_err(|e| tracing::warn!("Tool {tool_name} failed: {}", e.message))
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "gitlab-mcp".to_string(),
                title: Some("GitLab MCP".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Tools for GitLab projects, files, branches, issues, merge requests, labels and milestones."
                    .to_string(),
            ),

            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        tracing::info!("got tools/list request {:?}", request);
        let mut list_tools_result = ListToolsResult::default();

        for tool in tools::tool_definitions() {
            if self.is_skipped(&tool.name) {
                tracing::info!("Skipping tool {} as requested in skip_tools", tool.name);
                continue;
            }
            list_tools_result.tools.push(tool);
        }

        Ok(list_tools_result)
    }

    fn on_initialized(
        &self,
        _context: NotificationContext<RoleServer>,
    ) -> impl Future<Output = ()> + Send + '_ {
        tracing::info!("client initialized");
        std::future::ready(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::AuthConfig,
        client::testing::{TEST_TOKEN, test_config},
    };
    use rmcp::{
        model::ClientInfo,
        service::{RoleClient, RunningService, Service, serve_client, serve_server},
    };
    use serde_json::{Value, json};
    use tokio::io::duplex;
    use tokio_test::assert_ok;
    use tokio_util::sync::CancellationToken;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path, query_param},
    };

    fn create_test_ctx(
        running: &RunningService<RoleServer, GitLabService>,
    ) -> RequestContext<RoleServer> {
        RequestContext {
            ct: CancellationToken::new(),
            extensions: Extensions::default(),
            id: RequestId::Number(1),
            meta: Meta::default(),
            peer: running.peer().clone(),
        }
    }

    async fn create_test_pair<S, C>(
        service: S,
        client: C,
    ) -> (RunningService<RoleServer, S>, RunningService<RoleClient, C>)
    where
        S: Service<RoleServer>,
        C: Service<RoleClient>,
    {
        let (srv_io, cli_io) = duplex(64 * 1024);
        tokio::try_join!(
            async {
                serve_server(service, srv_io)
                    .await
                    .map_err(anyhow::Error::from)
            },
            async {
                serve_client(client, cli_io)
                    .await
                    .map_err(anyhow::Error::from)
            }
        )
        .expect("Failed to create test pair")
    }

    fn skipping(config: Config, patterns: &[&str]) -> Config {
        Config {
            skip_tools: Some(SkipTools::new(patterns.iter().copied()).unwrap()),
            ..config
        }
    }

    fn call_request(name: &'static str, arguments: Value) -> CallToolRequestParam {
        CallToolRequestParam {
            name: std::borrow::Cow::Borrowed(name),
            arguments: arguments.as_object().cloned(),
        }
    }

    #[test]
    fn test_new_requires_token() {
        let config = Config::default();
        assert!(GitLabService::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_get_info() {
        let server = MockServer::start().await;
        let service = GitLabService::new(&test_config(&server)).unwrap();
        let info = ServerHandler::get_info(&service);
        assert_eq!(info.server_info.name, "gitlab-mcp");
        assert_eq!(info.server_info.version, env!("CARGO_PKG_VERSION"));
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.prompts.is_none());
    }

    #[tokio::test]
    async fn test_list_tools_returns_catalogue() {
        let mock = MockServer::start().await;
        let service = GitLabService::new(&test_config(&mock)).unwrap();
        let (server, client) = create_test_pair(service, ClientInfo::default()).await;

        let ctx = create_test_ctx(&server);
        let result = server.service().list_tools(None, ctx).await.unwrap();
        assert_eq!(result.tools.len(), tools::TOOL_NAMES.len());
        assert!(result.tools.iter().any(|t| t.name == "create_or_update_file"));

        assert_ok!(server.cancel().await);
        assert_ok!(client.cancel().await);
    }

    #[tokio::test]
    async fn test_list_tools_honours_skip_tools() {
        let mock = MockServer::start().await;
        let config = skipping(test_config(&mock), &["delete_.*", "merge_merge_request"]);
        let service = GitLabService::new(&config).unwrap();
        let (server, client) = create_test_pair(service, ClientInfo::default()).await;

        let ctx = create_test_ctx(&server);
        let result = server.service().list_tools(None, ctx).await.unwrap();
        let names: Vec<&str> = result.tools.iter().map(|t| &*t.name).collect();
        assert_eq!(names.len(), tools::TOOL_NAMES.len() - 4);
        assert!(!names.iter().any(|n| n.starts_with("delete_")));
        assert!(!names.contains(&"merge_merge_request"));
        // Patterns are anchored.
        assert!(names.contains(&"list_merge_requests"));

        assert_ok!(server.cancel().await);
        assert_ok!(client.cancel().await);
    }

    #[tokio::test]
    async fn test_call_skipped_tool_is_rejected() {
        let mock = MockServer::start().await;
        let config = skipping(test_config(&mock), &["delete_label"]);
        let service = GitLabService::new(&config).unwrap();
        let (server, client) = create_test_pair(service, ClientInfo::default()).await;

        let ctx = create_test_ctx(&server);
        let result = server
            .service()
            .call_tool(
                call_request("delete_label", json!({"project_id": "1", "name": "bug"})),
                ctx,
            )
            .await;
        let error = result.unwrap_err();
        assert_eq!(error.code, ErrorCode::METHOD_NOT_FOUND);
        assert!(mock.received_requests().await.unwrap_or_default().is_empty());

        assert_ok!(server.cancel().await);
        assert_ok!(client.cancel().await);
    }

    #[tokio::test]
    async fn test_call_tool_reaches_gitlab() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/groups"))
            .and(query_param("search", "infra"))
            .and(header("authorization", format!("Bearer {TEST_TOKEN}").as_str()))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-total", "12")
                    .set_body_json(json!([{"id": 1, "name": "infra"}])),
            )
            .expect(1)
            .mount(&mock)
            .await;

        let service = GitLabService::new(&test_config(&mock)).unwrap();
        let (server, client) = create_test_pair(service, ClientInfo::default()).await;

        let ctx = create_test_ctx(&server);
        let result = server
            .service()
            .call_tool(call_request("search_groups", json!({"search": "infra"})), ctx)
            .await
            .unwrap();
        let text = result.content[0]
            .as_text()
            .map(|t| t.text.clone())
            .unwrap_or_default();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["count"], 12);
        assert_eq!(value["items"][0]["name"], "infra");

        assert_ok!(server.cancel().await);
        assert_ok!(client.cancel().await);
    }

    #[tokio::test]
    async fn test_call_tool_with_private_token() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("private-token", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&mock)
            .await;

        let config = Config {
            auth: Some(AuthConfig::PrivateToken {
                token: "secret".to_string(),
            }),
            ..test_config(&mock)
        };
        let service = GitLabService::new(&config).unwrap();
        let (server, client) = create_test_pair(service, ClientInfo::default()).await;

        let ctx = create_test_ctx(&server);
        let result = server
            .service()
            .call_tool(call_request("list_labels", json!({"project_id": "7"})), ctx)
            .await;
        assert!(result.is_ok(), "{result:?}");

        assert_ok!(server.cancel().await);
        assert_ok!(client.cancel().await);
    }

    #[tokio::test]
    async fn test_call_unknown_tool() {
        let mock = MockServer::start().await;
        let service = GitLabService::new(&test_config(&mock)).unwrap();
        let (server, client) = create_test_pair(service, ClientInfo::default()).await;

        let ctx = create_test_ctx(&server);
        let error = server
            .service()
            .call_tool(call_request("list_pipelines", json!({})), ctx)
            .await
            .unwrap_err();
        assert_eq!(error.code, ErrorCode::METHOD_NOT_FOUND);
        assert!(error.message.contains("list_pipelines"));

        assert_ok!(server.cancel().await);
        assert_ok!(client.cancel().await);
    }
}
