//! Reqwest-backed todo source adapter.
//!
//! This adapter owns transport details only: endpoint construction, bearer
//! token injection, timeout and HTTP error mapping, and JSON decoding into
//! domain todos. A 401 response is reported to the [`AuthGate`] before the
//! error is returned.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::dto::{CreateTodoDto, SetCompletedDto, TodoDto};
use crate::domain::ports::{AuthGate, TodoSource, TodoSourceError};
use crate::domain::{NewTodo, Todo, TodoId};

/// Number of todos returned by [`TodoSource::list`] unless overridden.
pub const DEFAULT_LIST_LIMIT: usize = 20;
/// Request timeout applied to every call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const TODOS_SEGMENT: &str = "todos";

/// Todo source adapter talking to a JSONPlaceholder-style REST API.
pub struct HttpTodoSource {
    client: Client,
    base_url: Url,
    list_limit: usize,
    gate: Arc<dyn AuthGate>,
}

impl HttpTodoSource {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    /// ```rust,ignore
    /// let source = HttpTodoSource::new(base_url, DEFAULT_REQUEST_TIMEOUT, gate)?;
    /// ```
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        base_url: Url,
        timeout: Duration,
        gate: Arc<dyn AuthGate>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, gate))
    }

    /// Build an adapter around an already configured client.
    #[must_use]
    pub fn with_client(client: Client, base_url: Url, gate: Arc<dyn AuthGate>) -> Self {
        Self {
            client,
            base_url,
            list_limit: DEFAULT_LIST_LIMIT,
            gate,
        }
    }

    /// Override how many todos [`TodoSource::list`] returns.
    #[must_use]
    pub fn with_list_limit(mut self, list_limit: usize) -> Self {
        self.list_limit = list_limit;
        self
    }

    fn endpoint(&self, id: Option<TodoId>) -> Result<Url, TodoSourceError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                TodoSourceError::invalid_request(format!(
                    "base url cannot carry a path: {}",
                    self.base_url
                ))
            })?;
            segments.pop_if_empty().push(TODOS_SEGMENT);
            if let Some(todo_id) = id {
                segments.push(&todo_id.to_string());
            }
        }
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let Some(token) = self.gate.bearer_token() else {
            return request;
        };
        request.bearer_auth(token)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Vec<u8>, TodoSourceError> {
        let response = self
            .authorize(request)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED {
                warn!("remote answered 401; tearing down session");
                self.gate.on_unauthorized();
            }
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok(body.to_vec())
    }
}

#[async_trait]
impl TodoSource for HttpTodoSource {
    async fn list(&self) -> Result<Vec<Todo>, TodoSourceError> {
        let url = self.endpoint(None)?;
        let body = self.execute(self.client.get(url)).await?;
        let todos: Vec<TodoDto> = decode(&body)?;
        debug!(received = todos.len(), limit = self.list_limit, "todo list fetched");
        Ok(todos
            .into_iter()
            .take(self.list_limit)
            .map(Todo::from)
            .collect())
    }

    async fn get(&self, id: TodoId) -> Result<Todo, TodoSourceError> {
        let url = self.endpoint(Some(id))?;
        let body = self.execute(self.client.get(url)).await?;
        decode::<TodoDto>(&body).map(Todo::from)
    }

    async fn create(&self, todo: &NewTodo) -> Result<Todo, TodoSourceError> {
        let url = self.endpoint(None)?;
        let request = self.client.post(url).json(&CreateTodoDto::from(todo));
        let body = self.execute(request).await?;
        decode::<TodoDto>(&body).map(Todo::from)
    }

    async fn set_completed(&self, id: TodoId, completed: bool) -> Result<Todo, TodoSourceError> {
        let url = self.endpoint(Some(id))?;
        let request = self.client.patch(url).json(&SetCompletedDto { completed });
        let body = self.execute(request).await?;
        decode::<TodoDto>(&body).map(Todo::from)
    }

    async fn delete(&self, id: TodoId) -> Result<(), TodoSourceError> {
        let url = self.endpoint(Some(id))?;
        self.execute(self.client.delete(url)).await?;
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, TodoSourceError> {
    serde_json::from_slice(body).map_err(|error| {
        TodoSourceError::decode(format!(
            "invalid todo JSON payload: {error}; body: {}",
            body_preview(body)
        ))
    })
}

fn map_transport_error(error: reqwest::Error) -> TodoSourceError {
    if error.is_timeout() {
        TodoSourceError::timeout(error.to_string())
    } else {
        TodoSourceError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> TodoSourceError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::UNAUTHORIZED => TodoSourceError::unauthorized(message),
        StatusCode::NOT_FOUND => TodoSourceError::not_found(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            TodoSourceError::timeout(message)
        }
        _ if status.is_client_error() => TodoSourceError::invalid_request(message),
        _ => TodoSourceError::transport(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Mapping helpers plus round trips against a one-shot local server.

    use super::*;
    use crate::domain::TodoTitle;
    use crate::domain::ports::{AnonymousGate, MockAuthGate};
    use rstest::rstest;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn base_url() -> Url {
        Url::parse("https://jsonplaceholder.typicode.com").expect("valid url")
    }

    fn local_client(timeout: Duration) -> Client {
        Client::builder()
            .no_proxy()
            .timeout(timeout)
            .build()
            .expect("client builds")
    }

    fn gate_with_token(token: &'static str) -> MockAuthGate {
        let mut gate = MockAuthGate::new();
        gate.expect_bearer_token()
            .returning(move || Some(token.to_owned()));
        gate
    }

    /// Serve one canned response and return the raw request text.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (Url, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("local address");
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut buffer = vec![0_u8; 16 * 1024];
            let read = socket.read(&mut buffer).await.expect("read request");
            let request = String::from_utf8_lossy(buffer.get(..read).unwrap_or_default())
                .into_owned();
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket
                .write_all(response.as_bytes())
                .await
                .expect("write response");
            socket.shutdown().await.expect("shutdown");
            request
        });
        let url = Url::parse(&format!("http://{address}")).expect("local url");
        (url, handle)
    }

    #[rstest]
    #[case::unauthorized(StatusCode::UNAUTHORIZED, "Unauthorized")]
    #[case::not_found(StatusCode::NOT_FOUND, "NotFound")]
    #[case::request_timeout(StatusCode::REQUEST_TIMEOUT, "Timeout")]
    #[case::gateway_timeout(StatusCode::GATEWAY_TIMEOUT, "Timeout")]
    #[case::bad_request(StatusCode::BAD_REQUEST, "InvalidRequest")]
    #[case::server_error(StatusCode::INTERNAL_SERVER_ERROR, "Transport")]
    fn maps_http_statuses_to_expected_domain_errors(
        #[case] status: StatusCode,
        #[case] expected: &str,
    ) {
        let error = map_status_error(status, b"{}");
        let actual = match error {
            TodoSourceError::Unauthorized { .. } => "Unauthorized",
            TodoSourceError::NotFound { .. } => "NotFound",
            TodoSourceError::Timeout { .. } => "Timeout",
            TodoSourceError::InvalidRequest { .. } => "InvalidRequest",
            TodoSourceError::Transport { .. } => "Transport",
            TodoSourceError::Decode { .. } => "Decode",
        };
        assert_eq!(actual, expected);
    }

    #[test]
    fn body_preview_compacts_and_truncates() {
        let body = format!("{{ \"error\":\n  \"{}\" }}", "x".repeat(200));
        let preview = body_preview(body.as_bytes());
        assert!(preview.starts_with("{ \"error\": \""));
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 163);
    }

    #[test]
    fn decodes_todos_and_ignores_unknown_fields() {
        let body = br#"{"userId":1,"id":5,"title":"laboriosam","completed":true,"extra":0}"#;
        let todo = decode::<TodoDto>(body).map(Todo::from).expect("decodes");
        assert_eq!(todo.id, TodoId::new(5));
        assert!(todo.completed);
        assert_eq!(todo.user_id, Some(1));
    }

    #[test]
    fn rejects_payloads_without_ids() {
        let error = decode::<TodoDto>(br#"{"title":"no id"}"#).expect_err("id required");
        assert!(matches!(error, TodoSourceError::Decode { .. }));
    }

    #[rstest]
    #[case("https://api.example.com", None, "https://api.example.com/todos")]
    #[case("https://api.example.com/v1/", Some(3), "https://api.example.com/v1/todos/3")]
    fn endpoints_append_to_the_base_path(
        #[case] base: &str,
        #[case] id: Option<u64>,
        #[case] expected: &str,
    ) {
        let source = HttpTodoSource::with_client(
            Client::new(),
            Url::parse(base).expect("valid url"),
            Arc::new(AnonymousGate),
        );
        let url = source.endpoint(id.map(TodoId::new)).expect("endpoint");
        assert_eq!(url.as_str(), expected);
    }

    #[test]
    fn authorize_attaches_bearer_tokens() {
        let source = HttpTodoSource::with_client(
            Client::new(),
            base_url(),
            Arc::new(gate_with_token("dummy-token-1")),
        );
        let request = source
            .authorize(source.client.get(base_url()))
            .build()
            .expect("request builds");
        let header = request
            .headers()
            .get(reqwest::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        assert_eq!(header, Some("Bearer dummy-token-1"));
    }

    #[test]
    fn anonymous_requests_carry_no_authorization() {
        let source = HttpTodoSource::with_client(Client::new(), base_url(), Arc::new(AnonymousGate));
        let request = source
            .authorize(source.client.get(base_url()))
            .build()
            .expect("request builds");
        assert!(request.headers().get(reqwest::header::AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn list_truncates_to_the_limit_and_sends_the_token() {
        let (url, server) = serve_once(
            "200 OK",
            r#"[{"id":1,"title":"a","completed":false},{"id":2,"title":"b","completed":true},{"id":3,"title":"c","completed":false}]"#,
        )
        .await;
        let source = HttpTodoSource::with_client(
            local_client(DEFAULT_REQUEST_TIMEOUT),
            url,
            Arc::new(gate_with_token("dummy-token-7")),
        )
        .with_list_limit(2);

        let todos = source.list().await.expect("list succeeds");

        let ids: Vec<u64> = todos.iter().map(|todo| todo.id.get()).collect();
        assert_eq!(ids, vec![1, 2]);
        let request = server.await.expect("server joins").to_ascii_lowercase();
        assert!(request.starts_with("get /todos "), "unexpected request: {request}");
        assert!(request.contains("authorization: bearer dummy-token-7"));
    }

    #[tokio::test]
    async fn create_posts_the_default_owner() {
        let (url, server) = serve_once(
            "201 Created",
            r#"{"title":"Buy milk","completed":false,"userId":1,"id":201}"#,
        )
        .await;
        let source = HttpTodoSource::with_client(
            local_client(DEFAULT_REQUEST_TIMEOUT),
            url,
            Arc::new(AnonymousGate),
        );
        let payload = NewTodo::new(TodoTitle::new("Buy milk").expect("valid title"));

        let created = source.create(&payload).await.expect("create succeeds");

        assert_eq!(created.id, TodoId::new(201));
        let request = server.await.expect("server joins");
        assert!(request.starts_with("POST /todos "), "unexpected request: {request}");
    }

    #[tokio::test]
    async fn unauthorized_responses_notify_the_gate() {
        let (url, server) = serve_once("401 Unauthorized", "").await;
        let mut gate = MockAuthGate::new();
        gate.expect_bearer_token()
            .returning(|| Some("expired".to_owned()));
        gate.expect_on_unauthorized().times(1).return_const(());
        let source =
            HttpTodoSource::with_client(local_client(DEFAULT_REQUEST_TIMEOUT), url, Arc::new(gate));

        let error = source
            .set_completed(TodoId::new(1), true)
            .await
            .expect_err("401 surfaces");

        assert!(matches!(error, TodoSourceError::Unauthorized { .. }));
        let request = server.await.expect("server joins");
        assert!(request.starts_with("PATCH /todos/1 "), "unexpected request: {request}");
    }

    #[tokio::test]
    async fn missing_todos_map_to_not_found_without_teardown() {
        let (url, server) = serve_once("404 Not Found", "{}").await;
        let mut gate = MockAuthGate::new();
        gate.expect_bearer_token().returning(|| None);
        gate.expect_on_unauthorized().never();
        let source =
            HttpTodoSource::with_client(local_client(DEFAULT_REQUEST_TIMEOUT), url, Arc::new(gate));

        let error = source.delete(TodoId::new(9)).await.expect_err("404 surfaces");

        assert!(matches!(error, TodoSourceError::NotFound { .. }));
        server.await.expect("server joins");
    }

    #[tokio::test]
    async fn slow_responses_time_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("local address");
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.expect("accept");
            tokio::time::sleep(Duration::from_secs(2)).await;
            drop(socket);
        });
        let url = Url::parse(&format!("http://{address}")).expect("local url");
        let source = HttpTodoSource::with_client(
            local_client(Duration::from_millis(100)),
            url,
            Arc::new(AnonymousGate),
        );

        let error = source.list().await.expect_err("request times out");

        assert!(matches!(error, TodoSourceError::Timeout { .. }), "got {error:?}");
        server.abort();
    }
}
