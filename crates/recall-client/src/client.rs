//! Authenticated REST client.
//!
//! Every endpoint goes through the same pipeline: attach credentials from the
//! [`Session`], send, and on a non-2xx answer publish one localized error
//! notification and return [`Outcome::Failure`]. A 401 on a request that
//! carried our credential also expires the session, unless the credential
//! came from Telegram.

use std::fmt;
use std::sync::Arc;

use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use recall_core::i18n;
use recall_core::model::{
    AuthToken, Card, Course, CreateTestSession, DataEnvelope, LeaderboardEntry, Module,
    TestSession, TestSessionDetail, TestSessionSummary, UserAnswerStatus, UserAnswerUpdate,
};
use recall_core::{NotificationSink, Session};

use crate::error::ClientError;

/// User agent sent when the caller does not configure one.
pub const DEFAULT_USER_AGENT: &str = concat!("recall/", env!("CARGO_PKG_VERSION"));

/// Result of a request the server answered.
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    /// The server refused the request. A notification has already been published.
    Failure(Failure),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// The payload, discarding the failure details.
    pub fn success(self) -> Option<T> {
        match self {
            Outcome::Success(data) => Some(data),
            Outcome::Failure(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Success(data) => Outcome::Success(f(data)),
            Outcome::Failure(failure) => Outcome::Failure(failure),
        }
    }

    pub fn into_result(self) -> Result<T, Failure> {
        match self {
            Outcome::Success(data) => Ok(data),
            Outcome::Failure(failure) => Err(failure),
        }
    }
}

/// A refused request. Carries no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Failure {
    /// HTTP status of the refusal.
    pub status: u16,
    /// The refusal expired the session and cleared the stored token.
    pub session_expired: bool,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.session_expired {
            write!(f, "session expired (HTTP {})", self.status)
        } else {
            write!(f, "request refused (HTTP {})", self.status)
        }
    }
}

impl std::error::Error for Failure {}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct StatusUpdate {
    status: UserAnswerStatus,
}

/// Client for the recall REST API.
#[derive(Clone)]
pub struct ApiClient {
    session: Arc<Session>,
    notifications: Arc<NotificationSink>,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(
        session: Arc<Session>,
        notifications: Arc<NotificationSink>,
    ) -> Result<Self, ClientError> {
        Self::with_user_agent(session, notifications, DEFAULT_USER_AGENT)
    }

    pub fn with_user_agent(
        session: Arc<Session>,
        notifications: Arc<NotificationSink>,
        user_agent: &str,
    ) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self {
            session,
            notifications,
            client,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn notifications(&self) -> &Arc<NotificationSink> {
        &self.notifications
    }

    // -----------------------------------------------------------------------
    // Endpoints
    // -----------------------------------------------------------------------

    /// Exchange a username and password for a bearer token. Unauthenticated.
    #[instrument(skip(self, password))]
    pub async fn get_token(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Outcome<AuthToken>, ClientError> {
        let request = self
            .request(Method::POST, self.endpoint("/api/auth")?)
            .json(&Credentials { username, password });
        self.fetch_json(request, "/api/auth").await
    }

    /// [`ApiClient::get_token`], then store the issued token in the session.
    pub async fn login(&self, username: &str, password: &str) -> Result<Outcome<()>, ClientError> {
        match self.get_token(username, password).await? {
            Outcome::Success(AuthToken { token }) => {
                self.session.set_token(&token)?;
                Ok(Outcome::Success(()))
            }
            Outcome::Failure(failure) => Ok(Outcome::Failure(failure)),
        }
    }

    #[instrument(skip(self))]
    pub async fn create_test_session(
        &self,
        data: &CreateTestSession,
    ) -> Result<Outcome<TestSession>, ClientError> {
        let request = self
            .authorized(Method::POST, self.endpoint("/api/test-sessions")?)
            .json(data);
        self.fetch_json(request, "/api/test-sessions").await
    }

    #[instrument(skip(self))]
    pub async fn get_test_session(
        &self,
        uuid: Uuid,
    ) -> Result<Outcome<TestSessionDetail>, ClientError> {
        let path = format!("/api/test-sessions/{uuid}");
        let request = self.authorized(Method::GET, self.endpoint(&path)?);
        self.fetch_json(request, &path).await
    }

    #[instrument(skip(self))]
    pub async fn get_test_sessions(&self) -> Result<Outcome<Vec<TestSessionSummary>>, ClientError> {
        let request = self.authorized(Method::GET, self.endpoint("/api/test-sessions")?);
        let outcome: Outcome<DataEnvelope<TestSessionSummary>> =
            self.fetch_json(request, "/api/test-sessions").await?;
        Ok(outcome.map(|envelope| envelope.data))
    }

    #[instrument(skip(self))]
    pub async fn update_user_answer(
        &self,
        uuid: Uuid,
        status: UserAnswerStatus,
    ) -> Result<Outcome<UserAnswerUpdate>, ClientError> {
        let path = format!("/api/user-answers/{uuid}");
        let request = self
            .authorized(Method::PATCH, self.endpoint(&path)?)
            .json(&StatusUpdate { status });
        self.fetch_json(request, &path).await
    }

    #[instrument(skip(self))]
    pub async fn get_all_cards(&self) -> Result<Outcome<Vec<Card>>, ClientError> {
        let request = self.authorized(Method::GET, self.endpoint("/api/cards")?);
        self.fetch_json(request, "/api/cards").await
    }

    #[instrument(skip(self))]
    pub async fn get_all_courses(&self) -> Result<Outcome<Vec<Course>>, ClientError> {
        let request = self.authorized(Method::GET, self.endpoint("/api/courses")?);
        self.fetch_json(request, "/api/courses").await
    }

    #[instrument(skip(self))]
    pub async fn get_modules_by_course_slug(
        &self,
        slug: &str,
    ) -> Result<Outcome<Vec<Module>>, ClientError> {
        let mut url = self.endpoint("/api/modules")?;
        url.query_pairs_mut().append_pair("course_slug", slug);
        let request = self.authorized(Method::GET, url);
        self.fetch_json(request, "/api/modules").await
    }

    #[instrument(skip(self))]
    pub async fn get_leaderboard(&self) -> Result<Outcome<Vec<LeaderboardEntry>>, ClientError> {
        let request = self.authorized(Method::GET, self.endpoint("/api/leaderboard")?);
        let outcome: Outcome<DataEnvelope<LeaderboardEntry>> =
            self.fetch_json(request, "/api/leaderboard").await?;
        Ok(outcome.map(|envelope| envelope.data))
    }

    /// Probe the change feed. The body is returned as raw text; `None` means
    /// the server has nothing in progress for this user (204).
    #[instrument(skip(self))]
    pub async fn get_changes(&self) -> Result<Outcome<Option<String>>, ClientError> {
        let request = self.authorized(Method::GET, self.endpoint("/api/changes")?);
        let response = match self.send(request, "/api/changes").await? {
            Ok(response) => response,
            Err(failure) => return Ok(Outcome::Failure(failure)),
        };
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Outcome::Success(None));
        }
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Outcome::Success(Some(body)))
    }

    // -----------------------------------------------------------------------
    // Pipeline
    // -----------------------------------------------------------------------

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        let raw = format!("{}{}", self.session.api_url(), path);
        Url::parse(&raw).map_err(|e| ClientError::InvalidUrl {
            url: raw,
            message: e.to_string(),
        })
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.request(method, url)
    }

    fn authorized(&self, method: Method, url: Url) -> RequestBuilder {
        self.request(method, url)
            .header(AUTHORIZATION, self.session.authorization_header_value())
    }

    /// Send a request. The inner `Err` is a refusal that has been fully handled.
    async fn send(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> Result<Result<Response, Failure>, ClientError> {
        let request = request
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;
        let credentialed = request.headers().contains_key(AUTHORIZATION);

        let response = self.client.execute(request).await.map_err(|e| {
            if e.is_builder() {
                ClientError::Build(e.to_string())
            } else {
                ClientError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        debug!(endpoint, status = status.as_u16(), "response received");

        if status.is_success() {
            Ok(Ok(response))
        } else {
            Ok(Err(self.refuse(response, endpoint, credentialed).await))
        }
    }

    /// Handle a non-2xx answer. Only a request that presented our credential
    /// can expire the session; a 401 from `/api/auth` is a wrong password.
    async fn refuse(&self, response: Response, endpoint: &str, credentialed: bool) -> Failure {
        let status = response.status();
        let mut session_expired = false;

        if status == StatusCode::UNAUTHORIZED
            && credentialed
            && !self.session.is_telegram_context()
        {
            warn!(endpoint, "credentials refused, expiring session");
            if let Err(e) = self.session.expire() {
                warn!(error = %e, "failed to clear stored token");
            }
            session_expired = true;
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(endpoint, error = %e, "failed to read error body");
                String::new()
            }
        };
        warn!(endpoint, status = status.as_u16(), body = %body.trim(), "request refused");
        self.notifications.error(i18n::localize(&body));

        Failure {
            status: status.as_u16(),
            session_expired,
        }
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> Result<Outcome<T>, ClientError> {
        let response = match self.send(request, endpoint).await? {
            Ok(response) => response,
            Err(failure) => return Ok(Outcome::Failure(failure)),
        };

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        serde_json::from_slice(&bytes)
            .map(Outcome::Success)
            .map_err(|e| ClientError::Decode {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("session", &self.session)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::notify::Level;
    use recall_core::MemoryTokenStore;
    use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Harness {
        client: ApiClient,
        store: Arc<MemoryTokenStore>,
        notifications: Arc<NotificationSink>,
    }

    fn harness(server: &MockServer, token: Option<&str>, tma: Option<&str>) -> Harness {
        let store = Arc::new(match token {
            Some(t) => MemoryTokenStore::with_token(t),
            None => MemoryTokenStore::new(),
        });
        let session =
            Arc::new(Session::new(store.clone(), tma.map(str::to_string), server.uri()).unwrap());
        let notifications = Arc::new(NotificationSink::new());
        let client = ApiClient::new(session, notifications.clone()).unwrap();
        Harness {
            client,
            store,
            notifications,
        }
    }

    fn course_json(id: i64, slug: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "uuid": Uuid::new_v4(),
            "slug": slug,
            "name": slug.to_uppercase(),
            "created_at": "2025-02-01T08:00:00Z",
            "updated_at": "2025-02-01T08:00:00Z"
        })
    }

    #[tokio::test]
    async fn get_token_posts_credentials_without_authorization() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/auth"))
            .and(body_json(
                serde_json::json!({"username": "alice", "password": "s3cret"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "jwt"})))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server, None, None);
        let outcome = h.client.get_token("alice", "s3cret").await.unwrap();
        assert_eq!(
            outcome,
            Outcome::Success(AuthToken {
                token: "jwt".into()
            })
        );

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn login_stores_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/auth"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "jwt"})))
            .mount(&server)
            .await;

        let h = harness(&server, None, None);
        assert!(h.client.login("alice", "pw").await.unwrap().is_success());
        assert_eq!(h.store.stored().as_deref(), Some("jwt"));
        assert!(h.client.session().is_authenticated());
    }

    #[tokio::test]
    async fn bearer_header_is_attached() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/courses"))
            .and(header("Authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([course_json(1, "go")])))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server, Some("abc"), None);
        let courses = h.client.get_all_courses().await.unwrap().success().unwrap();
        assert_eq!(courses[0].slug, "go");
    }

    #[tokio::test]
    async fn header_is_sent_even_without_credentials() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/cards"))
            .and(header_exists("Authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server, None, None);
        let cards = h.client.get_all_cards().await.unwrap();
        assert_eq!(cards, Outcome::Success(vec![]));
    }

    #[tokio::test]
    async fn telegram_header_is_attached() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/cards"))
            .and(header("Authorization", "tma query_id=AAE&hash=ff"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server, Some("ignored"), Some("query_id=AAE&hash=ff"));
        assert!(h.client.get_all_cards().await.unwrap().is_success());
    }

    #[tokio::test]
    async fn unauthorized_expires_session_once() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/test-sessions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
            .mount(&server)
            .await;

        let h = harness(&server, Some("stale"), None);
        let outcome = h.client.get_test_sessions().await.unwrap();

        assert_eq!(
            outcome,
            Outcome::Failure(Failure {
                status: 401,
                session_expired: true
            })
        );
        assert!(h.store.stored().is_none());
        assert!(!h.client.session().is_authenticated());
        assert_eq!(h.client.session().expiry_count(), 1);

        let list = h.notifications.snapshot();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].message, "invalid token");
    }

    #[tokio::test]
    async fn wrong_password_does_not_expire_session() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/auth"))
            .respond_with(
                ResponseTemplate::new(401).set_body_string("invalid username or password"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server, None, None);
        let outcome = h.client.login("neo", "wrong").await.unwrap();

        assert_eq!(
            outcome,
            Outcome::Failure(Failure {
                status: 401,
                session_expired: false
            })
        );
        assert_eq!(h.client.session().expiry_count(), 0);
        assert!(h.store.stored().is_none());

        let list = h.notifications.snapshot();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].message, "invalid username or password");
    }

    #[tokio::test]
    async fn unauthorized_in_telegram_context_keeps_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/test-sessions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad init data"))
            .mount(&server)
            .await;

        let h = harness(&server, Some("kept"), Some("query_id=1"));
        let outcome = h.client.get_test_sessions().await.unwrap();

        assert_eq!(
            outcome,
            Outcome::Failure(Failure {
                status: 401,
                session_expired: false
            })
        );
        assert_eq!(h.store.stored().as_deref(), Some("kept"));
        assert_eq!(h.client.session().expiry_count(), 0);
        assert_eq!(h.notifications.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn known_error_is_localized() {
        let server = MockServer::start().await;
        let uuid = Uuid::new_v4();

        Mock::given(method("PATCH"))
            .and(path(format!("/api/user-answers/{uuid}")))
            .and(body_json(serde_json::json!({"status": "remember"})))
            .respond_with(ResponseTemplate::new(403).set_body_string("test session is not active\n"))
            .mount(&server)
            .await;

        let h = harness(&server, Some("abc"), None);
        let outcome = h
            .client
            .update_user_answer(uuid, UserAnswerStatus::Remember)
            .await
            .unwrap();

        assert!(!outcome.is_success());
        let list = h.notifications.snapshot();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].level, Level::Error);
        assert_eq!(
            list[0].message,
            "Этот тест устарел и закрыт, начните новый тест"
        );
        assert_eq!(h.client.session().expiry_count(), 0);
    }

    #[tokio::test]
    async fn unknown_error_is_shown_verbatim() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/courses"))
            .respond_with(ResponseTemplate::new(500).set_body_string("some other error"))
            .mount(&server)
            .await;

        let h = harness(&server, Some("abc"), None);
        let outcome = h.client.get_all_courses().await.unwrap();
        assert_eq!(
            outcome.into_result().unwrap_err().status,
            500
        );
        assert_eq!(h.notifications.snapshot()[0].message, "some other error");
    }

    #[tokio::test]
    async fn empty_error_body_gets_generic_message() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/cards"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let h = harness(&server, Some("abc"), None);
        assert!(!h.client.get_all_cards().await.unwrap().is_success());
        assert_eq!(h.notifications.snapshot()[0].message, i18n::UNKNOWN_ERROR);
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/courses"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let h = harness(&server, Some("abc"), None);
        let err = h.client.get_all_courses().await.unwrap_err();
        assert!(matches!(err, ClientError::Decode { .. }));
        assert!(h.notifications.snapshot().is_empty());
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        // Bind then release a port so nothing is listening on it.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let session = Arc::new(
            Session::new(
                MemoryTokenStore::with_token("abc"),
                None,
                format!("http://127.0.0.1:{port}"),
            )
            .unwrap(),
        );
        let notifications = Arc::new(NotificationSink::new());
        let client = ApiClient::new(session.clone(), notifications.clone()).unwrap();

        let err = client.get_all_courses().await.unwrap_err();
        assert!(err.is_transport(), "unexpected error: {err}");
        assert!(notifications.snapshot().is_empty());
        assert_eq!(session.expiry_count(), 0);
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn modules_are_filtered_by_course_slug() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/modules"))
            .and(query_param("course_slug", "go"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "id": 1,
                "uuid": Uuid::new_v4(),
                "name": "Goroutines",
                "created_at": "2025-02-01T08:00:00Z",
                "updated_at": "2025-02-01T08:00:00Z"
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server, Some("abc"), None);
        let modules = h
            .client
            .get_modules_by_course_slug("go")
            .await
            .unwrap()
            .success()
            .unwrap();
        assert_eq!(modules[0].name, "Goroutines");
    }

    #[tokio::test]
    async fn listings_unwrap_data_envelope() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/test-sessions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{
                    "uuid": Uuid::new_v4(),
                    "is_active": true,
                    "is_shuffled": false,
                    "module_ids": [3],
                    "has_recommendations": false,
                    "count_null": 4,
                    "count_remember": 5,
                    "count_forget": 1,
                    "created_at": "2025-02-01T08:00:00Z",
                    "course_name": "Go"
                }]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/leaderboard"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{
                    "id": 1,
                    "username": "neo",
                    "first_name": "Thomas",
                    "last_name": null,
                    "remember_count": 10,
                    "forgot_count": 2,
                    "answered_count": 12,
                    "started_sessions": 3
                }]
            })))
            .mount(&server)
            .await;

        let h = harness(&server, Some("abc"), None);
        let sessions = h.client.get_test_sessions().await.unwrap().success().unwrap();
        assert_eq!(sessions[0].total(), 10);
        let board = h.client.get_leaderboard().await.unwrap().success().unwrap();
        assert_eq!(board[0].answered_count, 12);
    }

    #[tokio::test]
    async fn changes_probe_returns_raw_body_or_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/changes"))
            .respond_with(ResponseTemplate::new(204))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/changes"))
            .respond_with(ResponseTemplate::new(200).set_body_string("chunk-1chunk-2"))
            .mount(&server)
            .await;

        let h = harness(&server, Some("abc"), None);
        assert_eq!(h.client.get_changes().await.unwrap(), Outcome::Success(None));
        assert_eq!(
            h.client.get_changes().await.unwrap(),
            Outcome::Success(Some("chunk-1chunk-2".to_string()))
        );
    }

    #[tokio::test]
    async fn changes_probe_uses_failure_pipeline() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/changes"))
            .respond_with(ResponseTemplate::new(401).set_body_string("no token provided"))
            .mount(&server)
            .await;

        let h = harness(&server, Some("abc"), None);
        let outcome = h.client.get_changes().await.unwrap();
        assert!(matches!(
            outcome,
            Outcome::Failure(Failure {
                session_expired: true,
                ..
            })
        ));
        assert_eq!(h.notifications.snapshot().len(), 1);
    }
}
