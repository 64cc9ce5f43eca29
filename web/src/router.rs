use crate::{middleware::auth::require_auth, params, AppState};
use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use log::*;
use service::config::Config;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;

use crate::controller::{
    health_check_controller, post_controller, subscription_controller, user_session_controller,
    vapid_key_controller,
};

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// Global definition of the OpenAPI document. To appear in the
// rendered document, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Push Post API"
        ),
        paths(
            health_check_controller::health_check,
            vapid_key_controller::read,
            subscription_controller::create,
            subscription_controller::read,
            subscription_controller::delete,
            post_controller::create,
            post_controller::create_many,
            post_controller::index,
            user_session_controller::register,
            user_session_controller::login,
        ),
        components(
            schemas(
                domain::posts::Model,
                domain::users::Model,
                params::post::PostParams,
                params::subscription::SubscriptionParams,
                params::user::NameParams,
                params::user::SessionResponse,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "pushpost", description = "Posts with Web Push notifications")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Defines the token based authentication requirement for gaining access to our
// API endpoints for OpenAPI.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "token_auth",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "Authorization",
                    "Token returned from a successful POST /api/login",
                ))),
            )
        }
    }
}

pub fn define_routes(config: &Config, app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(vapid_key_routes(app_state.clone()))
        .merge(user_session_routes(app_state.clone()))
        .merge(subscription_routes(app_state.clone()))
        .merge(post_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
        .fallback_service(ServeDir::new(config.static_dir()))
        .layer(cors_layer(config))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn vapid_key_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/vapid-public-key", get(vapid_key_controller::read))
        .with_state(app_state)
}

fn user_session_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/register", post(user_session_controller::register))
        .route("/api/login", post(user_session_controller::login))
        .with_state(app_state)
}

fn subscription_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/subscription",
            post(subscription_controller::create)
                .get(subscription_controller::read)
                .delete(subscription_controller::delete),
        )
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state)
}

fn post_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/post", post(post_controller::create))
        .route(
            "/api/posts",
            post(post_controller::create_many).get(post_controller::index),
        )
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if config.allowed_origins.iter().any(|origin| origin == "*") {
        return cors.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {origin}");
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(origins))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use domain::error::{DomainErrorKind, Error as DomainError, ExternalErrorKind};
    use domain::gateway::{DeliveryStatus, PushTransport, SenderKeys};
    use domain::key_manager::KeyManager;
    use domain::notification::{
        DispatchOutcome, DispatchSettings, NotificationDispatcher, Notifier,
    };
    use domain::storage::Storage;
    use domain::subscription::SubscriptionRegistry;
    use domain::subscriptions;
    use serde_json::{json, Value};
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    /// Records every delivery and fails those addressed to `failing` endpoints.
    #[derive(Default)]
    struct RecordingTransport {
        failing: HashSet<String>,
        delivered: Mutex<Vec<(String, Vec<u8>)>>,
    }

    #[async_trait]
    impl PushTransport for RecordingTransport {
        async fn send(
            &self,
            payload: &[u8],
            subscription: &subscriptions::Model,
            _keys: &SenderKeys,
        ) -> Result<DeliveryStatus, DomainError> {
            if self.failing.contains(&subscription.endpoint) {
                return Err(DomainError {
                    source: None,
                    error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
                });
            }
            self.delivered
                .lock()
                .unwrap()
                .push((subscription.endpoint.clone(), payload.to_vec()));
            Ok(DeliveryStatus::Delivered)
        }
    }

    /// Dispatches inline and keeps every outcome for inspection.
    struct CapturingNotifier {
        dispatcher: NotificationDispatcher,
        outcomes: Mutex<Vec<DispatchOutcome>>,
    }

    #[async_trait]
    impl Notifier for CapturingNotifier {
        async fn notify(&self, payload: Vec<u8>) -> Result<(), DomainError> {
            let outcome = self.dispatcher.notify_all(&payload).await?;
            self.outcomes.lock().unwrap().push(outcome);
            Ok(())
        }
    }

    struct TestApp {
        router: Router,
        transport: Arc<RecordingTransport>,
        notifier: Arc<CapturingNotifier>,
    }

    impl TestApp {
        fn new(failing: &[&str]) -> Self {
            let storage = Storage::memory();
            let transport = Arc::new(RecordingTransport {
                failing: failing.iter().map(|endpoint| endpoint.to_string()).collect(),
                ..Default::default()
            });
            let dispatcher = NotificationDispatcher::new(
                KeyManager::new(Arc::clone(&storage.keys)),
                SubscriptionRegistry::new(Arc::clone(&storage.subscriptions)),
                transport.clone(),
                DispatchSettings::default(),
            );
            let notifier = Arc::new(CapturingNotifier {
                dispatcher,
                outcomes: Mutex::new(Vec::new()),
            });
            let config = Config::try_from_args(["pushpost_rs"]).unwrap();

            Self {
                router: define_routes(&config, AppState::with_notifier(storage, notifier.clone())),
                transport,
                notifier,
            }
        }

        async fn call(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, body.to_vec())
        }

        async fn json(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Value,
        ) -> (StatusCode, Vec<u8>) {
            let mut request = Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json");
            if let Some(token) = token {
                request = request.header(header::AUTHORIZATION, token);
            }
            self.call(request.body(Body::from(body.to_string())).unwrap())
                .await
        }

        async fn empty(&self, method: Method, uri: &str, token: Option<&str>) -> StatusCode {
            let mut request = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                request = request.header(header::AUTHORIZATION, token);
            }
            self.call(request.body(Body::empty()).unwrap()).await.0
        }

        /// Registers `name` and returns its session token.
        async fn sign_up(&self, name: &str) -> String {
            let (status, _) = self
                .json(Method::POST, "/api/register", None, json!({ "name": name }))
                .await;
            assert_eq!(status, StatusCode::CREATED);

            let (status, body) = self
                .json(Method::POST, "/api/login", None, json!({ "name": name }))
                .await;
            assert_eq!(status, StatusCode::OK);
            let session: Value = serde_json::from_slice(&body).unwrap();
            session["token"].as_str().unwrap().to_string()
        }

        async fn subscribe(&self, token: &str, endpoint: &str) -> StatusCode {
            self.json(
                Method::POST,
                "/api/subscription",
                Some(token),
                json!({ "endpoint": endpoint, "p256dh": "BAEC", "auth": "AAECAw==" }),
            )
            .await
            .0
        }
    }

    #[tokio::test]
    async fn health_check_responds() {
        let app = TestApp::new(&[]);

        let (status, body) = app
            .call(Request::get("/health").body(Body::empty()).unwrap())
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"healthy");
    }

    #[tokio::test]
    async fn public_key_is_stable_across_requests() {
        let app = TestApp::new(&[]);

        let (first_status, first) = app
            .call(Request::get("/vapid-public-key").body(Body::empty()).unwrap())
            .await;
        let (second_status, second) = app
            .call(Request::get("/vapid-public-key").body(Body::empty()).unwrap())
            .await;

        assert_eq!(first_status, StatusCode::OK);
        assert_eq!(second_status, StatusCode::OK);
        assert_eq!(first.len(), 65);
        assert_eq!(first[0], 0x04);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn a_post_reaches_every_healthy_subscriber() {
        let app = TestApp::new(&["https://push.example/s2"]);
        let author = app.sign_up("author").await;
        for (name, endpoint) in [
            ("s1", "https://push.example/s1"),
            ("s2", "https://push.example/s2"),
            ("s3", "https://push.example/s3"),
        ] {
            let token = app.sign_up(name).await;
            assert_eq!(app.subscribe(&token, endpoint).await, StatusCode::CREATED);
        }

        let (status, body) = app
            .json(
                Method::POST,
                "/api/post",
                Some(&author),
                json!({ "text": "hello subscribers" }),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED);
        let post: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(post["author"], "author");
        assert_eq!(post["text"], "hello subscribers");
        assert!(post["time"].is_i64());

        let outcomes = app.notifier.outcomes.lock().unwrap().clone();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].attempted, 3);
        assert_eq!(outcomes[0].succeeded, 2);
        assert_eq!(outcomes[0].failures.len(), 1);
        assert_eq!(outcomes[0].failures[0].endpoint, "https://push.example/s2");

        let mut delivered = app.transport.delivered.lock().unwrap().clone();
        delivered.sort();
        assert_eq!(
            delivered,
            vec![
                ("https://push.example/s1".to_string(), b"msg-sync".to_vec()),
                ("https://push.example/s3".to_string(), b"msg-sync".to_vec()),
            ]
        );
    }

    #[tokio::test]
    async fn a_batch_of_posts_is_listed_newest_first_and_notified_once() {
        let app = TestApp::new(&[]);
        let token = app.sign_up("alice").await;

        let (status, _) = app
            .json(Method::POST, "/api/post", Some(&token), json!({ "text": "first" }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = app
            .json(
                Method::POST,
                "/api/posts",
                Some(&token),
                json!([{ "text": "second" }, { "text": "third" }]),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let created: Vec<Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(created.len(), 2);

        let request = Request::get("/api/posts")
            .header(header::AUTHORIZATION, &token)
            .body(Body::empty())
            .unwrap();
        let (status, body) = app.call(request).await;

        assert_eq!(status, StatusCode::OK);
        let listed: Vec<Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[2]["text"], "first");
        assert_eq!(app.notifier.outcomes.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn reuploading_an_offline_post_keeps_one_copy_with_the_client_id_and_time() {
        let app = TestApp::new(&[]);
        let token = app.sign_up("offline").await;
        let offline_post = json!({
            "id": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
            "text": "written offline",
            "time": 1_500_000_000_000_i64,
        });

        for _ in 0..2 {
            let (status, body) = app
                .json(Method::POST, "/api/post", Some(&token), offline_post.clone())
                .await;
            assert_eq!(status, StatusCode::CREATED);
            let post: Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(post["id"], "7c9e6679-7425-40de-944b-e07fc1f90ae7");
            assert_eq!(post["time"], 1_500_000_000_000_i64);
        }

        let request = Request::get("/api/posts")
            .header(header::AUTHORIZATION, &token)
            .body(Body::empty())
            .unwrap();
        let (status, body) = app.call(request).await;

        assert_eq!(status, StatusCode::OK);
        let listed: Vec<Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["text"], "written offline");
    }

    #[tokio::test]
    async fn queued_mode_app_state_answers_posts_without_waiting() {
        let config =
            Config::try_from_args(["pushpost_rs", "--notifier-mode", "queued"]).unwrap();
        let app_state = AppState::new(&config, Storage::memory()).unwrap();
        let app = TestApp {
            router: define_routes(&config, app_state),
            ..TestApp::new(&[])
        };
        let token = app.sign_up("queued").await;

        let (status, body) = app
            .json(Method::POST, "/api/post", Some(&token), json!({ "text": "queued" }))
            .await;

        assert_eq!(status, StatusCode::CREATED);
        let post: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(post["text"], "queued");
    }

    #[tokio::test]
    async fn subscription_lifecycle() {
        let app = TestApp::new(&[]);
        let token = app.sign_up("bob").await;

        assert_eq!(
            app.empty(Method::GET, "/api/subscription", Some(&token)).await,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            app.subscribe(&token, "https://push.example/old").await,
            StatusCode::CREATED
        );
        assert_eq!(
            app.subscribe(&token, "https://push.example/new").await,
            StatusCode::CREATED
        );
        assert_eq!(
            app.empty(Method::GET, "/api/subscription", Some(&token)).await,
            StatusCode::NO_CONTENT
        );
        assert_eq!(
            app.empty(Method::DELETE, "/api/subscription", Some(&token)).await,
            StatusCode::NO_CONTENT
        );
        assert_eq!(
            app.empty(Method::DELETE, "/api/subscription", Some(&token)).await,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn malformed_subscriptions_are_bad_requests() {
        let app = TestApp::new(&[]);
        let token = app.sign_up("carol").await;

        let (missing_field, _) = app
            .json(
                Method::POST,
                "/api/subscription",
                Some(&token),
                json!({ "endpoint": "https://push.example/a" }),
            )
            .await;
        let (bad_base64, body) = app
            .json(
                Method::POST,
                "/api/subscription",
                Some(&token),
                json!({ "endpoint": "https://push.example/a", "p256dh": "%%%", "auth": "AAE=" }),
            )
            .await;

        assert_eq!(missing_field, StatusCode::BAD_REQUEST);
        assert_eq!(bad_base64, StatusCode::BAD_REQUEST);
        assert!(String::from_utf8_lossy(&body).contains("p256dh"));

        let (empty_keys, body) = app
            .json(
                Method::POST,
                "/api/subscription",
                Some(&token),
                json!({ "endpoint": "https://push.example/a", "p256dh": "", "auth": "" }),
            )
            .await;
        assert_eq!(empty_keys, StatusCode::BAD_REQUEST);
        assert!(String::from_utf8_lossy(&body).contains("keys must not be empty"));
        assert_eq!(
            app.empty(Method::GET, "/api/subscription", Some(&token)).await,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let app = TestApp::new(&[]);

        let (status, _) = app
            .json(Method::POST, "/api/post", None, json!({ "text": "anonymous" }))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            app.empty(Method::GET, "/api/subscription", Some("garbage")).await,
            StatusCode::UNAUTHORIZED
        );
        assert!(app.notifier.outcomes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn names_are_unique_and_unknown_names_cannot_log_in() {
        let app = TestApp::new(&[]);
        app.sign_up("dave").await;

        let (duplicate, _) = app
            .json(Method::POST, "/api/register", None, json!({ "name": "dave" }))
            .await;
        let (unknown, _) = app
            .json(Method::POST, "/api/login", None, json!({ "name": "erin" }))
            .await;

        assert_eq!(duplicate, StatusCode::CONFLICT);
        assert_eq!(unknown, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let app = TestApp::new(&[]);

        let (status, body) = app
            .call(Request::get("/api-docs/openapi.json").body(Body::empty()).unwrap())
            .await;

        assert_eq!(status, StatusCode::OK);
        let document: Value = serde_json::from_slice(&body).unwrap();
        assert!(document["paths"]["/api/subscription"].is_object());
    }
}
