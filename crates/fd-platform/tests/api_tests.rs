//! Platform API Integration Tests
//!
//! Drives the assembled router end to end against the in-memory stores.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use jsonwebtoken::Algorithm;
use serde_json::{json, Value};
use tower::ServiceExt;

use fd_config::BootstrapConfig;
use fd_platform::audit::InMemoryAuditStore;
use fd_platform::{
    Argon2Config, AuthService, BootstrapOutcome, IdGenerator, PasswordService, Platform, Stores,
    TokenConfig,
};

struct TestApp {
    router: Router,
    platform: Platform,
    audit: Arc<InMemoryAuditStore>,
    admin_token: String,
    utc_id: String,
    admin_role_id: String,
}

struct TestResponse {
    status: StatusCode,
    www_authenticate: Option<String>,
    body: Value,
}

async fn setup() -> TestApp {
    let audit = Arc::new(InMemoryAuditStore::new());
    let auth_service = AuthService::new(TokenConfig {
        secret_key: "integration-secret".to_string(),
        algorithm: Algorithm::HS256,
        access_token_expire_minutes: 30,
    });
    let platform = Platform::new(
        Stores::with_audit(audit.clone()),
        auth_service,
        PasswordService::new(Argon2Config::testing()).unwrap(),
    );

    let outcome = platform
        .bootstrap_seeder()
        .seed(&BootstrapConfig {
            admin_user_name: Some("root".to_string()),
            admin_password: Some("root-password".to_string()),
            timezone: "UTC".to_string(),
        })
        .await
        .unwrap();
    assert!(matches!(outcome, BootstrapOutcome::Created(_)));

    let utc_id = platform.timezone_registry.find_by_name("UTC").await.unwrap().unwrap().id;
    let admin_role_id = platform.role_registry.find_by_name("admin").await.unwrap().unwrap().id;
    let router = platform.router(&[]);

    let mut app = TestApp {
        router,
        platform,
        audit,
        admin_token: String::new(),
        utc_id,
        admin_role_id,
    };
    app.admin_token = app.login("root", "root-password").await;
    app
}

impl TestApp {
    async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let www_authenticate = response
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse { status, www_authenticate, body }
    }

    async fn login_response(&self, username: &str, password: &str) -> TestResponse {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/v1/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("username={}&password={}", username, password)))
            .unwrap();
        self.dispatch(request).await
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let response = self.login_response(username, password).await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);
        response.body["access_token"].as_str().unwrap().to_string()
    }

    async fn create_role(&self, name: &str) -> String {
        let response = self
            .send(Method::POST, "/v1/user_roles", Some(&self.admin_token), Some(json!({ "role": name })))
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
        response.body["id"].as_str().unwrap().to_string()
    }

    async fn create_user(&self, name: &str, roles: &[&str]) -> Value {
        let response = self
            .send(
                Method::POST,
                "/v1/users",
                Some(&self.admin_token),
                Some(json!({
                    "user_name": name,
                    "password": format!("{}-password", name),
                    "current_timezone": self.utc_id,
                    "roles": roles,
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "create failed: {}", response.body);
        response.body
    }
}

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_is_public() {
        let app = setup().await;
        let response = app.send(Method::GET, "/", None, None).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_openapi_document_served() {
        let app = setup().await;
        let response = app.send(Method::GET, "/openapi.json", None, None).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["info"]["title"], "Fidelity API");
        assert!(response.body["paths"]["/v1/users/{id}/role-history"].is_object());
    }
}

mod auth_tests {
    use super::*;

    #[tokio::test]
    async fn test_login_issues_bearer_token() {
        let app = setup().await;
        let response = app.login_response("root", "root-password").await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["token_type"], "bearer");
        assert_eq!(response.body["user_name"], "root");
        assert_eq!(response.body["is_admin"], true);
        assert!(response.body["access_token"].as_str().is_some_and(|t| !t.is_empty()));
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let app = setup().await;

        let wrong_password = app.login_response("root", "nope").await;
        assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password.body["error"], "INVALID_CREDENTIALS");

        let unknown_user = app.login_response("ghost", "root-password").await;
        assert_eq!(unknown_user.status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_user.body["error"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn test_missing_token_gets_bearer_challenge() {
        let app = setup().await;
        let response = app.send(Method::GET, "/v1/users", None, None).await;

        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.www_authenticate.as_deref(), Some("Bearer"));
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let app = setup().await;
        let response = app.send(Method::GET, "/v1/users", Some("not-a-jwt"), None).await;

        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.body["error"], "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let app = setup().await;
        let token = app
            .platform
            .auth_service
            .issue_token("root", chrono::Duration::minutes(-5))
            .unwrap();

        let response = app.send(Method::GET, "/v1/me", Some(&token), None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.body["error"], "TOKEN_EXPIRED");
    }

    #[tokio::test]
    async fn test_token_for_unknown_user_rejected() {
        let app = setup().await;
        let token = app.platform.auth_service.generate_access_token("ghost").unwrap();

        let response = app.send(Method::GET, "/v1/me", Some(&token), None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_returns_resolved_user() {
        let app = setup().await;
        let response = app.send(Method::GET, "/v1/me", Some(&app.admin_token), None).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["user_name"], "root");
        assert_eq!(response.body["current_timezone"]["timezone"], "UTC");
        assert_eq!(response.body["roles"][0]["role"], "admin");
        assert!(response.body.get("password").is_none());
    }
}

mod user_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_user_returns_resolved_view() {
        let app = setup().await;
        let view = app.create_user("alice", &[app.admin_role_id.as_str()]).await;

        let id = view["id"].as_str().unwrap();
        assert_eq!(id.len(), 24);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(view["user_name"], "alice");
        assert_eq!(view["is_active"], true);
        assert_eq!(view["current_timezone"], json!({ "id": app.utc_id, "timezone": "UTC" }));
        assert_eq!(view["roles"], json!([{ "id": app.admin_role_id, "role": "admin" }]));
        assert!(view.get("password").is_none());

        let fetched = app.send(Method::GET, &format!("/v1/users/{}", id), Some(&app.admin_token), None).await;
        assert_eq!(fetched.status, StatusCode::OK);
        assert_eq!(fetched.body, view);

        let token = app.login("alice", "alice-password").await;
        assert!(!token.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_user_name_conflicts() {
        let app = setup().await;
        app.create_user("alice", &[]).await;

        let response = app
            .send(
                Method::POST,
                "/v1/users",
                Some(&app.admin_token),
                Some(json!({
                    "user_name": "alice",
                    "password": "other",
                    "current_timezone": app.utc_id,
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CONFLICT);
        assert_eq!(response.body["error"], "DUPLICATE");
    }

    #[tokio::test]
    async fn test_unknown_timezone_rejected() {
        let app = setup().await;
        let response = app
            .send(
                Method::POST,
                "/v1/users",
                Some(&app.admin_token),
                Some(json!({
                    "user_name": "bob",
                    "password": "secret",
                    "current_timezone": IdGenerator::generate(),
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);

        let users = app.send(Method::GET, "/v1/users", Some(&app.admin_token), None).await;
        assert_eq!(users.body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let app = setup().await;
        let uri = format!("/v1/users/{}", IdGenerator::generate());
        let response = app.send(Method::GET, &uri, Some(&app.admin_token), None).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body["error"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_non_admin_can_read_but_not_write() {
        let app = setup().await;
        let viewer_role = app.create_role("viewer").await;
        app.create_user("vera", &[viewer_role.as_str()]).await;
        let token = app.login("vera", "vera-password").await;

        let list = app.send(Method::GET, "/v1/users", Some(&token), None).await;
        assert_eq!(list.status, StatusCode::OK);
        assert_eq!(list.body.as_array().unwrap().len(), 2);

        let create = app
            .send(
                Method::POST,
                "/v1/users",
                Some(&token),
                Some(json!({
                    "user_name": "mallory",
                    "password": "secret",
                    "current_timezone": app.utc_id,
                })),
            )
            .await;
        assert_eq!(create.status, StatusCode::FORBIDDEN);

        let role = app
            .send(Method::POST, "/v1/user_roles", Some(&token), Some(json!({ "role": "sneaky" })))
            .await;
        assert_eq!(role.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_non_admin_cannot_update_delete_or_read_history() {
        let app = setup().await;
        let viewer_role = app.create_role("viewer").await;
        let vera = app.create_user("vera", &[viewer_role.as_str()]).await;
        let target = app.create_user("alice", &[]).await;

        let login = app.login_response("vera", "vera-password").await;
        assert_eq!(login.body["is_admin"], false);
        let token = login.body["access_token"].as_str().unwrap().to_string();

        let uri = format!("/v1/users/{}", target["id"].as_str().unwrap());
        let update = app
            .send(
                Method::PUT,
                &uri,
                Some(&token),
                Some(json!({
                    "user_name": "alice",
                    "is_active": true,
                    "current_timezone": app.utc_id,
                    "roles": [app.admin_role_id],
                })),
            )
            .await;
        assert_eq!(update.status, StatusCode::FORBIDDEN);
        assert_eq!(update.body["error"], "FORBIDDEN");

        let delete = app.send(Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(delete.status, StatusCode::FORBIDDEN);

        for suffix in ["role-history", "status-history"] {
            let own = format!("/v1/users/{}/{}", vera["id"].as_str().unwrap(), suffix);
            let response = app.send(Method::GET, &own, Some(&token), None).await;
            assert_eq!(response.status, StatusCode::FORBIDDEN, "{}", suffix);
        }

        let unchanged = app.send(Method::GET, &uri, Some(&app.admin_token), None).await;
        assert_eq!(unchanged.body["roles"], json!([]));
        assert_eq!(unchanged.body["is_active"], true);
        assert_eq!(app.audit.role_change_count().await, 0);
    }

    #[tokio::test]
    async fn test_update_records_role_history_once() {
        let app = setup().await;
        let editor = app.create_role("editor").await;
        let view = app.create_user("alice", &[]).await;
        let id = view["id"].as_str().unwrap().to_string();
        let uri = format!("/v1/users/{}", id);
        let body = json!({
            "id": id,
            "user_name": "alice",
            "is_active": true,
            "current_timezone": app.utc_id,
            "roles": [editor],
        });

        let first = app.send(Method::PUT, &uri, Some(&app.admin_token), Some(body.clone())).await;
        assert_eq!(first.status, StatusCode::OK);
        assert_eq!(first.body["roles"][0]["role"], "editor");

        let second = app.send(Method::PUT, &uri, Some(&app.admin_token), Some(body)).await;
        assert_eq!(second.status, StatusCode::OK);

        let history = app
            .send(Method::GET, &format!("{}/role-history", uri), Some(&app.admin_token), None)
            .await;
        assert_eq!(history.status, StatusCode::OK);
        let records = history.body.as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["previous_roles"], json!([]));
        assert_eq!(records[0]["new_roles"], json!([editor]));
        assert_eq!(records[0]["user_id"], id);
    }

    #[tokio::test]
    async fn test_update_aborts_when_audit_write_fails() {
        let app = setup().await;
        let editor = app.create_role("editor").await;
        let view = app.create_user("alice", &[]).await;
        let uri = format!("/v1/users/{}", view["id"].as_str().unwrap());

        app.audit.set_fail_writes(true);
        let response = app
            .send(
                Method::PUT,
                &uri,
                Some(&app.admin_token),
                Some(json!({
                    "user_name": "alice",
                    "is_active": true,
                    "current_timezone": app.utc_id,
                    "roles": [editor],
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["error"], "AUDIT_WRITE_FAILED");

        app.audit.set_fail_writes(false);
        let fetched = app.send(Method::GET, &uri, Some(&app.admin_token), None).await;
        assert_eq!(fetched.body["roles"], json!([]));
    }

    #[tokio::test]
    async fn test_update_cannot_toggle_active_flag() {
        let app = setup().await;
        let view = app.create_user("alice", &[]).await;
        let uri = format!("/v1/users/{}", view["id"].as_str().unwrap());
        let body = |is_active: bool| {
            json!({
                "user_name": "alice",
                "is_active": is_active,
                "current_timezone": app.utc_id,
                "roles": [],
            })
        };

        let deactivate = app.send(Method::PUT, &uri, Some(&app.admin_token), Some(body(false))).await;
        assert_eq!(deactivate.status, StatusCode::BAD_REQUEST);
        assert_eq!(deactivate.body["error"], "VALIDATION_ERROR");
        let fetched = app.send(Method::GET, &uri, Some(&app.admin_token), None).await;
        assert_eq!(fetched.body["is_active"], true);

        let deleted = app.send(Method::DELETE, &uri, Some(&app.admin_token), None).await;
        assert_eq!(deleted.status, StatusCode::OK);

        let reactivate = app.send(Method::PUT, &uri, Some(&app.admin_token), Some(body(true))).await;
        assert_eq!(reactivate.status, StatusCode::BAD_REQUEST);
        let fetched = app.send(Method::GET, &uri, Some(&app.admin_token), None).await;
        assert_eq!(fetched.body["is_active"], false);
        assert_eq!(app.audit.status_change_count().await, 1);

        let login = app.login_response("alice", "alice-password").await;
        assert_eq!(login.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_update_with_mismatched_body_id_rejected() {
        let app = setup().await;
        let view = app.create_user("alice", &[]).await;
        let uri = format!("/v1/users/{}", view["id"].as_str().unwrap());

        let response = app
            .send(
                Method::PUT,
                &uri,
                Some(&app.admin_token),
                Some(json!({
                    "id": IdGenerator::generate(),
                    "user_name": "alice",
                    "is_active": true,
                    "current_timezone": app.utc_id,
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_deactivate_flow() {
        let app = setup().await;
        let view = app.create_user("alice", &[]).await;
        let id = view["id"].as_str().unwrap().to_string();
        let uri = format!("/v1/users/{}", id);

        let first = app.send(Method::DELETE, &uri, Some(&app.admin_token), None).await;
        assert_eq!(first.status, StatusCode::OK);
        assert_eq!(first.body["is_active"], false);

        let second = app.send(Method::DELETE, &uri, Some(&app.admin_token), None).await;
        assert_eq!(second.status, StatusCode::BAD_REQUEST);
        assert_eq!(second.body["error"], "VALIDATION_ERROR");

        let history = app
            .send(Method::GET, &format!("{}/status-history", uri), Some(&app.admin_token), None)
            .await;
        let records = history.body.as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["is_active"], false);
        assert_eq!(app.audit.status_change_count().await, 1);

        let login = app.login_response("alice", "alice-password").await;
        assert_eq!(login.status, StatusCode::UNAUTHORIZED);

        // Soft delete keeps the user readable
        let fetched = app.send(Method::GET, &uri, Some(&app.admin_token), None).await;
        assert_eq!(fetched.status, StatusCode::OK);
    }
}

mod registry_tests {
    use super::*;

    #[tokio::test]
    async fn test_role_list_is_capped() {
        let app = setup().await;
        for i in 0..24 {
            app.create_role(&format!("role-{:02}", i)).await;
        }

        let response = app.send(Method::GET, "/v1/user_roles", Some(&app.admin_token), None).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body.as_array().unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_duplicate_role_conflicts() {
        let app = setup().await;
        let response = app
            .send(Method::POST, "/v1/user_roles", Some(&app.admin_token), Some(json!({ "role": "admin" })))
            .await;
        assert_eq!(response.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_timezone_create_and_get() {
        let app = setup().await;
        let created = app
            .send(
                Method::POST,
                "/v1/timezones",
                Some(&app.admin_token),
                Some(json!({ "timezone": "Europe/Berlin" })),
            )
            .await;
        assert_eq!(created.status, StatusCode::CREATED);

        let id = created.body["id"].as_str().unwrap();
        let fetched = app
            .send(Method::GET, &format!("/v1/timezones/{}", id), Some(&app.admin_token), None)
            .await;
        assert_eq!(fetched.status, StatusCode::OK);
        assert_eq!(fetched.body["timezone"], "Europe/Berlin");

        let all = app.send(Method::GET, "/v1/timezones", Some(&app.admin_token), None).await;
        assert_eq!(all.body.as_array().unwrap().len(), 2);
    }
}
