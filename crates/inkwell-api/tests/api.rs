use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use inkwell_api::{AppState, AppStateInner, router};
use inkwell_auth::TokenService;
use inkwell_db::Database;

struct TestApp {
    app: Router,
    state: AppState,
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

impl TestApp {
    fn new() -> Self {
        let db = Database::open_in_memory().expect("in-memory db");
        let tokens = TokenService::new("test-secret", Duration::hours(1));
        let state = AppStateInner::new(db, tokens);
        Self {
            app: router(state.clone()),
            state,
        }
    }

    fn token(&self, user_id: u32) -> String {
        self.state.tokens.issue(user_id).expect("token")
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let resp = self.app.clone().oneshot(req).await.expect("router call");
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    async fn call(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");
        self.send(req).await
    }

    async fn signup(&self, nickname: &str, email: &str, password: &str) -> u32 {
        let resp = self
            .call(
                "POST",
                "/users",
                None,
                Some(json!({ "nickname": nickname, "email": email, "password": password })),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "signup failed: {}", resp.body);
        resp.body["id"].as_u64().expect("numeric id") as u32
    }

    async fn create_post(&self, token: &str, title: &str, author_id: u32) -> TestResponse {
        self.call(
            "POST",
            "/posts",
            Some(token),
            Some(json!({ "title": title, "content": "some content", "author_id": author_id })),
        )
        .await
    }
}

#[tokio::test]
async fn home_says_welcome() {
    let app = TestApp::new();
    let resp = app.call("GET", "/", None, None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, json!("Welcome To This API"));
}

#[tokio::test]
async fn signup_returns_user_without_password() {
    let app = TestApp::new();
    let resp = app
        .call(
            "POST",
            "/users",
            None,
            Some(json!({ "nickname": "a", "email": "a@x.com", "password": "pw" })),
        )
        .await;

    assert_eq!(resp.status, StatusCode::CREATED);
    let id = resp.body["id"].as_u64().expect("numeric id");
    assert!(resp.body.get("password").is_none());
    assert_eq!(resp.body["nickname"], "a");
    assert_eq!(resp.headers[header::LOCATION], format!("/users/{}", id));

    let stored = app.state.db.find_user_by_id(id as u32).unwrap();
    assert_ne!(stored.password, "pw");
    assert!(stored.password.starts_with("$argon2id$"));
}

#[tokio::test]
async fn duplicate_nickname_or_email_conflicts() {
    let app = TestApp::new();
    app.signup("pet", "pet@mail.com", "password").await;

    let resp = app
        .call(
            "POST",
            "/users",
            None,
            Some(json!({ "nickname": "pet", "email": "other@mail.com", "password": "password" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.body["error"], "Nickname Already taken");

    let resp = app
        .call(
            "POST",
            "/users",
            None,
            Some(json!({ "nickname": "other", "email": "pet@mail.com", "password": "password" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.body["error"], "Email already taken");

    let list = app.call("GET", "/users", None, None).await;
    assert_eq!(list.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn signup_validation_reports_first_broken_rule() {
    let app = TestApp::new();

    let resp = app
        .call(
            "POST",
            "/users",
            None,
            Some(json!({ "email": "pet@mail.com", "password": "password" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp.body["error"], "Required Nickname");

    let resp = app
        .call(
            "POST",
            "/users",
            None,
            Some(json!({ "nickname": "pet", "email": "pet-at-mail", "password": "password" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp.body["error"], "Invalid Email");
}

#[tokio::test]
async fn signup_escapes_nickname() {
    let app = TestApp::new();
    let id = app.signup("  <b>pet</b> ", "pet@mail.com", "password").await;

    let resp = app.call("GET", &format!("/users/{}", id), None, None).await;
    assert_eq!(resp.body["nickname"], "&lt;b&gt;pet&lt;/b&gt;");
}

#[tokio::test]
async fn malformed_json_is_unprocessable() {
    let app = TestApp::new();
    let req = Request::builder()
        .method("POST")
        .uri("/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let resp = app.send(req).await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp.body["error"].is_string());
}

#[tokio::test]
async fn login_issues_a_usable_token() {
    let app = TestApp::new();
    let id = app.signup("pet", "pet@mail.com", "password").await;

    let resp = app
        .call(
            "POST",
            "/login",
            None,
            Some(json!({ "email": "pet@mail.com", "password": "password" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["user_id"], id);
    let token = resp.body["token"].as_str().unwrap().to_string();
    assert_eq!(app.state.tokens.validate(&token).unwrap(), id);

    let resp = app
        .call(
            "PUT",
            &format!("/users/{}", id),
            Some(&token),
            Some(json!({ "nickname": "peter" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["nickname"], "peter");
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = TestApp::new();
    app.signup("pet", "pet@mail.com", "password").await;

    let resp = app
        .call(
            "POST",
            "/login",
            None,
            Some(json!({ "email": "pet@mail.com", "password": "wrong" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp.body["error"], "Incorrect Password");

    let resp = app
        .call(
            "POST",
            "/login",
            None,
            Some(json!({ "email": "nobody@mail.com", "password": "password" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp.body["error"], "Incorrect Details");
}

#[tokio::test]
async fn post_lifecycle_end_to_end() {
    let app = TestApp::new();
    let author = app.signup("a", "a@x.com", "pw").await;
    let other = app.signup("b", "b@x.com", "pw").await;

    let created = app.create_post(&app.token(author), "t", author).await;
    assert_eq!(created.status, StatusCode::CREATED);
    let post_id = created.body["id"].as_u64().unwrap();
    assert_eq!(created.body["author"]["id"], author);
    assert_eq!(created.headers[header::LOCATION], format!("/posts/{}", post_id));

    let uri = format!("/posts/{}", post_id);
    let resp = app.call("DELETE", &uri, Some(&app.token(other)), None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.call("GET", &uri, None, None).await.status, StatusCode::OK);

    let resp = app.call("DELETE", &uri, Some(&app.token(author)), None).await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);
    assert_eq!(resp.headers["entity"], post_id.to_string());

    let resp = app.call("GET", &uri, None, None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body["error"], "Post not found");
}

#[tokio::test]
async fn non_author_cannot_update_post() {
    let app = TestApp::new();
    let author = app.signup("a", "a@x.com", "pw").await;
    let other = app.signup("b", "b@x.com", "pw").await;
    let post_id = app.create_post(&app.token(author), "original", author).await.body["id"]
        .as_u64()
        .unwrap();

    let uri = format!("/posts/{}", post_id);
    let resp = app
        .call(
            "PUT",
            &uri,
            Some(&app.token(other)),
            Some(json!({ "title": "hijacked", "content": "mine now" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = app
        .call(
            "PUT",
            &uri,
            Some(&app.token(author)),
            Some(json!({ "title": "hijacked", "content": "mine now", "author_id": other })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = app.call("GET", &uri, None, None).await;
    assert_eq!(resp.body["title"], "original");

    let resp = app
        .call(
            "PUT",
            &uri,
            Some(&app.token(author)),
            Some(json!({ "title": "edited", "content": "new content" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["title"], "edited");
}

#[tokio::test]
async fn create_post_checks_author_and_title() {
    let app = TestApp::new();
    let author = app.signup("a", "a@x.com", "pw").await;
    let other = app.signup("b", "b@x.com", "pw").await;

    let resp = app.create_post(&app.token(other), "t", author).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    assert_eq!(
        app.create_post(&app.token(author), "t", author).await.status,
        StatusCode::CREATED
    );
    let resp = app.create_post(&app.token(author), "t", author).await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.body["error"], "Title already taken");

    let list = app.call("GET", "/posts", None, None).await;
    assert_eq!(list.body.as_array().unwrap().len(), 1);

    let resp = app
        .call(
            "POST",
            "/posts",
            Some(&app.token(author)),
            Some(json!({ "title": "t3", "content": "c" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn updating_post_into_taken_title_conflicts() {
    let app = TestApp::new();
    let author = app.signup("a", "a@x.com", "pw").await;
    app.create_post(&app.token(author), "taken", author).await;
    let post_id = app.create_post(&app.token(author), "mine", author).await.body["id"]
        .as_u64()
        .unwrap();

    let uri = format!("/posts/{}", post_id);
    let resp = app
        .call(
            "PUT",
            &uri,
            Some(&app.token(author)),
            Some(json!({ "title": "taken", "content": "changed" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.body["error"], "Title already taken");

    let resp = app.call("GET", &uri, None, None).await;
    assert_eq!(resp.body["title"], "mine");
    assert_eq!(resp.body["content"], "some content");
}

#[tokio::test]
async fn mutations_require_a_valid_token() {
    let app = TestApp::new();
    let id = app.signup("pet", "pet@mail.com", "password").await;
    let uri = format!("/users/{}", id);

    let resp = app.call("DELETE", &uri, None, None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["error"], "Unauthorized");

    let resp = app.call("DELETE", &uri, Some("garbage"), None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let expired = app
        .state
        .tokens
        .issue_at(id, Utc::now() - Duration::hours(2))
        .unwrap();
    let resp = app.call("DELETE", &uri, Some(&expired), None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let forged = TokenService::new("other-secret", Duration::hours(1))
        .issue(id)
        .unwrap();
    let resp = app.call("DELETE", &uri, Some(&forged), None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    assert!(app.state.db.find_user_by_id(id).is_ok());
}

#[tokio::test]
async fn users_can_only_update_themselves() {
    let app = TestApp::new();
    let pet = app.signup("pet", "pet@mail.com", "password").await;
    let sam = app.signup("sam", "sam@mail.com", "password").await;

    let resp = app
        .call(
            "PUT",
            &format!("/users/{}", pet),
            Some(&app.token(sam)),
            Some(json!({ "nickname": "owned" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = app
        .call(
            "PUT",
            &format!("/users/{}", pet),
            Some(&app.token(pet)),
            Some(json!({ "email": "sam@mail.com" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.body["error"], "Email already taken");
}

#[tokio::test]
async fn password_update_is_rehashed() {
    let app = TestApp::new();
    let id = app.signup("pet", "pet@mail.com", "password").await;
    let before = app.state.db.find_user_by_id(id).unwrap().password;

    let resp = app
        .call(
            "PUT",
            &format!("/users/{}", id),
            Some(&app.token(id)),
            Some(json!({ "password": "new-password" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.get("password").is_none());

    let after = app.state.db.find_user_by_id(id).unwrap().password;
    assert_ne!(after, "new-password");
    assert_ne!(after, before);

    let resp = app
        .call(
            "POST",
            "/login",
            None,
            Some(json!({ "email": "pet@mail.com", "password": "new-password" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn deleting_user_twice_is_reported() {
    let app = TestApp::new();
    let id = app.signup("pet", "pet@mail.com", "password").await;
    let token = app.token(id);
    let uri = format!("/users/{}", id);

    let resp = app.call("DELETE", &uri, Some(&token), None).await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);
    assert_eq!(resp.headers["entity"], id.to_string());

    let resp = app.call("DELETE", &uri, Some(&token), None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body["error"], "User not found");
}

#[tokio::test]
async fn missing_rows_are_404_and_bad_ids_are_400() {
    let app = TestApp::new();

    let resp = app.call("GET", "/users/999", None, None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body["error"], "User not found");

    let resp = app.call("GET", "/posts/999", None, None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let resp = app.call("GET", "/users/abc", None, None).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.body["error"].is_string());

    let id = app.signup("pet", "pet@mail.com", "password").await;
    let resp = app
        .call("DELETE", "/posts/999", Some(&app.token(id)), None)
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}
