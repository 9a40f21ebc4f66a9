use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use profile_hub::config::Config;
use profile_hub::router::{ProfileState, profile_router};

const BOUNDARY: &str = "profile-hub-test-boundary";

struct TestApp {
    app: Router,
    uploads: TempDir,
    _db: TempDir,
}

async fn spawn_app(max_bytes: usize) -> TestApp {
    let db_dir = tempfile::tempdir().expect("db tempdir");
    let uploads = tempfile::tempdir().expect("upload tempdir");

    let mut cfg = Config::default();
    cfg.basic.database_url = format!("sqlite:{}", db_dir.path().join("profile.sqlite").display());
    cfg.upload.dir = uploads.path().to_path_buf();
    cfg.upload.max_bytes = max_bytes;
    cfg.session.insecure_cookie = true;
    // Keep hashing fast; the cost factor is not under test here.
    cfg.security.bcrypt_cost = 4;

    let pool = profile_hub::db::connect(&cfg.basic.database_url)
        .await
        .expect("failed to open database");
    let state = ProfileState::new(pool, &cfg)
        .await
        .expect("failed to build state");

    TestApp {
        app: profile_router(state),
        uploads,
        _db: db_dir,
    }
}

struct Reply {
    status: StatusCode,
    cookie: Option<String>,
    body: Value,
}

async fn send(app: &Router, req: Request<Body>) -> Reply {
    let resp = app.clone().oneshot(req).await.expect("request failed");
    let status = resp.status();
    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string);
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body was not json")
    };
    Reply {
        status,
        cookie,
        body,
    }
}

fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

fn get_profile(cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri("/profile");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("failed to build request")
}

fn image_request(cookie: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/profile/image")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::COOKIE, cookie)
        .body(Body::from(body))
        .expect("failed to build request")
}

/// Register and log in, returning the `name=value` cookie pair.
async fn sign_up_and_login(app: &Router, email: &str, nickname: &str, password: &str) -> String {
    let signup = send(
        app,
        json_request(
            "POST",
            "/auth/signup",
            None,
            json!({"email": email, "nickname": nickname, "password": password}),
        ),
    )
    .await;
    assert_eq!(signup.status, StatusCode::CREATED, "{}", signup.body);

    let login = send(
        app,
        json_request(
            "POST",
            "/auth/login",
            None,
            json!({"email": email, "password": password}),
        ),
    )
    .await;
    assert_eq!(login.status, StatusCode::OK, "{}", login.body);
    login.cookie.expect("login did not set a cookie")
}

fn uploaded_files(app: &TestApp) -> Vec<String> {
    std::fs::read_dir(app.uploads.path())
        .expect("upload dir missing")
        .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
        .collect()
}

#[tokio::test]
async fn profile_routes_require_a_live_session() {
    let t = spawn_app(1024 * 1024).await;

    let resp = send(&t.app, get_profile(None)).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["error"]["code"], "UNAUTHORIZED");

    let resp = send(&t.app, get_profile(Some("session=not-a-real-token"))).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = send(
        &t.app,
        json_request("PATCH", "/profile/nickname", None, json!({"nickname": "abcde"})),
    )
    .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn upload_then_view_profile() {
    let t = spawn_app(1024 * 1024).await;
    let cookie = sign_up_and_login(&t.app, "a@x.com", "abcde", "abc123!!").await;

    let resp = send(&t.app, get_profile(Some(&cookie))).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body["error"]["code"], "PROFILE_NOT_FOUND");

    let resp = send(
        &t.app,
        image_request(&cookie, "me.png", "image/png", b"\xff\xd8\xff\xe0jfif"),
    )
    .await;
    assert_eq!(resp.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(
        resp.body,
        json!({"message": "파일이 이미지가 아닙니다.", "statusCode": 415})
    );
    assert!(uploaded_files(&t).is_empty());

    let resp = send(
        &t.app,
        image_request(&cookie, "../../escape.jpg", "image/jpeg", b"first-image"),
    )
    .await;
    assert_eq!(
        resp.body,
        json!({"message": "프로필 이미지가 업로드되었습니다.", "statusCode": 200})
    );

    let view = send(&t.app, get_profile(Some(&cookie))).await;
    assert_eq!(view.status, StatusCode::OK);
    assert_eq!(view.body["email"], "a@x.com");
    assert_eq!(view.body["nickname"], "abcde");
    let url = view.body["imageUrl"].as_str().expect("imageUrl").to_string();
    let stored = url.strip_prefix("/uploads/").expect("url prefix");
    assert!(!stored.contains('/') && !stored.contains(".."));
    assert_eq!(
        std::fs::read(t.uploads.path().join(stored)).expect("stored image"),
        b"first-image"
    );

    let resp = send(
        &t.app,
        image_request(&cookie, "me.jpg", "image/jpeg", b"second-image"),
    )
    .await;
    assert_eq!(
        resp.body,
        json!({"message": "프로필 이미지가 수정되었습니다.", "statusCode": 200})
    );
    let view = send(&t.app, get_profile(Some(&cookie))).await;
    assert_ne!(view.body["imageUrl"], url.as_str());
    let current = view.body["imageUrl"].as_str().expect("imageUrl");
    let current = current.strip_prefix("/uploads/").expect("url prefix");
    // The replaced image is deleted, so only the current one stays on disk.
    assert_eq!(uploaded_files(&t), vec![current.to_string()]);
    assert!(!t.uploads.path().join(stored).exists());
}

#[tokio::test]
async fn out_of_range_session_ttl_is_rejected_at_startup() {
    let db_dir = tempfile::tempdir().expect("db tempdir");
    let uploads = tempfile::tempdir().expect("upload tempdir");

    for ttl_hours in [i64::MAX, 0] {
        let mut cfg = Config::default();
        cfg.basic.database_url =
            format!("sqlite:{}", db_dir.path().join("profile.sqlite").display());
        cfg.upload.dir = uploads.path().to_path_buf();
        cfg.session.ttl_hours = ttl_hours;

        let pool = profile_hub::db::connect(&cfg.basic.database_url)
            .await
            .expect("failed to open database");
        let err = ProfileState::new(pool, &cfg)
            .await
            .err()
            .expect("state should not build");
        assert!(
            matches!(err, profile_hub::ProfileError::InvalidConfig(_)),
            "ttl_hours = {ttl_hours}: {err:?}"
        );
    }
}

#[tokio::test]
async fn nickname_changes_respect_format_and_uniqueness() {
    let t = spawn_app(1024 * 1024).await;
    let _other = sign_up_and_login(&t.app, "b@x.com", "taken1", "abc123!!").await;
    let cookie = sign_up_and_login(&t.app, "a@x.com", "abcde", "abc123!!").await;

    let resp = send(
        &t.app,
        json_request("PATCH", "/profile/nickname", Some(&cookie), json!({"nickname": "ab"})),
    )
    .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.body["message"],
        "닉네임은 5자 이상 10자 이하, 영문자,숫자,한글만 사용할 수 있습니다."
    );

    let resp = send(
        &t.app,
        json_request(
            "PATCH",
            "/profile/nickname",
            Some(&cookie),
            json!({"nickname": "taken1"}),
        ),
    )
    .await;
    assert_eq!(
        resp.body,
        json!({"message": "이미 존재하는 닉네임입니다.", "statusCode": 400})
    );

    let resp = send(
        &t.app,
        json_request(
            "PATCH",
            "/profile/nickname",
            Some(&cookie),
            json!({"nickname": "새이름abc"}),
        ),
    )
    .await;
    assert_eq!(
        resp.body,
        json!({"message": "닉네임이 수정되었습니다.", "statusCode": 200})
    );

    send(
        &t.app,
        image_request(&cookie, "me.jpg", "image/jpeg", b"img"),
    )
    .await;
    let view = send(&t.app, get_profile(Some(&cookie))).await;
    assert_eq!(view.body["nickname"], "새이름abc");
}

#[tokio::test]
async fn password_change_then_relogin() {
    let t = spawn_app(1024 * 1024).await;
    let cookie = sign_up_and_login(&t.app, "a@x.com", "abcde", "abc123!!").await;

    let resp = send(
        &t.app,
        json_request(
            "PATCH",
            "/profile/password",
            Some(&cookie),
            json!({"password": "wrong123!!", "newPassword": "next123!!"}),
        ),
    )
    .await;
    assert_eq!(
        resp.body,
        json!({"message": "기존 비밀번호가 틀렸습니다.", "statusCode": 400})
    );

    let resp = send(
        &t.app,
        json_request(
            "PATCH",
            "/profile/password",
            Some(&cookie),
            json!({"password": "abc123!!", "newPassword": "weak"}),
        ),
    )
    .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = send(
        &t.app,
        json_request(
            "PATCH",
            "/profile/password",
            Some(&cookie),
            json!({"password": "abc123!!", "newPassword": "next123!!"}),
        ),
    )
    .await;
    assert_eq!(
        resp.body,
        json!({"message": "패스워드가 수정되었습니다.", "statusCode": 200})
    );

    let old = send(
        &t.app,
        json_request(
            "POST",
            "/auth/login",
            None,
            json!({"email": "a@x.com", "password": "abc123!!"}),
        ),
    )
    .await;
    assert_eq!(old.status, StatusCode::UNAUTHORIZED);

    let new = send(
        &t.app,
        json_request(
            "POST",
            "/auth/login",
            None,
            json!({"email": "a@x.com", "password": "next123!!"}),
        ),
    )
    .await;
    assert_eq!(new.status, StatusCode::OK);
}

#[tokio::test]
async fn logout_revokes_the_session() {
    let t = spawn_app(1024 * 1024).await;
    let cookie = sign_up_and_login(&t.app, "a@x.com", "abcde", "abc123!!").await;

    let resp = send(
        &t.app,
        Request::builder()
            .method("POST")
            .uri("/auth/logout")
            .header(header::COOKIE, &cookie)
            .body(Body::empty())
            .expect("failed to build request"),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);

    let resp = send(&t.app, get_profile(Some(&cookie))).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn oversized_upload_returns_413_and_writes_nothing() {
    let t = spawn_app(1024).await;
    let cookie = sign_up_and_login(&t.app, "a@x.com", "abcde", "abc123!!").await;

    let big = vec![0xffu8; 8 * 1024];
    let resp = send(&t.app, image_request(&cookie, "big.jpg", "image/jpeg", &big)).await;
    assert_eq!(resp.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(uploaded_files(&t).is_empty());

    let resp = send(&t.app, get_profile(Some(&cookie))).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}
