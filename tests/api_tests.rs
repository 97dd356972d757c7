mod common;

use common::{TestContext, test_context};
use item_vault::{
    bootstrap_superuser,
    config::SuperuserSeed,
    create_router,
    models::{Item, UserRead},
};
use tokio::net::TcpListener;

pub struct TestApp {
    pub address: String,
    pub ctx: TestContext,
}

async fn spawn_app() -> TestApp {
    let ctx = test_context().await;
    let router = create_router(ctx.state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address, ctx }
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap()
}

async fn login(client: &reqwest::Client, app: &TestApp, email: &str, password: &str) -> reqwest::StatusCode {
    client
        .post(format!("{}/auth/jwt/login", app.address))
        .form(&[("username", email), ("password", password)])
        .send()
        .await
        .expect("login request failed")
        .status()
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let response = client()
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_register_login_me_logout() {
    let app = spawn_app().await;
    let client = client();

    let response = client
        .post(format!("{}/auth/register", app.address))
        .json(&serde_json::json!({"email": "Pat@Example.com", "password": "correct-horse"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let registered: UserRead = response.json().await.unwrap();
    assert_eq!(registered.email, "pat@example.com");
    assert!(registered.is_active && !registered.is_verified && !registered.is_superuser);

    // No cookie yet.
    let me = client
        .get(format!("{}/users/me", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(me.status(), 401);

    assert_eq!(login(&client, &app, "pat@example.com", "wrong").await, 400);
    assert_eq!(login(&client, &app, "pat@example.com", "correct-horse").await, 204);

    let me: UserRead = client
        .get(format!("{}/users/me", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me.id, registered.id);

    // Registered accounts start unverified.
    let create = client
        .post(format!("{}/items/", app.address))
        .json(&serde_json::json!({"item_name": "Lamp", "price": 12.5, "phone": "n/a"}))
        .send()
        .await
        .unwrap();
    assert_eq!(create.status(), 403);

    let logout = client
        .post(format!("{}/auth/jwt/logout", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(logout.status(), 204);

    let me = client
        .get(format!("{}/users/me", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(me.status(), 401);
}

#[tokio::test]
async fn test_duplicate_and_invalid_registration() {
    let app = spawn_app().await;
    let client = client();
    let register = |body: serde_json::Value| {
        client
            .post(format!("{}/auth/register", app.address))
            .json(&body)
            .send()
    };

    let first = register(serde_json::json!({"email": "dup@example.com", "password": "secret"}))
        .await
        .unwrap();
    assert_eq!(first.status(), 201);

    let again = register(serde_json::json!({"email": "DUP@example.com", "password": "secret"}))
        .await
        .unwrap();
    assert_eq!(again.status(), 400);
    let body: serde_json::Value = again.json().await.unwrap();
    assert_eq!(body["detail"], "REGISTER_USER_ALREADY_EXISTS");

    let bad_email = register(serde_json::json!({"email": "nope", "password": "secret"}))
        .await
        .unwrap();
    assert_eq!(bad_email.status(), 422);

    let short = register(serde_json::json!({"email": "s@example.com", "password": "ab"}))
        .await
        .unwrap();
    assert_eq!(short.status(), 422);
}

#[tokio::test]
async fn test_bootstrapped_superuser_full_lifecycle() {
    let app = spawn_app().await;
    let seed = SuperuserSeed {
        email: "root@example.com".to_string(),
        password: "root-password".to_string(),
    };
    assert!(bootstrap_superuser(&app.ctx.state, &seed).await.unwrap());
    // Second call finds the account and does nothing.
    assert!(!bootstrap_superuser(&app.ctx.state, &seed).await.unwrap());

    let client = client();
    assert_eq!(login(&client, &app, &seed.email, &seed.password).await, 204);

    let created: Item = client
        .post(format!("{}/items/", app.address))
        .json(&serde_json::json!({"item_name": "Widget", "price": 9.99, "phone": "555-0100"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(created.id, 1);

    let deleted = client
        .delete(format!("{}/items/{}", app.address, created.id))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), 200);

    let items: Vec<Item> = client
        .get(format!("{}/items", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn test_inactive_user_cannot_log_in() {
    let app = spawn_app().await;
    let user = app
        .ctx
        .state
        .identity
        .register("idle@example.com", "password", true, false)
        .await
        .unwrap();
    app.ctx
        .state
        .repo
        .update_user_flags(
            user.id,
            item_vault::models::UpdateUserRequest {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(login(&client(), &app, "idle@example.com", "password").await, 400);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = spawn_app().await;
    let doc: serde_json::Value = client()
        .get(format!("{}/api-docs/openapi.json", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(doc["paths"]["/items/{id}"]["delete"].is_object());
    assert!(doc["paths"]["/items/"]["post"].is_object());
}
