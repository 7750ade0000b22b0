use std::net::SocketAddr;

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use catalog::auth::password;
use catalog::config::{Config, RecoverConfig};
use catalog::db;
use catalog::db::users::UserFields;

pub const PASSWORD: &str = "password123";

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
}

#[allow(dead_code)]
impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Insert a user straight into the database with the given authorities.
    pub async fn create_user(&self, email: &str, authorities: &[&str]) -> i64 {
        let mut role_ids = Vec::new();
        for authority in authorities {
            let role = db::roles::find_by_authority(&self.pool, authority)
                .await
                .unwrap()
                .expect("role is seeded");
            role_ids.push(role.id);
        }

        let fields = UserFields {
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: email.to_string(),
            role_ids,
        };
        let hash = password::hash(PASSWORD).unwrap();

        let mut conn = self.pool.acquire().await.unwrap();
        let user = db::users::create(&mut *conn, &fields, &hash).await.unwrap();
        db::roles::replace_for_user(&mut conn, user.id, &fields.role_ids)
            .await
            .unwrap();
        user.id
    }

    /// Login and return the response body + status.
    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        self.post("/auth/login", None, &json!({ "email": email, "password": password }))
            .await
    }

    /// Create a user with the given authorities and return an access token.
    pub async fn token_with(&self, email: &str, authorities: &[&str]) -> String {
        self.create_user(email, authorities).await;
        let (body, status) = self.login(email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.token_with("maria@test.com", &["ROLE_OPERATOR", "ROLE_ADMIN"])
            .await
    }

    pub async fn create_category(&self, token: &str, name: &str) -> i64 {
        let (body, status) = self
            .post("/categories", Some(token), &json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create category failed: {body}");
        body["id"].as_i64().unwrap()
    }

    pub async fn create_product(
        &self,
        token: &str,
        name: &str,
        price: f64,
        category_ids: &[i64],
    ) -> i64 {
        let (body, status) = self
            .post("/products", Some(token), &product_body(name, price, category_ids))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create product failed: {body}");
        body["id"].as_i64().unwrap()
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (Value, StatusCode) {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        read(req.send().await.expect("get request failed")).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: &Value) -> (Value, StatusCode) {
        let mut req = self.client.post(self.url(path)).json(body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        read(req.send().await.expect("post request failed")).await
    }

    pub async fn put(&self, path: &str, token: Option<&str>, body: &Value) -> (Value, StatusCode) {
        let mut req = self.client.put(self.url(path)).json(body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        read(req.send().await.expect("put request failed")).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> (Value, StatusCode) {
        let mut req = self.client.delete(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        read(req.send().await.expect("delete request failed")).await
    }
}

pub fn product_body(name: &str, price: f64, category_ids: &[i64]) -> Value {
    let categories: Vec<Value> = category_ids.iter().map(|id| json!({ "id": id })).collect();
    json!({
        "name": name,
        "description": "Lorem ipsum dolor sit amet",
        "price": price,
        "imgUrl": "http://img.com/img.png",
        "date": "2020-10-20T03:00:00Z",
        "categories": categories,
    })
}

async fn read(resp: reqwest::Response) -> (Value, StatusCode) {
    let status = resp.status();
    let body: Value = resp.json().await.unwrap_or(json!(null));
    (body, status)
}

fn admin_url(base_url: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.to_string())
}

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app() -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let db_name = format!("catalog_test_{}", Uuid::now_v7().simple());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let config = Config {
        database_url: test_url,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        jwt_minutes: 60,
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        base_url: "http://localhost:0".to_string(),
        max_body_size: 1_048_576,
        cors_origins: vec![],
        log_level: "warn".to_string(),
        recover: RecoverConfig {
            token_minutes: 30,
            uri: "http://localhost:5173/recover-password/".to_string(),
        },
        smtp: None,
    };

    let (app, _state) = catalog::build_app(pool.clone(), config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        pool,
        client,
        db_name,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
