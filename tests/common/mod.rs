#![allow(dead_code)]

use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;

use mediashare_auth::configuration::{
    ApplicationSettings, JwtSettings, MediaSettings, Settings,
};
use mediashare_auth::media::LocalObjectStore;
use mediashare_auth::startup::run;
use mediashare_auth::store::InMemoryUserStore;
use reqwest::header::{HeaderMap, AUTHORIZATION, COOKIE, SET_COOKIE};
use serde_json::{json, Value};

pub const PASSWORD: &str = "Secret123";

pub struct TestApp {
    pub address: String,
    pub store: Arc<InMemoryUserStore>,
    pub media_root: PathBuf,
    pub client: reqwest::Client,
}

pub fn settings(access_token_expiry: i64) -> Settings {
    let media_root = std::env::temp_dir().join(format!("mediashare-it-{}", uuid::Uuid::new_v4()));
    Settings {
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            password_cost: 4,
        },
        database: None,
        jwt: JwtSettings {
            access_token_secret: "integration-access-secret".to_string(),
            access_token_expiry,
            refresh_token_secret: "integration-refresh-secret".to_string(),
            refresh_token_expiry: 3600,
            issuer: "mediashare-test".to_string(),
        },
        media: MediaSettings {
            root: media_root.join("objects").to_string_lossy().into_owned(),
            staging_dir: media_root.join("staging").to_string_lossy().into_owned(),
            public_url: "/media".to_string(),
            max_upload_bytes: 1024 * 1024,
        },
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(settings(900)).await
}

pub async fn spawn_app_with(settings: Settings) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let media_root = PathBuf::from(&settings.media.root);
    std::fs::create_dir_all(&media_root).expect("Failed to create media root");

    let store = Arc::new(InMemoryUserStore::new());
    let objects = Arc::new(LocalObjectStore::new(
        media_root.clone(),
        settings.media.public_url.clone(),
    ));
    let server = run(listener, store.clone(), objects, settings).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        store,
        media_root,
        client: reqwest::Client::new(),
    }
}

/// Session cookies from a response, keyed by name. Removal cookies come back as "".
pub fn session_cookies(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .filter_map(|h| h.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}

pub fn set_cookie_header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find(|h| h.starts_with(&format!("{}=", name)))
        .map(str::to_string)
}

pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub body: Value,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1/users{}", self.address, path)
    }

    pub async fn register(&self, username: &str, email: &str) -> reqwest::Response {
        self.client
            .post(&self.url("/register"))
            .json(&json!({
                "fullname": "Alice Liddell",
                "email": email,
                "username": username,
                "password": PASSWORD,
            }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn login(&self, body: Value) -> reqwest::Response {
        self.client
            .post(&self.url("/login"))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Register alice and log her in
    pub async fn alice_session(&self) -> Session {
        assert_eq!(201, self.register("alice", "alice@x.com").await.status().as_u16());
        let response = self
            .login(json!({ "username": "alice", "password": PASSWORD }))
            .await;
        assert_eq!(200, response.status().as_u16());
        let body: Value = response.json().await.expect("Failed to parse response");
        Session {
            access_token: body["data"]["accessToken"].as_str().unwrap().to_string(),
            refresh_token: body["data"]["refreshToken"].as_str().unwrap().to_string(),
            body,
        }
    }

    pub async fn get_with_bearer(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(&self.url(path))
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn refresh_with_cookie(&self, refresh_token: &str) -> reqwest::Response {
        self.client
            .post(&self.url("/refresh-token"))
            .header(COOKIE, format!("refreshToken={}", refresh_token))
            .send()
            .await
            .expect("Failed to execute request.")
    }
}
