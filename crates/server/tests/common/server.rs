//! Server test utilities.

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use hshare_core::{AppConfig, Secret};
use hshare_server::{AppState, create_router};
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

/// Secret used by every test server.
pub const TEST_SECRET: &str = "t0p-s3cr3t";

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    pub temp_dir: TempDir,
}

/// A collected response.
#[allow(dead_code)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

#[allow(dead_code)]
impl TestResponse {
    /// Header value as a string, panicking when absent.
    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .unwrap_or_else(|| panic!("missing header {name}"))
            .to_str()
            .unwrap()
    }

    /// Body as UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).unwrap()
    }
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server with an empty registry.
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create a test server with custom config modifications.
    pub fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

        let mut config = AppConfig::for_testing();
        modifier(&mut config);

        let state = AppState::new(config, Secret::from_string(TEST_SECRET));
        let router = create_router(state.clone());

        Self {
            router,
            state,
            temp_dir,
        }
    }

    /// Write a file into the temp directory and share it under its file name.
    pub fn share(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.write_file(name, contents);
        self.state.registry.put(name, path.clone());
        path
    }

    /// Write a file into the temp directory without sharing it.
    pub fn write_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, contents).expect("Failed to write test file");
        path
    }

    /// Path of the share root.
    pub fn root(&self) -> String {
        format!("/{TEST_SECRET}/")
    }

    /// Issue a request and collect the full response.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::empty()).unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// GET with optional headers.
    pub async fn get(&self, uri: &str, headers: &[(&str, &str)]) -> TestResponse {
        self.request(Method::GET, uri, headers).await
    }

    /// HEAD with optional headers.
    pub async fn head(&self, uri: &str, headers: &[(&str, &str)]) -> TestResponse {
        self.request(Method::HEAD, uri, headers).await
    }
}
