//! Mock transport for testing.
//!
//! Serves canned responses by method and path and captures every request,
//! so tests can check headers, bodies and call order without a network.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::transport::{ApiRequest, HttpTransport, Method, TransportError};

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Mock transport for testing.
///
/// Unrouted requests fail with a 404 transport error.
#[derive(Clone, Default)]
pub struct MockTransport {
    routes: Arc<RwLock<HashMap<(Method, String), Result<Value, TransportError>>>>,
    captured: Arc<RwLock<Vec<CapturedRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to `method path` with a JSON body.
    pub fn respond(self, method: Method, path: impl Into<String>, body: Value) -> Self {
        self.routes.write().insert((method, path.into()), Ok(body));
        self
    }

    /// Fail `method path` with an HTTP status.
    pub fn fail(self, method: Method, path: impl Into<String>, status: u16) -> Self {
        let path = path.into();
        let error = TransportError::status(
            status,
            format!("HTTP status {} for {} {}", status, method, path),
        );
        self.routes.write().insert((method, path), Err(error));
        self
    }

    /// Fail `method path` with a connection-level error.
    pub fn fail_with(self, method: Method, path: impl Into<String>, message: impl Into<String>) -> Self {
        self.routes
            .write()
            .insert((method, path.into()), Err(TransportError::new(message)));
        self
    }

    pub fn get_calls(&self) -> Vec<CapturedRequest> {
        self.captured.read().clone()
    }

    pub fn call_count(&self) -> usize {
        self.captured.read().len()
    }

    pub fn clear_calls(&self) {
        self.captured.write().clear();
    }

    /// Paths requested, in order.
    pub fn paths(&self) -> Vec<String> {
        self.captured.read().iter().map(|c| c.path.clone()).collect()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError> {
        self.captured.write().push(CapturedRequest {
            method: request.method,
            path: request.path.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
        });

        self.routes
            .read()
            .get(&(request.method, request.path.clone()))
            .cloned()
            .unwrap_or_else(|| {
                Err(TransportError::status(
                    404,
                    format!("No mock route for {} {}", request.method, request.path),
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn request(method: Method, path: &str) -> ApiRequest {
        ApiRequest {
            method,
            path: path.to_string(),
            url: format!("http://api.test{}", path),
            headers: vec![("X-USER-ID".to_string(), "user-1".to_string())],
            body: None,
            timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn test_routes_and_unrouted_requests() {
        let transport = MockTransport::new()
            .respond(Method::Get, "/repos/o/r/pulls", json!([]))
            .fail(Method::Post, "/repos/o/r/pulls/1/reviews", 422);

        assert_eq!(transport.send(request(Method::Get, "/repos/o/r/pulls")).await.unwrap(), json!([]));

        let err = transport
            .send(request(Method::Post, "/repos/o/r/pulls/1/reviews"))
            .await
            .unwrap_err();
        assert_eq!(err.status, Some(422));

        let err = transport.send(request(Method::Get, "/repos/o/r/pulls/2")).await.unwrap_err();
        assert_eq!(err.status, Some(404));

        let calls = transport.get_calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].header("x-user-id"), Some("user-1"));
    }

    #[tokio::test]
    async fn test_clear_calls_keeps_routes() {
        let transport = MockTransport::new().respond(Method::Get, "/a", json!({"ok": true}));
        transport.send(request(Method::Get, "/a")).await.unwrap();
        assert_eq!(transport.call_count(), 1);

        transport.clear_calls();
        assert_eq!(transport.call_count(), 0);
        assert!(transport.paths().is_empty());

        transport.send(request(Method::Get, "/a")).await.unwrap();
        assert_eq!(transport.paths(), vec!["/a".to_string()]);
    }
}
