//! Authenticated API client.

use std::sync::Arc;

use serde_json::Value;

use crewgate_identity::AccessToken;

use crate::settings::ApiSettings;
use crate::transport::{ApiRequest, HttpTransport, Method, ReqwestTransport, TransportError};

pub const USER_ID_HEADER: &str = "X-USER-ID";
pub const RESOURCE_URN_HEADER: &str = "X-RESOURCE-URN";

/// Builds requests with the shared headers and sends them.
///
/// Every request needs an [`AccessToken`], which only a
/// [`ScopeGuard`](crewgate_identity::ScopeGuard) can produce.
#[derive(Clone)]
pub struct ApiClient {
    settings: Arc<ApiSettings>,
    transport: Arc<dyn HttpTransport>,
}

impl ApiClient {
    pub fn new(settings: ApiSettings, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            settings: Arc::new(settings),
            transport,
        }
    }

    /// Client using the `reqwest` transport.
    pub fn http(settings: ApiSettings) -> Self {
        Self::new(settings, Arc::new(ReqwestTransport::new()))
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    pub async fn get(&self, token: &AccessToken, path: &str) -> Result<Value, TransportError> {
        let request = self.request(Method::Get, token, path, None);
        self.transport.send(request).await
    }

    pub async fn post(
        &self,
        token: &AccessToken,
        path: &str,
        body: Value,
    ) -> Result<Value, TransportError> {
        let request = self.request(Method::Post, token, path, Some(body));
        self.transport.send(request).await
    }

    fn request(&self, method: Method, token: &AccessToken, path: &str, body: Option<Value>) -> ApiRequest {
        let headers = vec![
            ("Authorization".to_string(), token.bearer()),
            ("Accept".to_string(), self.settings.accept.clone()),
            (USER_ID_HEADER.to_string(), self.settings.user_id.clone()),
            (RESOURCE_URN_HEADER.to_string(), self.settings.resource_urn.clone()),
        ];

        ApiRequest {
            method,
            path: path.to_string(),
            url: self.settings.url(path),
            headers,
            body,
            timeout: self.settings.timeout,
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("settings", &self.settings)
            .finish()
    }
}
