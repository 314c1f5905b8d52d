//! WireMock stand-in for a remote aggregator

use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Mock aggregator exposing the ingestion endpoints
pub struct MockAggregator {
    pub server: MockServer,
}

impl MockAggregator {
    /// Start a server with no endpoints mounted
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn url(&self) -> url::Url {
        self.server.uri().parse().unwrap()
    }

    /// Answer every reading with the given acknowledgement
    pub async fn mock_readings(&self, success: bool) {
        Mock::given(method("POST"))
            .and(path("/rpc/readings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": success })))
            .mount(&self.server)
            .await;
    }

    /// Answer room state queries with `states`
    pub async fn mock_room_states(&self, states: Value) {
        Mock::given(method("GET"))
            .and(path("/rpc/rooms"))
            .respond_with(ResponseTemplate::new(200).set_body_json(states))
            .mount(&self.server)
            .await;
    }

    /// Fail every request with `status`
    pub async fn mock_failure(&self, status: u16) {
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Bodies of every reading received so far
    pub async fn received_readings(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.url.path() == "/rpc/readings")
            .filter_map(|request| serde_json::from_slice(&request.body).ok())
            .collect()
    }
}
