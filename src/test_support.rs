#![cfg(test)]

// Scripted gateway for unit tests: replays canned responses and records requests.
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::App;
use crate::config::ClientConfig;
use crate::errors::TransportError;
use crate::http::{AuthOptions, HttpRequest, RequestGateway};

#[derive(Default)]
pub struct ScriptedGateway {
    responses: Mutex<VecDeque<Result<Value, TransportError>>>,
    requests: Mutex<Vec<(HttpRequest, AuthOptions)>>,
}

impl ScriptedGateway {
    pub fn requests(&self) -> Vec<(HttpRequest, AuthOptions)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl RequestGateway for ScriptedGateway {
    async fn request(
        &self,
        req: HttpRequest,
        options: &AuthOptions,
    ) -> Result<Value, TransportError> {
        self.requests.lock().push((req, options.clone()));
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::InvalidResponse("script exhausted".into())))
    }
}

pub fn test_config() -> ClientConfig {
    ClientConfig {
        server_url: "http://127.0.0.1:1".into(),
        app_id: "test-app".into(),
        app_key: "test-key".into(),
        ..Default::default()
    }
}

pub fn scripted_app(responses: Vec<Result<Value, TransportError>>) -> (App, Arc<ScriptedGateway>) {
    let gw = Arc::new(ScriptedGateway {
        responses: Mutex::new(responses.into()),
        requests: Mutex::new(Vec::new()),
    });
    (App::with_gateway(test_config(), gw.clone()), gw)
}
