#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use url::Url;
use uuid::Uuid;

use express_checkout_server::checkout::Checkout;
use express_checkout_server::config::GatewayConfig;
use express_checkout_server::gateway::{Gateway, GatewayError, GatewayResponse, PostData};
use express_checkout_server::handlers::AppState;
use express_checkout_server::models::{AuthenticatedUser, Item};
use express_checkout_server::store::MemoryStore;

pub const LOGIN_URL: &str = "https://www.sandbox.paypal.com/cgi-bin/webscr?cmd=_express-checkout&token=";

/// Gateway answering from a queue of canned replies and recording every request.
#[derive(Default)]
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<GatewayResponse, GatewayError>>>,
    requests: Mutex<Vec<PostData>>,
}

impl ScriptedGateway {
    pub fn reply(&self, pairs: &[(&str, &str)]) {
        self.replies.lock().unwrap().push_back(Ok(response(pairs)));
    }

    pub fn fail_transport(&self, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(GatewayError::Transport(message.to_string())));
    }

    pub fn requests(&self) -> Vec<PostData> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> PostData {
        self.requests().pop().expect("gateway was not called")
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn send(&self, post_data: &PostData) -> Result<GatewayResponse, GatewayError> {
        self.requests.lock().unwrap().push(post_data.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::Transport("no scripted reply".to_string())))
    }
}

pub fn response(pairs: &[(&str, &str)]) -> GatewayResponse {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn gateway_config() -> GatewayConfig {
    let mut defaults = BTreeMap::new();
    defaults.insert("USER".to_string(), "merchant".to_string());
    defaults.insert("PWD".to_string(), "secret".to_string());
    defaults.insert("SIGNATURE".to_string(), "sig".to_string());
    defaults.insert("VERSION".to_string(), "91.0".to_string());

    GatewayConfig {
        api_url: Url::parse("https://api-3t.sandbox.paypal.com/nvp").unwrap(),
        login_url: LOGIN_URL.to_string(),
        hostname: Url::parse("https://shop.example.com").unwrap(),
        defaults,
        timeout: None,
    }
}

pub struct TestContext {
    pub checkout: Checkout,
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<ScriptedGateway>,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let gateway = Arc::new(ScriptedGateway::default());
        let checkout = Checkout::new(gateway.clone(), store.clone(), Arc::new(gateway_config()));
        Self {
            checkout,
            store,
            gateway,
        }
    }

    pub fn state(&self) -> AppState {
        AppState {
            checkout: self.checkout.clone(),
        }
    }
}

pub fn user() -> AuthenticatedUser {
    AuthenticatedUser { id: Uuid::new_v4() }
}

pub fn item(name: &str, cents: i64) -> Item {
    Item {
        id: None,
        name: name.to_string(),
        description: format!("{} description", name),
        value: Decimal::new(cents, 2),
    }
}
