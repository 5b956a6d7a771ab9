use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, error, instrument};
use url::Url;

use super::{encode_post_data, parse_response, Gateway, GatewayError, GatewayResponse, PostData};
use crate::config::GatewayConfig;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// [`Gateway`] posting to the configured NVP endpoint.
#[derive(Clone)]
pub struct HttpGateway {
    http_client: Client,
    api_url: Url,
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| GatewayError::Transport(format!("Could not build client: {}", e)))?;

        Ok(Self {
            http_client,
            api_url: config.api_url.clone(),
        })
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    #[instrument(
        name = "gateway::send",
        skip_all,
        fields(method = post_data.get("METHOD").map(String::as_str).unwrap_or("unknown"))
    )]
    async fn send(&self, post_data: &PostData) -> Result<GatewayResponse, GatewayError> {
        let body = encode_post_data(post_data)?;

        let resp = self
            .http_client
            .post(self.api_url.clone())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| transport_error("Request failed", e))?;

        if !resp.status().is_success() {
            error!(status = %resp.status(), "Gateway answered with an error status");
            return Err(GatewayError::Transport(format!(
                "Gateway answered with {}",
                resp.status()
            )));
        }

        let text = resp
            .text()
            .await
            .map_err(|e| transport_error("Could not read response", e))?;

        let parsed = parse_response(&text);
        debug!(fields = parsed.len(), ack = ?parsed.ack(), "Gateway response parsed");
        Ok(parsed)
    }
}

fn transport_error(context: &str, err: reqwest::Error) -> GatewayError {
    error!(error = %err, "{}", context);
    GatewayError::Transport(format!("{}: {}", context, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use wiremock::matchers::{body_string_contains, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(api_url: &str) -> GatewayConfig {
        GatewayConfig {
            api_url: Url::parse(api_url).unwrap(),
            login_url: "https://login.example.com/?token=".to_string(),
            hostname: Url::parse("https://shop.example.com").unwrap(),
            defaults: BTreeMap::new(),
            timeout: None,
        }
    }

    fn post_data() -> PostData {
        let mut post_data = PostData::new();
        post_data.insert("METHOD".to_string(), "GetExpressCheckoutDetails".to_string());
        post_data.insert("TOKEN".to_string(), "EC-1".to_string());
        post_data
    }

    #[tokio::test]
    async fn test_send_posts_form_and_parses_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("content-type", FORM_CONTENT_TYPE))
            .and(body_string_contains("METHOD=GetExpressCheckoutDetails"))
            .and(body_string_contains("TOKEN=EC-1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("ACK=Success&TOKEN=EC-1&EMAIL=buyer%40example.com"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let gateway = HttpGateway::new(&config_for(&format!("{}/nvp", server.uri()))).unwrap();
        let response = gateway.call(&post_data()).await.unwrap();

        assert_eq!(response.first("TOKEN"), Some("EC-1"));
        assert_eq!(response.first("EMAIL"), Some("buyer@example.com"));
    }

    #[tokio::test]
    async fn test_failure_ack_is_reported_as_gateway_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("ACK=Failure&L_LONGMESSAGE0=Invalid+token"),
            )
            .mount(&server)
            .await;

        let gateway = HttpGateway::new(&config_for(&server.uri())).unwrap();
        let err = gateway.call(&post_data()).await.unwrap_err();

        assert!(matches!(err, GatewayError::Failure(_)));
        assert_eq!(err.to_string(), "Invalid token");
    }

    #[tokio::test]
    async fn test_error_status_is_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let gateway = HttpGateway::new(&config_for(&server.uri())).unwrap();
        let err = gateway.send(&post_data()).await.unwrap_err();

        assert!(matches!(err, GatewayError::Transport(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_a_transport_error() {
        // Nothing listens on port 9 on the loopback interface
        let gateway = HttpGateway::new(&config_for("http://127.0.0.1:9/nvp")).unwrap();
        let err = gateway.send(&post_data()).await.unwrap_err();

        assert!(matches!(err, GatewayError::Transport(_)));
    }
}
