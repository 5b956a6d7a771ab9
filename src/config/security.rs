use axum::http::{header, HeaderName, HeaderValue};
use axum::Router;
use std::env;
use tower_http::set_header::SetResponseHeaderLayer;

const NOSNIFF: &str = "nosniff";
const DENY: &str = "DENY";
const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";
const REFERRER_POLICY_VALUE: &str = "strict-origin-when-cross-origin";
const NO_STORE: &str = "no-store";

pub type HeaderLayer = SetResponseHeaderLayer<HeaderValue>;

fn header_layer(name: HeaderName, value: &'static str) -> HeaderLayer {
    SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
}

/// Stamps the security headers on every response of `router`.
pub fn with_security_headers<S>(router: Router<S>, include_hsts: bool) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let router = router
        .layer(header_layer(header::X_CONTENT_TYPE_OPTIONS, NOSNIFF))
        .layer(header_layer(header::X_FRAME_OPTIONS, DENY))
        .layer(header_layer(header::REFERRER_POLICY, REFERRER_POLICY_VALUE));

    // HSTS only makes sense behind HTTPS
    if include_hsts {
        router.layer(header_layer(header::STRICT_TRANSPORT_SECURITY, HSTS_VALUE))
    } else {
        router
    }
}

pub fn hsts_from_env() -> bool {
    let production = env::var("RUST_ENV")
        .map(|v| v.to_lowercase() == "production")
        .unwrap_or(false);

    if production {
        tracing::info!("Security: HSTS header enabled (production mode)");
    } else {
        tracing::info!("Security: HSTS header disabled (development mode)");
    }
    production
}

/// Checkout responses carry tokens in their redirect targets and must not be cached.
pub fn create_no_store_layer() -> HeaderLayer {
    header_layer(header::CACHE_CONTROL, NO_STORE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    async fn headers_for(include_hsts: bool) -> axum::http::HeaderMap {
        let app = with_security_headers(
            Router::new().route("/", get(|| async { "ok" })),
            include_hsts,
        );

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        response.headers().clone()
    }

    #[tokio::test]
    async fn test_security_headers_without_hsts() {
        let headers = headers_for(false).await;
        assert_eq!(headers.get("x-content-type-options").unwrap(), NOSNIFF);
        assert_eq!(headers.get("x-frame-options").unwrap(), DENY);
        assert_eq!(
            headers.get("referrer-policy").unwrap(),
            REFERRER_POLICY_VALUE
        );
        assert!(headers.get("strict-transport-security").is_none());
    }

    #[tokio::test]
    async fn test_security_headers_with_hsts() {
        let headers = headers_for(true).await;
        assert_eq!(headers.get("strict-transport-security").unwrap(), HSTS_VALUE);
    }
}
