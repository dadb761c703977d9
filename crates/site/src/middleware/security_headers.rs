//! Security headers middleware.
//!
//! Applied to every response of both servers:
//! - `X-Frame-Options: DENY`
//! - `X-Content-Type-Options: nosniff`
//! - `Referrer-Policy: same-origin` (the tracker reads internal referers)
//! - `Content-Security-Policy` (below)
//! - `Permissions-Policy` denying device features
//! - `Cross-Origin-Opener-Policy` / `Cross-Origin-Resource-Policy: same-origin`
//!
//! ```text
//! default-src 'none';
//! script-src 'self';
//! style-src 'self';
//! img-src 'self' data:;
//! connect-src 'self';
//! object-src 'none';
//! base-uri 'self';
//! form-action 'self';
//! frame-ancestors 'none'
//! ```

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{
            CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

const CSP: &str = "default-src 'none'; \
                   script-src 'self'; \
                   style-src 'self'; \
                   img-src 'self' data:; \
                   connect-src 'self'; \
                   object-src 'none'; \
                   base-uri 'self'; \
                   form-action 'self'; \
                   frame-ancestors 'none'";

const PERMISSIONS_POLICY: &str = "camera=(), \
                                  geolocation=(), \
                                  microphone=(), \
                                  payment=(), \
                                  usb=(), \
                                  interest-cohort=()";

/// Add security headers to all responses.
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("same-origin"));
    headers.insert(CONTENT_SECURITY_POLICY, HeaderValue::from_static(CSP));
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(PERMISSIONS_POLICY),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("same-origin"),
    );

    response
}
