//! Rate Limit Middleware
//!
//! Bridges the HTTP-agnostic limiter core into axum: derives a limit key
//! from the client address, asks the limiter, and translates the decision
//! into rate-limit headers or a 429.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::handlers::AppState;
use crate::error::Error;
use crate::limiter::LimitDecision;

/// Rate-limiting middleware applied to the cache and JSON routes.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request);

    let (decision, limit) = {
        let mut limiter = state.limiter.write().await;
        (limiter.check_limit(&key), limiter.max_requests())
    };

    if !decision.allowed {
        let mut response = Error::RateLimited {
            retry_after_secs: decision.retry_after_secs.unwrap_or(1),
        }
        .into_response();
        set_rate_limit_headers(&mut response, limit, &decision);
        return response;
    }

    let mut response = next.run(request).await;
    set_rate_limit_headers(&mut response, limit, &decision);
    response
}

fn set_rate_limit_headers(response: &mut Response, limit: u32, decision: &LimitDecision) {
    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", header_value(limit as u64));
    headers.insert("X-RateLimit-Remaining", header_value(decision.remaining as u64));
    headers.insert("X-RateLimit-Reset", header_value(decision.reset_at_ms / 1000));
}

fn header_value(n: u64) -> HeaderValue {
    // Decimal digits are always a valid header value
    HeaderValue::from_str(&n.to_string()).expect("numeric header value")
}

/// Derives the limit key from the request: proxy headers first, then the
/// connection address.
fn client_key(request: &Request) -> String {
    if let Some(forwarded) = request.headers().get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(first_ip) = forwarded_str.split(',').next() {
                let first_ip = first_ip.trim();
                if !first_ip.is_empty() {
                    return first_ip.to_string();
                }
            }
        }
    }

    if let Some(real_ip) = request.headers().get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return ip_str.to_string();
        }
    }

    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}
