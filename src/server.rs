use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::warn;
use warp::hyper::body::Bytes;
use warp::Filter;

use crate::router::{Reply, Router};
use crate::signature::{self, SIGNATURE_HEADER, TIMESTAMP_HEADER};

/// Slack never sends bodies anywhere near this size.
pub const MAX_BODY_BYTES: u64 = 64 * 1024;

pub struct State {
    pub router: Router,
    pub signing_secret: SecretString,
}

pub fn routes(
    state: Arc<State>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let health = warp::get()
        .and(warp::path("health"))
        .and(warp::path::end())
        .map(|| "ok");

    let slack = warp::post()
        .and(warp::path("slack"))
        .and(warp::path::end())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::header::optional::<String>(SIGNATURE_HEADER))
        .and(warp::header::optional::<String>(TIMESTAMP_HEADER))
        .and(warp::body::bytes())
        .and_then(move |signature, timestamp, body| {
            handle_webhook(state.clone(), signature, timestamp, body)
        });

    health.or(slack)
}

async fn handle_webhook(
    state: Arc<State>,
    signature: Option<String>,
    timestamp: Option<String>,
    body: Bytes,
) -> Result<warp::reply::WithStatus<String>, Infallible> {
    let reply = match authenticate(&state, signature, timestamp, &body) {
        Some(raw_body) => state.router.handle(raw_body).await,
        None => {
            warn!("rejecting request with a bad or stale signature");
            Reply::bad_request("Invalid request")
        }
    };
    Ok(warp::reply::with_status(reply.body, reply.status))
}

fn authenticate<'a>(
    state: &State,
    signature: Option<String>,
    timestamp: Option<String>,
    body: &'a [u8],
) -> Option<&'a str> {
    let raw_body = std::str::from_utf8(body).ok()?;
    let valid = signature::verify(
        raw_body,
        &signature?,
        &timestamp?,
        state.signing_secret.expose_secret().as_bytes(),
        Utc::now().timestamp(),
    );
    valid.then_some(raw_body)
}
