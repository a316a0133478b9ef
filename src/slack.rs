//! Slack Web API client.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, error, instrument};

use crate::block::OpenView;
use crate::error::ApiError;
use crate::message::{ApiReply, PostMessage};

/// The two chat operations this service performs.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn post_message(&self, message: &PostMessage) -> Result<(), ApiError>;

    async fn open_view(&self, view: &OpenView) -> Result<(), ApiError>;
}

#[derive(Clone)]
pub struct SlackClient {
    client: reqwest::Client,
    base: String,
}

impl std::fmt::Debug for SlackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackClient")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl SlackClient {
    pub fn new(token: &SecretString, base: impl Into<String>) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        let mut auth_value =
            header::HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))?;
        auth_value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth_value);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json; charset=utf-8"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(SlackClient {
            client,
            base: base.into().trim_end_matches('/').to_string(),
        })
    }

    async fn call<T: Serialize + ?Sized>(
        &self,
        method: &str,
        body: &T,
    ) -> Result<ApiReply, ApiError> {
        let response = self
            .client
            .post(format!("{}/{}", self.base, method))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        let reply: ApiReply = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        if !reply.ok {
            return Err(ApiError::Api(
                reply.error.unwrap_or_else(|| "unknown_error".into()),
            ));
        }
        Ok(reply)
    }
}

#[async_trait]
impl ChatApi for SlackClient {
    #[instrument(skip(self, message), fields(channel = %message.channel))]
    async fn post_message(&self, message: &PostMessage) -> Result<(), ApiError> {
        match self.call("chat.postMessage", message).await {
            Ok(_) => {
                debug!("message posted");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "chat.postMessage failed");
                Err(e)
            }
        }
    }

    #[instrument(skip(self, view), fields(callback_id = %view.view.callback_id))]
    async fn open_view(&self, view: &OpenView) -> Result<(), ApiError> {
        match self.call("views.open", view).await {
            Ok(_) => {
                debug!("modal opened");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "views.open failed");
                Err(e)
            }
        }
    }
}
