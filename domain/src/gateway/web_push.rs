use super::{DeliveryStatus, PushTransport, SenderKeys};
use crate::error::{DomainErrorKind, Error, ExternalErrorKind, InternalErrorKind};
use crate::subscriptions;
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL, Engine};
use log::*;
use reqwest::StatusCode;
use service::config::Config;
use std::time::Duration;
use web_push::{
    ContentEncoding, SubscriptionInfo, VapidSignatureBuilder, WebPushMessage,
    WebPushMessageBuilder,
};

/// Delivers pushes over HTTPS. Payload encryption (RFC 8291) and VAPID signing
/// (RFC 8292) come from `web-push`; the request itself goes out through `reqwest`.
#[derive(Clone)]
pub struct WebPushTransport {
    client: reqwest::Client,
}

impl WebPushTransport {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(Duration::from_secs(config.push_request_timeout_secs))
            .build()
            .map_err(|err| Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
            })?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PushTransport for WebPushTransport {
    async fn send(
        &self,
        payload: &[u8],
        subscription: &subscriptions::Model,
        keys: &SenderKeys,
    ) -> Result<DeliveryStatus, Error> {
        let message = build_message(payload, subscription, keys)?;

        let mut request = self
            .client
            .post(message.endpoint.to_string())
            .header("TTL", message.ttl.to_string());

        if let Some(urgency) = message.urgency {
            request = request.header("Urgency", urgency.to_string());
        }

        if let Some(topic) = message.topic {
            request = request.header("Topic", topic);
        }

        if let Some(push_payload) = message.payload {
            request = request
                .header("Content-Encoding", push_payload.content_encoding.to_str())
                .header("Content-Type", "application/octet-stream");

            for (key, value) in &push_payload.crypto_headers {
                request = request.header(*key, value.as_str());
            }

            request = request.body(push_payload.content);
        }

        let response = request.send().await.map_err(|err| {
            warn!("Push request to {} failed: {err}", subscription.endpoint);
            Error::from(err)
        })?;

        classify(response).await
    }
}

fn build_message(
    payload: &[u8],
    subscription: &subscriptions::Model,
    keys: &SenderKeys,
) -> Result<WebPushMessage, Error> {
    let subscription_info = SubscriptionInfo::new(
        subscription.endpoint.clone(),
        BASE64URL.encode(&subscription.p256dh),
        BASE64URL.encode(&subscription.auth),
    );

    let private_key = BASE64URL.encode(&keys.private_key);
    let mut signature_builder = VapidSignatureBuilder::from_base64(&private_key, &subscription_info)
        .map_err(|err| push_error("invalid server signing key", err))?;
    signature_builder.add_claim("sub", keys.subject.as_str());
    let signature = signature_builder
        .build()
        .map_err(|err| push_error("failed to sign the VAPID token", err))?;

    let mut builder = WebPushMessageBuilder::new(&subscription_info);
    builder.set_payload(ContentEncoding::Aes128Gcm, payload);
    builder.set_vapid_signature(signature);
    builder.set_ttl(keys.ttl);

    builder
        .build()
        .map_err(|err| push_error("failed to encrypt the push payload", err))
}

async fn classify(response: reqwest::Response) -> Result<DeliveryStatus, Error> {
    let status = response.status();

    match status {
        status if status.is_success() => Ok(DeliveryStatus::Delivered),
        StatusCode::NOT_FOUND | StatusCode::GONE => {
            debug!("Push endpoint answered {status}, subscription is gone");
            Ok(DeliveryStatus::Gone)
        }
        _ => {
            let body = response.text().await.unwrap_or_default();
            Err(Error {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::Other(format!(
                    "push service responded {status}: {body}"
                ))),
            })
        }
    }
}

fn push_error(context: &str, err: web_push::WebPushError) -> Error {
    Error {
        source: None,
        error_kind: DomainErrorKind::External(ExternalErrorKind::Other(format!(
            "{context}: {err}"
        ))),
    }
}
