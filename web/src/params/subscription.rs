use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine,
};
use domain::error::Error as DomainError;
use domain::subscription::NewSubscription;
use serde::Deserialize;
use utoipa::ToSchema;

/// A browser `PushSubscription`. The keys are base64 encoded; both the standard
/// alphabet and the unpadded URL-safe one that browsers emit are accepted.
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct SubscriptionParams {
    pub endpoint: String,
    #[schema(format = Byte)]
    pub p256dh: String,
    #[schema(format = Byte)]
    pub auth: String,
}

impl TryFrom<SubscriptionParams> for NewSubscription {
    type Error = DomainError;

    fn try_from(params: SubscriptionParams) -> Result<Self, Self::Error> {
        Ok(NewSubscription {
            p256dh: decode_key("p256dh", &params.p256dh)?,
            auth: decode_key("auth", &params.auth)?,
            endpoint: params.endpoint,
        })
    }
}

fn decode_key(field: &str, encoded: &str) -> Result<Vec<u8>, DomainError> {
    STANDARD
        .decode(encoded)
        .or_else(|_| URL_SAFE_NO_PAD.decode(encoded))
        .map_err(|_| DomainError::invalid(format!("{field} is not valid base64")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(p256dh: &str, auth: &str) -> SubscriptionParams {
        SubscriptionParams {
            endpoint: "https://push.example/a".to_string(),
            p256dh: p256dh.to_string(),
            auth: auth.to_string(),
        }
    }

    #[test]
    fn standard_and_url_safe_keys_decode_to_the_same_bytes() {
        let standard = NewSubscription::try_from(params("+/+/AQ==", "AAE=")).unwrap();
        let url_safe = NewSubscription::try_from(params("-_-_AQ", "AAE")).unwrap();

        assert_eq!(standard.p256dh, vec![0xfb, 0xff, 0xbf, 0x01]);
        assert_eq!(standard.p256dh, url_safe.p256dh);
        assert_eq!(standard.auth, url_safe.auth);
    }

    #[test]
    fn invalid_base64_is_rejected() {
        let Err(err) = NewSubscription::try_from(params("not base64!", "AAE=")) else {
            panic!("expected invalid base64 to be rejected");
        };
        assert!(err.to_string().contains("p256dh"));
    }
}
