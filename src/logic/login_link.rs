use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::signer::{MessageSigner, SigningError};

pub const LOGIN_PATH: &str = "/login/telegram";

/// Claims the web app receives in the `message` query parameter.
///
/// Field order is the serialization order and is part of the signed bytes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoginPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Unix epoch milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<i64>,
}

impl LoginPayload {
    pub fn to_canonical_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedLink {
    pub payload: LoginPayload,
    /// Serialized payload exactly as signed.
    pub message: String,
    pub signature: String,
    pub url: String,
}

pub struct LinkIssuer {
    signer: Arc<dyn MessageSigner>,
    frontend_origin: String,
    ttl: Option<Duration>,
}

impl LinkIssuer {
    pub fn new(
        signer: Arc<dyn MessageSigner>,
        frontend_origin: &str,
        ttl: Option<Duration>,
    ) -> Self {
        LinkIssuer {
            signer,
            frontend_origin: frontend_origin.trim_end_matches('/').to_string(),
            ttl,
        }
    }

    pub async fn issue(&self, username: Option<&str>) -> Result<SignedLink, SigningError> {
        self.issue_at(username, Utc::now()).await
    }

    pub async fn issue_at(
        &self,
        username: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<SignedLink, SigningError> {
        let expiration = self.ttl.map(|ttl| {
            let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
            now.timestamp_millis().saturating_add(ttl_ms)
        });
        let payload = LoginPayload {
            username: username.map(str::to_string),
            expiration,
        };
        let message = payload.to_canonical_string()?;
        let signature = self.signer.sign(message.as_bytes()).await?;
        let url = self.login_url(&signature, &message);

        tracing::debug!(?username, ?expiration, "Issued login link");
        Ok(SignedLink {
            payload,
            message,
            signature,
            url,
        })
    }

    fn login_url(&self, signature: &str, message: &str) -> String {
        format!(
            "{}{}?signature={}&message={}",
            self.frontend_origin,
            LOGIN_PATH,
            signature,
            urlencoding::encode(message)
        )
    }
}
