use std::str::FromStr;

use alloy_primitives::{hex, Address, Signature};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::configuration::{ConfigError, SignerSettings};

#[derive(Error, Debug)]
pub enum SigningError {
    #[error("Signer failed: {0}")]
    Signer(#[from] alloy_signer::Error),

    #[error("Failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Signer unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Malformed signature")]
    Malformed,

    #[error("Signature recovery failed: {0}")]
    Recovery(#[from] alloy_primitives::SignatureError),

    #[error("Signed by {actual}, expected {expected}")]
    WrongSigner { expected: Address, actual: Address },
}

/// Signs login payloads with the server-side key.
#[async_trait]
pub trait MessageSigner: Send + Sync {
    /// Returns the hex encoded signature over `message`.
    async fn sign(&self, message: &[u8]) -> Result<String, SigningError>;
}

/// EIP-191 `personal_sign` with a local secp256k1 key.
pub struct WalletSigner {
    signer: PrivateKeySigner,
    client_id: String,
}

impl WalletSigner {
    pub fn new(signer: PrivateKeySigner, client_id: impl Into<String>) -> Self {
        Self {
            signer,
            client_id: client_id.into(),
        }
    }

    pub fn from_private_key(key: &SecretString, client_id: &str) -> Result<Self, ConfigError> {
        let signer = PrivateKeySigner::from_str(key.expose_secret().trim())
            .map_err(|e| ConfigError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self::new(signer, client_id))
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }
}

impl TryFrom<&SignerSettings> for WalletSigner {
    type Error = ConfigError;

    fn try_from(settings: &SignerSettings) -> Result<Self, Self::Error> {
        Self::from_private_key(&settings.private_key, &settings.client_id)
    }
}

#[async_trait]
impl MessageSigner for WalletSigner {
    async fn sign(&self, message: &[u8]) -> Result<String, SigningError> {
        tracing::debug!(client_id = %self.client_id, len = message.len(), "Signing message");
        let signature = self.signer.sign_message(message).await?;
        Ok(hex::encode_prefixed(signature.as_bytes()))
    }
}

/// Recovers the address that produced `signature` over `message`.
pub fn recover_signer(message: &[u8], signature: &str) -> Result<Address, VerifyError> {
    let raw = hex::decode(signature).map_err(|_| VerifyError::Malformed)?;
    let signature = Signature::from_raw(&raw)?;
    Ok(signature.recover_address_from_msg(message)?)
}

/// Checks that `signature` over `message` was produced by `expected`.
pub fn verify(message: &[u8], signature: &str, expected: Address) -> Result<(), VerifyError> {
    let actual = recover_signer(message, signature)?;
    if actual != expected {
        return Err(VerifyError::WrongSigner { expected, actual });
    }
    Ok(())
}
