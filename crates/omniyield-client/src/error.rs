//! Error types for the client layer.

use omniyield_core::VaultError;
use thiserror::Error;

/// Why a wallet connection attempt failed. Terminal for that attempt; the
/// session falls back to `Disconnected`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("no wallet provider found")]
    ProviderNotFound,

    #[error("connection rejected by the user")]
    UserRejected,

    #[error("wallet connection failed: {0}")]
    Unknown(String),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("wallet is not connected")]
    NotConnected,

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Backend unreachable. Non-fatal for refreshes: the last-known-good
    /// state is retained.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
