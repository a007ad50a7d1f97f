use thiserror::Error;

/// Failure kinds for a provisioning call. Every variant is fatal to the
/// call: the staged settlement batch is dropped and nothing is applied.
/// Retrying with adjusted parameters is the caller's responsibility.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("invalid width {width}: {reason}")]
    InvalidWidth { width: i64, reason: &'static str },

    #[error("current tick {tick} outside provision range [{lower}, {upper})")]
    RangeOutOfCurrentPrice { tick: i32, lower: i32, upper: i32 },

    #[error("swap failed: {0}")]
    SwapFailed(String),

    #[error("mint failed: {0}")]
    MintFailed(String),

    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("pool unavailable: {0}")]
    PoolUnavailable(String),
}

impl ProvisionError {
    /// Stable machine-readable name, used by the web DTOs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProvisionError::InvalidWidth { .. } => "INVALID_WIDTH",
            ProvisionError::RangeOutOfCurrentPrice { .. } => "RANGE_OUT_OF_CURRENT_PRICE",
            ProvisionError::SwapFailed(_) => "SWAP_FAILED",
            ProvisionError::MintFailed(_) => "MINT_FAILED",
            ProvisionError::InsufficientFunds(_) => "INSUFFICIENT_FUNDS",
            ProvisionError::PoolUnavailable(_) => "POOL_UNAVAILABLE",
        }
    }
}
