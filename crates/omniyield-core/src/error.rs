use thiserror::Error;

/// Vault accounting errors.
///
/// Validation errors are detected before any state mutation; a failed
/// operation leaves pool and position untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("insufficient shares balance")]
    InsufficientShares,

    #[error("insufficient wallet balance (1 CSPR must be reserved for gas)")]
    InsufficientBalance,

    #[error("deposit below the {min} motes minimum")]
    DepositTooSmall { min: u64 },

    #[error("shares too few to redeem any motes at the current price")]
    WithdrawTooSmall,

    #[error("arithmetic overflow")]
    MathOverflow,

    #[error("division by zero")]
    DivisionByZero,
}

pub type Result<T> = std::result::Result<T, VaultError>;
