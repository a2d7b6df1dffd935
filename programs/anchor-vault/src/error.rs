use anchor_lang::prelude::*;

#[error_code]
pub enum VaultError {
    #[msg("Account address does not match its seed derivation")]
    DerivationMismatch,
    #[msg("Vault is already initialized for this user")]
    AlreadyInitialized,
    #[msg("Amount must be greater than zero")]
    InvalidAmount,
    #[msg("Insufficient funds for the requested transfer")]
    InsufficientFunds,
    #[msg("Signer is not the owner of this vault")]
    Unauthorized,
    #[msg("Math operation overflow")]
    MathOverflow,
}
