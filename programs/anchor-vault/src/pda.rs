//! Program-derived addresses of a user's vault.
//!
//! Both addresses are recomputable by anyone from the user's key and the
//! program id: the state from `["state", user]` and the vault from
//! `["vault", vault_state]`.

use anchor_lang::prelude::*;

use crate::constants::{STATE_SEED, VAULT_SEED};

/// Derive the `VaultState` address and its canonical bump for `user`.
pub fn find_vault_state_address(user: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[STATE_SEED, user.as_ref()], program_id)
}

/// Derive the vault address and its canonical bump from a `VaultState` address.
pub fn find_vault_address(vault_state: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[VAULT_SEED, vault_state.as_ref()], program_id)
}

/// Returns true when `seeds` (bump included) produce exactly `address`.
///
/// Seeds that land on the curve never match.
pub fn matches_derivation(address: &Pubkey, seeds: &[&[u8]], program_id: &Pubkey) -> bool {
    Pubkey::create_program_address(seeds, program_id)
        .map(|derived| derived == *address)
        .unwrap_or(false)
}
