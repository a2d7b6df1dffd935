use anchor_lang::prelude::*;

use crate::constants::{STATE_SEED, VAULT_SEED};
use crate::pda::matches_derivation;

#[account]
pub struct VaultState {
    /// The user who initialized the vault and may withdraw from it
    pub owner: Pubkey,
    /// Bump seed for the vault PDA
    pub vault_bump: u8,
    /// Bump seed for this account's own PDA
    pub state_bump: u8,
}

impl VaultState {
    pub const LEN: usize = 8 + // discriminator
        32 + // owner
        1 + // vault_bump
        1; // state_bump

    /// True when `address` is this state's PDA for `user` under the stored bump.
    pub fn derives_state_address(
        &self,
        address: &Pubkey,
        user: &Pubkey,
        program_id: &Pubkey,
    ) -> bool {
        matches_derivation(
            address,
            &[STATE_SEED, user.as_ref(), &[self.state_bump]],
            program_id,
        )
    }

    /// True when `vault` is the vault PDA of the state at `vault_state`.
    pub fn derives_vault_address(
        &self,
        vault: &Pubkey,
        vault_state: &Pubkey,
        program_id: &Pubkey,
    ) -> bool {
        matches_derivation(
            vault,
            &[VAULT_SEED, vault_state.as_ref(), &[self.vault_bump]],
            program_id,
        )
    }

    /// Seeds the program signs with to move lamports out of the vault.
    pub fn vault_signer_seeds<'a>(&'a self, vault_state: &'a Pubkey) -> [&'a [u8]; 3] {
        [
            VAULT_SEED,
            vault_state.as_ref(),
            std::slice::from_ref(&self.vault_bump),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pda::{find_vault_address, find_vault_state_address};

    fn state_for(user: &Pubkey) -> (Pubkey, Pubkey, VaultState) {
        let (state_address, state_bump) = find_vault_state_address(user, &crate::ID);
        let (vault_address, vault_bump) = find_vault_address(&state_address, &crate::ID);
        (
            state_address,
            vault_address,
            VaultState {
                owner: *user,
                vault_bump,
                state_bump,
            },
        )
    }

    #[test]
    fn serialized_len_matches_layout() {
        let (_, _, state) = state_for(&Pubkey::new_unique());
        let mut data = Vec::new();
        state.try_serialize(&mut data).unwrap();
        assert_eq!(data.len(), VaultState::LEN);

        let decoded = VaultState::try_deserialize(&mut data.as_slice()).unwrap();
        assert_eq!(decoded.owner, state.owner);
        assert_eq!(decoded.vault_bump, state.vault_bump);
        assert_eq!(decoded.state_bump, state.state_bump);
    }

    #[test]
    fn stored_bumps_reproduce_addresses() {
        let user = Pubkey::new_unique();
        let (state_address, vault_address, state) = state_for(&user);

        assert!(state.derives_state_address(&state_address, &user, &crate::ID));
        assert!(state.derives_vault_address(&vault_address, &state_address, &crate::ID));
    }

    #[test]
    fn foreign_addresses_are_rejected() {
        let user = Pubkey::new_unique();
        let (state_address, vault_address, state) = state_for(&user);
        let (other_state, other_vault, _) = state_for(&Pubkey::new_unique());

        assert!(!state.derives_state_address(&other_state, &user, &crate::ID));
        assert!(!state.derives_state_address(&state_address, &Pubkey::new_unique(), &crate::ID));
        assert!(!state.derives_vault_address(&other_vault, &state_address, &crate::ID));
        assert!(!state.derives_vault_address(&vault_address, &other_state, &crate::ID));
    }

    #[test]
    fn signer_seeds_sign_for_the_vault() {
        let user = Pubkey::new_unique();
        let (state_address, vault_address, state) = state_for(&user);

        let seeds = state.vault_signer_seeds(&state_address);
        let signer = Pubkey::create_program_address(&seeds, &crate::ID).unwrap();
        assert_eq!(signer, vault_address);
    }
}
