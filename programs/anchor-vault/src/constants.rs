/// Seed prefix of the per-user `VaultState` address: `["state", user]`.
pub const STATE_SEED: &[u8] = b"state";

/// Seed prefix of the lamport-holding vault address: `["vault", vault_state]`.
pub const VAULT_SEED: &[u8] = b"vault";

/// The vault carries no data, only lamports.
pub const VAULT_SPACE: usize = 0;
