use anchor_lang::error::{ErrorCode, ERROR_CODE_OFFSET};
use anchor_lang::solana_program::{
    account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey as ProgramPubkey,
};
use anchor_lang::AccountDeserialize;
use anchor_lang::InstructionData;
use anchor_lang::ToAccountMetas;
use anchor_vault::error::VaultError;
use anchor_vault::pda::{find_vault_address, find_vault_state_address};
use anchor_vault::state::VaultState;
use solana_program_test::*;
use solana_sdk::{
    instruction::{Instruction, InstructionError},
    pubkey::Pubkey,
    rent::Rent,
    signature::{Keypair, Signer},
    transaction::{Transaction, TransactionError},
};

// Re-export for convenience
pub use solana_program_test::{BanksClientError, ProgramTestContext};

// Custom error type for fuzzing
pub type FuzzResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// One lamport-denominated SOL
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Test environment with program loaded
pub struct FuzzTestEnv {
    pub program_id: Pubkey,
    pub context: ProgramTestContext,
}

/// A funded user together with the vault addresses derived for them
#[derive(Debug)]
pub struct UserVault {
    pub user: Keypair,
    pub vault_state: Pubkey,
    pub vault: Pubkey,
    pub state_bump: u8,
    pub vault_bump: u8,
}

impl UserVault {
    /// Derive the vault addresses for `user` without touching the chain
    pub fn derive(user: Keypair, program_id: &Pubkey) -> Self {
        let (vault_state, state_bump) = find_vault_state_address(&user.pubkey(), program_id);
        let (vault, vault_bump) = find_vault_address(&vault_state, program_id);

        Self {
            user,
            vault_state,
            vault,
            state_bump,
            vault_bump,
        }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.user.pubkey()
    }
}

// ============================================================================
// Core Setup Functions
// ============================================================================

// Anchor's entry ties the account slice to the account lifetime; the builtin
// processor signature does not, so the slice is copied and leaked. The leak
// grows with every instruction and is bounded only by the test process, so
// long-running fuzz loops use `setup_program_test_sbf` instead.
fn process_instruction(
    program_id: &ProgramPubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    let accounts = Box::leak(Box::new(accounts.to_vec()));
    anchor_vault::entry(program_id, accounts, data)
}

/// Creates the program test environment with the vault program loaded
/// in-process, for short-lived tests
pub async fn setup_program_test() -> FuzzTestEnv {
    let program_id = anchor_vault::id();
    let program_test = ProgramTest::new(
        "anchor_vault",
        program_id,
        processor!(process_instruction),
    );

    let context = program_test.start_with_context().await;

    FuzzTestEnv {
        program_id,
        context,
    }
}

/// Creates the program test environment from the compiled `anchor_vault.so`
/// (`cargo build-sbf`, found through `SBF_OUT_DIR` or `target/deploy`)
pub async fn setup_program_test_sbf() -> FuzzTestEnv {
    let program_id = anchor_vault::id();
    let mut program_test = ProgramTest::new("anchor_vault", program_id, None);
    program_test.prefer_bpf(true);

    let context = program_test.start_with_context().await;

    FuzzTestEnv {
        program_id,
        context,
    }
}

/// Creates a new user funded with `lamports` by the test payer
pub async fn fund_new_user(
    context: &mut ProgramTestContext,
    program_id: &Pubkey,
    lamports: u64,
) -> FuzzResult<UserVault> {
    let user = Keypair::new();

    let ix = solana_sdk::system_instruction::transfer(
        &context.payer.pubkey(),
        &user.pubkey(),
        lamports,
    );

    let payer = context.payer.insecure_clone();
    send_transaction(context, &[ix], &payer).await?;

    Ok(UserVault::derive(user, program_id))
}

/// Funds a user and runs `initialize` for them
pub async fn setup_user_vault(
    context: &mut ProgramTestContext,
    program_id: &Pubkey,
    lamports: u64,
) -> FuzzResult<UserVault> {
    let user_vault = fund_new_user(context, program_id, lamports).await?;

    let ix = initialize_ix(
        program_id,
        &user_vault.pubkey(),
        &user_vault.vault_state,
        &user_vault.vault,
    );
    send_transaction(context, &[ix], &user_vault.user).await?;

    Ok(user_vault)
}

/// Sets up everything: program + a user holding `lamports` with an initialized vault
pub async fn setup_complete_environment(lamports: u64) -> FuzzResult<(FuzzTestEnv, UserVault)> {
    let mut env = setup_program_test().await;
    let user_vault = setup_user_vault(&mut env.context, &env.program_id, lamports).await?;

    Ok((env, user_vault))
}

// ============================================================================
// Instruction Builders
// ============================================================================

pub fn initialize_ix(
    program_id: &Pubkey,
    user: &Pubkey,
    vault_state: &Pubkey,
    vault: &Pubkey,
) -> Instruction {
    let accounts = anchor_vault::accounts::Initialize {
        user: *user,
        vault_state: *vault_state,
        vault: *vault,
        system_program: solana_sdk::system_program::ID,
    };

    Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(None),
        data: anchor_vault::instruction::Initialize {}.data(),
    }
}

pub fn deposit_ix(
    program_id: &Pubkey,
    user: &Pubkey,
    vault_state: &Pubkey,
    vault: &Pubkey,
    amount: u64,
) -> Instruction {
    let accounts = anchor_vault::accounts::Deposit {
        user: *user,
        vault_state: *vault_state,
        vault: *vault,
        system_program: solana_sdk::system_program::ID,
    };

    Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(None),
        data: anchor_vault::instruction::Deposit { amount }.data(),
    }
}

pub fn withdraw_ix(
    program_id: &Pubkey,
    user: &Pubkey,
    vault_state: &Pubkey,
    vault: &Pubkey,
    amount: u64,
) -> Instruction {
    let accounts = anchor_vault::accounts::Withdraw {
        user: *user,
        vault_state: *vault_state,
        vault: *vault,
        system_program: solana_sdk::system_program::ID,
    };

    Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(None),
        data: anchor_vault::instruction::Withdraw { amount }.data(),
    }
}

// ============================================================================
// Transaction Helpers
// ============================================================================

/// Signs and processes `instructions` with `payer` paying the fee.
///
/// A fresh blockhash is fetched for every transaction so that repeating the
/// same instruction is never rejected as already processed. Returns the fee
/// charged to `payer`.
pub async fn send_transaction(
    context: &mut ProgramTestContext,
    instructions: &[Instruction],
    payer: &Keypair,
) -> Result<u64, BanksClientError> {
    let blockhash = context.get_new_latest_blockhash().await?;

    let tx = Transaction::new_signed_with_payer(
        instructions,
        Some(&payer.pubkey()),
        &[payer],
        blockhash,
    );

    let fee = context
        .banks_client
        .get_fee_for_message(tx.message().clone())
        .await?
        .ok_or(BanksClientError::ClientError("fee unavailable for message"))?;

    context.banks_client.process_transaction(tx).await?;

    Ok(fee)
}

pub async fn initialize(
    context: &mut ProgramTestContext,
    program_id: &Pubkey,
    user_vault: &UserVault,
) -> Result<u64, BanksClientError> {
    let ix = initialize_ix(
        program_id,
        &user_vault.pubkey(),
        &user_vault.vault_state,
        &user_vault.vault,
    );
    send_transaction(context, &[ix], &user_vault.user).await
}

pub async fn deposit(
    context: &mut ProgramTestContext,
    program_id: &Pubkey,
    user_vault: &UserVault,
    amount: u64,
) -> Result<u64, BanksClientError> {
    let ix = deposit_ix(
        program_id,
        &user_vault.pubkey(),
        &user_vault.vault_state,
        &user_vault.vault,
        amount,
    );
    send_transaction(context, &[ix], &user_vault.user).await
}

pub async fn withdraw(
    context: &mut ProgramTestContext,
    program_id: &Pubkey,
    user_vault: &UserVault,
    amount: u64,
) -> Result<u64, BanksClientError> {
    let ix = withdraw_ix(
        program_id,
        &user_vault.pubkey(),
        &user_vault.vault_state,
        &user_vault.vault,
        amount,
    );
    send_transaction(context, &[ix], &user_vault.user).await
}

// ============================================================================
// Error Helpers
// ============================================================================

/// Extract the custom program error code from a failed transaction
pub fn custom_error_code(err: &BanksClientError) -> Option<u32> {
    let tx_err = match err {
        BanksClientError::TransactionError(tx_err) => tx_err,
        BanksClientError::SimulationError { err, .. } => err,
        _ => return None,
    };

    match tx_err {
        TransactionError::InstructionError(_, InstructionError::Custom(code)) => Some(*code),
        _ => None,
    }
}

pub fn vault_error_code(err: VaultError) -> u32 {
    ERROR_CODE_OFFSET + err as u32
}

/// Assert that `result` failed with the given program error
pub fn assert_vault_error<T: std::fmt::Debug>(
    result: Result<T, BanksClientError>,
    expected: VaultError,
) {
    let expected_code = vault_error_code(expected);
    match result {
        Ok(value) => panic!("expected {:?} ({}), got Ok({:?})", expected, expected_code, value),
        Err(err) => assert_eq!(
            custom_error_code(&err),
            Some(expected_code),
            "expected {:?}, got {:?}",
            expected,
            err
        ),
    }
}

/// Assert that `result` failed with one of Anchor's framework errors
pub fn assert_anchor_error<T: std::fmt::Debug>(
    result: Result<T, BanksClientError>,
    expected: ErrorCode,
) {
    let expected_code = expected as u32;
    match result {
        Ok(value) => panic!("expected anchor error {}, got Ok({:?})", expected_code, value),
        Err(err) => assert_eq!(
            custom_error_code(&err),
            Some(expected_code),
            "expected anchor error {}, got {:?}",
            expected_code,
            err
        ),
    }
}

// ============================================================================
// Account State Verification Helpers
// ============================================================================

pub async fn get_rent(context: &mut ProgramTestContext) -> FuzzResult<Rent> {
    Ok(context.banks_client.get_rent().await?)
}

/// Lamport balance of `address`; zero if the account does not exist
pub async fn get_balance(context: &mut ProgramTestContext, address: &Pubkey) -> FuzzResult<u64> {
    Ok(context.banks_client.get_balance(*address).await?)
}

pub async fn account_exists(
    context: &mut ProgramTestContext,
    address: &Pubkey,
) -> FuzzResult<bool> {
    Ok(context.banks_client.get_account(*address).await?.is_some())
}

/// Fetch and deserialize a vault state account
pub async fn get_vault_state(
    context: &mut ProgramTestContext,
    vault_state: &Pubkey,
) -> FuzzResult<VaultState> {
    let account = context
        .banks_client
        .get_account(*vault_state)
        .await?
        .ok_or("Vault state account not found")?;

    let state = VaultState::try_deserialize(&mut account.data.as_ref())?;
    Ok(state)
}

/// Snapshot of the balances a vault operation moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balances {
    pub user: u64,
    pub vault: u64,
}

pub async fn get_balances(
    context: &mut ProgramTestContext,
    user_vault: &UserVault,
) -> FuzzResult<Balances> {
    Ok(Balances {
        user: get_balance(context, &user_vault.pubkey()).await?,
        vault: get_balance(context, &user_vault.vault).await?,
    })
}
