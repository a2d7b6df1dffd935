#![no_main]

use anchor_vault::error::VaultError;
use arbitrary::Arbitrary;
use fuzz_helpers::*;
use libfuzzer_sys::fuzz_target;

/// A single vault operation
#[derive(Debug, Clone, Copy, Arbitrary)]
enum VaultOp {
    Deposit(u64),
    Withdraw(u64),
}

/// Fuzzable input: starting user balance and a short operation sequence
#[derive(Debug, Clone, Arbitrary)]
struct VaultFuzzInput {
    /// Initial user balance (for setup)
    initial_balance: u64,
    /// Operations applied in order after initialize
    ops: Vec<VaultOp>,
}

const MAX_OPS: usize = 8;

/// Execute a single fuzz iteration over a deposit/withdraw sequence
async fn fuzz_vault_once(input: VaultFuzzInput) -> Result<(), Box<dyn std::error::Error>> {
    // Between 1 and 100 SOL so setup always succeeds
    let initial_balance = LAMPORTS_PER_SOL + input.initial_balance % (99 * LAMPORTS_PER_SOL);

    let mut env = setup_program_test_sbf().await;
    let user_vault =
        match setup_user_vault(&mut env.context, &env.program_id, initial_balance).await {
            Ok(user_vault) => user_vault,
            Err(e) => {
                eprintln!("Setup failed: {}", e);
                return Ok(()); // Skip this iteration if setup fails
            }
        };

    let rent_floor = get_rent(&mut env.context).await?.minimum_balance(0);
    let mut expected = get_balances(&mut env.context, &user_vault).await?;
    assert_eq!(expected.vault, rent_floor, "vault must open at the rent floor");

    for op in input.ops.iter().take(MAX_OPS) {
        let result = match *op {
            VaultOp::Deposit(amount) => {
                deposit(&mut env.context, &env.program_id, &user_vault, amount).await
            }
            VaultOp::Withdraw(amount) => {
                withdraw(&mut env.context, &env.program_id, &user_vault, amount).await
            }
        };

        let actual = get_balances(&mut env.context, &user_vault).await?;

        match result {
            Ok(fee) => {
                // PROPERTY 1: exact movement in both directions
                match *op {
                    VaultOp::Deposit(amount) => {
                        expected.vault += amount;
                        expected.user -= amount + fee;
                    }
                    VaultOp::Withdraw(amount) => {
                        expected.vault -= amount;
                        expected.user = expected.user + amount - fee;
                    }
                }
                assert_eq!(actual, expected, "balances diverged after {:?}", op);
            }
            Err(e) => {
                let code = custom_error_code(&e);
                let acceptable = [VaultError::InvalidAmount, VaultError::InsufficientFunds]
                    .into_iter()
                    .map(vault_error_code)
                    .any(|c| Some(c) == code);

                // Fee payer may also be unable to stay rent exempt after a deposit
                if !acceptable && !format!("{:?}", e).contains("InsufficientFundsForRent") {
                    panic!("Unexpected error during {:?}: {:?}\nInput: {:?}", op, e, input);
                }

                // PROPERTY 2: failed operations move nothing out of the vault
                assert_eq!(actual.vault, expected.vault, "failed {:?} changed the vault", op);
                expected.user = actual.user;
            }
        }

        // PROPERTY 3: the rent floor always holds
        assert!(
            actual.vault >= rent_floor,
            "vault fell below rent floor: {} < {}",
            actual.vault,
            rent_floor
        );

        // User can no longer cover fees reliably
        if actual.user < rent_floor + 100_000 {
            break;
        }
    }

    println!(
        "✓ PASS - ops={}, vault={}, user={}",
        input.ops.len().min(MAX_OPS),
        expected.vault,
        expected.user
    );

    Ok(())
}

fuzz_target!(|input: VaultFuzzInput| {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    runtime.block_on(async {
        if let Err(e) = fuzz_vault_once(input).await {
            eprintln!("Fuzz iteration failed: {}", e);
        }
    });
});
