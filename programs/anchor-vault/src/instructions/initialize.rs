use anchor_lang::prelude::*;
use anchor_lang::system_program::{
    allocate, assign, create_account, transfer, Allocate, Assign, CreateAccount, Transfer,
};

use crate::constants::{STATE_SEED, VAULT_SPACE};
use crate::error::VaultError;
use crate::pda::{find_vault_address, find_vault_state_address};
use crate::state::VaultState;

#[derive(Accounts)]
pub struct Initialize<'info> {
    /// The vault owner, paying for both accounts
    #[account(mut)]
    pub user: Signer<'info>,

    /// CHECK: Created and written in the handler once its derivation from
    /// `user` has been verified
    #[account(mut)]
    pub vault_state: UncheckedAccount<'info>,

    /// The lamport-holding PDA derived from `vault_state`
    #[account(mut)]
    pub vault: SystemAccount<'info>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<Initialize>) -> Result<()> {
    let user = ctx.accounts.user.key();

    let (state_address, state_bump) = find_vault_state_address(&user, ctx.program_id);
    require_keys_eq!(
        ctx.accounts.vault_state.key(),
        state_address,
        VaultError::DerivationMismatch
    );

    let (vault_address, vault_bump) = find_vault_address(&state_address, ctx.program_id);
    require_keys_eq!(
        ctx.accounts.vault.key(),
        vault_address,
        VaultError::DerivationMismatch
    );

    // Lamports alone do not make a vault; anyone can send them to a derived address
    require!(
        ctx.accounts.vault_state.owner != ctx.program_id
            && ctx.accounts.vault_state.data_is_empty(),
        VaultError::AlreadyInitialized
    );

    let rent = Rent::get()?;
    let state_rent = rent.minimum_balance(VaultState::LEN);
    let vault_rent = rent.minimum_balance(VAULT_SPACE);

    let state_existing = ctx.accounts.vault_state.lamports();
    let state_top_up = state_rent.saturating_sub(state_existing);
    let vault_top_up = vault_rent.saturating_sub(ctx.accounts.vault.lamports());
    let required = state_top_up
        .checked_add(vault_top_up)
        .ok_or(VaultError::MathOverflow)?;
    require!(
        ctx.accounts.user.lamports() >= required,
        VaultError::InsufficientFunds
    );

    let state_seeds = &[STATE_SEED, user.as_ref(), &[state_bump]];
    let signer_seeds = &[&state_seeds[..]];

    if state_existing == 0 {
        let create_accounts = CreateAccount {
            from: ctx.accounts.user.to_account_info(),
            to: ctx.accounts.vault_state.to_account_info(),
        };

        let cpi_ctx = CpiContext::new_with_signer(
            ctx.accounts.system_program.to_account_info(),
            create_accounts,
            signer_seeds,
        );

        create_account(
            cpi_ctx,
            state_rent,
            VaultState::LEN as u64,
            ctx.program_id,
        )?;
    } else {
        // Pre-funded address: top up, then allocate and assign in place
        if state_top_up > 0 {
            let transfer_accounts = Transfer {
                from: ctx.accounts.user.to_account_info(),
                to: ctx.accounts.vault_state.to_account_info(),
            };

            let cpi_ctx = CpiContext::new(
                ctx.accounts.system_program.to_account_info(),
                transfer_accounts,
            );

            transfer(cpi_ctx, state_top_up)?;
        }

        let allocate_accounts = Allocate {
            account_to_allocate: ctx.accounts.vault_state.to_account_info(),
        };

        let cpi_ctx = CpiContext::new_with_signer(
            ctx.accounts.system_program.to_account_info(),
            allocate_accounts,
            signer_seeds,
        );

        allocate(cpi_ctx, VaultState::LEN as u64)?;

        let assign_accounts = Assign {
            account_to_assign: ctx.accounts.vault_state.to_account_info(),
        };

        let cpi_ctx = CpiContext::new_with_signer(
            ctx.accounts.system_program.to_account_info(),
            assign_accounts,
            signer_seeds,
        );

        assign(cpi_ctx, ctx.program_id)?;
    }

    let vault_state = VaultState {
        owner: user,
        vault_bump,
        state_bump,
    };
    {
        let mut data = ctx.accounts.vault_state.try_borrow_mut_data()?;
        vault_state.try_serialize(&mut &mut data[..])?;
    }

    // Fund the vault up to its rent-exempt floor
    if vault_top_up > 0 {
        let transfer_accounts = Transfer {
            from: ctx.accounts.user.to_account_info(),
            to: ctx.accounts.vault.to_account_info(),
        };

        let cpi_ctx = CpiContext::new(
            ctx.accounts.system_program.to_account_info(),
            transfer_accounts,
        );

        transfer(cpi_ctx, vault_top_up)?;
    }

    msg!("Vault initialized successfully!");
    msg!("Owner: {}", user);
    msg!("Vault State: {}", state_address);
    msg!("Vault: {}", vault_address);
    msg!("Vault balance: {} lamports", ctx.accounts.vault.lamports());

    Ok(())
}
