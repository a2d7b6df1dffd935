use anchor_lang::prelude::*;
use anchor_lang::system_program::{transfer, Transfer};

use crate::constants::VAULT_SPACE;
use crate::error::VaultError;
use crate::state::VaultState;

#[derive(Accounts)]
pub struct Withdraw<'info> {
    /// The claimant; must be the owner recorded at initialization
    #[account(mut)]
    pub user: Signer<'info>,

    #[account(
        constraint = vault_state.owner == user.key() @ VaultError::Unauthorized,
        constraint = vault_state.derives_state_address(
            &vault_state.key(),
            &user.key(),
            &crate::ID,
        ) @ VaultError::DerivationMismatch,
    )]
    pub vault_state: Account<'info, VaultState>,

    #[account(
        mut,
        constraint = vault_state.derives_vault_address(
            &vault.key(),
            &vault_state.key(),
            &crate::ID,
        ) @ VaultError::DerivationMismatch,
    )]
    pub vault: SystemAccount<'info>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<Withdraw>, amount: u64) -> Result<()> {
    require!(amount > 0, VaultError::InvalidAmount);

    // The vault never drops below its rent-exempt floor
    let rent_floor = Rent::get()?.minimum_balance(VAULT_SPACE);
    let remaining = ctx
        .accounts
        .vault
        .lamports()
        .checked_sub(amount)
        .ok_or(VaultError::InsufficientFunds)?;
    require!(remaining >= rent_floor, VaultError::InsufficientFunds);

    let vault_state_key = ctx.accounts.vault_state.key();
    let vault_seeds = ctx.accounts.vault_state.vault_signer_seeds(&vault_state_key);
    let signer_seeds = &[&vault_seeds[..]];

    let transfer_accounts = Transfer {
        from: ctx.accounts.vault.to_account_info(),
        to: ctx.accounts.user.to_account_info(),
    };

    let cpi_ctx = CpiContext::new_with_signer(
        ctx.accounts.system_program.to_account_info(),
        transfer_accounts,
        signer_seeds,
    );

    transfer(cpi_ctx, amount)?;

    msg!("Withdrawal successful!");
    msg!("Withdrawn: {} lamports", amount);
    msg!("Vault balance: {}", remaining);

    Ok(())
}
