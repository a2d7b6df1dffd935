use anchor_lang::prelude::*;
use anchor_lang::system_program::{transfer, Transfer};

use crate::error::VaultError;
use crate::state::VaultState;

#[derive(Accounts)]
pub struct Deposit<'info> {
    /// The depositor, signing as the source of the lamports
    #[account(mut)]
    pub user: Signer<'info>,

    /// The depositor's vault state, re-validated against its stored bump
    #[account(
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

pub fn handler(ctx: Context<Deposit>, amount: u64) -> Result<()> {
    require!(amount > 0, VaultError::InvalidAmount);
    require!(
        ctx.accounts.user.lamports() >= amount,
        VaultError::InsufficientFunds
    );

    let transfer_accounts = Transfer {
        from: ctx.accounts.user.to_account_info(),
        to: ctx.accounts.vault.to_account_info(),
    };

    let cpi_ctx = CpiContext::new(
        ctx.accounts.system_program.to_account_info(),
        transfer_accounts,
    );

    transfer(cpi_ctx, amount)?;

    msg!("Deposit successful!");
    msg!("Deposited: {} lamports", amount);
    msg!("Vault balance: {}", ctx.accounts.vault.lamports());

    Ok(())
}
