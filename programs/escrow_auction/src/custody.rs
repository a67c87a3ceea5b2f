// ======================================================================
// CUSTODY
// ======================================================================
//
// Moves payment funds and grants asset allowances. The protocol code in
// `instructions` only ever talks to `Custody`, so the same listing and
// bidding logic runs on-chain (token program CPIs) and against the native
// `Ledger`.

use anchor_lang::prelude::*;
use anchor_spl::token_interface::{self, Mint, TokenAccount};

use crate::derivation::AuctionAuthority;
use crate::error::AuctionError;

/// Party authorizing a custody action.
#[derive(Clone, Copy, Debug)]
pub enum Authority<'a> {
    /// A wallet that co-signed the request.
    Owner(Pubkey),
    /// The auction's derived address, proven by re-derivation.
    Program(&'a AuctionAuthority),
}

impl Authority<'_> {
    pub fn key(&self) -> Pubkey {
        match self {
            Authority::Owner(key) => *key,
            Authority::Program(authority) => authority.key(),
        }
    }
}

pub trait Custody {
    /// Grants `to` the right to move up to `quantity` units out of `asset`.
    ///
    /// # Errors
    /// - `AuctionError::Unauthorized` if `owner` does not own `asset`
    /// - `AuctionError::InsufficientBalance` if `quantity` exceeds the held balance
    fn delegate(&mut self, asset: &Pubkey, owner: &Pubkey, to: &Pubkey, quantity: u64)
        -> Result<()>;

    /// Moves `amount` from `from` to `to`.
    ///
    /// # Errors
    /// - `AuctionError::Unauthorized` if `authority` neither owns `from` nor
    ///   holds a sufficient allowance on it
    /// - `AuctionError::InsufficientBalance` if `from` cannot cover `amount`
    fn transfer(
        &mut self,
        from: &Pubkey,
        to: &Pubkey,
        amount: u64,
        authority: Authority<'_>,
    ) -> Result<()>;
}

/// Snapshot of a token account as supplied to a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenAccountView {
    pub key: Pubkey,
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
}

impl TokenAccountView {
    pub fn of(account: &InterfaceAccount<'_, TokenAccount>) -> Self {
        Self {
            key: account.key(),
            mint: account.mint,
            owner: account.owner,
            amount: account.amount,
        }
    }
}

/// Mint identity plus the decimals the protocol checks against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MintView {
    pub key: Pubkey,
    pub decimals: u8,
}

impl MintView {
    pub fn of(mint: &InterfaceAccount<'_, Mint>) -> Self {
        Self {
            key: mint.key(),
            decimals: mint.decimals,
        }
    }
}

// ======================================================================
// TOKEN PROGRAM CPI
// ======================================================================

/// `Custody` over the accounts of a single instruction.
///
/// Keys handed to `delegate`/`transfer` are resolved against the account
/// infos the instruction declared; an undeclared key is an account mismatch.
pub struct SplCustody<'info> {
    token_program: AccountInfo<'info>,
    payment_mint: AccountInfo<'info>,
    decimals: u8,
    accounts: Vec<AccountInfo<'info>>,
}

impl<'info> SplCustody<'info> {
    pub fn new(
        token_program: AccountInfo<'info>,
        payment_mint: AccountInfo<'info>,
        decimals: u8,
        accounts: Vec<AccountInfo<'info>>,
    ) -> Self {
        Self {
            token_program,
            payment_mint,
            decimals,
            accounts,
        }
    }

    /// Custody for `listing`: the seller approves the auction address on the
    /// asset account.
    pub fn for_listing(
        token_program: AccountInfo<'info>,
        payment_mint: AccountInfo<'info>,
        decimals: u8,
        asset_acc: AccountInfo<'info>,
        auction: AccountInfo<'info>,
        seller: AccountInfo<'info>,
    ) -> Self {
        Self::new(
            token_program,
            payment_mint,
            decimals,
            vec![asset_acc, auction, seller],
        )
    }

    /// Custody for `bid`: the auction refunds `previous_bidder` out of escrow,
    /// then the bidder pays into it. `previous_bidder` is absent before the
    /// first bid.
    #[allow(clippy::too_many_arguments)]
    pub fn for_bid(
        token_program: AccountInfo<'info>,
        payment_mint: AccountInfo<'info>,
        decimals: u8,
        bidding_account: AccountInfo<'info>,
        escrow: AccountInfo<'info>,
        auction: AccountInfo<'info>,
        bidder: AccountInfo<'info>,
        previous_bidder: Option<AccountInfo<'info>>,
    ) -> Self {
        let mut accounts = vec![bidding_account, escrow, auction, bidder];
        accounts.extend(previous_bidder);
        Self::new(token_program, payment_mint, decimals, accounts)
    }

    fn find(&self, key: &Pubkey) -> Result<AccountInfo<'info>> {
        self.accounts
            .iter()
            .find(|info| info.key == key)
            .cloned()
            .ok_or_else(|| error!(AuctionError::AccountMismatch))
    }
}

impl Custody for SplCustody<'_> {
    fn delegate(
        &mut self,
        asset: &Pubkey,
        owner: &Pubkey,
        to: &Pubkey,
        quantity: u64,
    ) -> Result<()> {
        let cpi_accounts = token_interface::Approve {
            to: self.find(asset)?,
            delegate: self.find(to)?,
            authority: self.find(owner)?,
        };
        let cpi_ctx = CpiContext::new(self.token_program.clone(), cpi_accounts);
        token_interface::approve(cpi_ctx, quantity)
    }

    fn transfer(
        &mut self,
        from: &Pubkey,
        to: &Pubkey,
        amount: u64,
        authority: Authority<'_>,
    ) -> Result<()> {
        let cpi_accounts = token_interface::TransferChecked {
            from: self.find(from)?,
            mint: self.payment_mint.clone(),
            to: self.find(to)?,
            authority: self.find(&authority.key())?,
        };

        match authority {
            Authority::Owner(_) => {
                let cpi_ctx = CpiContext::new(self.token_program.clone(), cpi_accounts);
                token_interface::transfer_checked(cpi_ctx, amount, self.decimals)
            }
            Authority::Program(auction) => {
                let seeds = auction.signer_seeds();
                let signer = &[&seeds[..]];
                let cpi_ctx =
                    CpiContext::new_with_signer(self.token_program.clone(), cpi_accounts, signer);
                token_interface::transfer_checked(cpi_ctx, amount, self.decimals)
            }
        }
    }
}
