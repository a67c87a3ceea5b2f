// ======================================================================
// ESCROW AUCTION
// ======================================================================
// English auction ledger on Solana.
//   - Sellers delegate (not transfer) an asset account to the auction PDA
//   - Bids are escrowed in a PDA-owned token account
//   - Each new high bid refunds the displaced bidder in the same instruction
//   - Bidders name the high bidder they saw; stale views are rejected
//
// Settlement (closing an auction, claiming asset or proceeds) is not part
// of this program yet.
// ======================================================================

#![allow(
    unexpected_cfgs, // rustc lint, Anchor uses cfg(feature = "anchor-debug")
    clippy::result_large_err,
)]

use anchor_lang::prelude::*;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

pub mod custody;
pub mod derivation;
pub mod error;
pub mod instructions;
#[cfg(not(target_os = "solana"))]
pub mod ledger;
pub mod state;
pub mod validation;

use custody::{MintView, SplCustody, TokenAccountView};
pub use error::AuctionError;
use instructions::{BidRequest, ListingRequest};
pub use state::Auction;

declare_id!("DgS9UGdBZCZ33J5PSNUnzrEUUQknTpx1LYGzWBaWHn9P");

#[program]
pub mod escrow_auction {
    use super::*;

    /// List an asset account for auction.
    ///
    /// Creates the auction record and its empty escrow, and delegates
    /// `quantity` units of the asset account to the auction PDA.
    ///
    /// # Errors
    /// - `AuctionError::AlreadyListed` if this asset account already has an auction
    /// - `AuctionError::Unauthorized` if the signer does not own the asset account
    /// - `AuctionError::InsufficientBalance` if `quantity` exceeds the asset balance
    /// - `AuctionError::InvalidAsset` if the asset mint has decimals
    pub fn listing(ctx: Context<Listing>, quantity: u64, min_price: u64) -> Result<()> {
        let request = ListingRequest {
            seller: ctx.accounts.seller.key(),
            asset: TokenAccountView::of(&ctx.accounts.asset_acc),
            asset_mint: MintView::of(&ctx.accounts.asset_mint),
            payment_mint: ctx.accounts.payment_mint.key(),
            auction: ctx.accounts.auction.key(),
            auction_bump: ctx.bumps.auction,
            escrow: TokenAccountView::of(&ctx.accounts.escrow),
            escrow_bump: ctx.bumps.escrow,
            quantity,
            min_price,
        };

        let mut custody = SplCustody::for_listing(
            ctx.accounts.token_program.to_account_info(),
            ctx.accounts.payment_mint.to_account_info(),
            ctx.accounts.payment_mint.decimals,
            ctx.accounts.asset_acc.to_account_info(),
            ctx.accounts.auction.to_account_info(),
            ctx.accounts.seller.to_account_info(),
        );

        instructions::open_auction(
            ctx.program_id,
            &mut ctx.accounts.auction,
            &request,
            &mut custody,
        )?;

        emit!(AuctionListed {
            auction: request.auction,
            seller: request.seller,
            asset_acc: request.asset.key,
            asset_quantity: quantity,
            min_price,
            payment_mint: request.payment_mint,
            escrow: request.escrow.key,
        });

        Ok(())
    }

    /// Place a bid.
    ///
    /// `previous_bidder` must be the auction's current high bidder account,
    /// omitted before the first bid.
    ///
    /// # Errors
    /// - `AuctionError::StaleBidderReference` if `previous_bidder` is out of date
    /// - `AuctionError::BidTooLow` if `amount` does not beat `max(min_price, escrow)`
    /// - `AuctionError::AccountMismatch` if escrow or currency do not match the record
    /// - `AuctionError::InsufficientBalance` if the bidding account cannot pay
    pub fn bid(ctx: Context<Bid>, amount: u64) -> Result<()> {
        let previous_bidder = ctx.accounts.previous_bidder.as_ref();
        let request = BidRequest {
            bidder: ctx.accounts.bidder.key(),
            bidding_account: TokenAccountView::of(&ctx.accounts.bidding_account),
            escrow: TokenAccountView::of(&ctx.accounts.escrow),
            payment_mint: ctx.accounts.payment_mint.key(),
            previous_bidder: previous_bidder.map(|account| account.key()),
            amount,
        };

        let mut custody = SplCustody::for_bid(
            ctx.accounts.token_program.to_account_info(),
            ctx.accounts.payment_mint.to_account_info(),
            ctx.accounts.payment_mint.decimals,
            ctx.accounts.bidding_account.to_account_info(),
            ctx.accounts.escrow.to_account_info(),
            ctx.accounts.auction.to_account_info(),
            ctx.accounts.bidder.to_account_info(),
            previous_bidder.map(|account| account.to_account_info()),
        );

        let auction_key = ctx.accounts.auction.key();
        let receipt = instructions::place_bid(
            ctx.program_id,
            &auction_key,
            &mut ctx.accounts.auction,
            &request,
            &mut custody,
        )?;

        emit!(BidPlaced {
            auction: auction_key,
            bidder: request.bidder,
            bidding_account: request.bidding_account.key,
            amount: receipt.amount,
            refunded: receipt.refund.map(|refund| refund.to),
            refund_amount: receipt.refund.map_or(0, |refund| refund.amount),
        });

        Ok(())
    }
}

// ======================================================================
// ACCOUNTS
// ======================================================================

#[derive(Accounts)]
pub struct Listing<'info> {
    #[account(mut)]
    pub seller: Signer<'info>,

    pub payment_mint: InterfaceAccount<'info, Mint>,

    pub asset_mint: InterfaceAccount<'info, Mint>,

    #[account(mut)]
    pub asset_acc: InterfaceAccount<'info, TokenAccount>,

    // init_if_needed so a second listing reaches the AlreadyListed check
    // instead of failing inside the system program
    #[account(
        init_if_needed,
        payer = seller,
        space = 8 + Auction::SIZE,
        seeds = [asset_acc.key().as_ref()],
        bump
    )]
    pub auction: Account<'info, Auction>,

    #[account(
        init_if_needed,
        payer = seller,
        seeds = [auction.key().as_ref()],
        bump,
        token::mint = payment_mint,
        token::authority = auction,
        token::token_program = token_program,
    )]
    pub escrow: InterfaceAccount<'info, TokenAccount>,

    pub token_program: Interface<'info, TokenInterface>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct Bid<'info> {
    #[account(mut)]
    pub bidder: Signer<'info>,

    pub payment_mint: InterfaceAccount<'info, Mint>,

    #[account(mut)]
    pub bidding_account: InterfaceAccount<'info, TokenAccount>,

    // Address is re-derived from the stored bump inside the handler
    #[account(mut)]
    pub auction: Account<'info, Auction>,

    #[account(mut)]
    pub escrow: InterfaceAccount<'info, TokenAccount>,

    /// CHECK: compared against the stored high bidder and used as the refund
    /// destination. Omitted while there are no bids.
    #[account(mut)]
    pub previous_bidder: Option<UncheckedAccount<'info>>,

    pub token_program: Interface<'info, TokenInterface>,
}

// ======================================================================
// EVENTS
// ======================================================================

#[event]
pub struct AuctionListed {
    pub auction: Pubkey,
    pub seller: Pubkey,
    pub asset_acc: Pubkey,
    pub asset_quantity: u64,
    pub min_price: u64,
    pub payment_mint: Pubkey,
    pub escrow: Pubkey,
}

#[event]
pub struct BidPlaced {
    pub auction: Pubkey,
    pub bidder: Pubkey,
    pub bidding_account: Pubkey,
    pub amount: u64,
    pub refunded: Option<Pubkey>,
    pub refund_amount: u64,
}
