use anchor_lang::prelude::*;

use crate::custody::{Custody, MintView, TokenAccountView};
use crate::derivation::{verify_escrow, AuctionAuthority};
use crate::error::AuctionError;
use crate::state::Auction;
use crate::validation::{require_funds, require_mint, require_owner, require_positive};

// ======================================================================
// LISTING
// ======================================================================

/// Accounts and arguments of a listing request, as the runtime supplied them.
#[derive(Clone, Copy, Debug)]
pub struct ListingRequest {
    /// Co-signer of the request
    pub seller: Pubkey,
    pub asset: TokenAccountView,
    pub asset_mint: MintView,
    pub payment_mint: Pubkey,
    /// Claimed auction address and its bump
    pub auction: Pubkey,
    pub auction_bump: u8,
    /// Escrow created for this listing; must be empty and owned by `auction`
    pub escrow: TokenAccountView,
    pub escrow_bump: u8,
    pub quantity: u64,
    pub min_price: u64,
}

/// Opens an auction in `slot`, the record stored at the derived auction address.
///
/// Delegates `quantity` units of the asset account to the auction address;
/// asset ownership does not move.
///
/// # Errors
/// - `AuctionError::AlreadyListed` if `slot` already holds an auction
/// - `AuctionError::InvalidAmount` if `quantity` is zero
/// - `AuctionError::InvalidAsset` if the asset mint is divisible
/// - `AuctionError::AccountMismatch` if the asset or escrow accounts do not line up
/// - `AuctionError::Unauthorized` if the seller does not own the asset account
/// - `AuctionError::InsufficientBalance` if `quantity` exceeds the held balance
/// - `AuctionError::DerivationFailure` if either address cannot be re-derived
pub fn open_auction<C: Custody>(
    program_id: &Pubkey,
    slot: &mut Auction,
    request: &ListingRequest,
    custody: &mut C,
) -> Result<()> {
    require!(!slot.is_listed(), AuctionError::AlreadyListed);
    require_positive(request.quantity)?;
    require!(request.asset_mint.decimals == 0, AuctionError::InvalidAsset);

    let asset = &request.asset;
    require_mint(asset, &request.asset_mint.key)?;
    require_owner(asset, &request.seller)?;
    require_funds(asset.amount, request.quantity)?;

    let authority = AuctionAuthority::verify(
        program_id,
        &asset.key,
        request.auction_bump,
        &request.auction,
    )?;
    verify_escrow(
        program_id,
        &authority.key(),
        request.escrow_bump,
        &request.escrow.key,
    )?;

    let escrow = &request.escrow;
    require_mint(escrow, &request.payment_mint)?;
    require_keys_eq!(escrow.owner, authority.key(), AuctionError::AccountMismatch);
    require!(escrow.amount == 0, AuctionError::AccountMismatch);

    custody.delegate(
        &asset.key,
        &request.seller,
        &authority.key(),
        request.quantity,
    )?;

    *slot = Auction {
        seller: request.seller,
        asset_acc: asset.key,
        asset_mint: request.asset_mint.key,
        asset_quantity: request.quantity,
        payment_mint: request.payment_mint,
        min_price: request.min_price,
        escrow: escrow.key,
        highest_bid: 0,
        high_bidder: None,
        bump: authority.bump(),
        escrow_bump: request.escrow_bump,
    };

    msg!(
        "Auction {} listed: {} x {} at min price {}",
        authority.key(),
        request.quantity,
        request.asset_mint.key,
        request.min_price
    );

    Ok(())
}
