use anchor_lang::prelude::*;

use crate::custody::TokenAccountView;
use crate::error::AuctionError;
use crate::validation::{
    require_account, require_funds, require_mint, require_owner, require_positive,
};

/// Auction record, one per listed asset account.
///
/// Lives at `PDA([asset_acc])`. Everything except `highest_bid` and
/// `high_bidder` is frozen at listing time.
#[account]
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Auction {
    /// Listing party
    pub seller: Pubkey,
    /// Seller's asset account, delegated to this auction
    pub asset_acc: Pubkey,
    pub asset_mint: Pubkey,
    /// Units placed under auction (the frozen allowance)
    pub asset_quantity: u64,
    /// Currency accepted for bids
    pub payment_mint: Pubkey,
    pub min_price: u64,
    /// Escrow token account at `PDA([auction])`
    pub escrow: Pubkey,
    /// Mirrors the escrow balance
    pub highest_bid: u64,
    /// Payment account of the current high bidder
    pub high_bidder: Option<Pubkey>,
    pub bump: u8,
    pub escrow_bump: u8,
}

impl Auction {
    pub const SIZE: usize = 32 + 32 + 32 + 8 + 32 + 8 + 32 + 8 + (1 + 32) + 1 + 1;

    /// An all-default record is an unclaimed slot.
    pub fn is_listed(&self) -> bool {
        self.seller != Pubkey::default()
    }

    pub fn status(&self) -> AuctionStatus {
        match self.high_bidder {
            None => AuctionStatus::NoBidsYet,
            Some(account) => AuctionStatus::HasHighBidder(account),
        }
    }

    /// A new bid must be strictly greater than this (and than the escrow balance).
    pub fn floor(&self) -> u64 {
        self.min_price.max(self.highest_bid)
    }

    /// Validates a bid against the committed record without mutating anything.
    ///
    /// `previous_bidder` is the bidder's view of `high_bidder`; a mismatch is
    /// a stale read and is reported before the price check so callers know to
    /// re-read rather than raise.
    ///
    /// # Errors
    /// - `AuctionError::AccountMismatch` for a foreign escrow or currency
    /// - `AuctionError::Unauthorized` if the bidder does not own the paying account
    /// - `AuctionError::InvalidAmount` for a zero bid
    /// - `AuctionError::StaleBidderReference` if `previous_bidder` is out of date
    /// - `AuctionError::BidTooLow` if `amount <= floor()`
    /// - `AuctionError::InsufficientBalance` if the paying account cannot cover `amount`
    pub fn check_bid(
        &self,
        bidder: &Pubkey,
        bidding_account: &TokenAccountView,
        escrow: &TokenAccountView,
        previous_bidder: Option<Pubkey>,
        amount: u64,
    ) -> Result<BidPlan> {
        require_account(escrow, &self.escrow)?;
        require_mint(escrow, &self.payment_mint)?;
        require_mint(bidding_account, &self.payment_mint)?;
        require_owner(bidding_account, bidder)?;
        require_positive(amount)?;

        require!(
            previous_bidder == self.high_bidder,
            AuctionError::StaleBidderReference
        );
        // Anyone can send tokens to the escrow, so price against what it holds
        let floor = self.floor().max(escrow.amount);
        require!(amount > floor, AuctionError::BidTooLow);

        let refund = self.high_bidder.map(|to| Refund {
            to,
            amount: escrow.amount,
        });

        // Raising your own bid: the refund lands before the debit
        let mut available = bidding_account.amount;
        if let Some(refund) = refund.filter(|refund| refund.to == bidding_account.key) {
            available = available
                .checked_add(refund.amount)
                .ok_or(AuctionError::Overflow)?;
        }
        require_funds(available, amount)?;

        Ok(BidPlan {
            refund,
            deposit: amount,
        })
    }

    pub fn record_bid(&mut self, bidding_account: Pubkey, amount: u64) {
        self.highest_bid = amount;
        self.high_bidder = Some(bidding_account);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuctionStatus {
    NoBidsYet,
    HasHighBidder(Pubkey),
}

/// Full return of the displaced bidder's escrowed funds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Refund {
    pub to: Pubkey,
    pub amount: u64,
}

/// Fund movements a validated bid requires, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BidPlan {
    pub refund: Option<Refund>,
    pub deposit: u64,
}
