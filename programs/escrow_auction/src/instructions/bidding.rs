use anchor_lang::prelude::*;

use crate::custody::{Authority, Custody, TokenAccountView};
use crate::derivation::AuctionAuthority;
use crate::error::AuctionError;
use crate::state::{Auction, Refund};

// ======================================================================
// BIDDING
// ======================================================================

/// Accounts and arguments of a bid request, as the runtime supplied them.
#[derive(Clone, Copy, Debug)]
pub struct BidRequest {
    /// Co-signer of the request
    pub bidder: Pubkey,
    pub bidding_account: TokenAccountView,
    pub escrow: TokenAccountView,
    pub payment_mint: Pubkey,
    /// Bidder's view of the current high bidder, `None` if it saw no bids
    pub previous_bidder: Option<Pubkey>,
    pub amount: u64,
}

/// What a committed bid did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BidReceipt {
    pub refund: Option<Refund>,
    pub amount: u64,
}

/// Applies a bid to the auction stored at `auction_key`.
///
/// Order of effects: the displaced bidder is refunded in full from escrow,
/// then the new bid is deposited, then the record is updated. Every
/// precondition is checked first, so a failure leaves funds and record as
/// they were.
///
/// # Errors
/// - `AuctionError::AccountMismatch` if `auction` is not a listed auction or an
///   account or currency does not match the record
/// - `AuctionError::DerivationFailure` if `auction_key` is not the record's derived address
/// - `AuctionError::StaleBidderReference` if `previous_bidder` is out of date
/// - `AuctionError::BidTooLow` if the bid does not beat `max(min_price, escrow)`
/// - `AuctionError::Unauthorized` / `AuctionError::InsufficientBalance` from the payer checks
pub fn place_bid<C: Custody>(
    program_id: &Pubkey,
    auction_key: &Pubkey,
    auction: &mut Auction,
    request: &BidRequest,
    custody: &mut C,
) -> Result<BidReceipt> {
    require!(auction.is_listed(), AuctionError::AccountMismatch);
    let authority =
        AuctionAuthority::verify(program_id, &auction.asset_acc, auction.bump, auction_key)?;
    require_keys_eq!(
        request.payment_mint,
        auction.payment_mint,
        AuctionError::AccountMismatch
    );

    let plan = auction.check_bid(
        &request.bidder,
        &request.bidding_account,
        &request.escrow,
        request.previous_bidder,
        request.amount,
    )?;

    if let Some(refund) = plan.refund {
        custody.transfer(
            &request.escrow.key,
            &refund.to,
            refund.amount,
            Authority::Program(&authority),
        )?;
    }
    custody.transfer(
        &request.bidding_account.key,
        &request.escrow.key,
        plan.deposit,
        Authority::Owner(request.bidder),
    )?;

    auction.record_bid(request.bidding_account.key, plan.deposit);

    match plan.refund {
        Some(refund) => msg!(
            "Bid {} on {} by {}, refunded {} to {}",
            plan.deposit,
            auction_key,
            request.bidding_account.key,
            refund.amount,
            refund.to
        ),
        None => msg!(
            "First bid {} on {} by {}",
            plan.deposit,
            auction_key,
            request.bidding_account.key
        ),
    }

    Ok(BidReceipt {
        refund: plan.refund,
        amount: plan.deposit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derivation::auction_address;
    use anchor_lang::error::Error;

    /// Counts custody calls; a rejected bid must make none.
    #[derive(Default)]
    struct Counting {
        calls: usize,
    }

    impl Custody for Counting {
        fn delegate(&mut self, _: &Pubkey, _: &Pubkey, _: &Pubkey, _: u64) -> Result<()> {
            self.calls += 1;
            Ok(())
        }

        fn transfer(&mut self, _: &Pubkey, _: &Pubkey, _: u64, _: Authority<'_>) -> Result<()> {
            self.calls += 1;
            Ok(())
        }
    }

    fn listed() -> (Pubkey, Auction, BidRequest) {
        let asset_acc = Pubkey::new_unique();
        let (auction_key, bump) = auction_address(&crate::ID, &asset_acc);
        let payment_mint = Pubkey::new_unique();
        let escrow = Pubkey::new_unique();
        let bidder = Pubkey::new_unique();

        let auction = Auction {
            seller: Pubkey::new_unique(),
            asset_acc,
            asset_mint: Pubkey::new_unique(),
            asset_quantity: 1,
            payment_mint,
            min_price: 100,
            escrow,
            bump,
            ..Auction::default()
        };
        let request = BidRequest {
            bidder,
            bidding_account: TokenAccountView {
                key: Pubkey::new_unique(),
                mint: payment_mint,
                owner: bidder,
                amount: 1_000,
            },
            escrow: TokenAccountView {
                key: escrow,
                mint: payment_mint,
                owner: auction_key,
                amount: 0,
            },
            payment_mint,
            previous_bidder: None,
            amount: 240,
        };
        (auction_key, auction, request)
    }

    #[test]
    fn bid_moves_funds_and_updates_record() {
        let (auction_key, mut auction, request) = listed();
        let mut custody = Counting::default();

        let receipt =
            place_bid(&crate::ID, &auction_key, &mut auction, &request, &mut custody).unwrap();

        assert_eq!(receipt, BidReceipt { refund: None, amount: 240 });
        assert_eq!(custody.calls, 1);
        assert_eq!(auction.high_bidder, Some(request.bidding_account.key));
    }

    #[test]
    fn tampered_bump_fails_derivation() {
        let (auction_key, mut auction, request) = listed();
        auction.bump = auction.bump.wrapping_sub(1);
        let before = auction.clone();
        let mut custody = Counting::default();

        let err = place_bid(&crate::ID, &auction_key, &mut auction, &request, &mut custody)
            .unwrap_err();

        assert_eq!(err, Error::from(AuctionError::DerivationFailure));
        assert_eq!(custody.calls, 0);
        assert_eq!(auction, before);
    }

    #[test]
    fn record_at_foreign_address_fails_derivation() {
        let (_, mut auction, request) = listed();
        let (elsewhere, _) = auction_address(&crate::ID, &Pubkey::new_unique());
        let mut custody = Counting::default();

        let err = place_bid(&crate::ID, &elsewhere, &mut auction, &request, &mut custody)
            .unwrap_err();

        assert_eq!(err, Error::from(AuctionError::DerivationFailure));
        assert_eq!(custody.calls, 0);
    }

    #[test]
    fn unlisted_record_is_rejected() {
        let (auction_key, _, request) = listed();
        let mut auction = Auction::default();
        let mut custody = Counting::default();

        let err = place_bid(&crate::ID, &auction_key, &mut auction, &request, &mut custody)
            .unwrap_err();

        assert_eq!(err, Error::from(AuctionError::AccountMismatch));
        assert_eq!(custody.calls, 0);
    }
}
