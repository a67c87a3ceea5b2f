// ======================================================================
// NATIVE LEDGER
// ======================================================================
//
// In-memory stand-in for the chain: token accounts, mints and auction
// records keyed by derived address. Requests are applied one at a time and
// each one commits atomically, so a client racing another client sees the
// winner's post-state exactly as it would on-chain. Used by tests and for
// client-side simulation; never compiled into the program binary.

use std::collections::BTreeMap;

use anchor_lang::prelude::*;

use crate::custody::{Authority, Custody, MintView, TokenAccountView};
use crate::derivation::{auction_address, escrow_address};
use crate::error::AuctionError;
use crate::instructions::{open_auction, place_bid, BidReceipt, BidRequest, ListingRequest};
use crate::state::Auction;

/// Token account balance and allowance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenBalance {
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
    pub delegate: Option<Pubkey>,
    pub delegated_amount: u64,
}

/// Accounts of a listing request.
#[derive(Clone, Copy, Debug)]
pub struct ListingAccounts {
    pub seller: Pubkey,
    pub asset_acc: Pubkey,
    pub asset_mint: Pubkey,
    pub payment_mint: Pubkey,
}

/// Accounts of a bid request.
#[derive(Clone, Copy, Debug)]
pub struct BidAccounts {
    pub bidder: Pubkey,
    pub auction: Pubkey,
    pub bidding_account: Pubkey,
    pub escrow: Pubkey,
    /// Account believed to be the current high bidder
    pub previous_bidder: Option<Pubkey>,
    pub payment_mint: Pubkey,
}

#[derive(Clone, Debug)]
pub struct Ledger {
    program_id: Pubkey,
    mints: BTreeMap<Pubkey, u8>,
    accounts: BTreeMap<Pubkey, TokenBalance>,
    auctions: BTreeMap<Pubkey, Auction>,
}

impl Ledger {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            mints: BTreeMap::new(),
            accounts: BTreeMap::new(),
            auctions: BTreeMap::new(),
        }
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    pub fn create_mint(&mut self, decimals: u8) -> Pubkey {
        let mint = Pubkey::new_unique();
        self.mints.insert(mint, decimals);
        mint
    }

    /// Opens a token account for `owner` holding `amount` freshly minted units.
    pub fn create_account(&mut self, mint: &Pubkey, owner: &Pubkey, amount: u64) -> Pubkey {
        let key = Pubkey::new_unique();
        self.accounts.insert(
            key,
            TokenBalance {
                mint: *mint,
                owner: *owner,
                amount,
                ..TokenBalance::default()
            },
        );
        key
    }

    pub fn token_account(&self, key: &Pubkey) -> Option<&TokenBalance> {
        self.accounts.get(key)
    }

    pub fn balance(&self, key: &Pubkey) -> u64 {
        self.accounts.get(key).map_or(0, |account| account.amount)
    }

    /// Read-only lookup of an auction record by its derived address.
    pub fn fetch_auction(&self, auction: &Pubkey) -> Option<&Auction> {
        self.auctions.get(auction)
    }

    /// Lists the asset, returning the auction address.
    ///
    /// # Errors
    /// See `instructions::open_auction`. Unknown accounts or mints fail with
    /// `AuctionError::AccountMismatch`.
    pub fn list(
        &mut self,
        accounts: &ListingAccounts,
        quantity: u64,
        min_price: u64,
    ) -> Result<Pubkey> {
        let program_id = self.program_id;
        let (auction_key, auction_bump) = auction_address(&program_id, &accounts.asset_acc);
        let (escrow_key, escrow_bump) = escrow_address(&program_id, &auction_key);

        self.atomically(|ledger| {
            let asset = ledger.view(&accounts.asset_acc)?;
            let asset_mint = MintView {
                key: accounts.asset_mint,
                decimals: ledger.decimals(&accounts.asset_mint)?,
            };
            ledger.decimals(&accounts.payment_mint)?;

            // init_if_needed: the escrow of an earlier listing is reused
            ledger
                .accounts
                .entry(escrow_key)
                .or_insert_with(|| TokenBalance {
                    mint: accounts.payment_mint,
                    owner: auction_key,
                    ..TokenBalance::default()
                });
            let escrow = ledger.view(&escrow_key)?;

            let mut slot = ledger
                .auctions
                .get(&auction_key)
                .cloned()
                .unwrap_or_default();
            let request = ListingRequest {
                seller: accounts.seller,
                asset,
                asset_mint,
                payment_mint: accounts.payment_mint,
                auction: auction_key,
                auction_bump,
                escrow,
                escrow_bump,
                quantity,
                min_price,
            };
            open_auction(&program_id, &mut slot, &request, ledger)?;
            ledger.auctions.insert(auction_key, slot);

            Ok(auction_key)
        })
    }

    /// Places a bid.
    ///
    /// # Errors
    /// See `instructions::place_bid`. An unknown auction address fails with
    /// `AuctionError::AccountMismatch`.
    pub fn bid(&mut self, accounts: &BidAccounts, amount: u64) -> Result<BidReceipt> {
        let program_id = self.program_id;

        self.atomically(|ledger| {
            let mut auction = ledger
                .auctions
                .get(&accounts.auction)
                .cloned()
                .ok_or_else(|| error!(AuctionError::AccountMismatch))?;
            let request = BidRequest {
                bidder: accounts.bidder,
                bidding_account: ledger.view(&accounts.bidding_account)?,
                escrow: ledger.view(&accounts.escrow)?,
                payment_mint: accounts.payment_mint,
                previous_bidder: accounts.previous_bidder,
                amount,
            };
            let receipt = place_bid(
                &program_id,
                &accounts.auction,
                &mut auction,
                &request,
                ledger,
            )?;
            ledger.auctions.insert(accounts.auction, auction);

            Ok(receipt)
        })
    }

    /// Runs `apply` as one request: on error every account and record is
    /// restored to its prior state.
    fn atomically<T>(&mut self, apply: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let accounts = self.accounts.clone();
        let auctions = self.auctions.clone();

        apply(self).map_err(|err| {
            self.accounts = accounts;
            self.auctions = auctions;
            err
        })
    }

    fn view(&self, key: &Pubkey) -> Result<TokenAccountView> {
        let account = self
            .accounts
            .get(key)
            .ok_or_else(|| error!(AuctionError::AccountMismatch))?;
        Ok(TokenAccountView {
            key: *key,
            mint: account.mint,
            owner: account.owner,
            amount: account.amount,
        })
    }

    fn decimals(&self, mint: &Pubkey) -> Result<u8> {
        self.mints
            .get(mint)
            .copied()
            .ok_or_else(|| error!(AuctionError::AccountMismatch))
    }

    fn account_mut(&mut self, key: &Pubkey) -> Result<&mut TokenBalance> {
        self.accounts
            .get_mut(key)
            .ok_or_else(|| error!(AuctionError::AccountMismatch))
    }
}

impl Custody for Ledger {
    fn delegate(
        &mut self,
        asset: &Pubkey,
        owner: &Pubkey,
        to: &Pubkey,
        quantity: u64,
    ) -> Result<()> {
        let account = self.account_mut(asset)?;
        require_keys_eq!(account.owner, *owner, AuctionError::Unauthorized);
        require!(
            account.amount >= quantity,
            AuctionError::InsufficientBalance
        );

        account.delegate = Some(*to);
        account.delegated_amount = quantity;
        Ok(())
    }

    fn transfer(
        &mut self,
        from: &Pubkey,
        to: &Pubkey,
        amount: u64,
        authority: Authority<'_>,
    ) -> Result<()> {
        let signer = authority.key();
        let destination_mint = self.view(to)?.mint;
        let source = self.account_mut(from)?;
        require_keys_eq!(source.mint, destination_mint, AuctionError::AccountMismatch);

        if source.owner != signer {
            require!(
                source.delegate == Some(signer) && source.delegated_amount >= amount,
                AuctionError::Unauthorized
            );
        }
        require!(source.amount >= amount, AuctionError::InsufficientBalance);

        if source.owner != signer {
            source.delegated_amount -= amount;
            if source.delegated_amount == 0 {
                source.delegate = None;
            }
        }
        source.amount -= amount;

        let destination = self.account_mut(to)?;
        destination.amount = destination
            .amount
            .checked_add(amount)
            .ok_or(AuctionError::Overflow)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derivation::AuctionAuthority;
    use anchor_lang::error::Error;

    #[test]
    fn owner_transfer_moves_funds() {
        let mut ledger = Ledger::new(crate::ID);
        let mint = ledger.create_mint(6);
        let alice = Pubkey::new_unique();
        let from = ledger.create_account(&mint, &alice, 100);
        let to = ledger.create_account(&mint, &Pubkey::new_unique(), 0);

        ledger
            .transfer(&from, &to, 40, Authority::Owner(alice))
            .unwrap();
        assert_eq!(ledger.balance(&from), 60);
        assert_eq!(ledger.balance(&to), 40);

        let err = ledger
            .transfer(&from, &to, 61, Authority::Owner(alice))
            .unwrap_err();
        assert_eq!(err, Error::from(AuctionError::InsufficientBalance));

        let err = ledger
            .transfer(&from, &to, 1, Authority::Owner(Pubkey::new_unique()))
            .unwrap_err();
        assert_eq!(err, Error::from(AuctionError::Unauthorized));
    }

    #[test]
    fn delegated_allowance_is_capped_and_consumed() {
        let mut ledger = Ledger::new(crate::ID);
        let mint = ledger.create_mint(0);
        let seller = Pubkey::new_unique();
        let asset = ledger.create_account(&mint, &seller, 3);
        let sink = ledger.create_account(&mint, &Pubkey::new_unique(), 0);
        let authority = AuctionAuthority::derive(&crate::ID, &asset);

        let err = ledger
            .delegate(&asset, &Pubkey::new_unique(), &authority.key(), 1)
            .unwrap_err();
        assert_eq!(err, Error::from(AuctionError::Unauthorized));
        let err = ledger
            .delegate(&asset, &seller, &authority.key(), 4)
            .unwrap_err();
        assert_eq!(err, Error::from(AuctionError::InsufficientBalance));

        ledger
            .delegate(&asset, &seller, &authority.key(), 2)
            .unwrap();
        let account = ledger.token_account(&asset).unwrap();
        assert_eq!(account.delegate, Some(authority.key()));
        assert_eq!(account.delegated_amount, 2);
        assert_eq!(account.owner, seller);

        let err = ledger
            .transfer(&asset, &sink, 3, Authority::Program(&authority))
            .unwrap_err();
        assert_eq!(err, Error::from(AuctionError::Unauthorized));

        ledger
            .transfer(&asset, &sink, 2, Authority::Program(&authority))
            .unwrap();
        let account = ledger.token_account(&asset).unwrap();
        assert_eq!(account.amount, 1);
        assert_eq!(account.delegate, None);
    }

    #[test]
    fn transfers_never_cross_currencies() {
        let mut ledger = Ledger::new(crate::ID);
        let usdc = ledger.create_mint(6);
        let other = ledger.create_mint(6);
        let owner = Pubkey::new_unique();
        let from = ledger.create_account(&usdc, &owner, 10);
        let to = ledger.create_account(&other, &owner, 0);

        let err = ledger
            .transfer(&from, &to, 1, Authority::Owner(owner))
            .unwrap_err();
        assert_eq!(err, Error::from(AuctionError::AccountMismatch));
        assert_eq!(ledger.balance(&from), 10);
    }

    #[test]
    fn failed_request_rolls_back() {
        let mut ledger = Ledger::new(crate::ID);
        let mint = ledger.create_mint(6);
        let owner = Pubkey::new_unique();
        let from = ledger.create_account(&mint, &owner, 10);
        let to = ledger.create_account(&mint, &owner, 0);

        let result: Result<()> = ledger.atomically(|ledger| {
            ledger.transfer(&from, &to, 4, Authority::Owner(owner))?;
            ledger.transfer(&from, &to, 7, Authority::Owner(owner))
        });
        assert_eq!(
            result.unwrap_err(),
            Error::from(AuctionError::InsufficientBalance)
        );
        assert_eq!(ledger.balance(&from), 10);
        assert_eq!(ledger.balance(&to), 0);
    }
}
