use anchor_lang::prelude::*;

#[error_code]
pub enum AuctionError {
    #[msg("Asset account is already listed")]
    AlreadyListed,
    #[msg("Insufficient balance")]
    InsufficientBalance,
    #[msg("Bid must exceed both the minimum price and the current high bid")]
    BidTooLow,
    // Clients should re-read the auction and retry rather than resubmit.
    #[msg("Stale high bidder reference, re-read the auction and retry")]
    StaleBidderReference,
    #[msg("Account does not match the recorded or derivable account")]
    AccountMismatch,
    #[msg("Unauthorized")]
    Unauthorized,
    #[msg("Program address derivation could not be reproduced")]
    DerivationFailure,

    // --- numeric / asset checks ---
    #[msg("Invalid amount")]
    InvalidAmount,
    #[msg("Math overflow")]
    Overflow,
    #[msg("Asset mint is not a non-fungible (zero decimals) token")]
    InvalidAsset,
}
