// ======================================================================
// PRECONDITIONS
// ======================================================================
//
// Shared by listing and bidding. Every check runs before the first custody
// call so a rejected request never leaves partial effects behind.

use anchor_lang::prelude::*;

use crate::custody::TokenAccountView;
use crate::error::AuctionError;

/// The signer must own the token account it is spending from.
pub fn require_owner(account: &TokenAccountView, signer: &Pubkey) -> Result<()> {
    require_keys_eq!(account.owner, *signer, AuctionError::Unauthorized);
    Ok(())
}

/// Currency identity check.
pub fn require_mint(account: &TokenAccountView, mint: &Pubkey) -> Result<()> {
    require_keys_eq!(account.mint, *mint, AuctionError::AccountMismatch);
    Ok(())
}

/// Account identity check against a recorded or derived key.
pub fn require_account(account: &TokenAccountView, expected: &Pubkey) -> Result<()> {
    require_keys_eq!(account.key, *expected, AuctionError::AccountMismatch);
    Ok(())
}

pub fn require_positive(amount: u64) -> Result<()> {
    require!(amount > 0, AuctionError::InvalidAmount);
    Ok(())
}

pub fn require_funds(available: u64, amount: u64) -> Result<()> {
    require!(available >= amount, AuctionError::InsufficientBalance);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_lang::error::Error;

    fn account(owner: Pubkey, mint: Pubkey, amount: u64) -> TokenAccountView {
        TokenAccountView {
            key: Pubkey::new_unique(),
            mint,
            owner,
            amount,
        }
    }

    #[test]
    fn ownership_and_currency() {
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let acc = account(owner, mint, 10);

        require_owner(&acc, &owner).unwrap();
        require_mint(&acc, &mint).unwrap();
        require_account(&acc, &acc.key).unwrap();

        assert_eq!(
            require_owner(&acc, &Pubkey::new_unique()).unwrap_err(),
            Error::from(AuctionError::Unauthorized)
        );
        assert_eq!(
            require_mint(&acc, &Pubkey::new_unique()).unwrap_err(),
            Error::from(AuctionError::AccountMismatch)
        );
        assert_eq!(
            require_account(&acc, &Pubkey::new_unique()).unwrap_err(),
            Error::from(AuctionError::AccountMismatch)
        );
    }

    #[test]
    fn amounts() {
        require_positive(1).unwrap();
        require_funds(10, 10).unwrap();

        assert_eq!(
            require_positive(0).unwrap_err(),
            Error::from(AuctionError::InvalidAmount)
        );
        assert_eq!(
            require_funds(9, 10).unwrap_err(),
            Error::from(AuctionError::InsufficientBalance)
        );
    }
}
