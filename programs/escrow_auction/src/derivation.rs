// ======================================================================
// PROGRAM ADDRESS DERIVATION
// ======================================================================
//
// Every auction lives at an address derived from the asset account it
// sells, and its escrow lives at an address derived from the auction:
//
//   auction = PDA([asset_acc])
//   escrow  = PDA([auction])
//
// No registry is needed to find an auction; any client holding the asset
// account key can recompute both addresses.

use anchor_lang::prelude::*;

use crate::error::AuctionError;

/// Canonical auction address and bump for an asset account.
pub fn auction_address(program_id: &Pubkey, asset_acc: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[asset_acc.as_ref()], program_id)
}

/// Canonical escrow address and bump for an auction.
pub fn escrow_address(program_id: &Pubkey, auction: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[auction.as_ref()], program_id)
}

/// Re-derives the escrow address from a stored bump.
///
/// # Errors
/// - `AuctionError::DerivationFailure` if the seeds and bump do not produce `claimed`
pub fn verify_escrow(
    program_id: &Pubkey,
    auction: &Pubkey,
    bump: u8,
    claimed: &Pubkey,
) -> Result<()> {
    let derived = Pubkey::create_program_address(&[auction.as_ref(), &[bump]], program_id)
        .map_err(|_| error!(AuctionError::DerivationFailure))?;
    require_keys_eq!(derived, *claimed, AuctionError::DerivationFailure);
    Ok(())
}

/// Signing capability of an auction's derived address.
///
/// The auction address has no private key. The only way to hold one of
/// these is to re-derive the address from its seeds, so possessing an
/// `AuctionAuthority` is proof that the program may sign for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuctionAuthority {
    address: Pubkey,
    asset_acc: Pubkey,
    bump_seed: [u8; 1],
}

impl AuctionAuthority {
    /// Searches for the canonical bump. Deterministic for every verifier.
    pub fn derive(program_id: &Pubkey, asset_acc: &Pubkey) -> Self {
        let (address, bump) = auction_address(program_id, asset_acc);
        Self {
            address,
            asset_acc: *asset_acc,
            bump_seed: [bump],
        }
    }

    /// Recomputes the address from the asset account and a stored bump and
    /// checks it against the address the caller claims to act for.
    ///
    /// # Errors
    /// - `AuctionError::DerivationFailure` if the bump lands on-curve or the
    ///   recomputed address differs from `claimed`
    pub fn verify(
        program_id: &Pubkey,
        asset_acc: &Pubkey,
        bump: u8,
        claimed: &Pubkey,
    ) -> Result<Self> {
        let address = Pubkey::create_program_address(&[asset_acc.as_ref(), &[bump]], program_id)
            .map_err(|_| error!(AuctionError::DerivationFailure))?;
        require_keys_eq!(address, *claimed, AuctionError::DerivationFailure);

        Ok(Self {
            address,
            asset_acc: *asset_acc,
            bump_seed: [bump],
        })
    }

    pub fn key(&self) -> Pubkey {
        self.address
    }

    pub fn bump(&self) -> u8 {
        self.bump_seed[0]
    }

    /// Seeds for `CpiContext::new_with_signer`.
    pub fn signer_seeds(&self) -> [&[u8]; 2] {
        [self.asset_acc.as_ref(), &self.bump_seed]
    }
}
