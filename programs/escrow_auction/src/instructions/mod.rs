pub mod bidding;
pub mod listing;

pub use bidding::{place_bid, BidReceipt, BidRequest};
pub use listing::{open_auction, ListingRequest};
