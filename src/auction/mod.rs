pub mod error;
pub mod events;
pub mod model;
pub mod pricing;

pub use error::{AuctionError, ErrorKind};
pub use events::AuctionEvent;
pub use model::{
    Bid, BidId, CategoryId, Listing, ListingId, ListingStatus, Membership, Money, MoneyError,
    NewListing, UserId,
};
