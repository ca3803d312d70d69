pub mod commands;
pub mod locks;

pub use commands::{
    AuctionClosed, AuctionController, BidAccepted, CloseAuctionCommand, ListingDetail,
    OpenListingCommand, PlaceBidCommand, ToggleWatchlistCommand,
};
