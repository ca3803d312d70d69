//! 단일 상품 오름차순 경매 엔진
//!
//! 입찰 가격 단조 증가, 상품 단위 직렬화, Active -> Closed 전이를 담당한다.
pub mod auction;
pub mod bidding;
pub mod config;
pub mod database;
pub mod handlers;
pub mod message_broker;
pub mod store;

pub use auction::{AuctionError, ErrorKind};
pub use bidding::AuctionController;
