//! 경매 코어가 사용하는 저장소 계약
//!
//! 상품 저장소, 입찰 원장, 관심 목록 저장소 세 가지로 나뉜다. 입찰 원장 추가는
//! [`ListingStore::compare_and_update`]의 [`ListingChange::AcceptBid`] 안에서 가격
//! 갱신과 같은 트랜잭션으로 수행된다.

// region:    --- Imports
use crate::auction::model::{Bid, Listing, ListingId, Membership, Money, NewListing, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

// endregion: --- Imports

// region:    --- Errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    /// 기대 버전과 저장된 버전이 다름. 다시 읽고 재시도 가능
    #[error("version conflict")]
    Conflict,

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

// endregion: --- Errors

// region:    --- Changes
/// 상품에 적용할 변경
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingChange {
    /// 입찰 원장에 추가하고 현재 가격을 `amount`로 설정
    AcceptBid {
        bidder: UserId,
        amount: Money,
        placed_at: DateTime<Utc>,
    },
    /// Active -> Closed
    Close,
}

/// 커밋 결과
#[derive(Debug, Clone)]
pub struct Committed {
    pub listing: Listing,
    pub bid: Option<Bid>,
}

// endregion: --- Changes

// region:    --- Traits
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn create_listing(&self, listing: NewListing) -> Result<Listing, StoreError>;

    async fn get_listing(&self, id: ListingId) -> Result<Listing, StoreError>;

    /// `expected_version`이 저장된 버전과 같을 때만 `change`를 적용한다.
    async fn compare_and_update(
        &self,
        id: ListingId,
        expected_version: i64,
        change: ListingChange,
    ) -> Result<Committed, StoreError>;

    async fn list_active(&self) -> Result<Vec<Listing>, StoreError>;
}

#[async_trait]
pub trait BidLedger: Send + Sync {
    async fn highest_bid(&self, listing_id: ListingId) -> Result<Option<Bid>, StoreError>;

    /// 금액 내림차순 (동액이면 먼저 들어온 순)
    async fn all_bids(&self, listing_id: ListingId) -> Result<Vec<Bid>, StoreError>;
}

#[async_trait]
pub trait WatchlistStore: Send + Sync {
    async fn contains(&self, user: UserId, listing_id: ListingId) -> Result<bool, StoreError>;

    async fn add(&self, user: UserId, listing_id: ListingId) -> Result<(), StoreError>;

    async fn remove(&self, user: UserId, listing_id: ListingId) -> Result<(), StoreError>;

    async fn watchlist(&self, user: UserId) -> Result<Vec<Listing>, StoreError>;

    /// 있으면 제거, 없으면 추가. 호출자가 (user, listing) 단위로 직렬화해야 한다.
    async fn toggle(&self, user: UserId, listing_id: ListingId) -> Result<Membership, StoreError> {
        if self.contains(user, listing_id).await? {
            self.remove(user, listing_id).await?;
            Ok(Membership::Removed)
        } else {
            self.add(user, listing_id).await?;
            Ok(Membership::Added)
        }
    }
}

/// 컨트롤러가 사용하는 저장소 묶음
pub trait AuctionStore: ListingStore + BidLedger + WatchlistStore {}

impl<T> AuctionStore for T where T: ListingStore + BidLedger + WatchlistStore {}

// endregion: --- Traits
