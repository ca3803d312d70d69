//! 통합 테스트 공용 도구
#![allow(dead_code)]

use async_trait::async_trait;
use auction_engine::auction::events::AuctionEvent;
use auction_engine::auction::model::{Bid, Listing, ListingId, Membership, Money, NewListing, UserId};
use auction_engine::bidding::commands::{
    CloseAuctionCommand, OpenListingCommand, PlaceBidCommand, ToggleWatchlistCommand,
};
use auction_engine::message_broker::{EventPublisher, PublishError};
use auction_engine::store::{
    BidLedger, Committed, InMemoryStore, ListingChange, ListingStore, StoreError, WatchlistStore,
};
use auction_engine::AuctionController;
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

pub const SELLER: UserId = UserId(1);
pub const ALICE: UserId = UserId(2);
pub const BOB: UserId = UserId(3);

/// 트레이싱 초기화 (여러 테스트에서 호출해도 안전)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .without_time()
        .with_target(false)
        .with_test_writer()
        .try_init();
}

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn money(s: &str) -> Money {
    s.parse().unwrap()
}

pub fn open_cmd(starting_price: &str) -> OpenListingCommand {
    OpenListingCommand {
        seller_id: SELLER,
        title: "Laptop".to_string(),
        description: "A great laptop".to_string(),
        image_url: None,
        starting_price: dec(starting_price),
        category_id: None,
    }
}

pub fn bid_cmd(listing_id: ListingId, bidder_id: UserId, amount: &str) -> PlaceBidCommand {
    PlaceBidCommand {
        listing_id,
        bidder_id,
        amount: dec(amount),
    }
}

pub fn close_cmd(listing_id: ListingId, requester_id: UserId) -> CloseAuctionCommand {
    CloseAuctionCommand {
        listing_id,
        requester_id,
    }
}

pub fn toggle_cmd(listing_id: ListingId, user_id: UserId) -> ToggleWatchlistCommand {
    ToggleWatchlistCommand {
        listing_id,
        user_id,
    }
}

/// 메모리 저장소 기반 컨트롤러
pub fn controller() -> (AuctionController, Arc<InMemoryStore>) {
    init_tracing();
    let store = InMemoryStore::new_shared();
    (AuctionController::new(store.clone()), store)
}

/// 테스트용 상품 생성
pub async fn open_listing(controller: &AuctionController, starting_price: &str) -> Listing {
    controller.open_listing(open_cmd(starting_price)).await.unwrap()
}

// region:    --- Recording Publisher
/// 발행된 이벤트를 기록하는 발행자
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<AuctionEvent>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<AuctionEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &AuctionEvent) -> Result<(), PublishError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// 항상 실패하는 발행자
#[derive(Debug, Default)]
pub struct BrokenPublisher;

#[async_trait]
impl EventPublisher for BrokenPublisher {
    async fn publish(&self, _event: &AuctionEvent) -> Result<(), PublishError> {
        Err(PublishError::Broker("broker unavailable".to_string()))
    }
}

// endregion: --- Recording Publisher

// region:    --- Faulty Store
/// 다른 프로세스의 동시 커밋을 흉내 내는 저장소
///
/// - `conflicts`: 남은 횟수만큼 버전 비교 갱신을 충돌로 실패시킴
/// - `interference`: 다음 버전 비교 갱신 직전에 경쟁 입찰을 먼저 커밋
#[derive(Debug, Default)]
pub struct FaultyStore {
    pub inner: InMemoryStore,
    conflicts: AtomicU32,
    cas_calls: AtomicU32,
    interference: Mutex<Option<(UserId, Money)>>,
}

impl FaultyStore {
    pub fn with_conflicts(conflicts: u32) -> Self {
        let store = Self::default();
        store.conflicts.store(conflicts, Ordering::SeqCst);
        store
    }

    pub fn interfere_with_bid(&self, bidder: UserId, amount: Money) {
        *self.interference.lock() = Some((bidder, amount));
    }

    pub fn cas_calls(&self) -> u32 {
        self.cas_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ListingStore for FaultyStore {
    async fn create_listing(&self, listing: NewListing) -> Result<Listing, StoreError> {
        self.inner.create_listing(listing).await
    }

    async fn get_listing(&self, id: ListingId) -> Result<Listing, StoreError> {
        self.inner.get_listing(id).await
    }

    async fn compare_and_update(
        &self,
        id: ListingId,
        expected_version: i64,
        change: ListingChange,
    ) -> Result<Committed, StoreError> {
        self.cas_calls.fetch_add(1, Ordering::SeqCst);

        let competing = self.interference.lock().take();
        if let Some((bidder, amount)) = competing {
            let current = self.inner.get_listing(id).await?;
            self.inner
                .compare_and_update(
                    id,
                    current.version,
                    ListingChange::AcceptBid {
                        bidder,
                        amount,
                        placed_at: Utc::now(),
                    },
                )
                .await?;
        }

        let forced = self
            .conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if forced {
            return Err(StoreError::Conflict);
        }
        self.inner.compare_and_update(id, expected_version, change).await
    }

    async fn list_active(&self) -> Result<Vec<Listing>, StoreError> {
        self.inner.list_active().await
    }
}

#[async_trait]
impl BidLedger for FaultyStore {
    async fn highest_bid(&self, listing_id: ListingId) -> Result<Option<Bid>, StoreError> {
        self.inner.highest_bid(listing_id).await
    }

    async fn all_bids(&self, listing_id: ListingId) -> Result<Vec<Bid>, StoreError> {
        self.inner.all_bids(listing_id).await
    }
}

#[async_trait]
impl WatchlistStore for FaultyStore {
    async fn contains(&self, user: UserId, listing_id: ListingId) -> Result<bool, StoreError> {
        self.inner.contains(user, listing_id).await
    }

    async fn add(&self, user: UserId, listing_id: ListingId) -> Result<(), StoreError> {
        self.inner.add(user, listing_id).await
    }

    async fn remove(&self, user: UserId, listing_id: ListingId) -> Result<(), StoreError> {
        self.inner.remove(user, listing_id).await
    }

    async fn watchlist(&self, user: UserId) -> Result<Vec<Listing>, StoreError> {
        self.inner.watchlist(user).await
    }

    async fn toggle(&self, user: UserId, listing_id: ListingId) -> Result<Membership, StoreError> {
        self.inner.toggle(user, listing_id).await
    }
}

// endregion: --- Faulty Store
