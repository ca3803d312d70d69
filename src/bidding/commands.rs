/// 경매 커맨드 처리
/// 1. 상품 등록
/// 2. 입찰
/// 3. 경매 종료
/// 4. 관심 목록 토글
// region:    --- Imports
use super::locks::KeyedLocks;
use crate::auction::error::AuctionError;
use crate::auction::events::AuctionEvent;
use crate::auction::model::{
    Bid, CategoryId, Listing, ListingId, Membership, Money, NewListing, UserId,
};
use crate::auction::pricing;
use crate::config::DEFAULT_BID_MAX_ATTEMPTS;
use crate::message_broker::{EventPublisher, LogPublisher};
use crate::store::{AuctionStore, Committed, ListingChange, StoreError};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Commands
/// 상품 등록 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenListingCommand {
    pub seller_id: UserId,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub starting_price: Decimal,
    pub category_id: Option<CategoryId>,
}

/// 입찰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub listing_id: ListingId,
    pub bidder_id: UserId,
    pub amount: Decimal,
}

/// 경매 종료 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CloseAuctionCommand {
    pub listing_id: ListingId,
    pub requester_id: UserId,
}

/// 관심 목록 토글 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToggleWatchlistCommand {
    pub listing_id: ListingId,
    pub user_id: UserId,
}

// 상품 제목/설명/이미지 주소 최대 길이
const MAX_TITLE_LEN: usize = 60;
const MAX_DESCRIPTION_LEN: usize = 1000;
const MAX_IMAGE_URL_LEN: usize = 200;

// endregion: --- Commands

// region:    --- Results
/// 입찰 수락 결과
#[derive(Debug, Clone, Serialize)]
pub struct BidAccepted {
    pub bid: Bid,
    pub new_price: Money,
}

/// 경매 종료 결과
#[derive(Debug, Clone, Serialize)]
pub struct AuctionClosed {
    pub listing: Listing,
    pub winning_bid: Option<Bid>,
}

impl AuctionClosed {
    pub fn winner(&self) -> Option<UserId> {
        self.winning_bid.as_ref().map(|bid| bid.bidder)
    }
}

/// 상품 상세 (최고 입찰 + 최소 다음 입찰가)
#[derive(Debug, Clone, Serialize)]
pub struct ListingDetail {
    pub listing: Listing,
    pub top_bid: Option<Bid>,
    pub minimum_next_bid: Option<Decimal>,
}

// endregion: --- Results

// region:    --- Controller
/// 경매 컨트롤러
///
/// 같은 상품에 대한 입찰과 종료는 상품 단위 락과 버전 비교 갱신으로 직렬화된다.
/// 관심 목록 토글은 (user, listing) 단위의 별도 락을 사용한다.
pub struct AuctionController {
    store: Arc<dyn AuctionStore>,
    publisher: Arc<dyn EventPublisher>,
    listing_locks: KeyedLocks<ListingId>,
    watch_locks: KeyedLocks<(UserId, ListingId)>,
    max_attempts: u32,
}

impl AuctionController {
    pub fn new(store: Arc<dyn AuctionStore>) -> Self {
        Self {
            store,
            publisher: Arc::new(LogPublisher),
            listing_locks: KeyedLocks::new(),
            watch_locks: KeyedLocks::new(),
            max_attempts: DEFAULT_BID_MAX_ATTEMPTS,
        }
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = publisher;
        self
    }

    /// 버전 충돌 시 최대 시도 횟수 (최소 1)
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// 1. 상품 등록
    pub async fn open_listing(&self, cmd: OpenListingCommand) -> Result<Listing, AuctionError> {
        info!("{:<12} --> 상품 등록 요청: {:?}", "Command", cmd);
        let title = cmd.title.trim().to_string();
        if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
            return Err(AuctionError::InvalidListing(format!(
                "title must be 1 to {MAX_TITLE_LEN} characters"
            )));
        }
        if cmd.description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(AuctionError::InvalidListing(format!(
                "description must be at most {MAX_DESCRIPTION_LEN} characters"
            )));
        }
        let image_url = validate_image_url(cmd.image_url)?;
        let starting_price = Money::new(cmd.starting_price)?;

        let listing = self
            .store
            .create_listing(NewListing {
                title,
                description: cmd.description,
                image_url,
                owner: cmd.seller_id,
                category: cmd.category_id,
                starting_price,
            })
            .await
            .map_err(AuctionError::Store)?;

        info!("{:<12} --> 상품 등록 완료 id: {}", "Command", listing.id);
        self.publish(AuctionEvent::listing_opened(&listing)).await;
        Ok(listing)
    }

    /// 2. 입찰
    pub async fn place_bid(&self, cmd: PlaceBidCommand) -> Result<BidAccepted, AuctionError> {
        info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);
        let amount = Money::new(cmd.amount)?;
        let listing_id = cmd.listing_id;

        let _guard = self.listing_locks.lock(listing_id).await;
        let committed = self
            .commit_with_retry(listing_id, |listing| {
                pricing::check_bid(listing, amount)?;
                Ok(ListingChange::AcceptBid {
                    bidder: cmd.bidder_id,
                    amount,
                    placed_at: Utc::now(),
                })
            })
            .await
            .inspect_err(|e| info!("{:<12} --> 입찰 거절 id: {} ({})", "Command", listing_id, e))?;

        let Some(bid) = committed.bid else {
            error!("{:<12} --> 입찰 기록 누락 id: {}", "Command", listing_id);
            return Err(AuctionError::Store(StoreError::Corrupt(format!(
                "accepted bid on listing {listing_id} was not recorded"
            ))));
        };
        info!(
            "{:<12} --> 입찰 성공 id: {}, 현재 가격 {}",
            "Command", listing_id, committed.listing.current_price
        );
        self.publish(AuctionEvent::bid_placed(&bid)).await;

        Ok(BidAccepted {
            new_price: committed.listing.current_price,
            bid,
        })
    }

    /// 3. 경매 종료
    pub async fn close_auction(
        &self,
        cmd: CloseAuctionCommand,
    ) -> Result<AuctionClosed, AuctionError> {
        info!("{:<12} --> 경매 종료 요청: {:?}", "Command", cmd);
        let listing_id = cmd.listing_id;

        let _guard = self.listing_locks.lock(listing_id).await;
        let committed = self
            .commit_with_retry(listing_id, |listing| {
                if !listing.is_owned_by(cmd.requester_id) {
                    return Err(AuctionError::NotOwner(listing.id));
                }
                if !listing.is_active() {
                    return Err(AuctionError::AlreadyClosed(listing.id));
                }
                Ok(ListingChange::Close)
            })
            .await
            .inspect_err(|e| info!("{:<12} --> 경매 종료 거절 id: {} ({})", "Command", listing_id, e))?;

        // 종료가 커밋된 뒤에는 새 입찰이 들어올 수 없다
        let winning_bid = self
            .store
            .highest_bid(listing_id)
            .await
            .map_err(|e| AuctionError::from_store(listing_id, e))?;

        info!(
            "{:<12} --> 경매 종료 id: {}, 낙찰자 {:?}",
            "Command",
            listing_id,
            winning_bid.as_ref().map(|bid| bid.bidder)
        );
        self.publish(AuctionEvent::auction_closed(
            &committed.listing,
            winning_bid.as_ref(),
        ))
        .await;

        Ok(AuctionClosed {
            listing: committed.listing,
            winning_bid,
        })
    }

    /// 4. 관심 목록 토글. 경매 상태나 입찰 락과 무관
    pub async fn toggle_watchlist(
        &self,
        cmd: ToggleWatchlistCommand,
    ) -> Result<Membership, AuctionError> {
        let ToggleWatchlistCommand {
            listing_id,
            user_id,
        } = cmd;
        self.store
            .get_listing(listing_id)
            .await
            .map_err(|e| AuctionError::from_store(listing_id, e))?;

        let _guard = self.watch_locks.lock((user_id, listing_id)).await;
        let membership = self
            .store
            .toggle(user_id, listing_id)
            .await
            .map_err(|e| AuctionError::from_store(listing_id, e))?;

        info!(
            "{:<12} --> 관심 목록 {:?} user: {}, listing: {}",
            "Command", membership, user_id, listing_id
        );
        Ok(membership)
    }

    /// 스냅샷 읽기 -> 검증 -> 버전 비교 갱신. 버전 충돌이면 다시 읽고 재검증
    async fn commit_with_retry<F>(
        &self,
        listing_id: ListingId,
        decide: F,
    ) -> Result<Committed, AuctionError>
    where
        F: Fn(&Listing) -> Result<ListingChange, AuctionError>,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let listing = self
                .store
                .get_listing(listing_id)
                .await
                .map_err(|e| AuctionError::from_store(listing_id, e))?;
            let change = decide(&listing)?;

            match self
                .store
                .compare_and_update(listing_id, listing.version, change)
                .await
            {
                Ok(committed) => return Ok(committed),
                Err(StoreError::Conflict) if attempts < self.max_attempts => {
                    warn!(
                        "{:<12} --> 낙관적 업데이트로 인한 버전 충돌: 재시도 ({}/{})",
                        "Command", attempts, self.max_attempts
                    );
                }
                Err(StoreError::Conflict) => {
                    warn!(
                        "{:<12} --> 최대 재시도 횟수 초과 id: {}",
                        "Command", listing_id
                    );
                    return Err(AuctionError::Conflict {
                        listing_id,
                        attempts,
                    });
                }
                Err(e) => {
                    error!("{:<12} --> 저장소 오류 id: {}: {:?}", "Command", listing_id, e);
                    return Err(AuctionError::from_store(listing_id, e));
                }
            }
        }
    }

    /// 커밋 이후 이벤트 발행. 실패는 경고로만 남긴다
    async fn publish(&self, event: AuctionEvent) {
        if let Err(e) = self.publisher.publish(&event).await {
            warn!(
                "{:<12} --> 이벤트 발행 실패 {} listing: {}: {}",
                "Command",
                event.event_type(),
                event.listing_id(),
                e
            );
        }
    }
}

/// 이미지 주소 검증. 빈 값은 없음으로 취급하고, 그 외에는 http(s) 주소만 허용
fn validate_image_url(raw: Option<String>) -> Result<Option<String>, AuctionError> {
    let Some(url) = raw.map(|url| url.trim().to_string()).filter(|url| !url.is_empty()) else {
        return Ok(None);
    };
    let host = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or_default();
    if host.is_empty() || url.chars().any(char::is_whitespace) {
        return Err(AuctionError::InvalidListing(
            "image_url must be an http(s) URL".to_string(),
        ));
    }
    if url.chars().count() > MAX_IMAGE_URL_LEN {
        return Err(AuctionError::InvalidListing(format!(
            "image_url must be at most {MAX_IMAGE_URL_LEN} characters"
        )));
    }
    Ok(Some(url))
}

// endregion: --- Controller

// region:    --- Queries
impl AuctionController {
    /// 상품 조회
    pub async fn listing(&self, listing_id: ListingId) -> Result<Listing, AuctionError> {
        info!("{:<12} --> 상품 조회 id: {}", "Query", listing_id);
        self.store
            .get_listing(listing_id)
            .await
            .map_err(|e| AuctionError::from_store(listing_id, e))
    }

    /// 상품 상세 조회. 종료된 경매는 최소 다음 입찰가가 없다
    pub async fn listing_detail(&self, listing_id: ListingId) -> Result<ListingDetail, AuctionError> {
        let listing = self.listing(listing_id).await?;
        let top_bid = self
            .store
            .highest_bid(listing_id)
            .await
            .map_err(|e| AuctionError::from_store(listing_id, e))?;
        let minimum_next_bid = listing
            .is_active()
            .then(|| pricing::minimum_next_bid(&listing));
        Ok(ListingDetail {
            listing,
            top_bid,
            minimum_next_bid,
        })
    }

    /// 입찰 이력 조회 (금액 내림차순)
    pub async fn bid_history(&self, listing_id: ListingId) -> Result<Vec<Bid>, AuctionError> {
        info!("{:<12} --> 입찰 이력 조회 id: {}", "Query", listing_id);
        self.listing(listing_id).await?;
        self.store
            .all_bids(listing_id)
            .await
            .map_err(|e| AuctionError::from_store(listing_id, e))
    }

    /// 진행 중인 상품 조회
    pub async fn active_listings(&self) -> Result<Vec<Listing>, AuctionError> {
        info!("{:<12} --> 진행 중인 상품 조회", "Query");
        self.store.list_active().await.map_err(AuctionError::Store)
    }

    /// 사용자 관심 목록 조회
    pub async fn watchlist(&self, user_id: UserId) -> Result<Vec<Listing>, AuctionError> {
        info!("{:<12} --> 관심 목록 조회 user: {}", "Query", user_id);
        self.store
            .watchlist(user_id)
            .await
            .map_err(AuctionError::Store)
    }
}

// endregion: --- Queries
