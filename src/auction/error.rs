use super::model::{ListingId, Money, MoneyError};
use crate::store::StoreError;
use thiserror::Error;

/// 오류 분류. 재시도 가능 여부와 HTTP 상태 매핑에 사용
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    State,
    Authorization,
    NotFound,
    Conflict,
    Internal,
}

#[derive(Debug, Error)]
pub enum AuctionError {
    #[error("you must bid higher than ${current_price}")]
    BidTooLow {
        listing_id: ListingId,
        current_price: Money,
    },

    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] MoneyError),

    #[error("invalid listing: {0}")]
    InvalidListing(String),

    /// 본문이 JSON이 아니거나 필드가 빠진 요청
    #[error("malformed request: {0}")]
    InvalidRequest(String),

    #[error("auction {0} is closed")]
    AuctionClosed(ListingId),

    #[error("auction {0} is already closed")]
    AlreadyClosed(ListingId),

    #[error("only the seller can close auction {0}")]
    NotOwner(ListingId),

    #[error("listing {0} not found")]
    NotFound(ListingId),

    #[error("listing {listing_id} is busy, gave up after {attempts} attempts")]
    Conflict {
        listing_id: ListingId,
        attempts: u32,
    },

    #[error("storage error")]
    Store(#[source] StoreError),
}

impl AuctionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuctionError::BidTooLow { .. }
            | AuctionError::InvalidAmount(_)
            | AuctionError::InvalidListing(_)
            | AuctionError::InvalidRequest(_) => ErrorKind::Validation,
            AuctionError::AuctionClosed(_) | AuctionError::AlreadyClosed(_) => ErrorKind::State,
            AuctionError::NotOwner(_) => ErrorKind::Authorization,
            AuctionError::NotFound(_) => ErrorKind::NotFound,
            AuctionError::Conflict { .. } => ErrorKind::Conflict,
            AuctionError::Store(_) => ErrorKind::Internal,
        }
    }

    /// 요청 전체를 다시 보내면 성공할 수 있는 경우
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    /// 응답 본문에 실리는 오류 코드
    pub fn code(&self) -> &'static str {
        match self {
            AuctionError::BidTooLow { .. } => "BID_TOO_LOW",
            AuctionError::InvalidAmount(_) => "INVALID_AMOUNT",
            AuctionError::InvalidListing(_) => "INVALID_LISTING",
            AuctionError::InvalidRequest(_) => "INVALID_REQUEST",
            AuctionError::AuctionClosed(_) => "AUCTION_CLOSED",
            AuctionError::AlreadyClosed(_) => "ALREADY_CLOSED",
            AuctionError::NotOwner(_) => "NOT_OWNER",
            AuctionError::NotFound(_) => "NOT_FOUND",
            AuctionError::Conflict { .. } => "CONFLICT_RETRY",
            AuctionError::Store(_) => "INTERNAL",
        }
    }

    pub(crate) fn from_store(listing_id: ListingId, error: StoreError) -> Self {
        match error {
            StoreError::NotFound => AuctionError::NotFound(listing_id),
            other => AuctionError::Store(other),
        }
    }
}
