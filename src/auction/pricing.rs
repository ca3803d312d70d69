//! 입찰 검증 및 낙찰자 결정 규칙

// region:    --- Imports
use super::error::AuctionError;
use super::model::{Bid, Listing, Money};
use rust_decimal::Decimal;
use std::cmp::Ordering;

// endregion: --- Imports

// region:    --- Acceptance Rule
/// 입찰 수락 조건: 경매가 진행 중이고 금액이 현재 가격보다 엄격히 커야 한다.
///
/// `listing`은 직렬화 시점의 스냅샷이어야 한다. 같은 금액은 항상 거절된다.
pub fn check_bid(listing: &Listing, amount: Money) -> Result<(), AuctionError> {
    if !listing.is_active() {
        return Err(AuctionError::AuctionClosed(listing.id));
    }
    if amount <= listing.current_price {
        return Err(AuctionError::BidTooLow {
            listing_id: listing.id,
            current_price: listing.current_price,
        });
    }
    Ok(())
}

/// 화면에 안내할 최소 다음 입찰가 (현재가 + 0.01). 강제 규칙은 아님
pub fn minimum_next_bid(listing: &Listing) -> Decimal {
    listing.current_price.next_cent()
}

// endregion: --- Acceptance Rule

// region:    --- Winner
/// 최고 금액 입찰, 동액이면 가장 먼저 들어온 입찰
pub fn determine_winner(bids: &[Bid]) -> Option<&Bid> {
    bids.iter().min_by(|a, b| rank(a, b))
}

/// 입찰 내역 정렬 순서: 금액 내림차순, 시간 오름차순, id 오름차순
pub fn rank(a: &Bid, b: &Bid) -> Ordering {
    b.amount
        .cmp(&a.amount)
        .then_with(|| a.placed_at.cmp(&b.placed_at))
        .then_with(|| a.id.cmp(&b.id))
}

// endregion: --- Winner

// endregion: --- Tests
