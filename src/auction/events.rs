use super::model::{Bid, BidId, Listing, ListingId, Money, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 커밋된 상태 변경마다 발행되는 경매 이벤트
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum AuctionEvent {
    // 상품 등록 이벤트
    ListingOpened {
        listing_id: ListingId,
        owner: UserId,
        starting_price: Money,
        timestamp: DateTime<Utc>,
    },
    // 입찰 이벤트
    BidPlaced {
        listing_id: ListingId,
        bid_id: BidId,
        bidder: UserId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    // 경매 종료 이벤트
    AuctionClosed {
        listing_id: ListingId,
        winner: Option<UserId>,
        final_price: Money,
        timestamp: DateTime<Utc>,
    },
}

impl AuctionEvent {
    pub fn listing_opened(listing: &Listing) -> Self {
        AuctionEvent::ListingOpened {
            listing_id: listing.id,
            owner: listing.owner,
            starting_price: listing.starting_price,
            timestamp: listing.created_at,
        }
    }

    pub fn bid_placed(bid: &Bid) -> Self {
        AuctionEvent::BidPlaced {
            listing_id: bid.listing_id,
            bid_id: bid.id,
            bidder: bid.bidder,
            amount: bid.amount,
            timestamp: bid.placed_at,
        }
    }

    pub fn auction_closed(listing: &Listing, winning_bid: Option<&Bid>) -> Self {
        AuctionEvent::AuctionClosed {
            listing_id: listing.id,
            winner: winning_bid.map(|bid| bid.bidder),
            final_price: listing.current_price,
            timestamp: Utc::now(),
        }
    }

    /// 메시지 브로커 파티션 키
    pub fn listing_id(&self) -> ListingId {
        match self {
            AuctionEvent::ListingOpened { listing_id, .. }
            | AuctionEvent::BidPlaced { listing_id, .. }
            | AuctionEvent::AuctionClosed { listing_id, .. } => *listing_id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            AuctionEvent::ListingOpened { .. } => "ListingOpened",
            AuctionEvent::BidPlaced { .. } => "BidPlaced",
            AuctionEvent::AuctionClosed { .. } => "AuctionClosed",
        }
    }
}
