// region:    --- Imports
use super::{BidLedger, Committed, ListingChange, ListingStore, StoreError, WatchlistStore};
use crate::auction::model::{
    Bid, BidId, Listing, ListingId, ListingStatus, Membership, NewListing, UserId,
};
use crate::auction::pricing;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

// endregion: --- Imports

// region:    --- In-Memory Store
/// 메모리 저장소. 모든 연산이 하나의 락 아래에서 원자적으로 수행된다.
///
/// 테스트와 `DATABASE_URL` 없이 실행할 때 사용한다.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    listings: HashMap<ListingId, Listing>,
    bids: HashMap<ListingId, Vec<Bid>>,
    watchlist: HashSet<(UserId, ListingId)>,
    next_listing_id: i64,
    next_bid_id: i64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl ListingStore for InMemoryStore {
    async fn create_listing(&self, new: NewListing) -> Result<Listing, StoreError> {
        let mut state = self.state.lock();
        state.next_listing_id += 1;
        let listing = Listing {
            id: ListingId(state.next_listing_id),
            title: new.title,
            description: new.description,
            image_url: new.image_url,
            owner: new.owner,
            category: new.category,
            starting_price: new.starting_price,
            current_price: new.starting_price,
            status: ListingStatus::Active,
            created_at: Utc::now(),
            version: 0,
        };
        state.listings.insert(listing.id, listing.clone());
        Ok(listing)
    }

    async fn get_listing(&self, id: ListingId) -> Result<Listing, StoreError> {
        self.state
            .lock()
            .listings
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn compare_and_update(
        &self,
        id: ListingId,
        expected_version: i64,
        change: ListingChange,
    ) -> Result<Committed, StoreError> {
        let mut state = self.state.lock();
        let State {
            listings,
            bids,
            next_bid_id,
            ..
        } = &mut *state;

        let listing = listings.get_mut(&id).ok_or(StoreError::NotFound)?;
        if listing.version != expected_version {
            debug!(
                "{:<12} --> 버전 불일치 id: {} (기대 {}, 실제 {})",
                "Store", id, expected_version, listing.version
            );
            return Err(StoreError::Conflict);
        }

        let bid = match change {
            ListingChange::AcceptBid {
                bidder,
                amount,
                placed_at,
            } => {
                *next_bid_id += 1;
                let bid = Bid {
                    id: BidId(*next_bid_id),
                    listing_id: id,
                    bidder,
                    amount,
                    placed_at,
                };
                listing.current_price = amount;
                bids.entry(id).or_default().push(bid.clone());
                Some(bid)
            }
            ListingChange::Close => {
                listing.status = ListingStatus::Closed;
                None
            }
        };
        listing.version += 1;

        Ok(Committed {
            listing: listing.clone(),
            bid,
        })
    }

    async fn list_active(&self) -> Result<Vec<Listing>, StoreError> {
        let state = self.state.lock();
        let mut active: Vec<Listing> = state
            .listings
            .values()
            .filter(|listing| listing.is_active())
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(active)
    }
}

#[async_trait]
impl BidLedger for InMemoryStore {
    async fn highest_bid(&self, listing_id: ListingId) -> Result<Option<Bid>, StoreError> {
        let state = self.state.lock();
        let bids = state.bids.get(&listing_id).map(Vec::as_slice).unwrap_or(&[]);
        Ok(pricing::determine_winner(bids).cloned())
    }

    async fn all_bids(&self, listing_id: ListingId) -> Result<Vec<Bid>, StoreError> {
        let state = self.state.lock();
        let mut bids = state.bids.get(&listing_id).cloned().unwrap_or_default();
        bids.sort_by(pricing::rank);
        Ok(bids)
    }
}

#[async_trait]
impl WatchlistStore for InMemoryStore {
    async fn contains(&self, user: UserId, listing_id: ListingId) -> Result<bool, StoreError> {
        Ok(self.state.lock().watchlist.contains(&(user, listing_id)))
    }

    async fn add(&self, user: UserId, listing_id: ListingId) -> Result<(), StoreError> {
        self.state.lock().watchlist.insert((user, listing_id));
        Ok(())
    }

    async fn remove(&self, user: UserId, listing_id: ListingId) -> Result<(), StoreError> {
        self.state.lock().watchlist.remove(&(user, listing_id));
        Ok(())
    }

    async fn watchlist(&self, user: UserId) -> Result<Vec<Listing>, StoreError> {
        let state = self.state.lock();
        let mut listings: Vec<Listing> = state
            .watchlist
            .iter()
            .filter(|(watcher, _)| *watcher == user)
            .filter_map(|(_, listing_id)| state.listings.get(listing_id).cloned())
            .collect();
        listings.sort_by_key(|listing| listing.id);
        Ok(listings)
    }

    async fn toggle(&self, user: UserId, listing_id: ListingId) -> Result<Membership, StoreError> {
        let mut state = self.state.lock();
        if state.watchlist.remove(&(user, listing_id)) {
            Ok(Membership::Removed)
        } else {
            state.watchlist.insert((user, listing_id));
            Ok(Membership::Added)
        }
    }
}

// endregion: --- In-Memory Store

// endregion: --- Tests
