// region:    --- Imports
use super::{BidLedger, Committed, ListingChange, ListingStore, StoreError, WatchlistStore};
use crate::auction::model::{
    Bid, BidId, CategoryId, Listing, ListingId, Membership, Money, NewListing, UserId,
};
use crate::database::DatabaseManager;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use tracing::{info, warn};

pub mod queries;

// endregion: --- Imports

// region:    --- Rows
#[derive(Debug, FromRow)]
struct ListingRow {
    id: i64,
    title: String,
    description: String,
    image_url: Option<String>,
    owner_id: i64,
    category_id: Option<i64>,
    starting_price: Decimal,
    current_price: Decimal,
    status: String,
    created_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<ListingRow> for Listing {
    type Error = StoreError;

    fn try_from(row: ListingRow) -> Result<Self, Self::Error> {
        Ok(Listing {
            id: ListingId(row.id),
            title: row.title,
            description: row.description,
            image_url: row.image_url,
            owner: UserId(row.owner_id),
            category: row.category_id.map(CategoryId),
            starting_price: money(row.starting_price)?,
            current_price: money(row.current_price)?,
            status: row.status.parse().map_err(StoreError::Corrupt)?,
            created_at: row.created_at,
            version: row.version,
        })
    }
}

#[derive(Debug, FromRow)]
struct BidRow {
    id: i64,
    listing_id: i64,
    bidder_id: i64,
    amount: Decimal,
    placed_at: DateTime<Utc>,
}

impl TryFrom<BidRow> for Bid {
    type Error = StoreError;

    fn try_from(row: BidRow) -> Result<Self, Self::Error> {
        Ok(Bid {
            id: BidId(row.id),
            listing_id: ListingId(row.listing_id),
            bidder: UserId(row.bidder_id),
            amount: money(row.amount)?,
            placed_at: row.placed_at,
        })
    }
}

fn money(value: Decimal) -> Result<Money, StoreError> {
    Money::new(value).map_err(|e| StoreError::Corrupt(format!("{value}: {e}")))
}

/// (user, listing) 쌍을 advisory lock 키로 변환. 충돌하면 직렬화가 늘어날 뿐이다.
fn watch_lock_key(user: UserId, listing_id: ListingId) -> i64 {
    (listing_id.0 << 32) ^ user.0
}

// endregion: --- Rows

// region:    --- Postgres Store
/// PostgreSQL 저장소
#[derive(Debug, Clone)]
pub struct PgStore {
    db: DatabaseManager,
}

impl PgStore {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ListingStore for PgStore {
    async fn create_listing(&self, new: NewListing) -> Result<Listing, StoreError> {
        let row = sqlx::query_as::<_, ListingRow>(queries::INSERT_LISTING)
            .bind(&new.title)
            .bind(&new.description)
            .bind(&new.image_url)
            .bind(new.owner)
            .bind(new.category)
            .bind(new.starting_price.amount())
            .fetch_one(self.db.pool())
            .await?;
        info!("{:<12} --> 상품 등록 id: {}", "Store", row.id);
        row.try_into()
    }

    async fn get_listing(&self, id: ListingId) -> Result<Listing, StoreError> {
        sqlx::query_as::<_, ListingRow>(queries::GET_LISTING)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or(StoreError::NotFound)?
            .try_into()
    }

    async fn compare_and_update(
        &self,
        id: ListingId,
        expected_version: i64,
        change: ListingChange,
    ) -> Result<Committed, StoreError> {
        self.db
            .transaction(move |tx| {
                Box::pin(async move {
                    let updated = match &change {
                        ListingChange::AcceptBid { amount, .. } => {
                            sqlx::query_as::<_, ListingRow>(queries::ACCEPT_BID_PRICE)
                                .bind(amount.amount())
                                .bind(id)
                                .bind(expected_version)
                                .fetch_optional(&mut **tx)
                                .await?
                        }
                        ListingChange::Close => {
                            sqlx::query_as::<_, ListingRow>(queries::CLOSE_LISTING)
                                .bind(id)
                                .bind(expected_version)
                                .fetch_optional(&mut **tx)
                                .await?
                        }
                    };

                    // 갱신된 행이 없으면 없는 상품인지 버전 충돌인지 구분
                    let Some(row) = updated else {
                        let exists: bool = sqlx::query_scalar(queries::LISTING_EXISTS)
                            .bind(id)
                            .fetch_one(&mut **tx)
                            .await?;
                        if exists {
                            warn!(
                                "{:<12} --> 버전 충돌 id: {} (기대 버전 {})",
                                "Store", id, expected_version
                            );
                            return Err(StoreError::Conflict);
                        }
                        return Err(StoreError::NotFound);
                    };
                    let listing = Listing::try_from(row)?;

                    let bid = match change {
                        ListingChange::AcceptBid {
                            bidder,
                            amount,
                            placed_at,
                        } => {
                            let row = sqlx::query_as::<_, BidRow>(queries::INSERT_BID)
                                .bind(id)
                                .bind(bidder)
                                .bind(amount.amount())
                                .bind(placed_at)
                                .fetch_one(&mut **tx)
                                .await?;
                            Some(Bid::try_from(row)?)
                        }
                        ListingChange::Close => None,
                    };

                    Ok(Committed { listing, bid })
                })
            })
            .await
    }

    async fn list_active(&self) -> Result<Vec<Listing>, StoreError> {
        sqlx::query_as::<_, ListingRow>(queries::LIST_ACTIVE)
            .fetch_all(self.db.pool())
            .await?
            .into_iter()
            .map(Listing::try_from)
            .collect()
    }
}

#[async_trait]
impl BidLedger for PgStore {
    async fn highest_bid(&self, listing_id: ListingId) -> Result<Option<Bid>, StoreError> {
        sqlx::query_as::<_, BidRow>(queries::HIGHEST_BID)
            .bind(listing_id)
            .fetch_optional(self.db.pool())
            .await?
            .map(Bid::try_from)
            .transpose()
    }

    async fn all_bids(&self, listing_id: ListingId) -> Result<Vec<Bid>, StoreError> {
        sqlx::query_as::<_, BidRow>(queries::ALL_BIDS)
            .bind(listing_id)
            .fetch_all(self.db.pool())
            .await?
            .into_iter()
            .map(Bid::try_from)
            .collect()
    }
}

#[async_trait]
impl WatchlistStore for PgStore {
    async fn contains(&self, user: UserId, listing_id: ListingId) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar(queries::WATCH_CONTAINS)
            .bind(user)
            .bind(listing_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(exists)
    }

    async fn add(&self, user: UserId, listing_id: ListingId) -> Result<(), StoreError> {
        sqlx::query(queries::WATCH_ADD)
            .bind(user)
            .bind(listing_id)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    async fn remove(&self, user: UserId, listing_id: ListingId) -> Result<(), StoreError> {
        sqlx::query(queries::WATCH_REMOVE)
            .bind(user)
            .bind(listing_id)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    async fn watchlist(&self, user: UserId) -> Result<Vec<Listing>, StoreError> {
        sqlx::query_as::<_, ListingRow>(queries::WATCHLIST_FOR_USER)
            .bind(user)
            .fetch_all(self.db.pool())
            .await?
            .into_iter()
            .map(Listing::try_from)
            .collect()
    }

    /// 다른 프로세스와도 원자적이도록 advisory lock 아래에서 확인 후 변경
    async fn toggle(&self, user: UserId, listing_id: ListingId) -> Result<Membership, StoreError> {
        self.db
            .transaction(move |tx| {
                Box::pin(async move {
                    sqlx::query(queries::WATCH_LOCK)
                        .bind(watch_lock_key(user, listing_id))
                        .execute(&mut **tx)
                        .await?;

                    let removed: Option<i64> = sqlx::query_scalar(queries::WATCH_REMOVE_RETURNING)
                        .bind(user)
                        .bind(listing_id)
                        .fetch_optional(&mut **tx)
                        .await?;
                    if removed.is_some() {
                        return Ok::<_, StoreError>(Membership::Removed);
                    }

                    sqlx::query(queries::WATCH_ADD)
                        .bind(user)
                        .bind(listing_id)
                        .execute(&mut **tx)
                        .await?;
                    Ok(Membership::Added)
                })
            })
            .await
    }
}

// endregion: --- Postgres Store
