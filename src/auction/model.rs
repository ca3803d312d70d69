// region:    --- Imports
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// endregion: --- Imports

// region:    --- Identifiers
macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

id_type!(
    /// 경매 상품 식별자
    ListingId
);
id_type!(
    /// 입찰 식별자
    BidId
);
id_type!(
    /// 외부 인증 계층이 확인한 사용자 식별자
    UserId
);
id_type!(CategoryId);

// endregion: --- Identifiers

// region:    --- Money
/// 금액. 소수점 둘째 자리 고정, `NUMERIC(10,2)` 범위
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Money(Decimal);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("amount must be greater than zero")]
    NotPositive,
    #[error("amount may have at most {} decimal places", Money::SCALE)]
    TooPrecise,
    #[error("amount exceeds the maximum of {}", Money::max())]
    TooLarge,
    #[error("not a decimal amount: {0}")]
    Unparsable(String),
}

impl Money {
    pub const SCALE: u32 = 2;

    /// 최소 단위 (0.01)
    pub fn cent() -> Self {
        Self(Decimal::new(1, Self::SCALE))
    }

    pub fn max() -> Self {
        Self(Decimal::new(9_999_999_999, Self::SCALE))
    }

    /// 양수, 소수점 둘째 자리 이하, 최대값 이하인지 검증 후 스케일 2로 정규화
    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        let normalized = value.normalize();
        if normalized.scale() > Self::SCALE {
            return Err(MoneyError::TooPrecise);
        }
        if value <= Decimal::ZERO {
            return Err(MoneyError::NotPositive);
        }
        let mut scaled = value;
        scaled.rescale(Self::SCALE);
        if scaled > Self::max().0 {
            return Err(MoneyError::TooLarge);
        }
        Ok(Self(scaled))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn next_cent(&self) -> Decimal {
        self.0 + Self::cent().0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(|_| MoneyError::Unparsable(s.to_string()))?;
        Self::new(value)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Money::new(value).map_err(serde::de::Error::custom)
    }
}

// endregion: --- Money

// region:    --- Listing
/// 경매 상태. Active -> Closed 단방향 전이만 허용
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingStatus {
    Active,
    Closed,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Active => "ACTIVE",
            ListingStatus::Closed => "CLOSED",
        }
    }
}

impl FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(ListingStatus::Active),
            "CLOSED" => Ok(ListingStatus::Closed),
            other => Err(format!("unknown listing status: {other}")),
        }
    }
}

/// 경매 상품
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    pub description: String,
    /// 대표 이미지 주소 (선택)
    pub image_url: Option<String>,
    pub owner: UserId,
    pub category: Option<CategoryId>,
    pub starting_price: Money,
    pub current_price: Money,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
    /// 낙관적 동시성 제어 버전. 커밋마다 1씩 증가
    #[serde(skip)]
    pub version: i64,
}

impl Listing {
    pub fn is_active(&self) -> bool {
        self.status == ListingStatus::Active
    }

    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner == user
    }
}

/// 상품 등록 입력
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub owner: UserId,
    pub category: Option<CategoryId>,
    pub starting_price: Money,
}

// endregion: --- Listing

// region:    --- Bid
/// 입찰. 생성 후 변경 불가
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub id: BidId,
    pub listing_id: ListingId,
    pub bidder: UserId,
    pub amount: Money,
    pub placed_at: DateTime<Utc>,
}

// endregion: --- Bid

// region:    --- Watchlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Membership {
    Added,
    Removed,
}

impl Membership {
    pub fn is_watching(&self) -> bool {
        matches!(self, Membership::Added)
    }
}

// endregion: --- Watchlist

// endregion: --- Tests
