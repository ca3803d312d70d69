// region:    --- Imports
use crate::auction::error::{AuctionError, ErrorKind};
use crate::auction::model::{CategoryId, ListingId, MoneyError, UserId};
use crate::bidding::commands::{
    AuctionController, CloseAuctionCommand, OpenListingCommand, PlaceBidCommand,
    ToggleWatchlistCommand,
};
use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Path, Request, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Router
pub type AppState = Arc<AuctionController>;

/// 호출자 식별 헤더. 인증 계층이 채워 넣는다고 가정
pub const USER_ID_HEADER: &str = "x-user-id";

pub fn router(controller: AppState) -> Router {
    Router::new()
        .route("/listings", get(handle_get_listings).post(handle_open_listing))
        .route("/listings/:id", get(handle_get_listing))
        .route(
            "/listings/:id/bids",
            get(handle_get_bid_history).post(handle_place_bid),
        )
        .route("/listings/:id/close", post(handle_close_auction))
        .route("/listings/:id/watch", post(handle_toggle_watchlist))
        .route("/watchlist", get(handle_get_watchlist))
        .with_state(controller)
}

// endregion: --- Router

// region:    --- Identity
/// 인증된 호출자
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<i64>().ok())
            .map(|id| Caller(UserId(id)))
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "error": "authentication required",
                        "code": "UNAUTHENTICATED"
                    })),
                )
                    .into_response()
            })
    }
}

// endregion: --- Identity

// region:    --- Json Body
/// `Json`과 같지만 거절 사유를 다른 오류와 같은 JSON 형태로 돌려준다
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AuctionError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| JsonBody(value))
            .map_err(|rejection: JsonRejection| AuctionError::InvalidRequest(rejection.body_text()))
    }
}

/// 금액 필드는 문자열이나 숫자로 받는다. 해석할 수 없으면 INVALID_AMOUNT
fn parse_amount(value: &Value) -> Result<Decimal, AuctionError> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        other => other.to_string(),
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| AuctionError::InvalidAmount(MoneyError::Unparsable(text)))
}

// endregion: --- Json Body

// region:    --- Errors
impl IntoResponse for AuctionError {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::State => StatusCode::CONFLICT,
            ErrorKind::Authorization => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let mut body = json!({
            "error": self.to_string(),
            "code": self.code(),
            "retryable": self.is_retryable(),
        });
        match &self {
            AuctionError::BidTooLow { current_price, .. } => {
                body["current_price"] = json!(current_price);
            }
            AuctionError::Store(source) => {
                error!("{:<12} --> 저장소 오류: {:?}", "Handler", source);
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}

// endregion: --- Errors

// region:    --- Command Handlers
#[derive(Debug, Deserialize)]
pub struct OpenListingRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub starting_price: Value,
    pub category_id: Option<CategoryId>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceBidRequest {
    pub amount: Value,
}

/// 상품 등록 요청 처리
pub async fn handle_open_listing(
    State(controller): State<AppState>,
    Caller(seller_id): Caller,
    JsonBody(req): JsonBody<OpenListingRequest>,
) -> Result<impl IntoResponse, AuctionError> {
    info!("{:<12} --> 상품 등록 요청 seller: {}", "Handler", seller_id);
    let listing = controller
        .open_listing(OpenListingCommand {
            seller_id,
            title: req.title,
            description: req.description,
            image_url: req.image_url,
            starting_price: parse_amount(&req.starting_price)?,
            category_id: req.category_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

/// 입찰 요청 처리
pub async fn handle_place_bid(
    State(controller): State<AppState>,
    Caller(bidder_id): Caller,
    Path(listing_id): Path<ListingId>,
    JsonBody(req): JsonBody<PlaceBidRequest>,
) -> Result<impl IntoResponse, AuctionError> {
    info!("{:<12} --> 입찰 요청 id: {}", "Handler", listing_id);
    let accepted = controller
        .place_bid(PlaceBidCommand {
            listing_id,
            bidder_id,
            amount: parse_amount(&req.amount)?,
        })
        .await?;
    Ok(Json(json!({
        "message": "bid accepted",
        "current_price": accepted.new_price,
        "bid": accepted.bid,
    })))
}

/// 경매 종료 요청 처리
pub async fn handle_close_auction(
    State(controller): State<AppState>,
    Caller(requester_id): Caller,
    Path(listing_id): Path<ListingId>,
) -> Result<impl IntoResponse, AuctionError> {
    info!("{:<12} --> 경매 종료 요청 id: {}", "Handler", listing_id);
    let closed = controller
        .close_auction(CloseAuctionCommand {
            listing_id,
            requester_id,
        })
        .await?;
    Ok(Json(json!({
        "listing": closed.listing,
        "winner": closed.winner(),
        "winning_bid": closed.winning_bid,
    })))
}

/// 관심 목록 토글 요청 처리
pub async fn handle_toggle_watchlist(
    State(controller): State<AppState>,
    Caller(user_id): Caller,
    Path(listing_id): Path<ListingId>,
) -> Result<impl IntoResponse, AuctionError> {
    let membership = controller
        .toggle_watchlist(ToggleWatchlistCommand {
            listing_id,
            user_id,
        })
        .await?;
    Ok(Json(json!({
        "membership": membership,
        "watching": membership.is_watching(),
    })))
}

// endregion: --- Command Handlers

// region:    --- Query Handlers
/// 진행 중인 상품 조회
pub async fn handle_get_listings(
    State(controller): State<AppState>,
) -> Result<impl IntoResponse, AuctionError> {
    Ok(Json(controller.active_listings().await?))
}

/// 상품 상세 조회
pub async fn handle_get_listing(
    State(controller): State<AppState>,
    Path(listing_id): Path<ListingId>,
) -> Result<impl IntoResponse, AuctionError> {
    Ok(Json(controller.listing_detail(listing_id).await?))
}

/// 입찰 이력 조회
pub async fn handle_get_bid_history(
    State(controller): State<AppState>,
    Path(listing_id): Path<ListingId>,
) -> Result<impl IntoResponse, AuctionError> {
    Ok(Json(controller.bid_history(listing_id).await?))
}

/// 관심 목록 조회
pub async fn handle_get_watchlist(
    State(controller): State<AppState>,
    Caller(user_id): Caller,
) -> Result<impl IntoResponse, AuctionError> {
    Ok(Json(controller.watchlist(user_id).await?))
}

// endregion: --- Query Handlers
