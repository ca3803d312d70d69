mod common;

use auction_engine::auction::events::AuctionEvent;
use auction_engine::auction::model::{ListingId, ListingStatus, Membership, UserId};
use auction_engine::{AuctionController, AuctionError, ErrorKind};
use common::*;
use std::sync::Arc;

/// 시나리오 A: 500.00 시작, 400 거절, 550 수락, 550 거절, 600 수락, 종료 시 600 입찰자 낙찰
#[tokio::test]
async fn test_scenario_a_full_auction() {
    let (controller, _) = controller();
    let listing = open_listing(&controller, "500.00").await;

    let err = controller
        .place_bid(bid_cmd(listing.id, ALICE, "400.00"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, AuctionError::BidTooLow { current_price, .. } if current_price == money("500.00"))
    );

    let accepted = controller
        .place_bid(bid_cmd(listing.id, ALICE, "550.00"))
        .await
        .unwrap();
    assert_eq!(accepted.new_price, money("550.00"));

    let err = controller
        .place_bid(bid_cmd(listing.id, BOB, "550.00"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, AuctionError::BidTooLow { current_price, .. } if current_price == money("550.00"))
    );
    assert_eq!(err.to_string(), "you must bid higher than $550.00");

    let accepted = controller
        .place_bid(bid_cmd(listing.id, BOB, "600.00"))
        .await
        .unwrap();
    assert_eq!(accepted.new_price, money("600.00"));
    assert_eq!(accepted.bid.bidder, BOB);

    let closed = controller
        .close_auction(close_cmd(listing.id, SELLER))
        .await
        .unwrap();
    assert_eq!(closed.winner(), Some(BOB));
    assert_eq!(closed.listing.status, ListingStatus::Closed);
    assert_eq!(closed.listing.current_price, money("600.00"));
}

/// 시나리오 B: 입찰 없이 종료하면 낙찰자 없음, 가격은 시작가 유지
#[tokio::test]
async fn test_scenario_b_close_without_bids() {
    let (controller, _) = controller();
    let listing = open_listing(&controller, "500.00").await;

    let closed = controller
        .close_auction(close_cmd(listing.id, SELLER))
        .await
        .unwrap();
    assert_eq!(closed.winner(), None);
    assert!(closed.winning_bid.is_none());

    let stored = controller.listing(listing.id).await.unwrap();
    assert_eq!(stored.current_price, stored.starting_price);
    assert_eq!(stored.status, ListingStatus::Closed);
}

/// 시나리오 C: 판매자가 아니면 종료 불가, 경매는 계속 진행
#[tokio::test]
async fn test_scenario_c_non_owner_cannot_close() {
    let (controller, _) = controller();
    let listing = open_listing(&controller, "500.00").await;

    let err = controller
        .close_auction(close_cmd(listing.id, ALICE))
        .await
        .unwrap_err();
    assert!(matches!(err, AuctionError::NotOwner(_)));
    assert_eq!(err.kind(), ErrorKind::Authorization);

    let stored = controller.listing(listing.id).await.unwrap();
    assert_eq!(stored.status, ListingStatus::Active);
    assert!(controller
        .place_bid(bid_cmd(listing.id, ALICE, "501.00"))
        .await
        .is_ok());
}

/// 시나리오 D: 관심 목록 토글 두 번이면 원래 상태
#[tokio::test]
async fn test_scenario_d_toggle_watchlist() {
    let (controller, _) = controller();
    let listing = open_listing(&controller, "500.00").await;

    let first = controller
        .toggle_watchlist(toggle_cmd(listing.id, ALICE))
        .await
        .unwrap();
    assert_eq!(first, Membership::Added);
    assert_eq!(
        controller.watchlist(ALICE).await.unwrap().iter().map(|l| l.id).collect::<Vec<_>>(),
        vec![listing.id]
    );

    let second = controller
        .toggle_watchlist(toggle_cmd(listing.id, ALICE))
        .await
        .unwrap();
    assert_eq!(second, Membership::Removed);
    assert!(controller.watchlist(ALICE).await.unwrap().is_empty());
}

/// 종료 후에는 입찰도 재종료도 불가
#[tokio::test]
async fn test_closed_auction_is_irreversible() {
    let (controller, _) = controller();
    let listing = open_listing(&controller, "500.00").await;
    controller
        .place_bid(bid_cmd(listing.id, ALICE, "550.00"))
        .await
        .unwrap();
    controller
        .close_auction(close_cmd(listing.id, SELLER))
        .await
        .unwrap();

    let err = controller
        .place_bid(bid_cmd(listing.id, BOB, "10000.00"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuctionError::AuctionClosed(_)));
    assert_eq!(err.kind(), ErrorKind::State);

    let err = controller
        .close_auction(close_cmd(listing.id, SELLER))
        .await
        .unwrap_err();
    assert!(matches!(err, AuctionError::AlreadyClosed(_)));

    let stored = controller.listing(listing.id).await.unwrap();
    assert_eq!(stored.current_price, money("550.00"));
    assert_eq!(controller.bid_history(listing.id).await.unwrap().len(), 1);
}

/// 종료된 경매에 판매자가 아닌 사용자가 종료 요청하면 권한 오류가 우선
#[tokio::test]
async fn test_non_owner_on_closed_auction_is_not_owner() {
    let (controller, _) = controller();
    let listing = open_listing(&controller, "500.00").await;
    controller
        .close_auction(close_cmd(listing.id, SELLER))
        .await
        .unwrap();

    let err = controller
        .close_auction(close_cmd(listing.id, BOB))
        .await
        .unwrap_err();
    assert!(matches!(err, AuctionError::NotOwner(_)));
}

/// 시작가와 같은 첫 입찰은 거절
#[tokio::test]
async fn test_first_bid_equal_to_starting_price_is_rejected() {
    let (controller, _) = controller();
    let listing = open_listing(&controller, "500.00").await;

    let err = controller
        .place_bid(bid_cmd(listing.id, ALICE, "500"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuctionError::BidTooLow { .. }));

    let accepted = controller
        .place_bid(bid_cmd(listing.id, ALICE, "500.01"))
        .await
        .unwrap();
    assert_eq!(accepted.new_price.to_string(), "500.01");
}

/// 잘못된 금액은 검증 오류
#[tokio::test]
async fn test_invalid_amounts_are_rejected() {
    let (controller, _) = controller();
    let listing = open_listing(&controller, "500.00").await;

    for amount in ["0", "-600.00", "600.001", "100000000.00"] {
        let err = controller
            .place_bid(bid_cmd(listing.id, ALICE, amount))
            .await
            .unwrap_err();
        assert!(
            matches!(err, AuctionError::InvalidAmount(_)),
            "amount {amount}: {err:?}"
        );
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
    assert!(controller.bid_history(listing.id).await.unwrap().is_empty());
}

/// 없는 상품은 모든 연산에서 NotFound
#[tokio::test]
async fn test_unknown_listing_is_not_found() {
    let (controller, _) = controller();
    let missing = ListingId(404);

    let err = controller
        .place_bid(bid_cmd(missing, ALICE, "10.00"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuctionError::NotFound(id) if id == missing));

    let err = controller
        .close_auction(close_cmd(missing, SELLER))
        .await
        .unwrap_err();
    assert!(matches!(err, AuctionError::NotFound(_)));

    let err = controller
        .toggle_watchlist(toggle_cmd(missing, ALICE))
        .await
        .unwrap_err();
    assert!(matches!(err, AuctionError::NotFound(_)));
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert!(matches!(
        controller.bid_history(missing).await,
        Err(AuctionError::NotFound(_))
    ));
}

/// 종료된 경매도 관심 목록에 추가 가능
#[tokio::test]
async fn test_watching_closed_auction_is_allowed() {
    let (controller, _) = controller();
    let listing = open_listing(&controller, "500.00").await;
    controller
        .close_auction(close_cmd(listing.id, SELLER))
        .await
        .unwrap();

    let membership = controller
        .toggle_watchlist(toggle_cmd(listing.id, BOB))
        .await
        .unwrap();
    assert_eq!(membership, Membership::Added);
}

/// 관심 목록은 사용자별로 분리
#[tokio::test]
async fn test_watchlist_is_per_user() {
    let (controller, _) = controller();
    let listing = open_listing(&controller, "500.00").await;

    controller
        .toggle_watchlist(toggle_cmd(listing.id, ALICE))
        .await
        .unwrap();
    let bob = controller
        .toggle_watchlist(toggle_cmd(listing.id, BOB))
        .await
        .unwrap();
    assert_eq!(bob, Membership::Added);
    assert_eq!(controller.watchlist(ALICE).await.unwrap().len(), 1);
    assert_eq!(controller.watchlist(BOB).await.unwrap().len(), 1);
}

/// 판매자 본인 입찰은 제한하지 않는다
#[tokio::test]
async fn test_seller_may_bid_on_own_listing() {
    let (controller, _) = controller();
    let listing = open_listing(&controller, "500.00").await;

    let accepted = controller
        .place_bid(bid_cmd(listing.id, SELLER, "510.00"))
        .await
        .unwrap();
    assert_eq!(accepted.bid.bidder, SELLER);
}

/// 입찰 이력은 금액 내림차순, 상세 조회는 최고 입찰과 최소 다음 입찰가 포함
#[tokio::test]
async fn test_bid_history_and_detail() {
    let (controller, _) = controller();
    let listing = open_listing(&controller, "500.00").await;
    for (bidder, amount) in [(ALICE, "510.00"), (BOB, "520.00"), (ALICE, "530.50")] {
        controller
            .place_bid(bid_cmd(listing.id, bidder, amount))
            .await
            .unwrap();
    }

    let history = controller.bid_history(listing.id).await.unwrap();
    let amounts: Vec<String> = history.iter().map(|b| b.amount.to_string()).collect();
    assert_eq!(amounts, vec!["530.50", "520.00", "510.00"]);

    let detail = controller.listing_detail(listing.id).await.unwrap();
    assert_eq!(detail.top_bid.map(|b| b.bidder), Some(ALICE));
    assert_eq!(detail.minimum_next_bid, Some(dec("530.51")));

    controller
        .close_auction(close_cmd(listing.id, SELLER))
        .await
        .unwrap();
    let detail = controller.listing_detail(listing.id).await.unwrap();
    assert_eq!(detail.minimum_next_bid, None);
}

/// 상품 등록 검증
#[tokio::test]
async fn test_open_listing_validation() {
    let (controller, _) = controller();

    let mut cmd = open_cmd("500.00");
    cmd.title = "   ".to_string();
    assert!(matches!(
        controller.open_listing(cmd).await,
        Err(AuctionError::InvalidListing(_))
    ));

    let mut cmd = open_cmd("500.00");
    cmd.title = "x".repeat(61);
    assert!(matches!(
        controller.open_listing(cmd).await,
        Err(AuctionError::InvalidListing(_))
    ));

    assert!(matches!(
        controller.open_listing(open_cmd("0.00")).await,
        Err(AuctionError::InvalidAmount(_))
    ));

    let listing = controller.open_listing(open_cmd("12.5")).await.unwrap();
    assert_eq!(listing.current_price.to_string(), "12.50");
    assert_eq!(listing.owner, SELLER);
    assert_eq!(controller.active_listings().await.unwrap().len(), 1);
}

/// 커밋된 변경마다 이벤트 발행
#[tokio::test]
async fn test_events_are_published_after_commit() {
    init_tracing();
    let publisher = Arc::new(RecordingPublisher::default());
    let controller = AuctionController::new(auction_engine::store::InMemoryStore::new_shared())
        .with_publisher(publisher.clone());
    let listing = open_listing(&controller, "500.00").await;

    controller
        .place_bid(bid_cmd(listing.id, ALICE, "400.00"))
        .await
        .unwrap_err();
    controller
        .place_bid(bid_cmd(listing.id, ALICE, "550.00"))
        .await
        .unwrap();
    controller
        .close_auction(close_cmd(listing.id, SELLER))
        .await
        .unwrap();

    let events = publisher.events();
    let types: Vec<&str> = events.iter().map(|e| e.event_type()).collect();
    assert_eq!(types, vec!["ListingOpened", "BidPlaced", "AuctionClosed"]);
    match events.last() {
        Some(AuctionEvent::AuctionClosed {
            winner,
            final_price,
            ..
        }) => {
            assert_eq!(*winner, Some(ALICE));
            assert_eq!(*final_price, money("550.00"));
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

/// 이벤트 발행 실패는 커밋 결과에 영향 없음
#[tokio::test]
async fn test_publish_failure_does_not_fail_bid() {
    init_tracing();
    let controller = AuctionController::new(auction_engine::store::InMemoryStore::new_shared())
        .with_publisher(Arc::new(BrokenPublisher));
    let listing = open_listing(&controller, "500.00").await;

    let accepted = controller
        .place_bid(bid_cmd(listing.id, UserId(9), "501.00"))
        .await
        .unwrap();
    assert_eq!(accepted.new_price, money("501.00"));
}

/// 이미지 주소는 선택 항목이며 http(s) 주소만 저장된다
#[tokio::test]
async fn test_open_listing_image_url() {
    let (controller, _) = controller();

    let mut cmd = open_cmd("500.00");
    cmd.image_url = Some("  https://img.example.com/laptop.jpg ".to_string());
    let listing = controller.open_listing(cmd).await.unwrap();
    assert_eq!(
        listing.image_url.as_deref(),
        Some("https://img.example.com/laptop.jpg")
    );
    assert_eq!(controller.listing(listing.id).await.unwrap().image_url, listing.image_url);

    let mut cmd = open_cmd("500.00");
    cmd.image_url = Some("   ".to_string());
    assert_eq!(controller.open_listing(cmd).await.unwrap().image_url, None);

    for bad in [
        "ftp://img.example.com/a.jpg".to_string(),
        "https://".to_string(),
        "https://img.example.com/a b.jpg".to_string(),
        format!("https://img.example.com/{}", "x".repeat(200)),
    ] {
        let mut cmd = open_cmd("500.00");
        cmd.image_url = Some(bad.clone());
        assert!(
            matches!(controller.open_listing(cmd).await, Err(AuctionError::InvalidListing(_))),
            "accepted {bad}"
        );
    }
}
