/// 상품 컬럼 목록
macro_rules! listing_columns {
    () => {
        "id, title, description, image_url, owner_id, category_id, starting_price, current_price, status, created_at, version"
    };
}

/// 입찰 컬럼 목록
macro_rules! bid_columns {
    () => {
        "id, listing_id, bidder_id, amount, placed_at"
    };
}

/// 상품 등록
pub const INSERT_LISTING: &str = concat!(
    "INSERT INTO listings (title, description, image_url, owner_id, category_id, starting_price, current_price, status)
     VALUES ($1, $2, $3, $4, $5, $6, $6, 'ACTIVE')
     RETURNING ",
    listing_columns!()
);

/// 상품 조회
pub const GET_LISTING: &str = concat!("SELECT ", listing_columns!(), " FROM listings WHERE id = $1");

/// 상품 존재 여부
pub const LISTING_EXISTS: &str = "SELECT EXISTS (SELECT 1 FROM listings WHERE id = $1)";

/// 진행 중인 상품 조회
pub const LIST_ACTIVE: &str = concat!(
    "SELECT ",
    listing_columns!(),
    " FROM listings WHERE status = 'ACTIVE' ORDER BY created_at DESC, id DESC"
);

/// 입찰 수락: 버전이 일치할 때만 현재 가격 갱신
pub const ACCEPT_BID_PRICE: &str = concat!(
    "UPDATE listings SET current_price = $1, version = version + 1
     WHERE id = $2 AND version = $3 AND status = 'ACTIVE' AND current_price < $1
     RETURNING ",
    listing_columns!()
);

/// 경매 종료: 버전이 일치할 때만 상태 변경
pub const CLOSE_LISTING: &str = concat!(
    "UPDATE listings SET status = 'CLOSED', version = version + 1
     WHERE id = $1 AND version = $2 AND status = 'ACTIVE'
     RETURNING ",
    listing_columns!()
);

/// 입찰 기록 추가
pub const INSERT_BID: &str = concat!(
    "INSERT INTO bids (listing_id, bidder_id, amount, placed_at) VALUES ($1, $2, $3, $4) RETURNING ",
    bid_columns!()
);

/// 최고 입찰 조회 (동액이면 먼저 들어온 입찰)
pub const HIGHEST_BID: &str = concat!(
    "SELECT ",
    bid_columns!(),
    " FROM bids WHERE listing_id = $1 ORDER BY amount DESC, placed_at ASC, id ASC LIMIT 1"
);

/// 입찰 이력 조회
pub const ALL_BIDS: &str = concat!(
    "SELECT ",
    bid_columns!(),
    " FROM bids WHERE listing_id = $1 ORDER BY amount DESC, placed_at ASC, id ASC"
);

/// 관심 목록 포함 여부
pub const WATCH_CONTAINS: &str =
    "SELECT EXISTS (SELECT 1 FROM watchlist WHERE user_id = $1 AND listing_id = $2)";

/// 관심 목록 추가
pub const WATCH_ADD: &str =
    "INSERT INTO watchlist (user_id, listing_id) VALUES ($1, $2) ON CONFLICT DO NOTHING";

/// 관심 목록 제거
pub const WATCH_REMOVE: &str = "DELETE FROM watchlist WHERE user_id = $1 AND listing_id = $2";

/// 관심 목록 제거 후 제거 여부 반환
pub const WATCH_REMOVE_RETURNING: &str =
    "DELETE FROM watchlist WHERE user_id = $1 AND listing_id = $2 RETURNING user_id";

/// (user, listing) 단위 트랜잭션 잠금
pub const WATCH_LOCK: &str = "SELECT pg_advisory_xact_lock($1)";

/// 사용자 관심 목록 조회
pub const WATCHLIST_FOR_USER: &str = "SELECT l.id, l.title, l.description, l.image_url, l.owner_id, l.category_id, l.starting_price, l.current_price, l.status, l.created_at, l.version
     FROM listings l
     JOIN watchlist w ON w.listing_id = l.id
     WHERE w.user_id = $1
     ORDER BY l.id";
