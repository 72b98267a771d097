/// Database row types — these map directly to SQLite rows. JSON columns stay
/// as raw strings here; conversion to lookout-types models happens in
/// queries.rs where parse errors can carry context.

pub struct TenantRow {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub active: bool,
    pub created_at: String,
}

pub struct TenantConfigRow {
    pub tenant_id: String,
    pub api_id: Option<String>,
    pub api_hash: Option<String>,
    pub phone_number: Option<String>,
    pub session_path: Option<String>,
    pub targets: String,
    pub keywords: String,
    pub links: String,
    pub lookback: String,
}

pub struct MatchRow {
    pub tenant_id: String,
    pub group_id: i64,
    pub group_name: String,
    pub message_id: i64,
    pub sender_id: Option<i64>,
    pub timestamp: String,
    pub message_text: String,
    pub found_keywords: String,
    pub found_links: String,
    pub permalink: String,
    pub views: u32,
    pub forwards: u32,
    pub reactions: u32,
    pub reactions_detail: String,
    pub replies: u32,
}

pub struct DailyStatRow {
    pub tenant_id: String,
    pub date: String,
    pub total_matches: u32,
    pub total_views: u32,
    pub total_forwards: u32,
    pub total_reactions: u32,
    pub keyword_stats: String,
    pub link_stats: String,
    pub created_at: String,
    pub updated_at: String,
}
