/// Application name
pub const APP_NAME: &str = "ballotbook";

/// Sessions scoring above this are refused a ballot
pub const RISK_SCORE_THRESHOLD: i64 = 70;

/// Uppercase letters in the first half of a receipt code
pub const RECEIPT_LETTERS: usize = 5;

/// Digits in the second half of a receipt code
pub const RECEIPT_DIGITS: usize = 5;

/// Total length of a receipt code including the dash (`XXXXX-NNNNN`)
pub const RECEIPT_CODE_LEN: usize = RECEIPT_LETTERS + 1 + RECEIPT_DIGITS;

/// Collision retries before receipt generation gives up
pub const RECEIPT_MAX_ATTEMPTS: usize = 100;

/// Longest client IP string persisted on a ballot (IPv6 text form)
pub const MAX_IP_ADDRESS_LEN: usize = 45;

/// SIM slot recorded on web-cast registry rows
pub const WEB_SIM_SLOT: i64 = 0;

/// Default HTTP API port
pub const DEFAULT_HTTP_PORT: u16 = 8080;

// Reasons reported by the eligibility check.
pub const REASON_NO_PROFILE: &str = "User profile not found.";
pub const REASON_VPN: &str = "VPN detected. Voting not allowed over VPN.";
pub const REASON_HIGH_RISK: &str = "Session risk score too high.";
pub const REASON_ALREADY_VOTED: &str = "You have already voted in this election.";

// Drill-through labels shown to readers.
pub const LABEL_DIVISIONS: &str = "বিভাগ (Divisions)";
pub const LABEL_VIEW_DISTRICTS: &str = "জেলা পর্যায়ে দেখুন (View District Level)";
pub const LABEL_VIEW_CONSTITUENCIES: &str = "আসন পর্যায়ে দেখুন (View Constituency Level)";
