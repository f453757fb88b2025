/// Application constants

// Deployed contract pair (Sepolia)
pub const DEFAULT_TOKEN_ADDRESS: &str = "0xa33239e13303Fe9586C25b70ABd4D5d65E7B368f";
pub const DEFAULT_GAME_ADDRESS: &str = "0x3726fef83444Ba54F925A5d2195f697234DfA30C";
pub const DEFAULT_CHAIN_ID: u64 = 11155111; // Sepolia

pub const TOKEN_SYMBOL: &str = "MTK";
pub const TOKEN_DECIMALS: u32 = 18;

// Game rules
pub const GUESS_MIN: u8 = 1;
pub const GUESS_MAX: u8 = 10;

// Amounts in whole tokens
pub const DEFAULT_PLAY_STAKE_TOKENS: u64 = 10;
pub const DEFAULT_MINT_AMOUNT_TOKENS: u64 = 1000;
pub const DEFAULT_STREAK_BONUS_TOKENS: u64 = 100;
pub const DEFAULT_STREAK_TARGET: u32 = 3;

// Wait between approve and play so the allowance is visible to the node
pub const DEFAULT_TX_PROPAGATION_DELAY_MS: u64 = 2000;

// Event watcher
pub const DEFAULT_EVENT_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_EVENT_MAX_BLOCKS_PER_TICK: u64 = 500;
pub const EVENT_INITIAL_BACKFILL_BLOCKS: u64 = 16;
pub const EVENT_BACKOFF_MAX_SECS: u64 = 120;

// Receipt poller
pub const RECEIPT_POLL_INTERVAL_SECS: u64 = 4;
pub const TX_RECORDS_MAX: usize = 2_000;
// Unmined this long means dropped or replaced
pub const TX_PENDING_TIMEOUT_SECS: i64 = 30 * 60;

// History
pub const DEFAULT_HISTORY_MAX_ENTRIES: usize = 100;
// Play tx -> requester attributions kept across all players
pub const HISTORY_OWNERS_MAX: usize = 10_000;
pub const HISTORY_PAGE_DEFAULT: usize = 20;
pub const HISTORY_PAGE_MAX: usize = 100;
