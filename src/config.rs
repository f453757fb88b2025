use serde::Deserialize;
use std::env;

use crate::constants::{
    DEFAULT_CHAIN_ID, DEFAULT_EVENT_MAX_BLOCKS_PER_TICK, DEFAULT_EVENT_POLL_INTERVAL_SECS,
    DEFAULT_GAME_ADDRESS, DEFAULT_HISTORY_MAX_ENTRIES, DEFAULT_MINT_AMOUNT_TOKENS,
    DEFAULT_PLAY_STAKE_TOKENS, DEFAULT_STREAK_BONUS_TOKENS, DEFAULT_STREAK_TARGET,
    DEFAULT_TOKEN_ADDRESS, DEFAULT_TX_PROPAGATION_DELAY_MS,
};
use crate::utils::{is_truthy, parse_address};

/// Where a play's outcome is known from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeMode {
    /// Only the contract's events decide.
    Chain,
    /// The gateway also draws a predicted winning number per play.
    Local,
}

impl OutcomeMode {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "chain" | "onchain" => Ok(OutcomeMode::Chain),
            "local" => Ok(OutcomeMode::Local),
            other => anyhow::bail!("GAME_OUTCOME_MODE must be chain or local, got {}", other),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Blockchain
    pub rpc_url: String,
    pub chain_id: u64,
    pub private_key: String,

    // Contract Addresses
    pub token_address: String,
    pub game_address: String,

    // Game
    pub play_stake_tokens: u64,
    pub mint_amount_tokens: u64,
    pub streak_bonus_tokens: u64,
    pub streak_target: u32,
    pub tx_propagation_delay_ms: u64,
    pub outcome_mode: OutcomeMode,

    // Event watcher
    pub enable_event_watcher: bool,
    pub event_poll_interval_secs: u64,
    pub event_max_blocks_per_tick: u64,

    pub history_max_entries: usize,

    // CORS
    pub cors_allowed_origins: String,
}

// Internal helper that reads an env var and parses it, falling back to `default`.
fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} is invalid: {}", name, e)),
        _ => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let rpc_url = env::var("RPC_URL")
            .or_else(|_| env::var("SEPOLIA_URL"))
            .map_err(|_| anyhow::anyhow!("RPC_URL (or SEPOLIA_URL) must be set"))?;

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("PORT", 8080)?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "testnet".to_string()),

            rpc_url,
            chain_id: env_parse("CHAIN_ID", DEFAULT_CHAIN_ID)?,
            private_key: env::var("PRIVATE_KEY")?,

            token_address: env::var("TOKEN_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_TOKEN_ADDRESS.to_string()),
            game_address: env::var("GAME_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_GAME_ADDRESS.to_string()),

            play_stake_tokens: env_parse("PLAY_STAKE_TOKENS", DEFAULT_PLAY_STAKE_TOKENS)?,
            mint_amount_tokens: env_parse("MINT_AMOUNT_TOKENS", DEFAULT_MINT_AMOUNT_TOKENS)?,
            streak_bonus_tokens: env_parse("STREAK_BONUS_TOKENS", DEFAULT_STREAK_BONUS_TOKENS)?,
            streak_target: env_parse("STREAK_TARGET", DEFAULT_STREAK_TARGET)?,
            tx_propagation_delay_ms: env_parse(
                "TX_PROPAGATION_DELAY_MS",
                DEFAULT_TX_PROPAGATION_DELAY_MS,
            )?,
            outcome_mode: OutcomeMode::parse(
                &env::var("GAME_OUTCOME_MODE").unwrap_or_default(),
            )?,

            enable_event_watcher: env::var("ENABLE_EVENT_WATCHER")
                .map(|v| is_truthy(&v))
                .unwrap_or(true),
            event_poll_interval_secs: env_parse(
                "EVENT_POLL_INTERVAL_SECS",
                DEFAULT_EVENT_POLL_INTERVAL_SECS,
            )?,
            event_max_blocks_per_tick: env_parse(
                "EVENT_MAX_BLOCKS_PER_TICK",
                DEFAULT_EVENT_MAX_BLOCKS_PER_TICK,
            )?,

            history_max_entries: env_parse("HISTORY_MAX_ENTRIES", DEFAULT_HISTORY_MAX_ENTRIES)?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.rpc_url.trim().is_empty() {
            anyhow::bail!("RPC_URL is empty");
        }
        if self.private_key.trim().is_empty() {
            anyhow::bail!("PRIVATE_KEY is empty");
        }
        if self.chain_id == 0 {
            anyhow::bail!("CHAIN_ID must be non-zero");
        }
        parse_address(&self.token_address)
            .map_err(|_| anyhow::anyhow!("TOKEN_ADDRESS is not a valid address"))?;
        parse_address(&self.game_address)
            .map_err(|_| anyhow::anyhow!("GAME_ADDRESS is not a valid address"))?;
        if self.streak_target == 0 {
            anyhow::bail!("STREAK_TARGET must be at least 1");
        }
        if self.history_max_entries == 0 {
            anyhow::bail!("HISTORY_MAX_ENTRIES must be at least 1");
        }

        if self.token_address.starts_with("0x0000") {
            tracing::warn!("Using placeholder token address");
        }
        if self.game_address.starts_with("0x0000") {
            tracing::warn!("Using placeholder game address");
        }
        if self.play_stake_tokens == 0 {
            tracing::warn!("PLAY_STAKE_TOKENS is 0; plays will approve nothing");
        }
        if self.event_poll_interval_secs == 0 || self.event_max_blocks_per_tick == 0 {
            tracing::warn!("Event watcher interval/range values should be > 0");
        }
        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }

    pub fn is_testnet(&self) -> bool {
        if self.environment == "development" || self.environment == "testnet" {
            return true;
        }
        // Sepolia, Holesky, local hardhat/anvil
        matches!(self.chain_id, 11155111 | 17000 | 31337)
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        host: "127.0.0.1".into(),
        port: 8080,
        environment: "testnet".into(),
        rpc_url: "http://localhost:8545".into(),
        chain_id: DEFAULT_CHAIN_ID,
        private_key: "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80".into(),
        token_address: DEFAULT_TOKEN_ADDRESS.into(),
        game_address: DEFAULT_GAME_ADDRESS.into(),
        play_stake_tokens: DEFAULT_PLAY_STAKE_TOKENS,
        mint_amount_tokens: DEFAULT_MINT_AMOUNT_TOKENS,
        streak_bonus_tokens: DEFAULT_STREAK_BONUS_TOKENS,
        streak_target: DEFAULT_STREAK_TARGET,
        tx_propagation_delay_ms: 0,
        outcome_mode: OutcomeMode::Chain,
        enable_event_watcher: false,
        event_poll_interval_secs: 1,
        event_max_blocks_per_tick: 100,
        history_max_entries: 10,
        cors_allowed_origins: "*".into(),
    }
}
