use ethers::types::U256;
use std::sync::Arc;
use tokio::time::{sleep, Duration};

use crate::{
    config::{Config, OutcomeMode},
    constants::{GUESS_MAX, GUESS_MIN, TOKEN_DECIMALS, TOKEN_SYMBOL},
    error::{AppError, Result},
    models::{BalanceResponse, MintResponse, PlayResponse},
    services::{
        chain::GameChain,
        history::GameHistory,
        outcome::OutcomePredictor,
        tx_coordinator::{TxCoordinator, TxKind},
    },
    utils::{format_token_amount, parse_address, tokens_to_base_units},
};

// Internal helper that validates a raw guess against the game's range.
fn validate_guess(guess: i64) -> Result<u8> {
    if guess < GUESS_MIN as i64 || guess > GUESS_MAX as i64 {
        return Err(AppError::BadRequest(format!(
            "guess must be between {} and {}",
            GUESS_MIN, GUESS_MAX
        )));
    }
    Ok(guess as u8)
}

/// Play / mint / balance flows on top of the chain seam.
pub struct GameService {
    chain: Arc<dyn GameChain>,
    coordinator: Arc<TxCoordinator>,
    history: Arc<GameHistory>,
    stake: U256,
    mint_tokens: u64,
    propagation_delay: Duration,
    outcome_mode: OutcomeMode,
}

impl GameService {
    pub fn new(
        chain: Arc<dyn GameChain>,
        coordinator: Arc<TxCoordinator>,
        history: Arc<GameHistory>,
        config: &Config,
    ) -> Self {
        Self {
            chain,
            coordinator,
            history,
            stake: tokens_to_base_units(config.play_stake_tokens),
            mint_tokens: config.mint_amount_tokens,
            propagation_delay: Duration::from_millis(config.tx_propagation_delay_ms),
            outcome_mode: config.outcome_mode,
        }
    }

    /// Approve the stake, wait for it to propagate, then call `play(guess)`.
    /// The stake is paid by the operator key; `requester` only owns the history entry.
    pub async fn play(&self, requester: &str, guess: i64) -> Result<PlayResponse> {
        let guess = validate_guess(guess)?;
        let requester = parse_address(requester)?;
        let requester_hex = format!("{:#x}", requester);
        let game = self.chain.game_address();
        let operator = self.chain.operator();
        let prediction = match self.outcome_mode {
            OutcomeMode::Local => Some(OutcomePredictor::predict(guess)),
            OutcomeMode::Chain => None,
        };

        let (approve_tx, play_tx) = {
            let _guard = self.coordinator.lock().await;

            let approve_tx = self.chain.approve(game, self.stake).await.map_err(|e| {
                tracing::error!("Approve error: {}", e);
                AppError::step("approve failed", e)
            })?;
            tracing::info!("Approve tx hash: {:#x}", approve_tx);
            self.coordinator
                .record(approve_tx, TxKind::Approve, Some(requester_hex.clone()))
                .await;

            sleep(self.propagation_delay).await;

            let allowance = self.chain.allowance(operator, game).await.map_err(|e| {
                tracing::error!("Allowance check failed: {}", e);
                AppError::step("allowance check failed", e)
            })?;
            tracing::info!("Allowance from sender to Game: {}", allowance);

            let play_tx = self.chain.play(guess).await.map_err(|e| {
                tracing::error!("Play error: {}", e);
                AppError::step("play failed", e)
            })?;
            tracing::info!("Play tx hash: {:#x}", play_tx);
            self.coordinator
                .record(play_tx, TxKind::Play, Some(requester_hex.clone()))
                .await;
            // Claim the play before the guard drops so the watcher never sees
            // its events unattributed.
            self.history
                .record_submission(requester, play_tx, guess, prediction)
                .await;

            (approve_tx, play_tx)
        };

        Ok(PlayResponse {
            result: "submitted".to_string(),
            address: requester_hex,
            guess,
            approve_tx: format!("{:#x}", approve_tx),
            play_tx: format!("{:#x}", play_tx),
            prediction,
        })
    }

    /// Mints the configured amount to `to`, or to the operator when absent.
    pub async fn mint(&self, to: Option<&str>) -> Result<MintResponse> {
        let recipient = match to.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => parse_address(raw)?,
            None => self.chain.operator(),
        };
        let amount = tokens_to_base_units(self.mint_tokens);

        let tx = {
            let _guard = self.coordinator.lock().await;
            let tx = self.chain.mint(recipient, amount).await.map_err(|e| {
                tracing::error!("Mint failed: {}", e);
                AppError::step("mint failed", e)
            })?;
            self.coordinator
                .record(tx, TxKind::Mint, Some(format!("{:#x}", recipient)))
                .await;
            tx
        };
        tracing::info!("Mint tx hash: {:#x}", tx);

        Ok(MintResponse {
            minted_to: format!("{:#x}", recipient),
            amount: format!("{} {}", self.mint_tokens, TOKEN_SYMBOL),
            tx_hash: format!("{:#x}", tx),
        })
    }

    pub async fn balance(&self, address: &str) -> Result<BalanceResponse> {
        let account = parse_address(address)?;
        let balance = self.chain.balance_of(account).await.map_err(|e| {
            tracing::warn!("Balance lookup for {:#x} failed: {}", account, e);
            AppError::step("balance check failed", e)
        })?;

        Ok(BalanceResponse {
            address: format!("{:#x}", account),
            balance: balance.to_string(),
            formatted: format_token_amount(balance, TOKEN_DECIMALS),
            symbol: TOKEN_SYMBOL.to_string(),
        })
    }
}
