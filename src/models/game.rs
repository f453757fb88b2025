use chrono::{DateTime, Utc};
use ethers::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PlayRequest {
    pub address: String,
    pub guess: i64,
}

/// Locally drawn outcome, reported alongside the on-chain submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub winning_number: u8,
    pub win: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayResponse {
    pub result: String,
    pub address: String,
    pub guess: u8,
    pub approve_tx: String,
    pub play_tx: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<Prediction>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MintQuery {
    pub to: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintResponse {
    pub minted_to: String,
    pub amount: String,
    pub tx_hash: String,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: String,
    pub formatted: String,
    pub symbol: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfoResponse {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub token_address: String,
    pub game_address: String,
    pub operator: String,
    pub chain_id: u64,
}

/// Decoded game contract event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEventKind {
    BetPlaced {
        player: Address,
        amount: U256,
        guess: u8,
        winning: u8,
    },
    Win {
        player: Address,
        prize: U256,
    },
    Loss {
        player: Address,
    },
}

impl GameEventKind {
    pub fn player(&self) -> Address {
        match self {
            GameEventKind::BetPlaced { player, .. }
            | GameEventKind::Win { player, .. }
            | GameEventKind::Loss { player } => *player,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GameEventKind::BetPlaced { .. } => "BetPlaced",
            GameEventKind::Win { .. } => "Win",
            GameEventKind::Loss { .. } => "Loss",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameEvent {
    pub kind: GameEventKind,
    pub tx_hash: H256,
    pub block_number: u64,
    pub log_index: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryStatus {
    Submitted,
    Won,
    Lost,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub play_tx: String,
    pub guess: Option<u8>,
    pub status: HistoryStatus,
    pub winning_number: Option<u8>,
    pub prize: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted: Option<Prediction>,
    pub submitted_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakStats {
    pub current: u32,
    pub best: u32,
    pub bonuses_awarded: u32,
    /// Bonus mints that were due but rejected by the node.
    pub bonuses_failed: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_response_success_sets_flag() {
        let response = ApiResponse::success("ok");
        assert!(response.success);
        assert_eq!(response.data, "ok");
    }

    #[test]
    fn play_response_uses_camel_case_keys() {
        let response = PlayResponse {
            result: "submitted".into(),
            address: "0xabc".into(),
            guess: 4,
            approve_tx: "0x01".into(),
            play_tx: "0x02".into(),
            prediction: None,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["approveTx"], "0x01");
        assert_eq!(value["playTx"], "0x02");
        assert!(value.get("prediction").is_none());
    }

    #[test]
    fn event_player_is_extracted_from_every_kind() {
        let player = Address::repeat_byte(0x11);
        let kinds = [
            GameEventKind::BetPlaced {
                player,
                amount: U256::one(),
                guess: 3,
                winning: 7,
            },
            GameEventKind::Win {
                player,
                prize: U256::one(),
            },
            GameEventKind::Loss { player },
        ];
        for kind in kinds {
            assert_eq!(kind.player(), player);
        }
    }
}
