// src/models/mod.rs
pub mod game;

pub use game::{
    ApiResponse, BalanceResponse, GameEvent, GameEventKind, HistoryEntry, HistoryStatus,
    MintQuery, MintResponse, PlayRequest, PlayResponse, Prediction, StreakStats,
    TokenInfoResponse,
};
