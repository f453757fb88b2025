//! Typed bindings for the deployed token / game pair.

use ethers::contract::LogMeta;

use crate::models::{GameEvent, GameEventKind};

mod token_binding {
    ethers::contract::abigen!(
        Token,
        r#"[
            function name() view returns (string)
            function symbol() view returns (string)
            function decimals() view returns (uint8)
            function totalSupply() view returns (uint256)
            function owner() view returns (address)
            function balanceOf(address account) view returns (uint256)
            function allowance(address owner, address spender) view returns (uint256)
            function approve(address spender, uint256 amount) returns (bool)
            function transfer(address to, uint256 amount) returns (bool)
            function mint(address to, uint256 amount)
            event Transfer(address indexed from, address indexed to, uint256 value)
            event Approval(address indexed owner, address indexed spender, uint256 value)
        ]"#
    );
}

mod game_binding {
    ethers::contract::abigen!(
        Game,
        r#"[
            function owner() view returns (address)
            function token() view returns (address)
            function play(uint8 guess)
            function withdraw()
            event BetPlaced(address indexed player, uint256 amount, uint8 guess, uint8 winning)
            event Win(address indexed player, uint256 prize)
            event Loss(address indexed player)
        ]"#
    );
}

pub use game_binding::{BetPlacedFilter, Game, GameEvents, LossFilter, WinFilter};
pub use token_binding::Token;

/// Converts a decoded log plus its metadata into the gateway's event model.
pub fn to_game_event(event: GameEvents, meta: &LogMeta) -> GameEvent {
    let kind = match event {
        GameEvents::BetPlacedFilter(e) => GameEventKind::BetPlaced {
            player: e.player,
            amount: e.amount,
            guess: e.guess,
            winning: e.winning,
        },
        GameEvents::WinFilter(e) => GameEventKind::Win {
            player: e.player,
            prize: e.prize,
        },
        GameEvents::LossFilter(e) => GameEventKind::Loss { player: e.player },
    };
    GameEvent {
        kind,
        tx_hash: meta.transaction_hash,
        block_number: meta.block_number.as_u64(),
        log_index: meta.log_index.as_u64(),
    }
}
