use async_trait::async_trait;
use ethers::{
    abi::Detokenize,
    contract::ContractCall,
    middleware::SignerMiddleware,
    providers::{Http, JsonRpcClient, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, BlockNumber, H256, U256},
};
use std::sync::Arc;

use crate::{
    config::Config,
    contracts::{to_game_event, Game, Token},
    error::{AppError, Result},
    models::GameEvent,
    utils::parse_address,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Everything the gateway needs from the chain. Write methods return as soon as
/// the node accepted the transaction; they never wait for inclusion.
#[async_trait]
pub trait GameChain: Send + Sync {
    fn operator(&self) -> Address;
    fn token_address(&self) -> Address;
    fn game_address(&self) -> Address;

    async fn approve(&self, spender: Address, amount: U256) -> Result<H256>;
    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256>;
    async fn play(&self, guess: u8) -> Result<H256>;
    async fn mint(&self, to: Address, amount: U256) -> Result<H256>;
    async fn balance_of(&self, account: Address) -> Result<U256>;
    async fn token_metadata(&self) -> Result<TokenMetadata>;

    async fn block_number(&self) -> Result<u64>;
    async fn game_events(&self, from_block: u64, to_block: u64) -> Result<Vec<GameEvent>>;
    /// `None` while unmined, otherwise whether the receipt reports success.
    async fn receipt_status(&self, tx_hash: H256) -> Result<Option<bool>>;
}

type SignerClient<P> = SignerMiddleware<Provider<P>, LocalWallet>;

fn rpc_err(err: impl std::fmt::Display) -> AppError {
    AppError::Blockchain(err.to_string())
}

/// `GameChain` over a JSON-RPC provider, signing with the operator key.
///
/// Writes carry an explicit nonce read from the node's pending count. Callers
/// hold the coordinator lock across a submission sequence, so every send sees
/// the previous one already in the pool.
pub struct EthersGameChain<P: JsonRpcClient = Http> {
    client: Arc<SignerClient<P>>,
    token: Token<SignerClient<P>>,
    game: Game<SignerClient<P>>,
    operator: Address,
}

impl EthersGameChain<Http> {
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| AppError::Config(format!("invalid RPC url: {}", e)))?;

        let key = config.private_key.trim();
        let wallet: LocalWallet = key
            .strip_prefix("0x")
            .unwrap_or(key)
            .parse()
            .map_err(|e: ethers::signers::WalletError| AppError::Signer(e.to_string()))?;
        let wallet = wallet.with_chain_id(config.chain_id);

        Ok(Self::new(
            provider,
            wallet,
            parse_address(&config.token_address)?,
            parse_address(&config.game_address)?,
        ))
    }
}

impl<P: JsonRpcClient + 'static> EthersGameChain<P> {
    pub fn new(provider: Provider<P>, wallet: LocalWallet, token: Address, game: Address) -> Self {
        let operator = wallet.address();
        let client = Arc::new(SignerMiddleware::new(provider, wallet));

        Self {
            token: Token::new(token, client.clone()),
            game: Game::new(game, client.clone()),
            client,
            operator,
        }
    }

    /// Next nonce for the operator, counting transactions still in the pool.
    async fn pending_nonce(&self) -> Result<U256> {
        self.client
            .get_transaction_count(self.operator, Some(BlockNumber::Pending.into()))
            .await
            .map_err(rpc_err)
    }

    async fn with_pending_nonce<D: Detokenize>(
        &self,
        call: ContractCall<SignerClient<P>, D>,
    ) -> Result<ContractCall<SignerClient<P>, D>> {
        let nonce = self.pending_nonce().await?;
        tracing::debug!("Operator nonce {} for {:#x}", nonce, self.operator);
        Ok(call.nonce(nonce))
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> GameChain for EthersGameChain<P> {
    fn operator(&self) -> Address {
        self.operator
    }

    fn token_address(&self) -> Address {
        self.token.address()
    }

    fn game_address(&self) -> Address {
        self.game.address()
    }

    async fn approve(&self, spender: Address, amount: U256) -> Result<H256> {
        let call = self
            .with_pending_nonce(self.token.approve(spender, amount))
            .await?;
        let pending = call.send().await.map_err(rpc_err)?;
        Ok(*pending)
    }

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        self.token
            .allowance(owner, spender)
            .call()
            .await
            .map_err(rpc_err)
    }

    async fn play(&self, guess: u8) -> Result<H256> {
        let call = self
            .with_pending_nonce(self.game.play(guess))
            .await?;
        let pending = call.send().await.map_err(rpc_err)?;
        Ok(*pending)
    }

    async fn mint(&self, to: Address, amount: U256) -> Result<H256> {
        let call = self
            .with_pending_nonce(self.token.mint(to, amount))
            .await?;
        let pending = call.send().await.map_err(rpc_err)?;
        Ok(*pending)
    }

    async fn balance_of(&self, account: Address) -> Result<U256> {
        self.token.balance_of(account).call().await.map_err(rpc_err)
    }

    async fn token_metadata(&self) -> Result<TokenMetadata> {
        let name = self.token.name().call().await.map_err(rpc_err)?;
        let symbol = self.token.symbol().call().await.map_err(rpc_err)?;
        let decimals = self.token.decimals().call().await.map_err(rpc_err)?;
        Ok(TokenMetadata {
            name,
            symbol,
            decimals,
        })
    }

    async fn block_number(&self) -> Result<u64> {
        let block = self.client.get_block_number().await.map_err(rpc_err)?;
        Ok(block.as_u64())
    }

    async fn game_events(&self, from_block: u64, to_block: u64) -> Result<Vec<GameEvent>> {
        let logs = self
            .game
            .events()
            .from_block(from_block)
            .to_block(to_block)
            .query_with_meta()
            .await
            .map_err(rpc_err)?;

        let mut events: Vec<GameEvent> = logs
            .into_iter()
            .map(|(event, meta)| to_game_event(event, &meta))
            .collect();
        events.sort_by_key(|e| (e.block_number, e.log_index));
        Ok(events)
    }

    async fn receipt_status(&self, tx_hash: H256) -> Result<Option<bool>> {
        let receipt = self
            .client
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(rpc_err)?;
        Ok(receipt.map(|r| r.status.map(|s| s.as_u64() == 1).unwrap_or(false)))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use ethers::providers::MockProvider;
    use serde_json::json;

    const OPERATOR_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn mocked_chain() -> (EthersGameChain<MockProvider>, MockProvider) {
        let (provider, mock) = Provider::mocked();
        let wallet: LocalWallet = OPERATOR_KEY.parse().unwrap();
        let chain = EthersGameChain::new(
            provider,
            wallet.with_chain_id(11155111u64),
            Address::repeat_byte(0x70),
            Address::repeat_byte(0x9a),
        );
        (chain, mock)
    }

    fn assert_pending_count_lookup(mock: &MockProvider, operator: Address) {
        mock.assert_request(
            "eth_getTransactionCount",
            [json!(operator), json!("pending")],
        )
        .unwrap();
    }

    #[tokio::test]
    async fn approve_then_play_get_consecutive_nonces() {
        let (chain, mock) = mocked_chain();
        // responses are served last-in first-out
        mock.push::<U256, _>(U256::from(8u64)).unwrap();
        mock.push::<U256, _>(U256::from(7u64)).unwrap();

        let approve = chain
            .with_pending_nonce(chain.token.approve(chain.game_address(), U256::from(10u64)))
            .await
            .unwrap();
        let play = chain
            .with_pending_nonce(chain.game.play(4))
            .await
            .unwrap();

        assert_eq!(approve.tx.nonce(), Some(&U256::from(7u64)));
        assert_eq!(play.tx.nonce(), Some(&U256::from(8u64)));
        assert_pending_count_lookup(&mock, chain.operator());
        assert_pending_count_lookup(&mock, chain.operator());
    }

    #[tokio::test]
    async fn nonce_lookup_failure_stops_the_send() {
        let (chain, _mock) = mocked_chain();

        let err = chain.play(3).await.unwrap_err();
        assert!(matches!(err, AppError::Blockchain(_)));
    }

    #[test]
    fn operator_comes_from_the_key() {
        let (chain, _mock) = mocked_chain();
        let wallet: LocalWallet = OPERATOR_KEY.parse().unwrap();
        assert_eq!(chain.operator(), wallet.address());
        assert_eq!(chain.game_address(), Address::repeat_byte(0x9a));
    }
}
