// On-chain settlement. Replays a fully staged batch as real transactions
// from the operator account, in staging order. Nothing before this point
// has touched a balance, so an error here aborts the call with at most the
// already-applied prefix on chain; quoting failures never reach this far.

use ethers::contract::abigen;
use ethers::prelude::*;
use ethers::providers::{Http, Provider};
use std::sync::Arc;

use crate::engine::errors::ProvisionError;
use crate::engine::provisioner::SettlementLayer;
use crate::engine::settlement::{SettlementAction, SettlementBatch};

use super::pool_client::bigint_to_u256;
use super::position_manager::IPositionManager;
use super::router_client::ISwapRouter;

abigen!(
    IERC20,
    r#"[
        function transfer(address to, uint256 amount) returns (bool)
        function transferFrom(address from, address to, uint256 amount) returns (bool)
        function approve(address spender, uint256 amount) returns (bool)
    ]"#
);

const DEADLINE_SECS: i64 = 300;

/// Settlement against a node that manages the operator account. Token
/// pulls rely on prior ERC20 approvals from the caller; native funding is
/// expected on the operator balance before commit.
pub struct ChainSettlement {
    provider: Arc<Provider<Http>>,
    operator: Address,
    router: Address,
    position_manager: Address,
}

impl ChainSettlement {
    pub fn new(
        provider: Arc<Provider<Http>>,
        operator: Address,
        router: Address,
        position_manager: Address,
    ) -> Self {
        ChainSettlement { provider, operator, router, position_manager }
    }

    fn erc20(&self, token: Address) -> IERC20<Provider<Http>> {
        IERC20::new(token, self.provider.clone())
    }

    async fn send<D: ethers::abi::Detokenize>(
        &self,
        call: ContractCall<Provider<Http>, D>,
        what: &str,
        err: fn(String) -> ProvisionError,
    ) -> Result<(), ProvisionError> {
        let call = call.from(self.operator);
        let pending = call
            .send()
            .await
            .map_err(|e| err(format!("{} send: {}", what, e)))?;
        let receipt = pending
            .await
            .map_err(|e| err(format!("{} confirmation: {}", what, e)))?
            .ok_or_else(|| err(format!("{} dropped from mempool", what)))?;
        if receipt.status != Some(1.into()) {
            return Err(err(format!("{} reverted in tx {:?}", what, receipt.transaction_hash)));
        }
        Ok(())
    }

    async fn apply(&self, action: &SettlementAction) -> Result<(), ProvisionError> {
        let deadline = U256::from((chrono::Utc::now().timestamp() + DEADLINE_SECS) as u64);
        match action {
            SettlementAction::PullToken { token, from, amount } => {
                let amount = bigint_to_u256(amount)?;
                self.send(
                    self.erc20(*token).transfer_from(*from, self.operator, amount),
                    "token pull",
                    ProvisionError::InsufficientFunds,
                )
                .await
            }
            SettlementAction::PullNative { from: _, amount } => {
                // Native funding is deposited up front; confirm it arrived.
                let amount = bigint_to_u256(amount)?;
                let balance = self
                    .provider
                    .get_balance(self.operator, None)
                    .await
                    .map_err(|e| ProvisionError::PoolUnavailable(format!("{}", e)))?;
                if balance < amount {
                    return Err(ProvisionError::InsufficientFunds(format!(
                        "operator native balance {} below funding {}",
                        balance, amount
                    )));
                }
                Ok(())
            }
            SettlementAction::Swap { token_in, token_out, fee_ppm, order, fill: _ } => {
                let amount_in = bigint_to_u256(&order.amount_in)?;
                self.send(
                    self.erc20(*token_in).approve(self.router, amount_in),
                    "router approval",
                    ProvisionError::SwapFailed,
                )
                .await?;
                let router = ISwapRouter::new(self.router, self.provider.clone());
                self.send(
                    router.exact_input_single((
                        *token_in,
                        *token_out,
                        *fee_ppm,
                        self.operator,
                        deadline,
                        amount_in,
                        bigint_to_u256(&order.min_amount_out)?,
                        U256::zero(),
                    )),
                    "swap",
                    ProvisionError::SwapFailed,
                )
                .await
            }
            SettlementAction::Mint { token0, token1, fee_ppm, request, receipt: _ } => {
                let amount0 = bigint_to_u256(&request.amount0)?;
                let amount1 = bigint_to_u256(&request.amount1)?;
                self.send(
                    self.erc20(*token0).approve(self.position_manager, amount0),
                    "token0 approval",
                    ProvisionError::MintFailed,
                )
                .await?;
                self.send(
                    self.erc20(*token1).approve(self.position_manager, amount1),
                    "token1 approval",
                    ProvisionError::MintFailed,
                )
                .await?;
                let manager = IPositionManager::new(self.position_manager, self.provider.clone());
                self.send(
                    manager.mint((
                        *token0,
                        *token1,
                        *fee_ppm,
                        request.range.lower,
                        request.range.upper,
                        amount0,
                        amount1,
                        U256::zero(),
                        U256::zero(),
                        request.recipient,
                        deadline,
                    )),
                    "mint",
                    ProvisionError::MintFailed,
                )
                .await
            }
            SettlementAction::RefundToken { token, to, amount } => {
                let amount = bigint_to_u256(amount)?;
                self.send(
                    self.erc20(*token).transfer(*to, amount),
                    "token refund",
                    ProvisionError::InsufficientFunds,
                )
                .await
            }
            SettlementAction::RefundNative { to, amount } => {
                let tx = TransactionRequest::new()
                    .from(self.operator)
                    .to(*to)
                    .value(bigint_to_u256(amount)?);
                let pending = self
                    .provider
                    .send_transaction(tx, None)
                    .await
                    .map_err(|e| {
                        ProvisionError::InsufficientFunds(format!("native refund: {}", e))
                    })?;
                pending.await.map_err(|e| {
                    ProvisionError::InsufficientFunds(format!("native refund: {}", e))
                })?;
                Ok(())
            }
        }
    }
}

impl SettlementLayer for ChainSettlement {
    async fn commit(&self, batch: SettlementBatch) -> Result<(), ProvisionError> {
        log::info!("committing settlement batch of {} actions", batch.len());
        for action in batch.actions() {
            self.apply(action).await?;
        }
        Ok(())
    }
}
