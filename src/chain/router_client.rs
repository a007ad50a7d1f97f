// Swap venue backed by a v3-style periphery router. Orders are quoted
// with a static call first; the realized fill only becomes real when the
// settlement layer replays it.

use ethers::contract::abigen;
use ethers::prelude::*;
use ethers::providers::{Http, Provider};
use std::sync::Arc;

use crate::engine::errors::ProvisionError;
use crate::engine::provisioner::{PoolSnapshot, SwapVenue};
use crate::engine::settlement::VenueFill;
use crate::math::ratio::SwapOrder;
use crate::math::swap::SwapDirection;

use super::gas::estimate_native_fee;
use super::pool_client::{bigint_to_u256, u256_to_bigint};

abigen!(
    ISwapRouter,
    r#"[
        {
            "name": "exactInputSingle",
            "type": "function",
            "stateMutability": "payable",
            "inputs": [
                {
                    "name": "params",
                    "type": "tuple",
                    "components": [
                        { "name": "tokenIn", "type": "address" },
                        { "name": "tokenOut", "type": "address" },
                        { "name": "fee", "type": "uint24" },
                        { "name": "recipient", "type": "address" },
                        { "name": "deadline", "type": "uint256" },
                        { "name": "amountIn", "type": "uint256" },
                        { "name": "amountOutMinimum", "type": "uint256" },
                        { "name": "sqrtPriceLimitX96", "type": "uint160" }
                    ]
                }
            ],
            "outputs": [
                { "name": "amountOut", "type": "uint256" }
            ]
        }
    ]"#
);

/// (tokenIn, tokenOut, fee, recipient, deadline, amountIn,
/// amountOutMinimum, sqrtPriceLimitX96)
pub(crate) type ExactInputSingleParams =
    (Address, Address, u32, Address, U256, U256, U256, U256);

const SWAP_DEADLINE_SECS: i64 = 300;

pub struct RouterClient {
    provider: Arc<Provider<Http>>,
    contract: ISwapRouter<Provider<Http>>,
    operator: Address,
    gas_swap_units: u64,
}

impl RouterClient {
    pub fn new(
        provider: Arc<Provider<Http>>,
        address: Address,
        operator: Address,
        gas_swap_units: u64,
    ) -> Self {
        RouterClient {
            contract: ISwapRouter::new(address, provider.clone()),
            provider,
            operator,
            gas_swap_units,
        }
    }

    pub(crate) fn swap_params(
        pool: &PoolSnapshot,
        order: &SwapOrder,
        recipient: Address,
    ) -> Result<ExactInputSingleParams, ProvisionError> {
        let (token_in, token_out) = match order.direction {
            SwapDirection::ZeroForOne => (pool.token0, pool.token1),
            SwapDirection::OneForZero => (pool.token1, pool.token0),
        };
        let deadline = chrono::Utc::now().timestamp() + SWAP_DEADLINE_SECS;
        Ok((
            token_in,
            token_out,
            pool.fee_ppm,
            recipient,
            U256::from(deadline as u64),
            bigint_to_u256(&order.amount_in)?,
            bigint_to_u256(&order.min_amount_out)?,
            U256::zero(), // no price limit, the minimum-out bound governs
        ))
    }
}

impl SwapVenue for RouterClient {
    async fn swap(
        &self,
        pool: &PoolSnapshot,
        order: &SwapOrder,
    ) -> Result<VenueFill, ProvisionError> {
        let params = Self::swap_params(pool, order, self.operator)?;
        let amount_out = self
            .contract
            .exact_input_single(params)
            .from(self.operator)
            .call()
            .await
            .map_err(|e| ProvisionError::SwapFailed(format!("router quote: {}", e)))?;

        let native_fee = estimate_native_fee(self.provider.as_ref(), self.gas_swap_units)
            .await
            .map_err(|e| ProvisionError::SwapFailed(format!("gas estimate: {}", e)))?;

        log::debug!(
            "router quoted {:?} in {} -> out {}",
            order.direction,
            order.amount_in,
            amount_out
        );

        Ok(VenueFill {
            amount_in: order.amount_in.clone(),
            amount_out: u256_to_bigint(amount_out),
            native_fee,
        })
    }
}
