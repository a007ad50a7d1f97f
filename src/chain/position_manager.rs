// Position issuance through the periphery position manager. Mints are
// quoted with a static call; the settlement layer replays them for real.

use ethers::contract::abigen;
use ethers::prelude::*;
use ethers::providers::{Http, Provider};
use num_bigint::BigInt;
use std::sync::Arc;

use crate::engine::errors::ProvisionError;
use crate::engine::provisioner::{PoolSnapshot, PositionSink};
use crate::engine::settlement::{MintReceipt, MintRequest};

use super::pool_client::{bigint_to_u256, u256_to_bigint};

abigen!(
    IPositionManager,
    r#"[
        {
            "name": "mint",
            "type": "function",
            "stateMutability": "payable",
            "inputs": [
                {
                    "name": "params",
                    "type": "tuple",
                    "components": [
                        { "name": "token0", "type": "address" },
                        { "name": "token1", "type": "address" },
                        { "name": "fee", "type": "uint24" },
                        { "name": "tickLower", "type": "int24" },
                        { "name": "tickUpper", "type": "int24" },
                        { "name": "amount0Desired", "type": "uint256" },
                        { "name": "amount1Desired", "type": "uint256" },
                        { "name": "amount0Min", "type": "uint256" },
                        { "name": "amount1Min", "type": "uint256" },
                        { "name": "recipient", "type": "address" },
                        { "name": "deadline", "type": "uint256" }
                    ]
                }
            ],
            "outputs": [
                { "name": "tokenId", "type": "uint256" },
                { "name": "liquidity", "type": "uint128" },
                { "name": "amount0", "type": "uint256" },
                { "name": "amount1", "type": "uint256" }
            ]
        }
    ]"#
);

/// (token0, token1, fee, tickLower, tickUpper, amount0Desired,
/// amount1Desired, amount0Min, amount1Min, recipient, deadline)
pub(crate) type MintParams =
    (Address, Address, u32, i32, i32, U256, U256, U256, U256, Address, U256);

const MINT_DEADLINE_SECS: i64 = 300;

pub struct PositionClient {
    contract: IPositionManager<Provider<Http>>,
    address: Address,
    operator: Address,
}

impl PositionClient {
    pub fn new(provider: Arc<Provider<Http>>, address: Address, operator: Address) -> Self {
        PositionClient {
            contract: IPositionManager::new(address, provider),
            address,
            operator,
        }
    }

    pub(crate) fn mint_params(
        pool: &PoolSnapshot,
        request: &MintRequest,
    ) -> Result<MintParams, ProvisionError> {
        let deadline = chrono::Utc::now().timestamp() + MINT_DEADLINE_SECS;
        // Min amounts stay zero: the orchestrator enforces its own bounds
        // on the quoted receipt.
        Ok((
            pool.token0,
            pool.token1,
            pool.fee_ppm,
            request.range.lower,
            request.range.upper,
            bigint_to_u256(&request.amount0)?,
            bigint_to_u256(&request.amount1)?,
            U256::zero(),
            U256::zero(),
            request.recipient,
            U256::from(deadline as u64),
        ))
    }
}

impl PositionSink for PositionClient {
    fn address(&self) -> Address {
        self.address
    }

    async fn mint(
        &self,
        pool: &PoolSnapshot,
        request: &MintRequest,
    ) -> Result<MintReceipt, ProvisionError> {
        let params = Self::mint_params(pool, request)?;
        let (token_id, liquidity, amount0, amount1) = self
            .contract
            .mint(params)
            .from(self.operator)
            .call()
            .await
            .map_err(|e| ProvisionError::MintFailed(format!("{}", e)))?;

        log::debug!(
            "mint quote: position {} liquidity {} used ({}, {})",
            token_id,
            liquidity,
            amount0,
            amount1
        );

        Ok(MintReceipt {
            position_id: token_id,
            liquidity: BigInt::from(liquidity),
            used0: u256_to_bigint(amount0),
            used1: u256_to_bigint(amount1),
        })
    }
}
