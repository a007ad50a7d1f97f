// Read side of a v3-style pool. One snapshot call gathers everything the
// provisioning flow needs; the static parameters and the live state are
// fetched in parallel.

use ethers::contract::abigen;
use ethers::prelude::*;
use ethers::providers::{Http, Provider};
use num_bigint::{BigInt, Sign};
use std::sync::Arc;

use crate::engine::errors::ProvisionError;
use crate::engine::provisioner::{PoolSnapshot, PoolSource};

abigen!(
    IConcentratedPool,
    r#"[
        function slot0() view returns (uint160 sqrtPriceX96, int24 tick, uint16 observationIndex, uint16 observationCardinality, uint16 observationCardinalityNext, uint8 feeProtocol, bool unlocked)
        function token0() view returns (address)
        function token1() view returns (address)
        function fee() view returns (uint24)
        function tickSpacing() view returns (int24)
        function liquidity() view returns (uint128)
    ]"#
);

pub(crate) fn u256_to_bigint(u: U256) -> BigInt {
    let mut buf = [0u8; 32];
    u.to_big_endian(&mut buf);
    BigInt::from_bytes_be(Sign::Plus, &buf)
}

pub(crate) fn bigint_to_u256(v: &BigInt) -> Result<U256, ProvisionError> {
    let (sign, bytes) = v.to_bytes_be();
    if sign == Sign::Minus || bytes.len() > 32 {
        return Err(ProvisionError::InsufficientFunds(format!(
            "amount {} not representable on chain",
            v
        )));
    }
    Ok(U256::from_big_endian(&bytes))
}

pub struct PoolClient {
    contract: IConcentratedPool<Provider<Http>>,
    address: Address,
}

impl PoolClient {
    pub fn new(provider: Arc<Provider<Http>>, address: Address) -> Self {
        PoolClient {
            contract: IConcentratedPool::new(address, provider),
            address,
        }
    }
}

impl PoolSource for PoolClient {
    async fn snapshot(&self) -> Result<PoolSnapshot, ProvisionError> {
        let unavailable =
            |e: ContractError<Provider<Http>>| ProvisionError::PoolUnavailable(format!("{}", e));

        let slot0_call = self.contract.slot_0();
        let token0_call = self.contract.token_0();
        let token1_call = self.contract.token_1();
        let fee_call = self.contract.fee();
        let tick_spacing_call = self.contract.tick_spacing();
        let liquidity_call = self.contract.liquidity();
        let (slot0, token0, token1, fee, tick_spacing, liquidity) = tokio::try_join!(
            slot0_call.call(),
            token0_call.call(),
            token1_call.call(),
            fee_call.call(),
            tick_spacing_call.call(),
            liquidity_call.call(),
        )
        .map_err(unavailable)?;

        let (sqrt_price_x96, tick, ..) = slot0;
        log::debug!(
            "pool {:?} snapshot: tick {}, liquidity {}",
            self.address,
            tick,
            liquidity
        );

        Ok(PoolSnapshot {
            address: self.address,
            token0,
            token1,
            fee_ppm: fee,
            tick_spacing,
            sqrt_price_x96: u256_to_bigint(sqrt_price_x96),
            tick,
            liquidity: BigInt::from(liquidity),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u256_conversion_is_lossless() {
        for s in ["0", "1", "79228162514264337593543950336", "1000000000000000000"] {
            let u = U256::from_dec_str(s).unwrap();
            assert_eq!(u256_to_bigint(u).to_string(), s);
        }
    }

    #[test]
    fn bigint_to_u256_rejects_negative() {
        let err = bigint_to_u256(&BigInt::from(-1)).unwrap_err();
        assert!(matches!(err, ProvisionError::InsufficientFunds(_)));
        assert_eq!(
            bigint_to_u256(&BigInt::from(42u8)).unwrap(),
            U256::from(42u8)
        );
    }
}
