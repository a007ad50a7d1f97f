// Gas estimation for the rebalancing swap. One lightweight RPC; the
// caller's native top-up is debited by this amount.

use ethers::prelude::*;
use num_bigint::{BigInt, Sign};

/// Estimate the native cost of a transaction with a predefined gas limit.
pub async fn estimate_native_fee<M: Middleware>(
    provider: &M,
    gas_units: u64,
) -> Result<BigInt, Box<dyn std::error::Error + Send + Sync>> {
    let gas_price = provider
        .get_gas_price()
        .await
        .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { format!("{}", e).into() })?;
    let total_wei = gas_price
        .checked_mul(U256::from(gas_units))
        .unwrap_or_default();

    let mut buf = [0u8; 32];
    total_wei.to_big_endian(&mut buf);
    Ok(BigInt::from_bytes_be(Sign::Plus, &buf))
}
