use ethers::prelude::*;
use std::str::FromStr;
use std::sync::Arc;

use crate::chain::pool_client::PoolClient;
use crate::chain::position_manager::PositionClient;
use crate::chain::providers;
use crate::chain::router_client::RouterClient;
use crate::chain::settlement::ChainSettlement;
use crate::config::Config;
use crate::engine::provisioner::LiquidityProvisioner;
use crate::math::ratio::RebalancePolicy;

pub type ChainProvisioner =
    LiquidityProvisioner<PoolClient, RouterClient, PositionClient, ChainSettlement>;

pub struct AppState {
    pub provider: Arc<Provider<Http>>,
    pub provisioner: ChainProvisioner,
    pub operator: Address,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        let provider = providers::create_provider(&config.rpc_url)?;

        let pool_address = Address::from_str(&config.pool_address)?;
        let router_address = Address::from_str(&config.swap_router_address)?;
        let manager_address = Address::from_str(&config.position_manager_address)?;
        let operator = Address::from_str(&config.operator_address)?;

        let policy = RebalancePolicy {
            rebalance_tolerance_bps: config.rebalance_tolerance_bps,
            max_swap_slippage_bps: config.max_swap_slippage_bps,
        };

        let provisioner = LiquidityProvisioner::new(
            PoolClient::new(provider.clone(), pool_address),
            RouterClient::new(provider.clone(), router_address, operator, config.gas_swap_units),
            PositionClient::new(provider.clone(), manager_address, operator),
            ChainSettlement::new(provider.clone(), operator, router_address, manager_address),
            policy,
        );

        Ok(AppState { provider, provisioner, operator })
    }
}
