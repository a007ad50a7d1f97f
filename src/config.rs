use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub pool_address: String,
    pub swap_router_address: String,
    pub position_manager_address: String,
    pub operator_address: String,
    pub port: u16,

    // Rebalancing policy (bps)
    pub rebalance_tolerance_bps: u32,
    pub max_swap_slippage_bps: u32,

    // Gas constants
    pub gas_swap_units: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Load configuration files (secrets first, then public config)
        dotenv::from_filename("secrets.env").ok();
        dotenv::from_filename("addresses.env").ok();
        dotenv::dotenv().ok();

        Ok(Config {
            rpc_url: env::var("RPC_URL").map_err(|_| "RPC_URL must be set")?,
            pool_address: env::var("POOL_ADDRESS").map_err(|_| "POOL_ADDRESS must be set")?,
            swap_router_address: env::var("SWAP_ROUTER_ADDRESS")
                .map_err(|_| "SWAP_ROUTER_ADDRESS must be set")?,
            position_manager_address: env::var("POSITION_MANAGER_ADDRESS")
                .map_err(|_| "POSITION_MANAGER_ADDRESS must be set")?,
            operator_address: env::var("OPERATOR_ADDRESS")
                .map_err(|_| "OPERATOR_ADDRESS must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .unwrap_or(8000),

            rebalance_tolerance_bps: env::var("REBALANCE_TOLERANCE_BPS")
                .unwrap_or_else(|_| "300".to_string()).parse().unwrap_or(300),
            max_swap_slippage_bps: env::var("MAX_SWAP_SLIPPAGE_BPS")
                .unwrap_or_else(|_| "100".to_string()).parse().unwrap_or(100),

            gas_swap_units: env::var("GAS_SWAP_UNITS")
                .unwrap_or_else(|_| "150000".to_string()).parse().unwrap_or(150000),
        })
    }
}
