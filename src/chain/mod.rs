pub mod gas;
pub mod pool_client;
pub mod position_manager;
pub mod providers;
pub mod router_client;
pub mod settlement;
