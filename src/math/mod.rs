pub mod liquidity;
pub mod range;
pub mod ratio;
pub mod swap;
pub mod tick;
