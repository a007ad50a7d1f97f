// Staged settlement. Every token movement a provisioning call wants to make
// is recorded here first; the batch reaches the settlement layer in one
// piece only after every step has succeeded. A call that fails mid-way
// simply drops its batch, so no partial movement is ever observable.

use ethers::types::{Address, U256};
use num_bigint::BigInt;

use crate::math::range::TickRange;
use crate::math::ratio::SwapOrder;

/// Mint parameters handed to the position-issuing service.
#[derive(Debug, Clone)]
pub struct MintRequest {
    pub amount0: BigInt,
    pub amount1: BigInt,
    pub range: TickRange,
    pub recipient: Address,
}

/// What the position-issuing service reports back. The service may round
/// consumed amounts down; `used` never exceeds the offered amounts.
#[derive(Debug, Clone)]
pub struct MintReceipt {
    pub position_id: U256,
    pub liquidity: BigInt,
    pub used0: BigInt,
    pub used1: BigInt,
}

/// Realized result of a swap quote from the venue.
#[derive(Debug, Clone)]
pub struct VenueFill {
    pub amount_in: BigInt,
    pub amount_out: BigInt,
    /// Native currency the venue will consume from the caller's top-up.
    pub native_fee: BigInt,
}

#[derive(Debug, Clone)]
pub enum SettlementAction {
    /// Pull a caller-approved token balance into the orchestrator.
    PullToken {
        token: Address,
        from: Address,
        amount: BigInt,
    },
    /// Pull the caller's native top-up.
    PullNative { from: Address, amount: BigInt },
    /// Execute the rebalancing swap.
    Swap {
        token_in: Address,
        token_out: Address,
        fee_ppm: u32,
        order: SwapOrder,
        fill: VenueFill,
    },
    /// Mint the position with the rebalanced amounts.
    Mint {
        token0: Address,
        token1: Address,
        fee_ppm: u32,
        request: MintRequest,
        receipt: MintReceipt,
    },
    /// Return an unconsumed token balance to the caller.
    RefundToken {
        token: Address,
        to: Address,
        amount: BigInt,
    },
    /// Return the unconsumed native remainder to the caller.
    RefundNative { to: Address, amount: BigInt },
}

/// Ordered batch of staged actions for one provisioning call. Exclusively
/// owned by that call; never shared.
#[derive(Debug, Default)]
pub struct SettlementBatch {
    actions: Vec<SettlementAction>,
}

impl SettlementBatch {
    pub fn new() -> Self {
        SettlementBatch { actions: Vec::new() }
    }

    pub fn push(&mut self, action: SettlementAction) {
        self.actions.push(action);
    }

    pub fn actions(&self) -> &[SettlementAction] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
