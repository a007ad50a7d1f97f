// Provisioning orchestrator. Pulls a pool snapshot, derives the target
// range, rebalances the funding, mints, and refunds the remainder, staging
// every movement into a settlement batch that is committed once at the end.

use ethers::types::{Address, U256};
use num_bigint::BigInt;
use num_traits::Zero;

use crate::math::range::range_for_width;
use crate::math::ratio::{solve_rebalance, RebalancePolicy};
use crate::math::swap::SwapDirection;

use super::errors::ProvisionError;
use super::settlement::{
    MintReceipt, MintRequest, SettlementAction, SettlementBatch, VenueFill,
};

/// One consistent read of the pool. All math in a provisioning call works
/// off a single snapshot; the price is never re-read mid-flow.
#[derive(Debug, Clone)]
pub struct PoolSnapshot {
    pub address: Address,
    pub token0: Address,
    pub token1: Address,
    pub fee_ppm: u32,
    pub tick_spacing: i32,
    pub sqrt_price_x96: BigInt,
    pub tick: i32,
    pub liquidity: BigInt,
}

/// Read side of the pool.
pub trait PoolSource {
    async fn snapshot(&self) -> Result<PoolSnapshot, ProvisionError>;
}

/// Venue that fills rebalancing swaps.
pub trait SwapVenue {
    async fn swap(
        &self,
        pool: &PoolSnapshot,
        order: &crate::math::ratio::SwapOrder,
    ) -> Result<VenueFill, ProvisionError>;
}

/// Service that issues range positions.
pub trait PositionSink {
    fn address(&self) -> Address;

    async fn mint(
        &self,
        pool: &PoolSnapshot,
        request: &MintRequest,
    ) -> Result<MintReceipt, ProvisionError>;
}

/// Applies a fully staged batch. Nothing in the batch is observable until
/// this succeeds.
pub trait SettlementLayer {
    async fn commit(&self, batch: SettlementBatch) -> Result<(), ProvisionError>;
}

/// What the caller funds a provisioning call with.
#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    pub amount0: BigInt,
    pub amount1: BigInt,
    pub width: i64,
    pub native_funding: BigInt,
    pub recipient: Address,
}

/// The minted position as reported back to the caller.
#[derive(Debug, Clone)]
pub struct Position {
    pub id: U256,
    pub owner: Address,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: BigInt,
    pub amount0_used: BigInt,
    pub amount1_used: BigInt,
}

#[derive(Debug, Clone)]
pub struct ProvisionOutcome {
    pub position: Position,
    pub refund0: BigInt,
    pub refund1: BigInt,
    pub refund_native: BigInt,
    pub swap: Option<VenueFill>,
}

/// Phases a provisioning call moves through, in order. Used for logging
/// and to make the control flow auditable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionPhase {
    Idle,
    RangeComputed,
    Balanced,
    Minted,
    Refunded,
    Done,
}

/// Working balances of one provisioning call. Strictly internal; every
/// debit is checked so the flow can never promise funds it does not hold.
#[derive(Debug)]
struct BalanceSheet {
    token0: BigInt,
    token1: BigInt,
    native: BigInt,
}

impl BalanceSheet {
    fn new(amount0: BigInt, amount1: BigInt, native: BigInt) -> Self {
        BalanceSheet { token0: amount0, token1: amount1, native }
    }

    fn debit_token0(&mut self, amount: &BigInt) -> Result<(), ProvisionError> {
        Self::debit(&mut self.token0, amount, "token0")
    }

    fn debit_token1(&mut self, amount: &BigInt) -> Result<(), ProvisionError> {
        Self::debit(&mut self.token1, amount, "token1")
    }

    fn debit_native(&mut self, amount: &BigInt) -> Result<(), ProvisionError> {
        Self::debit(&mut self.native, amount, "native")
    }

    fn debit(slot: &mut BigInt, amount: &BigInt, what: &str) -> Result<(), ProvisionError> {
        if &*slot < amount {
            return Err(ProvisionError::InsufficientFunds(format!(
                "{} balance {} cannot cover {}",
                what, slot, amount
            )));
        }
        *slot -= amount;
        Ok(())
    }

    fn credit_token0(&mut self, amount: &BigInt) {
        self.token0 += amount;
    }

    fn credit_token1(&mut self, amount: &BigInt) {
        self.token1 += amount;
    }
}

pub struct LiquidityProvisioner<P, V, S, L> {
    pool: P,
    venue: V,
    sink: S,
    settlement: L,
    policy: RebalancePolicy,
}

impl<P, V, S, L> LiquidityProvisioner<P, V, S, L>
where
    P: PoolSource,
    V: SwapVenue,
    S: PositionSink,
    L: SettlementLayer,
{
    pub fn new(pool: P, venue: V, sink: S, settlement: L, policy: RebalancePolicy) -> Self {
        LiquidityProvisioner { pool, venue, sink, settlement, policy }
    }

    /// Address of the position-issuing service this provisioner mints
    /// through.
    pub fn position_manager_address(&self) -> Address {
        self.sink.address()
    }

    /// Run one full provisioning call. On any error the staged batch is
    /// dropped unapplied, so caller funds are untouched.
    pub async fn provide_liquidity(
        &self,
        request: &ProvisionRequest,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        let mut phase = ProvisionPhase::Idle;
        let mut batch = SettlementBatch::new();

        let snapshot = self.pool.snapshot().await?;
        log::info!(
            "provisioning pool {:?} tick {} width {} amounts ({}, {})",
            snapshot.address,
            snapshot.tick,
            request.width,
            request.amount0,
            request.amount1
        );

        let range = range_for_width(snapshot.tick, request.width, snapshot.tick_spacing)?;
        phase = Self::advance(phase, ProvisionPhase::RangeComputed);
        log::debug!("target range [{}, {})", range.lower, range.upper);

        let mut sheet = BalanceSheet::new(
            request.amount0.clone(),
            request.amount1.clone(),
            request.native_funding.clone(),
        );
        self.stage_pulls(&mut batch, &snapshot, request);

        let order = solve_rebalance(
            snapshot.tick,
            &snapshot.sqrt_price_x96,
            &range,
            &sheet.token0,
            &sheet.token1,
            &self.policy,
        )?;

        let fill = match order {
            Some(order) => {
                let fill = self.venue.swap(&snapshot, &order).await?;
                if fill.amount_out < order.min_amount_out {
                    return Err(ProvisionError::SwapFailed(format!(
                        "venue filled {} below minimum {}",
                        fill.amount_out, order.min_amount_out
                    )));
                }
                sheet.debit_native(&fill.native_fee)?;
                match order.direction {
                    SwapDirection::ZeroForOne => {
                        sheet.debit_token0(&fill.amount_in)?;
                        sheet.credit_token1(&fill.amount_out);
                    }
                    SwapDirection::OneForZero => {
                        sheet.debit_token1(&fill.amount_in)?;
                        sheet.credit_token0(&fill.amount_out);
                    }
                }
                log::debug!(
                    "rebalance swap {:?}: in {} out {} fee {}",
                    order.direction,
                    fill.amount_in,
                    fill.amount_out,
                    fill.native_fee
                );
                let (token_in, token_out) = match order.direction {
                    SwapDirection::ZeroForOne => (snapshot.token0, snapshot.token1),
                    SwapDirection::OneForZero => (snapshot.token1, snapshot.token0),
                };
                batch.push(SettlementAction::Swap {
                    token_in,
                    token_out,
                    fee_ppm: snapshot.fee_ppm,
                    order,
                    fill: fill.clone(),
                });
                Some(fill)
            }
            None => {
                log::debug!("funding already on ratio, no swap");
                None
            }
        };
        phase = Self::advance(phase, ProvisionPhase::Balanced);

        let mint_request = MintRequest {
            amount0: sheet.token0.clone(),
            amount1: sheet.token1.clone(),
            range,
            recipient: request.recipient,
        };
        let receipt = self.sink.mint(&snapshot, &mint_request).await?;
        if receipt.used0 > mint_request.amount0 || receipt.used1 > mint_request.amount1 {
            return Err(ProvisionError::MintFailed(format!(
                "mint consumed ({}, {}) above offered ({}, {})",
                receipt.used0, receipt.used1, mint_request.amount0, mint_request.amount1
            )));
        }
        sheet.debit_token0(&receipt.used0)?;
        sheet.debit_token1(&receipt.used1)?;
        log::info!(
            "minted position {} liquidity {} used ({}, {})",
            receipt.position_id,
            receipt.liquidity,
            receipt.used0,
            receipt.used1
        );
        let position = Position {
            id: receipt.position_id,
            owner: request.recipient,
            tick_lower: range.lower,
            tick_upper: range.upper,
            liquidity: receipt.liquidity.clone(),
            amount0_used: receipt.used0.clone(),
            amount1_used: receipt.used1.clone(),
        };
        batch.push(SettlementAction::Mint {
            token0: snapshot.token0,
            token1: snapshot.token1,
            fee_ppm: snapshot.fee_ppm,
            request: mint_request,
            receipt,
        });
        phase = Self::advance(phase, ProvisionPhase::Minted);

        let refund0 = sheet.token0.clone();
        let refund1 = sheet.token1.clone();
        let refund_native = sheet.native.clone();
        self.stage_refunds(&mut batch, &snapshot, request.recipient, &sheet);
        phase = Self::advance(phase, ProvisionPhase::Refunded);

        self.settlement.commit(batch).await?;
        Self::advance(phase, ProvisionPhase::Done);
        log::info!(
            "provisioning settled; refunds ({}, {}, native {})",
            refund0,
            refund1,
            refund_native
        );

        Ok(ProvisionOutcome { position, refund0, refund1, refund_native, swap: fill })
    }

    fn stage_pulls(
        &self,
        batch: &mut SettlementBatch,
        snapshot: &PoolSnapshot,
        request: &ProvisionRequest,
    ) {
        if !request.amount0.is_zero() {
            batch.push(SettlementAction::PullToken {
                token: snapshot.token0,
                from: request.recipient,
                amount: request.amount0.clone(),
            });
        }
        if !request.amount1.is_zero() {
            batch.push(SettlementAction::PullToken {
                token: snapshot.token1,
                from: request.recipient,
                amount: request.amount1.clone(),
            });
        }
        if !request.native_funding.is_zero() {
            batch.push(SettlementAction::PullNative {
                from: request.recipient,
                amount: request.native_funding.clone(),
            });
        }
    }

    fn stage_refunds(
        &self,
        batch: &mut SettlementBatch,
        snapshot: &PoolSnapshot,
        recipient: Address,
        sheet: &BalanceSheet,
    ) {
        if !sheet.token0.is_zero() {
            batch.push(SettlementAction::RefundToken {
                token: snapshot.token0,
                to: recipient,
                amount: sheet.token0.clone(),
            });
        }
        if !sheet.token1.is_zero() {
            batch.push(SettlementAction::RefundToken {
                token: snapshot.token1,
                to: recipient,
                amount: sheet.token1.clone(),
            });
        }
        if !sheet.native.is_zero() {
            batch.push(SettlementAction::RefundNative {
                to: recipient,
                amount: sheet.native.clone(),
            });
        }
    }

    fn advance(from: ProvisionPhase, to: ProvisionPhase) -> ProvisionPhase {
        log::debug!("phase {:?} -> {:?}", from, to);
        to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_sheet_rejects_overdraft() {
        let mut sheet =
            BalanceSheet::new(BigInt::from(100u8), BigInt::from(50u8), BigInt::zero());
        sheet.debit_token0(&BigInt::from(60u8)).unwrap();
        let err = sheet.debit_token0(&BigInt::from(41u8)).unwrap_err();
        match err {
            ProvisionError::InsufficientFunds(msg) => assert!(msg.contains("token0")),
            other => panic!("expected InsufficientFunds, got {:?}", other),
        }
        assert_eq!(sheet.token0, BigInt::from(40u8));
    }

    #[test]
    fn balance_sheet_credit_then_debit() {
        let mut sheet = BalanceSheet::new(BigInt::zero(), BigInt::zero(), BigInt::from(10u8));
        sheet.credit_token1(&BigInt::from(500u16));
        sheet.debit_token1(&BigInt::from(500u16)).unwrap();
        assert!(sheet.token1.is_zero());
        let err = sheet.debit_native(&BigInt::from(11u8)).unwrap_err();
        assert!(matches!(err, ProvisionError::InsufficientFunds(_)));
    }
}
