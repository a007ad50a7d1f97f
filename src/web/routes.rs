use num_bigint::BigInt;
use num_traits::Zero;
use rocket::serde::json::Json;
use rocket::{get, post, State};
use std::str::FromStr;
use std::sync::Arc;

use crate::bootstrap::AppState;
use crate::engine::provisioner::ProvisionRequest;
use crate::web::dto::{
    PositionDto, PositionManagerResponse, ProvisionRequestDto, ProvisionResponse, SwapDto,
};

fn parse_amount(field: &str, raw: &str) -> Result<BigInt, String> {
    let value =
        BigInt::from_str(raw).map_err(|_| format!("{} is not a decimal integer: {}", field, raw))?;
    if value < BigInt::zero() {
        return Err(format!("{} must not be negative: {}", field, raw));
    }
    Ok(value)
}

#[post("/api/v1/provide-liquidity", data = "<body>")]
pub async fn provide_liquidity(
    body: Json<ProvisionRequestDto>,
    app_state: &State<Arc<AppState>>,
) -> Json<ProvisionResponse> {
    let request = {
        let amount0 = parse_amount("amount0", &body.amount0);
        let amount1 = parse_amount("amount1", &body.amount1);
        let native = match &body.native_funding {
            Some(raw) => parse_amount("native_funding", raw),
            None => Ok(BigInt::zero()),
        };
        let recipient = ethers::types::Address::from_str(&body.recipient)
            .map_err(|_| format!("recipient is not an address: {}", body.recipient));

        match (amount0, amount1, native, recipient) {
            (Ok(amount0), Ok(amount1), Ok(native_funding), Ok(recipient)) => ProvisionRequest {
                amount0,
                amount1,
                width: body.width,
                native_funding,
                recipient,
            },
            (a0, a1, n, r) => {
                let msg = [
                    a0.err(),
                    a1.err(),
                    n.err(),
                    r.err(),
                ]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join("; ");
                return Json(ProvisionResponse::failure("BAD_REQUEST", msg));
            }
        }
    };

    match app_state.provisioner.provide_liquidity(&request).await {
        Ok(outcome) => Json(ProvisionResponse {
            timestamp_utc: chrono::Utc::now().to_rfc3339(),
            status: "OK".to_string(),
            error_kind: None,
            error: None,
            position: Some(PositionDto {
                id: outcome.position.id.to_string(),
                owner: format!("{:?}", outcome.position.owner),
                tick_lower: outcome.position.tick_lower,
                tick_upper: outcome.position.tick_upper,
                liquidity: outcome.position.liquidity.to_string(),
                amount0_used: outcome.position.amount0_used.to_string(),
                amount1_used: outcome.position.amount1_used.to_string(),
            }),
            refund0: Some(outcome.refund0.to_string()),
            refund1: Some(outcome.refund1.to_string()),
            refund_native: Some(outcome.refund_native.to_string()),
            swap: outcome.swap.map(|fill| SwapDto {
                amount_in: fill.amount_in.to_string(),
                amount_out: fill.amount_out.to_string(),
                native_fee: fill.native_fee.to_string(),
            }),
        }),
        Err(e) => {
            log::error!("provisioning failed: {}", e);
            Json(ProvisionResponse::failure(e.kind(), format!("{}", e)))
        }
    }
}

#[get("/api/v1/position-manager")]
pub fn position_manager(app_state: &State<Arc<AppState>>) -> Json<PositionManagerResponse> {
    Json(PositionManagerResponse {
        address: format!("{:?}", app_state.provisioner.position_manager_address()),
    })
}

#[get("/health")]
pub fn health() -> &'static str {
    "OK"
}
