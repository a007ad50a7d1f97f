use rocket::serde::{Deserialize, Serialize};

/// Request body for a provisioning call. Token amounts travel as decimal
/// strings; they routinely exceed what a JSON number can carry.
#[derive(Deserialize)]
pub struct ProvisionRequestDto {
    pub amount0: String,
    pub amount1: String,
    pub width: i64,
    pub native_funding: Option<String>,
    pub recipient: String,
}

#[derive(Serialize)]
pub struct PositionDto {
    pub id: String,
    pub owner: String,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: String,
    pub amount0_used: String,
    pub amount1_used: String,
}

#[derive(Serialize)]
pub struct SwapDto {
    pub amount_in: String,
    pub amount_out: String,
    pub native_fee: String,
}

#[derive(Serialize)]
pub struct ProvisionResponse {
    pub timestamp_utc: String,
    pub status: String,
    pub error_kind: Option<String>,
    pub error: Option<String>,
    pub position: Option<PositionDto>,
    pub refund0: Option<String>,
    pub refund1: Option<String>,
    pub refund_native: Option<String>,
    pub swap: Option<SwapDto>,
}

impl ProvisionResponse {
    pub fn failure(kind: &str, message: String) -> Self {
        ProvisionResponse {
            timestamp_utc: chrono::Utc::now().to_rfc3339(),
            status: "ERROR".to_string(),
            error_kind: Some(kind.to_string()),
            error: Some(message),
            position: None,
            refund0: None,
            refund1: None,
            refund_native: None,
            swap: None,
        }
    }
}

#[derive(Serialize)]
pub struct PositionManagerResponse {
    pub address: String,
}
