use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::geo::{City, Route};

const PRICE_PER_KG: f64 = 500.0;
const MIN_BASE_PRICE: f64 = 1_000.0;
const LOCAL_ROUTE_FEE: u64 = 2_000;
const URGENT_FEE: u64 = 3_000;
const FRAGILE_FEE: u64 = 1_500;
const COMMISSION_RATE: f64 = 0.15;

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequest {
    pub weight_kg: f64,
    pub from: City,
    pub to: City,
    #[serde(default)]
    pub urgent: bool,
    #[serde(default)]
    pub fragile: bool,
}

/// All amounts in FCFA.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceBreakdown {
    pub base_price: f64,
    pub distance_fee: u64,
    pub urgent_fee: u64,
    pub fragile_fee: u64,
    pub total: u64,
    pub commission: u64,
    pub driver_earning: u64,
}

pub fn quote(request: &QuoteRequest) -> Result<PriceBreakdown, AppError> {
    if !request.weight_kg.is_finite() || request.weight_kg <= 0.0 {
        return Err(AppError::BadRequest(
            "weight_kg must be a positive number".to_string(),
        ));
    }

    let base_price = (request.weight_kg * PRICE_PER_KG).max(MIN_BASE_PRICE);
    let distance_fee = route_fee(Route::new(request.from, request.to));
    let urgent_fee = if request.urgent { URGENT_FEE } else { 0 };
    let fragile_fee = if request.fragile { FRAGILE_FEE } else { 0 };

    let total = (base_price + (distance_fee + urgent_fee + fragile_fee) as f64).round() as u64;

    Ok(PriceBreakdown {
        base_price,
        distance_fee,
        urgent_fee,
        fragile_fee,
        total,
        commission: commission(total),
        driver_earning: driver_earning(total),
    })
}

pub fn route_fee(route: Route) -> u64 {
    match route.cities() {
        (City::Yaounde, City::Douala) => 5_000,
        (City::Yaounde, City::Bafoussam) => 3_000,
        (City::Douala, City::Bafoussam) => 7_000,
        // same city
        _ => LOCAL_ROUTE_FEE,
    }
}

pub fn commission(price: u64) -> u64 {
    (price as f64 * COMMISSION_RATE).round() as u64
}

pub fn driver_earning(price: u64) -> u64 {
    price - commission(price)
}
