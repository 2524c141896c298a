use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scooter {
    pub id: Uuid,
    pub name: String,
    pub scooter_type: String,
    pub price_per_day: i32,
    pub rating: f64,
    pub reviews: i32,
    pub image: Option<String>,
    pub description: String,
    pub specs: serde_json::Value,
    pub is_spotlight: bool,
    pub manufacturer_url: Option<String>,
    pub location: Option<String>,
    pub owner_name: Option<String>,
    pub owner_whatsapp: Option<String>,
    pub status: String,
    pub host_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScooterRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub scooter_type: String,
    pub price_per_day: i32,
    pub rating: Option<f64>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub specs: Option<serde_json::Value>,
    pub is_spotlight: Option<bool>,
    pub manufacturer_url: Option<String>,
    pub location: Option<String>,
    pub owner_name: Option<String>,
    pub owner_whatsapp: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScooterRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub scooter_type: Option<String>,
    pub price_per_day: Option<i32>,
    pub rating: Option<f64>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub specs: Option<serde_json::Value>,
    pub is_spotlight: Option<bool>,
    pub manufacturer_url: Option<String>,
    pub location: Option<String>,
    pub owner_name: Option<String>,
    pub owner_whatsapp: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScooterQuery {
    pub spotlight: Option<bool>,
}
