use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertCartItemRequest {
    pub product_id: Option<Uuid>,
    #[serde(default)]
    pub name: String,
    pub price: Option<i64>,
    /// Absolute quantity for the line, not an increment.
    pub quantity: Option<i32>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RemoveCartItemQuery {
    pub product_id: Option<Uuid>,
}
