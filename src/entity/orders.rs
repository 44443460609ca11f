use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    /// `Vec<OrderItem>` frozen at checkout time.
    pub order_items: Json,
    /// `ShippingAddress`
    pub shipping_address: Json,
    pub payment_method: String,
    pub shipping_cost: i64,
    pub total_price: i64,
    pub is_paid: bool,
    pub paid_at: Option<DateTimeWithTimeZone>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
