use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub store_id: Uuid,
    #[sea_orm(unique)]
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub notes: Option<String>,
    pub admin_notes: Option<String>,
    pub subtotal: i64,
    pub shipping_fee: i64,
    pub discount_amount: i64,
    pub total_amount: i64,
    pub status: String,
    pub payment_status: String,
    pub confirmed_at: Option<DateTimeWithTimeZone>,
    pub shipped_at: Option<DateTimeWithTimeZone>,
    pub delivered_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::stores::Entity",
        from = "Column::StoreId",
        to = "super::stores::Column::Id"
    )]
    Stores,
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
}

impl Related<super::stores::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stores.def()
    }
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for crate::models::Order {
    fn from(model: Model) -> Self {
        let utc = chrono::Utc;
        Self {
            id: model.id,
            store_id: model.store_id,
            order_number: model.order_number,
            customer_name: model.customer_name,
            customer_email: model.customer_email,
            customer_phone: model.customer_phone,
            customer_address: model.customer_address,
            notes: model.notes,
            admin_notes: model.admin_notes,
            subtotal: model.subtotal,
            shipping_fee: model.shipping_fee,
            discount_amount: model.discount_amount,
            total_amount: model.total_amount,
            status: model.status,
            payment_status: model.payment_status,
            confirmed_at: model.confirmed_at.map(|dt| dt.with_timezone(&utc)),
            shipped_at: model.shipped_at.map(|dt| dt.with_timezone(&utc)),
            delivered_at: model.delivered_at.map(|dt| dt.with_timezone(&utc)),
            created_at: model.created_at.with_timezone(&utc),
            updated_at: model.updated_at.with_timezone(&utc),
        }
    }
}
