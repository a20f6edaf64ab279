use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::order::{split_references, OrderView};
use crate::schema::orders;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: i32,
    pub product: Option<String>,
    pub comment: Option<String>,
    pub letter_style: Option<String>,
    pub design: Option<String>,
    pub deadline: Option<String>,
    pub price: Option<BigDecimal>,
    pub status: String,
    pub images: String,
    pub created_at: DateTime<Utc>,
}

/// `status` and `created_at` are filled in by their column defaults.
#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub product: Option<String>,
    pub comment: Option<String>,
    pub letter_style: Option<String>,
    pub design: Option<String>,
    pub deadline: Option<String>,
    pub price: Option<BigDecimal>,
    pub images: String,
}

impl From<OrderRow> for OrderView {
    fn from(row: OrderRow) -> Self {
        OrderView {
            id: row.id,
            product: row.product,
            comment: row.comment,
            letter_style: row.letter_style,
            design: row.design,
            deadline: row.deadline,
            price: row.price,
            status: row.status,
            images: split_references(&row.images),
            created_at: row.created_at,
        }
    }
}
