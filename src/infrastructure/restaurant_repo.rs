//! Restaurant snapshot reads and the approval response outbox.

use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::money::Money;
use crate::domain::restaurant::{Product, Restaurant};
use crate::schema::{products, restaurant_approval_response_outbox, restaurants};

use super::models::{NewApprovalResponseOutboxRow, ProductRow, RestaurantRow};

/// Loads the restaurant with the subset of its products named by
/// `product_ids` (unlisted ids are simply absent from the snapshot).
pub fn find_restaurant_with_products(
    conn: &mut PgConnection,
    restaurant_id: Uuid,
    product_ids: &[Uuid],
) -> Result<Option<Restaurant>, DomainError> {
    let row = restaurants::table
        .filter(restaurants::id.eq(restaurant_id))
        .select(RestaurantRow::as_select())
        .first(conn)
        .optional()?;
    let Some(row) = row else {
        return Ok(None);
    };

    let product_rows = products::table
        .filter(products::restaurant_id.eq(restaurant_id))
        .filter(products::id.eq_any(product_ids))
        .select(ProductRow::as_select())
        .load(conn)?;

    Ok(Some(Restaurant {
        id: row.id,
        name: row.name,
        active: row.active,
        products: product_rows
            .into_iter()
            .map(|p| Product {
                id: p.id,
                name: p.name,
                price: Money::new(p.price),
                available: p.available,
            })
            .collect(),
    }))
}

/// True when a verdict for `saga_id` was already recorded.
pub fn response_outbox_exists(
    conn: &mut PgConnection,
    saga_id: Uuid,
) -> Result<bool, DomainError> {
    let count: i64 = restaurant_approval_response_outbox::table
        .filter(restaurant_approval_response_outbox::saga_id.eq(saga_id))
        .count()
        .get_result(conn)?;
    Ok(count > 0)
}

pub fn insert_response_outbox(
    conn: &mut PgConnection,
    row: NewApprovalResponseOutboxRow,
) -> Result<(), DomainError> {
    diesel::insert_into(restaurant_approval_response_outbox::table)
        .values(&row)
        .execute(conn)?;
    Ok(())
}
