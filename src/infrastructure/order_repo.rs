//! Row operations for the order aggregate. All functions run on an open
//! connection so callers can span aggregate and outbox writes in one
//! transaction; status updates are compare-and-set on the version column.

use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::money::Money;
use crate::domain::order::{
    join_failure_messages, split_failure_messages, Order, OrderItem, OrderStatus, StreetAddress,
};
use crate::schema::{order_items, orders};

use super::models::{NewOrderItemRow, NewOrderRow, OrderItemRow, OrderRow};

/// An order hydrated from its rows together with the version needed for
/// compare-and-set updates.
#[derive(Debug, Clone)]
pub struct StoredOrder {
    pub order: Order,
    pub version: i32,
}

pub fn insert_order(conn: &mut PgConnection, order: &Order) -> Result<(), DomainError> {
    diesel::insert_into(orders::table)
        .values(&NewOrderRow {
            id: order.id,
            customer_id: order.customer_id,
            restaurant_id: order.restaurant_id,
            tracking_id: order.tracking_id,
            street: order.delivery_address.street.clone(),
            postal_code: order.delivery_address.postal_code.clone(),
            city: order.delivery_address.city.clone(),
            price: order.price.amount().clone(),
            order_status: order.order_status.as_str().to_string(),
            failure_messages: join_failure_messages(&order.failure_messages),
        })
        .execute(conn)?;

    let item_rows: Vec<NewOrderItemRow> = order
        .items
        .iter()
        .map(|item| NewOrderItemRow {
            id: item.id,
            order_id: order.id,
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price.amount().clone(),
            sub_total: item.sub_total.amount().clone(),
        })
        .collect();
    diesel::insert_into(order_items::table)
        .values(&item_rows)
        .execute(conn)?;

    Ok(())
}

pub fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<StoredOrder>, DomainError> {
    let row = orders::table
        .filter(orders::id.eq(id))
        .select(OrderRow::as_select())
        .first(conn)
        .optional()?;
    hydrate(conn, row)
}

pub fn find_by_tracking_id(
    conn: &mut PgConnection,
    tracking_id: Uuid,
) -> Result<Option<StoredOrder>, DomainError> {
    let row = orders::table
        .filter(orders::tracking_id.eq(tracking_id))
        .select(OrderRow::as_select())
        .first(conn)
        .optional()?;
    hydrate(conn, row)
}

/// Persists a transition applied to the aggregate. Returns `false` when the
/// version check fails (a concurrent writer got there first).
pub fn update_order_status(
    conn: &mut PgConnection,
    order: &Order,
    expected_version: i32,
) -> Result<bool, DomainError> {
    let updated = diesel::update(
        orders::table
            .filter(orders::id.eq(order.id))
            .filter(orders::version.eq(expected_version)),
    )
    .set((
        orders::order_status.eq(order.order_status.as_str()),
        orders::failure_messages.eq(join_failure_messages(&order.failure_messages)),
        orders::updated_at.eq(diesel::dsl::now),
        orders::version.eq(expected_version + 1),
    ))
    .execute(conn)?;
    Ok(updated == 1)
}

fn hydrate(
    conn: &mut PgConnection,
    row: Option<OrderRow>,
) -> Result<Option<StoredOrder>, DomainError> {
    let Some(row) = row else {
        return Ok(None);
    };

    let items = order_items::table
        .filter(order_items::order_id.eq(row.id))
        .select(OrderItemRow::as_select())
        .load(conn)?;

    Ok(Some(StoredOrder {
        version: row.version,
        order: Order {
            id: row.id,
            customer_id: row.customer_id,
            restaurant_id: row.restaurant_id,
            tracking_id: row.tracking_id,
            delivery_address: StreetAddress {
                street: row.street,
                postal_code: row.postal_code,
                city: row.city,
            },
            price: Money::new(row.price),
            items: items
                .into_iter()
                .map(|item| OrderItem {
                    id: item.id,
                    product_id: item.product_id,
                    quantity: item.quantity,
                    price: Money::new(item.price),
                    sub_total: Money::new(item.sub_total),
                })
                .collect(),
            order_status: OrderStatus::parse(&row.order_status)?,
            failure_messages: split_failure_messages(row.failure_messages.as_deref()),
        },
    }))
}
