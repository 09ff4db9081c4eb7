//! The Order service's local customer replica.

use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::schema::customers;

use super::models::CustomerRow;

pub fn find(conn: &mut PgConnection, id: Uuid) -> Result<Option<CustomerRow>, DomainError> {
    Ok(customers::table
        .filter(customers::id.eq(id))
        .select(CustomerRow::as_select())
        .first(conn)
        .optional()?)
}

/// Idempotent upsert: replays of the customer topic converge on the latest
/// values.
pub fn upsert(conn: &mut PgConnection, customer: &CustomerRow) -> Result<(), DomainError> {
    diesel::insert_into(customers::table)
        .values(customer)
        .on_conflict(customers::id)
        .do_update()
        .set((
            customers::username.eq(&customer.username),
            customers::first_name.eq(&customer.first_name),
            customers::last_name.eq(&customer.last_name),
        ))
        .execute(conn)?;
    Ok(())
}
