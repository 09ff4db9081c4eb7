//! Keeps the Order service's customer replica in sync with the customer
//! topic. Upserts are idempotent, so replays converge.

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::infrastructure::customer_repo;
use crate::infrastructure::models::CustomerRow;
use crate::messaging::messages::CustomerModel;

pub struct CustomerEventHandler {
    pool: DbPool,
}

impl CustomerEventHandler {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn handle(&self, customer: &CustomerModel) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        customer_repo::upsert(
            &mut conn,
            &CustomerRow {
                id: customer.id,
                username: customer.username.clone(),
                first_name: customer.first_name.clone(),
                last_name: customer.last_name.clone(),
            },
        )?;
        log::debug!("customer {} replicated", customer.id);
        Ok(())
    }
}
