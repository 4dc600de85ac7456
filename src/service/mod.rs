use sqlx::{Pool, Postgres, Transaction};

use crate::model::apperror::{ApplicationError, ErrorType};

pub mod aggregation;
pub mod cities;
pub mod picnics;
pub mod users;
pub mod weather;

/**
 * Returns the connection pool or an error if the service was created without one.
 */
fn require_pool(connection_pool: &Option<Pool<Postgres>>) -> Result<&Pool<Postgres>, ApplicationError> {
    connection_pool.as_ref().ok_or_else(|| ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()))
}

/**
 * Begins a transaction on the pool.
 */
async fn begin_transaction(connection_pool: &Pool<Postgres>) -> Result<Transaction<'static, Postgres>, ApplicationError> {
    connection_pool.begin().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to begin transaction: {err}")))
}

/**
 * Commits the transaction if the operation succeeded and rolls it back otherwise.
 *
 * # Arguments
 * `transaction`: The transaction the operation ran in.
 * `result`: The outcome of the operation.
 *
 * # Returns
 * The operation result, or a commit/rollback failure.
 */
async fn finish_transaction<T>(transaction: Transaction<'static, Postgres>, result: Result<T, ApplicationError>) -> Result<T, ApplicationError> {
    match result {
        Ok(value) => {
            transaction.commit().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to commit transaction: {err}")))?;
            Ok(value)
        }
        Err(err) => {
            transaction.rollback().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to rollback transaction: {err}")))?;
            Err(err)
        }
    }
}
