use sqlx::PgConnection;
use tracing::{Instrument, instrument};

use crate::{
    dao::handle_database_error,
    model::{
        apperror::{ApplicationError, ErrorType},
        db::User,
        models::{UserAddInputType, UserListInputType},
    },
};

/**
 * SQL query to retrieve users within an exclusive age range. Either bound may be null.
 */
const QUERY_USER_LIST: &str = "SELECT id, name, surname, age FROM users WHERE ($1::integer IS NULL OR age > $1) AND ($2::integer IS NULL OR age < $2) ORDER BY id";

/**
 * SQL query to add a user.
 */
const ADD_USER: &str = "INSERT INTO users (name, surname, age) VALUES ($1, $2, $3) RETURNING id, name, surname, age";

/**
 * DAO for user-related database operations.
 */
pub struct UserDao {}

impl UserDao {
    pub fn new() -> Self {
        UserDao {}
    }

    /**
     * Retrieves users filtered by age.
     *
     * # Arguments
     * `connection`: The database connection.
     * `filter_params`: Exclusive lower and upper age bounds.
     *
     * # Returns
     * A Result containing the users ordered by id or an `ApplicationError`.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn get_user_list(&self, connection: &mut PgConnection, filter_params: UserListInputType) -> Result<Vec<User>, ApplicationError> {
        let span = tracing::Span::current();
        sqlx::query_as::<_, User>(QUERY_USER_LIST)
            .bind(filter_params.age_min)
            .bind(filter_params.age_max)
            .fetch_all(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to get user list: {err}")))
    }

    /**
     * Adds a new user to the database.
     *
     * # Arguments
     * `transaction`: The database transaction to execute the query within.
     * `user_add_input`: The validated user.
     *
     * # Returns
     * The stored user including its id.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn add_user(&self, transaction: &mut PgConnection, user_add_input: UserAddInputType) -> Result<User, ApplicationError> {
        let span = tracing::Span::current();
        sqlx::query_as::<_, User>(ADD_USER)
            .bind(user_add_input.name)
            .bind(user_add_input.surname)
            .bind(user_add_input.age)
            .fetch_one(transaction)
            .instrument(span)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))
    }
}
