use sqlx::{Pool, Postgres};

use crate::{
    dao::users::UserDao,
    model::{
        apperror::{ApplicationError, ErrorType},
        models::{UserAddInputType, UserDetailType, UserListInputType},
    },
    service::{begin_transaction, finish_transaction, require_pool},
};

/**
 * Represents the service for managing users.
 */
pub struct UserService {
    user_dao: UserDao,
    connection_pool: Option<Pool<Postgres>>,
}

impl UserService {
    pub fn new(user_dao: UserDao, connection_pool: Option<Pool<Postgres>>) -> Self {
        UserService { user_dao, connection_pool }
    }

    /**
     * Retrieves users filtered by age.
     *
     * # Arguments
     * `filter_params`: Exclusive age bounds.
     *
     * # Returns
     * A Result containing the users or an `ApplicationError`.
     */
    pub async fn get_user_list(&self, filter_params: UserListInputType) -> Result<Vec<UserDetailType>, ApplicationError> {
        let connection_pool = require_pool(&self.connection_pool)?;
        let mut connection = connection_pool.acquire().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to acquire connection: {err}")))?;
        let users = self.user_dao.get_user_list(&mut connection, filter_params).await?;
        Ok(users.into_iter().map(UserDetailType::from).collect())
    }

    /**
     * Registers a new user.
     */
    pub async fn add_user(&self, user_add_input: UserAddInputType) -> Result<UserDetailType, ApplicationError> {
        let connection_pool = require_pool(&self.connection_pool)?;
        let mut transaction = begin_transaction(connection_pool).await?;
        let result = self.user_dao.add_user(&mut transaction, user_add_input).await;
        let user = finish_transaction(transaction, result).await?;
        Ok(UserDetailType::from(user))
    }
}
