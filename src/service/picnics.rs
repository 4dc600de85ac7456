use sqlx::{Pool, Postgres};

use crate::{
    dao::picnics::PicnicDao,
    model::{
        apperror::{ApplicationError, ErrorType},
        models::{PicnicAddInputType, PicnicAddOutputType, PicnicDetailType, PicnicListInputType, PicnicRegistrationAddInputType, PicnicRegistrationOutputType},
    },
    service::{aggregation::picnic_rows_to_list, begin_transaction, finish_transaction, require_pool},
};

/**
 * Represents the service for managing picnics and registrations.
 */
pub struct PicnicService {
    picnic_dao: PicnicDao,
    connection_pool: Option<Pool<Postgres>>,
}

impl PicnicService {
    pub fn new(picnic_dao: PicnicDao, connection_pool: Option<Pool<Postgres>>) -> Self {
        PicnicService { picnic_dao, connection_pool }
    }

    /**
     * Retrieves picnics with the ids of their registered users.
     *
     * # Arguments
     * `filter_params`: Optional exact time and whether past picnics are included.
     *
     * # Returns
     * One record per picnic ordered by picnic id.
     */
    pub async fn get_picnic_list(&self, filter_params: PicnicListInputType) -> Result<Vec<PicnicDetailType>, ApplicationError> {
        let connection_pool = require_pool(&self.connection_pool)?;
        let mut connection = connection_pool.acquire().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to acquire connection: {err}")))?;
        let rows = self.picnic_dao.get_picnic_rows(&mut connection, filter_params).await?;
        tracing::debug!("Aggregating {} picnic rows", rows.len());
        Ok(picnic_rows_to_list(&rows))
    }

    /**
     * Adds a picnic.
     */
    pub async fn add_picnic(&self, picnic_add_input: PicnicAddInputType) -> Result<PicnicAddOutputType, ApplicationError> {
        let connection_pool = require_pool(&self.connection_pool)?;
        let mut transaction = begin_transaction(connection_pool).await?;
        let result = self.picnic_dao.add_picnic(&mut transaction, picnic_add_input).await;
        let picnic = finish_transaction(transaction, result).await?;
        Ok(PicnicAddOutputType::from(picnic))
    }

    /**
     * Registers a user to a picnic.
     */
    pub async fn add_picnic_registration(&self, registration_input: PicnicRegistrationAddInputType) -> Result<PicnicRegistrationOutputType, ApplicationError> {
        let connection_pool = require_pool(&self.connection_pool)?;
        let mut transaction = begin_transaction(connection_pool).await?;
        let result = self.picnic_dao.add_picnic_registration(&mut transaction, registration_input).await;
        let registration = finish_transaction(transaction, result).await?;
        tracing::debug!("Registered user {} to picnic {}", registration.user_id, registration.picnic_id);
        Ok(PicnicRegistrationOutputType::from(registration))
    }
}
