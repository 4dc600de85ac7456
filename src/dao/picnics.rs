use sqlx::PgConnection;
use tracing::{Instrument, instrument};

use crate::{
    dao::handle_database_error,
    model::{
        apperror::{ApplicationError, ErrorType},
        db::{Picnic, PicnicRegistration, PicnicRow},
        models::{PicnicAddInputType, PicnicListInputType, PicnicRegistrationAddInputType},
    },
};

/**
 * SQL query to retrieve picnics joined with their registrations and city. Rows are ordered by
 * picnic id so that rows of one picnic are contiguous.
 */
const QUERY_PICNIC_LIST: &str = "SELECT p.id AS picnic_id, p.time, r.user_id, c.name AS city_name
                                 FROM picnic p
                                 LEFT JOIN picnic_registration r ON r.picnic_id = p.id
                                 LEFT JOIN city c ON c.id = p.city_id
                                 WHERE ($1::timestamptz IS NULL OR p.time = $1) AND
                                 ($2::boolean OR p.time >= now())
                                 GROUP BY p.id, p.time, r.user_id, c.name
                                 ORDER BY p.id, r.user_id";

/**
 * SQL query to add a picnic and resolve the name of its city.
 */
const ADD_PICNIC: &str = "WITH inserted AS (INSERT INTO picnic (city_id, time) VALUES ($1, $2) RETURNING id, city_id, time)
                          SELECT i.id, c.name AS city_name, i.time FROM inserted i LEFT JOIN city c ON c.id = i.city_id";

/**
 * SQL query to register a user to a picnic.
 */
const ADD_PICNIC_REGISTRATION: &str = "INSERT INTO picnic_registration (picnic_id, user_id) VALUES ($1, $2) RETURNING id, picnic_id, user_id";

/**
 * DAO for picnic-related database operations.
 */
pub struct PicnicDao {}

impl PicnicDao {
    pub fn new() -> Self {
        PicnicDao {}
    }

    /**
     * Retrieves the flat picnic listing rows.
     *
     * # Arguments
     * `connection`: The database connection.
     * `filter_params`: Optional exact time and whether past picnics are included.
     *
     * # Returns
     * One row per picnic and registered user, ordered by picnic id.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn get_picnic_rows(&self, connection: &mut PgConnection, filter_params: PicnicListInputType) -> Result<Vec<PicnicRow>, ApplicationError> {
        let span = tracing::Span::current();
        sqlx::query_as::<_, PicnicRow>(QUERY_PICNIC_LIST)
            .bind(filter_params.time)
            .bind(filter_params.include_past)
            .fetch_all(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to get picnic list: {err}")))
    }

    /**
     * Adds a new picnic to the database.
     *
     * # Arguments
     * `transaction`: The database transaction to execute the query within.
     * `picnic_add_input`: City and time of the picnic.
     *
     * # Returns
     * The stored picnic with its city name.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn add_picnic(&self, transaction: &mut PgConnection, picnic_add_input: PicnicAddInputType) -> Result<Picnic, ApplicationError> {
        let span = tracing::Span::current();
        sqlx::query_as::<_, Picnic>(ADD_PICNIC)
            .bind(picnic_add_input.city_id)
            .bind(picnic_add_input.time)
            .fetch_one(transaction)
            .instrument(span)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))
    }

    /**
     * Registers a user to a picnic.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn add_picnic_registration(&self, transaction: &mut PgConnection, registration_input: PicnicRegistrationAddInputType) -> Result<PicnicRegistration, ApplicationError> {
        let span = tracing::Span::current();
        sqlx::query_as::<_, PicnicRegistration>(ADD_PICNIC_REGISTRATION)
            .bind(registration_input.picnic_id)
            .bind(registration_input.user_id)
            .fetch_one(transaction)
            .instrument(span)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))
    }
}

#[cfg(feature = "integration-test")]
#[cfg(test)]
mod integration_test {
    use super::*;
    use crate::{
        dao::{cities::CityDao, users::UserDao},
        model::models::UserAddInputType,
    };
    use chrono::{Duration, Utc};
    use sqlx::PgPool;

    #[sqlx::test(migrations = "./sqlx-postgresql-migration/migrations")]
    async fn test_picnic_rows_with_registrations(pool: PgPool) {
        let picnic_dao = PicnicDao::new();
        let mut transaction = pool.begin().await.unwrap();
        let city = CityDao::new().add_city(&mut transaction, "Paris").await.unwrap();
        let user = UserDao::new().add_user(&mut transaction, UserAddInputType { name: "Ivan".to_string(), surname: "Petrov".to_string(), age: 30 }).await.unwrap();
        let time = Utc::now() + Duration::days(1);
        let picnic = picnic_dao.add_picnic(&mut transaction, PicnicAddInputType { city_id: city.id, time }).await.unwrap();
        assert_eq!(picnic.city_name, Some("Paris".to_string()));
        let empty_picnic = picnic_dao.add_picnic(&mut transaction, PicnicAddInputType { city_id: city.id, time }).await.unwrap();
        picnic_dao.add_picnic_registration(&mut transaction, PicnicRegistrationAddInputType { picnic_id: picnic.id, user_id: user.id }).await.unwrap();
        transaction.commit().await.unwrap();

        let mut connection = pool.acquire().await.unwrap();
        let rows = picnic_dao.get_picnic_rows(&mut connection, PicnicListInputType::new(None, true)).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].picnic_id, picnic.id);
        assert_eq!(rows[0].user_id, Some(user.id));
        assert_eq!(rows[1].picnic_id, empty_picnic.id);
        assert_eq!(rows[1].user_id, None);
    }

    #[sqlx::test(migrations = "./sqlx-postgresql-migration/migrations")]
    async fn test_picnic_rows_exclude_past(pool: PgPool) {
        let picnic_dao = PicnicDao::new();
        let mut transaction = pool.begin().await.unwrap();
        let city = CityDao::new().add_city(&mut transaction, "Rome").await.unwrap();
        let past = picnic_dao.add_picnic(&mut transaction, PicnicAddInputType { city_id: city.id, time: Utc::now() - Duration::days(1) }).await.unwrap();
        let future = picnic_dao.add_picnic(&mut transaction, PicnicAddInputType { city_id: city.id, time: Utc::now() + Duration::days(1) }).await.unwrap();
        transaction.commit().await.unwrap();

        let mut connection = pool.acquire().await.unwrap();
        let all = picnic_dao.get_picnic_rows(&mut connection, PicnicListInputType::new(None, true)).await.unwrap();
        assert_eq!(all.len(), 2);
        let upcoming = picnic_dao.get_picnic_rows(&mut connection, PicnicListInputType::new(None, false)).await.unwrap();
        assert_eq!(upcoming.iter().map(|row| row.picnic_id).collect::<Vec<_>>(), vec![future.id]);
        let exact = picnic_dao.get_picnic_rows(&mut connection, PicnicListInputType::new(Some(past.time), true)).await.unwrap();
        assert_eq!(exact.iter().map(|row| row.picnic_id).collect::<Vec<_>>(), vec![past.id]);
    }

    #[sqlx::test(migrations = "./sqlx-postgresql-migration/migrations")]
    async fn test_add_picnic_unknown_city(pool: PgPool) {
        let picnic_dao = PicnicDao::new();
        let mut transaction = pool.begin().await.unwrap();
        let err = picnic_dao.add_picnic(&mut transaction, PicnicAddInputType { city_id: 404, time: Utc::now() }).await.unwrap_err();
        assert_eq!(err.error_type, ErrorType::ConstraintViolation);
    }
}
