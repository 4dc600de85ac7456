use sqlx::PgConnection;
use tracing::{Instrument, instrument};

use crate::{
    dao::handle_database_error,
    model::{
        apperror::{ApplicationError, ErrorType},
        db::City,
    },
};

/**
 * SQL query to retrieve cities, optionally filtered by a LIKE pattern on the name.
 */
const QUERY_CITY_LIST: &str = "SELECT id, name, weather FROM city WHERE ($1::text IS NULL OR name LIKE $1) ORDER BY id";

/**
 * SQL query to find a city by its stored name.
 */
const QUERY_CITY_BY_NAME: &str = "SELECT id, name, weather FROM city WHERE name = $1";

/**
 * SQL query to find a city by its id.
 */
const QUERY_CITY_BY_ID: &str = "SELECT id, name, weather FROM city WHERE id = $1";

/**
 * SQL query to add a city. A concurrent insert of the same name resolves to the existing row.
 */
const ADD_CITY: &str = "INSERT INTO city (name) VALUES ($1) ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name RETURNING id, name, weather";

/**
 * SQL query to store the last known weather of a city.
 */
const UPDATE_CITY_WEATHER: &str = "UPDATE city SET weather = $1 WHERE id = $2 RETURNING id, name, weather";

/**
 * DAO for city-related database operations.
 */
pub struct CityDao {}

impl CityDao {
    /**
     * Creates a new instance of `CityDao`.
     */
    pub fn new() -> Self {
        CityDao {}
    }

    /**
     * Retrieves cities whose name matches the pattern, or all cities.
     *
     * # Arguments
     * `connection`: The database connection.
     * `name_pattern`: Optional LIKE pattern for the name.
     *
     * # Returns
     * A Result containing the cities ordered by id or an `ApplicationError`.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn get_city_list(&self, connection: &mut PgConnection, name_pattern: Option<String>) -> Result<Vec<City>, ApplicationError> {
        let span = tracing::Span::current();
        sqlx::query_as::<_, City>(QUERY_CITY_LIST)
            .bind(name_pattern)
            .fetch_all(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to get city list: {err}")))
    }

    /**
     * Finds a city by its stored (capitalized) name.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn find_city_by_name(&self, connection: &mut PgConnection, name: &str) -> Result<Option<City>, ApplicationError> {
        let span = tracing::Span::current();
        sqlx::query_as::<_, City>(QUERY_CITY_BY_NAME)
            .bind(name)
            .fetch_optional(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to find city: {err}")))
    }

    #[instrument(skip(self, connection), fields(result))]
    pub async fn find_city_by_id(&self, connection: &mut PgConnection, city_id: i64) -> Result<Option<City>, ApplicationError> {
        let span = tracing::Span::current();
        sqlx::query_as::<_, City>(QUERY_CITY_BY_ID)
            .bind(city_id)
            .fetch_optional(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to find city: {err}")))
    }

    /**
     * Adds a city, or returns the existing row if the name is already taken.
     *
     * # Arguments
     * `transaction`: The database transaction to execute the query within.
     * `name`: The capitalized city name.
     *
     * # Returns
     * The stored city.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn add_city(&self, transaction: &mut PgConnection, name: &str) -> Result<City, ApplicationError> {
        let span = tracing::Span::current();
        sqlx::query_as::<_, City>(ADD_CITY)
            .bind(name)
            .fetch_one(transaction)
            .instrument(span)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))
    }

    /**
     * Stores the weather reading of a city.
     *
     * # Returns
     * The updated city or a `NotFound` error if no city has the id.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn update_city_weather(&self, transaction: &mut PgConnection, city_id: i64, weather: Option<f64>) -> Result<City, ApplicationError> {
        let span = tracing::Span::current();
        let city = sqlx::query_as::<_, City>(UPDATE_CITY_WEATHER)
            .bind(weather)
            .bind(city_id)
            .fetch_optional(transaction)
            .instrument(span)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))?;
        city.ok_or_else(|| {
            tracing::debug!("City with ID {} not found for weather update", city_id);
            ApplicationError::new(ErrorType::NotFound, "City not found".to_string())
        })
    }
}

#[cfg(feature = "integration-test")]
#[cfg(test)]
mod integration_test {
    use super::*;
    use sqlx::PgPool;

    #[sqlx::test(migrations = "./sqlx-postgresql-migration/migrations")]
    async fn test_add_city_twice_returns_same_row(pool: PgPool) {
        let city_dao = CityDao::new();
        let mut transaction = pool.begin().await.unwrap();
        let first = city_dao.add_city(&mut transaction, "Moscow").await.unwrap();
        let second = city_dao.add_city(&mut transaction, "Moscow").await.unwrap();
        transaction.commit().await.unwrap();
        assert_eq!(first.id, second.id);
        let mut connection = pool.acquire().await.unwrap();
        let cities = city_dao.get_city_list(&mut connection, None).await.unwrap();
        assert_eq!(cities.len(), 1);
    }

    #[sqlx::test(migrations = "./sqlx-postgresql-migration/migrations")]
    async fn test_city_list_prefix(pool: PgPool) {
        let city_dao = CityDao::new();
        let mut transaction = pool.begin().await.unwrap();
        city_dao.add_city(&mut transaction, "Moscow").await.unwrap();
        city_dao.add_city(&mut transaction, "Montreal").await.unwrap();
        city_dao.add_city(&mut transaction, "Paris").await.unwrap();
        transaction.commit().await.unwrap();
        let mut connection = pool.acquire().await.unwrap();
        let cities = city_dao.get_city_list(&mut connection, Some("Mo%".to_string())).await.unwrap();
        assert_eq!(cities.iter().map(|city| city.name.as_str()).collect::<Vec<_>>(), vec!["Moscow", "Montreal"]);
        let found = city_dao.find_city_by_name(&mut connection, "Paris").await.unwrap();
        assert!(found.is_some());
    }

    #[sqlx::test(migrations = "./sqlx-postgresql-migration/migrations")]
    async fn test_update_city_weather(pool: PgPool) {
        let city_dao = CityDao::new();
        let mut transaction = pool.begin().await.unwrap();
        let city = city_dao.add_city(&mut transaction, "Oslo").await.unwrap();
        let updated = city_dao.update_city_weather(&mut transaction, city.id, Some(4.5)).await.unwrap();
        assert_eq!(updated.weather, Some(4.5));
        let missing = city_dao.update_city_weather(&mut transaction, city.id + 100, Some(1.0)).await.unwrap_err();
        assert_eq!(missing.error_type, ErrorType::NotFound);
        transaction.rollback().await.unwrap();
    }
}
