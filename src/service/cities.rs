use sqlx::{Pool, Postgres};

use crate::{
    dao::cities::CityDao,
    model::{
        apperror::{ApplicationError, ErrorType},
        models::{CityAddInputType, CityDetailType, CityListInputType},
    },
    service::{begin_transaction, finish_transaction, require_pool, weather::WeatherClient},
};

/**
 * Represents the service for managing cities.
 */
pub struct CityService {
    /**
     * The DAO for city operations.
     */
    city_dao: CityDao,
    /**
     * Client used to verify cities and read their weather.
     */
    weather_client: WeatherClient,
    /**
     * Optional connection pool for database operations. Optional for test purposes until we have a better way to mock the database.
     */
    connection_pool: Option<Pool<Postgres>>,
}

impl CityService {
    /**
     * Creates a new instance of `CityService`.
     *
     * # Arguments
     * `city_dao`: The DAO for city operations.
     * `weather_client`: The weather provider client.
     * `connection_pool`: Optional connection pool for database operations.
     */
    pub fn new(city_dao: CityDao, weather_client: WeatherClient, connection_pool: Option<Pool<Postgres>>) -> Self {
        CityService { city_dao, weather_client, connection_pool }
    }

    /**
     * Retrieves cities, optionally filtered by name prefix.
     */
    pub async fn get_city_list(&self, city_list_input: CityListInputType) -> Result<Vec<CityDetailType>, ApplicationError> {
        let connection_pool = require_pool(&self.connection_pool)?;
        let mut connection = connection_pool.acquire().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to acquire connection: {err}")))?;
        let cities = self.city_dao.get_city_list(&mut connection, city_list_input.like_pattern()).await?;
        Ok(cities.into_iter().map(CityDetailType::from).collect())
    }

    /**
     * Adds a city after checking that the weather provider knows it. An already stored city is returned as is.
     *
     * # Arguments
     * `city_add_input`: The requested city name.
     *
     * # Returns
     * The stored city, or an `UnknownCity` error if the provider does not know the name.
     */
    pub async fn add_city(&self, city_add_input: CityAddInputType) -> Result<CityDetailType, ApplicationError> {
        if !self.weather_client.check_existing(&city_add_input.name).await? {
            tracing::debug!("City {} not known by weather provider", city_add_input.name);
            return Err(ApplicationError::new(ErrorType::UnknownCity, "Parameter city must be an existing city".to_string()));
        }
        let connection_pool = require_pool(&self.connection_pool)?;
        let stored_name = city_add_input.stored_name();
        let mut transaction = begin_transaction(connection_pool).await?;
        let result = match self.city_dao.find_city_by_name(&mut transaction, &stored_name).await {
            Ok(Some(city)) => Ok(city),
            Ok(None) => self.city_dao.add_city(&mut transaction, &stored_name).await,
            Err(err) => Err(err),
        };
        let city = finish_transaction(transaction, result).await?;
        Ok(CityDetailType::from(city))
    }

    /**
     * Reads the current weather for a city from the provider and stores it. A provider that cannot
     * be reached clears the stored reading.
     *
     * # Arguments
     * `city_id`: Id of the city.
     *
     * # Returns
     * The updated city.
     */
    pub async fn refresh_city_weather(&self, city_id: i64) -> Result<CityDetailType, ApplicationError> {
        let connection_pool = require_pool(&self.connection_pool)?;
        let city = {
            let mut connection = connection_pool.acquire().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to acquire connection: {err}")))?;
            self.city_dao.find_city_by_id(&mut connection, city_id).await?
        };
        let Some(city) = city else {
            return Err(ApplicationError::new(ErrorType::NotFound, "City not found".to_string()));
        };
        let weather = self.weather_client.get_weather(&city.name).await?;
        let mut transaction = begin_transaction(connection_pool).await?;
        let result = self.city_dao.update_city_weather(&mut transaction, city.id, weather).await;
        let city = finish_transaction(transaction, result).await?;
        Ok(CityDetailType::from(city))
    }
}

#[cfg(test)]
mod test {
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn service(mock_server: &MockServer) -> CityService {
        CityService::new(CityDao::new(), WeatherClient::new(mock_server.uri(), "test_key".to_string()), None)
    }

    #[actix_web::test]
    async fn test_add_unknown_city_is_rejected() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET")).and(query_param("q", "Atlantis")).respond_with(ResponseTemplate::new(404)).mount(&mock_server).await;

        let input = CityAddInputType::validate(Some("Atlantis".to_string())).unwrap();
        let err = service(&mock_server).add_city(input).await.unwrap_err();
        assert_eq!(err.error_type, ErrorType::UnknownCity);
    }

    #[actix_web::test]
    async fn test_add_city_provider_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(503)).mount(&mock_server).await;

        let input = CityAddInputType::validate(Some("Moscow".to_string())).unwrap();
        let err = service(&mock_server).add_city(input).await.unwrap_err();
        assert_eq!(err.error_type, ErrorType::WeatherProvider);
    }

    #[actix_web::test]
    async fn test_add_known_city_requires_database() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "main": { "temp": 10.0 } })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let input = CityAddInputType::validate(Some("Moscow".to_string())).unwrap();
        let err = service(&mock_server).add_city(input).await.unwrap_err();
        assert_eq!(err.error_type, ErrorType::DatabaseError);
    }
}
