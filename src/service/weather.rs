use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::model::apperror::{ApplicationError, ErrorType};

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
}

/**
 * Client for the current weather endpoint of the weather provider.
 */
#[derive(Clone)]
pub struct WeatherClient {
    /**
     * Shared HTTP client. Reused for every lookup.
     */
    http: Client,
    /**
     * Current weather endpoint.
     */
    base_url: String,
    /**
     * Provider API key.
     */
    api_key: String,
}

impl WeatherClient {
    /**
     * Creates a new instance of `WeatherClient`.
     *
     * # Arguments
     * `base_url`: The current weather endpoint.
     * `api_key`: The API key sent as `appid`.
     */
    pub fn new(base_url: String, api_key: String) -> Self {
        WeatherClient { http: Client::new(), base_url, api_key }
    }

    /**
     * Retrieves the current temperature in degrees Celsius.
     *
     * # Arguments
     * `city`: Name of the city.
     *
     * # Returns
     * The temperature, `None` if the provider could not be reached, or an
     * `ApplicationError` if the provider answered with a failure.
     */
    #[instrument(skip(self), fields(result))]
    pub async fn get_weather(&self, city: &str) -> Result<Option<f64>, ApplicationError> {
        let response = match self.send_request(city).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!("No response from weather provider for {}: {}", city, err);
                return Ok(None);
            }
        };
        let status = response.status();
        if !status.is_success() {
            return Err(ApplicationError::new(ErrorType::WeatherProvider, format!("Weather provider request failed with status {status}")));
        }
        let parsed: OwCurrentResponse = response
            .json()
            .await
            .map_err(|err| ApplicationError::new(ErrorType::WeatherProvider, format!("Failed to parse weather provider response: {err}")))?;
        Ok(Some(parsed.main.temp))
    }

    /**
     * Checks whether the weather provider knows the city.
     *
     * # Arguments
     * `city`: Name of the city.
     *
     * # Returns
     * `true` on 200, `false` on 404 and an `ApplicationError` for any other
     * outcome.
     */
    #[instrument(skip(self), fields(result))]
    pub async fn check_existing(&self, city: &str) -> Result<bool, ApplicationError> {
        let response = self
            .send_request(city)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::WeatherProvider, format!("Failed to send request to weather provider: {err}")))?;
        let status = response.status();
        match status.as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            _ => {
                tracing::warn!("Unexpected status {} from weather provider for {}", status, city);
                Err(ApplicationError::new(ErrorType::WeatherProvider, format!("Weather provider request failed with status {status}")))
            }
        }
    }

    async fn send_request(&self, city: &str) -> Result<reqwest::Response, reqwest::Error> {
        self.http
            .get(&self.base_url)
            .query(&[("units", "metric"), ("q", city), ("appid", self.api_key.as_str())])
            .send()
            .await
    }
}
