use actix_web::{HttpResponse, ResponseError, http::StatusCode, web};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::{CityDetailType, PicnicAddOutputType, PicnicDetailType, PicnicRegistrationOutputType, UserAddInputType, UserDetailType},
};

/***************** City models *********************/

/**
 * Query parameters for listing cities.
 */
#[derive(Debug, Deserialize)]
pub struct CityListQuery {
    /**
     * Start of the city name.
     */
    pub q: Option<String>,
}

/**
 * Query parameters for creating a city.
 */
#[derive(Debug, Deserialize)]
pub struct CityAddQuery {
    /**
     * Name of the city.
     */
    pub city: Option<String>,
}

/**
 * A city in API responses.
 */
#[derive(Debug, Serialize)]
pub struct CityResponse {
    id: i64,
    name: String,
    /**
     * Last known temperature in degrees Celsius.
     */
    weather: Option<f64>,
}

impl From<CityDetailType> for CityResponse {
    fn from(city: CityDetailType) -> Self {
        CityResponse { id: city.id, name: city.name, weather: city.weather }
    }
}

/***************** User models *********************/

/**
 * Query parameters for listing users. Both bounds are exclusive.
 */
#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub age_min: Option<i32>,
    pub age_max: Option<i32>,
}

/**
 * Request body for registering a user.
 */
#[derive(Debug, Deserialize)]
pub struct UserAddRequest {
    pub name: String,
    pub surname: String,
    pub age: i32,
}

impl From<UserAddRequest> for UserAddInputType {
    fn from(request: UserAddRequest) -> Self {
        UserAddInputType { name: request.name, surname: request.surname, age: request.age }
    }
}

/**
 * A user in API responses.
 */
#[derive(Debug, Serialize)]
pub struct UserResponse {
    id: i64,
    name: String,
    surname: String,
    age: i32,
}

impl From<UserDetailType> for UserResponse {
    fn from(user: UserDetailType) -> Self {
        UserResponse { id: user.id, name: user.name, surname: user.surname, age: user.age }
    }
}

/***************** Picnic models *********************/

fn default_past() -> bool {
    true
}

/**
 * Formats accepted for datetimes without an offset. They are read as UTC.
 */
const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/**
 * Parses a query datetime. RFC 3339 is tried first, then a datetime without offset taken as UTC.
 *
 * # Arguments
 * `value`: The raw query value.
 *
 * # Returns
 * The parsed time or a message describing why it could not be parsed.
 */
pub fn parse_datetime(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(datetime.with_timezone(&Utc));
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|datetime| datetime.and_utc())
        .ok_or_else(|| format!("Invalid datetime {value}"))
}

fn deserialize_optional_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    value.map(|value| parse_datetime(&value).map_err(serde::de::Error::custom)).transpose()
}

/**
 * Query parameters for listing picnics.
 */
#[derive(Debug, Deserialize)]
pub struct PicnicListQuery {
    /**
     * Only picnics at exactly this time.
     */
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub datetime: Option<DateTime<Utc>>,
    /**
     * Whether picnics in the past are included. Defaults to true.
     */
    #[serde(default = "default_past")]
    pub past: bool,
}

/**
 * Query parameters for adding a picnic.
 */
#[derive(Debug, Deserialize)]
pub struct PicnicAddQuery {
    pub city_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub datetime: Option<DateTime<Utc>>,
}

/**
 * Query parameters for registering a user to a picnic.
 */
#[derive(Debug, Deserialize)]
pub struct PicnicRegisterQuery {
    pub picnic_id: Option<i64>,
    pub user_id: Option<i64>,
}

/**
 * A picnic with the ids of the registered users.
 */
#[derive(Debug, Serialize)]
pub struct PicnicResponse {
    id: i64,
    city: Option<String>,
    time: DateTime<Utc>,
    users: Vec<i64>,
}

impl From<PicnicDetailType> for PicnicResponse {
    fn from(picnic: PicnicDetailType) -> Self {
        PicnicResponse { id: picnic.id, city: picnic.city, time: picnic.time, users: picnic.users }
    }
}

/**
 * A newly added picnic.
 */
#[derive(Debug, Serialize)]
pub struct PicnicAddResponse {
    id: i64,
    city: Option<String>,
    time: DateTime<Utc>,
}

impl From<PicnicAddOutputType> for PicnicAddResponse {
    fn from(picnic: PicnicAddOutputType) -> Self {
        PicnicAddResponse { id: picnic.id, city: picnic.city, time: picnic.time }
    }
}

#[derive(Debug, Serialize)]
pub struct PicnicRegisterResponse {
    id: i64,
}

impl From<PicnicRegistrationOutputType> for PicnicRegisterResponse {
    fn from(registration: PicnicRegistrationOutputType) -> Self {
        PicnicRegisterResponse { id: registration.id }
    }
}

/***************** Error models *********************/

/**
 * Custom error response for the application.
 */
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /**
     * The error code associated with the error type.
     */
    pub code: u16,
    /**
     * A human-readable message describing the error.
     */
    pub message: String,
}

impl ResponseError for ApplicationError {
    fn status_code(&self) -> StatusCode {
        get_statuscode(&self.error_type)
    }

    /**
     * Generates an error response for the application error.
     */
    fn error_response(&self) -> HttpResponse {
        let error_response = ErrorResponse { code: get_error_code(&self.error_type), message: self.message.clone() };
        HttpResponse::build(get_statuscode(&self.error_type)).json(&error_response)
    }
}

/**
 * Query extractor configuration rendering parse failures as validation errors.
 */
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _| ApplicationError::new(ErrorType::Validation, err.to_string()).into())
}

/**
 * JSON extractor configuration rendering parse failures as validation errors.
 */
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _| ApplicationError::new(ErrorType::Validation, err.to_string()).into())
}

/**
 * Path extractor configuration rendering parse failures as validation errors.
 */
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _| ApplicationError::new(ErrorType::Validation, err.to_string()).into())
}

/**
* Maps application errors to HTTP status codes.
*
* # Arguments
* `application_error`: The type of error that occurred.
*
* # Returns
* The corresponding HTTP status code.
*/
fn get_statuscode(application_error: &ErrorType) -> StatusCode {
    match application_error {
        ErrorType::Validation | ErrorType::UnknownCity => StatusCode::BAD_REQUEST,
        ErrorType::NotFound => StatusCode::NOT_FOUND,
        ErrorType::ConstraintViolation => StatusCode::CONFLICT,
        ErrorType::WeatherProvider => StatusCode::BAD_GATEWAY,
        ErrorType::Initialization | ErrorType::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/**
 * Maps application errors to error codes.
 *
 * # Arguments
 * `application_error`: The type of error that occurred.
 *
 * # Returns
 * The corresponding error code.
 */
fn get_error_code(application_error: &ErrorType) -> u16 {
    match application_error {
        ErrorType::Initialization => 1001,
        ErrorType::Validation => 1002,
        ErrorType::DatabaseError => 1003,
        ErrorType::NotFound => 1004,
        ErrorType::ConstraintViolation => 1005,
        ErrorType::UnknownCity => 1006,
        ErrorType::WeatherProvider => 1007,
    }
}
