use chrono::{DateTime, Utc};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    db::{City, Picnic, PicnicRegistration, User},
};

/***************** City types *********************/

/**
 * Filter for listing cities.
 */
#[derive(Debug, Clone, Default)]
pub struct CityListInputType {
    /**
     * Optional start of the city name. Matched after capitalization.
     */
    pub name_prefix: Option<String>,
}

impl CityListInputType {
    pub fn new(name_prefix: Option<String>) -> Self {
        CityListInputType { name_prefix }
    }

    /**
     * Builds the LIKE pattern for the name prefix. Wildcards in the prefix are
     * escaped so they match literally.
     *
     * # Returns
     * `None` when all cities should be returned.
     */
    pub fn like_pattern(&self) -> Option<String> {
        self.name_prefix.as_deref().map(|prefix| format!("{}%", escape_like(&capitalize_name(prefix))))
    }
}

/**
 * Input for creating a city.
 */
#[derive(Debug, Clone)]
pub struct CityAddInputType {
    /**
     * The name as given by the caller.
     */
    pub name: String,
}

impl CityAddInputType {
    /**
     * Validates the requested city name.
     *
     * # Arguments
     * `name`: The `city` query parameter, if present.
     *
     * # Returns
     * The input type or a validation error when the name is missing or blank.
     */
    pub fn validate(name: Option<String>) -> Result<Self, ApplicationError> {
        match name {
            Some(name) if !name.trim().is_empty() => Ok(CityAddInputType { name: name.trim().to_string() }),
            _ => Err(ApplicationError::new(ErrorType::Validation, "Parameter city must be given".to_string())),
        }
    }

    /**
     * The name in the form it is stored.
     */
    pub fn stored_name(&self) -> String {
        capitalize_name(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CityDetailType {
    pub id: i64,
    pub name: String,
    pub weather: Option<f64>,
}

impl From<City> for CityDetailType {
    fn from(city: City) -> Self {
        CityDetailType { id: city.id, name: city.name, weather: city.weather }
    }
}

/***************** User types *********************/

/**
 * Age filter for listing users. Both bounds are exclusive.
 */
#[derive(Debug, Clone, Default)]
pub struct UserListInputType {
    pub age_min: Option<i32>,
    pub age_max: Option<i32>,
}

impl UserListInputType {
    pub fn new(age_min: Option<i32>, age_max: Option<i32>) -> Self {
        UserListInputType { age_min, age_max }
    }
}

/**
 * Input for registering a user.
 */
#[derive(Debug, Clone)]
pub struct UserAddInputType {
    pub name: String,
    pub surname: String,
    pub age: i32,
}

impl UserAddInputType {
    /**
     * Validates the user registration.
     *
     * # Returns
     * The trimmed input or a validation error.
     */
    pub fn validate(self) -> Result<Self, ApplicationError> {
        let name = self.name.trim().to_string();
        let surname = self.surname.trim().to_string();
        if name.is_empty() {
            return Err(ApplicationError::new(ErrorType::Validation, "Name must be given".to_string()));
        }
        if surname.is_empty() {
            return Err(ApplicationError::new(ErrorType::Validation, "Surname must be given".to_string()));
        }
        if self.age < 0 {
            return Err(ApplicationError::new(ErrorType::Validation, "Age cannot be negative".to_string()));
        }
        Ok(UserAddInputType { name, surname, age: self.age })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserDetailType {
    pub id: i64,
    pub name: String,
    pub surname: String,
    pub age: i32,
}

impl From<User> for UserDetailType {
    fn from(user: User) -> Self {
        UserDetailType { id: user.id, name: user.name, surname: user.surname, age: user.age }
    }
}

/***************** Picnic types *********************/

/**
 * Filter for listing picnics.
 */
#[derive(Debug, Clone)]
pub struct PicnicListInputType {
    /**
     * Only picnics at exactly this time.
     */
    pub time: Option<DateTime<Utc>>,
    /**
     * Whether picnics that already started are included.
     */
    pub include_past: bool,
}

impl PicnicListInputType {
    pub fn new(time: Option<DateTime<Utc>>, include_past: bool) -> Self {
        PicnicListInputType { time, include_past }
    }
}

/**
 * Input for adding a picnic.
 */
#[derive(Debug, Clone)]
pub struct PicnicAddInputType {
    pub city_id: i64,
    pub time: DateTime<Utc>,
}

impl PicnicAddInputType {
    /**
     * Validates that both the city and the time are given.
     */
    pub fn validate(city_id: Option<i64>, time: Option<DateTime<Utc>>) -> Result<Self, ApplicationError> {
        let city_id = city_id.ok_or_else(|| ApplicationError::new(ErrorType::Validation, "Parameter city_id must be given".to_string()))?;
        let time = time.ok_or_else(|| ApplicationError::new(ErrorType::Validation, "Parameter datetime must be given".to_string()))?;
        Ok(PicnicAddInputType { city_id, time })
    }
}

/**
 * Input for registering a user to a picnic.
 */
#[derive(Debug, Clone)]
pub struct PicnicRegistrationAddInputType {
    pub picnic_id: i64,
    pub user_id: i64,
}

impl PicnicRegistrationAddInputType {
    pub fn validate(picnic_id: Option<i64>, user_id: Option<i64>) -> Result<Self, ApplicationError> {
        let picnic_id = picnic_id.ok_or_else(|| ApplicationError::new(ErrorType::Validation, "Parameter picnic_id must be given".to_string()))?;
        let user_id = user_id.ok_or_else(|| ApplicationError::new(ErrorType::Validation, "Parameter user_id must be given".to_string()))?;
        Ok(PicnicRegistrationAddInputType { picnic_id, user_id })
    }
}

/**
 * A picnic with its attendees.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct PicnicDetailType {
    pub id: i64,
    pub city: Option<String>,
    pub time: DateTime<Utc>,
    pub users: Vec<i64>,
}

/**
 * A newly added picnic.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct PicnicAddOutputType {
    pub id: i64,
    pub city: Option<String>,
    pub time: DateTime<Utc>,
}

impl From<Picnic> for PicnicAddOutputType {
    fn from(picnic: Picnic) -> Self {
        PicnicAddOutputType { id: picnic.id, city: picnic.city_name, time: picnic.time }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PicnicRegistrationOutputType {
    pub id: i64,
}

impl From<PicnicRegistration> for PicnicRegistrationOutputType {
    fn from(registration: PicnicRegistration) -> Self {
        PicnicRegistrationOutputType { id: registration.id }
    }
}

/***************** Helpers *********************/

/**
 * Upper cases the first character and lower cases the rest, so "nEW york" becomes "New york".
 */
pub fn capitalize_name(name: &str) -> String {
    let mut chars = name.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/**
 * Escapes LIKE wildcards using backslash as escape character.
 */
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
