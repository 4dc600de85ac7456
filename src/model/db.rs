use chrono::{DateTime, Utc};

/**
 * City row.
 */
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct City {
    pub id: i64,
    pub name: String,
    pub weather: Option<f64>,
}

/**
 * User row. Users are immutable after registration.
 */
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub surname: String,
    pub age: i32,
}

/**
 * Picnic row as returned on insert, with the city name resolved.
 */
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Picnic {
    pub id: i64,
    pub city_name: Option<String>,
    pub time: DateTime<Utc>,
}

/**
 * One row of the picnic listing join. `user_id` is absent when the picnic has
 * no registrations and `city_name` when the city row is missing.
 */
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PicnicRow {
    pub picnic_id: i64,
    pub time: DateTime<Utc>,
    pub user_id: Option<i64>,
    pub city_name: Option<String>,
}

/**
 * Registration of one user to one picnic.
 */
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PicnicRegistration {
    pub id: i64,
    pub picnic_id: i64,
    pub user_id: i64,
}
