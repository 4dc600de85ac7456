use crate::service::{cities::CityService, picnics::PicnicService, users::UserService};

/**
* Represents the application state shared across the Actix web application.
*/
pub struct AppState {
    /**
     * The city service, including weather lookups.
     */
    pub city_service: CityService,
    /**
     * The user service.
     */
    pub user_service: UserService,
    /**
     * The picnic service for picnics and registrations.
     */
    pub picnic_service: PicnicService,
}

/**
 * Creates a new instance of `AppState`.
 *
 * # Arguments
 * `city_service`: The city service.
 * `user_service`: The user service.
 * `picnic_service`: The picnic service.
 */
impl AppState {
    pub fn new(city_service: CityService, user_service: UserService, picnic_service: PicnicService) -> Self {
        AppState { city_service, user_service, picnic_service }
    }
}
