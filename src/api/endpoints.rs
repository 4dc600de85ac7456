use actix_web::{
    get, post, web::{self, Path}, HttpRequest, HttpResponse
};
use tracing::{instrument, Instrument};

use crate::{
    api::{
        rest::{
            CityAddQuery, CityListQuery, CityResponse, PicnicAddQuery, PicnicAddResponse, PicnicListQuery, PicnicRegisterQuery, PicnicRegisterResponse, PicnicResponse, UserAddRequest, UserListQuery,
            UserResponse,
        },
        state::AppState,
    },
    model::{
        apperror::ApplicationError,
        models::{CityAddInputType, CityListInputType, PicnicAddInputType, PicnicListInputType, PicnicRegistrationAddInputType, UserAddInputType, UserListInputType},
    },
};

/**
 * Endpoint to retrieve a list of cities, optionally by name prefix.
 */
#[instrument(skip(http_request, app_state), fields(service = "listCities", trace_id = get_trace_id(&http_request), result))]
#[get("/cities")]
pub async fn cities_list(http_request: HttpRequest, query: web::Query<CityListQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let city_list_input = CityListInputType::new(query.into_inner().q);
    let cities = app_state.city_service.get_city_list(city_list_input).instrument(span).await?;
    Ok(HttpResponse::Ok().json(cities.into_iter().map(CityResponse::from).collect::<Vec<_>>()))
}

/**
 * Endpoint to create a city known by the weather provider.
 */
#[instrument(skip(http_request, app_state), fields(service = "addCity", trace_id = get_trace_id(&http_request), result))]
#[post("/cities")]
pub async fn city_add(http_request: HttpRequest, query: web::Query<CityAddQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let city_add_input = CityAddInputType::validate(query.into_inner().city)?;
    let city = app_state.city_service.add_city(city_add_input).instrument(span).await?;
    Ok(HttpResponse::Ok().json(CityResponse::from(city)))
}

/**
 * Endpoint to refresh the stored weather of a city.
 */
#[instrument(skip(http_request, app_state), fields(service = "refreshCityWeather", trace_id = get_trace_id(&http_request), result))]
#[post("/cities/{cityId}/weather")]
pub async fn city_weather_refresh(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let city_id = path.into_inner();
    let city = app_state.city_service.refresh_city_weather(city_id).instrument(span).await?;
    Ok(HttpResponse::Ok().json(CityResponse::from(city)))
}

/**
 * Endpoint to retrieve a list of users by age.
 */
#[instrument(skip(http_request, app_state), fields(service = "listUsers", trace_id = get_trace_id(&http_request), result))]
#[get("/users")]
pub async fn users_list(http_request: HttpRequest, query: web::Query<UserListQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let query = query.into_inner();
    let users = app_state.user_service.get_user_list(UserListInputType::new(query.age_min, query.age_max)).instrument(span).await?;
    Ok(HttpResponse::Ok().json(users.into_iter().map(UserResponse::from).collect::<Vec<_>>()))
}

/**
 * Endpoint to register a user.
 */
#[instrument(skip(http_request, app_state), fields(service = "addUser", trace_id = get_trace_id(&http_request), result))]
#[post("/users")]
pub async fn user_add(http_request: HttpRequest, request_body: web::Json<UserAddRequest>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let user_add_input = UserAddInputType::from(request_body.into_inner()).validate()?;
    let user = app_state.user_service.add_user(user_add_input).instrument(span).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/**
 * Endpoint to retrieve picnics with their registered users.
 */
#[instrument(skip(http_request, app_state), fields(service = "listPicnics", trace_id = get_trace_id(&http_request), result))]
#[get("/picnics/")]
pub async fn picnics_list(http_request: HttpRequest, query: web::Query<PicnicListQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let query = query.into_inner();
    let picnics = app_state.picnic_service.get_picnic_list(PicnicListInputType::new(query.datetime, query.past)).instrument(span).await?;
    Ok(HttpResponse::Ok().json(picnics.into_iter().map(PicnicResponse::from).collect::<Vec<_>>()))
}

/**
 * Endpoint to add a picnic.
 */
#[instrument(skip(http_request, app_state), fields(service = "addPicnic", trace_id = get_trace_id(&http_request), result))]
#[post("/picnics/")]
pub async fn picnic_add(http_request: HttpRequest, query: web::Query<PicnicAddQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let query = query.into_inner();
    let picnic_add_input = PicnicAddInputType::validate(query.city_id, query.datetime)?;
    let picnic = app_state.picnic_service.add_picnic(picnic_add_input).instrument(span).await?;
    Ok(HttpResponse::Ok().json(PicnicAddResponse::from(picnic)))
}

/**
 * Endpoint to register a user to a picnic.
 */
#[instrument(skip(http_request, app_state), fields(service = "registerToPicnic", trace_id = get_trace_id(&http_request), result))]
#[post("/picnics/register")]
pub async fn picnic_register(http_request: HttpRequest, query: web::Query<PicnicRegisterQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let query = query.into_inner();
    let registration_input = PicnicRegistrationAddInputType::validate(query.picnic_id, query.user_id)?;
    let registration = app_state.picnic_service.add_picnic_registration(registration_input).instrument(span).await?;
    Ok(HttpResponse::Ok().json(PicnicRegisterResponse::from(registration)))
}

/**
 * Retrieves the trace ID from the HTTP request headers.
 * If the trace ID is not present, a new UUID is generated.
 */
fn get_trace_id(http_request: &HttpRequest) -> String {
    http_request.headers().get("X-Trace-ID")
        .and_then(|v| v.to_str().ok().map(std::string::ToString::to_string))
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

#[cfg(test)]
mod test {
    use actix_web::{App, http::StatusCode, test, test::TestRequest};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::{
        api::rest::{json_config, query_config},
        dao::{cities::CityDao, picnics::PicnicDao, users::UserDao},
        service::{cities::CityService, picnics::PicnicService, users::UserService, weather::WeatherClient},
    };

    fn app_state(weather_url: String) -> web::Data<AppState> {
        web::Data::new(AppState::new(
            CityService::new(CityDao::new(), WeatherClient::new(weather_url, "test_key".to_string()), None),
            UserService::new(UserDao::new(), None),
            PicnicService::new(PicnicDao::new(), None),
        ))
    }

    #[actix_web::test]
    async fn test_get_trace_id_exists() {
        let request = TestRequest::default()
            .insert_header(("X-Trace-ID", "test"))
            .to_http_request();
        let trace_id = get_trace_id(&request);
        assert_eq!(trace_id, "test");
    }

    #[actix_web::test]
    async fn test_get_trace_id_not_exists() {
        let request = TestRequest::default()
            .to_http_request();
        let trace_id = get_trace_id(&request);
        assert!(!trace_id.is_empty());
    }

    #[actix_web::test]
    async fn test_city_add_without_name() {
        let app = test::init_service(App::new().app_data(app_state("http://127.0.0.1:1".to_string())).service(city_add)).await;
        let response = test::call_service(&app, TestRequest::post().uri("/cities").to_request()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["message"], "Parameter city must be given");
    }

    #[actix_web::test]
    async fn test_city_add_unknown_city() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(404)).mount(&mock_server).await;
        let app = test::init_service(App::new().app_data(app_state(mock_server.uri())).service(city_add)).await;
        let response = test::call_service(&app, TestRequest::post().uri("/cities?city=Atlantis").to_request()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["code"], 1006);
    }

    #[actix_web::test]
    async fn test_user_add_invalid_age() {
        let app = test::init_service(App::new().app_data(app_state("http://127.0.0.1:1".to_string())).service(user_add)).await;
        let request = TestRequest::post().uri("/users").set_json(serde_json::json!({ "name": "Ivan", "surname": "Petrov", "age": -4 })).to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_picnic_add_missing_city() {
        let app = test::init_service(App::new().app_data(app_state("http://127.0.0.1:1".to_string())).service(picnic_add)).await;
        let response = test::call_service(&app, TestRequest::post().uri("/picnics/?datetime=2025-06-01T12:00:00Z").to_request()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["message"], "Parameter city_id must be given");
    }

    #[actix_web::test]
    async fn test_picnic_register_missing_user() {
        let app = test::init_service(App::new().app_data(app_state("http://127.0.0.1:1".to_string())).service(picnic_register)).await;
        let response = test::call_service(&app, TestRequest::post().uri("/picnics/register?picnic_id=1").to_request()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_picnics_list_without_database() {
        let app = test::init_service(App::new().app_data(app_state("http://127.0.0.1:1".to_string())).service(picnics_list)).await;
        let response = test::call_service(&app, TestRequest::get().uri("/picnics/?past=false").to_request()).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn test_users_list_invalid_age_is_json_error() {
        let app = test::init_service(App::new().app_data(app_state("http://127.0.0.1:1".to_string())).app_data(query_config()).app_data(json_config()).service(users_list)).await;
        let response = test::call_service(&app, TestRequest::get().uri("/users?age_min=abc").to_request()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["code"], 1002);
        assert!(body["message"].as_str().unwrap().starts_with("Query deserialize error"));
    }

    #[actix_web::test]
    async fn test_picnics_list_invalid_datetime_is_json_error() {
        let app = test::init_service(App::new().app_data(app_state("http://127.0.0.1:1".to_string())).app_data(query_config()).app_data(json_config()).service(picnics_list)).await;
        let response = test::call_service(&app, TestRequest::get().uri("/picnics/?datetime=tomorrow").to_request()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["code"], 1002);
    }

    #[actix_web::test]
    async fn test_picnic_add_accepts_datetime_without_offset() {
        let app = test::init_service(App::new().app_data(app_state("http://127.0.0.1:1".to_string())).app_data(query_config()).app_data(json_config()).service(picnic_add)).await;
        let response = test::call_service(&app, TestRequest::post().uri("/picnics/?datetime=2025-06-01T12:00:00").to_request()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["message"], "Parameter city_id must be given");
    }

    #[actix_web::test]
    async fn test_user_add_malformed_body_is_json_error() {
        let app = test::init_service(App::new().app_data(app_state("http://127.0.0.1:1".to_string())).app_data(query_config()).app_data(json_config()).service(user_add)).await;
        let request = TestRequest::post().uri("/users").set_json(serde_json::json!({ "name": "Ivan", "surname": "Petrov", "age": "old" })).to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["code"], 1002);
    }
}
