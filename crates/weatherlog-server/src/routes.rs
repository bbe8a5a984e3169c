//! warp filters for `GET /{place}`.

use std::convert::Infallible;

use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};
use weatherlog_core::{INTERNAL_ERROR_MESSAGE, NO_DATA_MESSAGE};

use crate::service::{QueryOutcome, QueryService};

/// All routes, with request logging
pub fn routes(
    service: QueryService,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    latest_reading(service).with(warp::log::custom(log_request))
}

/// GET /{place}
pub fn latest_reading(
    service: QueryService,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::get()
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(with_service(service))
        .then(handle_latest)
}

fn with_service(
    service: QueryService,
) -> impl Filter<Extract = (QueryService,), Error = Infallible> + Clone {
    warp::any().map(move || service.clone())
}

async fn handle_latest(raw_place: String, service: QueryService) -> Response {
    let place = match urlencoding::decode(&raw_place) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw_place,
    };

    match service.handle(&place).await {
        QueryOutcome::Found(rendered) => warp::reply::json(&rendered).into_response(),
        QueryOutcome::NotFound => {
            warp::reply::with_status(NO_DATA_MESSAGE, StatusCode::NOT_FOUND).into_response()
        }
        QueryOutcome::InternalError => {
            warp::reply::with_status(INTERNAL_ERROR_MESSAGE, StatusCode::INTERNAL_SERVER_ERROR)
                .into_response()
        }
    }
}

fn log_request(info: warp::log::Info<'_>) {
    tracing::info!(
        "{} {} {} {:?}",
        info.method(),
        info.path(),
        info.status().as_u16(),
        info.elapsed()
    );
}
