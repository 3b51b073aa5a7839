use actix_web::{error, HttpResponse};
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use derive_more::{Display, Error};
use log::error;
use crate::server::cache::error::ConnectionError;

#[derive(Debug, Display, Error)]
pub(crate) enum CustomError {
    #[display("cache unavailable")]
    CacheUnavailable,
    #[display("cache error")]
    CacheError,
    #[display("timeout occurred")]
    Timeout,
}

impl From<ConnectionError> for CustomError {
    fn from(e: ConnectionError) -> Self {
        error!("cache request failed, {}", e);
        match e {
            ConnectionError::Closed => CustomError::CacheUnavailable,
            ConnectionError::Timeout => CustomError::Timeout,
            ConnectionError::Backend { .. } => CustomError::CacheError,
        }
    }
}

impl error::ResponseError for CustomError {
    fn status_code(&self) -> StatusCode {
        match *self {
            CustomError::CacheUnavailable | CustomError::CacheError => StatusCode::SERVICE_UNAVAILABLE,
            CustomError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::html())
            .body(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use actix_web::ResponseError;
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(CustomError::from(ConnectionError::Closed).status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(CustomError::from(ConnectionError::Timeout).status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(CustomError::CacheError.error_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
