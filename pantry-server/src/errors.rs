use axum::{
    http,
    response::{IntoResponse, Response},
};
pub type WebResult<T> = std::result::Result<T, WebError>;

#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Internal Server Error: {0}")]
    Internal(#[from] anyhow::Error),
    #[error("Templating error: {0:#}")]
    Template(#[from] minijinja::Error),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Upstream(String),
    #[error("Not found")]
    NotFound,
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            WebError::Internal(_) | WebError::Template(_) => {
                tracing::error!(error = %message, "Request failed");
                (http::StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
            }
            // User-facing failures are always explained
            WebError::BadRequest(_) => (http::StatusCode::BAD_REQUEST, message).into_response(),
            WebError::Conflict(_) => (http::StatusCode::CONFLICT, message).into_response(),
            WebError::Upstream(_) => (http::StatusCode::BAD_GATEWAY, message).into_response(),
            WebError::NotFound => (http::StatusCode::NOT_FOUND, "Not Found").into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        let cases = [
            (WebError::Internal(anyhow::anyhow!("boom")), http::StatusCode::INTERNAL_SERVER_ERROR),
            (WebError::BadRequest("no".into()), http::StatusCode::BAD_REQUEST),
            (WebError::Conflict("busy".into()), http::StatusCode::CONFLICT),
            (WebError::Upstream("down".into()), http::StatusCode::BAD_GATEWAY),
            (WebError::NotFound, http::StatusCode::NOT_FOUND),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
