use crate::model::Status;

use std::borrow::Cow;

use axum::{
    async_trait,
    body::HttpBody,
    extract::{rejection::JsonRejection, FromRequest},
    http::{Request, StatusCode},
    BoxError,
};
use serde::de::DeserializeOwned;

/// JSON extractor with custom error response
pub struct Json<T>(pub T);

#[async_trait]
impl<S, B, T> FromRequest<S, B> for Json<T>
where
    T: DeserializeOwned,
    B: HttpBody + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
    S: Send + Sync,
{
    type Rejection = Status;

    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                let (status, message): (_, Cow<'_, str>) = match rejection {
                    JsonRejection::JsonDataError(err) => {
                        (StatusCode::BAD_REQUEST, err.body_text().into())
                    }
                    JsonRejection::JsonSyntaxError(err) => {
                        (StatusCode::BAD_REQUEST, err.body_text().into())
                    }
                    JsonRejection::MissingJsonContentType(err) => {
                        (StatusCode::UNSUPPORTED_MEDIA_TYPE, err.body_text().into())
                    }
                    JsonRejection::BytesRejection(err) => {
                        (StatusCode::BAD_REQUEST, err.body_text().into())
                    }
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into()),
                };

                Err(Status::new(status, message))
            }
        }
    }
}
