//! An extractor that accepts either a JSON or a URL-encoded form body.

use axum::{
    Form, Json,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
};
use serde::de::DeserializeOwned;

use crate::Error;

/// Deserializes the request body as JSON when the content type is
/// `application/json`, and as a URL-encoded form otherwise.
///
/// HTML forms post URL-encoded bodies while scripts tend to post JSON, and
/// the registration and log-in endpoints accept both. Bodies that cannot be
/// deserialized are rejected with [Error::Validation].
#[derive(Debug, Clone)]
pub(crate) struct JsonOrForm<T>(pub T);

impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = Error;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|content_type| content_type.starts_with("application/json"));

        if is_json {
            let Json(payload) = Json::<T>::from_request(request, state)
                .await
                .map_err(Error::from)?;

            Ok(Self(payload))
        } else {
            let Form(payload) = Form::<T>::from_request(request, state)
                .await
                .map_err(Error::from)?;

            Ok(Self(payload))
        }
    }
}
