use crate::error::Error;
use axum::extract::{rejection::JsonRejection, FromRequest, Request};
use axum::Json;

/// `Json<T>` whose rejection is an [`Error`], so a bad body gets the same
/// `400 {"error": ...}` as any other invalid input.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}
