use crate::di::Container;
use crate::error::ApiError;
use axum::{extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

/// Axum extractor that hands a registered service to a handler
///
/// ```rust,ignore
/// async fn get_data(Inject(controller): Inject<DataController>) -> Response {
///     controller.get_data().await
/// }
/// ```
pub struct Inject<T>(pub Arc<T>);

/// Implemented by router state that carries the container.
pub trait HasContainer {
    fn container(&self) -> &Container;
}

impl<S, T> FromRequestParts<S> for Inject<T>
where
    S: Send + Sync + HasContainer,
    T: 'static + Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        state
            .container()
            .resolve::<T>()
            .map(Inject)
            .map_err(|e| ApiError::internal(format!("Dependency injection failed: {}", e)))
    }
}

impl<T> std::ops::Deref for Inject<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> Clone for Inject<T> {
    fn clone(&self) -> Self {
        Inject(Arc::clone(&self.0))
    }
}
