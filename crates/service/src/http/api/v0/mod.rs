use axum::Router;

pub mod dir;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .nest("/dir", dir::router(state.clone()))
        .with_state(state)
}
