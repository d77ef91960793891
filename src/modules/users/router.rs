use crate::modules::users::controller::{create_account, get_account, regenerate_matricule};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_account))
        .route("/{id}", get(get_account))
        .route("/{id}/matricule", post(regenerate_matricule))
}
