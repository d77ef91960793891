use crate::modules::matricules::controller::{get_prefixes, inspect_matricule, validate_matricule};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn init_matricules_router() -> Router<AppState> {
    Router::new()
        .route("/prefixes", get(get_prefixes))
        .route("/validate", post(validate_matricule))
        .route("/{value}", get(inspect_matricule))
}
