use crate::modules::students::controller::{
    create_enrollment, generate_student_matricule, get_enrollment,
    regenerate_registration_number,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn init_students_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_enrollment))
        .route("/{id}", get(get_enrollment))
        .route("/{id}/matricule", post(generate_student_matricule))
        .route(
            "/{id}/registration-number",
            post(regenerate_registration_number),
        )
}
