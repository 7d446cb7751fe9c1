pub mod auth;
pub mod middleware;
pub mod rest;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub use middleware::require_auth;
pub use rest::ApiDoc;
pub use state::AppState;

/// Builds the API router: public auth routes plus the cookie-protected study-set routes.
pub fn router(app_state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler));

    let protected_routes = Router::new()
        .route(
            "/study-sets",
            get(rest::list_study_sets_handler).post(rest::create_study_set_handler),
        )
        .route("/study-sets/upload", post(rest::upload_study_set_handler))
        .route("/study-sets/youtube", post(rest::youtube_study_set_handler))
        .route(
            "/study-sets/{id}",
            get(rest::get_study_set_handler)
                .patch(rest::update_study_set_handler)
                .delete(rest::delete_study_set_handler),
        )
        .route("/study-sets/{id}/refresh", post(rest::refresh_study_set_handler))
        .route("/economy", get(rest::economy_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(app_state.config.max_upload_bytes))
        .with_state(app_state)
}
