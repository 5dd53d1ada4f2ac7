use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    handlers,
    middleware::{jwt_auth_middleware, role_guard_middleware},
    models::users::Role,
    state::AppState,
};

/// Wraps `routes` in the JWT check and, when given, a role guard.
///
/// `route_layer` runs the last added layer first, so authentication happens
/// before the role is inspected.
fn protected(routes: Router<AppState>, state: &AppState, role: Option<Role>) -> Router<AppState> {
    let routes = match role {
        Some(role) => routes.route_layer(middleware::from_fn_with_state(role, role_guard_middleware)),
        None => routes,
    };
    routes.route_layer(middleware::from_fn_with_state(
        state.clone(),
        jwt_auth_middleware,
    ))
}

/// Builds the application router.
///
/// Versioned REST endpoints live under `/api/v1`; the calendar widget's
/// JSON endpoints keep their flat `/api/*` paths; stored images are served
/// from `/uploads`.
pub fn create_router(state: AppState) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/auth/signup", post(handlers::signup))
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/forgot", post(handlers::forgot_password));

    let account_routes = protected(
        Router::new().route("/me", get(handlers::me)),
        &state,
        None,
    );

    let admin_routes = protected(
        Router::new().route(
            "/admin/users",
            get(handlers::list_users).post(handlers::create_user),
        ),
        &state,
        Some(Role::Admin),
    );

    let dentist_routes = protected(
        Router::new()
            .route(
                "/dentist/patients",
                get(handlers::list_patients).post(handlers::create_patient),
            )
            .route("/dentist/patients/{id}", get(handlers::get_patient))
            .route("/dentist/appointments", get(handlers::list_dentist_appointments))
            .route("/dentist/schedule", post(handlers::schedule_patient))
            .route("/dentist/patients/{id}/records", get(handlers::list_patient_records))
            .route("/dentist/patients/{id}/anamnesis", post(handlers::add_anamnesis))
            .route("/dentist/patients/{id}/records/{kind}", post(handlers::upload_record)),
        &state,
        Some(Role::Dentist),
    );

    let patient_routes = protected(
        Router::new()
            .route("/patient/appointments", get(handlers::list_patient_appointments))
            .route("/patient/records", get(handlers::list_own_records)),
        &state,
        Some(Role::Patient),
    );

    let dentist_calendar = protected(
        Router::new()
            .route("/dentist_events", get(handlers::dentist_events))
            .route("/add_availability", post(handlers::add_availability))
            .route("/remove_availability", post(handlers::remove_availability))
            .route("/cancel_appointment", post(handlers::cancel_appointment)),
        &state,
        Some(Role::Dentist),
    );

    let patient_calendar = protected(
        Router::new()
            .route("/patient_slots", get(handlers::patient_slots))
            .route("/patient_events", get(handlers::patient_events))
            .route("/book", post(handlers::book))
            .route("/patient_cancel", post(handlers::patient_cancel)),
        &state,
        Some(Role::Patient),
    );

    let api_v1 = Router::new()
        .merge(public_routes)
        .merge(account_routes)
        .merge(admin_routes)
        .merge(dentist_routes)
        .merge(patient_routes);

    let calendar = Router::new().merge(dentist_calendar).merge(patient_calendar);

    Router::new()
        .nest("/api/v1", api_v1)
        .nest("/api", calendar)
        .nest_service("/uploads", ServeDir::new(state.uploads.root()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(state.config.uploads.max_upload_bytes)),
        )
        .with_state(state)
}
