use ntex::web;

/// Configures webhook routes for the LINE platform.
///
/// These routes are public endpoints authenticated by the request signature.
///
/// # Routes
/// - `GET /webhook` - liveness check
/// - `POST /webhook` - LINE webhook receiver
/// - any other method on `/webhook` - 405
pub fn line(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/webhook")
            .route(web::get().to(super::line::health))
            .route(web::post().to(super::line::receive))
            .route(web::route().to(super::line::method_not_allowed)),
    );
}
