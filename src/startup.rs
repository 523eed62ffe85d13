use actix_files as fs;
use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{AuthService, TokenIssuer};
use crate::configuration::Settings;
use crate::error::{AppError, ValidationError};
use crate::logger::LoggerMiddleware;
use crate::media::ObjectStore;
use crate::middleware::JwtMiddleware;
use crate::routes::{
    change_password, current_user, health_check, login, logout, refresh, register,
    update_account, update_avatar, update_cover_image,
};
use crate::store::UserStore;

pub fn run(
    listener: TcpListener,
    store: Arc<dyn UserStore>,
    objects: Arc<dyn ObjectStore>,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    let auth = Arc::new(AuthService::new(
        store,
        objects,
        TokenIssuer::new(settings.jwt.clone()),
        settings.application.password_cost,
    ));
    let auth_data = web::Data::from(auth.clone());
    let media = settings.media;
    let media_data = web::Data::new(media.clone());

    let server = HttpServer::new(move || {
        let gate = JwtMiddleware::new(auth.clone());

        App::new()
            // Global middleware
            .wrap(Logger::default())      // Standard logging
            .wrap(LoggerMiddleware)       // Request id + latency

            // Shared state
            .app_data(auth_data.clone())
            .app_data(media_data.clone())
            .app_data(web::PayloadConfig::new(media.max_upload_bytes))
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                AppError::from(ValidationError::MalformedBody(err.to_string())).into()
            }))

            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/api/v1/users")
                    // Public routes
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login))
                    .route("/refresh-token", web::post().to(refresh))

                    // Protected routes (require a valid access token)
                    .service(
                        web::resource("/logout")
                            .wrap(gate.clone())
                            .route(web::post().to(logout)),
                    )
                    .service(
                        web::resource("/change-password")
                            .wrap(gate.clone())
                            .route(web::post().to(change_password)),
                    )
                    .service(
                        web::resource("/current-user")
                            .wrap(gate.clone())
                            .route(web::get().to(current_user)),
                    )
                    .service(
                        web::resource("/update-account")
                            .wrap(gate.clone())
                            .route(web::patch().to(update_account)),
                    )
                    .service(
                        web::resource("/avatar")
                            .wrap(gate.clone())
                            .route(web::patch().to(update_avatar)),
                    )
                    .service(
                        web::resource("/cover-image")
                            .wrap(gate)
                            .route(web::patch().to(update_cover_image)),
                    ),
            )

            // Uploaded media, read-only
            .service(fs::Files::new(&media.public_url, &media.root))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
