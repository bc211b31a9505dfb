pub mod admin;
pub mod chat;
pub mod rates;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/rates/latest", web::get().to(rates::latest))
            .route("/rates/history", web::get().to(rates::history))
            .route("/rates/chart", web::get().to(rates::chart))
            .route("/convert", web::get().to(rates::convert_amount))
            .route("/admin/login", web::post().to(admin::login))
            .route("/admin/logout", web::post().to(admin::logout))
            .route("/admin/rates", web::post().to(admin::submit_rate))
            .route("/chat/session", web::post().to(chat::session))
            .service(
                web::resource("/chat/messages")
                    .route(web::get().to(chat::list))
                    .route(web::post().to(chat::send)),
            ),
    );
}
