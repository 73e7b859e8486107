use actix_web::dev::Server;
use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};
use log::info;

pub const ALIVE_BODY: &str = "✅ Bot is alive!";

#[get("/")]
async fn alive() -> impl Responder {
    HttpResponse::Ok().body(ALIVE_BODY)
}

pub fn init_keepalive(cfg: &mut web::ServiceConfig) {
    cfg.service(alive);
}

/// Binds the uptime endpoint. The returned server does nothing until awaited.
pub fn start_keepalive_server(port: u16) -> std::io::Result<Server> {
    let server = HttpServer::new(|| App::new().configure(init_keepalive))
        .workers(1)
        .bind(("0.0.0.0", port))?
        .run();
    info!("🌐 Keep-alive server running on port {}", port);
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App, http::StatusCode};

    #[actix_web::test]
    async fn test_root_is_alive() {
        let app = test::init_service(App::new().configure(init_keepalive)).await;
        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = test::read_body(resp).await;
        assert_eq!(body, ALIVE_BODY.as_bytes());
    }

    #[actix_web::test]
    async fn test_other_routes_are_not_served() {
        let app = test::init_service(App::new().configure(init_keepalive)).await;
        let req = test::TestRequest::get().uri("/status").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_ne!(resp.status(), StatusCode::OK);
    }
}
