use std::sync::Arc;

use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::{cookie::Key, middleware::Logger, web, App, HttpServer};
use clap::Parser;
use dotenv::dotenv;

use showbill_srv::{db, home, not_found, route, Opt};

#[actix_web::main]
async fn main() -> eyre::Result<()> {
    dotenv().ok();
    let opt = Arc::new(Opt::parse());
    env_logger::init();

    let db_pool = db::setup(&opt).await?;
    let app = {
        let opt = Arc::clone(&opt);
        move || {
            let logger = Logger::default();
            let secret_key = Key::from(opt.cookie_secret_key.as_bytes());

            // The create routes go before the `{id}` routes so the
            // literal segment wins.
            App::new()
                .wrap(logger)
                .wrap(SessionMiddleware::new(
                    CookieSessionStore::default(),
                    secret_key,
                ))
                .app_data(web::Data::new(db_pool.clone()))
                .service(home)
                .service(route::venues::list)
                .service(route::venues::search)
                .service(route::venues::create_form)
                .service(route::venues::create)
                .service(route::venues::edit_form)
                .service(route::venues::edit)
                .service(route::venues::detail)
                .service(route::venues::remove)
                .service(route::artists::list)
                .service(route::artists::search)
                .service(route::artists::create_form)
                .service(route::artists::create)
                .service(route::artists::edit_form)
                .service(route::artists::edit)
                .service(route::artists::detail)
                .service(route::shows::list)
                .service(route::shows::create_form)
                .service(route::shows::create)
                .default_service(web::route().to(not_found))
        }
    };

    log::info!("listening on {}:{}", opt.address, opt.port);

    HttpServer::new(app)
        .bind((opt.address.as_str(), opt.port))?
        .run()
        .await?;

    Ok(())
}
