use actix_web::{get, web, HttpResponse};
use crate::server::cache::error::ConnectionError;
use crate::server::controller::error::CustomError;
use crate::server::model::stats::{PingResponse, StatsResponse};
use crate::server::state::AppState;

#[get("/cache/ping")]
/// round trip to the cache through the pool
async fn ping(data: web::Data<AppState>) -> Result<HttpResponse, CustomError> {
    let client = data.get_cache();
    let mut conn = client.borrow().await?;
    let reply: String = redis::cmd("PING")
        .query_async(&mut *conn)
        .await
        .map_err(ConnectionError::from)?;
    client.release(conn);
    Ok(HttpResponse::Ok().json(PingResponse { reply }))
}

#[get("/cache/stats")]
/// pool settings and counters, no I/O
async fn stats(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(StatsResponse::from(&data.get_cache()))
}
