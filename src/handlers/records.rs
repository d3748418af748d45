use actix_web::{web, HttpRequest, HttpResponse};

use crate::db::Database;
use crate::error::ApiError;
use crate::routes::RouteDef;

/// Shared handler for every entry in the route table.
pub async fn dispatch(
    route: &'static RouteDef,
    db: web::Data<Database>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let param = route.bind(&req)?;

    let rows = db
        .fetch_rows(route.sql, param.as_ref())
        .await
        .map_err(|err| {
            log::error!("GET {} failed: {}", req.path(), err);
            err
        })?;

    Ok(HttpResponse::Ok().json(rows))
}
