use actix_web::{web, HttpRequest};

use crate::db::{Database, QueryParam};
use crate::error::ApiError;
use crate::handlers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Must parse as `i64`; anything else is rejected before reaching SQL.
    Integer,
    /// Bound as-is.
    Text,
}

#[derive(Debug)]
pub struct PathParam {
    pub name: &'static str,
    pub kind: ParamKind,
}

/// A GET route backed by exactly one SQL statement.
#[derive(Debug)]
pub struct RouteDef {
    pub path: &'static str,
    pub sql: &'static str,
    pub param: Option<PathParam>,
}

const fn collection(path: &'static str, sql: &'static str) -> RouteDef {
    RouteDef {
        path,
        sql,
        param: None,
    }
}

const fn item(
    path: &'static str,
    sql: &'static str,
    name: &'static str,
    kind: ParamKind,
) -> RouteDef {
    RouteDef {
        path,
        sql,
        param: Some(PathParam { name, kind }),
    }
}

pub static ROUTES: &[RouteDef] = &[
    collection("/customers", "SELECT id, name, city, phone FROM customers"),
    item(
        "/customers/{id}",
        "SELECT * FROM customers WHERE id = ?",
        "id",
        ParamKind::Integer,
    ),
    collection("/reservations", "SELECT * FROM reservations"),
    item(
        "/reservations/{id}",
        "SELECT * FROM reservations WHERE id = ?",
        "id",
        ParamKind::Integer,
    ),
    collection("/invoices", "SELECT * FROM invoices"),
    item(
        "/invoices/{id}",
        "SELECT * FROM invoices WHERE id = ?",
        "id",
        ParamKind::Integer,
    ),
    collection("/rooms", "SELECT * FROM rooms"),
    item(
        "/rooms/{number}",
        "SELECT * FROM rooms WHERE room_no = ?",
        "number",
        ParamKind::Text,
    ),
    collection("/room_types", "SELECT * FROM room_types"),
];

impl ParamKind {
    pub fn parse(self, name: &'static str, raw: &str) -> Result<QueryParam, ApiError> {
        match self {
            ParamKind::Integer => raw
                .parse()
                .map(QueryParam::Int)
                .map_err(|_| ApiError::InvalidParam {
                    name,
                    value: raw.to_string(),
                }),
            ParamKind::Text => Ok(QueryParam::Text(raw.to_string())),
        }
    }
}

impl RouteDef {
    /// Extracts and validates the path parameter, if the route has one.
    pub fn bind(&self, req: &HttpRequest) -> Result<Option<QueryParam>, ApiError> {
        let Some(param) = &self.param else {
            return Ok(None);
        };
        let raw = req
            .match_info()
            .get(param.name)
            .ok_or(ApiError::MissingParam(param.name))?;
        param.kind.parse(param.name, raw).map(Some)
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    for route in ROUTES {
        cfg.route(
            route.path,
            web::get().to(move |db: web::Data<Database>, req: HttpRequest| {
                handlers::records::dispatch(route, db, req)
            }),
        );
    }
}
