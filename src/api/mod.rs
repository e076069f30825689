use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::core::report::clamp_limit;
use crate::store::RecordStore;

pub mod attendance;
pub mod employee;
pub mod leave_request;

/// Shared handle every handler receives.
pub type Store = web::Data<dyn RecordStore>;

pub fn store_data(store: Arc<dyn RecordStore>) -> Store {
    web::Data::from(store)
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PageQuery {
    /// Pagination page number (start with 1)
    #[param(example = 1)]
    pub page: Option<u64>,
    /// Items per page, capped at 100
    #[param(example = 10)]
    pub per_page: Option<u64>,
}

impl PageQuery {
    pub fn window(&self, default_per_page: u64) -> (u64, u64) {
        window(self.page, self.per_page, default_per_page)
    }
}

/// Converts 1-based `page`/`per_page` into `(offset, limit)`.
pub fn window(page: Option<u64>, per_page: Option<u64>, default_per_page: u64) -> (u64, u64) {
    let per_page = clamp_limit(per_page.unwrap_or(default_per_page));
    let page = page.unwrap_or(1).max(1);
    ((page - 1).saturating_mul(per_page), per_page)
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is up", body = Object, example = json!({
            "status": "ok",
            "message": "Server is running"
        }))
    ),
    tag = "Health"
)]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_defaults_and_clamps() {
        assert_eq!(window(None, None, 10), (0, 10));
        assert_eq!(window(Some(3), Some(20), 10), (40, 20));
        assert_eq!(window(Some(0), Some(500), 10), (0, 100));
        assert_eq!(window(Some(2), Some(0), 10), (1, 1));
    }

    #[test]
    fn huge_page_saturates_instead_of_wrapping() {
        assert_eq!(window(Some(u64::MAX), Some(100), 10), (u64::MAX, 100));
        assert_eq!(window(Some(u64::MAX), Some(1), 10), (u64::MAX - 1, 1));
    }
}
