use serde::Serialize;
use utoipa::ToSchema;

use crate::paging::Page;

#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
    pub total_pages: Option<i64>,
    pub has_prev: Option<bool>,
    pub has_next: Option<bool>,
}

impl Meta {
    pub fn empty() -> Self {
        Self {
            page: None,
            per_page: None,
            total: None,
            total_pages: None,
            has_prev: None,
            has_next: None,
        }
    }

    pub fn from_page<T>(page: &Page<T>) -> Self {
        Self {
            page: Some(page.page),
            per_page: Some(page.per_page),
            total: Some(page.total),
            total_pages: Some(page.total_pages),
            has_prev: Some(page.has_prev()),
            has_next: Some(page.has_next()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }
}
