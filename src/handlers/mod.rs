//! HTTP handlers. Thin translation between the wire DTOs and the service
//! layer; every error funnels through `ServiceError::into_response`.

use crate::services::{
    AnalyticsService, CatalogService, ItemService, OutgoingService, SalesService, StockService,
};
use std::sync::Arc;

pub mod auth;
pub mod catalog;
pub mod dashboard;
pub mod items;
pub mod movements;
pub mod outgoing;
pub mod sales;

/// Container wiring all services for handler access.
#[derive(Clone)]
pub struct AppServices {
    pub items: Arc<ItemService>,
    pub stock: Arc<StockService>,
    pub sales: Arc<SalesService>,
    pub outgoing: Arc<OutgoingService>,
    pub catalog: Arc<CatalogService>,
    pub analytics: Arc<AnalyticsService>,
}
