//! Business logic layer. Services own the database handle and the event
//! sender; handlers stay thin and authorization stays at the route boundary.

pub mod analytics;
pub mod catalog;
pub mod items;
pub mod outgoing;
pub mod sales;
pub mod stock;

pub use analytics::AnalyticsService;
pub use catalog::CatalogService;
pub use items::ItemService;
pub use outgoing::OutgoingService;
pub use sales::SalesService;
pub use stock::StockService;
