//! OpenAPI document and Swagger UI wiring.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers;
use crate::health;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stockroom API",
        description = "Stock management backend for small businesses: inventory, \
                       movement ledger, sales, outgoing stock and dashboards."
    ),
    paths(
        health::liveness,
        health::readiness,
        handlers::auth::login,
        handlers::auth::register,
        handlers::auth::me,
        handlers::items::create_item,
        handlers::items::list_items,
        handlers::items::get_item,
        handlers::items::update_item,
        handlers::items::delete_item,
        handlers::items::adjust_stock,
        handlers::movements::list_movements,
        handlers::sales::record_sale,
        handlers::sales::list_sales,
        handlers::sales::get_sale,
        handlers::sales::return_sale,
        handlers::outgoing::record_outgoing,
        handlers::outgoing::list_outgoing,
        handlers::outgoing::get_outgoing,
        handlers::catalog::create_category,
        handlers::catalog::delete_category,
        handlers::catalog::create_branch,
        handlers::catalog::delete_branch,
        handlers::dashboard::summary,
        handlers::dashboard::sales_by_day,
        handlers::dashboard::movement_breakdown,
        handlers::dashboard::top_items,
    ),
    components(schemas(
        health::HealthStatus,
        handlers::auth::LoginRequest,
        handlers::auth::RegisterUserRequest,
        handlers::items::CreateItemRequest,
        handlers::items::UpdateItemRequest,
        handlers::items::AdjustStockRequest,
        handlers::items::AdjustmentResponse,
        handlers::sales::RecordSaleRequest,
        handlers::sales::ReturnSaleRequest,
        handlers::sales::ReturnSaleResponse,
        handlers::outgoing::RecordOutgoingRequest,
        handlers::catalog::CreateCategoryRequest,
        handlers::catalog::UpdateCategoryRequest,
        handlers::catalog::CreateBranchRequest,
        handlers::catalog::UpdateBranchRequest,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "stockroom-api", description = "Inventory and sales endpoints")
    )
)]
pub struct ApiDoc;

/// Swagger UI router, mounted at `/docs`.
pub fn swagger_routes() -> utoipa_swagger_ui::SwaggerUi {
    utoipa_swagger_ui::SwaggerUi::new("/docs")
        .url("/api-docs/openapi.json", <ApiDoc as OpenApi>::openapi())
}
