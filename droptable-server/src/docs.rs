use std::borrow::BorrowMut;

use axum::{response::IntoResponse, Json};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::{admin, auth, schemas, serialized, storefront};

#[derive(OpenApi)]
#[openapi(
    modifiers(&Security),
    info(
        description = "droptable-server exposes endpoints to interact with this droptable instance"
    ),
    paths(
        auth::login,
        auth::callback,
        auth::logout,
        auth::user,
        storefront::list_cases,
        storefront::case_items,
        storefront::open_case,
        storefront::opening_state,
        storefront::dismiss_opening,
        storefront::wallet,
        storefront::inventory,
        storefront::sell_entry,
        admin::login,
        admin::logout,
        admin::list_cases,
        admin::create_case,
        admin::update_case,
        admin::delete_case,
        admin::list_items,
        admin::create_item,
        admin::update_item,
        admin::delete_item,
        admin::allow_list,
        admin::set_allow_list,
        admin::upload_image,
    ),
    components(schemas(
        schemas::AdminLoginSchema,
        schemas::NewCaseSchema,
        schemas::UpdatedCaseSchema,
        schemas::NewItemSchema,
        schemas::UpdatedItemSchema,
        schemas::AllowListSchema,
        serialized::User,
        serialized::LoginResult,
        serialized::LoginUrl,
        serialized::Case,
        serialized::Item,
        serialized::InventoryEntry,
        serialized::Opening,
        serialized::Wallet,
        serialized::SaleResult,
        serialized::DeletedCase,
        serialized::DataUrl,
        serialized::AllowList,
    ))
)]
pub struct ApiDoc;

struct Security;

impl Modify for Security {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.borrow_mut() {
            let scheme = HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .bearer_format("Bearer <token>")
                .build();

            components.add_security_scheme("BearerAuth", SecurityScheme::Http(scheme))
        }
    }
}

pub async fn docs() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
