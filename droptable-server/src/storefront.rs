use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json,
};
use droptable_core::PrimaryKey;

use crate::{
    auth::Session,
    context::ServerContext,
    errors::ServerResult,
    serialized::{Case, InventoryEntry, Item, Opening, SaleResult, ToSerialized, Wallet},
    Router,
};

#[utoipa::path(
    get,
    path = "/v1/cases",
    tag = "storefront",
    responses(
        (status = 200, body = Vec<Case>)
    )
)]
pub(crate) async fn list_cases(State(context): State<ServerContext>) -> ServerResult<Json<Vec<Case>>> {
    let catalog = &context.app.catalog;

    let items = catalog.list_items()?;
    let cases: Vec<_> = catalog
        .list_cases()?
        .into_iter()
        .map(|case| {
            let item_count = items.iter().filter(|i| i.case_id == case.id).count();
            (case, item_count).to_serialized()
        })
        .collect();

    Ok(Json(cases))
}

#[utoipa::path(
    get,
    path = "/v1/cases/{id}/items",
    tag = "storefront",
    responses(
        (status = 200, body = Vec<Item>)
    )
)]
pub(crate) async fn case_items(
    State(context): State<ServerContext>,
    Path(case_id): Path<PrimaryKey>,
) -> ServerResult<Json<Vec<Item>>> {
    // 404 for an unknown case rather than an empty pool
    context.app.catalog.case_by_id(case_id)?;
    let items = context.app.catalog.items_in_case(case_id)?;

    Ok(Json(items.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/cases/{id}/open",
    tag = "storefront",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = InventoryEntry),
        (status = 402, description = "Balance doesn't cover the case price"),
        (status = 409, description = "An opening is already in progress"),
        (status = 422, description = "The case has no items to draw from")
    )
)]
pub(crate) async fn open_case(
    session: Session,
    State(context): State<ServerContext>,
    Path(case_id): Path<PrimaryKey>,
) -> ServerResult<Json<InventoryEntry>> {
    let entry = context
        .app
        .unboxing
        .open(&session.user.steam_id, case_id)
        .await?;

    Ok(Json(entry.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/unboxing",
    tag = "storefront",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Opening)
    )
)]
pub(crate) async fn opening_state(
    session: Session,
    State(context): State<ServerContext>,
) -> Json<Opening> {
    let state = context.app.unboxing.state(&session.user.steam_id);

    Json(state.to_serialized())
}

#[utoipa::path(
    post,
    path = "/v1/unboxing/dismiss",
    tag = "storefront",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "The resolved reward was put away"),
        (status = 409, description = "An opening is still revealing")
    )
)]
pub(crate) async fn dismiss_opening(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<()> {
    context.app.unboxing.dismiss(&session.user.steam_id)?;

    Ok(())
}

#[utoipa::path(
    get,
    path = "/v1/wallet",
    tag = "storefront",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Wallet)
    )
)]
pub(crate) async fn wallet(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<Json<Wallet>> {
    let balance = context.app.wallets.balance(&session.user.steam_id)?;

    Ok(Json(Wallet::new(balance)))
}

#[utoipa::path(
    get,
    path = "/v1/inventory",
    tag = "storefront",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<InventoryEntry>)
    )
)]
pub(crate) async fn inventory(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<InventoryEntry>>> {
    let entries = context.app.inventories.list(&session.user.steam_id)?;

    Ok(Json(entries.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/inventory/{entryId}/sell",
    tag = "storefront",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = SaleResult),
        (status = 404, description = "No such inventory entry")
    )
)]
pub(crate) async fn sell_entry(
    session: Session,
    State(context): State<ServerContext>,
    Path(entry_id): Path<PrimaryKey>,
) -> ServerResult<Json<SaleResult>> {
    let steam_id = &session.user.steam_id;

    let removed = context.app.inventories.remove(steam_id, entry_id)?;
    let balance = context.app.wallets.credit(steam_id, removed.item.price)?;
    let inventory = context.app.inventories.list(steam_id)?;

    Ok(Json(SaleResult::new(balance, inventory.to_serialized())))
}

pub fn router() -> Router {
    Router::new()
        .route("/cases", get(list_cases))
        .route("/cases/:id/items", get(case_items))
        .route("/cases/:id/open", post(open_case))
        .route("/unboxing", get(opening_state))
        .route("/unboxing/dismiss", post(dismiss_opening))
        .route("/wallet", get(wallet))
        .route("/inventory", get(inventory))
        .route("/inventory/:id/sell", post(sell_entry))
}
