use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{delete, get, patch, post, put},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use droptable_core::{
    Credentials, NewCase, NewItem, PrimaryKey, UpdatedCase, UpdatedItem,
};

use crate::{
    auth::{Admin, Session},
    context::ServerContext,
    errors::ServerResult,
    schemas::{
        AdminLoginSchema, AllowListSchema, NewCaseSchema, NewItemSchema, UpdatedCaseSchema,
        UpdatedItemSchema, ValidatedJson,
    },
    serialized::{AllowList, Case, DataUrl, DeletedCase, Item, LoginResult, ToSerialized},
    Router,
};

#[utoipa::path(
    post,
    path = "/v1/admin/login",
    tag = "admin",
    request_body = AdminLoginSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = LoginResult),
        (status = 400, description = "Login or password is incorrect")
    )
)]
pub(crate) async fn login(
    session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<AdminLoginSchema>,
) -> ServerResult<Json<LoginResult>> {
    let elevated = context.app.auth.grant_admin(
        &session.token,
        &Credentials {
            login: body.login,
            password: body.password,
        },
    )?;

    Ok(Json(elevated.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/admin/logout",
    tag = "admin",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = LoginResult)
    )
)]
pub(crate) async fn logout(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<Json<LoginResult>> {
    let demoted = context.app.auth.revoke_admin(&session.token)?;

    Ok(Json(demoted.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/admin/cases",
    tag = "admin",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Case>)
    )
)]
pub(crate) async fn list_cases(
    _admin: Admin,
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<Case>>> {
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
    post,
    path = "/v1/admin/cases",
    tag = "admin",
    request_body = NewCaseSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Case)
    )
)]
pub(crate) async fn create_case(
    _admin: Admin,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewCaseSchema>,
) -> ServerResult<Json<Case>> {
    let case = context.app.catalog.create_case(NewCase {
        name: body.name,
        price: body.price,
        image: body.image,
        description: body.description,
    })?;

    Ok(Json((case, 0).to_serialized()))
}

#[utoipa::path(
    patch,
    path = "/v1/admin/cases/{id}",
    tag = "admin",
    request_body = UpdatedCaseSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Case)
    )
)]
pub(crate) async fn update_case(
    _admin: Admin,
    State(context): State<ServerContext>,
    Path(case_id): Path<PrimaryKey>,
    ValidatedJson(body): ValidatedJson<UpdatedCaseSchema>,
) -> ServerResult<Json<Case>> {
    let case = context.app.catalog.update_case(
        case_id,
        UpdatedCase {
            name: body.name,
            price: body.price,
            image: body.image,
            description: body.description,
        },
    )?;

    let item_count = context.app.catalog.items_in_case(case.id)?.len();

    Ok(Json((case, item_count).to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/v1/admin/cases/{id}",
    tag = "admin",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = DeletedCase)
    )
)]
pub(crate) async fn delete_case(
    _admin: Admin,
    State(context): State<ServerContext>,
    Path(case_id): Path<PrimaryKey>,
) -> ServerResult<Json<DeletedCase>> {
    let removed = context.app.catalog.delete_case(case_id)?;
    let removed_ids = removed.into_iter().map(|i| i.id).collect();

    Ok(Json(DeletedCase::new(case_id, removed_ids)))
}

#[utoipa::path(
    get,
    path = "/v1/admin/items",
    tag = "admin",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Item>)
    )
)]
pub(crate) async fn list_items(
    _admin: Admin,
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<Item>>> {
    let items = context.app.catalog.list_items()?;

    Ok(Json(items.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/admin/items",
    tag = "admin",
    request_body = NewItemSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Item),
        (status = 404, description = "The referenced case doesn't exist")
    )
)]
pub(crate) async fn create_item(
    _admin: Admin,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewItemSchema>,
) -> ServerResult<Json<Item>> {
    let item = context.app.catalog.create_item(NewItem {
        name: body.name,
        rarity: body.rarity,
        image: body.image,
        price: body.price,
        case_id: body.case_id,
    })?;

    Ok(Json(item.to_serialized()))
}

#[utoipa::path(
    patch,
    path = "/v1/admin/items/{id}",
    tag = "admin",
    request_body = UpdatedItemSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Item)
    )
)]
pub(crate) async fn update_item(
    _admin: Admin,
    State(context): State<ServerContext>,
    Path(item_id): Path<PrimaryKey>,
    ValidatedJson(body): ValidatedJson<UpdatedItemSchema>,
) -> ServerResult<Json<Item>> {
    let item = context.app.catalog.update_item(
        item_id,
        UpdatedItem {
            name: body.name,
            rarity: body.rarity,
            image: body.image,
            price: body.price,
            case_id: body.case_id,
        },
    )?;

    Ok(Json(item.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/v1/admin/items/{id}",
    tag = "admin",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "The item was deleted")
    )
)]
pub(crate) async fn delete_item(
    _admin: Admin,
    State(context): State<ServerContext>,
    Path(item_id): Path<PrimaryKey>,
) -> ServerResult<()> {
    context.app.catalog.delete_item(item_id)?;

    Ok(())
}

#[utoipa::path(
    get,
    path = "/v1/admin/allowlist",
    tag = "admin",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = AllowList)
    )
)]
pub(crate) async fn allow_list(
    _admin: Admin,
    State(context): State<ServerContext>,
) -> ServerResult<Json<AllowList>> {
    let ids = context.app.auth.allow_list()?;

    Ok(Json(AllowList::new(ids)))
}

#[utoipa::path(
    put,
    path = "/v1/admin/allowlist",
    tag = "admin",
    request_body = AllowListSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = AllowList)
    )
)]
pub(crate) async fn set_allow_list(
    _admin: Admin,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<AllowListSchema>,
) -> ServerResult<Json<AllowList>> {
    context.app.auth.set_allow_list(&body.steam_ids)?;

    Ok(Json(AllowList::new(body.steam_ids)))
}

#[utoipa::path(
    post,
    path = "/v1/admin/images",
    tag = "admin",
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = DataUrl),
        (status = 400, description = "The upload was empty")
    )
)]
pub(crate) async fn upload_image(
    _admin: Admin,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<DataUrl>, (StatusCode, &'static str)> {
    if body.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "The upload was empty"));
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|x| x.to_str().ok())
        .unwrap_or("application/octet-stream");

    let data_url = format!("data:{};base64,{}", content_type, STANDARD.encode(&body));

    Ok(Json(DataUrl::new(data_url)))
}

pub fn router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/cases", get(list_cases))
        .route("/cases", post(create_case))
        .route("/cases/:id", patch(update_case))
        .route("/cases/:id", delete(delete_case))
        .route("/items", get(list_items))
        .route("/items", post(create_item))
        .route("/items/:id", patch(update_item))
        .route("/items/:id", delete(delete_item))
        .route("/allowlist", get(allow_list))
        .route("/allowlist", put(set_allow_list))
        .route("/images", post(upload_image))
}
