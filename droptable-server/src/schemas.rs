use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    Json,
};
use droptable_core::{PrimaryKey, Rarity};
use serde::{de::DeserializeOwned, Deserialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AdminLoginSchema {
    #[validate(length(max = 128))]
    pub login: String,
    #[validate(length(max = 64))]
    pub password: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewCaseSchema {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(range(min = 0))]
    pub price: i64,
    /// An emoji literal or an inline data: URL
    #[validate(length(min = 1))]
    pub image: String,
    #[validate(length(max = 1024))]
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdatedCaseSchema {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    #[validate(range(min = 0))]
    pub price: Option<i64>,
    #[validate(length(min = 1))]
    pub image: Option<String>,
    #[validate(length(max = 1024))]
    pub description: Option<String>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewItemSchema {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[schema(value_type = String, example = "legendary")]
    pub rarity: Rarity,
    #[validate(length(min = 1))]
    pub image: String,
    #[validate(range(min = 0))]
    pub price: i64,
    #[schema(value_type = i64)]
    pub case_id: PrimaryKey,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdatedItemSchema {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    #[schema(value_type = Option<String>, example = "epic")]
    pub rarity: Option<Rarity>,
    #[validate(length(min = 1))]
    pub image: Option<String>,
    #[validate(range(min = 0))]
    pub price: Option<i64>,
    #[schema(value_type = Option<i64>)]
    pub case_id: Option<PrimaryKey>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AllowListSchema {
    pub steam_ids: Vec<String>,
}

pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extracted_json: Json<T> = Json::from_request(req, state)
            .await
            .map_err(|_| (StatusCode::BAD_REQUEST, "JSON parse failed"))?;

        extracted_json
            .0
            .validate()
            .map_err(|_| (StatusCode::BAD_REQUEST, "Request body is invalid"))?;

        Ok(Self(extracted_json.0))
    }
}
