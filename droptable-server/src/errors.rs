use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use droptable_core::{
    AuthError, CatalogError, IdentityError, InventoryError, RewardError, StorageError, UnboxError,
    WalletError,
};

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{resource}:{identifier} not found")]
    NotFound {
        resource: &'static str,
        identifier: i64,
    },
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Session does not exist or has expired")]
    Unauthorized,
    #[error("Balance doesn't cover the price")]
    InsufficientFunds,
    #[error("An opening is already in progress")]
    OpeningInProgress,
    #[error("The case has no items to draw from")]
    EmptyRewardPool,
    #[error("Request body is invalid: {0}")]
    InvalidInput(String),
    #[error("Identity provider unavailable: {0}")]
    IdentityUnavailable(String),
    #[error("Unknown internal error: {0}")]
    Unknown(String),
}

impl ServerError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidCredentials => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InsufficientFunds => StatusCode::PAYMENT_REQUIRED,
            Self::OpeningInProgress => StatusCode::CONFLICT,
            Self::EmptyRewardPool => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::IdentityUnavailable(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.as_status_code(), self.to_string()).into_response()
    }
}

impl From<CatalogError> for ServerError {
    fn from(value: CatalogError) -> Self {
        match value {
            CatalogError::NotFound {
                resource,
                identifier,
            } => Self::NotFound {
                resource,
                identifier,
            },
            CatalogError::NegativePrice => Self::InvalidInput(value.to_string()),
            e => Self::Unknown(e.to_string()),
        }
    }
}

impl From<WalletError> for ServerError {
    fn from(value: WalletError) -> Self {
        match value {
            WalletError::InsufficientFunds { .. } => Self::InsufficientFunds,
            WalletError::NegativeAmount => Self::InvalidInput(value.to_string()),
            e => Self::Unknown(e.to_string()),
        }
    }
}

impl From<InventoryError> for ServerError {
    fn from(value: InventoryError) -> Self {
        match value {
            InventoryError::NotFound { entry_id } => Self::NotFound {
                resource: "entry",
                identifier: entry_id,
            },
            e => Self::Unknown(e.to_string()),
        }
    }
}

impl From<UnboxError> for ServerError {
    fn from(value: UnboxError) -> Self {
        match value {
            UnboxError::OpeningInProgress => Self::OpeningInProgress,
            UnboxError::Catalog(e) => e.into(),
            UnboxError::Wallet(e) => e.into(),
            UnboxError::Inventory(e) => e.into(),
            UnboxError::Reward(RewardError::EmptyPool { .. }) => Self::EmptyRewardPool,
            e => Self::Unknown(e.to_string()),
        }
    }
}

impl From<AuthError> for ServerError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::InvalidCredentials | AuthError::GrantUnavailable => {
                Self::InvalidCredentials
            }
            AuthError::UnknownSession => Self::Unauthorized,
            AuthError::Identity(e) => e.into(),
            e => Self::Unknown(e.to_string()),
        }
    }
}

impl From<IdentityError> for ServerError {
    fn from(value: IdentityError) -> Self {
        match value {
            IdentityError::Unreachable(reason) => Self::IdentityUnavailable(reason),
            IdentityError::MissingClaimedId | IdentityError::ProfileNotFound => {
                Self::InvalidCredentials
            }
        }
    }
}

impl From<StorageError> for ServerError {
    fn from(value: StorageError) -> Self {
        Self::Unknown(value.to_string())
    }
}
