use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Auth: {}", .0)]
    Auth(#[from] fleet_core::auth::AuthError),

    #[error("Store: {}", .0)]
    Store(#[from] fleet_core::store::StoreError),

    #[error("Json: {}", .0)]
    Json(#[from] serde_json::Error),
}
