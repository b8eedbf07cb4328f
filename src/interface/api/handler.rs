use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Extension, Json, Path, Query, State,
    },
    http::{Method, StatusCode, Uri},
    response::IntoResponse,
};
use garde::Validate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::entity::{CreateTableRequest, Table, TableId, UpdateTableRequest};
use crate::domain::page::{Page, PageRequest, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use crate::interface::api::auth::Principal;
use crate::interface::api::error::ApiError;
use crate::interface::api::server::AppState;
use crate::VERSION;

/// 一覧取得のクエリパラメータ
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    page: Option<i64>,
    size: Option<i64>,
}

/// ヘルスチェックのレスポンス
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// ヘルスチェックハンドラー
pub async fn health_check_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            version: VERSION,
        }),
    )
}

/// Table作成ハンドラー
pub async fn create_table_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<CreateTableRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Table>), ApiError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let table = state.service.create_table(payload).await?;
    info!(principal = %principal, id = table.id, "table create handled");

    Ok((StatusCode::CREATED, Json(table)))
}

/// Table更新ハンドラー
pub async fn update_table_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    table_id: Result<Path<TableId>, PathRejection>,
    payload: Result<Json<UpdateTableRequest>, JsonRejection>,
) -> Result<Json<Table>, ApiError> {
    let Path(table_id) = table_id?;
    let Json(payload) = payload?;
    payload.validate()?;

    let table = state.service.update_table(table_id, payload).await?;
    info!(principal = %principal, id = table_id, "table update handled");

    Ok(Json(table))
}

/// Table取得ハンドラー
pub async fn find_table_handler(
    State(state): State<AppState>,
    table_id: Result<Path<TableId>, PathRejection>,
) -> Result<Json<Table>, ApiError> {
    let Path(table_id) = table_id?;
    let table = state.service.find_table(table_id).await?;
    Ok(Json(table))
}

/// Table一覧取得ハンドラー
pub async fn find_all_tables_handler(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Page<Table>>, ApiError> {
    let Query(params) = params?;
    let request = PageRequest::of(
        params.page.unwrap_or(DEFAULT_PAGE as i64),
        params.size.unwrap_or(DEFAULT_PAGE_SIZE as i64),
    );

    let page = state.service.find_all_tables(request).await?;
    Ok(Json(page))
}

/// Table削除ハンドラー
pub async fn delete_table_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    table_id: Result<Path<TableId>, PathRejection>,
) -> Result<Json<TableId>, ApiError> {
    let Path(table_id) = table_id?;
    let deleted = state.service.delete_table(table_id).await?;
    info!(principal = %principal, id = deleted, "table delete handled");
    Ok(Json(deleted))
}

/// ルートが存在しない場合のハンドラー
pub async fn not_found_handler(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}

/// ルートはあるがメソッドが登録されていない場合のハンドラー（405ではなく404を返す）
pub async fn method_not_routed_handler(method: Method, uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {} {}", method, uri.path()))
}
