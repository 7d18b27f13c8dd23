//! Client name lookup route.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LookupParams {
    #[serde(default)]
    pub rut: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResponse {
    pub client_name: String,
}

/// `GET /api/clients/lookup?rut=…`. Never fails; a miss is an empty name.
pub async fn lookup(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LookupParams>,
) -> Json<LookupResponse> {
    let client_name = state.directory.lookup(&params.rut).await;
    Json(LookupResponse { client_name })
}
