use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use devote_consensus::{ChainReader, Devote};
use devote_core::Header;
use devote_payments::MasternodePayments;
use devote_state::Storage;
use serde::Serialize;

use crate::error::RpcError;

/// Application state shared with handlers
pub struct AppState<S: Storage> {
    pub engine: Arc<Devote<S>>,
    pub chain: Arc<dyn ChainReader>,
    pub payments: Arc<MasternodePayments>,
}

// Response types

#[derive(Debug, Serialize)]
pub struct HeaderResponse {
    pub number: u64,
    pub hash: String,
    pub parent_hash: String,
    pub timestamp: u64,
    pub witness: String,
    pub difficulty: u64,
}

impl From<&Header> for HeaderResponse {
    fn from(header: &Header) -> Self {
        HeaderResponse {
            number: header.number,
            hash: header.hash().to_hex(),
            parent_hash: header.parent_hash.to_hex(),
            timestamp: header.timestamp,
            witness: header.witness.to_string(),
            difficulty: header.difficulty,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WitnessResponse {
    pub timestamp: u64,
    pub witness: String,
}

#[derive(Debug, Serialize)]
pub struct WinnerResponse {
    pub height: u64,
    pub winner: String,
}

// Handlers

/// GET /consensus/confirmed - latest irreversible header
pub async fn get_confirmed<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<HeaderResponse>, RpcError> {
    let header = state.engine.confirmed_header(state.chain.as_ref())?;
    Ok(Json(HeaderResponse::from(&header)))
}

/// GET /consensus/witness/{timestamp} - witness scheduled at a timestamp
pub async fn get_witness<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(timestamp): Path<u64>,
) -> Result<Json<WitnessResponse>, RpcError> {
    let witness = state.engine.scheduled_witness(state.chain.as_ref(), timestamp)?;
    Ok(Json(WitnessResponse {
        timestamp,
        witness: witness.to_string(),
    }))
}

/// GET /payments/winner/{height} - plurality payment winner at a height
pub async fn get_payment_winner<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(height): Path<u64>,
) -> Result<Json<WinnerResponse>, RpcError> {
    let winner = state
        .payments
        .best(height)
        .ok_or_else(|| RpcError::NotFound(format!("no payment votes at height {height}")))?;
    Ok(Json(WinnerResponse {
        height,
        winner: winner.to_string(),
    }))
}
