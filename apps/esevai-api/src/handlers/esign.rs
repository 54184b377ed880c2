//! E-sign endpoint: stamp signature images onto an output PDF

use axum::{extract::State, Json};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use esign_utils::{decode_data_url, page_count, sign_pdf, SignOptions, SignaturePlacement};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::{EsignRequest, EsignResponse};
use crate::state::AppState;

fn build_placements(req: &EsignRequest) -> Result<Vec<SignaturePlacement>, ApiError> {
    req.signatures
        .iter()
        .enumerate()
        .map(|(i, sig)| {
            let image = decode_data_url(&sig.image)
                .map_err(|e| ApiError::InvalidRequest(format!("signatures[{}]: {}", i, e)))?;
            Ok(SignaturePlacement {
                page: sig.page,
                x: sig.x,
                y: sig.y,
                width: sig.width,
                height: sig.height,
                viewport: sig.viewport,
                image,
            })
        })
        .collect()
}

pub async fn esign(
    State(_state): State<Arc<AppState>>,
    Json(req): Json<EsignRequest>,
) -> Result<Json<EsignResponse>, ApiError> {
    let pdf = BASE64
        .decode(req.pdf_base64.trim())
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid PDF base64: {}", e)))?;
    let placements = build_placements(&req)?;
    let options = SignOptions {
        timestamp: req.timestamp,
        signer_name: req.signer_name.clone(),
        ..SignOptions::default()
    };

    // lopdf work is CPU bound
    let signed = tokio::task::spawn_blocking(move || sign_pdf(&pdf, &placements, &options))
        .await
        .map_err(|e| ApiError::Internal(e.into()))??;

    let pages = page_count(&signed)?;
    let sha256 = hex::encode(Sha256::digest(&signed));

    tracing::info!(
        "Signed PDF: {} signature(s), {} page(s), sha256 {}",
        req.signatures.len(),
        pages,
        sha256
    );

    Ok(Json(EsignResponse {
        pdf_base64: BASE64.encode(&signed),
        sha256,
        page_count: pages,
        signatures_applied: req.signatures.len(),
    }))
}
