//! HTTP handler functions for the analysis API.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use eo_anomaly::{AnalysisError, AnalysisRequest};
use eo_anomaly_models::AreaOfInterest;
use eo_anomaly_server_models::{ApiAnalysisRequest, ApiAnalysisResponse, ApiError, ApiHealth};
use uuid::Uuid;

use crate::AppState;

/// `GET /api/v1/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /api/v1/analyze`
///
/// Validates the request, runs the anomaly pipeline and returns the fused
/// risk assessment.
pub async fn analyze(
    state: web::Data<AppState>,
    body: web::Json<ApiAnalysisRequest>,
) -> HttpResponse {
    let analysis_id = Uuid::new_v4();

    let request = match to_request(&body) {
        Ok(request) => request,
        Err(e) => return error_response(analysis_id, &e),
    };

    log::info!(
        "[{analysis_id}] Analyzing {}..{} ({:?})",
        request.target.start(),
        request.target.end(),
        request.satellite
    );

    match eo_anomaly::analyze(state.eos.as_ref(), &request, &state.settings).await {
        Ok(assessment) => {
            log::info!(
                "[{analysis_id}] {} ({:.2})",
                assessment.risk_level,
                assessment.risk_score
            );
            HttpResponse::Ok().json(ApiAnalysisResponse::new(analysis_id.to_string(), assessment))
        }
        Err(e) => error_response(analysis_id, &e),
    }
}

fn to_request(body: &ApiAnalysisRequest) -> Result<AnalysisRequest, AnalysisError> {
    let aoi = AreaOfInterest::from_geojson(&body.aoi)?;
    AnalysisRequest::new(
        aoi,
        &body.start_date,
        &body.end_date,
        body.satellite.as_deref(),
    )
}

/// Validation failures are the caller's fault, computation failures are
/// about the data, and service failures are ours.
const fn status_for(error: &AnalysisError) -> StatusCode {
    match error {
        AnalysisError::InvalidGeometry(_)
        | AnalysisError::InvalidTimeWindow(_)
        | AnalysisError::UnsupportedSatellite(_) => StatusCode::BAD_REQUEST,
        AnalysisError::ComputationUnavailable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AnalysisError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn error_response(analysis_id: Uuid, error: &AnalysisError) -> HttpResponse {
    let status = status_for(error);
    if status.is_server_error() {
        log::error!("[{analysis_id}] Analysis failed: {error}");
    } else {
        log::warn!("[{analysis_id}] Analysis rejected: {error}");
    }
    HttpResponse::build(status)
        .json(ApiError::new(error.to_string()).with_analysis_id(analysis_id.to_string()))
}
