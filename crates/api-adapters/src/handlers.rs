//! # Handlers
//!
//! Each handler translates one HTTP request into a service call and the
//! result back into a response. Business rules live in `services`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::{BadgeArtifact, BadgeRenderRequest, NewPickup, TemplateCode};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::info;

use crate::dto::{
    CreatePickupRequest, CreatePickupResponse, HealthResponse, PassQuery, PassView,
    PassesResponse, PickupStatusResponse, PickupsResponse, RefreshResponse, TemplatesResponse,
    VerifyRequest, VerifyResponse,
};
use crate::error::ApiError;
use crate::metrics::EXPOSITION_CONTENT_TYPE;
use crate::AppState;

type ApiResult<T> = Result<T, ApiError>;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn metrics(State(state): State<AppState>) -> ApiResult<Response> {
    let text = state
        .metrics
        .render()
        .map_err(|e| ApiError::Internal(format!("metrics encoding failed: {e}")))?;
    Ok(([(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)], text).into_response())
}

/// Fresh directory fetch; filtered by `q` against holder name and email.
pub async fn list_passes(
    State(state): State<AppState>,
    Query(query): Query<PassQuery>,
) -> ApiResult<Json<PassesResponse>> {
    let snapshot = state.directory.refresh().await?;

    let passes = match query.q.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => snapshot.search(q).into_iter().map(PassView::from).collect(),
        _ => snapshot.records.iter().map(PassView::from).collect(),
    };
    Ok(Json(PassesResponse { passes }))
}

pub async fn refresh_passes(State(state): State<AppState>) -> ApiResult<Json<RefreshResponse>> {
    let snapshot = state.directory.refresh().await?;
    Ok(Json(RefreshResponse {
        count: snapshot.len(),
        fetched_at: snapshot.fetched_at,
    }))
}

/// 200 when the code resolves, 404 with `found: false` when it does not.
pub async fn verify_qr(
    State(state): State<AppState>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<VerifyResponse>)> {
    let request = body(payload)?;
    let scanned = request.qr_code.trim().to_string();

    let resolution = match state.resolution.resolve(&scanned).await {
        Ok(resolution) => resolution,
        Err(e) => {
            state.metrics.record_resolution("error");
            return Err(e.into());
        }
    };
    state.metrics.record_resolution(resolution.outcome());

    let status = if resolution.is_found() {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };
    Ok((status, Json(VerifyResponse::new(scanned, &resolution))))
}

pub async fn list_pickups(State(state): State<AppState>) -> ApiResult<Json<PickupsResponse>> {
    let pickups = state.ledger.list().await?;
    Ok(Json(PickupsResponse { pickups }))
}

pub async fn pickup_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PickupStatusResponse>> {
    let pickup = state.ledger.find(&id).await?;
    Ok(Json(PickupStatusResponse {
        id,
        picked_up: pickup.is_some(),
        pickup,
    }))
}

/// Idempotent per id: a repeat returns the stored record with `alreadyPickedUp`.
pub async fn create_pickup(
    State(state): State<AppState>,
    payload: Result<Json<CreatePickupRequest>, JsonRejection>,
) -> ApiResult<Json<CreatePickupResponse>> {
    let request = body(payload)?;

    let mut pickup = NewPickup::new(request.id.trim());
    if let Some(name) = request.name {
        pickup = pickup.with_name(name);
    }
    if let Some(email) = request.email {
        pickup = pickup.with_email(email);
    }

    match state.ledger.try_append(pickup).await {
        Ok(outcome) => {
            let label = if outcome.is_appended() {
                "appended"
            } else {
                "already_present"
            };
            state.metrics.record_pickup(label);
            Ok(Json(CreatePickupResponse::from(outcome)))
        }
        Err(e) => {
            state.metrics.record_pickup("error");
            Err(e.into())
        }
    }
}

pub async fn list_templates() -> Json<TemplatesResponse> {
    Json(TemplatesResponse {
        templates: domains::catalog(),
    })
}

pub async fn template_preview(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Response> {
    let code: TemplateCode = code.parse()?;
    let image = state
        .assets
        .template_preview(code)
        .await
        .map_err(ApiError::PreviewUnavailable)?;

    let content_type = mime_guess::from_path(format!("template_{code}.png")).first_or(mime::IMAGE_PNG);
    Ok(([(header::CONTENT_TYPE, content_type.to_string())], image).into_response())
}

/// Streams the composed PDF back as a download.
pub async fn compose_badge(
    State(state): State<AppState>,
    payload: Result<Json<BadgeRenderRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let request = body(payload)?;
    let template = request.template_code;

    let artifact = match state.badges.compose(&request).await {
        Ok(artifact) => artifact,
        Err(e) => {
            let err = ApiError::from(e);
            state.metrics.record_badge(template.as_str(), err.code());
            return Err(err);
        }
    };
    state.metrics.record_badge(template.as_str(), "success");
    info!(template = %template, filename = %artifact.filename, "badge sent");

    let disposition = HeaderValue::from_str(&content_disposition(&artifact.filename))
        .map_err(|e| ApiError::Internal(format!("bad Content-Disposition: {e}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(BadgeArtifact::CONTENT_TYPE)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response())
}

/// RFC 5987 `attr-char`: everything else in `filename*` is percent-encoded.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// An attachment disposition with an ASCII `filename` for older clients and
/// the exact UTF-8 name in `filename*` (RFC 6266).
fn content_disposition(filename: &str) -> String {
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        header_safe(filename),
        utf8_percent_encode(filename, ATTR_CHAR)
    )
}

/// Keeps a filename inside a quoted header parameter.
fn header_safe(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_are_made_header_safe() {
        assert_eq!(header_safe("badge_Jane_Doe.pdf"), "badge_Jane_Doe.pdf");
        assert_eq!(header_safe("badge_Zoë_\"Z\".pdf"), "badge_Zo___Z_.pdf");
    }

    #[test]
    fn disposition_keeps_the_utf8_name_alongside_the_ascii_fallback() {
        assert_eq!(
            content_disposition("badge_Zoë_Doe.pdf"),
            "attachment; filename=\"badge_Zo__Doe.pdf\"; filename*=UTF-8''badge_Zo%C3%AB_Doe.pdf"
        );
        assert_eq!(
            content_disposition("badge_Li Wei (VIP).pdf"),
            "attachment; filename=\"badge_Li Wei (VIP).pdf\"; filename*=UTF-8''badge_Li%20Wei%20%28VIP%29.pdf"
        );
        assert!(HeaderValue::from_str(&content_disposition("badge_李.pdf")).is_ok());
    }
}
