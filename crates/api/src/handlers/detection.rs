//! Handlers for the detection helpers: spreadsheet country detection and
//! free-text date-range parsing.

use std::path::Path;

use axum::extract::{Multipart, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::warn;
use uuid::Uuid;
use varia_core::countries::{is_supported_country, FALLBACK_COUNTRY};
use varia_core::error::CoreError;
use varia_engine::{resolve_interpreter, run, EngineCommand};

use crate::error::{AppError, AppResult};
use crate::genai;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CountryResponse {
    pub country: String,
}

#[derive(Debug, Deserialize)]
pub struct DateRangeRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub raw_text: String,
}

/// POST /api/v1/detect-country
///
/// Runs the country detector over one uploaded spreadsheet. Detection is
/// best-effort: an engine failure or unrecognized output falls back to the
/// default country instead of failing the request. The staged copy of the
/// upload is removed before answering.
pub async fn detect_country(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<CountryResponse>> {
    let mut upload: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                upload = Some(data.to_vec());
            }
            _ => {} // ignore unknown fields
        }
    }

    let bytes = upload
        .ok_or_else(|| CoreError::Validation("missing required 'file' field".to_string()))?;

    fs::create_dir_all(&state.config.scratch_dir)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    let path = state
        .config
        .scratch_dir
        .join(format!("detect_country_{}.xlsx", Uuid::new_v4()));
    fs::write(&path, &bytes)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    let country = run_detection(&state, &path).await;

    if let Err(err) = fs::remove_file(&path).await {
        warn!(path = %path.display(), error = %err, "failed to remove detection input");
    }

    Ok(Json(CountryResponse { country }))
}

/// Run the detector and normalize its verdict, swallowing failures into
/// the fallback country.
async fn run_detection(state: &AppState, input: &Path) -> String {
    let config = &state.config;
    let mut cmd = EngineCommand::new(
        "country detection",
        resolve_interpreter(config.python_bin.as_deref()),
    )
    .arg(config.detect_script.to_string_lossy())
    .arg(input.to_string_lossy())
    .timeout(config.engine_timeout());
    if let Some(key) = &config.genai_api_key {
        cmd = cmd.env("GEMINI_API_KEY", key);
    }

    match run::run_captured(&cmd).await {
        Ok(code) if is_supported_country(&code) => code,
        Ok(code) => {
            warn!(code = %code, "detector returned an unsupported country, using fallback");
            FALLBACK_COUNTRY.to_string()
        }
        Err(err) => {
            warn!(error = %err, "country detection failed, using fallback");
            FALLBACK_COUNTRY.to_string()
        }
    }
}

/// POST /api/v1/parse-date-range
///
/// Asks the generative model to pull a start/end date pair out of free
/// text (usually a report filename). An unusable reply is not an error:
/// the response carries `success: false` plus the raw reply for debugging.
pub async fn parse_date_range(
    State(state): State<AppState>,
    Json(request): Json<DateRangeRequest>,
) -> AppResult<Json<DateRangeResponse>> {
    if request.text.trim().is_empty() {
        return Err(CoreError::Validation("text must not be empty".to_string()).into());
    }

    let reply = genai::generate_text(&state, &date_range_prompt(&request.text)).await?;

    let parsed = genai::extract_json_object(&reply)
        .and_then(|span| serde_json::from_str::<serde_json::Value>(span).ok());

    let response = match parsed {
        Some(date_range) => DateRangeResponse {
            success: true,
            date_range: Some(date_range),
            error: None,
            raw_text: reply,
        },
        None => {
            warn!(reply = %reply, "model reply contained no parseable JSON object");
            DateRangeResponse {
                success: false,
                date_range: None,
                error: Some("model reply contained no parseable JSON object".to_string()),
                raw_text: reply,
            }
        }
    };
    Ok(Json(response))
}

fn date_range_prompt(text: &str) -> String {
    format!(
        "Extract the date range from the following text and answer with a single JSON object \
         only, no prose and no markdown. Use the keys \"startDate\" and \"endDate\" with values \
         in YYYY-MM-DD format; use null for a bound that cannot be determined.\n\
         \n\
         Examples:\n\
         Text: \"Report 1st May to 14th May 2024\" -> {{\"startDate\": \"2024-05-01\", \"endDate\": \"2024-05-14\"}}\n\
         Text: \"data_2024-03.xlsx\" -> {{\"startDate\": \"2024-03-01\", \"endDate\": \"2024-03-31\"}}\n\
         Text: \"weekly numbers\" -> {{\"startDate\": null, \"endDate\": null}}\n\
         \n\
         Text: \"{text}\""
    )
}
