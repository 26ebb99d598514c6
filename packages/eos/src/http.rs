//! JSON-over-HTTP client for an EOS gateway.
//!
//! Endpoints (all relative to [`EosConfig::base_url`]):
//!
//! | Method | Path | Body | Response |
//! |---|---|---|---|
//! | `GET` | `/v1/health` | | `200` |
//! | `POST` | `/v1/session` | credentials | `{"token"}` |
//! | `POST` | `/v1/reduce` | region, catalog, formula, window, reducer | `{"value"}` |
//! | `POST` | `/v1/mask` | region, decision image, comparator, threshold | `{"mask_id"}` |
//! | `POST` | `/v1/area` | region, optional mask | `{"area_m2"}` |
//! | `POST` | `/v1/vectorize` | mask, region, effort | `{"url"}` |
//! | `POST` | `/v1/thumbnail` | region, decision image, vis params | `{"url"}` |
//!
//! Errors come back as `{"error": "...", "code": "..."}`. A `too_large`
//! code or HTTP 413 maps to [`EosError::TooLarge`]; 401/403 map to
//! [`EosError::Auth`].

use eo_anomaly_models::{AreaOfInterest, Comparator, TimeWindow};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{
    DecisionImage, EarthObservationService, EosConfig, EosError, MaskHandle, MaskRequest,
    ReduceRequest, Reducer, ThumbnailRequest, VectorEffort,
};

/// Maximum length of a response body included in error messages.
const BODY_PREVIEW_LEN: usize = 500;

/// Scale in metres requested for vectorization, matching the Sentinel-2
/// pixel size.
const VECTOR_SCALE_M: u32 = 10;

/// Pixel budget handed to the vectorizer.
const VECTOR_MAX_PIXELS: f64 = 1e8;

/// HTTP implementation of [`EarthObservationService`].
pub struct HttpEos {
    config: EosConfig,
    client: reqwest::Client,
    token: RwLock<Option<String>>,
}

impl HttpEos {
    /// Creates a client. No session is opened until
    /// [`EarthObservationService::reinitialize`] is called.
    ///
    /// # Errors
    ///
    /// Returns [`EosError::Http`] if the HTTP client cannot be built.
    pub fn new(config: EosConfig) -> Result<Self, EosError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            config,
            client,
            token: RwLock::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    async fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token.read().await.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, EosError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let request = self
            .authorized(self.client.post(self.url(path)).json(body))
            .await;
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(error_for_status(status.as_u16(), &text));
        }
        parse_body(&text)
    }

    /// Loads the private key when a service account is configured.
    /// A missing key file falls back to default credentials.
    async fn load_credentials(&self) -> WireSession {
        let Some(account) = &self.config.service_account else {
            return WireSession::default();
        };

        match tokio::fs::read_to_string(&self.config.private_key_file).await {
            Ok(private_key) => WireSession {
                service_account: Some(account.clone()),
                private_key: Some(private_key),
            },
            Err(e) => {
                log::warn!(
                    "Could not read EOS key file {}: {e}; using default credentials",
                    self.config.private_key_file.display()
                );
                WireSession::default()
            }
        }
    }
}

#[derive(Serialize)]
struct WireReduce<'a> {
    region: &'a AreaOfInterest,
    collection: &'static str,
    formula: &'a str,
    window: TimeWindow,
    reducer: &'static str,
    scale: u32,
}

#[derive(Serialize)]
struct WireImage<'a> {
    collection: &'static str,
    formula: &'a str,
    target: TimeWindow,
    #[serde(skip_serializing_if = "Option::is_none")]
    baseline: Option<TimeWindow>,
    scale: u32,
}

impl<'a> From<&DecisionImage<'a>> for WireImage<'a> {
    fn from(image: &DecisionImage<'a>) -> Self {
        Self {
            collection: image.collection.catalog_id(),
            formula: image.formula,
            target: image.target,
            baseline: image.baseline,
            scale: image.collection.native_scale_m(),
        }
    }
}

#[derive(Serialize)]
struct WireMask<'a> {
    region: &'a AreaOfInterest,
    image: WireImage<'a>,
    comparator: Comparator,
    threshold: f64,
}

#[derive(Serialize)]
struct WireArea<'a> {
    region: &'a AreaOfInterest,
    #[serde(skip_serializing_if = "Option::is_none")]
    mask_id: Option<&'a str>,
}

#[derive(Serialize)]
struct WireVectorize<'a> {
    mask_id: &'a str,
    region: &'a AreaOfInterest,
    geometry_type: &'static str,
    eight_connected: bool,
    scale: u32,
    max_pixels: f64,
    best_effort: bool,
}

#[derive(Serialize)]
struct WireThumbnail<'a> {
    region: &'a AreaOfInterest,
    image: WireImage<'a>,
    min: f64,
    max: f64,
    palette: &'a [String],
    scale: u32,
    format: &'static str,
}

#[derive(Default, Serialize)]
struct WireSession {
    #[serde(skip_serializing_if = "Option::is_none")]
    service_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    private_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ValueResponse {
    value: Option<f64>,
}

#[derive(Deserialize)]
struct MaskResponse {
    mask_id: String,
}

#[derive(Deserialize)]
struct AreaResponse {
    area_m2: f64,
}

#[derive(Deserialize)]
struct UrlResponse {
    url: Option<String>,
}

#[derive(Deserialize)]
struct SessionResponse {
    token: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    code: Option<String>,
}

const fn reducer_name(reducer: Reducer) -> &'static str {
    match reducer {
        Reducer::Mean => "mean",
        Reducer::StdDev => "std_dev",
    }
}

#[async_trait::async_trait]
impl EarthObservationService for HttpEos {
    async fn reduce(&self, request: &ReduceRequest<'_>) -> Result<Option<f64>, EosError> {
        let body = WireReduce {
            region: request.region,
            collection: request.collection.catalog_id(),
            formula: request.formula,
            window: request.window,
            reducer: reducer_name(request.reducer),
            scale: request.collection.native_scale_m(),
        };
        let response: ValueResponse = self.post_json("/v1/reduce", &body).await?;
        Ok(response.value.filter(|v| v.is_finite()))
    }

    async fn mask(&self, request: &MaskRequest<'_>) -> Result<MaskHandle, EosError> {
        let body = WireMask {
            region: request.region,
            image: WireImage::from(&request.image),
            comparator: request.comparator,
            threshold: request.threshold,
        };
        let response: MaskResponse = self.post_json("/v1/mask", &body).await?;
        Ok(MaskHandle(response.mask_id))
    }

    async fn area_sum(
        &self,
        region: &AreaOfInterest,
        mask: Option<&MaskHandle>,
    ) -> Result<f64, EosError> {
        let body = WireArea {
            region,
            mask_id: mask.map(MaskHandle::as_str),
        };
        let response: AreaResponse = self.post_json("/v1/area", &body).await?;
        Ok(response.area_m2)
    }

    async fn vectorize(
        &self,
        mask: &MaskHandle,
        region: &AreaOfInterest,
        effort: VectorEffort,
    ) -> Result<Option<String>, EosError> {
        let body = WireVectorize {
            mask_id: mask.as_str(),
            region,
            geometry_type: "polygon",
            eight_connected: true,
            scale: VECTOR_SCALE_M,
            max_pixels: VECTOR_MAX_PIXELS,
            best_effort: effort == VectorEffort::BestEffort,
        };
        let response: UrlResponse = self.post_json("/v1/vectorize", &body).await?;
        Ok(response.url.filter(|u| !u.is_empty()))
    }

    async fn thumbnail(&self, request: &ThumbnailRequest<'_>) -> Result<Option<String>, EosError> {
        let body = WireThumbnail {
            region: request.region,
            image: WireImage::from(&request.image),
            min: request.vis.min,
            max: request.vis.max,
            palette: &request.vis.palette,
            scale: request.scale_m,
            format: "png",
        };
        let response: UrlResponse = self.post_json("/v1/thumbnail", &body).await?;
        Ok(response.url.filter(|u| !u.is_empty()))
    }

    async fn ping(&self) -> Result<(), EosError> {
        if self.token.read().await.is_none() {
            return Err(EosError::Auth {
                message: "no session".to_string(),
            });
        }
        let request = self.authorized(self.client.get(self.url("/v1/health"))).await;
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let text = response.text().await.unwrap_or_default();
        Err(error_for_status(status.as_u16(), &text))
    }

    async fn reinitialize(&self) -> Result<(), EosError> {
        let credentials = self.load_credentials().await;
        let mode = if credentials.service_account.is_some() {
            "service account"
        } else {
            "default credentials"
        };

        let response = self
            .client
            .post(self.url("/v1/session"))
            .json(&credentials)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(error_for_status(status.as_u16(), &text));
        }

        let session: SessionResponse = parse_body(&text)?;
        *self.token.write().await = Some(session.token);
        log::info!("EOS session opened with {mode}");
        Ok(())
    }
}

/// Maps a non-success response to an [`EosError`].
fn error_for_status(status: u16, body: &str) -> EosError {
    let (message, code) = serde_json::from_str::<ErrorBody>(body).map_or_else(
        |_| (preview(body), None),
        |parsed| (parsed.error, parsed.code),
    );

    match status {
        401 | 403 => EosError::Auth { message },
        413 => EosError::TooLarge { message },
        _ if code.as_deref() == Some("too_large") => EosError::TooLarge { message },
        _ => EosError::Status { status, message },
    }
}

/// Parses a JSON response body.
fn parse_body<R: DeserializeOwned>(text: &str) -> Result<R, EosError> {
    serde_json::from_str(text).map_err(|e| EosError::Parse {
        message: format!("{e} (body: {})", preview(text)),
    })
}

fn preview(text: &str) -> String {
    if text.chars().count() > BODY_PREVIEW_LEN {
        let head: String = text.chars().take(BODY_PREVIEW_LEN).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}
