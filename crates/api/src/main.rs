use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flatscore_core::domain::contract::{
    requested_years, ErrorEnvelope, MultiYearPredictRequest, MultiYearPredictResponse,
    PredictRequest, PredictResponse, RecommendRequest, RecommendResponse, YearPrediction,
};
use flatscore_core::engine::service::RecommendationService;
use flatscore_core::engine::EngineOptions;
use flatscore_core::error::RecommendError;
use flatscore_core::oracle::projection::{self, projection_from};
use flatscore_core::time::horizon;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = flatscore_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let service = match RecommendationService::from_settings(&settings, EngineOptions::from_env())
    {
        Ok(service) => Some(Arc::new(service)),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %format!("{e:#}"), "service setup failed; starting API in degraded mode");
            None
        }
    };

    let app = router(AppState { service });

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/recommend", post(recommend))
        .route("/predict", post(predict))
        .route("/predict/multi-year", post(predict_multi_year))
        .route("/options/towns", get(towns))
        .route("/options/flat_types", get(flat_types))
        .route("/options/flat_models", get(flat_models))
        .route("/locations/schools", get(schools))
        .route("/locations/poi-categories", get(poi_categories))
        .route("/locations/pois/:category", get(pois))
        .route("/locations/work-areas", get(work_areas))
        .route("/trend-multipliers", get(trend_multipliers))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    service: Option<Arc<RecommendationService>>,
}

type ApiError = (StatusCode, Json<ErrorEnvelope>);

fn failure(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorEnvelope::new(message)))
}

impl AppState {
    fn service(&self) -> Result<&RecommendationService, ApiError> {
        self.service.as_deref().ok_or_else(|| {
            failure(
                StatusCode::SERVICE_UNAVAILABLE,
                "recommendation service is not configured",
            )
        })
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(v)| v)
        .map_err(|rejection| failure(StatusCode::BAD_REQUEST, rejection.body_text()))
}

fn recommend_failure(err: &RecommendError) -> ApiError {
    let status = match err {
        RecommendError::InvalidCriteria(_) => StatusCode::BAD_REQUEST,
        RecommendError::DataUnavailable(inner) => {
            sentry_anyhow::capture_anyhow(inner);
            StatusCode::SERVICE_UNAVAILABLE
        }
        RecommendError::NoCandidatesScored { .. } => StatusCode::BAD_GATEWAY,
        RecommendError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
    };
    (status, Json(ErrorEnvelope::from(err)))
}

fn oracle_failure(err: anyhow::Error) -> ApiError {
    sentry_anyhow::capture_anyhow(&err);
    tracing::error!(error = %format!("{err:#}"), "valuation failed");
    failure(StatusCode::BAD_GATEWAY, format!("{err:#}"))
}

async fn recommend(
    State(state): State<AppState>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let service = state.service()?;
    let request = body(payload)?;

    let criteria = request
        .validate_and_into_criteria(service.catalog())
        .map_err(|e| recommend_failure(&e))?;
    let set = service
        .recommend(&criteria)
        .await
        .map_err(|e| recommend_failure(&e))?;

    Ok(Json(RecommendResponse::from(&set)))
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let service = state.service()?;
    let request = body(payload)?;

    request
        .unit
        .validate()
        .map_err(|e| failure(StatusCode::BAD_REQUEST, format!("{e:#}")))?;
    let explicit = request.year.map(|y| y.to_string());
    let year = horizon::resolve_target_year(explicit.as_deref(), Utc::now())
        .map_err(|e| failure(StatusCode::BAD_REQUEST, format!("{e:#}")))?;

    let valuation = service
        .oracle()
        .predict(&request.unit, year)
        .await
        .map_err(oracle_failure)?;
    let projection = projection_from(&request.unit, year, &valuation).map_err(oracle_failure)?;

    Ok(Json(PredictResponse::new(&valuation, &projection)))
}

async fn predict_multi_year(
    State(state): State<AppState>,
    payload: Result<Json<MultiYearPredictRequest>, JsonRejection>,
) -> Result<Json<MultiYearPredictResponse>, ApiError> {
    let service = state.service()?;
    let request = body(payload)?;

    let years = requested_years(request.years, horizon::BASE_YEAR)
        .and_then(|years| {
            request.unit.validate()?;
            projection::validate_years(&years)?;
            Ok(years)
        })
        .map_err(|e| failure(StatusCode::BAD_REQUEST, format!("{e:#}")))?;

    let trajectory = projection::project(service.oracle(), &request.unit, &years)
        .await
        .map_err(oracle_failure)?;

    Ok(Json(MultiYearPredictResponse {
        success: true,
        predictions: trajectory.iter().map(YearPrediction::from).collect(),
    }))
}

async fn towns(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    Ok(Json(json!({ "towns": state.service()?.catalog().towns() })))
}

async fn flat_types(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    Ok(Json(
        json!({ "flat_types": state.service()?.catalog().flat_types() }),
    ))
}

async fn flat_models(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    Ok(Json(
        json!({ "flat_models": state.service()?.catalog().flat_models() }),
    ))
}

async fn schools(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    Ok(Json(json!({ "schools": state.service()?.catalog().schools() })))
}

async fn poi_categories(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    Ok(Json(
        json!({ "categories": state.service()?.catalog().poi_categories() }),
    ))
}

async fn pois(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let pois = state.service()?.catalog().pois(&category);
    Ok(Json(json!({ "category": category, "pois": pois })))
}

async fn work_areas(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    Ok(Json(
        json!({ "work_areas": state.service()?.catalog().work_areas() }),
    ))
}

async fn trend_multipliers(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    Ok(Json(
        json!({ "trend_multipliers": state.service()?.trend_table() }),
    ))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &flatscore_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use flatscore_core::catalog::inventory::SeededInventory;
    use flatscore_core::catalog::Catalog;
    use flatscore_core::domain::unit::{
        AmenityDistances, FlatModel, FlatType, FloorAreaRange, StoreyRange, Town, UnitCandidate,
    };
    use flatscore_core::oracle::formula::FormulaOracle;
    use flatscore_core::oracle::{OracleKind, UnitDescription, Valuation, ValuationOracle};
    use tower::ServiceExt;

    struct BrokenOracle;

    #[async_trait::async_trait]
    impl ValuationOracle for BrokenOracle {
        fn kind(&self) -> OracleKind {
            OracleKind::Http
        }

        async fn predict(&self, _unit: &UnitDescription, _year: i32) -> anyhow::Result<Valuation> {
            anyhow::bail!("model service unreachable")
        }
    }

    fn segment(town: Town) -> UnitCandidate {
        UnitCandidate {
            town,
            flat_type: FlatType::FourRoom,
            flat_model: FlatModel::ModelA,
            storey_range: StoreyRange::new(7, 9).unwrap(),
            floor_area: FloorAreaRange::new(90.0, 100.0).unwrap(),
            lease_commence_year: 1995,
            coordinate: Some(town.profile().center),
            amenities: AmenityDistances {
                mrt: Some(0.5),
                ..Default::default()
            },
        }
    }

    fn state_with(oracle: Arc<dyn ValuationOracle>) -> AppState {
        let inventory = SeededInventory::new(vec![segment(Town::Bedok), segment(Town::Tampines)]);
        let service = RecommendationService::new(
            Arc::new(inventory),
            oracle,
            Arc::new(Catalog::default()),
            EngineOptions::default(),
        );
        AppState {
            service: Some(Arc::new(service)),
        }
    }

    fn app() -> Router {
        router(state_with(Arc::new(FormulaOracle::new())))
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(b) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn healthz_is_plain_ok() {
        let response = app()
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn recommend_ranks_seeded_inventory() {
        let (status, body) = send(
            app(),
            "POST",
            "/recommend",
            Some(json!({
                "targetYear": 2026,
                "budget": [400000, 700000],
                "towns": ["BEDOK", "TAMPINES"],
                "floorArea": [70, 120],
                "leaseRange": [30, 70],
                "maxDistances": {"mrt": 1.0}
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["total_candidates"], json!(2));
        assert_eq!(body["recommendations"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn recommend_with_no_matches_is_a_success() {
        let (status, body) = send(
            app(),
            "POST",
            "/recommend",
            Some(json!({"towns": ["YISHUN"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["total_candidates"], json!(0));
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn invalid_criteria_is_400_envelope() {
        let (status, body) = send(
            app(),
            "POST",
            "/recommend",
            Some(json!({"budget": [700000, 400000]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["kind"], json!("invalid_criteria"));
        assert!(body["error"].as_str().unwrap().contains("budget"));
    }

    #[tokio::test]
    async fn malformed_json_is_400_envelope() {
        let request = Request::builder()
            .method("POST")
            .uri("/recommend")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn total_oracle_failure_is_502() {
        let app = router(state_with(Arc::new(BrokenOracle)));
        let (status, body) = send(
            app,
            "POST",
            "/recommend",
            Some(json!({"leaseRange": [30, 99]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["kind"], json!("no_candidates_scored"));
    }

    #[tokio::test]
    async fn degraded_mode_is_503() {
        let app = router(AppState { service: None });
        let (status, body) = send(app, "POST", "/recommend", Some(json!({}))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn predict_single_year() {
        let (status, body) = send(
            app(),
            "POST",
            "/predict",
            Some(json!({
                "town": "BEDOK",
                "flat_type": "4 ROOM",
                "flat_model": "Model A",
                "floor_area_sqm": 95.0,
                "floor_level": 7,
                "lease_commence_year": 2000,
                "year": 2025
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["predicted_price"], json!(606_000.0));
        assert_eq!(body["formatted_price"], json!("$606,000"));
        assert_eq!(body["remaining_lease"], json!(74));
    }

    #[tokio::test]
    async fn predict_rejects_out_of_window_year() {
        let (status, _) = send(
            app(),
            "POST",
            "/predict",
            Some(json!({
                "town": "BEDOK",
                "flat_type": "4 ROOM",
                "flat_model": "Model A",
                "floor_area_sqm": 95.0,
                "floor_level": 7,
                "lease_commence_year": 2000,
                "year": 2040
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn multi_year_defaults_to_full_window() {
        let (status, body) = send(
            app(),
            "POST",
            "/predict/multi-year",
            Some(json!({
                "town": "TAMPINES",
                "flat_type": "5 ROOM",
                "flat_model": "Improved",
                "floor_area_sqm": 115.0,
                "floor_level": 10,
                "lease_commence_year": 1992
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let predictions = body["predictions"].as_array().unwrap();
        assert_eq!(predictions.len(), 6);
        assert_eq!(predictions[0]["year"], json!(2025));
        assert_eq!(predictions[0]["yoy_change"], json!(null));
        assert!(predictions[1]["yoy_change"].is_number());
    }

    #[tokio::test]
    async fn multi_year_rejects_unordered_years() {
        let (status, body) = send(
            app(),
            "POST",
            "/predict/multi-year",
            Some(json!({
                "town": "TAMPINES",
                "flat_type": "5 ROOM",
                "flat_model": "Improved",
                "floor_area_sqm": 115.0,
                "floor_level": 10,
                "lease_commence_year": 1992,
                "years": [2028, 2026]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("increasing"));
    }

    #[tokio::test]
    async fn catalog_endpoints() {
        let (status, body) = send(app(), "GET", "/options/towns", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["towns"].as_array().unwrap().len(), 26);

        let (_, body) = send(app(), "GET", "/locations/work-areas", None).await;
        assert!(!body["work_areas"].as_array().unwrap().is_empty());

        let (_, body) = send(app(), "GET", "/locations/pois/gym", None).await;
        assert_eq!(body["category"], json!("gym"));
        assert_eq!(body["pois"], json!([]));

        let (_, body) = send(app(), "GET", "/trend-multipliers", None).await;
        assert_eq!(body["trend_multipliers"], json!(null));
    }
}
