//! HTTP surface over a single in-memory [`LabStore`].
//!
//! Every handler locks the store for the duration of one operation, so requests are
//! applied one at a time. Errors are returned as `{"error": "..."}` with the status
//! chosen by [`ApiError`].

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use lims_core::{
    Equipment, EquipmentStats, EquipmentStatus, InventoryItem, InventoryStats, LabError,
    LabStore, LabSummary, MaintenanceRecord, MoveDirection, NewEquipment, NewInventoryItem,
    NewPatient, NewSample, NewSection, NewTestDefinition, NonEmptyText, ResultCounts, ResultSet,
    ReviewDecision, Role, Sample, SamplePatch, SampleStatus, StockStatus, TestDefinitionPatch,
    elapsed_label, views_for,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use utoipa::{OpenApi, ToSchema};

/// Application state shared across REST API handlers
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<LabStore>>,
}

impl AppState {
    pub fn new(store: LabStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_tests,
        create_test,
        update_test,
        delete_test,
        list_patients,
        create_patient,
        list_samples,
        create_sample,
        get_sample,
        update_sample,
        change_status,
        record_results,
        review_results,
        summary,
        role_views,
        list_inventory,
        create_inventory_item,
        adjust_stock,
        list_equipment,
        create_equipment,
        change_equipment_status,
        maintenance_history,
        record_maintenance,
        list_templates,
        create_template,
        delete_template,
        add_section,
        delete_section,
        move_section,
        sample_report,
    ),
    components(schemas(
        HealthRes,
        ErrorBody,
        StatusChangeReq,
        ResultEntryReq,
        ReviewReq,
        StockAdjustReq,
        EquipmentStatusReq,
        NewTemplateReq,
        MoveSectionReq,
    ))
)]
struct ApiDoc;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi))
        .route("/tests", get(list_tests).post(create_test))
        .route("/tests/:id", patch(update_test).delete(delete_test))
        .route("/patients", get(list_patients).post(create_patient))
        .route("/samples", get(list_samples).post(create_sample))
        .route("/samples/:id", get(get_sample).patch(update_sample))
        .route("/samples/:id/status", post(change_status))
        .route("/samples/:id/results", post(record_results))
        .route("/samples/:id/review", post(review_results))
        .route("/summary", get(summary))
        .route("/roles/:role/views", get(role_views))
        .route("/inventory", get(list_inventory).post(create_inventory_item))
        .route("/inventory/:id/adjust", post(adjust_stock))
        .route("/equipment", get(list_equipment).post(create_equipment))
        .route("/equipment/:id/status", post(change_equipment_status))
        .route(
            "/equipment/:id/maintenance",
            get(maintenance_history).post(record_maintenance),
        )
        .route("/reports/templates", get(list_templates).post(create_template))
        .route("/reports/templates/:id", delete(delete_template))
        .route("/reports/templates/:id/sections", post(add_section))
        .route(
            "/reports/templates/:id/sections/:section_id",
            delete(delete_section),
        )
        .route(
            "/reports/templates/:id/sections/:section_id/move",
            post(move_section),
        )
        .route("/samples/:id/report", get(sample_report))
        .with_state(state)
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    error: String,
}

/// A [`LabError`] rendered as an HTTP response.
pub struct ApiError(LabError);

impl From<LabError> for ApiError {
    fn from(err: LabError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            LabError::TestNotFound(_)
            | LabError::SampleNotFound(_)
            | LabError::PatientNotFound(_)
            | LabError::InventoryItemNotFound(_)
            | LabError::EquipmentNotFound(_)
            | LabError::PanelNotFound(_)
            | LabError::ResultNotFound(_)
            | LabError::TemplateNotFound(_)
            | LabError::SectionNotFound { .. }
            | LabError::UnknownRole(_) => StatusCode::NOT_FOUND,
            LabError::InvalidInput(_)
            | LabError::Text(_)
            | LabError::Id(_)
            | LabError::UnknownTransitionPolicy(_) => StatusCode::BAD_REQUEST,
            LabError::TestInUse { .. }
            | LabError::IllegalTransition { .. }
            | LabError::InvalidReviewState { .. }
            | LabError::ResultsLocked { .. } => StatusCode::CONFLICT,
            LabError::Wire(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self.0);
        } else {
            tracing::debug!(%status, "request rejected: {}", self.0);
        }
        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// Request and response bodies
// ============================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthRes {
    ok: bool,
    message: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct StatusChangeReq {
    #[schema(value_type = String, example = "processing")]
    status: SampleStatus,
}

/// A measurement as typed by the technician, or already as a number.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawMeasurement {
    Number(f64),
    Text(String),
}

#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ResultEntryReq {
    #[schema(value_type = String)]
    technician: NonEmptyText,
    #[serde(default)]
    #[schema(value_type = Object)]
    values: BTreeMap<String, RawMeasurement>,
    #[serde(default)]
    comments: BTreeMap<String, String>,
    #[serde(default)]
    interpretation: Option<String>,
    /// Submit for review instead of saving a draft.
    #[serde(default)]
    submit: bool,
}

#[derive(Serialize)]
struct ResultEntryRes {
    result_set: ResultSet,
    counts: ResultCounts,
    /// Unknown parameters or unparseable values.
    ignored_values: Vec<String>,
    /// Comments on parameters without a recorded value.
    ignored_comments: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ReviewReq {
    #[schema(value_type = String)]
    reviewer: NonEmptyText,
    #[schema(value_type = String, example = "approve")]
    decision: ReviewDecision,
}

#[derive(Deserialize)]
struct SampleQuery {
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    status: Option<SampleStatus>,
}

#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct StockAdjustReq {
    delta: i64,
}

#[derive(Serialize)]
struct SampleRow {
    #[serde(flatten)]
    sample: Sample,
    elapsed: String,
}

impl SampleRow {
    fn new(sample: Sample, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            elapsed: elapsed_label(sample.received_at, now),
            sample,
        }
    }
}

#[derive(Serialize)]
struct InventoryRes {
    items: Vec<InventoryRow>,
    stats: InventoryStats,
}

#[derive(Serialize)]
struct InventoryRow {
    #[serde(flatten)]
    item: InventoryItem,
    status: StockStatus,
    days_until_expiry: Option<i64>,
    expiry_label: Option<String>,
}

#[derive(Serialize)]
struct EquipmentRes {
    equipment: Vec<EquipmentRow>,
    stats: EquipmentStats,
}

#[derive(Serialize)]
struct EquipmentRow {
    #[serde(flatten)]
    equipment: Equipment,
    days_until_maintenance: i64,
    maintenance_label: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct EquipmentStatusReq {
    #[schema(value_type = String, example = "calibration")]
    status: EquipmentStatus,
}

#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct NewTemplateReq {
    #[schema(value_type = String)]
    name: NonEmptyText,
    #[serde(default)]
    category: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct MoveSectionReq {
    #[schema(value_type = String, example = "up")]
    direction: MoveDirection,
}

#[derive(Deserialize)]
struct ReportQuery {
    #[serde(default = "default_template")]
    template: String,
}

fn default_template() -> String {
    "RT001".to_owned()
}

// ============================================================================
// Handlers
// ============================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "LIMS REST API is alive".into(),
    })
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[utoipa::path(get, path = "/tests", responses((status = 200, description = "Test catalog")))]
async fn list_tests(State(state): State<AppState>) -> impl IntoResponse {
    let lab = state.store.lock().await;
    Json(lab.catalog().list().to_vec())
}

#[utoipa::path(
    post,
    path = "/tests",
    responses(
        (status = 201, description = "Test added to the catalog"),
        (status = 422, description = "Malformed test definition")
    )
)]
async fn create_test(
    State(state): State<AppState>,
    Json(req): Json<NewTestDefinition>,
) -> impl IntoResponse {
    let mut lab = state.store.lock().await;
    (StatusCode::CREATED, Json(lab.add_test(req)))
}

#[utoipa::path(
    patch,
    path = "/tests/{id}",
    params(("id" = String, Path, description = "Catalog test id")),
    responses(
        (status = 200, description = "Updated test definition"),
        (status = 404, description = "Unknown test", body = ErrorBody)
    )
)]
async fn update_test(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<TestDefinitionPatch>,
) -> ApiResult<impl IntoResponse> {
    let mut lab = state.store.lock().await;
    let updated = lab
        .catalog_mut()
        .update(&id, patch)
        .ok_or(LabError::TestNotFound(id))?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/tests/{id}",
    params(("id" = String, Path, description = "Catalog test id")),
    responses(
        (status = 204, description = "Test removed"),
        (status = 404, description = "Unknown test", body = ErrorBody),
        (status = 409, description = "Test referenced by samples", body = ErrorBody)
    )
)]
async fn delete_test(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let mut lab = state.store.lock().await;
    lab.delete_test(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/patients", responses((status = 200, description = "Registered patients")))]
async fn list_patients(State(state): State<AppState>) -> impl IntoResponse {
    let lab = state.store.lock().await;
    Json(lab.patients().list().to_vec())
}

#[utoipa::path(
    post,
    path = "/patients",
    responses((status = 201, description = "Patient registered"))
)]
async fn create_patient(
    State(state): State<AppState>,
    Json(req): Json<NewPatient>,
) -> impl IntoResponse {
    let mut lab = state.store.lock().await;
    (StatusCode::CREATED, Json(lab.register_patient(req)))
}

#[utoipa::path(
    get,
    path = "/samples",
    params(
        ("q" = Option<String>, Query, description = "Matches sample id, patient name or test name"),
        ("status" = Option<String>, Query, description = "Exact lifecycle status")
    ),
    responses((status = 200, description = "Matching samples"))
)]
async fn list_samples(
    State(state): State<AppState>,
    Query(query): Query<SampleQuery>,
) -> impl IntoResponse {
    let lab = state.store.lock().await;
    let now = chrono::Utc::now();
    let found: Vec<_> = lab
        .search(query.q.as_deref().unwrap_or_default(), query.status)
        .into_iter()
        .map(|sample| SampleRow::new(sample.clone(), now))
        .collect();
    Json(found)
}

#[utoipa::path(
    post,
    path = "/samples",
    responses(
        (status = 201, description = "Sample received"),
        (status = 400, description = "Inactive test or missing patient", body = ErrorBody),
        (status = 404, description = "Unknown test", body = ErrorBody)
    )
)]
async fn create_sample(
    State(state): State<AppState>,
    Json(req): Json<NewSample>,
) -> ApiResult<impl IntoResponse> {
    let mut lab = state.store.lock().await;
    let sample = lab.intake(req)?;
    Ok((StatusCode::CREATED, Json(sample)))
}

#[utoipa::path(
    get,
    path = "/samples/{id}",
    params(("id" = String, Path, description = "Sample id")),
    responses(
        (status = 200, description = "Sample"),
        (status = 404, description = "Unknown sample", body = ErrorBody)
    )
)]
async fn get_sample(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let lab = state.store.lock().await;
    let sample = lab
        .samples()
        .get_by_id(&id)
        .cloned()
        .ok_or(LabError::SampleNotFound(id))?;
    Ok(Json(SampleRow::new(sample, chrono::Utc::now())))
}

#[utoipa::path(
    patch,
    path = "/samples/{id}",
    params(("id" = String, Path, description = "Sample id")),
    responses(
        (status = 200, description = "Sample after the raw field merge"),
        (status = 404, description = "Unknown sample", body = ErrorBody)
    )
)]
async fn update_sample(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<SamplePatch>,
) -> ApiResult<impl IntoResponse> {
    let mut lab = state.store.lock().await;
    let sample = lab
        .update_sample(&id, patch)
        .ok_or(LabError::SampleNotFound(id))?;
    Ok(Json(sample))
}

#[utoipa::path(
    post,
    path = "/samples/{id}/status",
    params(("id" = String, Path, description = "Sample id")),
    request_body = StatusChangeReq,
    responses(
        (status = 200, description = "Sample after the transition"),
        (status = 404, description = "Unknown sample", body = ErrorBody),
        (status = 409, description = "Transition not allowed", body = ErrorBody)
    )
)]
async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StatusChangeReq>,
) -> ApiResult<impl IntoResponse> {
    let mut lab = state.store.lock().await;
    Ok(Json(lab.transition(&id, req.status)?))
}

#[utoipa::path(
    post,
    path = "/samples/{id}/results",
    params(("id" = String, Path, description = "Sample id")),
    request_body = ResultEntryReq,
    responses(
        (status = 200, description = "Stored result set"),
        (status = 404, description = "Unknown sample or no parameter panel", body = ErrorBody),
        (status = 409, description = "Results already submitted", body = ErrorBody)
    )
)]
async fn record_results(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ResultEntryReq>,
) -> ApiResult<impl IntoResponse> {
    let mut lab = state.store.lock().await;
    let mut session = lab.start_result_entry(&id)?;
    let mut ignored_values = Vec::new();
    let mut ignored_comments = Vec::new();

    for (parameter_id, raw) in &req.values {
        let recorded = match raw {
            RawMeasurement::Number(v) => session.enter_value(parameter_id, *v).is_some(),
            RawMeasurement::Text(s) => session.enter(parameter_id, s).is_some(),
        };
        if !recorded {
            ignored_values.push(parameter_id.clone());
        }
    }
    for (parameter_id, text) in &req.comments {
        if !session.comment(parameter_id, text) {
            ignored_comments.push(parameter_id.clone());
        }
    }
    if let Some(text) = &req.interpretation {
        session.interpret(text);
    }

    let result_set = if req.submit {
        lab.submit(&session, req.technician)?
    } else {
        lab.save_draft(&session, req.technician)?
    };
    Ok(Json(ResultEntryRes {
        counts: result_set.counts(),
        result_set,
        ignored_values,
        ignored_comments,
    }))
}

#[utoipa::path(
    post,
    path = "/samples/{id}/review",
    params(("id" = String, Path, description = "Sample id")),
    request_body = ReviewReq,
    responses(
        (status = 200, description = "Reviewed result set"),
        (status = 404, description = "No results for the sample", body = ErrorBody),
        (status = 409, description = "Results not pending review", body = ErrorBody)
    )
)]
async fn review_results(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ReviewReq>,
) -> ApiResult<impl IntoResponse> {
    let mut lab = state.store.lock().await;
    Ok(Json(lab.review(&id, req.reviewer, req.decision)?))
}

#[utoipa::path(get, path = "/summary", responses((status = 200, description = "Dashboard counters")))]
async fn summary(State(state): State<AppState>) -> Json<LabSummary> {
    let lab = state.store.lock().await;
    Json(lab.summary())
}

#[utoipa::path(
    get,
    path = "/roles/{role}/views",
    params(("role" = String, Path, description = "lab-technician, doctor, patient or researcher")),
    responses(
        (status = 200, description = "Views available to the role"),
        (status = 404, description = "Unknown role", body = ErrorBody)
    )
)]
async fn role_views(Path(role): Path<String>) -> ApiResult<impl IntoResponse> {
    let role: Role = role.parse()?;
    Ok(Json(views_for(role)))
}

#[utoipa::path(
    get,
    path = "/inventory",
    responses((status = 200, description = "Items with derived stock status, plus stock counters"))
)]
async fn list_inventory(State(state): State<AppState>) -> Json<InventoryRes> {
    let lab = state.store.lock().await;
    let today = chrono::Utc::now().date_naive();
    let items = lab
        .inventory()
        .list()
        .iter()
        .map(|item| InventoryRow {
            status: item.status(today),
            days_until_expiry: item.days_until_expiry(today),
            expiry_label: item.expiry_label(today),
            item: item.clone(),
        })
        .collect();
    Json(InventoryRes {
        items,
        stats: lab.inventory().stats(today),
    })
}

#[utoipa::path(
    post,
    path = "/inventory",
    responses(
        (status = 201, description = "Inventory item added"),
        (status = 422, description = "Malformed item")
    )
)]
async fn create_inventory_item(
    State(state): State<AppState>,
    Json(req): Json<NewInventoryItem>,
) -> impl IntoResponse {
    let mut lab = state.store.lock().await;
    (StatusCode::CREATED, Json(lab.inventory_mut().add(req)))
}

#[utoipa::path(
    post,
    path = "/inventory/{id}/adjust",
    params(("id" = String, Path, description = "Inventory item id")),
    request_body = StockAdjustReq,
    responses(
        (status = 200, description = "Item after the adjustment; stock stops at zero"),
        (status = 404, description = "Unknown item", body = ErrorBody)
    )
)]
async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StockAdjustReq>,
) -> ApiResult<impl IntoResponse> {
    let mut lab = state.store.lock().await;
    Ok(Json(lab.inventory_mut().adjust_stock(&id, req.delta)?))
}

#[utoipa::path(
    get,
    path = "/equipment",
    responses((status = 200, description = "Instruments with maintenance due dates, plus counters"))
)]
async fn list_equipment(State(state): State<AppState>) -> Json<EquipmentRes> {
    let lab = state.store.lock().await;
    let today = chrono::Utc::now().date_naive();
    let equipment = lab
        .equipment()
        .list()
        .iter()
        .map(|e| EquipmentRow {
            days_until_maintenance: e.days_until_maintenance(today),
            maintenance_label: e.maintenance_label(today),
            equipment: e.clone(),
        })
        .collect();
    Json(EquipmentRes {
        equipment,
        stats: lab.equipment().stats(today),
    })
}

#[utoipa::path(
    post,
    path = "/equipment",
    responses(
        (status = 201, description = "Instrument registered"),
        (status = 400, description = "Maintenance interval out of range", body = ErrorBody)
    )
)]
async fn create_equipment(
    State(state): State<AppState>,
    Json(req): Json<NewEquipment>,
) -> ApiResult<impl IntoResponse> {
    let mut lab = state.store.lock().await;
    let equipment = lab.equipment_mut().add(req)?;
    Ok((StatusCode::CREATED, Json(equipment)))
}

#[utoipa::path(
    post,
    path = "/equipment/{id}/status",
    params(("id" = String, Path, description = "Equipment id")),
    request_body = EquipmentStatusReq,
    responses(
        (status = 200, description = "Instrument with its new status"),
        (status = 404, description = "Unknown equipment", body = ErrorBody)
    )
)]
async fn change_equipment_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<EquipmentStatusReq>,
) -> ApiResult<impl IntoResponse> {
    let mut lab = state.store.lock().await;
    Ok(Json(lab.equipment_mut().set_status(&id, req.status)?))
}

#[utoipa::path(
    get,
    path = "/equipment/{id}/maintenance",
    params(("id" = String, Path, description = "Equipment id")),
    responses(
        (status = 200, description = "Maintenance records, oldest first"),
        (status = 404, description = "Unknown equipment", body = ErrorBody)
    )
)]
async fn maintenance_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let lab = state.store.lock().await;
    if lab.equipment().get(&id).is_none() {
        return Err(LabError::EquipmentNotFound(id).into());
    }
    let history: Vec<MaintenanceRecord> =
        lab.equipment().history(&id).into_iter().cloned().collect();
    Ok(Json(history))
}

#[utoipa::path(
    post,
    path = "/equipment/{id}/maintenance",
    params(("id" = String, Path, description = "Equipment id")),
    responses(
        (status = 200, description = "Instrument with the rescheduled next maintenance"),
        (status = 400, description = "Next date out of range", body = ErrorBody),
        (status = 404, description = "Unknown equipment", body = ErrorBody)
    )
)]
async fn record_maintenance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(record): Json<MaintenanceRecord>,
) -> ApiResult<impl IntoResponse> {
    let mut lab = state.store.lock().await;
    Ok(Json(lab.equipment_mut().record_maintenance(&id, record)?))
}

// ============================================================================
// Report templates
// ============================================================================

#[utoipa::path(get, path = "/reports/templates", responses((status = 200, description = "Report templates with their sections")))]
async fn list_templates(State(state): State<AppState>) -> impl IntoResponse {
    let lab = state.store.lock().await;
    Json(lab.reports().list().to_vec())
}

#[utoipa::path(
    post,
    path = "/reports/templates",
    request_body = NewTemplateReq,
    responses((status = 201, description = "Empty template created"))
)]
async fn create_template(
    State(state): State<AppState>,
    Json(req): Json<NewTemplateReq>,
) -> ApiResult<impl IntoResponse> {
    let mut lab = state.store.lock().await;
    let reports = lab.reports_mut();
    let id = reports.add(req.name, req.category);
    let template = reports.get_mut(&id)?.clone();
    Ok((StatusCode::CREATED, Json(template)))
}

#[utoipa::path(
    delete,
    path = "/reports/templates/{id}",
    params(("id" = String, Path, description = "Template id")),
    responses(
        (status = 204, description = "Template removed"),
        (status = 404, description = "Unknown template", body = ErrorBody)
    )
)]
async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let mut lab = state.store.lock().await;
    if !lab.reports_mut().remove(&id) {
        return Err(LabError::TemplateNotFound(id).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/reports/templates/{id}/sections",
    params(("id" = String, Path, description = "Template id")),
    responses(
        (status = 201, description = "Template with the section appended"),
        (status = 404, description = "Unknown template", body = ErrorBody)
    )
)]
async fn add_section(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<NewSection>,
) -> ApiResult<impl IntoResponse> {
    let mut lab = state.store.lock().await;
    let template = lab.reports_mut().get_mut(&id)?;
    template.add_section(req);
    Ok((StatusCode::CREATED, Json(template.clone())))
}

#[utoipa::path(
    delete,
    path = "/reports/templates/{id}/sections/{section_id}",
    params(
        ("id" = String, Path, description = "Template id"),
        ("section_id" = String, Path, description = "Section id")
    ),
    responses(
        (status = 200, description = "Template after the removal"),
        (status = 404, description = "Unknown template or section", body = ErrorBody)
    )
)]
async fn delete_section(
    State(state): State<AppState>,
    Path((id, section_id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let mut lab = state.store.lock().await;
    let template = lab.reports_mut().get_mut(&id)?;
    if !template.remove_section(&section_id) {
        return Err(LabError::SectionNotFound {
            template_id: id,
            section_id,
        }
        .into());
    }
    Ok(Json(template.clone()))
}

#[utoipa::path(
    post,
    path = "/reports/templates/{id}/sections/{section_id}/move",
    params(
        ("id" = String, Path, description = "Template id"),
        ("section_id" = String, Path, description = "Section id")
    ),
    request_body = MoveSectionReq,
    responses(
        (status = 200, description = "Template after the move; unchanged at either end"),
        (status = 404, description = "Unknown template or section", body = ErrorBody)
    )
)]
async fn move_section(
    State(state): State<AppState>,
    Path((id, section_id)): Path<(String, String)>,
    Json(req): Json<MoveSectionReq>,
) -> ApiResult<impl IntoResponse> {
    let mut lab = state.store.lock().await;
    let template = lab.reports_mut().get_mut(&id)?;
    if !template.sections().iter().any(|s| s.id == section_id) {
        return Err(LabError::SectionNotFound {
            template_id: id,
            section_id,
        }
        .into());
    }
    template.move_section(&section_id, req.direction);
    Ok(Json(template.clone()))
}

#[utoipa::path(
    get,
    path = "/samples/{id}/report",
    params(
        ("id" = String, Path, description = "Sample id"),
        ("template" = Option<String>, Query, description = "Template id (default RT001)")
    ),
    responses(
        (status = 200, description = "Report text and any unfilled placeholders"),
        (status = 404, description = "Unknown sample or template", body = ErrorBody)
    )
)]
async fn sample_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<impl IntoResponse> {
    let lab = state.store.lock().await;
    Ok(Json(lab.render_report(&query.template, &id)?))
}
