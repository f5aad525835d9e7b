use crate::auth;
use crate::errors::{DashboardError, Result};
use crate::metrics;
use crate::monitor::MonitorSnapshot;
use crate::state::AppState;
use actix_web::{http::header, web, HttpResponse};
use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use lead_core::analytics::{DailyRow, SummaryStats};
use lead_core::calendar::CalendarPicker;
use lead_core::export::leads_csv;
use lead_core::lead::StatusMeta;
use lead_core::lender::{Lender, LenderInput};
use lead_core::{
    Applied, DateRange, FraudReport, FraudSummary, Lead, LeadQuery, LeadStatus, Preset,
    RiskAssessment, Window,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Page size used when walking all pages for an export
const EXPORT_PAGE_SIZE: u32 = 500;
/// Upper bound on pages fetched for one export
const EXPORT_MAX_PAGES: u32 = 200;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ===== Query models =====

/// Date range selection shared by every period-scoped endpoint.
///
/// `from`/`to` are picked days (inclusive) and win over `preset`; `days`
/// is shorthand for the `Nd` preset.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RangeParams {
    pub preset: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub days: Option<u32>,
}

impl RangeParams {
    pub fn is_empty(&self) -> bool {
        self.preset.is_none() && self.from.is_none() && self.to.is_none() && self.days.is_none()
    }

    pub fn resolve(&self, today: NaiveDate, default_days: u32) -> Result<DateRange> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            return Ok(DateRange::custom(from, to)?);
        }
        let preset = match (self.preset.as_deref(), self.days) {
            (Some(preset), _) => preset.parse::<Preset>()?,
            (None, Some(days)) if days > 0 => Preset::LastDays(days),
            _ => Preset::LastDays(default_days),
        };
        Ok(DateRange::resolve(preset, today)?)
    }
}

/// Period length to send as `days`, falling back for unbounded ranges
fn period_days(range: &DateRange, fallback: u32) -> u32 {
    range
        .days
        .and_then(|d| u32::try_from(d).ok())
        .filter(|d| *d > 0)
        .unwrap_or(fallback)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryRates {
    conversion_rate: f64,
    redirect_confirmation_rate: f64,
    rejection_rate: f64,
    revenue_per_sale: Decimal,
}

impl From<&SummaryStats> for SummaryRates {
    fn from(stats: &SummaryStats) -> Self {
        Self {
            conversion_rate: stats.conversion_rate(),
            redirect_confirmation_rate: stats.redirect_confirmation_rate(),
            rejection_rate: stats.rejection_rate(),
            revenue_per_sale: stats.revenue_per_sale(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DailyView {
    #[serde(flatten)]
    row: DailyRow,
    conversion_rate: f64,
}

// ===== Health Check =====
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    backend: &'static str,
}

pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let backend = match state.backend.health().await {
        Ok(_) => "connected",
        Err(e) => {
            warn!(error = %e, "Backend health probe failed");
            "unreachable"
        }
    };

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        backend,
    })
}

// ===== Metrics =====
pub async fn metrics_endpoint() -> Result<HttpResponse> {
    let body = metrics::render().map_err(|e| DashboardError::Internal(e.to_string()))?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}

// ===== Overview =====
pub async fn overview(
    state: web::Data<AppState>,
    params: web::Query<RangeParams>,
) -> Result<HttpResponse> {
    let range = params.resolve(today(), state.config.fraud.default_days)?;
    let stats = state.backend.summary(range.window(&Local).as_ref()).await?;

    let snapshot = state.monitor.snapshot();
    let filtered = snapshot
        .data
        .as_ref()
        .map(|summary| state.whitelist.read().apply(summary));

    Ok(HttpResponse::Ok().json(json!({
        "range": range,
        "rates": SummaryRates::from(&stats),
        "stats": stats,
        "fraudRisk": RiskAssessment::assess_opt(filtered.as_ref()),
        "fraudRiskUpdatedAt": snapshot.last_refresh,
    })))
}

// ===== Analytics =====
pub async fn analytics_summary(
    state: web::Data<AppState>,
    params: web::Query<RangeParams>,
) -> Result<HttpResponse> {
    let range = params.resolve(today(), state.config.fraud.default_days)?;
    let stats = state.backend.summary(range.window(&Local).as_ref()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "range": range,
        "rates": SummaryRates::from(&stats),
        "stats": stats,
    })))
}

pub async fn analytics_daily(
    state: web::Data<AppState>,
    params: web::Query<RangeParams>,
) -> Result<HttpResponse> {
    let default_days = state.config.fraud.default_days;
    let range = params.resolve(today(), default_days)?;
    let rows = state
        .backend
        .daily(period_days(&range, default_days), range.window(&Local).as_ref())
        .await?;

    let analytics: Vec<DailyView> = rows
        .into_iter()
        .map(|row| DailyView {
            conversion_rate: row.conversion_rate(),
            row,
        })
        .collect();

    Ok(HttpResponse::Ok().json(json!({ "range": range, "analytics": analytics })))
}

pub async fn analytics_funnel(
    state: web::Data<AppState>,
    params: web::Query<RangeParams>,
) -> Result<HttpResponse> {
    let default_days = state.config.fraud.default_days;
    let range = params.resolve(today(), default_days)?;
    let funnel = state
        .backend
        .funnel(period_days(&range, default_days), range.window(&Local).as_ref())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "range": range,
        "conversion": funnel.conversion(),
        "funnel": funnel,
    })))
}

// ===== Leads =====
#[derive(Debug, Default, Deserialize)]
pub struct LeadsParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
    pub source: Option<String>,
}

fn lead_query(params: &LeadsParams, range: &RangeParams, default_days: u32) -> Result<LeadQuery> {
    let status = match params.status.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(raw) => match LeadStatus::from_wire(raw) {
            LeadStatus::Unknown => {
                return Err(DashboardError::Validation(format!("Unknown status filter: {}", raw)))
            }
            status => Some(status),
        },
    };

    let window: Option<Window> = if range.is_empty() {
        None
    } else {
        range.resolve(today(), default_days)?.window(&Local)
    };

    let defaults = LeadQuery::default();
    Ok(LeadQuery {
        page: params.page.unwrap_or(defaults.page),
        limit: params.limit.unwrap_or(defaults.limit),
        status,
        source: params.source.clone(),
        window,
    })
}

pub async fn list_leads(
    state: web::Data<AppState>,
    params: web::Query<LeadsParams>,
    range: web::Query<RangeParams>,
) -> Result<HttpResponse> {
    let query = lead_query(&params, &range, state.config.fraud.default_days)?;
    let page = state.backend.leads(&query).await?;

    let status_meta: BTreeMap<&'static str, StatusMeta> = LeadStatus::ALL
        .iter()
        .chain(std::iter::once(&LeadStatus::Unknown))
        .map(|status| (status.as_str(), status.meta()))
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "unknownStatuses": page.unknown_statuses(),
        "leads": page.leads,
        "pagination": page.pagination,
        "statusMeta": status_meta,
    })))
}

pub async fn export_leads(
    state: web::Data<AppState>,
    params: web::Query<LeadsParams>,
    range: web::Query<RangeParams>,
) -> Result<HttpResponse> {
    let mut query = lead_query(&params, &range, state.config.fraud.default_days)?;
    query.page = 1;
    query.limit = EXPORT_PAGE_SIZE;

    let mut leads: Vec<Lead> = Vec::new();
    loop {
        let page = state.backend.leads(&query).await?;
        let last_page = page.leads.is_empty()
            || i64::from(query.page) >= page.pagination.total_pages
            || query.page >= EXPORT_MAX_PAGES;
        leads.extend(page.leads);
        if last_page {
            break;
        }
        query.page += 1;
    }

    info!(count = leads.len(), "Exporting leads");
    let filename = format!("leads-{}.csv", today().format("%Y-%m-%d"));
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ))
        .body(leads_csv(&leads)))
}

pub async fn get_lead(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let detail = state.backend.lead(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "statusMeta": detail.lead.status.meta(),
        "detail": detail,
    })))
}

// ===== Lenders =====
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LenderView {
    #[serde(flatten)]
    lender: Lender,
    masked_api_key: Option<String>,
}

pub async fn list_lenders(state: web::Data<AppState>) -> Result<HttpResponse> {
    let lenders: Vec<LenderView> = state
        .backend
        .lenders()
        .await?
        .into_iter()
        .map(|lender| LenderView {
            masked_api_key: lender.masked_api_key(),
            lender,
        })
        .collect();

    Ok(HttpResponse::Ok().json(json!({ "lenders": lenders })))
}

pub async fn create_lender(
    state: web::Data<AppState>,
    req: web::Json<LenderInput>,
) -> Result<HttpResponse> {
    let input = req.into_inner();
    input.validate()?;

    let created = state.backend.create_lender(&input).await?;
    info!(name = %input.name, "Lender created");
    Ok(HttpResponse::Created().json(created))
}

pub async fn update_lender(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    req: web::Json<LenderInput>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let input = req.into_inner();
    input.validate()?;

    let updated = state.backend.update_lender(id, &input).await?;
    info!(lender_id = id, "Lender updated");
    Ok(HttpResponse::Ok().json(updated))
}

pub async fn delete_lender(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let deleted = state.backend.delete_lender(id).await?;
    info!(lender_id = id, "Lender deleted");
    Ok(HttpResponse::Ok().json(deleted))
}

pub async fn test_lender(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let result = state.backend.test_lender(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

// ===== Fraud =====

/// Whitelist-filtered report; risk is scored after filtering
fn build_report(state: &AppState, summary: &FraudSummary, range_label: &str) -> FraudReport {
    let whitelist = state.whitelist.read();
    let applied = whitelist.is_enabled() && !whitelist.ips().is_empty();
    let filtered = whitelist.apply(summary);
    FraudReport::build(
        &filtered,
        applied,
        range_label,
        state.config.fraud.hour_label_offset,
    )
}

pub async fn fraud_report(
    state: web::Data<AppState>,
    params: web::Query<RangeParams>,
) -> Result<HttpResponse> {
    let default_days = state.config.fraud.default_days;
    let range = params.resolve(today(), default_days)?;
    let summary = state
        .backend
        .fraud_summary(period_days(&range, default_days), range.window(&Local).as_ref())
        .await?;

    Ok(HttpResponse::Ok().json(build_report(&state, &summary, &range.label)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MonitorView {
    range: DateRange,
    error: Option<String>,
    loading: bool,
    refreshing: bool,
    last_refresh: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    applied: Option<&'static str>,
    report: Option<FraudReport>,
}

fn monitor_view(state: &AppState, snapshot: MonitorSnapshot, applied: Option<Applied>) -> MonitorView {
    let report = snapshot
        .data
        .as_ref()
        .map(|summary| build_report(state, summary, &snapshot.range.label));

    MonitorView {
        report,
        range: snapshot.range,
        error: snapshot.error,
        loading: snapshot.loading,
        refreshing: snapshot.refreshing,
        last_refresh: snapshot.last_refresh,
        applied: applied.map(|a| match a {
            Applied::Current => "current",
            Applied::Stale => "stale",
        }),
    }
}

pub async fn fraud_monitor(state: web::Data<AppState>) -> HttpResponse {
    let snapshot = state.monitor.snapshot();
    HttpResponse::Ok().json(monitor_view(&state, snapshot, None))
}

pub async fn refresh_fraud_monitor(state: web::Data<AppState>) -> HttpResponse {
    let applied = state.monitor.refresh().await;
    let snapshot = state.monitor.snapshot();
    HttpResponse::Ok().json(monitor_view(&state, snapshot, Some(applied)))
}

pub async fn set_fraud_monitor_range(
    state: web::Data<AppState>,
    req: web::Json<RangeParams>,
) -> Result<HttpResponse> {
    let range = req.resolve(today(), state.config.fraud.default_days)?;
    let applied = state.monitor.set_range(range).await;
    let snapshot = state.monitor.snapshot();
    Ok(HttpResponse::Ok().json(monitor_view(&state, snapshot, Some(applied))))
}

// ===== Whitelist =====
#[derive(Debug, Deserialize)]
pub struct WhitelistAdd {
    pub ip: String,
}

#[derive(Debug, Deserialize)]
pub struct WhitelistToggle {
    pub enabled: bool,
}

fn whitelist_json(state: &AppState) -> serde_json::Value {
    let whitelist = state.whitelist.read();
    json!({ "ips": whitelist.ips(), "enabled": whitelist.is_enabled() })
}

pub async fn get_whitelist(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(whitelist_json(&state))
}

pub async fn add_whitelist_ip(
    state: web::Data<AppState>,
    req: web::Json<WhitelistAdd>,
) -> HttpResponse {
    let added = state.whitelist.write().add(&req.ip);
    if added {
        info!(ip = %req.ip.trim(), "IP whitelisted");
    }
    let mut body = whitelist_json(&state);
    body["added"] = json!(added);
    HttpResponse::Ok().json(body)
}

pub async fn remove_whitelist_ip(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let ip = path.into_inner();
    let removed = state.whitelist.write().remove(&ip);
    if removed {
        info!(ip = %ip, "IP removed from whitelist");
    }
    let mut body = whitelist_json(&state);
    body["removed"] = json!(removed);
    HttpResponse::Ok().json(body)
}

pub async fn set_whitelist_enabled(
    state: web::Data<AppState>,
    req: web::Json<WhitelistToggle>,
) -> HttpResponse {
    state.whitelist.write().set_enabled(req.enabled);
    info!(enabled = req.enabled, "Whitelist filtering toggled");
    HttpResponse::Ok().json(whitelist_json(&state))
}

// ===== Date ranges =====
#[derive(Debug, Default, Deserialize)]
pub struct StepParams {
    pub step: Option<i32>,
}

pub async fn resolve_date_range(
    state: web::Data<AppState>,
    params: web::Query<RangeParams>,
    step: web::Query<StepParams>,
) -> Result<HttpResponse> {
    let today = today();
    let mut range = params.resolve(today, state.config.fraud.default_days)?;
    if let Some(step) = step.step.filter(|s| *s != 0) {
        range = range.navigate(step, today)?;
    }

    let window = range.window(&Local);
    let query = window
        .map(|w| {
            w.query_pairs()
                .into_iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("&")
        })
        .unwrap_or_default();

    Ok(HttpResponse::Ok().json(json!({
        "range": range,
        "window": window,
        "query": query,
    })))
}

#[derive(Debug, Default, Deserialize)]
pub struct CalendarParams {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

pub async fn calendar(params: web::Query<CalendarParams>) -> Result<HttpResponse> {
    let today = today();
    let grid = CalendarPicker::at(
        params.year.unwrap_or_else(|| today.year()),
        params.month.unwrap_or_else(|| today.month()),
    )
    .with_selection(params.start, params.end)
    .grid(today)?;

    Ok(HttpResponse::Ok().json(grid))
}

// ===== Configure Routes =====
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // reachable without a session
    cfg.route("/login", web::get().to(auth::login_page))
        .route("/api/auth", web::post().to(auth::login))
        .route("/api/auth/logout", web::post().to(auth::logout));

    cfg.route("/", web::get().to(overview))
        .route("/health", web::get().to(health_check))
        .route("/metrics", web::get().to(metrics_endpoint))
        // analytics
        .route("/api/analytics/summary", web::get().to(analytics_summary))
        .route("/api/analytics/daily", web::get().to(analytics_daily))
        .route("/api/analytics/funnel", web::get().to(analytics_funnel))
        // leads; export before {id}
        .route("/api/leads", web::get().to(list_leads))
        .route("/api/leads/export", web::get().to(export_leads))
        .route("/api/leads/{id}", web::get().to(get_lead))
        // lenders
        .service(
            web::resource("/api/lenders")
                .route(web::get().to(list_lenders))
                .route(web::post().to(create_lender)),
        )
        .service(
            web::resource("/api/lenders/{id}")
                .route(web::put().to(update_lender))
                .route(web::delete().to(delete_lender)),
        )
        .route("/api/lenders/{id}/test", web::post().to(test_lender))
        // fraud
        .route("/api/fraud", web::get().to(fraud_report))
        .route("/api/fraud/monitor", web::get().to(fraud_monitor))
        .route("/api/fraud/monitor/refresh", web::post().to(refresh_fraud_monitor))
        .route("/api/fraud/monitor/range", web::put().to(set_fraud_monitor_range))
        .service(
            web::resource("/api/fraud/whitelist")
                .route(web::get().to(get_whitelist))
                .route(web::post().to(add_whitelist_ip)),
        )
        // enabled before {ip}
        .route("/api/fraud/whitelist/enabled", web::put().to(set_whitelist_enabled))
        .route("/api/fraud/whitelist/{ip}", web::delete().to(remove_whitelist_ip))
        // date ranges
        .route("/api/date-range", web::get().to(resolve_date_range))
        .route("/api/calendar", web::get().to(calendar));
}
