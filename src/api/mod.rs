use axum::{
    Router,
    extract::{
        Json, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Args, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::core::{
    BandPosition, BreakdownInsights, SalaryInputs, StudentLoanPlan, TaxBreakdown, TaxRates,
    TaxYear, compute,
};
use crate::rates::{HttpRatesSource, RatesOrigin, RatesProvider, RatesSnapshot};
use crate::summary::{
    HttpSummarizer, SUMMARY_UNAVAILABLE, Summarizer, SummaryDebouncer, SummaryFacts,
    SummaryState, TemplateSummarizer, format_gbp,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliStudentLoanPlan {
    None,
    Plan1,
    Plan2,
    Plan4,
    Plan5,
    Postgrad,
}

impl From<CliStudentLoanPlan> for StudentLoanPlan {
    fn from(value: CliStudentLoanPlan) -> Self {
        match value {
            CliStudentLoanPlan::None => StudentLoanPlan::None,
            CliStudentLoanPlan::Plan1 => StudentLoanPlan::Plan1,
            CliStudentLoanPlan::Plan2 => StudentLoanPlan::Plan2,
            CliStudentLoanPlan::Plan4 => StudentLoanPlan::Plan4,
            CliStudentLoanPlan::Plan5 => StudentLoanPlan::Plan5,
            CliStudentLoanPlan::Postgrad => StudentLoanPlan::Postgrad,
        }
    }
}

impl From<StudentLoanPlan> for CliStudentLoanPlan {
    fn from(value: StudentLoanPlan) -> Self {
        match value {
            StudentLoanPlan::None => CliStudentLoanPlan::None,
            StudentLoanPlan::Plan1 => CliStudentLoanPlan::Plan1,
            StudentLoanPlan::Plan2 => CliStudentLoanPlan::Plan2,
            StudentLoanPlan::Plan4 => CliStudentLoanPlan::Plan4,
            StudentLoanPlan::Plan5 => CliStudentLoanPlan::Plan5,
            StudentLoanPlan::Postgrad => CliStudentLoanPlan::Postgrad,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CalculatePayload {
    gross_salary: Option<f64>,
    pension_contribution: Option<f64>,
    employer_pension_contribution: Option<f64>,
    use_auto_enrolment: Option<bool>,
    student_loan_plan: Option<StudentLoanPlan>,
    is_scottish: Option<bool>,
    tax_year: Option<TaxYear>,
    tax_code: Option<String>,
    gift_aid: Option<f64>,
    eis_relief: Option<f64>,
    seis_relief: Option<f64>,
    isa_contribution: Option<f64>,
    session_id: Option<String>,

    personal_allowance: Option<f64>,
    basic_rate_threshold: Option<f64>,
    higher_rate_threshold: Option<f64>,
    additional_rate_threshold: Option<f64>,
    basic_rate: Option<f64>,
    higher_rate: Option<f64>,
    additional_rate: Option<f64>,
    ni_threshold: Option<f64>,
    ni_rate: Option<f64>,
    ni_upper_limit: Option<f64>,
    ni_upper_rate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RatesQuery {
    tax_year: Option<TaxYear>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SessionQuery {
    session_id: Option<String>,
}

/// Replacements for individual fields of the tax year's rates. Rates are
/// fractions (0.2 for 20%).
#[derive(Args, Copy, Clone, Debug, Default, PartialEq)]
pub struct RateOverrides {
    #[arg(long)]
    personal_allowance: Option<f64>,
    #[arg(long)]
    basic_rate_threshold: Option<f64>,
    #[arg(long)]
    higher_rate_threshold: Option<f64>,
    #[arg(long)]
    additional_rate_threshold: Option<f64>,
    #[arg(long)]
    basic_rate: Option<f64>,
    #[arg(long)]
    higher_rate: Option<f64>,
    #[arg(long)]
    additional_rate: Option<f64>,
    #[arg(long)]
    ni_threshold: Option<f64>,
    #[arg(long)]
    ni_rate: Option<f64>,
    #[arg(long)]
    ni_upper_limit: Option<f64>,
    #[arg(long)]
    ni_upper_rate: Option<f64>,
}

impl RateOverrides {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn apply(&self, base: TaxRates) -> TaxRates {
        TaxRates {
            personal_allowance: self.personal_allowance.unwrap_or(base.personal_allowance),
            basic_rate_threshold: self.basic_rate_threshold.unwrap_or(base.basic_rate_threshold),
            higher_rate_threshold: self
                .higher_rate_threshold
                .unwrap_or(base.higher_rate_threshold),
            additional_rate_threshold: self
                .additional_rate_threshold
                .unwrap_or(base.additional_rate_threshold),
            basic_rate: self.basic_rate.unwrap_or(base.basic_rate),
            higher_rate: self.higher_rate.unwrap_or(base.higher_rate),
            additional_rate: self.additional_rate.unwrap_or(base.additional_rate),
            ni_threshold: self.ni_threshold.unwrap_or(base.ni_threshold),
            ni_rate: self.ni_rate.unwrap_or(base.ni_rate),
            ni_upper_limit: self.ni_upper_limit.unwrap_or(base.ni_upper_limit),
            ni_upper_rate: self.ni_upper_rate.unwrap_or(base.ni_upper_rate),
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "takehome",
    about = "UK take-home pay calculator (income tax, NI, pension, student loan, reliefs)",
    after_help = "Run `takehome serve [port]` to start the HTTP API instead."
)]
pub struct Cli {
    #[arg(long, default_value_t = 55_000.0, help = "Annual gross salary")]
    gross_salary: f64,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Employee pension contribution in percent of gross"
    )]
    pension_contribution: f64,
    #[arg(
        long,
        default_value_t = 3.0,
        help = "Employer pension contribution in percent of gross"
    )]
    employer_pension_contribution: f64,
    #[arg(
        long,
        help = "Use statutory auto-enrolment minimums instead of the percentages above"
    )]
    auto_enrolment: bool,
    #[arg(long, value_enum, default_value_t = CliStudentLoanPlan::None)]
    student_loan_plan: CliStudentLoanPlan,
    #[arg(long, help = "Scottish taxpayer (recorded, not applied)")]
    scottish: bool,
    #[arg(long, default_value_t = TaxYear::Y2024To25, help = "Tax year, e.g. 2024/25")]
    tax_year: TaxYear,
    #[arg(long, default_value = "1257L")]
    tax_code: String,
    #[arg(long, default_value_t = 0.0, help = "Net Gift Aid donations")]
    gift_aid: f64,
    #[arg(long, default_value_t = 0.0, help = "EIS investment attracting 30% relief")]
    eis_relief: f64,
    #[arg(long, default_value_t = 0.0, help = "SEIS investment attracting 50% relief")]
    seis_relief: f64,
    #[arg(long, default_value_t = 0.0, help = "Annual ISA contribution")]
    isa_contribution: f64,
    #[command(flatten)]
    rates: RateOverrides,
    #[command(flatten)]
    config: AppConfig,
    #[arg(long, help = "Print the full calculation as JSON")]
    json: bool,
    #[arg(long, help = "Append a short plain-language summary")]
    summary: bool,
}

#[derive(Debug)]
struct CalculationRequest {
    inputs: SalaryInputs,
    overrides: RateOverrides,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculateResponse {
    tax_year: TaxYear,
    rates: TaxRates,
    rates_origin: RatesOrigin,
    breakdown: TaxBreakdown,
    insights: BreakdownInsights,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    breakdown: TaxBreakdown,
    summary: String,
}

#[derive(Debug, Serialize)]
struct CliReport<'a> {
    #[serde(flatten)]
    calculation: &'a CalculateResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

const DEFAULT_SESSION: &str = "default";

/// Shared per-process state: where rates and summaries come from, the live
/// rates already resolved for each tax year, and one summary debouncer per
/// client session.
pub struct AppState {
    rates: RatesProvider,
    summarizer: Arc<dyn Summarizer>,
    summary_delay: Duration,
    debouncers: RwLock<HashMap<String, Arc<SummaryDebouncer>>>,
    snapshots: RwLock<HashMap<TaxYear, RatesSnapshot>>,
}

impl AppState {
    pub fn new(
        rates: RatesProvider,
        summarizer: Arc<dyn Summarizer>,
        summary_delay: Duration,
    ) -> Self {
        Self {
            rates,
            summarizer,
            summary_delay,
            debouncers: RwLock::new(HashMap::new()),
            snapshots: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            rates_provider(config),
            summarizer(config),
            config.summary_delay(),
        )
    }

    /// Fallback snapshots are not kept, so the next request for that year
    /// asks the upstream again.
    async fn snapshot(&self, tax_year: TaxYear) -> RatesSnapshot {
        if let Some(snapshot) = self.snapshots.read().await.get(&tax_year) {
            return snapshot.clone();
        }
        let snapshot = self.rates.fetch_rates(tax_year).await;
        if snapshot.origin != RatesOrigin::Live {
            return snapshot;
        }
        self.snapshots
            .write()
            .await
            .entry(tax_year)
            .or_insert(snapshot)
            .clone()
    }

    async fn debouncer(&self, session: &str) -> Arc<SummaryDebouncer> {
        if let Some(debouncer) = self.debouncers.read().await.get(session) {
            return Arc::clone(debouncer);
        }
        let mut debouncers = self.debouncers.write().await;
        let debouncer = debouncers.entry(session.to_string()).or_insert_with(|| {
            debug!(session, "new summary session");
            Arc::new(SummaryDebouncer::new(
                Arc::clone(&self.summarizer),
                self.summary_delay,
            ))
        });
        Arc::clone(debouncer)
    }

    async fn summary_state(&self, session: &str) -> SummaryState {
        match self.debouncers.read().await.get(session) {
            Some(debouncer) => debouncer.state(),
            None => SummaryState::Idle,
        }
    }
}

fn session_key(session_id: Option<&str>) -> &str {
    session_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(DEFAULT_SESSION)
}

fn rates_provider(config: &AppConfig) -> RatesProvider {
    let Some(url) = config.rates_url.clone() else {
        return RatesProvider::defaults_only();
    };
    match HttpRatesSource::new(url, config.http_timeout()) {
        Ok(source) => RatesProvider::new(Arc::new(source)),
        Err(err) => {
            warn!(error = %err, "rates client unavailable, using built-in rates");
            RatesProvider::defaults_only()
        }
    }
}

fn summarizer(config: &AppConfig) -> Arc<dyn Summarizer> {
    let Some(url) = config.summary_url.clone() else {
        return Arc::new(TemplateSummarizer);
    };
    match HttpSummarizer::new(url, config.http_timeout()) {
        Ok(summarizer) => Arc::new(summarizer),
        Err(err) => {
            warn!(error = %err, "summary client unavailable, using template summaries");
            Arc::new(TemplateSummarizer)
        }
    }
}

fn build_request(cli: &Cli) -> Result<CalculationRequest, String> {
    for (name, amount) in [
        ("--gross-salary", cli.gross_salary),
        ("--gift-aid", cli.gift_aid),
        ("--eis-relief", cli.eis_relief),
        ("--seis-relief", cli.seis_relief),
        ("--isa-contribution", cli.isa_contribution),
    ] {
        if !amount.is_finite() || amount < 0.0 {
            return Err(format!("{name} must be a finite amount >= 0"));
        }
    }

    for (name, percent) in [
        ("--pension-contribution", cli.pension_contribution),
        ("--employer-pension-contribution", cli.employer_pension_contribution),
    ] {
        if !(0.0..=100.0).contains(&percent) {
            return Err(format!("{name} must be between 0 and 100"));
        }
    }

    if cli.tax_code.chars().any(char::is_whitespace) {
        return Err("--tax-code must not contain whitespace".to_string());
    }

    Ok(CalculationRequest {
        inputs: SalaryInputs {
            gross_salary: cli.gross_salary,
            pension_contribution: cli.pension_contribution,
            employer_pension_contribution: cli.employer_pension_contribution,
            use_auto_enrolment: cli.auto_enrolment,
            student_loan_plan: cli.student_loan_plan.into(),
            is_scottish: cli.scottish,
            tax_year: cli.tax_year,
            tax_code: cli.tax_code.to_ascii_uppercase(),
            gift_aid: cli.gift_aid,
            eis_relief: cli.eis_relief,
            seis_relief: cli.seis_relief,
            isa_contribution: cli.isa_contribution,
        },
        overrides: cli.rates,
    })
}

fn resolve_rates(snapshot: &RatesSnapshot, overrides: &RateOverrides) -> Result<TaxRates, String> {
    if overrides.is_empty() {
        return Ok(snapshot.rates);
    }
    let rates = overrides.apply(snapshot.rates);
    rates
        .validate()
        .map_err(|e| format!("invalid rate override: {e}"))?;
    Ok(rates)
}

async fn calculate(
    state: &AppState,
    request: &CalculationRequest,
) -> Result<CalculateResponse, String> {
    let tax_year = request.inputs.tax_year;
    let snapshot = state.snapshot(tax_year).await;
    let rates = resolve_rates(&snapshot, &request.overrides)?;
    let breakdown = compute(&request.inputs, &rates);
    debug!(
        %tax_year,
        gross = breakdown.gross,
        net = breakdown.net_pay,
        "calculated breakdown"
    );
    Ok(CalculateResponse {
        tax_year,
        rates,
        rates_origin: snapshot.origin,
        insights: BreakdownInsights::from_breakdown(&breakdown),
        breakdown,
    })
}

async fn summarize(state: &AppState, inputs: &SalaryInputs, breakdown: &TaxBreakdown) -> String {
    let facts = SummaryFacts::new(inputs, breakdown);
    match state.summarizer.summarize(&facts).await {
        Ok(text) => text,
        Err(err) => {
            warn!(error = %err, "summary request failed");
            SUMMARY_UNAVAILABLE.to_string()
        }
    }
}

/// Runs one calculation for the command line and returns the text to print.
///
/// # Errors
///
/// Returns a message naming the offending flag when an input is out of range.
pub async fn run_cli(cli: Cli) -> Result<String, String> {
    let request = build_request(&cli)?;
    let state = AppState::from_config(&cli.config);
    let response = calculate(&state, &request).await?;

    let summary = if cli.summary {
        Some(summarize(&state, &request.inputs, &response.breakdown).await)
    } else {
        None
    };

    if cli.json {
        let report = CliReport {
            calculation: &response,
            summary: summary.as_deref(),
        };
        return serde_json::to_string_pretty(&report).map_err(|e| e.to_string());
    }

    let mut text = render_report(&response);
    if let Some(summary) = summary {
        text.push_str("\n\n");
        text.push_str(&summary);
    }
    Ok(text)
}

fn render_report(response: &CalculateResponse) -> String {
    let breakdown = &response.breakdown;
    let insights = &response.insights;
    let origin = match response.rates_origin {
        RatesOrigin::Live => "live",
        RatesOrigin::Default => "built-in",
    };
    let band = match insights.band_position {
        BandPosition::Allowance => "personal allowance",
        BandPosition::Basic => "basic rate",
        BandPosition::Higher => "higher rate",
        BandPosition::Additional => "additional rate",
    };

    let mut rows = vec![
        ("Tax year", format!("{} ({origin} rates)", response.tax_year)),
        ("Gross salary", format_gbp(breakdown.gross)),
        ("Pension", format_gbp(breakdown.pension)),
        ("Income tax", format_gbp(breakdown.tax_paid)),
        ("National Insurance", format_gbp(breakdown.ni_paid)),
    ];
    if breakdown.student_loan_paid > 0.0 {
        rows.push(("Student loan", format_gbp(breakdown.student_loan_paid)));
    }
    if breakdown.total_tax_savings > 0.0 {
        rows.push(("Tax relief", format_gbp(breakdown.total_tax_savings)));
    }
    rows.extend([
        ("Net pay", format_gbp(breakdown.net_pay)),
        ("Monthly take-home", format_gbp(breakdown.take_home_monthly)),
        (
            "Effective rate",
            format!("{:.1}%", insights.effective_tax_rate * 100.0),
        ),
        ("Top band", band.to_string()),
    ]);

    rows.iter()
        .map(|(label, value)| format!("{label:<20}{value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/calculate",
            get(calculate_get_handler).post(calculate_post_handler),
        )
        .route("/api/rates", get(rates_handler))
        .route(
            "/api/summary",
            get(summary_get_handler).post(summary_post_handler),
        )
        .route("/api/summary/debounced", post(summary_schedule_handler))
        .route("/api/summary/latest", get(summary_latest_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(port: u16, config: AppConfig) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(Arc::new(AppState::from_config(&config)));

    let listener = TcpListener::bind(addr).await?;
    info!(
        %addr,
        live_rates = config.rates_url.is_some(),
        remote_summaries = config.summary_url.is_some(),
        "take-home HTTP API listening"
    );
    info!("local access: http://127.0.0.1:{port}/api/calculate");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn calculate_get_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Query<CalculatePayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => calculate_handler_impl(&state, payload).await,
        Err(rejection) => error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    }
}

async fn calculate_post_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CalculatePayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => calculate_handler_impl(&state, payload).await,
        Err(rejection) => error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    }
}

async fn calculate_handler_impl(state: &AppState, payload: CalculatePayload) -> Response {
    let request = match request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    match calculate(state, &request).await {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn rates_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RatesQuery>, QueryRejection>,
) -> Response {
    match query {
        Ok(Query(query)) => {
            let snapshot = state.snapshot(query.tax_year.unwrap_or_default()).await;
            json_response(StatusCode::OK, snapshot)
        }
        Err(rejection) => error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    }
}

async fn summary_get_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Query<CalculatePayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => summary_handler_impl(&state, payload).await,
        Err(rejection) => error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    }
}

async fn summary_post_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CalculatePayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => summary_handler_impl(&state, payload).await,
        Err(rejection) => error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    }
}

async fn summary_handler_impl(state: &AppState, payload: CalculatePayload) -> Response {
    let request = match request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    let response = match calculate(state, &request).await {
        Ok(response) => response,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    let summary = summarize(state, &request.inputs, &response.breakdown).await;
    json_response(
        StatusCode::OK,
        SummaryResponse {
            breakdown: response.breakdown,
            summary,
        },
    )
}

async fn summary_schedule_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CalculatePayload>, JsonRejection>,
) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    };
    let session = session_key(payload.session_id.as_deref()).to_string();
    let request = match request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    let response = match calculate(&state, &request).await {
        Ok(response) => response,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    let debouncer = state.debouncer(&session).await;
    debouncer.schedule(SummaryFacts::new(&request.inputs, &response.breakdown));
    json_response(StatusCode::ACCEPTED, debouncer.state())
}

async fn summary_latest_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SessionQuery>, QueryRejection>,
) -> Response {
    match query {
        Ok(Query(query)) => {
            let session = session_key(query.session_id.as_deref());
            json_response(StatusCode::OK, state.summary_state(session).await)
        }
        Err(rejection) => error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn request_from_json(json: &str) -> Result<CalculationRequest, String> {
    let payload = serde_json::from_str::<CalculatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    request_from_payload(payload)
}

fn request_from_payload(payload: CalculatePayload) -> Result<CalculationRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.gross_salary {
        cli.gross_salary = v;
    }
    if let Some(v) = payload.pension_contribution {
        cli.pension_contribution = v;
    }
    if let Some(v) = payload.employer_pension_contribution {
        cli.employer_pension_contribution = v;
    }
    if let Some(v) = payload.use_auto_enrolment {
        cli.auto_enrolment = v;
    }
    if let Some(v) = payload.student_loan_plan {
        cli.student_loan_plan = v.into();
    }
    if let Some(v) = payload.is_scottish {
        cli.scottish = v;
    }
    if let Some(v) = payload.tax_year {
        cli.tax_year = v;
    }
    if let Some(v) = payload.tax_code {
        cli.tax_code = v;
    }
    if let Some(v) = payload.gift_aid {
        cli.gift_aid = v;
    }
    if let Some(v) = payload.eis_relief {
        cli.eis_relief = v;
    }
    if let Some(v) = payload.seis_relief {
        cli.seis_relief = v;
    }
    if let Some(v) = payload.isa_contribution {
        cli.isa_contribution = v;
    }

    cli.rates = RateOverrides {
        personal_allowance: payload.personal_allowance,
        basic_rate_threshold: payload.basic_rate_threshold,
        higher_rate_threshold: payload.higher_rate_threshold,
        additional_rate_threshold: payload.additional_rate_threshold,
        basic_rate: payload.basic_rate,
        higher_rate: payload.higher_rate,
        additional_rate: payload.additional_rate,
        ni_threshold: payload.ni_threshold,
        ni_rate: payload.ni_rate,
        ni_upper_limit: payload.ni_upper_limit,
        ni_upper_rate: payload.ni_upper_rate,
    };

    build_request(&cli)
}

fn default_cli_for_api() -> Cli {
    let inputs = SalaryInputs::default();
    Cli {
        gross_salary: inputs.gross_salary,
        pension_contribution: inputs.pension_contribution,
        employer_pension_contribution: inputs.employer_pension_contribution,
        auto_enrolment: inputs.use_auto_enrolment,
        student_loan_plan: inputs.student_loan_plan.into(),
        scottish: inputs.is_scottish,
        tax_year: inputs.tax_year,
        tax_code: inputs.tax_code,
        gift_aid: inputs.gift_aid,
        eis_relief: inputs.eis_relief,
        seis_relief: inputs.seis_relief,
        isa_contribution: inputs.isa_contribution,
        rates: RateOverrides::default(),
        config: AppConfig::default(),
        json: false,
        summary: false,
    }
}
