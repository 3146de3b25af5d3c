use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    BandSlice, PayPeriods, Projection, ProjectionInputs, TaxResult, calculate_tax, run_projection,
};

#[derive(Parser, Debug)]
#[command(
    name = "payplan",
    about = "UK take-home pay breakdown and retirement pot projection"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON API
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Print the tax and National Insurance breakdown for one year
    Tax(TaxArgs),
    /// Print the year-by-year retirement projection
    Project(ProjectArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TaxArgs {
    #[arg(long, default_value_t = 35000.0, help = "Gross annual income")]
    gross_income: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Annual salary-sacrifice pension contribution, clamped to gross income"
    )]
    pension_contribution: f64,
}

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    #[arg(long, default_value_t = 22)]
    current_age: u32,
    #[arg(long, default_value_t = 65)]
    retirement_age: u32,
    #[arg(
        long,
        default_value_t = 35000.0,
        help = "Current gross salary, the base for employer contributions"
    )]
    salary: f64,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Personal pension contribution in percent of salary"
    )]
    personal_contribution_rate: f64,
    #[arg(
        long,
        help = "Annual personal pension contribution; overrides --personal-contribution-rate"
    )]
    pension_contribution: Option<f64>,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Employer pension contribution in percent of salary"
    )]
    employer_contribution_rate: f64,
    #[arg(
        long,
        default_value_t = 5000.0,
        help = "Fixed annual amount paid into the investment pot"
    )]
    additional_investment: f64,
    #[arg(long, default_value_t = 7.0, help = "Nominal annual investment growth in percent")]
    investment_growth_rate: f64,
    #[arg(long, default_value_t = 2.7, help = "Annual inflation in percent")]
    inflation_rate: f64,
    #[arg(long, default_value_t = 3.0, help = "Nominal annual wage growth in percent")]
    wage_growth_rate: f64,
    #[arg(
        long,
        default_value_t = 4.0,
        help = "Share of combined pots withdrawn each retired year, in percent"
    )]
    withdrawal_rate: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TaxPayload {
    gross_income: Option<f64>,
    pension_contribution: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectionPayload {
    current_age: Option<u32>,
    retirement_age: Option<u32>,
    salary: Option<f64>,
    personal_contribution: Option<f64>,
    pension_contribution: Option<f64>,
    employer_contribution: Option<f64>,
    additional_investment: Option<f64>,
    investment_growth: Option<f64>,
    #[serde(alias = "inflationRate")]
    inflation: Option<f64>,
    wage_growth: Option<f64>,
    withdrawal_rate: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
struct TaxRequest {
    gross_income: f64,
    pension_contribution: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaxReport {
    #[serde(flatten)]
    result: TaxResult,
    pension_contribution: f64,
    bands: Vec<BandSlice>,
    periods: PayPeriods,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanResponse {
    tax: TaxReport,
    projection: Projection,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Serve { port } => run_http_server(port)
            .await
            .map_err(|e| format!("Server error: {e}")),
        Command::Tax(args) => {
            let request = build_tax_request(&args)?;
            print_json(&build_tax_report(request))
        }
        Command::Project(args) => {
            let inputs = build_projection_inputs(&args)?;
            let projection = run_projection(&inputs).map_err(|e| e.to_string())?;
            print_json(&projection)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let rendered =
        serde_json::to_string_pretty(value).map_err(|e| format!("Failed to render JSON: {e}"))?;
    println!("{rendered}");
    Ok(())
}

fn build_tax_request(args: &TaxArgs) -> Result<TaxRequest, String> {
    if !args.gross_income.is_finite() || args.gross_income < 0.0 {
        return Err("--gross-income must be >= 0".to_string());
    }

    if !args.pension_contribution.is_finite() {
        return Err("--pension-contribution must be a number".to_string());
    }

    Ok(TaxRequest {
        gross_income: args.gross_income,
        pension_contribution: args.pension_contribution.clamp(0.0, args.gross_income),
    })
}

fn build_projection_inputs(args: &ProjectArgs) -> Result<ProjectionInputs, String> {
    if !args.salary.is_finite() || args.salary < 0.0 {
        return Err("--salary must be >= 0".to_string());
    }

    if !(0.0..=100.0).contains(&args.personal_contribution_rate) {
        return Err("--personal-contribution-rate must be between 0 and 100".to_string());
    }

    let pension_contribution = match args.pension_contribution {
        Some(amount) if !amount.is_finite() || amount < 0.0 => {
            return Err("--pension-contribution must be >= 0".to_string());
        }
        Some(amount) => amount.min(args.salary),
        None => args.salary * args.personal_contribution_rate / 100.0,
    };

    Ok(ProjectionInputs {
        current_age: args.current_age,
        retirement_age: args.retirement_age,
        current_salary: args.salary,
        pension_contribution,
        employer_contribution_rate: args.employer_contribution_rate / 100.0,
        additional_investment: args.additional_investment,
        investment_growth_rate: args.investment_growth_rate / 100.0,
        inflation_rate: args.inflation_rate / 100.0,
        wage_growth_rate: args.wage_growth_rate / 100.0,
        withdrawal_rate: args.withdrawal_rate / 100.0,
    })
}

fn build_tax_report(request: TaxRequest) -> TaxReport {
    let result = calculate_tax(request.gross_income, request.pension_contribution);
    TaxReport {
        result,
        pension_contribution: request.pension_contribution,
        bands: result.band_breakdown(),
        periods: result.pay_periods(),
    }
}

fn build_plan_response(args: &ProjectArgs) -> Result<PlanResponse, String> {
    let inputs = build_projection_inputs(args)?;
    let projection = run_projection(&inputs).map_err(|e| e.to_string())?;
    let tax = build_tax_report(build_tax_request(&TaxArgs {
        gross_income: inputs.current_salary,
        pension_contribution: inputs.pension_contribution,
    })?);
    Ok(PlanResponse { tax, projection })
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/api/tax", get(tax_get_handler).post(tax_post_handler))
        .route(
            "/api/projection",
            get(projection_get_handler).post(projection_post_handler),
        )
        .route("/api/plan", get(plan_get_handler).post(plan_post_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "payplan HTTP API listening");
    tracing::info!("Local access: http://127.0.0.1:{port}/api/tax");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn tax_get_handler(Query(payload): Query<TaxPayload>) -> Response {
    tax_response(payload)
}

async fn tax_post_handler(Json(payload): Json<TaxPayload>) -> Response {
    tax_response(payload)
}

async fn projection_get_handler(Query(payload): Query<ProjectionPayload>) -> Response {
    projection_response(payload)
}

async fn projection_post_handler(Json(payload): Json<ProjectionPayload>) -> Response {
    projection_response(payload)
}

async fn plan_get_handler(Query(payload): Query<ProjectionPayload>) -> Response {
    plan_response(payload)
}

async fn plan_post_handler(Json(payload): Json<ProjectionPayload>) -> Response {
    plan_response(payload)
}

fn tax_response(payload: TaxPayload) -> Response {
    tracing::debug!(?payload, "tax request");
    match build_tax_request(&tax_args_from_payload(payload)) {
        Ok(request) => json_response(StatusCode::OK, build_tax_report(request)),
        Err(msg) => rejected(&msg),
    }
}

fn projection_response(payload: ProjectionPayload) -> Response {
    tracing::debug!(?payload, "projection request");
    let projection = build_projection_inputs(&project_args_from_payload(payload))
        .and_then(|inputs| run_projection(&inputs).map_err(|e| e.to_string()));
    match projection {
        Ok(projection) => json_response(StatusCode::OK, projection),
        Err(msg) => rejected(&msg),
    }
}

fn plan_response(payload: ProjectionPayload) -> Response {
    tracing::debug!(?payload, "plan request");
    match build_plan_response(&project_args_from_payload(payload)) {
        Ok(plan) => json_response(StatusCode::OK, plan),
        Err(msg) => rejected(&msg),
    }
}

fn rejected(msg: &str) -> Response {
    tracing::warn!(error = msg, "rejected request");
    error_response(StatusCode::BAD_REQUEST, msg)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
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

fn default_tax_args() -> TaxArgs {
    TaxArgs {
        gross_income: 35_000.0,
        pension_contribution: 0.0,
    }
}

fn default_project_args() -> ProjectArgs {
    ProjectArgs {
        current_age: 22,
        retirement_age: 65,
        salary: 35_000.0,
        personal_contribution_rate: 5.0,
        pension_contribution: None,
        employer_contribution_rate: 5.0,
        additional_investment: 5_000.0,
        investment_growth_rate: 7.0,
        inflation_rate: 2.7,
        wage_growth_rate: 3.0,
        withdrawal_rate: 4.0,
    }
}

fn tax_args_from_payload(payload: TaxPayload) -> TaxArgs {
    let mut args = default_tax_args();
    if let Some(v) = payload.gross_income {
        args.gross_income = v;
    }
    if let Some(v) = payload.pension_contribution {
        args.pension_contribution = v;
    }
    args
}

fn project_args_from_payload(payload: ProjectionPayload) -> ProjectArgs {
    let mut args = default_project_args();

    if let Some(v) = payload.current_age {
        args.current_age = v;
    }
    if let Some(v) = payload.retirement_age {
        args.retirement_age = v;
    }
    if let Some(v) = payload.salary {
        args.salary = v;
    }
    if let Some(v) = payload.personal_contribution {
        args.personal_contribution_rate = v;
    }
    if let Some(v) = payload.pension_contribution {
        args.pension_contribution = Some(v);
    }
    if let Some(v) = payload.employer_contribution {
        args.employer_contribution_rate = v;
    }
    if let Some(v) = payload.additional_investment {
        args.additional_investment = v;
    }
    if let Some(v) = payload.investment_growth {
        args.investment_growth_rate = v;
    }
    if let Some(v) = payload.inflation {
        args.inflation_rate = v;
    }
    if let Some(v) = payload.wage_growth {
        args.wage_growth_rate = v;
    }
    if let Some(v) = payload.withdrawal_rate {
        args.withdrawal_rate = v;
    }

    args
}
