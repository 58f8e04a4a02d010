use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use boa_pratica::config::AppConfig;
use boa_pratica::error::AppError;
use boa_pratica::telemetry;
use boa_pratica::workflows::practice::{
    ChecklistAnswer, Contract, ContractResponsible, EvaluationCatalog, EvaluationItem, ItemId,
    Matricula, MemoryCatalog, MemoryDirectory, MemoryPracticeStore, PracticeDraft,
    PracticeWorkflowService, TransitionReceipt, VoteRound,
};
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Good Practice Workflow",
    about = "Run the good-practice review and voting workflow service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Drive one practice through the full review lifecycle in memory
    Walkthrough,
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Walkthrough => run_walkthrough(),
    }
}

type DemoService = PracticeWorkflowService<MemoryPracticeStore, MemoryDirectory, MemoryCatalog>;

fn demo_catalog() -> MemoryCatalog {
    MemoryCatalog::new(vec![
        EvaluationItem {
            id: ItemId(1),
            text: "Does the practice introduce a new safety risk?".to_string(),
            is_eliminatory: true,
        },
        EvaluationItem {
            id: ItemId(2),
            text: "Does the practice conflict with an existing procedure?".to_string(),
            is_eliminatory: true,
        },
        EvaluationItem {
            id: ItemId(3),
            text: "Is the described gain measurable?".to_string(),
            is_eliminatory: false,
        },
    ])
}

fn demo_directory() -> MemoryDirectory {
    MemoryDirectory::new(vec![ContractResponsible {
        contract: Contract("CT-100".to_string()),
        sesmt_reviewer: Matricula("100001".to_string()),
        management_reviewer: Matricula("200001".to_string()),
    }])
}

fn build_service(validator: &str) -> Arc<DemoService> {
    Arc::new(PracticeWorkflowService::new(
        Arc::new(MemoryPracticeStore::default()),
        Arc::new(demo_directory()),
        Arc::new(demo_catalog()),
        Matricula(validator.to_string()),
    ))
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let service = build_service(&config.workflow.validator_matricula);

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(boa_pratica::workflows::practice::practice_router(service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "good-practice workflow service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_walkthrough() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let validator_id = config.workflow.validator_matricula;
    let service = build_service(&validator_id);

    let sesmt = Matricula("100001".to_string());
    let management = Matricula("200001".to_string());
    let validator = Matricula(validator_id);
    let author = Matricula("333444".to_string());
    let contract = Contract("CT-100".to_string());

    println!("Good-practice workflow walkthrough");

    let receipt = service.create(
        PracticeDraft {
            title: "Pre-shift harness inspection".to_string(),
            description: "Checklist posted at the locker room exit".to_string(),
            objective: "Cut fall-protection incidents at height work".to_string(),
            contract: contract.clone(),
        },
        &author,
    )?;
    print_stage("created", &receipt);
    let id = receipt.practice.id.clone();

    let all_clear: Vec<ChecklistAnswer> = demo_catalog()
        .active_items()
        .iter()
        .map(|item| ChecklistAnswer {
            item_id: item.id,
            answer: !item.is_eliminatory,
        })
        .collect();

    let receipt = service.submit_sesmt_evaluation(&id, &sesmt, &all_clear)?;
    print_stage("sesmt evaluation", &receipt);

    let receipt = service.submit_management_evaluation(&id, &management, &all_clear, Some(4))?;
    print_stage("management evaluation", &receipt);

    let receipt = service.validate(&id, &validator, true, None)?;
    print_stage("validation", &receipt);

    let voter = Matricula("555666".to_string());
    let queue = service.vote_queue(&voter, &contract, VoteRound::Quarterly)?;
    println!(
        "- quarterly queue for voter {voter}: {} practice(s)",
        queue.len()
    );

    service.cast_vote(&id, &voter, &contract, VoteRound::Quarterly)?;
    let remaining = service.vote_queue(&voter, &contract, VoteRound::Quarterly)?;
    println!(
        "- vote cast; queue now holds {} practice(s), {} ballot(s) on record",
        remaining.len(),
        service.votes_for_practice(&id)?.len()
    );

    let stats = service.stats(Some(&contract))?;
    println!(
        "- stats for {contract}: total {}, in review {}, rejected/eliminated {}",
        stats.total, stats.in_review, stats.rejected_or_eliminated
    );

    Ok(())
}

fn print_stage(stage: &str, receipt: &TransitionReceipt) {
    let owner = receipt
        .practice
        .current_owner
        .as_ref()
        .map(|owner| owner.0.as_str())
        .unwrap_or("nobody");
    println!(
        "- {stage}: status {}, next owner {owner}",
        receipt.practice.status.label()
    );
    if let Some(warning) = &receipt.warning {
        println!("  warning: {}", warning.message());
    }
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
