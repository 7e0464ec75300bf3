use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use panel_optimizer::solver::{Config, Solver};
use panel_optimizer::types::{MultiBoardResult, Piece, Rect, deserialize_u32_from_number};
use panel_optimizer::{Error, ScoreStrategy};
use serde::{Deserialize, Serialize};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Deserialize, Serialize)]
struct OptimizeRequest {
    board: Rect,
    pieces: Vec<Piece>,
    #[serde(default, deserialize_with = "deserialize_u32_from_number")]
    kerf: u32,
    #[serde(default)]
    strategy: ScoreStrategy,
    /// Run every strategy and keep the plan with the fewest boards.
    #[serde(default)]
    try_all_strategies: bool,
}

#[derive(Serialize)]
struct OptimizeResponse {
    #[serde(flatten)]
    result: MultiBoardResult,
    waste_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

fn run(req: OptimizeRequest) -> Result<OptimizeResponse, Error> {
    let config = Config {
        kerf: req.kerf,
        strategy: req.strategy,
    };
    let solver = Solver::new(req.board, config, req.pieces);
    let result = if req.try_all_strategies {
        solver.solve_best()?
    } else {
        solver.solve()?
    };
    Ok(OptimizeResponse {
        waste_percent: result.waste_percent(),
        warning: result.warning(),
        result,
    })
}

fn status_for(err: &Error) -> StatusCode {
    if err.is_validation() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

async fn optimize(
    Json(req): Json<OptimizeRequest>,
) -> Result<Json<OptimizeResponse>, (StatusCode, String)> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /optimize"
    );

    // Large cutting lists take a while; keep them off the reactor threads.
    let outcome = tokio::task::spawn_blocking(move || run(req))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "optimizer task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "optimizer task failed".to_string(),
            )
        })?;

    match outcome {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                tracing::error!(error = %e, "optimization aborted");
            }
            Err((status, e.to_string()))
        }
    }
}

fn app() -> Router {
    Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/optimize", post(optimize))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

async fn serve(addr: String) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    eprintln!("Listening on {addr}");
    axum::serve(listener, app()).await
}

fn main() {
    let log_path = std::env::var("LOG_FILE").unwrap_or_else(|_| "development.log".to_string());
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .unwrap_or_else(|e| {
            eprintln!("Error: cannot open {log_path}: {e}");
            std::process::exit(1);
        });

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    // Must outlive the runtime so queued events are flushed on shutdown.
    let _sentry = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| {
            eprintln!("Error: cannot start runtime: {e}");
            std::process::exit(1);
        });

    if let Err(e) = runtime.block_on(serve(addr)) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> OptimizeRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_request_defaults() {
        let req = request(r#"{"board":{"w":2770,"h":2040},"pieces":[]}"#);
        assert_eq!(req.kerf, 0);
        assert_eq!(req.strategy, ScoreStrategy::BestAreaFit);
        assert!(!req.try_all_strategies);
    }

    #[test]
    fn test_negative_kerf_rejected_at_parse_time() {
        let parsed = serde_json::from_str::<OptimizeRequest>(
            r#"{"board":{"w":2770,"h":2040},"pieces":[],"kerf":-3}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_run_reports_warning_and_flattened_result() {
        let req = request(
            r#"{
                "board": {"w": 2770, "h": 2040},
                "kerf": 3.0,
                "strategy": "best_short_side_fit",
                "pieces": [
                    {"id": "door", "rect": {"w": 800, "h": 600}, "qty": 2},
                    {"id": "slab", "rect": {"w": 3000, "h": 3000}, "qty": 1, "allow_rotate": false}
                ]
            }"#,
        );
        let response = run(req).unwrap();
        assert_eq!(response.result.total_placed_pieces, 2);
        assert_eq!(
            response.warning.as_deref(),
            Some("1 piece exceeds the maximum board size")
        );

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["total_boards"], 1);
        assert!(json["waste_percent"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn test_validation_errors_map_to_bad_request() {
        let req = request(
            r#"{"board":{"w":2770,"h":2040},"pieces":[{"id":"x","rect":{"w":10,"h":10},"qty":0}]}"#,
        );
        let err = run(req).err().unwrap();
        assert_eq!(status_for(&err), StatusCode::BAD_REQUEST);

        let internal = Error::InvariantViolation {
            board: 1,
            piece_id: "x".to_string(),
            detail: "test".to_string(),
        };
        assert_eq!(status_for(&internal), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
