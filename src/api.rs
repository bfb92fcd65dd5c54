//! A thin Axum surface over the engine, playing the same demonstration-
//! harness role `employee-scheduling`'s `api.rs` plays for its solver:
//! `POST /schedules` runs one synchronous calculation and returns the
//! result; everything else is static info or fixture data.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::config::Config;
use crate::demo_data::{self, DemoData};
use crate::dto::{GridDto, ScheduleRequestDto, ScheduleResponseDto};
use crate::engine::Engine;
use crate::solver::good_lp_backend::GoodLpSession;
use crate::worker::Worker;

pub struct AppState {
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        AppState { config }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/info", get(info))
        .route("/demo-data", get(list_demo_data))
        .route("/demo-data/{id}", get(get_demo_data))
        .route("/schedules", post(create_schedule))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InfoResponse {
    name: &'static str,
    version: &'static str,
    solver_engine: &'static str,
}

async fn info() -> Json<InfoResponse> {
    Json(InfoResponse {
        name: "mobius-assign",
        version: env!("CARGO_PKG_VERSION"),
        solver_engine: "good_lp/microlp",
    })
}

async fn list_demo_data() -> Json<Vec<&'static str>> {
    Json(demo_data::list_demo_data())
}

/// GET /demo-data/{id} - a raw fixture, shaped as a `ScheduleRequestDto` so
/// it can be posted straight back to `/schedules`.
async fn get_demo_data(Path(id): Path<String>) -> Result<Json<ScheduleRequestDto>, StatusCode> {
    let demo: DemoData = id.parse().map_err(|_| StatusCode::NOT_FOUND)?;
    let fixture = demo_data::generate(demo);

    let environment_dto = crate::dto::EnvironmentDto::from_domain(&fixture.environment);
    let shifts = fixture
        .shifts
        .iter()
        .map(|s| crate::dto::ShiftDto {
            shift_id: s.shift_id,
            user_id: s.user_id,
            start: s.start.with_timezone(&chrono::Utc),
            stop: s.stop.with_timezone(&chrono::Utc),
        })
        .collect();
    let workers = fixture
        .worker_inputs
        .iter()
        .map(|w| crate::dto::WorkerInputDto {
            user_id: w.user_id,
            min_hours_per_workweek: w.min_hours_per_workweek,
            max_hours_per_workweek: w.max_hours_per_workweek,
            preferences: w.preferences.as_ref().map(GridDto::from),
            availability: w.availability.as_ref().map(GridDto::from),
            time_off_requests: Vec::new(),
            preceding_day_worked: w.preceding_day_worked,
            preceding_days_worked_streak: w.preceding_days_worked_streak,
            existing_shifts: Vec::new(),
            preceding_shifts: Vec::new(),
        })
        .collect();

    Ok(Json(ScheduleRequestDto {
        environment: environment_dto,
        workers,
        shifts,
    }))
}

/// POST /schedules - runs one synchronous calculation and returns the
/// mutated shifts plus the calculation report. The engine itself is
/// synchronous (spec §5); this handler hands it to a blocking thread pool
/// task so the Axum reactor is never stalled by a solver call.
async fn create_schedule(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScheduleRequestDto>,
) -> Result<Json<ScheduleResponseDto>, StatusCode> {
    let config = state.config.clone();

    let result = tokio::task::spawn_blocking(move || -> Result<ScheduleResponseDto, String> {
        let environment = request.environment.to_domain().map_err(|e| e.to_string())?;

        let workers: Vec<Worker> = request
            .workers
            .iter()
            .map(|w| Worker::new(&environment, &config, w.to_domain(&environment)))
            .filter(Worker::has_feasible_minimum)
            .collect();

        let shifts = request
            .shifts
            .iter()
            .map(|s| {
                crate::shift::Shift::new(
                    s.shift_id,
                    environment.to_local(s.start),
                    environment.to_local(s.stop),
                )
                .with_user(s.user_id)
            })
            .collect();

        let mut engine = Engine::new(environment, workers, shifts, config);
        let report = engine.calculate(GoodLpSession::new).map_err(|e| e.to_string())?;
        Ok(ScheduleResponseDto::new(&engine.shifts, &report))
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    result.map(Json).map_err(|_| StatusCode::UNPROCESSABLE_ENTITY)
}
