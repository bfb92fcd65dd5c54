//! Weekly shift-assignment engine: builds a mixed-integer program over
//! worker/shift pairs and solves it under an escalating feasibility
//! fallback, mirroring the Staffjoy `mobius` worker's `assign` module.

pub mod api;
pub mod config;
pub mod demo_data;
pub mod dto;
pub mod engine;
pub mod environment;
pub mod error;
pub mod shift;
pub mod solver;
pub mod tasking;
pub mod telemetry;
pub mod time;
pub mod worker;
