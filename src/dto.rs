//! Wire shapes for the task-loader/result contract (spec §6): a
//! `ScheduleRequestDto` is what `POST /schedules` accepts, a
//! `ScheduleResponseDto` is what it returns. Kept separate from the domain
//! types (`Environment`, `Worker`, `Shift`) so the engine never has a
//! serde dependency baked into its core model.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::engine::CalculationReport;
use crate::environment::Environment;
use crate::error::AssignError;
use crate::shift::Shift;
use crate::time::Day;
use crate::worker::{Grid, TimeOffRequest, TimeOffState, WorkerInput};

fn invalid(msg: impl Into<String>) -> AssignError {
    AssignError::upstream(std::io::Error::new(std::io::ErrorKind::InvalidData, msg.into()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EnvironmentDto {
    pub organization_id: u64,
    pub location_id: u64,
    pub role_id: u64,
    pub schedule_id: u64,
    /// IANA timezone name, e.g. `"America/Los_Angeles"`.
    pub tz: String,
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
    pub day_week_starts: String,
    pub min_minutes_per_workday: u32,
    pub max_minutes_per_workday: u32,
    pub min_minutes_between_shifts: u32,
    pub max_consecutive_workdays: u32,
}

impl EnvironmentDto {
    pub fn to_domain(&self) -> Result<Environment, AssignError> {
        let tz: Tz = self
            .tz
            .parse()
            .map_err(|_| invalid(format!("unrecognized timezone {}", self.tz)))?;
        let day_week_starts: Day = self.day_week_starts.parse()?;
        Ok(Environment::new(
            self.organization_id,
            self.location_id,
            self.role_id,
            self.schedule_id,
            tz,
            self.start,
            self.stop,
            day_week_starts,
            self.min_minutes_per_workday,
            self.max_minutes_per_workday,
            self.min_minutes_between_shifts,
            self.max_consecutive_workdays,
        ))
    }

    pub fn from_domain(e: &Environment) -> Self {
        EnvironmentDto {
            organization_id: e.organization_id,
            location_id: e.location_id,
            role_id: e.role_id,
            schedule_id: e.schedule_id,
            tz: e.tz.name().to_string(),
            start: e.start.with_timezone(&Utc),
            stop: e.stop.with_timezone(&Utc),
            day_week_starts: e.day_week_starts.as_str().to_string(),
            min_minutes_per_workday: e.min_minutes_per_workday,
            max_minutes_per_workday: e.max_minutes_per_workday,
            min_minutes_between_shifts: e.min_minutes_between_shifts,
            max_consecutive_workdays: e.max_consecutive_workdays,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ShiftDto {
    pub shift_id: u64,
    #[serde(default)]
    pub user_id: u64,
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
}

impl ShiftDto {
    fn to_domain(&self, environment: &Environment) -> Shift {
        Shift::new(
            self.shift_id,
            environment.to_local(self.start),
            environment.to_local(self.stop),
        )
        .with_user(self.user_id)
    }

    fn from_domain(s: &Shift) -> Self {
        ShiftDto {
            shift_id: s.shift_id,
            user_id: s.user_id,
            start: s.start.with_timezone(&Utc),
            stop: s.stop.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOffStateDto {
    ApprovedPaid,
    ApprovedUnpaid,
    Sick,
    Denied,
    Pending,
}

impl From<TimeOffStateDto> for TimeOffState {
    fn from(d: TimeOffStateDto) -> TimeOffState {
        match d {
            TimeOffStateDto::ApprovedPaid => TimeOffState::ApprovedPaid,
            TimeOffStateDto::ApprovedUnpaid => TimeOffState::ApprovedUnpaid,
            TimeOffStateDto::Sick => TimeOffState::Sick,
            TimeOffStateDto::Denied => TimeOffState::Denied,
            TimeOffStateDto::Pending => TimeOffState::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TimeOffRequestDto {
    pub state: TimeOffStateDto,
    pub minutes_paid: u32,
    pub start: DateTime<Utc>,
}

impl TimeOffRequestDto {
    fn to_domain(&self, environment: &Environment) -> TimeOffRequest {
        TimeOffRequest {
            state: self.state.into(),
            minutes_paid: self.minutes_paid,
            start: environment.to_local(self.start),
        }
    }
}

/// A 7x24 availability/preference grid, wire-shaped as seven 24-long rows
/// in `Day::Monday..=Day::Sunday` order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GridDto(pub [[u8; 24]; 7]);

impl From<&Grid> for GridDto {
    fn from(g: &Grid) -> Self {
        GridDto(g.0)
    }
}

impl From<&GridDto> for Grid {
    fn from(g: &GridDto) -> Self {
        Grid(g.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkerInputDto {
    pub user_id: u64,
    pub min_hours_per_workweek: f64,
    pub max_hours_per_workweek: f64,
    #[serde(default)]
    pub preferences: Option<GridDto>,
    #[serde(default)]
    pub availability: Option<GridDto>,
    #[serde(default)]
    pub time_off_requests: Vec<TimeOffRequestDto>,
    #[serde(default)]
    pub preceding_day_worked: Option<bool>,
    #[serde(default)]
    pub preceding_days_worked_streak: Option<u32>,
    #[serde(default)]
    pub existing_shifts: Vec<ShiftDto>,
    #[serde(default)]
    pub preceding_shifts: Vec<ShiftDto>,
}

impl WorkerInputDto {
    pub fn to_domain(&self, environment: &Environment) -> WorkerInput {
        WorkerInput {
            user_id: self.user_id,
            min_hours_per_workweek: self.min_hours_per_workweek,
            max_hours_per_workweek: self.max_hours_per_workweek,
            preferences: self.preferences.as_ref().map(Grid::from),
            availability: self.availability.as_ref().map(Grid::from),
            time_off_requests: self
                .time_off_requests
                .iter()
                .map(|r| r.to_domain(environment))
                .collect(),
            preceding_day_worked: self.preceding_day_worked,
            preceding_days_worked_streak: self.preceding_days_worked_streak,
            existing_shifts: self.existing_shifts.iter().map(|s| s.to_domain(environment)).collect(),
            preceding_shifts: self.preceding_shifts.iter().map(|s| s.to_domain(environment)).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScheduleRequestDto {
    pub environment: EnvironmentDto,
    pub workers: Vec<WorkerInputDto>,
    pub shifts: Vec<ShiftDto>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkerReportDto {
    pub user_id: u64,
    pub assigned_minutes: i64,
    pub min_hours_violated: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CalculationReportDto {
    pub consecutive_days_off: bool,
    pub happiness_scoring: bool,
    pub objective_value: f64,
    pub unassigned_shift_ids: Vec<u64>,
    pub workers: Vec<WorkerReportDto>,
}

impl From<&CalculationReport> for CalculationReportDto {
    fn from(r: &CalculationReport) -> Self {
        CalculationReportDto {
            consecutive_days_off: r.consecutive_days_off,
            happiness_scoring: r.happiness_scoring,
            objective_value: r.objective_value,
            unassigned_shift_ids: r.unassigned_shift_ids.clone(),
            workers: r
                .workers
                .iter()
                .map(|w| WorkerReportDto {
                    user_id: w.user_id,
                    assigned_minutes: w.assigned_minutes,
                    min_hours_violated: w.min_hours_violated,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ScheduleResponseDto {
    pub shifts: Vec<ShiftDto>,
    pub report: CalculationReportDto,
}

impl ScheduleResponseDto {
    pub fn new(shifts: &[Shift], report: &CalculationReport) -> Self {
        ScheduleResponseDto {
            shifts: shifts.iter().map(ShiftDto::from_domain).collect(),
            report: CalculationReportDto::from(report),
        }
    }
}

impl FromStr for TimeOffStateDto {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "approved_paid" => Ok(TimeOffStateDto::ApprovedPaid),
            "approved_unpaid" => Ok(TimeOffStateDto::ApprovedUnpaid),
            "sick" => Ok(TimeOffStateDto::Sick),
            "denied" => Ok(TimeOffStateDto::Denied),
            "pending" => Ok(TimeOffStateDto::Pending),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Day;

    fn environment_dto() -> EnvironmentDto {
        EnvironmentDto {
            organization_id: 1,
            location_id: 1,
            role_id: 1,
            schedule_id: 1,
            tz: "America/Los_Angeles".to_string(),
            start: chrono::Utc.with_ymd_and_hms(2015, 12, 21, 16, 0, 0).unwrap(),
            stop: chrono::Utc.with_ymd_and_hms(2015, 12, 28, 16, 0, 0).unwrap(),
            day_week_starts: "monday".to_string(),
            min_minutes_per_workday: 300,
            max_minutes_per_workday: 480,
            min_minutes_between_shifts: 720,
            max_consecutive_workdays: 6,
        }
    }

    use chrono::TimeZone;

    #[test]
    fn environment_round_trips_through_dto() {
        let dto = environment_dto();
        let env = dto.to_domain().unwrap();
        assert_eq!(env.day_week_starts, Day::Monday);
        let back = EnvironmentDto::from_domain(&env);
        assert_eq!(back.tz, "America/Los_Angeles");
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let mut dto = environment_dto();
        dto.tz = "Not/A_Zone".to_string();
        assert!(dto.to_domain().is_err());
    }

    #[test]
    fn shift_dto_round_trips_through_environment_tz() {
        let env = environment_dto().to_domain().unwrap();
        let shift_dto = ShiftDto {
            shift_id: 1,
            user_id: 0,
            start: chrono::Utc.with_ymd_and_hms(2015, 12, 22, 0, 0, 0).unwrap(),
            stop: chrono::Utc.with_ymd_and_hms(2015, 12, 22, 8, 0, 0).unwrap(),
        };
        let shift = shift_dto.to_domain(&env);
        assert_eq!(shift.shift_id, 1);
        let back = ShiftDto::from_domain(&shift);
        assert_eq!(back.start, shift_dto.start);
    }
}
