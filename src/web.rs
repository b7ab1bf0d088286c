use actix_web::{error, http::header, middleware, web, App, HttpResponse, HttpServer, Result};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use crate::error::RosterError;
use crate::export::write_schedule_csv;
use crate::parser::{IdGenerator, ParticipantRecord, PeriodSpec, Roster};
use crate::schedule::{DutyRosterEngine, RunOutcome};
use crate::storage::JsonStore;

/// The roster being edited plus the schedule last computed from it.
///
/// Every edit re-runs the engine. Edits keep still-valid assignments, a reset rebuilds the
/// schedule over the same period and a clear empties the period as well.
pub struct RosterService {
    engine: DutyRosterEngine,
    roster: Roster,
    outcome: RunOutcome,
    store: Option<JsonStore>,
    ids: IdGenerator,
}

impl RosterService {
    pub fn new(engine: DutyRosterEngine, roster: Roster, store: Option<JsonStore>) -> crate::error::Result<Self> {
        let ids = IdGenerator::new(engine.config().seed);
        let mut service = Self {
            engine,
            roster,
            outcome: RunOutcome::default(),
            store,
            ids,
        };
        service.recompute(false)?;
        Ok(service)
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn outcome(&self) -> &RunOutcome {
        &self.outcome
    }

    pub fn set_period(&mut self, period: PeriodSpec) -> crate::error::Result<()> {
        // validate before touching anything
        period.days(self.engine.config())?;
        self.roster.period = period;
        self.recompute(false)
    }

    /// Returns the id the participant ended up with
    pub fn upsert_participant(&mut self, record: ParticipantRecord) -> crate::error::Result<String> {
        let id = match record.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => self.ids.next_id(&self.roster.ids()),
        };

        let mut participant = record.into_participant(id.clone());
        if participant.assigned_dates.is_empty() {
            // keep the current duties of an existing participant unless the record brings its own
            if let Some(existing) = self.roster.participants.iter().find(|p| p.id == id) {
                participant.assigned_dates = existing.assigned_dates.clone();
            }
        }
        self.roster.upsert(participant);
        self.recompute(false)?;
        Ok(id)
    }

    pub fn remove_participant(&mut self, id: &str) -> crate::error::Result<bool> {
        if !self.roster.remove(id) {
            return Ok(false);
        }
        self.recompute(false)?;
        Ok(true)
    }

    pub fn rebalance(&mut self) -> crate::error::Result<()> {
        let previous = std::mem::take(&mut self.outcome);
        self.outcome = self.engine.rebalance(previous);
        self.roster.apply_assignments(&self.outcome.participants);
        self.persist()
    }

    /// Drops every assignment and builds the schedule from scratch over the current period
    pub fn reset(&mut self) -> crate::error::Result<()> {
        self.recompute(true)
    }

    /// Empties the period and every participant's duties; participants stay on the roster
    pub fn clear(&mut self) -> crate::error::Result<()> {
        self.roster.period = PeriodSpec::Dates { dates: vec![] };
        for p in &mut self.roster.participants {
            p.assigned_dates.clear();
        }
        info!(participants = self.roster.participants.len(), "roster period cleared");
        self.recompute(true)
    }

    pub fn export_csv(&self) -> crate::error::Result<Vec<u8>> {
        let mut buf = Vec::new();
        write_schedule_csv(&self.outcome.schedule, &mut buf, self.engine.config().seed)?;
        Ok(buf)
    }

    fn recompute(&mut self, fresh: bool) -> crate::error::Result<()> {
        let days = self.roster.days(self.engine.config())?;
        let participants = self.roster.participants.clone();
        self.outcome = if fresh {
            self.engine.run(participants, days)
        } else {
            self.engine.repair(participants, days)
        };
        self.roster.apply_assignments(&self.outcome.participants);
        self.persist()
    }

    fn persist(&self) -> crate::error::Result<()> {
        if let Some(store) = &self.store {
            store.save(&self.roster)?;
        }
        Ok(())
    }
}

pub struct AppState {
    pub roster: Mutex<RosterService>,
}

impl AppState {
    pub fn new(service: RosterService) -> Self {
        Self {
            roster: Mutex::new(service),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, RosterService>> {
        self.roster
            .lock()
            .map_err(|_| error::ErrorInternalServerError("roster state is unavailable"))
    }
}

#[derive(Serialize)]
pub struct ScheduleResponse<'a> {
    #[serde(flatten)]
    outcome: &'a RunOutcome,
    messages: Vec<String>,
}

fn bad_request(e: RosterError) -> HttpResponse {
    warn!(error = %e, "rejected roster change");
    HttpResponse::BadRequest().json(serde_json::json!({"success": false, "error": e.to_string()}))
}

fn schedule_json(service: &RosterService) -> HttpResponse {
    let outcome = service.outcome();
    HttpResponse::Ok().json(ScheduleResponse {
        outcome,
        messages: outcome.advisory_messages(),
    })
}

async fn get_schedule(state: web::Data<AppState>) -> Result<HttpResponse> {
    let service = state.lock()?;
    Ok(schedule_json(&service))
}

async fn set_period(body: web::Json<PeriodSpec>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut service = state.lock()?;
    match service.set_period(body.into_inner()) {
        Ok(()) => Ok(schedule_json(&service)),
        Err(e) => Ok(bad_request(e)),
    }
}

async fn upsert_participant(body: web::Json<ParticipantRecord>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut service = state.lock()?;
    match service.upsert_participant(body.into_inner()) {
        Ok(id) => {
            info!(participant = %id, "participant saved");
            Ok(HttpResponse::Ok().json(serde_json::json!({"success": true, "id": id})))
        }
        Err(e) => Ok(bad_request(e)),
    }
}

async fn delete_participant(id: web::Path<String>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut service = state.lock()?;
    match service.remove_participant(id.as_str()) {
        Ok(true) => Ok(HttpResponse::Ok().json(serde_json::json!({"success": true}))),
        Ok(false) => Ok(HttpResponse::NotFound().json(serde_json::json!({"success": false, "error": "Unknown participant"}))),
        Err(e) => Ok(bad_request(e)),
    }
}

async fn rebalance(state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut service = state.lock()?;
    match service.rebalance() {
        Ok(()) => Ok(schedule_json(&service)),
        Err(e) => Ok(bad_request(e)),
    }
}

async fn reset(state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut service = state.lock()?;
    match service.reset() {
        Ok(()) => Ok(schedule_json(&service)),
        Err(e) => Ok(bad_request(e)),
    }
}

async fn clear(state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut service = state.lock()?;
    match service.clear() {
        Ok(()) => Ok(schedule_json(&service)),
        Err(e) => Ok(bad_request(e)),
    }
}

async fn export_schedule(state: web::Data<AppState>) -> Result<HttpResponse> {
    let service = state.lock()?;
    let csv = service
        .export_csv()
        .map_err(|e| error::ErrorInternalServerError(format!("Failed to export schedule: {}", e)))?;
    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header((header::CONTENT_DISPOSITION, "attachment; filename=\"schedule.csv\""))
        .body(csv))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/schedule", web::get().to(get_schedule))
        .route("/api/period", web::put().to(set_period))
        .route("/api/participants", web::post().to(upsert_participant))
        .route("/api/participants/{id}", web::delete().to(delete_participant))
        .route("/api/rebalance", web::post().to(rebalance))
        .route("/api/reset", web::post().to(reset))
        .route("/api/clear", web::post().to(clear))
        .route("/api/export", web::get().to(export_schedule));
}

pub async fn start_server(port: u16, service: RosterService) -> std::io::Result<()> {
    let app_state = web::Data::new(AppState::new(service));

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
