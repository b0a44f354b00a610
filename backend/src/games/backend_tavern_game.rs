use axum::{
    extract::{Extension, Path, Query, State},
    routing::{get, post},
    Json,
    Router,
    debug_handler,
};
use rand::thread_rng;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use time::macros::format_description;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use shared::constants::{INVALID_FLAIR_ERROR, MALFORMED_NUMBER_ERROR, NEGATIVE_INVESTMENT_ERROR};
use shared::shared_settlement::{settle, SettlementResult};
use shared::shared_tavern_game::{
    NewTavernSessionResponse, OutcomeGenerator, RotationAccumulator, TavernLedgerResponse,
    TavernSpinRequest, TavernSpinResponse, WheelConfig,
};
use shared::validation::{validate_flair_pct, validate_investment};

use crate::error::Error;
use crate::AppState;

// A tavern session lives for an hour of inactivity from creation
const SESSION_EXPIRY_SECONDS: u64 = 3600;

/// One patron's seat at the wheel: the rotation accumulator and ledger are
/// session-scoped, mutated only under the sessions lock so spins within a
/// session stay strictly sequential.
pub struct TavernSession {
    pub generator: OutcomeGenerator,
    pub rotation: RotationAccumulator,
    pub ledger: Vec<SettlementResult>, // newest first
    pub last_result: Option<SettlementResult>,
    pub created_at: u64,
}

#[derive(Clone)]
pub struct TavernGameState {
    pub sessions: Arc<Mutex<HashMap<String, TavernSession>>>,
}

impl TavernGameState {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn cleanup_expired_sessions(&self) {
        let mut sessions = self.sessions.lock().await;
        let now = unix_now();
        sessions.retain(|_, session| now - session.created_at < SESSION_EXPIRY_SECONDS);
    }
}

impl Default for TavernGameState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn create_router(state: TavernGameState) -> Router {
    Router::new()
        .route("/new", post(new_session))
        .route("/spin", post(spin_wheel))
        .route("/ledger/:session_id", get(get_ledger))
        .route("/last/:session_id", get(get_last_result))
        .with_state(Arc::new(state))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn ledger_date() -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    time::OffsetDateTime::now_utc()
        .format(&format)
        .unwrap_or_default()
}

fn spin_message(result: &SettlementResult) -> String {
    if result.wheel_pct < 0.0 {
        format!(
            "Loss of {:.1}%: down roughly {:.1} gp, even with {}% narrative flair.",
            result.wheel_pct,
            result.net_profit.abs(),
            result.flair_pct
        )
    } else {
        format!(
            "Gain of {:.1}%: about {:.1} gp profit after a {}% flair bonus.",
            result.wheel_pct, result.net_profit, result.flair_pct
        )
    }
}

#[debug_handler]
async fn new_session(
    State(state): State<Arc<TavernGameState>>,
    Extension(app_state): Extension<AppState>,
) -> Result<Json<NewTavernSessionResponse>, Error> {
    state.cleanup_expired_sessions().await;

    let generator = OutcomeGenerator::new(WheelConfig::default())?;
    let wheel = *generator.config();

    // Pre-populate the session's ledger from the persisted store, newest first
    let ledger = app_state.ledger.load_all().await;
    let ledger_entries = ledger.len();

    let session_id = Uuid::new_v4().to_string();
    let mut sessions = state.sessions.lock().await;
    sessions.insert(
        session_id.clone(),
        TavernSession {
            generator,
            rotation: RotationAccumulator::new(),
            ledger,
            last_result: None,
            created_at: unix_now(),
        },
    );

    info!(
        "🍺 New tavern session {} with {} historical ledger entries",
        session_id, ledger_entries
    );

    Ok(Json(NewTavernSessionResponse {
        session_id,
        ledger_entries,
        wheel,
    }))
}

#[debug_handler]
async fn spin_wheel(
    State(state): State<Arc<TavernGameState>>,
    Extension(app_state): Extension<AppState>,
    Json(request): Json<TavernSpinRequest>,
) -> Result<Json<TavernSpinResponse>, Error> {
    // Absent numeric input is a deliberate zero default, not an error; a
    // value that was supplied must pass validation.
    let investment = request.investment.unwrap_or(0.0);
    let flair_pct = request.flair_pct.unwrap_or(0.0);

    validate_investment(investment).map_err(|err| match err.code.as_ref() {
        "malformed_investment" => Error::InvalidInput(MALFORMED_NUMBER_ERROR.to_string()),
        _ => Error::InvalidInput(NEGATIVE_INVESTMENT_ERROR.to_string()),
    })?;
    if request.flair_pct.is_some() {
        validate_flair_pct(flair_pct)
            .map_err(|_| Error::InvalidInput(INVALID_FLAIR_ERROR.to_string()))?;
    }

    let (outcome, rotation, settlement, ledger_len) = {
        let mut sessions = state.sessions.lock().await;
        let session = sessions
            .get_mut(&request.session_id)
            .ok_or(Error::SessionNotFound)?;

        let mut rng = thread_rng();
        let outcome = session.generator.draw(&mut rng);
        let rotation = session.rotation.advance(&mut rng, outcome.dial_angle_degrees);
        let settlement = settle(investment, outcome.percentage, flair_pct, ledger_date())?;

        // Newest first, append-only
        session.ledger.insert(0, settlement.clone());
        session.last_result = Some(settlement.clone());
        (outcome, rotation, settlement, session.ledger.len())
    };

    // Best-effort external persistence; the in-memory entry above is already
    // recorded, so a storage failure only gets logged inside the store.
    app_state.ledger.append(&settlement).await;

    info!(
        "🎡 TAVERN SPIN: session {} wheel {:+.1}% on {} gp, net {:+.1} gp ({} ledger entries)",
        request.session_id, settlement.wheel_pct, settlement.investment, settlement.net_profit,
        ledger_len
    );

    let message = spin_message(&settlement);
    Ok(Json(TavernSpinResponse {
        outcome,
        rotation,
        settlement,
        message,
    }))
}

#[derive(Deserialize)]
pub struct LedgerQuery {
    pub limit: Option<usize>,
}

#[debug_handler]
async fn get_ledger(
    State(state): State<Arc<TavernGameState>>,
    Path(session_id): Path<String>,
    Query(params): Query<LedgerQuery>,
) -> Result<Json<TavernLedgerResponse>, Error> {
    let sessions = state.sessions.lock().await;
    let session = sessions.get(&session_id).ok_or(Error::SessionNotFound)?;

    // count always reflects the full ledger; limit only trims the page
    let count = session.ledger.len();
    let entries = match params.limit {
        Some(limit) => session.ledger.iter().take(limit).cloned().collect(),
        None => session.ledger.clone(),
    };
    Ok(Json(TavernLedgerResponse { entries, count }))
}

/// The most recent settled spin, replaced on every spin; None until the
/// session's first spin.
#[debug_handler]
async fn get_last_result(
    State(state): State<Arc<TavernGameState>>,
    Path(session_id): Path<String>,
) -> Result<Json<Option<SettlementResult>>, Error> {
    let sessions = state.sessions.lock().await;
    let session = sessions.get(&session_id).ok_or(Error::SessionNotFound)?;
    Ok(Json(session.last_result.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ledger_service::LedgerStore;
    use shared::constants::POINTER_ANGLE_DEGREES;

    fn test_state() -> (Arc<TavernGameState>, AppState) {
        (
            Arc::new(TavernGameState::new()),
            AppState {
                ledger: LedgerStore::disabled(),
            },
        )
    }

    async fn open_session(state: &Arc<TavernGameState>, app_state: &AppState) -> String {
        let Json(response) = new_session(State(state.clone()), Extension(app_state.clone()))
            .await
            .unwrap();
        response.session_id
    }

    #[tokio::test]
    async fn test_spin_records_ledger_newest_first() {
        let (state, app_state) = test_state();
        let session_id = open_session(&state, &app_state).await;

        for investment in [10.0, 20.0, 30.0] {
            let request = TavernSpinRequest {
                session_id: session_id.clone(),
                investment: Some(investment),
                flair_pct: Some(5.0),
            };
            spin_wheel(
                State(state.clone()),
                Extension(app_state.clone()),
                Json(request),
            )
            .await
            .unwrap();
        }

        let Json(ledger) = get_ledger(
            State(state.clone()),
            Path(session_id.clone()),
            Query(LedgerQuery { limit: None }),
        )
        .await
        .unwrap();
        assert_eq!(ledger.count, 3);
        assert_eq!(ledger.entries[0].investment, 30.0);
        assert_eq!(ledger.entries[2].investment, 10.0);

        // A limit trims the page but not the reported count
        let Json(page) = get_ledger(
            State(state.clone()),
            Path(session_id),
            Query(LedgerQuery { limit: Some(2) }),
        )
        .await
        .unwrap();
        assert_eq!(page.count, 3);
        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.entries[0].investment, 30.0);
    }

    #[tokio::test]
    async fn test_rotation_grows_and_lands_on_drawn_angle() {
        let (state, app_state) = test_state();
        let session_id = open_session(&state, &app_state).await;

        let mut previous_total = 0.0;
        for _ in 0..25 {
            let request = TavernSpinRequest {
                session_id: session_id.clone(),
                investment: Some(100.0),
                flair_pct: Some(10.0),
            };
            let Json(response) = spin_wheel(
                State(state.clone()),
                Extension(app_state.clone()),
                Json(request),
            )
            .await
            .unwrap();

            let total = response.rotation.total_rotation_degrees;
            assert!(total > previous_total);
            previous_total = total;

            let resting = total.rem_euclid(360.0);
            let expected =
                (POINTER_ANGLE_DEGREES - response.outcome.dial_angle_degrees).rem_euclid(360.0);
            assert!((resting - expected).abs() < 1e-6);
        }
    }

    #[tokio::test]
    async fn test_missing_inputs_default_to_zero() {
        let (state, app_state) = test_state();
        let session_id = open_session(&state, &app_state).await;

        let request = TavernSpinRequest {
            session_id,
            investment: None,
            flair_pct: None,
        };
        let Json(response) = spin_wheel(State(state), Extension(app_state), Json(request))
            .await
            .unwrap();
        assert_eq!(response.settlement.investment, 0.0);
        assert_eq!(response.settlement.flair_pct, 0.0);
        assert_eq!(response.settlement.final_amount, 0.0);
        assert_eq!(response.settlement.net_profit, 0.0);
    }

    #[tokio::test]
    async fn test_invalid_inputs_rejected() {
        let (state, app_state) = test_state();
        let session_id = open_session(&state, &app_state).await;

        let negative = TavernSpinRequest {
            session_id: session_id.clone(),
            investment: Some(-50.0),
            flair_pct: Some(5.0),
        };
        assert!(matches!(
            spin_wheel(
                State(state.clone()),
                Extension(app_state.clone()),
                Json(negative)
            )
            .await,
            Err(Error::InvalidInput(_))
        ));

        let off_tier = TavernSpinRequest {
            session_id,
            investment: Some(50.0),
            flair_pct: Some(7.0),
        };
        assert!(matches!(
            spin_wheel(State(state), Extension(app_state), Json(off_tier)).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_last_result_tracks_latest_spin() {
        let (state, app_state) = test_state();
        let session_id = open_session(&state, &app_state).await;

        let Json(before) = get_last_result(State(state.clone()), Path(session_id.clone()))
            .await
            .unwrap();
        assert!(before.is_none());

        for investment in [10.0, 40.0] {
            let request = TavernSpinRequest {
                session_id: session_id.clone(),
                investment: Some(investment),
                flair_pct: Some(15.0),
            };
            spin_wheel(
                State(state.clone()),
                Extension(app_state.clone()),
                Json(request),
            )
            .await
            .unwrap();
        }

        let Json(after) = get_last_result(State(state), Path(session_id))
            .await
            .unwrap();
        assert_eq!(after.unwrap().investment, 40.0);
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let (state, app_state) = test_state();
        let request = TavernSpinRequest {
            session_id: "nope".to_string(),
            investment: Some(10.0),
            flair_pct: Some(5.0),
        };
        assert!(matches!(
            spin_wheel(State(state.clone()), Extension(app_state), Json(request)).await,
            Err(Error::SessionNotFound)
        ));
        assert!(matches!(
            get_ledger(
                State(state),
                Path("nope".to_string()),
                Query(LedgerQuery { limit: None })
            )
            .await,
            Err(Error::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn test_expired_sessions_are_swept() {
        let (state, app_state) = test_state();
        let session_id = open_session(&state, &app_state).await;
        {
            let mut sessions = state.sessions.lock().await;
            sessions.get_mut(&session_id).unwrap().created_at = 0;
        }
        state.cleanup_expired_sessions().await;
        assert!(state.sessions.lock().await.is_empty());
    }
}
