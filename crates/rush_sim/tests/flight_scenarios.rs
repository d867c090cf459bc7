use std::sync::{Arc, Mutex};
use std::time::Duration;

use rush_sim::config::Span;
use rush_sim::pool::Pooled;
use rush_sim::{
    CraftVisual, FlightInput, GamePhase, ScoreSink, ScoreSubmission, Session, SimConfig,
    SimEvent, SubmitError, SubmitStatus,
};

const DT: f32 = 1.0 / 60.0;

#[derive(Default)]
struct MemorySink {
    rows: Mutex<Vec<ScoreSubmission>>,
}

impl ScoreSink for MemorySink {
    fn submit(&self, submission: &ScoreSubmission) -> Result<(), SubmitError> {
        self.rows
            .lock()
            .expect("memory sink poisoned")
            .push(submission.clone());
        Ok(())
    }
}

fn ready_session(config: SimConfig) -> (Session, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::default());
    let mut session = Session::new(config, "anon-test".to_string(), sink.clone());
    assert!(session.craft_ready(CraftVisual::Placeholder));
    (session, sink)
}

fn scripted_input(frame: usize) -> FlightInput {
    match (frame / 90) % 5 {
        0 => FlightInput {
            turn_right: true,
            ..FlightInput::default()
        },
        1 => FlightInput {
            turn_left: true,
            pitch_up: true,
            boost: true,
            ..FlightInput::default()
        },
        2 => FlightInput {
            pitch_down: true,
            ..FlightInput::default()
        },
        3 => FlightInput {
            boost: true,
            ..FlightInput::default()
        },
        _ => FlightInput::default(),
    }
}

#[test]
fn boosting_for_five_seconds_scores_nine() {
    let mut config = SimConfig::default();
    config.obstacles.count = 0;
    config.rings.count = 0;
    let (mut session, _) = ready_session(config);
    assert!(session.start());

    let boost = FlightInput {
        boost: true,
        ..FlightInput::default()
    };
    for _ in 0..300 {
        session.step(DT, &boost);
    }
    assert_eq!(session.phase(), GamePhase::Playing);
    assert!((session.score().current - 8.8).abs() < 0.01);
    assert_eq!(session.final_score(), 9);
}

#[test]
fn ten_minutes_of_turning_keeps_heading_bounded() {
    let mut config = SimConfig::default();
    config.obstacles.count = 0;
    config.rings.count = 0;
    let (mut session, _) = ready_session(config);
    session.start();

    let turn = FlightInput {
        turn_right: true,
        ..FlightInput::default()
    };
    for _ in 0..(600 * 60) {
        session.step(DT, &turn);
        assert!(session.craft().controls.yaw.abs() <= std::f32::consts::PI);
    }
    assert!(session.craft().rotation.is_normalized());
}

#[test]
fn hour_of_cruise_scores_closed_form() {
    let mut config = SimConfig::default();
    config.obstacles.count = 0;
    config.rings.count = 0;
    config.clouds.count = 0;
    config.wind.count = 0;
    let (mut session, _) = ready_session(config);
    session.start();

    for _ in 0..(60 * 60 * 60) {
        session.step(DT, &FlightInput::default());
    }
    let expected = 14.0 * 0.08 * 3600.0;
    assert!((session.score().current - expected).abs() < 0.01);
    assert_eq!(session.final_score(), 4032);
}

#[test]
fn orientation_stays_unit_length() {
    let mut config = SimConfig::default();
    config.collision.safe_time = f32::INFINITY;
    let (mut session, _) = ready_session(config);
    session.start();

    for frame in 0..6_000 {
        session.step(DT, &scripted_input(frame));
        let rotation = session.craft().rotation;
        assert!(rotation.is_finite());
        assert!((rotation.length() - 1.0).abs() < 1e-4);
    }
}

#[test]
fn pooled_entities_stay_within_relevance_radius() {
    let mut config = SimConfig::default();
    config.collision.safe_time = f32::INFINITY;
    let (mut session, _) = ready_session(config.clone());
    session.start();

    for frame in 0..3_000 {
        session.step(DT, &scripted_input(frame));
        let craft = session.craft().position;
        let camera = session.camera().position;
        let pools = session.pools();

        let limit = config.obstacles.respawn_distance.powi(2);
        assert!(pools
            .obstacles
            .iter()
            .all(|o| o.distance_squared_to(craft) <= limit));

        let limit = config.rings.respawn_distance.powi(2);
        assert!(session
            .live_rings()
            .all(|r| r.distance_squared_to(craft) <= limit));

        let limit = config.clouds.respawn_distance.powi(2);
        assert!(pools
            .clouds
            .iter()
            .all(|c| c.distance_squared_to(craft) <= limit));

        let limit = config.wind.respawn_distance.powi(2);
        assert!(pools
            .wind
            .iter()
            .all(|w| w.distance_squared_to(camera) <= limit));

        assert_eq!(pools.obstacles.len(), config.obstacles.count);
        assert_eq!(pools.rings.len(), config.rings.count);
        assert_eq!(pools.clouds.len(), config.clouds.count);
        assert_eq!(pools.wind.len(), config.wind.count);
    }
}

#[test]
fn same_seed_same_flight() {
    let mut config = SimConfig::default();
    config.collision.safe_time = f32::INFINITY;
    let (mut a, _) = ready_session(config.clone());
    let (mut b, _) = ready_session(config.clone());
    a.start();
    b.start();
    for frame in 0..1_200 {
        let input = scripted_input(frame);
        assert_eq!(a.step(DT, &input), b.step(DT, &input));
    }
    assert_eq!(a.craft().position, b.craft().position);
    assert_eq!(a.score(), b.score());
    let layout = |s: &Session| -> Vec<_> {
        s.pools()
            .obstacles
            .iter()
            .map(|o| o.transform.translation)
            .collect()
    };
    assert_eq!(layout(&a), layout(&b));

    config.seed ^= 0xffff;
    let (reseeded, _) = ready_session(config);
    let first = |s: &Session| s.pools().obstacles.as_slice()[0].transform.translation;
    let (fresh, _) = ready_session(SimConfig::default());
    assert_ne!(first(&reseeded), first(&fresh));
}

#[test]
fn start_before_craft_is_ready_does_nothing() {
    let mut session = Session::new(
        SimConfig::default(),
        "anon".to_string(),
        Arc::new(MemorySink::default()),
    );
    assert!(!session.start());
    assert!(!session.restart());
    for _ in 0..10 {
        assert!(session.step(DT, &FlightInput::default()).is_empty());
    }
    assert_eq!(session.phase(), GamePhase::Loading);
    assert_eq!(session.run_time(), 0.0);
}

/// Obstacles spawn in a wall straight ahead of the start position, so every
/// run ends shortly after the grace window.
fn wall_ahead_config() -> SimConfig {
    let mut config = SimConfig::default();
    config.rings.count = 0;
    config.obstacles.placement.ahead = Span::new(8.0, 8.0);
    config.obstacles.placement.lateral = 0.0;
    config.obstacles.placement.vertical = 0.0;
    config.obstacles.placement.vertical_bias = 0.0;
    config.obstacles.size = Span::new(4.0, 4.0);
    config.collision.safe_time = 0.5;
    config
}

fn fly_until_game_over(session: &mut Session) -> Vec<SimEvent> {
    let mut events = Vec::new();
    for _ in 0..120 {
        events.extend(session.step(DT, &FlightInput::default()));
        if session.phase() == GamePhase::GameOver {
            break;
        }
    }
    events
}

#[test]
fn full_lifecycle_submits_once_per_run() {
    let (mut session, sink) = ready_session(wall_ahead_config());
    assert_eq!(session.phase(), GamePhase::Ready);
    assert!(session.start());

    let events = fly_until_game_over(&mut session);
    assert_eq!(session.phase(), GamePhase::GameOver);
    assert!(session.run_time() > 0.5);
    let game_overs: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            SimEvent::GameOver { final_score } => Some(*final_score),
            _ => None,
        })
        .collect();
    assert_eq!(game_overs, vec![1]);
    assert_eq!(
        *session.settle_submission(Duration::from_secs(5)),
        SubmitStatus::Saved
    );

    // Frames after the crash never resubmit.
    for _ in 0..30 {
        session.step(DT, &FlightInput::default());
    }
    assert!(!session.start());

    assert!(session.restart());
    assert_eq!(session.phase(), GamePhase::Ready);
    assert!(session.start());
    fly_until_game_over(&mut session);
    assert_eq!(session.phase(), GamePhase::GameOver);

    let status = session.teardown(Duration::from_secs(5));
    assert_eq!(status, SubmitStatus::Saved);
    let rows = sink.rows.lock().expect("memory sink poisoned");
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.anon_id == "anon-test" && r.score == 1));
}
