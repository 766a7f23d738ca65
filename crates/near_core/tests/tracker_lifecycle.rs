use std::sync::Arc;
use std::time::Duration;

use near_core::host::memory::{DisplayEvent, InMemoryWorld, RecordingDisplay, RecordingNotifier};
use near_core::scheduler::{ManualScheduler, Scheduler, TokioScheduler};
use near_core::tracker::{Phase, StopReason};
use near_core::{
    Location, NearError, NearHost, NearService, NearSettings, Notice, PlayerId, PolicyRejection,
    Position, Unreachable,
};

struct Harness {
    world: Arc<InMemoryWorld>,
    display: Arc<RecordingDisplay>,
    notifier: Arc<RecordingNotifier>,
    scheduler: Arc<ManualScheduler>,
    service: NearService,
    viewer: PlayerId,
    target: PlayerId,
}

fn at(x: f64, z: f64) -> Location {
    Location::new("world", Position::new(x, 64.0, z), 0.0)
}

fn harness(configure: impl FnOnce(&mut NearSettings)) -> Harness {
    let mut settings = NearSettings::default();
    settings.bossbar.enabled = true;
    configure(&mut settings);

    let world = Arc::new(InMemoryWorld::new());
    let display = Arc::new(RecordingDisplay::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let scheduler = Arc::new(ManualScheduler::new());
    let service = NearService::new(
        settings,
        NearHost {
            presence: world.clone(),
            permissions: world.clone(),
            display: display.clone(),
            notifier: notifier.clone(),
            scheduler: scheduler.clone(),
        },
    );

    let viewer = world.join("Alex", at(0.0, 0.0));
    let target = world.join("Steve", at(50.0, 0.0));

    Harness {
        world,
        display,
        notifier,
        scheduler,
        service,
        viewer,
        target,
    }
}

fn tick(h: &Harness) {
    h.scheduler.advance(Duration::from_millis(250));
}

fn bar_progress(events: &[DisplayEvent]) -> Vec<f64> {
    events
        .iter()
        .filter_map(|event| match event {
            DisplayEvent::BarUpdated(_, _, progress) => Some(*progress),
            _ => None,
        })
        .collect()
}

fn last_update(events: &[DisplayEvent], viewer: PlayerId) -> (String, f64) {
    events
        .iter()
        .rev()
        .find_map(|event| match event {
            DisplayEvent::BarUpdated(id, title, progress) if *id == viewer => {
                Some((title.clone(), *progress))
            }
            _ => None,
        })
        .unwrap()
}

#[test]
fn start_shows_and_renders_then_ticks_refresh() {
    let h = harness(|_| {});
    let session = h.service.start_tracker(h.viewer, h.target, false).unwrap();
    assert_eq!(session.phase(), Phase::Active);
    assert_eq!(session.initial_distance(), 50.0);

    let events = h.display.take();
    assert!(matches!(events[0], DisplayEvent::BarShown(id, _, _) if id == h.viewer));
    let (title, progress) = last_update(&events, h.viewer);
    assert!(title.contains("Steve is 50 blocks away"), "{title}");
    assert_eq!(progress, 1.0);

    h.world.move_to(h.target, at(60.7, 0.0));
    tick(&h);
    let (title, _) = h.display.last_bar(h.viewer).unwrap();
    assert!(title.contains("is 60 blocks away"), "{title}");
    assert!(h.notifier.notices().is_empty());
}

#[test]
fn second_start_is_rejected_without_touching_the_first() {
    let h = harness(|_| {});
    let other = h.world.join("Sam", at(0.0, 40.0));
    h.service.start_tracker(h.viewer, h.target, false).unwrap();
    h.display.take();

    assert_eq!(
        h.service.start_tracker(h.viewer, other, false).unwrap_err(),
        NearError::PolicyRejected(PolicyRejection::AlreadyActive)
    );
    assert!(h.display.is_empty());
    let session = h.service.active_tracker(h.viewer).unwrap();
    assert_eq!(session.target(), h.target);
    assert_eq!(h.service.trackers().len(), 1);
}

#[test]
fn stop_cancels_tick_and_timeout() {
    let h = harness(|s| {
        s.bossbar.timeout.enabled = true;
        s.bossbar.timeout.seconds = 5;
    });
    let session = h.service.start_tracker(h.viewer, h.target, false).unwrap();
    assert_eq!(h.scheduler.pending(), 2);

    h.service.stop_tracker(h.viewer, h.target).unwrap();
    assert_eq!(session.phase(), Phase::Stopped);
    assert!(h.display.events().contains(&DisplayEvent::BarCleared(h.viewer)));
    h.display.take();

    h.scheduler.advance(Duration::from_secs(60));
    assert!(h.display.is_empty());
    assert!(h.notifier.notices().is_empty());
    assert_eq!(h.scheduler.pending(), 0);
    assert!(!h.service.has_active_tracker(h.viewer));
}

#[test]
fn stop_is_idempotent_and_target_checked() {
    let h = harness(|_| {});
    let other = h.world.join("Sam", at(0.0, 40.0));
    h.service.start_tracker(h.viewer, h.target, false).unwrap();

    let not_active = NearError::PolicyRejected(PolicyRejection::NotActive);
    assert_eq!(h.service.stop_tracker(h.viewer, other), Err(not_active.clone()));
    assert!(h.service.has_active_tracker(h.viewer));

    assert_eq!(h.service.stop_tracker(h.viewer, h.target), Ok(()));
    h.display.take();
    assert_eq!(h.service.stop_tracker(h.viewer, h.target), Err(not_active));
    assert!(h.display.is_empty());
}

#[test]
fn start_checks_distance_gates_unless_ignored() {
    let h = harness(|_| {});
    h.world.move_to(h.target, at(10.0, 0.0));
    assert_eq!(
        h.service.start_tracker(h.viewer, h.target, false).unwrap_err(),
        NearError::from(PolicyRejection::TooClose)
    );

    h.world.move_to(h.target, at(200.0, 0.0));
    assert_eq!(
        h.service.start_tracker(h.viewer, h.target, false).unwrap_err(),
        NearError::from(PolicyRejection::TooFar)
    );
    assert!(h.display.is_empty());

    let session = h.service.start_tracker(h.viewer, h.target, true).unwrap();
    assert!(session.ignores_distance());
    tick(&h);
    assert!(h.service.has_active_tracker(h.viewer));
}

#[test]
fn start_rejections_for_disabled_self_and_unreachable() {
    let h = harness(|s| s.bossbar.enabled = false);
    assert_eq!(
        h.service.start_tracker(h.viewer, h.target, false).unwrap_err(),
        NearError::from(PolicyRejection::TrackerDisabled)
    );

    let h = harness(|_| {});
    assert_eq!(
        h.service.start_tracker(h.viewer, h.viewer, false).unwrap_err(),
        NearError::from(PolicyRejection::SelfTarget)
    );

    h.world.move_to(
        h.target,
        Location::new("world_nether", Position::default(), 0.0),
    );
    assert_eq!(
        h.service.start_tracker(h.viewer, h.target, false).unwrap_err(),
        NearError::from(Unreachable::OtherWorld("Steve".into()))
    );
    assert!(h.service.trackers().is_empty());
}

#[test]
fn leaving_the_gates_stops_with_a_notice() {
    let h = harness(|_| {});
    h.service.start_tracker(h.viewer, h.target, false).unwrap();
    h.world.move_to(h.target, at(150.0, 0.0));
    tick(&h);

    assert_eq!(
        h.notifier.notices(),
        vec![(h.viewer, Notice::GoneFar, "Steve".to_string())]
    );
    assert!(!h.service.has_active_tracker(h.viewer));
    assert_eq!(h.scheduler.pending(), 0);

    h.world.move_to(h.target, at(50.0, 0.0));
    h.service.start_tracker(h.viewer, h.target, false).unwrap();
    h.world.move_to(h.target, at(3.0, 4.0));
    tick(&h);
    assert_eq!(h.notifier.notices()[1].1, Notice::GoneClose);
}

#[test]
fn ignored_distance_survives_gate_crossings() {
    let h = harness(|_| {});
    h.service.start_tracker(h.viewer, h.target, true).unwrap();
    h.world.move_to(h.target, at(1.0, 0.0));
    tick(&h);
    h.world.move_to(h.target, at(5000.0, 0.0));
    tick(&h);
    assert!(h.service.has_active_tracker(h.viewer));
    assert!(h.notifier.notices().is_empty());
}

#[test]
fn offline_parties_end_the_session() {
    let h = harness(|_| {});
    h.service.start_tracker(h.viewer, h.target, false).unwrap();
    h.world.quit(h.target);
    tick(&h);
    assert_eq!(h.notifier.notices()[0].1, Notice::PlayerOffline);
    assert!(!h.service.has_active_tracker(h.viewer));

    // The viewer leaving: nobody to notify.
    let h = harness(|_| {});
    h.service.start_tracker(h.viewer, h.target, false).unwrap();
    h.world.quit(h.viewer);
    tick(&h);
    assert!(h.notifier.notices().is_empty());
    assert!(!h.service.has_active_tracker(h.viewer));
    assert_eq!(h.scheduler.pending(), 0);
}

#[test]
fn world_changes_end_the_session() {
    let nether = || Location::new("world_nether", Position::new(50.0, 64.0, 0.0), 0.0);

    let h = harness(|_| {});
    h.service.start_tracker(h.viewer, h.target, false).unwrap();
    h.world.move_to(h.target, nether());
    tick(&h);
    assert_eq!(h.notifier.notices()[0].1, Notice::PlayerChangedWorld);

    let h = harness(|_| {});
    h.service.start_tracker(h.viewer, h.target, false).unwrap();
    h.world.move_to(h.viewer, nether());
    tick(&h);
    assert_eq!(h.notifier.notices()[0].1, Notice::SelfChangedWorld);

    let h = harness(|_| {});
    h.service.start_tracker(h.viewer, h.target, false).unwrap();
    h.service.on_world_change(h.viewer, "world", "world");
    assert!(h.service.has_active_tracker(h.viewer));
    h.service.on_world_change(h.viewer, "world", "world_nether");
    assert_eq!(h.notifier.notices()[0].1, Notice::SelfChangedWorld);
    assert!(!h.service.has_active_tracker(h.viewer));
    assert_eq!(h.scheduler.pending(), 0);
}

#[test]
fn timeout_notifies_then_stops() {
    let h = harness(|s| {
        s.bossbar.timeout.enabled = true;
        s.bossbar.timeout.seconds = 3;
    });
    h.service.start_tracker(h.viewer, h.target, false).unwrap();

    h.scheduler.advance(Duration::from_millis(2999));
    assert!(h.service.has_active_tracker(h.viewer));

    h.scheduler.advance(Duration::from_millis(1));
    assert_eq!(
        h.notifier.notices(),
        vec![(h.viewer, Notice::Timeout, "Steve".to_string())]
    );
    assert!(!h.service.has_active_tracker(h.viewer));
    assert_eq!(h.scheduler.pending(), 0);
}

#[test]
fn time_mode_progress_drains_toward_the_timeout() {
    let h = harness(|s| {
        s.bossbar.timeout.enabled = true;
        s.bossbar.timeout.seconds = 10;
        s.bossbar.progress.enabled = true;
        s.bossbar.progress.mode = "time".into();
    });
    h.service.start_tracker(h.viewer, h.target, false).unwrap();

    h.scheduler.advance(Duration::from_secs(5));
    let (_, progress) = h.display.last_bar(h.viewer).unwrap();
    assert!((progress - 0.55).abs() < 1e-9, "{progress}");
}

#[test]
fn distance_progress_stays_in_unit_range() {
    let h = harness(|s| {
        s.bossbar.progress.enabled = true;
        s.bossbar.progress.min_progress = -20.0;
        s.bossbar.progress.max_progress = 140.0;
        s.bossbar.progress.use_min_distance_as_zero = true;
    });
    h.service.start_tracker(h.viewer, h.target, false).unwrap();
    for x in [49.0, 30.0, 16.0, 80.0, 120.0, 20.0] {
        h.world.move_to(h.target, at(x, 0.0));
        tick(&h);
    }

    let progress = bar_progress(&h.display.events());
    assert_eq!(progress.len(), 7);
    assert_eq!(progress[0], 1.0);
    assert!(progress.iter().all(|p| (0.0..=1.0).contains(p)));
}

#[test]
fn distance_progress_hits_max_exactly_at_start_distance() {
    let h = harness(|s| {
        s.bossbar.progress.enabled = true;
        s.bossbar.progress.max_progress = 80.0;
    });
    h.service.start_tracker(h.viewer, h.target, false).unwrap();
    let (_, progress) = h.display.last_bar(h.viewer).unwrap();
    assert_eq!(progress, 0.8);

    h.world.move_to(h.target, at(25.0, 0.0));
    tick(&h);
    let (_, progress) = h.display.last_bar(h.viewer).unwrap();
    assert!((progress - 0.45).abs() < 1e-9, "{progress}");
}

#[test]
fn running_sessions_keep_their_snapshot_across_reload() {
    let h = harness(|_| {});
    h.service.start_tracker(h.viewer, h.target, false).unwrap();

    let mut tighter = (*h.service.settings()).clone();
    tighter.bossbar.max_distance.distance = 40;
    h.service.reload(tighter);

    tick(&h);
    assert!(h.service.has_active_tracker(h.viewer));
    assert_eq!(h.service.settings().bossbar.max_distance.distance, 40);
}

#[test]
fn quit_and_shutdown_clean_up() {
    let h = harness(|_| {});
    h.world.grant(h.viewer, "nearmanager.near-radius.40");
    h.service
        .on_permission_granted(h.viewer, "nearmanager.near-radius.40");
    h.service.start_tracker(h.viewer, h.target, false).unwrap();

    h.service.on_player_quit(h.viewer);
    assert!(h.service.radius_cache().is_empty());
    assert!(!h.service.has_active_tracker(h.viewer));
    assert!(h.notifier.notices().is_empty());

    h.world.join_with_id(h.viewer, "Alex", at(0.0, 0.0));
    let third = h.world.join("Sam", at(0.0, 40.0));
    h.service.start_tracker(h.target, h.viewer, true).unwrap();
    h.service.start_tracker(third, h.target, false).unwrap();
    assert_eq!(h.service.trackers().len(), 2);

    h.service.shutdown();
    assert!(h.service.trackers().is_empty());
    assert_eq!(h.scheduler.pending(), 0);
}

/// Last bar show/clear recorded for `viewer`.
fn bar_visible(events: &[DisplayEvent], viewer: PlayerId) -> bool {
    events
        .iter()
        .rev()
        .find_map(|event| match event {
            DisplayEvent::BarShown(id, ..) if *id == viewer => Some(true),
            DisplayEvent::BarCleared(id) if *id == viewer => Some(false),
            _ => None,
        })
        .unwrap_or(false)
}

#[test]
fn concurrent_stops_never_leave_an_orphaned_bar() {
    let h = harness(|_| {});

    for _ in 0..200 {
        std::thread::scope(|scope| {
            scope.spawn(|| {
                let _ = h.service.start_tracker(h.viewer, h.target, false);
            });
            scope.spawn(|| {
                h.service.on_world_change(h.viewer, "world", "nether");
            });
        });

        let shown = bar_visible(&h.display.events(), h.viewer);
        assert_eq!(shown, h.service.has_active_tracker(h.viewer));

        h.service.trackers().stop_all(StopReason::Command);
        assert!(!bar_visible(&h.display.events(), h.viewer));
        h.display.take();
    }
    assert_eq!(h.scheduler.pending(), 0);
}

#[test]
fn rejoin_restores_radius_from_held_nodes() {
    let h = harness(|_| {});
    h.world.grant(h.viewer, "nearmanager.near-radius.500");
    h.service
        .on_permission_granted(h.viewer, "nearmanager.near-radius.500");
    assert_eq!(h.service.resolve_radius(h.viewer, None), Ok(500.0));

    h.world.quit(h.viewer);
    h.service.on_player_quit(h.viewer);
    assert!(h.service.radius_cache().is_empty());

    h.world.join_with_id(h.viewer, "Alex", at(0.0, 0.0));
    h.service.on_player_join(h.viewer);
    assert_eq!(h.service.resolve_radius(h.viewer, None), Ok(500.0));

    // Nothing to restore for a player without radius nodes.
    h.service.on_player_join(h.target);
    assert_eq!(h.service.radius_cache().len(), 1);
}

#[tokio::test]
async fn tokio_driven_session_goes_quiet_after_stop() {
    let world = Arc::new(InMemoryWorld::new());
    let display = Arc::new(RecordingDisplay::new());
    let scheduler: Arc<dyn Scheduler> = Arc::new(TokioScheduler::current());
    let mut settings = NearSettings::default();
    settings.bossbar.enabled = true;
    settings.bossbar.update_interval_ms = 10;

    let service = NearService::new(
        settings,
        NearHost {
            presence: world.clone(),
            permissions: world.clone(),
            display: display.clone(),
            notifier: Arc::new(RecordingNotifier::new()),
            scheduler,
        },
    );
    let viewer = world.join("Alex", at(0.0, 0.0));
    let target = world.join("Steve", at(50.0, 0.0));

    service.start_tracker(viewer, target, false).unwrap();
    tokio::time::sleep(Duration::from_millis(45)).await;
    assert!(bar_progress(&display.events()).len() >= 2);

    service.stop_tracker(viewer, target).unwrap();
    display.take();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(display.is_empty());
}
