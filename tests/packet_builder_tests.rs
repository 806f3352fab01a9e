mod common;

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use std::sync::Arc;

use prana::config::PranaConfig;
use prana::error::PacketError;
use prana::kernel::classifier::CognitiveState;
use prana::kernel::event::Visibility;
use prana::kernel::packet::{
    focus_score, IdentityContext, PacketBuilder, SharedIdentity, Tenths, TelemetryPacket, TimeBucket,
};
use prana::kernel::signals::SignalSnapshot;

fn signed_in() -> Arc<SharedIdentity> {
    Arc::new(SharedIdentity::new(IdentityContext {
        user_id: Some("student-7".to_string()),
        session_id: Some("s-1".to_string()),
        lesson_id: Some("lesson-3".to_string()),
    }))
}

/// Long dwell, focused panel, calm pointer: no penalties apply.
fn calm() -> SignalSnapshot {
    SignalSnapshot {
        dwell_time_ms: 120_000,
        ..SignalSnapshot::default()
    }
}

fn hidden() -> SignalSnapshot {
    SignalSnapshot {
        browser_visibility: Visibility::Hidden,
        tab_visible: false,
        task_tab_active: false,
        ..calm()
    }
}

/// Feed `ticks` accounting ticks of 100ms each, starting after `from_ms`.
fn run(builder: &mut PacketBuilder, state: CognitiveState, signals: &SignalSnapshot, from_ms: u64, ticks: u64) -> u64 {
    let mut now = from_ms;
    for _ in 0..ticks {
        now += 100;
        builder.account(state, signals, now);
    }
    now
}

fn wall() -> chrono::DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_005, 0).unwrap()
}

#[test]
fn test_buckets_follow_the_state_at_each_tick() {
    assert_eq!(TimeBucket::classify(CognitiveState::OnTask, &calm()), TimeBucket::Active);
    assert_eq!(TimeBucket::classify(CognitiveState::Thinking, &calm()), TimeBucket::Active);
    assert_eq!(TimeBucket::classify(CognitiveState::Idle, &calm()), TimeBucket::Idle);
    assert_eq!(TimeBucket::classify(CognitiveState::Away, &calm()), TimeBucket::Away);
    // A hidden tab is away whatever the classifier last said.
    assert_eq!(TimeBucket::classify(CognitiveState::OnTask, &hidden()), TimeBucket::Away);
}

#[test]
fn test_window_partition_matches_accounting() {
    let mut builder = PacketBuilder::new(&PranaConfig::default(), signed_in(), 0);
    let t = run(&mut builder, CognitiveState::OnTask, &calm(), 0, 30);
    let t = run(&mut builder, CognitiveState::Idle, &calm(), t, 15);
    run(&mut builder, CognitiveState::Away, &hidden(), t, 5);

    let acc = builder.accumulated();
    assert_eq!((acc.active_ms, acc.idle_ms, acc.away_ms), (3_000, 1_500, 500));

    let packet = builder.emit(CognitiveState::OnTask, calm(), wall()).expect("user is signed in");
    assert_eq!(packet.active_seconds, Tenths(30));
    assert_eq!(packet.idle_seconds, Tenths(15));
    assert_eq!(packet.away_seconds, Tenths(5));
    assert_eq!(packet.window_seconds, Tenths(50));
    assert_eq!(packet.focus_score, 48, "80 scaled by 0.6 active");

    assert_eq!(builder.accumulated().total_ms(), 0, "emission resets the window");
}

#[test]
fn test_packet_carries_identity_and_deployment_tags() {
    let mut builder = PacketBuilder::new(&PranaConfig::default(), signed_in(), 0);
    run(&mut builder, CognitiveState::OnTask, &calm(), 0, 50);

    let packet = builder.emit(CognitiveState::DeepFocus, calm(), wall()).unwrap();
    assert_eq!(packet.user_id, "student-7");
    assert_eq!(packet.session_id.as_deref(), Some("s-1"));
    assert_eq!(packet.lesson_id.as_deref(), Some("lesson-3"));
    assert_eq!(packet.system_type, "SCHOOL");
    assert_eq!(packet.role, "STUDENT");
    assert_eq!(packet.timestamp, wall());
    assert_eq!(packet.cognitive_state, CognitiveState::DeepFocus);
    assert_eq!(packet.focus_score, 95);
    assert_eq!(packet.raw_signals, calm());
    assert!(packet.validate().is_ok());
}

#[test]
fn test_sum_is_exact_for_drifted_windows() {
    let mut builder = PacketBuilder::new(&PranaConfig::default(), signed_in(), 0);
    // 53 ticks of 100ms land in a 5s window: scaled back to 5.0.
    let t = run(&mut builder, CognitiveState::OnTask, &calm(), 0, 17);
    let t = run(&mut builder, CognitiveState::Idle, &calm(), t, 19);
    run(&mut builder, CognitiveState::Away, &hidden(), t, 17);

    let packet = builder.emit(CognitiveState::Idle, calm(), wall()).unwrap();
    let total = packet.active_seconds + packet.idle_seconds + packet.away_seconds;
    assert_eq!(total, Tenths(50));
}

#[test]
fn test_empty_window_is_all_active() {
    let mut builder = PacketBuilder::new(&PranaConfig::default(), signed_in(), 0);
    let packet = builder.emit(CognitiveState::OnTask, calm(), wall()).unwrap();
    assert_eq!(packet.active_seconds, Tenths(50));
    assert_eq!(packet.idle_seconds, Tenths(0));
    assert_eq!(packet.away_seconds, Tenths(0));
    assert_eq!(packet.focus_score, 80);
}

#[test]
fn test_fully_away_window_scores_zero() {
    let mut builder = PacketBuilder::new(&PranaConfig::default(), signed_in(), 0);
    run(&mut builder, CognitiveState::Away, &hidden(), 0, 50);
    let packet = builder.emit(CognitiveState::Away, hidden(), wall()).unwrap();
    assert_eq!(packet.away_seconds, Tenths(50));
    assert_eq!(packet.focus_score, 0);
}

#[test]
fn test_missing_user_skips_emission_and_still_resets() {
    let identity = Arc::new(SharedIdentity::anonymous());
    let mut builder = PacketBuilder::new(&PranaConfig::default(), identity.clone(), 0);
    let t = run(&mut builder, CognitiveState::OnTask, &calm(), 0, 50);

    assert!(builder.emit(CognitiveState::OnTask, calm(), wall()).is_none());
    assert_eq!(builder.accumulated().total_ms(), 0);

    // Blank ids do not count as signed in either.
    identity.set(IdentityContext { user_id: Some("  ".to_string()), ..IdentityContext::default() });
    assert!(builder.emit(CognitiveState::OnTask, calm(), wall()).is_none());

    identity.set(IdentityContext { user_id: Some("late-login".to_string()), ..IdentityContext::default() });
    run(&mut builder, CognitiveState::Idle, &calm(), t, 50);
    let packet = builder.emit(CognitiveState::Idle, calm(), wall()).unwrap();
    assert_eq!(packet.user_id, "late-login");
    assert_eq!(packet.idle_seconds, Tenths(50), "skipped window did not leak into this one");
}

#[test]
fn test_penalties_are_independent() {
    let base = calm();
    assert_eq!(focus_score(CognitiveState::OnTask, &base, 1.0), 80);

    let fast = SignalSnapshot { mouse_velocity: 1_600.0, ..calm() };
    assert_eq!(focus_score(CognitiveState::OnTask, &fast, 1.0), 65);

    let clicking = SignalSnapshot { rapid_click_count: 3, ..calm() };
    assert_eq!(focus_score(CognitiveState::OnTask, &clicking, 1.0), 60);

    let fresh = SignalSnapshot { dwell_time_ms: 10_000, ..calm() };
    assert_eq!(focus_score(CognitiveState::OnTask, &fresh, 1.0), 70);

    let elsewhere = SignalSnapshot { panel_focused: false, ..calm() };
    assert_eq!(focus_score(CognitiveState::Distracted, &elsewhere, 1.0), 20);

    let everything = SignalSnapshot {
        mouse_velocity: 1_600.0,
        rapid_click_count: 4,
        dwell_time_ms: 0,
        panel_focused: false,
        ..calm()
    };
    assert_eq!(focus_score(CognitiveState::OnTask, &everything, 1.0), 20);
    assert_eq!(focus_score(CognitiveState::Idle, &everything, 1.0), 0, "floored at zero");
}

#[test]
fn test_score_stays_in_range_for_every_state() {
    let variants = [
        calm(),
        SignalSnapshot { mouse_velocity: 9_000.0, rapid_click_count: 9, dwell_time_ms: 0, panel_focused: false, ..calm() },
        SignalSnapshot { mouse_velocity: 1_501.0, ..calm() },
    ];
    for state in CognitiveState::ALL {
        for signals in &variants {
            for ratio in [0.0, 0.25, 0.5, 1.0, 1.5, f64::NAN] {
                let score = focus_score(state, signals, ratio);
                assert!(score <= 100, "{state} {ratio} -> {score}");
                if ratio == 0.0 || ratio.is_nan() {
                    assert_eq!(score, 0);
                }
            }
        }
    }
}

#[test]
fn test_kill_switch_never_emits() {
    let config = PranaConfig { disabled: true, ..PranaConfig::default() };
    let mut builder = PacketBuilder::new(&config, signed_in(), 0);
    run(&mut builder, CognitiveState::OnTask, &calm(), 0, 50);
    assert_eq!(builder.accumulated().total_ms(), 0);
    assert!(builder.emit(CognitiveState::OnTask, calm(), wall()).is_none());
}

#[test]
fn test_wire_format_uses_decimal_seconds() {
    let mut builder = PacketBuilder::new(&PranaConfig::default(), signed_in(), 0);
    let t = run(&mut builder, CognitiveState::OnTask, &calm(), 0, 45);
    run(&mut builder, CognitiveState::Away, &hidden(), t, 5);
    let packet = builder.emit(CognitiveState::OnTask, calm(), wall()).unwrap();

    let json = serde_json::to_value(&packet).unwrap();
    assert_eq!(json["active_seconds"].as_f64(), Some(4.5));
    assert_eq!(json["away_seconds"].as_f64(), Some(0.5));
    assert_eq!(json["cognitive_state"], "ON_TASK");
    assert_eq!(json["raw_signals"]["browser_visibility"], "visible");

    let back = TelemetryPacket::from_value(json).unwrap();
    assert_eq!(back, packet);
}

#[test]
fn test_host_built_packets_are_validated() {
    assert!(matches!(
        TelemetryPacket::from_value(serde_json::json!([1, 2, 3])),
        Err(PacketError::NotAnObject)
    ));
    assert!(matches!(
        TelemetryPacket::from_value(serde_json::json!({ "user_id": "x" })),
        Err(PacketError::Malformed(_))
    ));

    let mut skewed = common::packet("student-7");
    skewed.idle_seconds = Tenths(9);
    assert!(matches!(
        skewed.validate(),
        Err(PacketError::PartitionMismatch { got: 54, expected: 50 })
    ));

    let mut anonymous = common::packet(" ");
    anonymous.focus_score = 10;
    assert!(matches!(anonymous.validate(), Err(PacketError::MissingUser)));
}
