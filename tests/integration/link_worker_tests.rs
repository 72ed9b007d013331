//! Integration tests for the link worker cycle: intake → relay write →
//! read → extract → service → broadcast.

use std::io::ErrorKind;
use std::time::Duration;

use greenhouse::app::commands::Command;
use greenhouse::app::events::BroadcastMessage;
use greenhouse::config::ControllerConfig;
use greenhouse::error::Error;
use greenhouse::framing::FramingMode;
use greenhouse::link::worker::CycleAction;
use greenhouse::relay::{RelayCommand, RelayState};
use greenhouse::safety::{TimerSignal, WateringCause, WateringEnd};

use crate::mock_link::{Harness, ReadStep, ScriptedTransport, TimerCall, quiet_config};

/// `n` reads of one noise byte each, so cycles can run without frames.
fn idle_reads(n: usize) -> ScriptedTransport {
    ScriptedTransport::new((0..n).map(|_| ReadStep::Bytes(b"~".to_vec())))
}

fn ended(messages: &[BroadcastMessage], reason: WateringEnd) -> usize {
    messages
        .iter()
        .filter(|m| matches!(m, BroadcastMessage::WateringEnded { reason: r, .. } if *r == reason))
        .count()
}

// ── Frames ────────────────────────────────────────────────────

#[test]
fn marker_frames_split_across_reads_are_broadcast_in_order() {
    let config = ControllerConfig {
        humidity_threshold: 1000.0,
        ..quiet_config()
    };
    let mut h = Harness::new(
        &config,
        ScriptedTransport::chunks([
            &b"{\"humi"[..],
            &b"dityValue\":250}noise{\"humidityValue\":3"[..],
            &b"10}"[..],
        ]),
    );
    for _ in 0..3 {
        h.worker.cycle().unwrap();
    }
    assert_eq!(h.readings(), vec![250.0, 310.0]);
    assert!(!h.worker.service().is_watering());
}

#[test]
fn small_read_chunks_yield_the_same_frames() {
    let config = ControllerConfig {
        humidity_threshold: 1000.0,
        read_chunk_size: 4,
        ..quiet_config()
    };
    let mut h = Harness::new(
        &config,
        ScriptedTransport::chunks([&b"{\"humidityValue\":250}{\"humidityValue\":120}"[..]]),
    );
    while h.worker.cycle().is_ok() {}
    assert_eq!(h.readings(), vec![250.0, 120.0]);
}

#[test]
fn malformed_frames_are_counted_not_broadcast() {
    let mut h = Harness::new(
        &quiet_config(),
        ScriptedTransport::chunks([&b"{\"temp\":21}{\"humidityValue\":100}"[..]]),
    );
    h.worker.cycle().unwrap();
    assert_eq!(h.readings(), vec![100.0]);
    let status = h.status.snapshot();
    assert_eq!(status.frames, 1);
    assert_eq!(status.malformed_frames, 1);
}

// ── Auto-watering ─────────────────────────────────────────────

#[test]
fn reading_above_threshold_starts_one_auto_session() {
    let config = ControllerConfig {
        framing: FramingMode::Numeric,
        ..quiet_config()
    };
    let mut h = Harness::new(
        &config,
        ScriptedTransport::chunks([&b":394.00"[..], &b":394.00"[..], &b"~"[..]]),
    );

    h.worker.cycle().unwrap();
    assert!(h.worker.service().is_watering());
    assert!(h.messages().contains(&BroadcastMessage::WateringStarted {
        session: 1,
        cause: WateringCause::Auto,
    }));

    // Next cycle writes the pump on; a second high reading starts nothing.
    h.worker.cycle().unwrap();
    assert_eq!(h.last_write(), Some(b"01".to_vec()));
    h.worker.cycle().unwrap();
    assert_eq!(h.timer_calls(), vec![TimerCall::Start(1, Duration::from_secs(5))]);
}

#[test]
fn reading_at_threshold_does_not_water() {
    let config = ControllerConfig {
        framing: FramingMode::Numeric,
        ..quiet_config()
    };
    let mut h = Harness::new(&config, ScriptedTransport::chunks([&b":300.00"[..]]));
    h.worker.cycle().unwrap();
    assert_eq!(h.readings(), vec![300.0]);
    assert!(!h.worker.service().is_watering());
    assert!(h.timer_calls().is_empty());
}

#[test]
fn raised_threshold_applies_to_later_readings() {
    let config = ControllerConfig {
        framing: FramingMode::Numeric,
        ..quiet_config()
    };
    let mut h = Harness::new(&config, ScriptedTransport::chunks([&b":394.00"[..]]));
    h.intake.submit(Command::SetHumidityThreshold(500.0));
    h.worker.cycle().unwrap();
    assert!(!h.worker.service().is_watering());
    assert!((h.status.snapshot().humidity_threshold - 500.0).abs() < f32::EPSILON);
}

// ── Pump safety ───────────────────────────────────────────────

#[test]
fn pump_on_while_running_does_not_restart_and_expiry_is_single() {
    let mut h = Harness::new(&quiet_config(), idle_reads(5));

    h.intake.submit(RelayCommand::SetPump(true));
    h.worker.cycle().unwrap();
    assert_eq!(h.last_write(), Some(b"01".to_vec()));

    // Repeated activation mid-session: pump stays on, no new countdown.
    h.intake.submit(RelayCommand::SetPump(true));
    h.worker.cycle().unwrap();
    assert_eq!(h.last_write(), Some(b"01".to_vec()));
    assert_eq!(h.timer_calls(), vec![TimerCall::Start(1, Duration::from_secs(5))]);

    h.signals.try_send(TimerSignal::Expired { session: 1 }).unwrap();
    h.worker.cycle().unwrap();
    assert_eq!(h.last_write(), Some(b"00".to_vec()));
    assert!(!h.worker.service().is_watering());

    // A duplicate expiry for the closed session changes nothing.
    h.signals.try_send(TimerSignal::Expired { session: 1 }).unwrap();
    h.worker.cycle().unwrap();
    assert_eq!(ended(&h.messages(), WateringEnd::Expired), 1);
    assert_eq!(h.worker.service().relays(), RelayState::ALL_OFF);
}

#[test]
fn cancelled_session_ignores_late_expiry() {
    let mut h = Harness::new(&quiet_config(), idle_reads(4));
    h.intake.submit(RelayCommand::SetPump(true));
    h.worker.cycle().unwrap();
    h.intake.submit(RelayCommand::SetPump(false));
    h.worker.cycle().unwrap();
    assert_eq!(
        h.timer_calls(),
        vec![
            TimerCall::Start(1, Duration::from_secs(5)),
            TimerCall::Cancel(1)
        ]
    );

    h.signals.try_send(TimerSignal::Expired { session: 1 }).unwrap();
    h.worker.cycle().unwrap();
    let messages = h.messages();
    assert_eq!(ended(&messages, WateringEnd::Cancelled), 1);
    assert_eq!(ended(&messages, WateringEnd::Expired), 0);

    // A new session gets a fresh id.
    h.intake.submit(RelayCommand::SetPump(true));
    h.worker.cycle().unwrap();
    assert_eq!(h.worker.service().session_id(), Some(2));
}

#[test]
fn expiry_takes_precedence_over_pending_command() {
    let mut h = Harness::new(&quiet_config(), idle_reads(1));
    h.intake.submit(RelayCommand::SetPump(true));
    h.worker.cycle().unwrap();

    h.intake.submit(RelayCommand::SetLight(true));
    h.signals.try_send(TimerSignal::Expired { session: 1 }).unwrap();
    let now = std::time::Instant::now();
    assert_eq!(h.worker.poll_intake(now), CycleAction::Expired);
    assert_eq!(h.intake.pending(), 1);
    assert_eq!(h.worker.poll_intake(now), CycleAction::Command);
    assert_eq!(h.worker.service().relays(), RelayState::new(true, false));
    assert_eq!(h.worker.poll_intake(now), CycleAction::Idle);
}

#[test]
fn ticks_update_remaining_without_changing_relays() {
    let mut h = Harness::new(&quiet_config(), idle_reads(2));
    h.intake.submit(RelayCommand::SetPump(true));
    h.worker.cycle().unwrap();
    h.signals
        .try_send(TimerSignal::Tick {
            session: 1,
            remaining: Duration::from_secs(2),
        })
        .unwrap();
    h.worker.cycle().unwrap();
    let status = h.status.snapshot();
    assert!(status.relays.pump);
    let session = status.watering.unwrap();
    assert_eq!(session.id, 1);
    assert_eq!(session.remaining, Duration::from_secs(2));
}

#[test]
fn startup_pump_on_is_a_bounded_session() {
    let config = ControllerConfig {
        initial_light: true,
        initial_pump: true,
        ..quiet_config()
    };
    let mut h = Harness::new(&config, idle_reads(1));
    h.worker.cycle().unwrap();
    assert_eq!(h.writes(), vec![b"11".to_vec()]);
    assert_eq!(h.timer_calls(), vec![TimerCall::Start(1, Duration::from_secs(5))]);
    assert!(h.messages().contains(&BroadcastMessage::WateringStarted {
        session: 1,
        cause: WateringCause::Startup,
    }));
}

#[test]
fn status_reflects_expiry_before_the_read_returns() {
    let mut h = Harness::new(
        &quiet_config(),
        ScriptedTransport::new([
            ReadStep::Bytes(b"~".to_vec()),
            ReadStep::Fail(ErrorKind::BrokenPipe),
        ]),
    );
    h.intake.submit(RelayCommand::SetPump(true));
    h.worker.cycle().unwrap();
    assert!(h.status.snapshot().relays.pump);

    h.signals.try_send(TimerSignal::Expired { session: 1 }).unwrap();
    assert_eq!(h.worker.cycle(), Err(Error::LinkIo(ErrorKind::BrokenPipe)));
    let status = h.status.snapshot();
    assert!(!status.relays.pump);
    assert_eq!(status.watering, None);
}

#[test]
fn silent_board_still_gets_the_pump_forced_off() {
    let mut h = Harness::new(
        &quiet_config(),
        ScriptedTransport::new([
            ReadStep::Bytes(b"~".to_vec()),
            ReadStep::Fail(ErrorKind::TimedOut),
            ReadStep::Fail(ErrorKind::TimedOut),
            ReadStep::Fail(ErrorKind::TimedOut),
        ]),
    );
    h.intake.submit(RelayCommand::SetPump(true));
    h.worker.cycle().unwrap();

    // The board stops talking; timed-out reads are empty cycles.
    h.worker.cycle().unwrap();
    assert_eq!(h.last_write(), Some(b"01".to_vec()));

    h.signals.try_send(TimerSignal::Expired { session: 1 }).unwrap();
    h.worker.cycle().unwrap();
    assert_eq!(h.last_write(), Some(b"00".to_vec()));
    assert!(!h.status.snapshot().relays.pump);
    assert_eq!(ended(&h.messages(), WateringEnd::Expired), 1);

    h.worker.cycle().unwrap();
    assert_eq!(h.worker.cycles(), 4);
    assert_eq!(h.worker.cycle(), Err(Error::EndOfStream));
}

// ── Relay writes ──────────────────────────────────────────────

#[test]
fn every_cycle_writes_the_current_state() {
    let mut h = Harness::new(&quiet_config(), idle_reads(3));
    h.worker.cycle().unwrap();
    h.intake.submit(RelayCommand::SetLight(true));
    h.worker.cycle().unwrap();
    h.intake.submit(RelayCommand::SetLight(true));
    h.worker.cycle().unwrap();
    assert_eq!(h.writes(), vec![b"00".to_vec(), b"10".to_vec(), b"10".to_vec()]);

    // Setting the light to the value it already has broadcasts nothing new.
    let relay_updates = h
        .messages()
        .iter()
        .filter(|m| matches!(m, BroadcastMessage::Relays(s) if s.light))
        .count();
    assert_eq!(relay_updates, 1);
}

#[test]
fn only_the_latest_burst_command_is_guaranteed() {
    let mut h = Harness::new(&quiet_config(), idle_reads(12));
    for i in 0..20 {
        h.intake.submit(RelayCommand::SetLight(i % 2 == 0));
    }
    h.intake.submit(RelayCommand::SetLight(true));
    while h.intake.pending() > 0 {
        h.worker.cycle().unwrap();
    }
    assert!(h.intake.superseded() > 0);
    assert!(h.worker.service().relays().light);
}

// ── Termination ───────────────────────────────────────────────

#[test]
fn end_of_stream_stops_the_worker_with_relays_off() {
    let config = ControllerConfig {
        initial_light: true,
        ..quiet_config()
    };
    let h = Harness::new(&config, idle_reads(2));
    let status = h.status.clone();
    let writes = h.writes.clone();
    let result = h.worker.run();
    assert_eq!(result, Err(Error::EndOfStream));

    let writes = writes.lock().unwrap();
    assert_eq!(writes.first(), Some(&b"10".to_vec()));
    assert_eq!(writes.last(), Some(&b"00".to_vec()));
    let snapshot = status.snapshot();
    assert!(!snapshot.link_up);
    assert_eq!(snapshot.cycles, 2);
    assert_eq!(snapshot.relays, RelayState::ALL_OFF);
}

#[test]
fn read_error_ends_session_as_link_down() {
    let h = Harness::new(&quiet_config(), ScriptedTransport::new([ReadStep::Fail(ErrorKind::BrokenPipe)]));
    let messages = h.messages.clone();
    h.intake.submit(RelayCommand::SetPump(true));
    assert_eq!(h.worker.run(), Err(Error::LinkIo(ErrorKind::BrokenPipe)));
    let messages = messages.lock().unwrap();
    assert_eq!(ended(&messages, WateringEnd::LinkDown), 1);
}

#[test]
fn write_error_is_fatal() {
    let h = Harness::new(&quiet_config(), idle_reads(3).failing_writes());
    assert_eq!(h.worker.run(), Err(Error::LinkIo(ErrorKind::BrokenPipe)));
}

// ── Status ────────────────────────────────────────────────────

#[test]
fn status_tracks_humidity_window() {
    let config = ControllerConfig {
        framing: FramingMode::Numeric,
        humidity_threshold: 1000.0,
        ..quiet_config()
    };
    let mut h = Harness::new(&config, ScriptedTransport::chunks([&b":100.00:200.00"[..]]));
    h.worker.cycle().unwrap();
    let s = h.status.snapshot();
    assert!(s.link_up);
    assert_eq!(s.cycles, 1);
    assert_eq!(s.last_humidity, Some(200.0));
    assert_eq!(s.average_humidity, Some(150.0));
    assert_eq!(h.worker.cycles(), 1);
}
