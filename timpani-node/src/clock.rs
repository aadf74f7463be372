//! Clock helpers shared by the timer engine, the observer's offset
//! calibration, and the hyperperiod supervisor (spec §9 [ADDED] note: the
//! supervisor reads the same configured clock as the per-task timers).

use nix::sys::time::TimeSpec;
use nix::time::{clock_gettime, ClockId as NixClockId};

use timpani_config::ClockId;

fn to_nix(clock: ClockId) -> NixClockId {
    match clock {
        ClockId::Wall => NixClockId::CLOCK_REALTIME,
        ClockId::Monotonic => NixClockId::CLOCK_MONOTONIC,
    }
}

/// Nanoseconds since `clock`'s epoch (Unix epoch for `Wall`, unspecified
/// origin for `Monotonic`).
pub fn now_ns(clock: ClockId) -> i64 {
    timespec_to_ns(clock_gettime(to_nix(clock)).expect("clock_gettime should not fail for a valid clock id"))
}

/// Real-time ("wall clock") now, in nanoseconds since the Unix epoch.
pub fn real_now_ns() -> i64 {
    timespec_to_ns(clock_gettime(NixClockId::CLOCK_REALTIME).expect("CLOCK_REALTIME is always available"))
}

/// Monotonic now, in nanoseconds since an unspecified origin.
pub fn mono_now_ns() -> i64 {
    timespec_to_ns(clock_gettime(NixClockId::CLOCK_MONOTONIC).expect("CLOCK_MONOTONIC is always available"))
}

fn timespec_to_ns(ts: TimeSpec) -> i64 {
    ts.tv_sec() * 1_000_000_000 + ts.tv_nsec()
}

/// Computes the monotonic-to-real offset the observer needs to convert
/// kernel-reported monotonic timestamps into real-time instants (spec §4.7).
///
/// Samples `real_1, mono, real_2` twenty times, keeps the iteration with the
/// smallest `real_2 - real_1` window (bounding the systematic error to half
/// that window), and returns `(real_1 + real_2) / 2 - mono`.
pub fn calibrate_monotonic_to_real_offset_ns() -> i64 {
    const SAMPLES: usize = 20;

    let mut best: Option<(i64, i64, i64)> = None; // (real_1, mono, real_2)
    for _ in 0..SAMPLES {
        let real_1 = real_now_ns();
        let mono = mono_now_ns();
        let real_2 = real_now_ns();

        let window = real_2 - real_1;
        if best.map(|(r1, _, r2)| window < r2 - r1).unwrap_or(true) {
            best = Some((real_1, mono, real_2));
        }
    }

    let (real_1, mono, real_2) = best.expect("SAMPLES > 0");
    (real_1 + real_2) / 2 - mono
}
