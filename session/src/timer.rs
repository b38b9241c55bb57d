//! Lazy countdown reconstruction.
//!
//! Time is never pushed into the session by a scheduler; every transition
//! rebuilds the elapsed wall-clock seconds since the last touch, so the
//! countdown's precision is bounded by the polling cadence of whichever
//! client last reached the session.

use maze_chase_core::{Event, LossCause, SessionDocument, SessionStatus};

/// Folds elapsed wall-clock time into the countdown.
///
/// The countdown only decays while the session is playing, clamps at zero,
/// and flips the session to lost when it runs out. The tick timestamp is
/// refreshed unconditionally so stale documents never replay old decay.
pub(crate) fn reconstruct(document: &mut SessionDocument, now_ms: u64, out_events: &mut Vec<Event>) {
    let elapsed_ms = now_ms.saturating_sub(document.last_tick_timestamp);
    let elapsed_seconds = u32::try_from(elapsed_ms / 1_000).unwrap_or(u32::MAX);

    if document.status.is_playing() && elapsed_seconds > 0 {
        document.time_remaining_seconds = document
            .time_remaining_seconds
            .saturating_sub(elapsed_seconds);
        if document.time_remaining_seconds == 0 {
            document.status = SessionStatus::Lost;
            out_events.push(Event::Lost {
                cause: LossCause::TimerExpired,
            });
        }
    }

    document.last_tick_timestamp = now_ms;
}
