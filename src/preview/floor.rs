//! Delay-floored task runner

use std::future::Future;
use std::time::Duration;

/// Run `operation`, resolving no sooner than `floor` from now
///
/// The operation starts immediately and runs concurrently with a timer; the
/// combined future yields the operation's output once both have completed,
/// so the observed latency is `max(operation latency, floor)`. An operation
/// that resolves to an `Err` is held back the same way: the failure surfaces
/// only after the floor has elapsed, never sooner and never swallowed.
///
/// Each call owns its timer; concurrent calls are independent.
pub async fn run_with_floor<F: Future>(operation: F, floor: Duration) -> F::Output {
    let (output, ()) = tokio::join!(operation, tokio::time::sleep(floor));
    output
}
