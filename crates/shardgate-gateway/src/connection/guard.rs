//! Panic containment
//!
//! Runs a future so that a panic inside it comes back as an error value instead of
//! unwinding into the caller.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use shardgate_common::panic_message;

/// Run `fut`, converting a panic into `Err(message)`
pub async fn supervised<F>(fut: F) -> Result<F::Output, String>
where
    F: Future,
{
    AssertUnwindSafe(fut)
        .catch_unwind()
        .await
        .map_err(|panic| panic_message(&*panic))
}
