use std::future::Future;
use std::sync::LazyLock;

use tokio::runtime::{Builder, Runtime};

use crate::MobileError;

pub fn runtime() -> &'static Runtime {
    static RUNTIME: LazyLock<Runtime> = LazyLock::new(|| {
        Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("amply-core")
            .enable_all()
            .build()
            .expect("failed to start the tokio runtime")
    });

    &RUNTIME
}

/// Runs `future` on the core runtime; the foreign caller's executor only
/// waits for the result.
pub async fn on_runtime<F>(future: F) -> Result<F::Output, MobileError>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    runtime()
        .spawn(future)
        .await
        .map_err(|err| MobileError::Internal(err.to_string()))
}
