//! Process-wide crash handling.
//!
//! A panic raised while serving a request is turned into a 500 response by the
//! router's catch-panic layer and the process keeps running. Any other panic
//! (startup code, background tasks, tasks spawned from handlers) is fatal: it
//! is logged with a backtrace and the process exits with status 1 so a
//! supervisor can restart it.

use axum::{extract::Request, middleware::Next, response::Response};
use std::backtrace::Backtrace;

/// Exit status used for fatal panics.
pub const FATAL_EXIT_CODE: i32 = 1;

tokio::task_local! {
    static REQUEST_SCOPE: ();
}

/// Whether the current task is serving an HTTP request.
pub fn in_request_scope() -> bool {
    REQUEST_SCOPE.try_with(|_| ()).is_ok()
}

/// Marks the rest of the pipeline as request handling for the panic hook.
pub async fn request_scope_middleware(req: Request, next: Next) -> Response {
    REQUEST_SCOPE.scope((), next.run(req)).await
}

/// Install the fail-fast panic hook. Call once, before the runtime serves traffic.
pub fn install_crash_handlers() {
    std::panic::set_hook(Box::new(|info| {
        let backtrace = Backtrace::force_capture();

        if in_request_scope() {
            tracing::error!(panic = %info, "Request handler panicked\n{}", backtrace);
            return;
        }

        tracing::error!(panic = %info, "Uncaught panic, terminating process\n{}", backtrace);
        eprintln!("Uncaught panic: {}\n{}", info, backtrace);
        std::process::exit(FATAL_EXIT_CODE);
    }));
}
