//! Debug and diagnostics endpoints
//!
//! Profiling-style routes under `/debug/pprof/` plus a runtime variables
//! document at `/debug/vars`. Known sub-paths answer 200 with plain text;
//! anything else under the prefix falls through to the 404 default.
//!
//! CPU/heap capture needs an external profiler attached to the process; the
//! profile routes describe that instead of streaming samples.

use crate::server::state::AppState;
use actix_web::{HttpResponse, web};

/// Configure the debug routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/debug")
            .route("/pprof/", web::get().to(profile_index))
            .route("/pprof/cmdline", web::get().to(cmdline))
            .route("/pprof/profile", web::get().to(profile))
            .route("/pprof/symbol", web::get().to(symbol))
            .route("/pprof/trace", web::get().to(trace))
            .route("/vars", web::get().to(vars)),
    );
}

/// Index of the available diagnostic routes
async fn profile_index() -> HttpResponse {
    let index = "\
/debug/pprof/cmdline
/debug/pprof/profile
/debug/pprof/symbol
/debug/pprof/trace
/debug/vars
";
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(index)
}

/// Command line of the running process, NUL-separated
async fn cmdline() -> HttpResponse {
    let args: Vec<String> = std::env::args().collect();
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(args.join("\0"))
}

/// CPU profile placeholder
async fn profile() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("CPU profiling requires an external profiler (e.g. perf) attached to this process\n")
}

/// Symbol lookup placeholder
async fn symbol() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("num_symbols: 0\n")
}

/// Execution trace placeholder
async fn trace() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("execution tracing requires an external profiler attached to this process\n")
}

/// Runtime variables as a JSON document
async fn vars(state: web::Data<AppState>) -> HttpResponse {
    let args: Vec<String> = std::env::args().collect();
    HttpResponse::Ok().json(serde_json::json!({
        "cmdline": args,
        "uptime": super::health::format_uptime(state.uptime()),
        "version": env!("CARGO_PKG_VERSION"),
        "revision": env!("GIT_HASH"),
        "build_time": env!("BUILD_TIME"),
        "rust_version": env!("RUST_VERSION"),
    }))
}
