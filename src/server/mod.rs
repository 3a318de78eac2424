// src/server/mod.rs
// =============================================================================
// HTTP front end for the docs API.
//
// Submodules:
// - api: routing + handlers (no sockets involved)
// - envelope: success/error JSON shapes and the ApiError type
//
// Threading: tiny_http hands out requests on a blocking accept loop. That
// loop runs in `spawn_blocking`, reads each body, and ships the work to a
// Tokio task so slow GitHub calls never stall the next accept.
// =============================================================================

mod api;
mod envelope;

pub use api::Api;
pub use envelope::{success_envelope, ApiError, ApiResponse};

use std::io::Read;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tiny_http::{Header, Request, Response, Server};
use tokio::runtime::Handle;
use tracing::{info, warn};

/// Serve `api` on `bind` until Ctrl-C
pub async fn serve(bind: &str, api: Arc<Api>) -> Result<()> {
    let server = Server::http(bind).map_err(|e| anyhow!("failed to bind {bind}: {e}"))?;
    let server = Arc::new(server);
    info!(bind, "markview API listening");

    let accept = {
        let server = Arc::clone(&server);
        let runtime = Handle::current();
        tokio::task::spawn_blocking(move || accept_loop(&server, &runtime, api))
    };

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.context("failed to listen for Ctrl-C")?;
            info!("shutting down");
            server.unblock();
        }
        res = accept => {
            res.context("accept loop panicked")?;
        }
    }

    Ok(())
}

// Runs on a blocking thread: tiny_http hands out requests one at a time and
// each one is handled as its own tokio task
fn accept_loop(server: &Server, runtime: &Handle, api: Arc<Api>) {
    // Ends once `unblock` is called
    for mut request in server.incoming_requests() {
        let mut body = Vec::new();
        if let Err(e) = request.as_reader().read_to_end(&mut body) {
            warn!(error = %e, "failed to read request body");
            let resp = ApiError::Validation("Unreadable request body".into()).to_response();
            respond(request, resp);
            continue;
        }

        // The task owns the request and answers it when the handler is done
        let api = Arc::clone(&api);
        runtime.spawn(async move {
            let method = request.method().as_str().to_string();
            let url = request.url().to_string();
            let resp = api.handle(&method, &url, &body).await;
            respond(request, resp);
        });
    }
}

fn respond(request: Request, resp: ApiResponse) {
    let body = resp.body.to_string();
    let mut response = Response::from_string(body).with_status_code(resp.status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        response = response.with_header(header);
    }
    if let Err(e) = request.respond(response) {
        warn!(error = %e, "failed to write response");
    }
}
