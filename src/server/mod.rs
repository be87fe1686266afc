//! HTTP scrape endpoint
//!
//! Serves the metrics path, a landing page, and a liveness probe. Requests
//! are handled one at a time on the accept thread, so a poll and its
//! projection never overlap another scrape and the projector needs no lock.

use tiny_http::{Header, Response, Server};

use crate::collector::Collector;
use crate::error::AppError;
use crate::exporter::Projector;
use crate::nvml::GpuBackend;

/// Content type for the text exposition format
const METRICS_CONTENT_TYPE: &[u8] = b"text/plain; version=0.0.4";

/// Configuration for the HTTP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on
    pub listen_address: String,
    /// Path under which to expose metrics
    pub telemetry_path: String,
}

/// Route classification for incoming requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Metrics,
    Landing,
    Health,
    NotFound,
}

fn classify(url: &str, telemetry_path: &str) -> Endpoint {
    // Strip any query string before matching
    let path = url.split('?').next().unwrap_or(url);
    if path == telemetry_path {
        Endpoint::Metrics
    } else if path == "/" {
        Endpoint::Landing
    } else if path == "/health" {
        Endpoint::Health
    } else {
        Endpoint::NotFound
    }
}

fn landing_page(telemetry_path: &str) -> String {
    format!(
        "<html>\n\
         <head><title>NVML Exporter</title></head>\n\
         <body>\n\
         <h1>NVML Exporter</h1>\n\
         <p><a href='{}'>Metrics</a></p>\n\
         </body>\n\
         </html>\n",
        telemetry_path
    )
}

/// Run the scrape loop until the process exits
///
/// Every request to the metrics path triggers one fresh poll; the poll
/// result is projected and the gauge state rendered into the response.
pub fn run<B: GpuBackend>(
    config: &ServerConfig,
    collector: &Collector<B>,
    projector: &mut Projector,
) -> Result<(), AppError> {
    let server = Server::http(&config.listen_address).map_err(|e| AppError::Bind {
        addr: config.listen_address.clone(),
        reason: e.to_string(),
    })?;

    let metrics_content_type = Header::from_bytes(b"Content-Type", METRICS_CONTENT_TYPE)
        .expect("static header is valid");
    let html_content_type =
        Header::from_bytes(b"Content-Type", b"text/html").expect("static header is valid");

    log::info!("Listening on {}", config.listen_address);

    for request in server.incoming_requests() {
        let sent = match classify(request.url(), &config.telemetry_path) {
            Endpoint::Metrics => {
                let poll = collector.poll();
                projector.project(&poll);
                match projector.render() {
                    Ok(body) => request.respond(
                        Response::from_string(body).with_header(metrics_content_type.clone()),
                    ),
                    Err(e) => {
                        log::error!("Failed to encode metrics: {}", e);
                        request.respond(
                            Response::from_string("failed to encode metrics")
                                .with_status_code(500),
                        )
                    }
                }
            }
            Endpoint::Landing => request.respond(
                Response::from_string(landing_page(&config.telemetry_path))
                    .with_header(html_content_type.clone()),
            ),
            Endpoint::Health => request.respond(Response::from_string("OK")),
            Endpoint::NotFound => {
                request.respond(Response::from_string("not found").with_status_code(404))
            }
        };

        if let Err(e) = sent {
            log::warn!("Failed to send response: {}", e);
        }
    }

    Ok(())
}
