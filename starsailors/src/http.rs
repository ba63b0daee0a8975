//! HTTP API for deployments
//!
//! ## Endpoints
//! - `GET /health` - Liveness and schema version
//! - `GET /deploy?action=anomalies&deploymentType={stellar|planetary}` - Candidate targets
//! - `GET /deploy?action=status[&automaton=...]` - Whether a new batch may be deployed
//! - `GET /deploy?action=skill-progress` - Classification counts for the skill tree
//! - `GET /deploy?action=linked` - The caller's claims, newest first
//! - `POST /deploy` - Claim a batch of anomalies
//!
//! Every `/deploy` call is authenticated first. Errors are returned as
//! `{"error": "<message>"}` with the status from [`Error::status_code`].
//!
//! ## Example Usage
//!
//! ```bash
//! curl -H "Authorization: Bearer $USER_ID" \
//!      'http://localhost:8787/deploy?action=anomalies&deploymentType=planetary'
//!
//! curl -X POST -H "Authorization: Bearer $USER_ID" \
//!      -d '{"deploymentType":"planetary","anomalyIds":[1,2,3]}' \
//!      http://localhost:8787/deploy
//! ```

use bytes::Bytes;
use chrono::Utc;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{self, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::auth::Authenticator;
use crate::params::{self, DeployBody};
use starsailors_core::{DeployStore, DeploymentEngine, Error, Result};

/// HTTP server state
pub struct HttpServer<S, A> {
    engine: DeploymentEngine<S>,
    auth: A,
    bind_addr: SocketAddr,
}

impl<S: DeployStore, A: Authenticator> HttpServer<S, A> {
    pub fn new(engine: DeploymentEngine<S>, auth: A, bind_addr: SocketAddr) -> Self {
        Self {
            engine,
            auth,
            bind_addr,
        }
    }

    pub fn engine(&self) -> &DeploymentEngine<S> {
        &self.engine
    }

    /// Run the HTTP server
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        info!(addr = %self.bind_addr, "HTTP server listening");

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let server = self.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let server = server.clone();
                    async move { server.handle_request(req).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    warn!(addr = %remote_addr, error = %err, "Connection error");
                }
            });
        }
    }

    /// Buffer the body, then route
    async fn handle_request(
        &self,
        req: Request<Incoming>,
    ) -> std::result::Result<Response<Full<Bytes>>, hyper::Error> {
        let (parts, body) = req.into_parts();
        let body = body.collect().await?.to_bytes();
        Ok(self.route(Request::from_parts(parts, body)).await)
    }

    /// Route a fully buffered request. Never fails; errors become JSON bodies.
    pub async fn route(&self, req: Request<Bytes>) -> Response<Full<Bytes>> {
        let path = req.uri().path().to_string();
        let method = req.method().clone();

        debug!(method = %method, path = %path, "Incoming request");

        let result = match (&method, path.as_str()) {
            (&Method::GET, "/health") => self.handle_health().await,
            (&Method::GET, "/deploy") => self.handle_get_deploy(&req).await,
            (&Method::POST, "/deploy") => self.handle_post_deploy(&req).await,
            (_, "/deploy") => Ok(json_response(
                StatusCode::METHOD_NOT_ALLOWED,
                &json!({ "error": "Method Not Allowed" }),
            )),
            _ => Ok(json_response(
                StatusCode::NOT_FOUND,
                &json!({ "error": "Not Found" }),
            )),
        };

        let response = match result {
            Ok(response) => response,
            Err(e) => error_response(&e),
        };

        debug!(
            method = %method,
            path = %path,
            status = response.status().as_u16(),
            "Request complete"
        );
        response
    }

    /// GET /health
    async fn handle_health(&self) -> Result<Response<Full<Bytes>>> {
        let version = self.engine.schema_version().await?;
        Ok(json_response(
            StatusCode::OK,
            &json!({ "status": "ok", "schemaVersion": version }),
        ))
    }

    /// GET /deploy?action=...
    async fn handle_get_deploy(&self, req: &Request<Bytes>) -> Result<Response<Full<Bytes>>> {
        let user = self.auth.authenticate(req.headers())?;
        let query = params::parse_query_params(req.uri().query().unwrap_or(""));

        let body = match params::lookup(&query, "action") {
            Some("anomalies") => {
                let mode = params::deployment_mode(params::lookup(&query, "deploymentType"))?;
                let anomalies = self.engine.anomalies(user, mode).await?;
                debug!(user_id = %user, mode = %mode, count = anomalies.len(), "Listed anomalies");
                json!({ "anomalies": anomalies })
            }
            Some("status") => {
                let automaton = params::automaton(params::lookup(&query, "automaton"))?;
                let report = self.engine.status(user, automaton, Utc::now()).await?;
                serde_json::to_value(report.status())?
            }
            Some("skill-progress") => {
                let progress = self.engine.skill_progress(user).await?;
                json!({ "skillProgress": progress })
            }
            Some("linked") => {
                let linked = self.engine.linked(user).await?;
                json!({ "linked": linked })
            }
            _ => return Err(Error::invalid("Invalid action")),
        };

        Ok(json_response(StatusCode::OK, &body))
    }

    /// POST /deploy
    async fn handle_post_deploy(&self, req: &Request<Bytes>) -> Result<Response<Full<Bytes>>> {
        let user = self.auth.authenticate(req.headers())?;
        let body = DeployBody::parse(req.body());

        // Only validated; rows are keyed by automaton
        let mode = body.deployment_mode()?;
        let automaton = body.automaton()?;
        let anomaly_ids = body.anomaly_ids();

        let outcome = self
            .engine
            .claim(user, automaton, &anomaly_ids, Utc::now())
            .await?;

        debug!(user_id = %user, mode = %mode, inserted = outcome.inserted, "Deploy accepted");

        Ok(json_response(
            StatusCode::OK,
            &json!({ "success": true, "inserted": outcome.inserted }),
        ))
    }
}

fn json_response(status: StatusCode, body: &Value) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

fn error_response(err: &Error) -> Response<Full<Bytes>> {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(error = %err, "Request error");
    } else {
        debug!(error = %err, status = status.as_u16(), "Request rejected");
    }
    json_response(status, &json!({ "error": err.to_string() }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_shape() {
        let response = error_response(&Error::invalid("No anomalies selected"));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let response = error_response(&Error::Unauthorized);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = error_response(&Error::Write("disk full".into()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
