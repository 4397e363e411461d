//! HTTP rendition of the list and detail screens.

use actix_web::{get, web, App, HttpResponse, HttpServer};
use anyhow::Result;
use serde::Serialize;
use strum::IntoEnumIterator;
use tracing::info;

use crate::{
    diagnostics::{message, DiagnosticError, Diagnostics},
    metric::Metric,
};

#[derive(Debug, Serialize)]
struct MetricEntry {
    id: &'static str,
    name: String,
}

#[derive(Debug, Serialize)]
struct MetricResponse {
    metric: String,
    message: String,
    available: bool,
}

#[get("/v1/metrics")]
pub async fn list() -> HttpResponse {
    let entries: Vec<MetricEntry> = Metric::iter()
        .map(|metric| MetricEntry {
            id: metric.id(),
            name: metric.to_string(),
        })
        .collect();

    HttpResponse::Ok().json(entries)
}

#[get("/v1/metrics/{metric}")]
pub async fn detail(
    path: web::Path<String>,
    diagnostics: web::Data<Diagnostics>,
) -> HttpResponse {
    let name = path.into_inner();
    let result = diagnostics.measure_named(&name).await;

    let metric = name
        .parse::<Metric>()
        .map(|m| m.to_string())
        .unwrap_or_else(|_| name.clone());

    let response = MetricResponse {
        metric,
        message: message(&result),
        available: result.is_ok(),
    };

    match result {
        Ok(_) => HttpResponse::Ok().json(response),
        Err(DiagnosticError::PermissionDenied) => HttpResponse::Forbidden().json(response),
        Err(DiagnosticError::Unsupported(_)) => HttpResponse::NotFound().json(response),
        Err(_) => HttpResponse::Ok().json(response),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list).service(detail);
}

pub async fn run(diagnostics: Diagnostics, port: u16) -> Result<()> {
    let diagnostics = web::Data::new(diagnostics);
    info!(port, "serving metrics");

    HttpServer::new(move || {
        App::new()
            .app_data(diagnostics.clone())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await?;

    Ok(())
}
