//! Health check command

use super::Context;
use crate::output::{emit, format_duration, Status};
use anyhow::Result;
use rehab_api_client::prelude::HealthStatus;
use serde::Serialize;

#[derive(Serialize)]
struct HealthReport<'a> {
    url: &'a str,
    #[serde(flatten)]
    status: HealthStatus,
    elapsed_ms: u64,
}

/// Probe the backend once
pub async fn run(ctx: &Context) -> Result<()> {
    let (status, elapsed) = ctx.client.health().check_timed().await?;

    let report = HealthReport {
        url: ctx.client.base_url(),
        status,
        elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
    };
    emit(ctx.format, &report, |report| {
        Status::success(&format!(
            "{} is {} ({})",
            report.url,
            report.status.status.as_deref().unwrap_or("up"),
            format_duration(elapsed)
        ));
    })
}
