use std::fmt;

use pb_core::{Error, PostTransport, RecordStore, Result};
use pb_scrapers::ScraperManager;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    pub name: &'static str,
    pub ok: bool,
    pub detail: String,
}

impl Probe {
    fn from_result<T: fmt::Display>(name: &'static str, result: Result<T>) -> Self {
        match result {
            Ok(detail) => {
                tracing::info!("  ✅ {}: {}", name, detail);
                Self { name, ok: true, detail: detail.to_string() }
            }
            Err(e) => {
                tracing::error!("  ❌ {}: {}", name, e);
                Self { name, ok: false, detail: e.to_string() }
            }
        }
    }
}

/// Outcome of the pre-run probes. Every probe runs even when an earlier one fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthReport {
    pub probes: Vec<Probe>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.probes.iter().all(|p| p.ok)
    }

    pub fn failures(&self) -> Vec<&Probe> {
        self.probes.iter().filter(|p| !p.ok).collect()
    }

    pub fn into_result(self) -> Result<HealthReport> {
        if self.is_healthy() {
            return Ok(self);
        }
        let failed = self
            .failures()
            .iter()
            .map(|p| format!("{} ({})", p.name, p.detail))
            .collect::<Vec<_>>()
            .join("; ");
        Err(Error::HealthCheck(failed))
    }
}

/// Probe the listing source, the store and, when `require_transport` is set
/// or one is configured, the publishing transport. A store that could not be
/// opened is reported as a failed store check.
pub async fn check_services(
    source: &ScraperManager,
    store: std::result::Result<&dyn RecordStore, &Error>,
    transport: Option<&dyn PostTransport>,
    require_transport: bool,
) -> HealthReport {
    tracing::info!("🔍 Running health checks...");
    let mut report = HealthReport::default();

    let listing = source.check_available().await.map(|_| format!("{} reachable", source.source().name()));
    report.probes.push(Probe::from_result("listing source", listing));

    let store_check = match store {
        Ok(store) => store.ping().await.map(|_| "query ok".to_string()),
        Err(e) => Err(Error::Database(format!("could not open store: {}", e))),
    };
    report.probes.push(Probe::from_result("record store", store_check));

    match transport {
        Some(transport) => {
            let auth = transport
                .verify_credentials()
                .await
                .map(|handle| format!("{} authenticated as @{}", transport.name(), handle));
            report.probes.push(Probe::from_result("publishing transport", auth));
        }
        None if require_transport => {
            let missing: Result<String> = Err(Error::Config("no publishing transport configured".to_string()));
            report.probes.push(Probe::from_result("publishing transport", missing));
        }
        None => tracing::info!("  Publishing transport not configured, skipped"),
    }

    if report.is_healthy() {
        tracing::info!("✅ All health checks passed");
    }
    report
}
