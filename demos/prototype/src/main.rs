use std::sync::Arc;

use knex_di::{KnexError, Provider, Registry, Scope};
use modules::health::{
    health_module,
    health_service::{Clock, Health, HealthCheck, TickClock},
};
use tracing_subscriber::EnvFilter;

mod modules;

#[derive(Debug, thiserror::Error)]
enum PrototypeError {
    #[error(transparent)]
    Registry(#[from] KnexError),
    #[error("Health check instance was not shared")]
    NotShared,
}

fn main() -> Result<(), PrototypeError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,knex_di=debug")),
        )
        .init();

    // Things every application shares
    let platform = Registry::named("platform");
    platform.register_provider(
        Provider::of::<dyn Clock, _>(|| Ok(Arc::new(TickClock::default()) as Arc<dyn Clock>))
            .with_scope(Scope::Container),
    )?;

    let app = Registry::named("app");
    app.add_parent(&platform)?;
    health_module::register(&app)?;
    tracing::info!("{app:?}");

    let health = app.get::<dyn Health>()?;
    for _ in 0..2 {
        let report = health.report();
        tracing::info!(
            checked_at = ?report.checked_at,
            healthy = ?report.healthy,
            failing = ?report.failing,
            "Health report"
        );
    }

    let checks = app.get_all::<dyn HealthCheck>()?;
    tracing::info!(
        checks = ?checks.iter().map(|check| check.name()).collect::<Vec<_>>(),
        "All health checks"
    );

    // Container scoped, so the id lookup hands out the instance built above
    let database = app.get_by_id("database")?;
    let again = app.get_by_id("database")?;
    if !database.same(&again) {
        return Err(PrototypeError::NotShared);
    }
    let database = database.downcast::<dyn HealthCheck>()?;
    tracing::info!(check = database.name(), "Resolved by id");

    // Two checks are registered, a single one can only be had by id
    if let Err(err) = app.get::<dyn HealthCheck>() {
        tracing::warn!(%err, "Ambiguous request");
    }

    if let Err(err) = platform.add_parent(&app) {
        tracing::warn!(%err, "Rejected parent");
    }

    Ok(())
}
