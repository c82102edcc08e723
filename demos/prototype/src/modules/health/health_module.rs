use std::sync::Arc;

use knex_di::{KnexError, Registry, Resource, Scope};

use super::health_service::{
    CacheCheck, Clock, DatabaseCheck, Health, HealthCheck, HealthService,
};

/// Registers the health checks and the service aggregating them
///
/// The clock is optional, it is usually provided by a parent registry.
pub fn register(registry: &Registry) -> Result<(), KnexError> {
    registry.register(
        Resource::<DatabaseCheck>::new()
            .provides::<dyn HealthCheck>(|check| check as Arc<dyn HealthCheck>)
            .id("database")
            .with_scope(Scope::Container)
            .injector(|_, _| Ok(())),
    )?;
    registry.register(
        Resource::<CacheCheck>::new()
            .provides::<dyn HealthCheck>(|check| check as Arc<dyn HealthCheck>)
            .id("cache")
            .injector(|_, _| Ok(())),
    )?;

    registry.register(
        Resource::<HealthService>::new()
            .provides::<dyn Health>(|service| service as Arc<dyn Health>)
            .with_scope(Scope::Container)
            .collection::<dyn HealthCheck>()
            .optional::<dyn Clock>()
            .injector(|service, dependencies| {
                service.checks = dependencies.next()?;
                service.clock = dependencies.next()?;
                Ok(())
            }),
    )
}
