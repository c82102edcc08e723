use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use knex_di::DynError;

pub trait HealthCheck: Send + Sync {
    fn name(&self) -> &str;
    fn check(&self) -> Result<(), DynError>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// Monotonic tick counter standing in for wall clock time
#[derive(Default)]
pub struct TickClock(AtomicU64);
impl Clock for TickClock {
    fn now(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

#[derive(Debug)]
pub struct HealthReport {
    pub checked_at: Option<u64>,
    pub healthy: Vec<String>,
    pub failing: Vec<(String, String)>,
}

pub trait Health: Send + Sync {
    fn report(&self) -> HealthReport;
}

#[derive(Default)]
pub struct HealthService {
    pub checks: Vec<Arc<dyn HealthCheck>>,
    pub clock: Option<Arc<dyn Clock>>,
}

impl Health for HealthService {
    fn report(&self) -> HealthReport {
        let mut report = HealthReport {
            checked_at: self.clock.as_ref().map(|clock| clock.now()),
            healthy: Vec::new(),
            failing: Vec::new(),
        };
        for check in &self.checks {
            match check.check() {
                Ok(()) => report.healthy.push(check.name().to_string()),
                Err(e) => report.failing.push((check.name().to_string(), e.to_string())),
            }
        }
        report
    }
}

#[derive(Default)]
pub struct DatabaseCheck;
impl HealthCheck for DatabaseCheck {
    fn name(&self) -> &str {
        "database"
    }

    fn check(&self) -> Result<(), DynError> {
        Ok(())
    }
}

#[derive(Default)]
pub struct CacheCheck;
impl HealthCheck for CacheCheck {
    fn name(&self) -> &str {
        "cache"
    }

    fn check(&self) -> Result<(), DynError> {
        Err("cache is warming up".into())
    }
}
