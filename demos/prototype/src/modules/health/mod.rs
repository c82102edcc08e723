pub mod health_module;
pub mod health_service;
