pub mod bootstrap;
pub mod configuration;
pub mod delivery_worker;
pub mod domain;
pub mod email_client;
pub mod email_queue;
pub mod email_templates;
pub mod routes;
pub mod startup;
pub mod telemetry;
