pub mod configuration;
pub mod dispatcher;
pub mod domain;
pub mod email_client;
pub mod loader;
pub mod message;
pub mod renderer;
pub mod startup;
pub mod telemetry;
pub mod transport;
