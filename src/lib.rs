pub mod authentication;
pub mod campaign_delivery_worker;
pub mod configuration;
pub mod content;
pub mod domain;
pub mod email_client;
pub mod newsletter;
pub mod routes;
pub mod session_state;
pub mod startup;
pub mod storage_client;
pub mod telemetry;
