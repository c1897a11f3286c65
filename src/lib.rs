pub mod authority;
pub mod intent;
pub mod session;
pub mod settings;
pub mod sim;
pub mod submit;
pub mod telemetry;
