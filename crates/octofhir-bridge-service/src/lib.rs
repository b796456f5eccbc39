pub mod patch;
pub mod service;
pub mod validator;

pub use patch::PatchFormat;
pub use service::{ResourceService, UpdateOutcome};
pub use validator::{AcceptAll, EntityValidator};
