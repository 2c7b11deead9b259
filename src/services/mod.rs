pub mod detector;
pub mod ingress;
pub mod registry;
pub mod remediation;

pub use detector::{DetectorConfig, FailureDetector, SweepReport};
pub use registry::{RegistryCounts, ServiceRecord, ServiceRegistry, ServiceStatus};
pub use remediation::{RemediationActuator, RestartOutcome, RuntimeStatus};
