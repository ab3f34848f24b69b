pub mod registry;
pub mod scheduler;

pub use registry::PatientRegistry;
pub use scheduler::AppointmentScheduler;
