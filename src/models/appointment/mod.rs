pub mod filter;
pub mod normalize;
pub mod queries;
pub mod types;

pub use filter::{AppointmentFilter, distinct_experts, distinct_specialties};
pub use normalize::{NormalizeError, RawAppointment, Rejected, normalize, partition};
pub use queries::*;
pub use types::*;
