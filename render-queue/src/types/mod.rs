pub mod ids;
pub mod message;
pub mod policy;
pub mod record;
pub mod status;

pub use ids::JobId;
pub use message::JobMessage;
pub use policy::EnqueuePolicy;
pub use record::JobRecord;
pub use status::JobStatus;
