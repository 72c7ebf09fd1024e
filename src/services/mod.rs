pub mod assistant;
pub mod deploy;

pub use assistant::{AssistantBackend, AssistantReply, CannedAssistant};
pub use deploy::{Deployment, Publisher, SimulatedPublisher};
