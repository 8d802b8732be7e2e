//! Core data types shared across the mediation pipeline

mod context;
mod message;
mod request;
mod response;

pub use context::{ApplicationContext, UseCase};
pub use message::{
    ChatMessage, MessageMetadata, MessageRole, assistant_message, system_message, user_message,
};
pub use request::RequestConfig;
pub use response::{
    AiResponse, ResponseError, ResponseMeta, SafetyCheckData, SafetyCheckResponse,
};
