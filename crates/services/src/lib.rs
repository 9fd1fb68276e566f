#![forbid(unsafe_code)]

pub mod app_services;
pub mod completion;
pub mod error;
pub mod gateway;
pub mod player;
pub mod recorder;
pub mod resume;

pub use videotrack_core::Clock;

pub use app_services::AppServices;
pub use completion::{
    CompletionService, CompletionSink, LoggingSink, RecordingSink, WATCH_COMPLETE_RULE,
};
pub use error::{
    AppServicesError, AttemptServiceError, CompletionError, ResumeError, TransportError,
};
pub use gateway::{HttpProgressGateway, ProgressGateway, SubmitAck};
pub use player::{PlayerSession, VideoBinding};
pub use recorder::{AttemptService, SubmitOutcome};
pub use resume::ResumeService;
