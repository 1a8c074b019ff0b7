#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod generation;
pub mod history_service;
pub mod sessions;
pub mod timer;

pub use exam_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, ConfigError, GenerationError, SessionError, TimerError};
pub use generation::{
    AiConfig, AiQuestionClient, BatchRequest, ExamGenerator, QuestionGenerator, TopicRequest,
};
pub use history_service::HistoryService;
pub use sessions::{
    DashboardView, GenerationOutcome, GenerationTicket, ReviewView, SessionController,
    SessionPhase, SessionState, TestView,
};
pub use timer::{CountdownTimer, TimerSnapshot, wait_for_expiry};
