mod controller;
mod state;
mod view;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use controller::{
    GENERATION_FAILED_MESSAGE, GenerationOutcome, GenerationTicket, SessionController,
    TIMER_FAILED_MESSAGE,
};
pub use state::{ActiveTest, ReviewedTest, SessionPhase, SessionState, TestProgress};
pub use view::{
    ClockView, DashboardView, GridCell, OptionReview, PracticeTestItem, ReviewCell, ReviewView,
    SubmitConfirmation, TestView,
};
