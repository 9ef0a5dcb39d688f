pub mod worker;

pub use worker::{session_channel, SessionHandle, SessionWorker, SurveyEvent};
