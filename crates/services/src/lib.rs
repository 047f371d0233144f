#![forbid(unsafe_code)]

pub mod api;
pub mod app_services;
pub mod config;
pub mod error;
pub mod notify;
pub mod sessions;

pub use api::{HttpStudyApi, StudyApi};
pub use app_services::{AppServices, HydrateReport};
pub use config::ApiConfig;
pub use error::{ApiError, AppServicesError, AssessmentError, ConfigError, StoryError};
pub use notify::{ChannelNotifier, LogNotifier, NoopNotifier, Notification, Notifier};
pub use sessions::{AssessmentSession, HydrateOutcome, StorySession};
