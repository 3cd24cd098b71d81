pub mod settings_models;
pub mod settings_repository;

pub use settings_models::{DoNotDisturb, NotificationPreferences};
pub use settings_repository::SettingsRepository;
