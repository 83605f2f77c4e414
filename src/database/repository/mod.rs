//! Repository module - decentralized data access layer.

mod settings_repository;

pub use settings_repository::UserSettingsRepo;
