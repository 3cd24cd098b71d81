pub mod device_models;
pub mod device_repository;

pub use device_models::DeviceToken;
pub use device_repository::DeviceTokenRepository;
