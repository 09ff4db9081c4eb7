pub mod kafka;
pub mod listeners;
pub mod mappers;
pub mod messages;
