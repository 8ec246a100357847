// Dashboard configuration
pub mod settings;
