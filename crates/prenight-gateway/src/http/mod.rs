pub mod autoload;
pub mod health;
pub mod index;
