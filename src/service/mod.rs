pub mod backup;
pub mod collector;
pub mod detector;
pub mod hash;
pub mod notifier;
pub mod runner;
