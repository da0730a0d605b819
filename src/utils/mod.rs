pub mod directory;
pub mod paths;
pub mod progress;
