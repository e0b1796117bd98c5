pub mod indicator;

pub use indicator::KeyPressIndicator;
