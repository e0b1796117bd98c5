pub mod config;
pub mod key_press;
pub mod logging;
pub mod matcher;
pub mod registry;
pub mod timers;
pub mod ui;

pub use config::{Config, ConfigPatch, DisplayConfig, MatcherConfig};
pub use key_press::{format_key_for_display, normalize_token, KeyPress, KeyTarget};
pub use matcher::{KeyDisposition, MatcherHandle, SequenceMatcher};
pub use registry::{
    RegisterOptions, RegistrationError, SequenceBinding, SequenceCallback, SequenceRegistry,
    TargetValidator,
};
