use crate::key_press::KeyPress;

/// Callback invoked when a binding fires: `(identity, press)`.
pub type SequenceCallback = Box<dyn FnMut(&str, &KeyPress)>;

/// Opt-in gate for editable targets. When a binding carries one, it alone
/// decides whether the binding may fire for a given press.
pub type TargetValidator = Box<dyn Fn(&KeyPress) -> bool>;

/// Rejected registration input. Raised synchronously by `register`; event
/// processing itself never errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("a pattern or an identity is required")]
    MissingKeyIdentifier,

    #[error("a callback is required")]
    MissingCallback,
}

/// One registered key sequence.
///
/// `identity` is the handle used by `unregister`; the registry does not
/// enforce uniqueness, so several bindings may share an identity and all of
/// them fire and are removed together.
pub struct SequenceBinding {
    pub identity: String,
    pub pattern: String,
    pub(crate) callback: SequenceCallback,
    pub(crate) target_validator: Option<TargetValidator>,
    pub once: bool,
}

impl std::fmt::Debug for SequenceBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceBinding")
            .field("identity", &self.identity)
            .field("pattern", &self.pattern)
            .field("has_validator", &self.target_validator.is_some())
            .field("once", &self.once)
            .finish()
    }
}

/// Registration input. At least one of `identity`/`pattern` plus a callback
/// are required; the rest defaults.
#[derive(Default)]
pub struct RegisterOptions {
    pub identity: Option<String>,
    pub pattern: Option<String>,
    pub callback: Option<SequenceCallback>,
    pub target_validator: Option<TargetValidator>,
    pub once: bool,
}

impl RegisterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn callback(mut self, callback: impl FnMut(&str, &KeyPress) + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    pub fn target_validator(mut self, validator: impl Fn(&KeyPress) -> bool + 'static) -> Self {
        self.target_validator = Some(Box::new(validator));
        self
    }

    pub fn once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }
}

/// Insertion-ordered collection of bindings. Evaluation order on every key
/// event is registration order.
#[derive(Default)]
pub struct SequenceRegistry {
    bindings: Vec<SequenceBinding>,
}

impl SequenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a binding.
    ///
    /// Missing fields are resolved first: a missing identity defaults to the
    /// pattern, a missing pattern defaults to the identity lowercased up to
    /// its first `|`. Duplicate identities and patterns are accepted.
    pub fn register(&mut self, options: RegisterOptions) -> Result<(), RegistrationError> {
        let (identity, pattern) = match (options.identity, options.pattern) {
            (None, None) => return Err(RegistrationError::MissingKeyIdentifier),
            (Some(identity), None) => {
                let pattern = identity
                    .to_lowercase()
                    .split('|')
                    .next()
                    .unwrap_or_default()
                    .to_string();
                (identity, pattern)
            }
            (None, Some(pattern)) => (pattern.clone(), pattern),
            (Some(identity), Some(pattern)) => (identity, pattern),
        };

        let callback = options
            .callback
            .ok_or(RegistrationError::MissingCallback)?;

        self.bindings.push(SequenceBinding {
            identity,
            pattern,
            callback,
            target_validator: options.target_validator,
            once: options.once,
        });
        Ok(())
    }

    /// Remove every binding with this exact identity. No-op when absent.
    pub fn unregister(&mut self, identity: &str) {
        self.bindings.retain(|binding| binding.identity != identity);
    }

    pub fn iter(&self) -> impl Iterator<Item = &SequenceBinding> {
        self.bindings.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut SequenceBinding> {
        self.bindings.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> impl FnMut(&str, &KeyPress) {
        |_, _| {}
    }

    #[test]
    fn test_identity_defaults_to_pattern() {
        let mut registry = SequenceRegistry::new();
        registry
            .register(RegisterOptions::new().pattern("ctrl+k").callback(noop()))
            .unwrap();

        let binding = registry.iter().next().unwrap();
        assert_eq!(binding.identity, "ctrl+k");
        assert_eq!(binding.pattern, "ctrl+k");
    }

    #[test]
    fn test_pattern_defaults_to_identity_prefix() {
        let mut registry = SequenceRegistry::new();
        registry
            .register(RegisterOptions::new().identity("X|fallback").callback(noop()))
            .unwrap();

        let binding = registry.iter().next().unwrap();
        assert_eq!(binding.identity, "X|fallback");
        assert_eq!(binding.pattern, "x");
    }

    #[test]
    fn test_missing_identity_and_pattern_rejected() {
        let mut registry = SequenceRegistry::new();
        let result = registry.register(RegisterOptions::new().callback(noop()));
        assert_eq!(result, Err(RegistrationError::MissingKeyIdentifier));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_missing_callback_rejected() {
        let mut registry = SequenceRegistry::new();
        let result = registry.register(RegisterOptions::new().pattern("a"));
        assert_eq!(result, Err(RegistrationError::MissingCallback));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_identities_are_kept() {
        let mut registry = SequenceRegistry::new();
        registry
            .register(RegisterOptions::new().identity("layer").pattern("k").callback(noop()))
            .unwrap();
        registry
            .register(RegisterOptions::new().identity("layer").pattern("k").callback(noop()))
            .unwrap();
        assert_eq!(registry.len(), 2);

        registry.unregister("layer");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister_unknown_identity_is_noop() {
        let mut registry = SequenceRegistry::new();
        registry.unregister("nothing-here");
        registry.unregister("nothing-here");
        assert!(registry.is_empty());
    }
}
