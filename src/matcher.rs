//! The sequence matcher: rolling token history, registry evaluation, and
//! the suppression decision for every incoming key press.

use chrono::Local;
use std::cell::RefCell;
use std::rc::Rc;

use crate::config::{ConfigPatch, MatcherConfig};
use crate::key_press::{format_key_for_display, KeyPress};
use crate::registry::{RegisterOptions, RegistrationError, SequenceBinding, SequenceRegistry};
use crate::timers::{BlockingWindow, IdleTimer};

/// Maximum number of key presses to keep in the diagnostic log
const MAX_KEY_LOG: usize = 50;

/// The engine's verdict for one key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Dropped inside the blocking window; nothing was touched.
    Blocked,
    /// No binding fired; the host should forward the key as usual.
    PassThrough,
    /// At least one binding fired; the host must swallow the key.
    /// `fired` holds the identities in evaluation order.
    Suppressed { fired: Vec<String> },
}

impl KeyDisposition {
    pub fn is_suppressed(&self) -> bool {
        matches!(self, KeyDisposition::Suppressed { .. })
    }
}

/// Recognizes registered key sequences in a stream of key presses.
///
/// Feed every key-down to [`process_key`](Self::process_key) and call
/// [`poll_idle`](Self::poll_idle) from the host's tick loop so stale token
/// history expires between presses. All state lives here; the matcher never
/// owns the event loop.
pub struct SequenceMatcher {
    config: MatcherConfig,
    registry: SequenceRegistry,
    /// Normalized tokens accumulated since the last reset.
    history: Vec<String>,
    idle: IdleTimer,
    blocking: BlockingWindow,
    /// Recent presses with timestamps, for debug views.
    key_log: Vec<String>,
}

impl SequenceMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        let idle = IdleTimer::new(config.timeout());
        let blocking = BlockingWindow::new(config.blocking_delay());
        Self {
            config,
            registry: SequenceRegistry::new(),
            history: Vec::new(),
            idle,
            blocking,
            key_log: Vec::new(),
        }
    }

    /// Add a binding. See [`RegisterOptions`] for the defaulting rules.
    pub fn register(&mut self, options: RegisterOptions) -> Result<(), RegistrationError> {
        self.registry.register(options)
    }

    /// Remove every binding with this identity. No-op when absent.
    pub fn unregister(&mut self, identity: &str) {
        self.registry.unregister(identity);
    }

    /// Merge new timing values; they apply from the next key event.
    pub fn set_configuration(&mut self, patch: ConfigPatch) {
        self.config.apply(&patch);
        self.idle.set_delay(self.config.timeout());
        self.blocking.set_delay(self.config.blocking_delay());
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Process one key press and decide what the host should do with it.
    pub fn process_key(&mut self, press: &KeyPress) -> KeyDisposition {
        self.log_key_press(press);

        if self.blocking.is_active() {
            tracing::trace!(target: "matcher", "key dropped inside blocking window");
            return KeyDisposition::Blocked;
        }

        if self.idle.expired() {
            tracing::debug!(
                target: "matcher",
                stale = self.history.len(),
                "idle timeout, clearing pending tokens"
            );
            self.history.clear();
        }

        self.history.push(press.token());
        self.idle.rearm();

        let candidate = self.history.join("+");
        tracing::trace!(target: "matcher", %candidate, "evaluating registry");

        let mut fired: Vec<String> = Vec::new();
        let mut expended: Vec<String> = Vec::new();

        // Every binding is visited, in registration order, even after one
        // fires; the blocking window only affects future events.
        for binding in self.registry.iter_mut() {
            if !candidate.contains(binding.pattern.as_str()) {
                continue;
            }

            let allowed = match &binding.target_validator {
                Some(validate) => validate(press),
                // Without a validator, typing targets never trigger bindings.
                None => !press.target.accepts_text(),
            };
            if !allowed {
                continue;
            }

            let identity = binding.identity.clone();
            (binding.callback)(&identity, press);
            if binding.once {
                expended.push(identity.clone());
            }
            fired.push(identity);
        }

        if fired.is_empty() {
            return KeyDisposition::PassThrough;
        }

        for identity in &expended {
            self.registry.unregister(identity);
        }
        self.history.clear();
        self.idle.disarm();
        self.blocking.engage();

        tracing::debug!(target: "matcher", count = fired.len(), "sequence fired, suppressing key");
        KeyDisposition::Suppressed { fired }
    }

    /// Expire the idle deadline without waiting for the next key press.
    /// Returns true when stale history was cleared.
    pub fn poll_idle(&mut self) -> bool {
        if !self.idle.expired() {
            return false;
        }
        self.idle.disarm();
        if self.history.is_empty() {
            return false;
        }
        tracing::debug!(
            target: "matcher",
            stale = self.history.len(),
            "idle timeout, clearing pending tokens"
        );
        self.history.clear();
        true
    }

    /// Tokens accumulated toward the next match.
    pub fn pending_tokens(&self) -> &[String] {
        &self.history
    }

    pub fn is_blocking(&self) -> bool {
        self.blocking.is_active()
    }

    pub fn bindings(&self) -> impl Iterator<Item = &SequenceBinding> {
        self.registry.iter()
    }

    /// Record a press in the diagnostic log.
    fn log_key_press(&mut self, press: &KeyPress) {
        if self.key_log.len() >= MAX_KEY_LOG {
            self.key_log.remove(0);
        }
        let timestamp = Local::now().format("%H:%M:%S.%3f");
        let entry = format!("[{}] {}", timestamp, format_key_for_display(&press.event));
        self.key_log.push(entry);
    }

    /// Recent presses, oldest first.
    pub fn recent_keys(&self) -> &[String] {
        &self.key_log
    }

    pub fn clear_key_log(&mut self) {
        self.key_log.clear();
    }

    /// Pretty print for debug view
    pub fn format_debug_info(&self) -> String {
        let mut output = String::new();

        output.push_str("========== MATCHER STATE ==========\n");
        if self.history.is_empty() {
            output.push_str("No pending sequence\n");
        } else {
            output.push_str(&format!("Pending: {}\n", self.history.join(" → ")));
            if let Some(remaining) = self.idle.time_remaining() {
                output.push_str(&format!("Idle reset in: {}ms\n", remaining.as_millis()));
            }
        }
        if let Some(remaining) = self.blocking.time_remaining() {
            output.push_str(&format!("Blocking for: {}ms\n", remaining.as_millis()));
        }

        output.push_str("\n========== BINDINGS ==========\n");
        for binding in self.registry.iter() {
            let mut line = format!("{} → {}", binding.pattern, binding.identity);
            if binding.once {
                line.push_str(" (once)");
            }
            if binding.target_validator.is_some() {
                line.push_str(" (validated)");
            }
            output.push_str(&line);
            output.push('\n');
        }

        output.push_str("\n========== KEY PRESS HISTORY ==========\n");
        output.push_str(&format!("(Most recent at bottom, last {} keys)\n", MAX_KEY_LOG));
        for entry in &self.key_log {
            output.push_str(entry);
            output.push('\n');
        }

        output
    }
}

impl Default for SequenceMatcher {
    fn default() -> Self {
        Self::new(MatcherConfig::default())
    }
}

/// Shared, single-threaded handle to one matcher instance.
///
/// Hosts construct exactly one and pass clones to whatever needs to
/// register bindings or feed events; there is no hidden global. Callbacks
/// run while the matcher is borrowed, so they must not call back into the
/// handle.
#[derive(Clone)]
pub struct MatcherHandle {
    inner: Rc<RefCell<SequenceMatcher>>,
}

impl MatcherHandle {
    pub fn new(config: MatcherConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SequenceMatcher::new(config))),
        }
    }

    pub fn register(&self, options: RegisterOptions) -> Result<(), RegistrationError> {
        self.inner.borrow_mut().register(options)
    }

    pub fn unregister(&self, identity: &str) {
        self.inner.borrow_mut().unregister(identity);
    }

    pub fn set_configuration(&self, patch: ConfigPatch) {
        self.inner.borrow_mut().set_configuration(patch);
    }

    pub fn process_key(&self, press: &KeyPress) -> KeyDisposition {
        self.inner.borrow_mut().process_key(press)
    }

    pub fn poll_idle(&self) -> bool {
        self.inner.borrow_mut().poll_idle()
    }

    /// Read-only access for rendering and diagnostics.
    pub fn with<R>(&self, f: impl FnOnce(&SequenceMatcher) -> R) -> R {
        f(&self.inner.borrow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_press::KeyTarget;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::thread::sleep;
    use std::time::Duration;

    fn press(c: char) -> KeyPress {
        KeyPress::new(KeyEvent::new(KeyCode::Char(c), KeyModifiers::empty()))
    }

    fn counting_matcher(pattern: &str) -> (SequenceMatcher, Rc<RefCell<u32>>) {
        let mut matcher = SequenceMatcher::default();
        let count = Rc::new(RefCell::new(0u32));
        let seen = count.clone();
        matcher
            .register(
                RegisterOptions::new()
                    .pattern(pattern)
                    .callback(move |_, _| *seen.borrow_mut() += 1),
            )
            .unwrap();
        (matcher, count)
    }

    #[test]
    fn test_single_key_fires_and_suppresses() {
        let (mut matcher, count) = counting_matcher("a");

        let disposition = matcher.process_key(&press('a'));
        assert_eq!(
            disposition,
            KeyDisposition::Suppressed {
                fired: vec!["a".to_string()]
            }
        );
        assert_eq!(*count.borrow(), 1);
        assert!(matcher.pending_tokens().is_empty());
    }

    #[test]
    fn test_unmatched_key_passes_through() {
        let (mut matcher, count) = counting_matcher("a");

        assert_eq!(matcher.process_key(&press('z')), KeyDisposition::PassThrough);
        assert_eq!(*count.borrow(), 0);
        assert_eq!(matcher.pending_tokens(), ["z".to_string()]);
    }

    #[test]
    fn test_blocking_window_drops_following_event() {
        let mut matcher = SequenceMatcher::new(MatcherConfig {
            timeout_ms: 500,
            blocking_delay_ms: 80,
        });
        let count = Rc::new(RefCell::new(0u32));
        let seen = count.clone();
        matcher
            .register(
                RegisterOptions::new()
                    .pattern("a")
                    .callback(move |_, _| *seen.borrow_mut() += 1),
            )
            .unwrap();

        assert!(matcher.process_key(&press('a')).is_suppressed());
        assert_eq!(matcher.process_key(&press('a')), KeyDisposition::Blocked);
        assert_eq!(*count.borrow(), 1);
        assert!(matcher.pending_tokens().is_empty());

        sleep(Duration::from_millis(120));
        assert!(matcher.process_key(&press('a')).is_suppressed());
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn test_once_binding_expires_after_firing() {
        let mut matcher = SequenceMatcher::default();
        let count = Rc::new(RefCell::new(0u32));
        let seen = count.clone();
        matcher
            .register(
                RegisterOptions::new()
                    .pattern("a")
                    .once(true)
                    .callback(move |_, _| *seen.borrow_mut() += 1),
            )
            .unwrap();

        assert!(matcher.process_key(&press('a')).is_suppressed());
        sleep(Duration::from_millis(30));
        assert_eq!(matcher.process_key(&press('a')), KeyDisposition::PassThrough);
        assert_eq!(*count.borrow(), 1);
        assert_eq!(matcher.bindings().count(), 0);
    }

    #[test]
    fn test_editable_target_skips_unvalidated_binding() {
        let (mut matcher, count) = counting_matcher("a");

        let typed = KeyPress::with_target(
            KeyEvent::new(KeyCode::Char('a'), KeyModifiers::empty()),
            KeyTarget::TextInput,
        );
        assert_eq!(matcher.process_key(&typed), KeyDisposition::PassThrough);
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn test_poll_idle_clears_stale_history() {
        let mut matcher = SequenceMatcher::new(MatcherConfig {
            timeout_ms: 20,
            blocking_delay_ms: 10,
        });

        matcher.process_key(&press('a'));
        assert_eq!(matcher.pending_tokens().len(), 1);

        sleep(Duration::from_millis(40));
        assert!(matcher.poll_idle());
        assert!(matcher.pending_tokens().is_empty());
        assert!(!matcher.poll_idle());
    }

    #[test]
    fn test_key_log_records_presses() {
        let (mut matcher, _) = counting_matcher("q");
        matcher.process_key(&press('x'));
        matcher.process_key(&press('y'));
        assert_eq!(matcher.recent_keys().len(), 2);
        assert!(matcher.recent_keys()[0].contains('x'));

        matcher.clear_key_log();
        assert!(matcher.recent_keys().is_empty());
    }
}
