use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use keyseq::{KeyPress, KeyTarget, MatcherConfig, RegisterOptions, SequenceMatcher};
use std::thread::sleep;
use std::time::Duration;

fn main() {
    println!("Walking the sequence matcher through a scripted stream...");

    let mut matcher = SequenceMatcher::new(MatcherConfig {
        timeout_ms: 200,
        blocking_delay_ms: 10,
    });

    matcher
        .register(
            RegisterOptions::new()
                .identity("help")
                .pattern("ctrl+shift+h")
                .callback(|identity, press| {
                    println!("  callback: {} fired on {:?}", identity, press.target)
                }),
        )
        .unwrap();

    matcher
        .register(
            RegisterOptions::new()
                .pattern("a+b")
                .callback(|identity, _| println!("  callback: {} fired", identity)),
        )
        .unwrap();

    println!("\nSending ctrl+shift+h on a surface:");
    let combo = KeyPress::new(KeyEvent::new(
        KeyCode::Char('h'),
        KeyModifiers::CONTROL | KeyModifiers::SHIFT,
    ));
    println!("Result: {:?}", matcher.process_key(&combo));

    println!("\nSending it again inside the blocking window:");
    println!("Result: {:?}", matcher.process_key(&combo));

    sleep(Duration::from_millis(20));
    println!("\nAfter the window expires:");
    println!("Result: {:?}", matcher.process_key(&combo));

    sleep(Duration::from_millis(20));
    println!("\nTwo-step sequence 'a' then 'b':");
    let a = KeyPress::new(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::empty()));
    let b = KeyPress::new(KeyEvent::new(KeyCode::Char('b'), KeyModifiers::empty()));
    println!("Result for 'a': {:?}", matcher.process_key(&a));
    println!("Result for 'b': {:?}", matcher.process_key(&b));

    sleep(Duration::from_millis(20));
    println!("\nSame combo aimed at a text input (no validator, so it passes through):");
    let typed = KeyPress::with_target(
        KeyEvent::new(KeyCode::Char('h'), KeyModifiers::CONTROL | KeyModifiers::SHIFT),
        KeyTarget::TextInput,
    );
    println!("Result: {:?}", matcher.process_key(&typed));

    println!("\n{}", matcher.format_debug_info());
}
