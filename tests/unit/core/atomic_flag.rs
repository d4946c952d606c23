use super::*;

#[test]
fn test_initial_value() {
    assert!(AtomicFlag::new(true).get());
    assert!(!AtomicFlag::new(false).get());
    assert!(!AtomicFlag::default().get());
}

#[test]
fn test_enable_disable() {
    let flag = AtomicFlag::new(false);
    flag.enable();
    assert!(flag.get());
    flag.disable();
    assert!(!flag.get());
    flag.set(true);
    assert!(flag.get());
}

#[test]
fn test_shared_across_threads() {
    let flag = std::sync::Arc::new(AtomicFlag::new(false));
    let writer = std::sync::Arc::clone(&flag);
    std::thread::spawn(move || writer.enable()).join().unwrap();
    assert!(flag.get());
}
