use super::*;

#[test]
fn test_block_on_runs_future() {
    let runtime = AsyncRuntime::new(Some(1)).unwrap();
    let value = runtime.block_on(async { 40 + 2 });
    assert_eq!(value, 42);
}

#[test]
fn test_spawn_blocking_inside_runtime() {
    let runtime = AsyncRuntime::new(None).unwrap();
    let value = runtime.block_on(async {
        tokio::task::spawn_blocking(|| std::thread::current().name().map(str::to_string))
            .await
            .unwrap()
    });
    assert!(value.is_some());
}
