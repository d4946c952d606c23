use std::io;
use std::sync::Arc;

use scanbridge::config;
use scanbridge::core_module::CoreModule;
use scanbridge::engine::memory::MemoryEngine;
use scanbridge::engine::CaptureEngine;
use scanbridge::lifecycle::ObserverDispatcher;
use scanbridge::module::{GenericModeModule, ModuleLocator};
use scanbridge::runtime::{AsyncRuntime, MainThread};
use scanbridge::transport::{self, Bridge, ChannelEmitter};

mod logging;

fn main() -> io::Result<()> {
    let settings = config::load_settings();
    let logging = logging::init(&settings);
    match &logging {
        Some(guard) => tracing::debug!(log_dir = %guard.log_dir().display(), "file logging enabled"),
        None => eprintln!("scanbridge: file logging unavailable"),
    }

    let runtime = AsyncRuntime::new(settings.worker_threads)?;
    let main_thread = Arc::new(MainThread::spawn(&settings.main_thread_name)?);

    let (tx, rx) = transport::channel();
    let emitter = Arc::new(ChannelEmitter::new(tx.clone()));
    let engine: Arc<dyn CaptureEngine> = Arc::new(MemoryEngine::default());
    let dispatcher = Arc::new(ObserverDispatcher::default());

    let core = CoreModule::new(
        Arc::clone(&engine),
        emitter.clone(),
        Arc::clone(&main_thread),
        Arc::clone(&dispatcher),
    );
    let barcode = GenericModeModule::new(
        "BarcodeModule",
        engine,
        Arc::clone(core.contexts()),
        dispatcher,
        &["barcodeCapture", "barcodeBatch"],
        &["barcodeCapture", "barcodeBatchBasic"],
    );

    let locator = Arc::new(ModuleLocator::new());
    locator.register(core).map_err(io::Error::other)?;
    locator.register(barcode).map_err(io::Error::other)?;

    let bridge = Arc::new(Bridge::new(locator, emitter, tx));
    bridge.start();
    tracing::info!("bridge ready, reading requests from stdin");

    runtime.block_on(transport::serve(
        bridge,
        rx,
        tokio::io::stdin(),
        tokio::io::stdout(),
    ))
}
