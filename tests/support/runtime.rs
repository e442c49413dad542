//! Shared Tokio runtime and mock servers for behavioural tests.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use rstest_bdd::Slot;
use tokio::runtime::Runtime;
use wiremock::MockServer;

/// Shared runtime wrapper that can be stored in an `rstest-bdd` Slot.
#[derive(Clone)]
pub struct SharedRuntime(Rc<RefCell<Runtime>>);

impl SharedRuntime {
    /// Wraps `runtime` for sharing between steps.
    pub fn new(runtime: Runtime) -> Self {
        Self(Rc::new(RefCell::new(runtime)))
    }

    /// Drives `future` to completion on the shared runtime.
    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.0.borrow().block_on(future)
    }
}

/// Returns the scenario runtime, creating it on first use.
///
/// # Errors
///
/// Returns an error if the Tokio runtime cannot be created.
pub fn ensure_runtime(runtime: &Slot<SharedRuntime>) -> Result<SharedRuntime, io::Error> {
    if runtime.with_ref(|_| ()).is_none() {
        runtime.set(SharedRuntime::new(Runtime::new()?));
    }

    runtime
        .get()
        .ok_or_else(|| io::Error::other("runtime not initialised after set"))
}

/// Returns the URI of the mock server in `server`, starting one on first use.
///
/// # Errors
///
/// Returns an error if the slot behaves unexpectedly.
pub fn ensure_server(
    runtime: &SharedRuntime,
    server: &Slot<MockServer>,
) -> Result<String, io::Error> {
    if server.with_ref(|_| ()).is_none() {
        server.set(runtime.block_on(MockServer::start()));
    }

    server
        .with_ref(MockServer::uri)
        .ok_or_else(|| io::Error::other("mock server not initialised after set"))
}
