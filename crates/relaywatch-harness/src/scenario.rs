//! Scripted scenarios over the production runtime.
//!
//! A [`Scenario`] mounts the real [`Runtime`] on a [`SimEnv`], a
//! [`MockTransport`] and a [`SimDriver`], then lets a test move virtual time
//! and inject events. Timers fire at their exact deadlines, and the standard
//! invariants are asserted after every step.

use std::{sync::Arc, time::Duration};

use relaywatch_app::{Notifications, Runtime, RuntimeConfig, UiEvent};
use relaywatch_core::{ConnectionEvent, Environment, NotificationCard, Transport};

use crate::{
    invariants::{InvariantRegistry, SystemSnapshot},
    sim_driver::{Frame, SimDriver},
    sim_env::{SimEnv, SimInstant},
    sim_transport::MockTransport,
};

/// Mounted layer under simulation.
pub struct Scenario {
    env: SimEnv,
    transport: Arc<MockTransport>,
    driver: SimDriver,
    runtime: Runtime<SimDriver, SimEnv>,
    invariants: InvariantRegistry,
}

impl Scenario {
    /// Mount with default configuration and a connecting transport.
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, RuntimeConfig::default())
    }

    /// Mount with `config` and a connecting transport.
    pub fn with_config(seed: u64, config: RuntimeConfig) -> Self {
        let transport = Arc::new(MockTransport::new());
        Self::mount(seed, config, Some(transport.clone()), transport)
    }

    /// Mount without a transport. The mock is created but never attached.
    pub fn detached(seed: u64) -> Self {
        Self::mount(seed, RuntimeConfig::default(), None, Arc::new(MockTransport::new()))
    }

    fn mount(
        seed: u64,
        config: RuntimeConfig,
        attached: Option<Arc<dyn Transport>>,
        transport: Arc<MockTransport>,
    ) -> Self {
        let env = SimEnv::with_seed(seed);
        let driver = SimDriver::new();
        let runtime = Runtime::new(driver.clone(), env.clone(), attached, config);
        Self { env, transport, driver, runtime, invariants: InvariantRegistry::standard() }
    }

    /// The scripted transport.
    pub fn transport(&self) -> &MockTransport {
        &self.transport
    }

    /// The scripted transport, shared.
    pub fn shared_transport(&self) -> Arc<MockTransport> {
        Arc::clone(&self.transport)
    }

    /// Handle bound to the mounted notification center.
    pub fn notifications(&self) -> Notifications {
        self.runtime.notifications()
    }

    /// Current virtual time.
    pub fn now(&self) -> SimInstant {
        self.env.now()
    }

    /// Milliseconds since mount.
    pub fn elapsed_ms(&self) -> u64 {
        self.env.now().as_millis()
    }

    /// Process everything ready at the current instant.
    pub fn step(&mut self) {
        let result = self.runtime.step();
        self.expect_ok(result.map_err(|e| e.to_string()), "step");
        let snapshot = self.snapshot();
        let context = format!("at {}ms", self.elapsed_ms());
        self.invariants.assert_all(&snapshot, &context);
    }

    /// Advance virtual time by `ms`, firing every timer at its deadline.
    pub fn advance_ms(&mut self, ms: u64) {
        let target = self.now() + Duration::from_millis(ms);
        while let Some(deadline) = self.runtime.next_deadline() {
            if deadline > target {
                break;
            }
            self.env.advance_to(deadline);
            self.step();
        }
        self.env.advance_to(target);
        self.step();
    }

    /// Advance to an absolute instant since mount.
    pub fn advance_to_ms(&mut self, ms: u64) {
        let now = self.elapsed_ms();
        self.advance_ms(ms.saturating_sub(now));
    }

    /// Emit a transport event and process it.
    pub fn emit(&mut self, event: ConnectionEvent) {
        self.transport.emit(event);
        self.step();
    }

    /// Inject an input event and process it.
    pub fn input(&mut self, input: UiEvent) {
        let result = self.runtime.handle_input(input);
        self.expect_ok(result.map(|_| ()).map_err(|e| e.to_string()), "input");
        self.step();
    }

    /// Full observable state.
    pub fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot::capture(self.runtime.center(), self.runtime.status(), self.now())
    }

    /// Visible cards.
    pub fn cards(&self) -> Vec<NotificationCard> {
        self.runtime.center().cards(self.now())
    }

    /// Last frame drawn by the driver.
    pub fn frame(&self) -> Frame {
        self.driver.last_frame()
    }

    /// Driver handle shared with the runtime.
    pub fn driver(&self) -> &SimDriver {
        &self.driver
    }

    /// The runtime under test.
    pub fn runtime(&self) -> &Runtime<SimDriver, SimEnv> {
        &self.runtime
    }

    /// Unmount everything.
    pub fn unmount(self) {
        self.runtime.shutdown();
    }

    #[allow(clippy::panic, reason = "scenario failures abort the test")]
    fn expect_ok(&self, result: Result<(), String>, what: &str) {
        if let Err(e) = result {
            panic!("{what} failed at {}ms: {e}", self.elapsed_ms());
        }
    }
}
