// SPDX-License-Identifier: MIT

//! Kernel assembly: wires the store, bus, auth, process table,
//! scheduler, plan book, audit logger, and SSE fan-out together.

use crate::fanout::SseFanout;
use aether_auth::{AuthConfig, AuthCore};
use aether_core::{Clock, EventBus, KernelError, Subscription, SystemClock};
use aether_engine::{AuditLogger, Plans, ProcessTable, Scheduler, TableLimits};
use aether_storage::StateStore;
use std::path::PathBuf;
use tracing::info;

/// Daemon-level configuration resolved from the environment (see
/// `env.rs`). Tests construct it directly.
#[derive(Debug, Clone, Default)]
pub struct KernelConfig {
    /// Durable state directory. `None` runs fully in memory.
    pub state_dir: Option<PathBuf>,
    pub secret: Option<Vec<u8>>,
    pub token_ttl_secs: u64,
    pub max_concurrent: usize,
    pub queue_limit: usize,
    pub slack_signing_secret: Option<String>,
}

/// All kernel subsystems behind one handle.
pub struct Kernel<C: Clock = SystemClock> {
    pub store: StateStore,
    pub bus: EventBus,
    pub auth: AuthCore<C>,
    pub table: ProcessTable<C>,
    pub scheduler: Scheduler<C>,
    pub plans: Plans<C>,
    pub fanout: SseFanout,
    pub slack_signing_secret: Option<String>,
    audit: AuditLogger,
    trigger_tap: Option<Subscription>,
}

impl<C: Clock + 'static> Kernel<C> {
    /// Build and start every subsystem: open (or create) the store,
    /// bootstrap the admin account, attach the audit logger, trigger
    /// evaluation, and the SSE fan-out.
    pub fn start(config: KernelConfig, clock: C) -> Result<Self, KernelError> {
        let store = match &config.state_dir {
            Some(dir) => StateStore::open(dir).map_err(KernelError::from)?,
            None => StateStore::in_memory(),
        };
        let bus = EventBus::new();

        let auth = AuthCore::new(
            store.clone(),
            bus.clone(),
            clock.clone(),
            AuthConfig { secret: config.secret.clone(), token_ttl_secs: config.token_ttl_secs },
        );
        if let Some(admin) = auth.bootstrap_admin()? {
            info!(username = %admin.username, "created bootstrap admin account");
        }

        let limits = TableLimits {
            max_concurrent: if config.max_concurrent == 0 {
                TableLimits::default().max_concurrent
            } else {
                config.max_concurrent
            },
            queue_limit: if config.queue_limit == 0 {
                TableLimits::default().queue_limit
            } else {
                config.queue_limit
            },
        };
        let table = ProcessTable::new(bus.clone(), clock.clone(), limits);
        let scheduler =
            Scheduler::new(store.clone(), table.clone(), bus.clone(), clock.clone());
        let trigger_tap = Some(scheduler.start_triggers());
        let plans = Plans::new(store.clone(), clock.clone());
        let audit = AuditLogger::start(store.clone(), &bus, clock.clone());
        let fanout = SseFanout::start(&bus);

        Ok(Self {
            store,
            bus,
            auth,
            table,
            scheduler,
            plans,
            fanout,
            slack_signing_secret: config.slack_signing_secret,
            audit,
            trigger_tap,
        })
    }

    /// Detach bus consumers. The caller checkpoints the store (with
    /// retry) once connections have drained.
    pub fn shutdown(&mut self) {
        if let Some(tap) = self.trigger_tap.take() {
            tap.cancel();
        }
        self.audit.stop();
    }
}
