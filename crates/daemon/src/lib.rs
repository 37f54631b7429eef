// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! aether-daemon: the `aetherd` binary, boundary glue between the wire
//! protocol and the kernel subsystems.
//!
//! Every inbound request passes two gates in order: identity (bearer
//! token → user) and authorization (the policy engine), then ownership
//! for process-scoped operations.

pub mod dispatch;
pub mod env;
pub mod fanout;
pub mod kernel;
pub mod lifecycle;
pub mod listener;
pub mod retry;

pub use dispatch::{dispatch, DispatchOutcome};
pub use fanout::SseFanout;
pub use kernel::{Kernel, KernelConfig};

/// Daemon version reported in every response frame.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
