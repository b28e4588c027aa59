//! # unrest-testing
//!
//! Test doubles for the unrest data-fetching layer.
//!
//! - [`MockTransport`]: a scripted fetch-like transport with an
//!   artificial delay and request capture, standing in for the network.
//! - [`TestStore`]: an in-memory host store that applies a facade's
//!   reducers to every dispatched event and records the event log.
//! - [`FixedClock`] / [`MutableClock`]: deterministic time for
//!   cache-window tests.
//!
//! ## Example
//!
//! ```ignore
//! let api = Api::new(routes, config.with_transport(transport))?;
//! let store = TestStore::new(&api);
//! let report = api.actions("color")?.get(None).run(&store).await?;
//! assert!(report.is_success());
//! assert_eq!(store.state_of("color").objects.len(), 1);
//! ```

/// Deterministic clocks.
pub mod clock;

/// In-memory host store.
pub mod store;

/// Scripted transport.
pub mod transport;

pub use clock::{FixedClock, MutableClock, mutable_clock, test_clock};
pub use store::TestStore;
pub use transport::MockTransport;
