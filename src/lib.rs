//! # Zeta4G Driver Core
//!
//! The routing and result-streaming core of the
//! [Zeta4G](https://github.com/zeta9044/zeta4g) Bolt driver.
//!
//! ## Features
//!
//! - **Round-robin routing** - Lock-free per-role server selection for readers and writers
//! - **Least-connected routing** - Optional load-aware selection over the same routing table
//! - **Reactive results** - Demand-driven result cursor bridging RUN / PULL responses
//! - **Async streams** - Records exposed as a `futures::Stream` with batched fetching
//!
//! ## Routing
//!
//! ```rust
//! use zeta4g_driver_core::{AccessMode, DriverConfig, LoadBalancer, ServerAddress};
//!
//! let config = DriverConfig::new("zeta4g://router1:7687").unwrap();
//! let balancer = LoadBalancer::from_config(&config);
//!
//! balancer.update(
//!     vec![ServerAddress::new("router1", 7687)],
//!     vec![ServerAddress::new("writer1", 7687)],
//!     vec![ServerAddress::new("reader1", 7687), ServerAddress::new("reader2", 7687)],
//! );
//!
//! let first = balancer.select(AccessMode::Read).unwrap();
//! let second = balancer.select(AccessMode::Read).unwrap();
//! assert_ne!(first, second);
//! ```
//!
//! ## Result Cursor
//!
//! The connection layer feeds decoded responses into the handlers; the
//! cursor exposes them as a subscription driven by `request(n)` / `cancel()`:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use zeta4g_driver_core::driver::handlers::{BasicPullHandler, RunResponseHandler};
//! use zeta4g_driver_core::driver::reactive::ResultCursor;
//!
//! let run = RunResponseHandler::new();
//! // ... connection delivers the RUN response ...
//! run.resolved().await;
//!
//! let pull = Arc::new(BasicPullHandler::for_run(&run, connection));
//! let cursor = ResultCursor::new(&run, pull)?;
//!
//! cursor.install_record_consumer(|record, _| println!("{:?}", record));
//! cursor.install_summary_consumer(|summary, error| match error {
//!     Some(e) => eprintln!("query failed: {}", e),
//!     None => println!("done: {:?}", summary),
//! });
//! cursor.request(100);
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`DriverResult`]:
//!
//! ```rust
//! use zeta4g_driver_core::{AccessMode, DriverConfig, DriverError, LoadBalancer};
//!
//! let config = DriverConfig::new("zeta4g://router1:7687").unwrap();
//! let balancer = LoadBalancer::from_config(&config);
//!
//! match balancer.select(AccessMode::Write) {
//!     Ok(server) => println!("writing to {}", server),
//!     Err(DriverError::ServiceUnavailable(msg)) => eprintln!("no writer: {}", msg),
//!     Err(e) => eprintln!("error: {}", e),
//! }
//! ```
//!
//! ## Modules
//!
//! - [`driver`] - Routing, response handlers and reactive results
//!

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod driver;

// Re-exports for convenience
pub use driver::{
    DriverConfig, DriverConfigBuilder, ServerAddress,
    Record, Value,
    DriverError, DriverResult, BoltError,
    ResultSummary, Counters, QueryType,
};

pub use driver::routing::{AccessMode, LoadBalancer, RoutingPolicy, RoutingTable};
pub use driver::reactive::{ReactiveRecordStream, ResultCursor};

/// Config alias for convenience
pub type Config = DriverConfig;
