//! # Cancelkit
//!
//! Cooperative cancellation primitives for asynchronous task chains.
//!
//! One party signals "stop" through a [`CancellationTokenSource`]; any
//! number of interested parties observe the shared [`CancellationToken`]
//! and are notified exactly once, safely, from any thread:
//!
//! - **Token sharing**: a source owns one token and hands out cheap clones
//! - **Observer registry**: registrations fire in insertion order and can
//!   be disposed to stop listening early
//! - **Delayed cancellation**: a source can schedule its cancel on a timer,
//!   with at most one timer outstanding
//! - **Cancellable completions**: delayed completion values that resolve on
//!   schedule unless a token cancels them first
//!
//! ## Quick Start
//!
//! ```rust
//! use cancelkit::prelude::*;
//!
//! #[tokio::main]
//! async fn main() {
//!     let source = CancellationTokenSource::new();
//!     let token = source.token();
//!
//!     let _registration = token.register_cancellation_observer(|| {
//!         println!("stopping");
//!     });
//!
//!     let completion = delayed_completion(5.0, Some(&token));
//!     source.cancel().unwrap();
//!
//!     // The completion settles promptly instead of waiting out the delay.
//!     assert!(completion.await.is_cancelled());
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod completion;
pub mod delay;
pub mod errors;
pub mod registration;
pub mod source;
pub mod token;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::completion::{Completion, CompletionSource, Outcome};
    pub use crate::delay::delayed_completion;
    pub use crate::errors::{CancelAfterError, DisposedError, IntervalError};
    pub use crate::registration::CancellationTokenRegistration;
    pub use crate::source::CancellationTokenSource;
    pub use crate::token::CancellationToken;
}
