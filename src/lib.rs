//! # reactive-store
//!
//! `reactive-store` is a dependency-tracking state container, meant to be the model layer
//! of MVVM user interfaces.
//!
//! - [`Observable<T>`], [`ObservableVec<T>`], [`ObservableMap<K, V>`], [`ObservableSet<T>`]:
//!   values whose reads are tracked and whose writes notify dependents.
//! - [`Computed<T>`]: a memoized value derived from other observables.
//! - [`reaction`]: a function that runs again when anything it read has changed.
//! - [`action`]: a batching boundary for writes. Reactions run once per outermost action,
//!   after every write of the action is applied.
//!
//! ```rust
//! use reactive_store::{action, core::Runtime, reaction, Error, Observable};
//!
//! # fn main() -> Result<(), Error> {
//! let _rt = Runtime::new();
//!
//! let a = Observable::new(0);
//! let b = Observable::new(1);
//! let _r = reaction({
//!     let a = a.clone();
//!     let b = b.clone();
//!     move || println!("{}", a.get() + b.get())
//! })?; // prints "1"
//!
//! action(|| {
//!     a.set(2)?;
//!     b.set(5)
//! })?; // prints "7", once
//! # Ok(())
//! # }
//! ```
//!
//! Dependencies are recorded on every run, so a reaction that reads different observables
//! depending on a condition only ever depends on what its last run actually read.
//!
//! Writes outside any action fail with [`Error::NotInAction`] under the default
//! [`WritePolicy::Strict`]. With [`WritePolicy::Lenient`], each such write becomes an action of its own.
//!
//! All state is per thread: create one [`core::Runtime`] on the thread that owns the stores.

pub mod core;

mod action;
mod collections;
mod computed;
mod config;
mod error;
mod observable;
mod reaction;

pub use crate::core::{in_action, is_tracking, untracked, ActionScope};
pub use action::*;
pub use collections::*;
pub use computed::*;
pub use config::*;
pub use error::*;
pub use observable::*;
pub use reaction::*;
