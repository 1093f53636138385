//! Infrastructure layer for the CEC engine.
//!
//! Contains the adapters around the dispatch runtime: device transports,
//! diagnostic listeners, and configuration storage.
//!
//! **Dependency rule**: the `application` layer talks to devices only through
//! the [`device::Device`] trait and to diagnostics only through
//! [`diagnostics::Listener`].

pub mod device;
pub mod diagnostics;
pub mod storage;
