//! Application layer: the dispatch runtime and its handlers.
//!
//! # Sub-modules
//!
//! - **`dispatch`** – The builder, the armed runtime, and the per-packet
//!   validation pipeline.  Runs on every packet the device delivers.
//!
//! - **`handlers`** – The `Handler` trait, the default handler answering the
//!   standard identity queries, and the fallback that refuses unhandled
//!   direct messages.

pub mod dispatch;
pub mod handlers;
