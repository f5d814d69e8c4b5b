//! Session runtime for the Nebulous UDP protocol.
//!
//! The [`Client`] owns the socket and runs two cooperating tasks: a send
//! loop (heartbeat plus queued packets, gated on the initial world
//! snapshot) and a receive loop (classify, parse, mirror, dispatch).
//! Host code observes the session through [`ClientCallbacks`] and drives it
//! through a [`ClientHandle`].

pub mod account;
pub mod callbacks;
pub mod client;
pub mod config;
pub mod error;
pub mod world;

pub use account::{AccountClient, SecureTicket, ServerRegion, Ticket};
pub use callbacks::{ClientCallbacks, NoopCallbacks};
pub use client::{Client, ClientHandle};
pub use config::ClientConfig;
pub use error::ClientError;
pub use world::World;
