pub mod codec;
pub mod entities;
pub mod events;
pub mod handshake;
pub mod packets;
pub mod rng;

pub use codec::*;
pub use entities::*;
pub use events::*;
pub use handshake::{shuffle_connect_payload, unshuffle_connect_payload, verify_connect_header};
pub use packets::*;
pub use rng::JavaRandom;
