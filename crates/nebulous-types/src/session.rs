use std::net::Ipv4Addr;

use crate::SplitMultiplier;

/// Identifiers established during the connect handshake.
///
/// `client_id` is drawn client-side (never zero); the rest are assigned by
/// the server in the connect result. Written once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct SessionIds {
    pub client_id: i32,
    pub public_id: i32,
    pub private_id: i32,
    pub game_id: i32,
    pub split_multiplier: SplitMultiplier,
    /// Resolved UDP address of the region server, kept for the keep-alive
    /// echo (which is the one little-endian field of the protocol).
    pub server_ip: Ipv4Addr,
}
