use nebulous_protocol::{GameData, NetDot, NetEject, NetItem, NetPlayer};
use tracing::debug;

/// In-memory mirror of the server's world, rebuilt from every `GameData`
/// snapshot. Mutated only by the receive loop; everyone else sees complete
/// snapshots.
#[derive(Debug, Clone, Default)]
pub struct World {
    pub map_size: f32,
    pub players: Vec<NetPlayer>,
    pub ejects: Vec<NetEject>,
    pub dots: Vec<NetDot>,
    pub items: Vec<NetItem>,
    /// Wire index of the local player, once discovered by alias.
    pub local_player_index: Option<u8>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the mirror with a fresh snapshot and keep looking for the
    /// session alias until the local player is found.
    pub fn apply_snapshot(&mut self, snapshot: &GameData, session_alias: &str) {
        self.map_size = snapshot.map_size;
        self.players = snapshot.players.clone();
        self.ejects = snapshot.ejects.clone();
        self.dots = snapshot.dots.clone();
        self.items = snapshot.items.clone();

        if let Some(player) = self
            .players
            .iter()
            .find(|player| player.alias == session_alias)
        {
            if self.local_player_index != Some(player.player_id) {
                debug!(player_id = player.player_id, "Local player discovered");
            }
            self.local_player_index = Some(player.player_id);
        }
    }
}
