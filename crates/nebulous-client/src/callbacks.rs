//! Host observation points.
//!
//! Every method takes a mutable view of the packet or event so hosts can
//! post-process before the client acts on it. Defaults are no-ops.
//! Callbacks run on the session's receive path and must not block; an `Err`
//! terminates the session.

use anyhow::Result;
use nebulous_protocol::events::*;
use nebulous_protocol::{
    ClanChatMessage, ConnectRequest3, ConnectResult2, Disconnect, GameChatMessage, GameData,
    GameEvent, KeepAlive,
};

#[allow(unused_variables)]
pub trait ClientCallbacks: Send {
    // === Lifecycle packets ===

    /// Fires right before the connect request is serialized and shuffled.
    fn on_connect(&mut self, packet: &mut ConnectRequest3) -> Result<()> {
        Ok(())
    }

    fn on_connect_result(&mut self, packet: &mut ConnectResult2) -> Result<()> {
        Ok(())
    }

    fn on_keep_alive(&mut self, packet: &mut KeepAlive) -> Result<()> {
        Ok(())
    }

    fn on_disconnect(&mut self, packet: &mut Disconnect) -> Result<()> {
        Ok(())
    }

    // === World and chat ===

    fn on_game_data(&mut self, packet: &mut GameData) -> Result<()> {
        Ok(())
    }

    fn on_game_chat_message(&mut self, message: &mut GameChatMessage) -> Result<()> {
        Ok(())
    }

    fn on_clan_chat_message(&mut self, message: &mut ClanChatMessage) -> Result<()> {
        Ok(())
    }

    // === Game events ===

    /// Fires for every event in a `GameUpdate`, before its typed callback.
    fn on_game_event(&mut self, event: &mut GameEvent) -> Result<()> {
        Ok(())
    }

    fn on_blob_explode(&mut self, event: &mut BlobExplodeEvent) -> Result<()> {
        Ok(())
    }

    fn on_eject(&mut self, event: &mut EjectEvent) -> Result<()> {
        Ok(())
    }

    fn on_split(&mut self, event: &mut SplitEvent) -> Result<()> {
        Ok(())
    }

    fn on_recombine(&mut self, event: &mut RecombineEvent) -> Result<()> {
        Ok(())
    }

    fn on_achievement_earned(&mut self, event: &mut AchievementEarnedEvent) -> Result<()> {
        Ok(())
    }

    fn on_xp_set(&mut self, event: &mut XpSetEvent) -> Result<()> {
        Ok(())
    }

    fn on_dq_set(&mut self, event: &mut DqSetEvent) -> Result<()> {
        Ok(())
    }

    fn on_dq_completed(&mut self, event: &mut DqCompletedEvent) -> Result<()> {
        Ok(())
    }

    fn on_dq_progress(&mut self, event: &mut DqProgressEvent) -> Result<()> {
        Ok(())
    }

    fn on_eat_special_objects(&mut self, event: &mut EatSpecialObjectsEvent) -> Result<()> {
        Ok(())
    }

    fn on_so_set(&mut self, event: &mut SoSetEvent) -> Result<()> {
        Ok(())
    }

    fn on_level_up(&mut self, event: &mut LevelUpEvent) -> Result<()> {
        Ok(())
    }

    fn on_arena_rank_achieved(&mut self, event: &mut ArenaRankAchievedEvent) -> Result<()> {
        Ok(())
    }

    fn on_blob_status(&mut self, event: &mut BlobStatusEvent) -> Result<()> {
        Ok(())
    }

    fn on_teleport(&mut self, event: &mut TeleportEvent) -> Result<()> {
        Ok(())
    }

    fn on_shoot(&mut self, event: &mut ShootEvent) -> Result<()> {
        Ok(())
    }

    fn on_clan_war_won(&mut self, event: &mut ClanWarWonEvent) -> Result<()> {
        Ok(())
    }

    fn on_plasma_reward(&mut self, event: &mut PlasmaRewardEvent) -> Result<()> {
        Ok(())
    }

    fn on_emote(&mut self, event: &mut EmoteEvent) -> Result<()> {
        Ok(())
    }

    fn on_end_mission(&mut self, event: &mut EndMissionEvent) -> Result<()> {
        Ok(())
    }

    fn on_xp_gained2(&mut self, event: &mut XpGained2Event) -> Result<()> {
        Ok(())
    }

    fn on_eat_cake(&mut self, event: &mut EatCakeEvent) -> Result<()> {
        Ok(())
    }

    fn on_coin_count(&mut self, event: &mut CoinCountEvent) -> Result<()> {
        Ok(())
    }

    fn on_speed(&mut self, event: &mut SpeedEvent) -> Result<()> {
        Ok(())
    }

    fn on_trick(&mut self, event: &mut TrickEvent) -> Result<()> {
        Ok(())
    }

    fn on_accolade(&mut self, event: &mut AccoladeEvent) -> Result<()> {
        Ok(())
    }

    fn on_invis(&mut self, event: &mut InvisibleEvent) -> Result<()> {
        Ok(())
    }

    fn on_killed_by(&mut self, event: &mut KilledByEvent) -> Result<()> {
        Ok(())
    }

    fn on_radiation_cloud(&mut self, event: &mut RadiationCloudEvent) -> Result<()> {
        Ok(())
    }

    fn on_charge(&mut self, event: &mut ChargeEvent) -> Result<()> {
        Ok(())
    }

    fn on_lp_count(&mut self, event: &mut LpCountEvent) -> Result<()> {
        Ok(())
    }

    fn on_br_bounds(&mut self, event: &mut BrBoundsEvent) -> Result<()> {
        Ok(())
    }

    fn on_rlgl_state(&mut self, event: &mut RlglStateEvent) -> Result<()> {
        Ok(())
    }
}

/// Callbacks that do nothing; useful for headless observers.
pub struct NoopCallbacks;

impl ClientCallbacks for NoopCallbacks {}

/// Route an event to its typed callback. Tag-only events have no typed
/// form and are covered by `on_game_event` alone.
pub(crate) fn dispatch_event(
    callbacks: &mut dyn ClientCallbacks,
    event: &mut GameEvent,
) -> Result<()> {
    match event {
        GameEvent::BlobExplode(e) => callbacks.on_blob_explode(e),
        GameEvent::Eject(e) => callbacks.on_eject(e),
        GameEvent::Split(e) => callbacks.on_split(e),
        GameEvent::Recombine(e) => callbacks.on_recombine(e),
        GameEvent::AchievementEarned(e) => callbacks.on_achievement_earned(e),
        GameEvent::XpSet(e) => callbacks.on_xp_set(e),
        GameEvent::DqSet(e) => callbacks.on_dq_set(e),
        GameEvent::DqCompleted(e) => callbacks.on_dq_completed(e),
        GameEvent::DqProgress(e) => callbacks.on_dq_progress(e),
        GameEvent::EatSpecialObjects(e) => callbacks.on_eat_special_objects(e),
        GameEvent::SoSet(e) => callbacks.on_so_set(e),
        GameEvent::LevelUp(e) => callbacks.on_level_up(e),
        GameEvent::ArenaRankAchieved(e) => callbacks.on_arena_rank_achieved(e),
        GameEvent::BlobStatus(e) => callbacks.on_blob_status(e),
        GameEvent::Teleport(e) => callbacks.on_teleport(e),
        GameEvent::Shoot(e) => callbacks.on_shoot(e),
        GameEvent::ClanWarWon(e) => callbacks.on_clan_war_won(e),
        GameEvent::PlasmaReward(e) => callbacks.on_plasma_reward(e),
        GameEvent::Emote(e) => callbacks.on_emote(e),
        GameEvent::EndMission(e) => callbacks.on_end_mission(e),
        GameEvent::XpGained2(e) => callbacks.on_xp_gained2(e),
        GameEvent::EatCake(e) => callbacks.on_eat_cake(e),
        GameEvent::CoinCount(e) => callbacks.on_coin_count(e),
        GameEvent::Speed(e) => callbacks.on_speed(e),
        GameEvent::Trick(e) => callbacks.on_trick(e),
        GameEvent::Accolade(e) => callbacks.on_accolade(e),
        GameEvent::Invis(e) => callbacks.on_invis(e),
        GameEvent::KilledBy(e) => callbacks.on_killed_by(e),
        GameEvent::RadiationCloud(e) => callbacks.on_radiation_cloud(e),
        GameEvent::Charge(e) => callbacks.on_charge(e),
        GameEvent::LpCount(e) => callbacks.on_lp_count(e),
        GameEvent::BrBounds(e) => callbacks.on_br_bounds(e),
        GameEvent::RlglState(e) => callbacks.on_rlgl_state(e),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        splits: usize,
        events: usize,
    }

    impl ClientCallbacks for Counter {
        fn on_game_event(&mut self, _event: &mut GameEvent) -> Result<()> {
            self.events += 1;
            Ok(())
        }

        fn on_split(&mut self, _event: &mut SplitEvent) -> Result<()> {
            self.splits += 1;
            Ok(())
        }
    }

    #[test]
    fn test_typed_dispatch() {
        let mut counter = Counter {
            splits: 0,
            events: 0,
        };
        let mut event = GameEvent::Split(SplitEvent { player_id: 1 });
        counter.on_game_event(&mut event).unwrap();
        dispatch_event(&mut counter, &mut event).unwrap();
        assert_eq!(counter.splits, 1);
        assert_eq!(counter.events, 1);

        // tag-only events only reach the generic callback
        let mut event = GameEvent::GameOver;
        counter.on_game_event(&mut event).unwrap();
        dispatch_event(&mut counter, &mut event).unwrap();
        assert_eq!(counter.splits, 1);
        assert_eq!(counter.events, 2);
    }

    #[test]
    fn test_callback_errors_propagate() {
        struct Failing;
        impl ClientCallbacks for Failing {
            fn on_split(&mut self, _event: &mut SplitEvent) -> Result<()> {
                anyhow::bail!("host rejected event")
            }
        }
        let mut event = GameEvent::Split(SplitEvent { player_id: 1 });
        assert!(dispatch_event(&mut Failing, &mut event).is_err());
    }
}
