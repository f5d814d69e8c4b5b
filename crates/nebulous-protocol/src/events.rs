//! Sub-events carried inside a `GameUpdate` packet.
//!
//! The payload is a bare concatenation of events with no per-event length,
//! so an unrecognized type byte makes the rest of the datagram
//! unrecoverable: decoding logs the stray byte and stops there.

use bytes::{BufMut, BytesMut};
use nebulous_types::GameEventType;
use tracing::warn;

use crate::codec::*;

/// Range of the XP chain multiplier field (before the +1.0 bias).
const CHAIN_MULTIPLIER_RANGE: f32 = 8.0;

/// Range of the radiation cloud countdown.
const RADIATION_REMAINING_RANGE: f32 = 16.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BlobExplodeEvent {
    pub player_id: u8,
    pub blob_id: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EjectEvent {
    pub player_id: u8,
    pub blob_id: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SplitEvent {
    pub player_id: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecombineEvent {
    pub player_id: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AchievementEarnedEvent {
    pub achievement_id: i16,
}

/// XP total plus temp-boost bookkeeping. The plasma boost duration is not
/// part of the payload even though its type is.
#[derive(Debug, Clone, PartialEq)]
pub struct XpSetEvent {
    pub player_xp: i64,
    pub xp_mult_type: u8,
    pub xp_duration_s: i32,
    pub plasma_boost_type: u8,
    pub click_type_duration_s: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DqSetEvent {
    pub dq_id: u8,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DqCompletedEvent {
    pub dq_id: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DqProgressEvent {
    pub progress: i16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EatSpecialObjectsEvent {
    pub so_id: u8,
    pub so_count: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoSetEvent {
    pub so_id: u8,
    pub so_count: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelUpEvent {
    pub level: i16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArenaRankAchievedEvent {
    pub achieved_rank: bool,
    pub rank: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlobStatusEvent {
    pub player_id: u8,
    pub blob_id: u8,
    pub status: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeleportEvent {
    pub player_id: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShootEvent {
    pub player_id: u8,
    pub blob_id: u8,
    pub spell_id: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClanWarWonEvent {
    pub reward: i16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlasmaRewardEvent {
    pub reward: u32,
    pub multiplier: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmoteEvent {
    pub player_id: u8,
    pub blob_id: u8,
    pub emote_id: u8,
    pub custom_emote_id: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EndMissionEvent {
    pub mission_id: u8,
    pub passed: bool,
    pub next_mission_id: u8,
    pub xp_reward: u32,
    pub plasma_reward: i16,
}

/// Session XP gain. The chain multiplier is biased on the wire: raw 0.0
/// means a logical x1.0, so decoding adds 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct XpGained2Event {
    pub player_xp: u32,
    pub xp_chain_multiplier: f32,
    pub xp_gained: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EatCakeEvent {
    pub plasma_amount: u32,
    pub xp_amount: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoinCountEvent {
    pub player_id: u8,
    pub coin_count: i16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeedEvent {
    pub speed_time_ms_offset: i16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrickEvent {
    pub trick_id: u8,
    pub trick_score: i16,
    pub trick_xp: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccoladeEvent {
    pub accolades_gained: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvisibleEvent {
    pub ghost_time_ms_offset: i16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KilledByEvent {
    pub killer_id: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RadiationCloudEvent {
    pub player_id: u8,
    pub x: f32,
    pub y: f32,
    pub time_remaining: f32,
}

/// Charge-mode charge-up. The charge kind's value set is undocumented, so
/// it travels as a raw byte.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeEvent {
    pub player_id: u8,
    pub charge_type: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LpCountEvent {
    pub lp_count: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RlglStateEvent {
    pub state: u8,
}

/// Battle-royale play area, then the limited area, as left/top/right/bottom
/// fences in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct BrBoundsEvent {
    pub bounds: [f32; 4],
    pub limited_bounds: [f32; 4],
}

/// One decoded `GameUpdate` sub-event.
///
/// Events the protocol defines without a payload keep their tag only.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Unknown,
    EatDots,
    EatBlob,
    EatSmbh,
    BlobExplode(BlobExplodeEvent),
    BlobLost,
    Eject(EjectEvent),
    Split(SplitEvent),
    Recombine(RecombineEvent),
    TimerWarning,
    CtfScore,
    CtfFlagReturned,
    CtfFlagStolen,
    CtfFlagDropped,
    AchievementEarned(AchievementEarnedEvent),
    XpGained,
    Unused2,
    XpSet(XpSetEvent),
    DqSet(DqSetEvent),
    DqCompleted(DqCompletedEvent),
    DqProgress(DqProgressEvent),
    EatServerBlob,
    EatSpecialObjects(EatSpecialObjectsEvent),
    SoSet(SoSetEvent),
    LevelUp(LevelUpEvent),
    ArenaRankAchieved(ArenaRankAchievedEvent),
    DomCpLost,
    DomCpGained,
    Unused1,
    CtfGained,
    GameOver,
    BlobStatus(BlobStatusEvent),
    Teleport(TeleportEvent),
    Shoot(ShootEvent),
    ClanWarWon(ClanWarWonEvent),
    PlasmaReward(PlasmaRewardEvent),
    Emote(EmoteEvent),
    EndMission(EndMissionEvent),
    XpGained2(XpGained2Event),
    EatCake(EatCakeEvent),
    CoinCount(CoinCountEvent),
    ClearEffects,
    Speed(SpeedEvent),
    Trick(TrickEvent),
    DestroyAsteroid,
    Accolade(AccoladeEvent),
    Invis(InvisibleEvent),
    KilledBy(KilledByEvent),
    RadiationCloud(RadiationCloudEvent),
    Charge(ChargeEvent),
    LpCount(LpCountEvent),
    BrBounds(BrBoundsEvent),
    Minimap,
    RlglDeath,
    RlglState(RlglStateEvent),
}

impl GameEvent {
    pub fn event_type(&self) -> GameEventType {
        match self {
            GameEvent::Unknown => GameEventType::Unknown,
            GameEvent::EatDots => GameEventType::EatDots,
            GameEvent::EatBlob => GameEventType::EatBlob,
            GameEvent::EatSmbh => GameEventType::EatSmbh,
            GameEvent::BlobExplode(_) => GameEventType::BlobExplode,
            GameEvent::BlobLost => GameEventType::BlobLost,
            GameEvent::Eject(_) => GameEventType::Eject,
            GameEvent::Split(_) => GameEventType::Split,
            GameEvent::Recombine(_) => GameEventType::Recombine,
            GameEvent::TimerWarning => GameEventType::TimerWarning,
            GameEvent::CtfScore => GameEventType::CtfScore,
            GameEvent::CtfFlagReturned => GameEventType::CtfFlagReturned,
            GameEvent::CtfFlagStolen => GameEventType::CtfFlagStolen,
            GameEvent::CtfFlagDropped => GameEventType::CtfFlagDropped,
            GameEvent::AchievementEarned(_) => GameEventType::AchievementEarned,
            GameEvent::XpGained => GameEventType::XpGained,
            GameEvent::Unused2 => GameEventType::Unused2,
            GameEvent::XpSet(_) => GameEventType::XpSet,
            GameEvent::DqSet(_) => GameEventType::DqSet,
            GameEvent::DqCompleted(_) => GameEventType::DqCompleted,
            GameEvent::DqProgress(_) => GameEventType::DqProgress,
            GameEvent::EatServerBlob => GameEventType::EatServerBlob,
            GameEvent::EatSpecialObjects(_) => GameEventType::EatSpecialObjects,
            GameEvent::SoSet(_) => GameEventType::SoSet,
            GameEvent::LevelUp(_) => GameEventType::LevelUp,
            GameEvent::ArenaRankAchieved(_) => GameEventType::ArenaRankAchieved,
            GameEvent::DomCpLost => GameEventType::DomCpLost,
            GameEvent::DomCpGained => GameEventType::DomCpGained,
            GameEvent::Unused1 => GameEventType::Unused1,
            GameEvent::CtfGained => GameEventType::CtfGained,
            GameEvent::GameOver => GameEventType::GameOver,
            GameEvent::BlobStatus(_) => GameEventType::BlobStatus,
            GameEvent::Teleport(_) => GameEventType::Teleport,
            GameEvent::Shoot(_) => GameEventType::Shoot,
            GameEvent::ClanWarWon(_) => GameEventType::ClanWarWon,
            GameEvent::PlasmaReward(_) => GameEventType::PlasmaReward,
            GameEvent::Emote(_) => GameEventType::Emote,
            GameEvent::EndMission(_) => GameEventType::EndMission,
            GameEvent::XpGained2(_) => GameEventType::XpGained2,
            GameEvent::EatCake(_) => GameEventType::EatCake,
            GameEvent::CoinCount(_) => GameEventType::CoinCount,
            GameEvent::ClearEffects => GameEventType::ClearEffects,
            GameEvent::Speed(_) => GameEventType::Speed,
            GameEvent::Trick(_) => GameEventType::Trick,
            GameEvent::DestroyAsteroid => GameEventType::DestroyAsteroid,
            GameEvent::Accolade(_) => GameEventType::Accolade,
            GameEvent::Invis(_) => GameEventType::Invis,
            GameEvent::KilledBy(_) => GameEventType::KilledBy,
            GameEvent::RadiationCloud(_) => GameEventType::RadiationCloud,
            GameEvent::Charge(_) => GameEventType::Charge,
            GameEvent::LpCount(_) => GameEventType::LpCount,
            GameEvent::BrBounds(_) => GameEventType::BrBounds,
            GameEvent::Minimap => GameEventType::Minimap,
            GameEvent::RlglDeath => GameEventType::RlglDeath,
            GameEvent::RlglState(_) => GameEventType::RlglState,
        }
    }
}

fn payloadless(event_type: GameEventType) -> Option<GameEvent> {
    Some(match event_type {
        GameEventType::Unknown => GameEvent::Unknown,
        GameEventType::EatDots => GameEvent::EatDots,
        GameEventType::EatBlob => GameEvent::EatBlob,
        GameEventType::EatSmbh => GameEvent::EatSmbh,
        GameEventType::BlobLost => GameEvent::BlobLost,
        GameEventType::TimerWarning => GameEvent::TimerWarning,
        GameEventType::CtfScore => GameEvent::CtfScore,
        GameEventType::CtfFlagReturned => GameEvent::CtfFlagReturned,
        GameEventType::CtfFlagStolen => GameEvent::CtfFlagStolen,
        GameEventType::CtfFlagDropped => GameEvent::CtfFlagDropped,
        GameEventType::XpGained => GameEvent::XpGained,
        GameEventType::Unused2 => GameEvent::Unused2,
        GameEventType::EatServerBlob => GameEvent::EatServerBlob,
        GameEventType::DomCpLost => GameEvent::DomCpLost,
        GameEventType::DomCpGained => GameEvent::DomCpGained,
        GameEventType::Unused1 => GameEvent::Unused1,
        GameEventType::CtfGained => GameEvent::CtfGained,
        GameEventType::GameOver => GameEvent::GameOver,
        GameEventType::ClearEffects => GameEvent::ClearEffects,
        GameEventType::DestroyAsteroid => GameEvent::DestroyAsteroid,
        GameEventType::Minimap => GameEvent::Minimap,
        GameEventType::RlglDeath => GameEvent::RlglDeath,
        _ => return None,
    })
}

/// Decode a single event body (the type byte already consumed).
/// `map_size` comes from the most recent world snapshot; radiation cloud
/// and battle-royale positions are compressed against it.
fn read_event(
    event_type: GameEventType,
    buf: &mut BytesMut,
    map_size: f32,
) -> CodecResult<GameEvent> {
    if let Some(event) = payloadless(event_type) {
        return Ok(event);
    }
    Ok(match event_type {
        GameEventType::BlobExplode => GameEvent::BlobExplode(BlobExplodeEvent {
            player_id: read_u8(buf)?,
            blob_id: read_u8(buf)?,
        }),
        GameEventType::Eject => GameEvent::Eject(EjectEvent {
            player_id: read_u8(buf)?,
            blob_id: read_u8(buf)?,
        }),
        GameEventType::Split => GameEvent::Split(SplitEvent {
            player_id: read_u8(buf)?,
        }),
        GameEventType::Recombine => GameEvent::Recombine(RecombineEvent {
            player_id: read_u8(buf)?,
        }),
        GameEventType::AchievementEarned => GameEvent::AchievementEarned(AchievementEarnedEvent {
            achievement_id: read_i16(buf)?,
        }),
        GameEventType::XpSet => GameEvent::XpSet(XpSetEvent {
            player_xp: read_i64(buf)?,
            xp_mult_type: read_u8(buf)?,
            xp_duration_s: read_i32(buf)?,
            plasma_boost_type: read_u8(buf)?,
            click_type_duration_s: read_u24(buf)?,
        }),
        GameEventType::DqSet => GameEvent::DqSet(DqSetEvent {
            dq_id: read_u8(buf)?,
            completed: read_bool(buf)?,
        }),
        GameEventType::DqCompleted => GameEvent::DqCompleted(DqCompletedEvent {
            dq_id: read_u8(buf)?,
        }),
        GameEventType::DqProgress => GameEvent::DqProgress(DqProgressEvent {
            progress: read_i16(buf)?,
        }),
        GameEventType::EatSpecialObjects => GameEvent::EatSpecialObjects(EatSpecialObjectsEvent {
            so_id: read_u8(buf)?,
            so_count: read_u8(buf)?,
        }),
        GameEventType::SoSet => GameEvent::SoSet(SoSetEvent {
            so_id: read_u8(buf)?,
            so_count: read_i32(buf)?,
        }),
        GameEventType::LevelUp => GameEvent::LevelUp(LevelUpEvent {
            level: read_i16(buf)?,
        }),
        GameEventType::ArenaRankAchieved => GameEvent::ArenaRankAchieved(ArenaRankAchievedEvent {
            achieved_rank: read_bool(buf)?,
            rank: read_u8(buf)?,
        }),
        GameEventType::BlobStatus => GameEvent::BlobStatus(BlobStatusEvent {
            player_id: read_u8(buf)?,
            blob_id: read_u8(buf)?,
            status: read_u16(buf)?,
        }),
        GameEventType::Teleport => GameEvent::Teleport(TeleportEvent {
            player_id: read_u8(buf)?,
        }),
        GameEventType::Shoot => GameEvent::Shoot(ShootEvent {
            player_id: read_u8(buf)?,
            blob_id: read_u8(buf)?,
            spell_id: read_u8(buf)?,
        }),
        GameEventType::ClanWarWon => GameEvent::ClanWarWon(ClanWarWonEvent {
            reward: read_i16(buf)?,
        }),
        GameEventType::PlasmaReward => GameEvent::PlasmaReward(PlasmaRewardEvent {
            reward: read_u24(buf)?,
            multiplier: read_u8(buf)?,
        }),
        GameEventType::Emote => GameEvent::Emote(EmoteEvent {
            player_id: read_u8(buf)?,
            blob_id: read_u8(buf)?,
            emote_id: read_u8(buf)?,
            custom_emote_id: read_i32(buf)?,
        }),
        GameEventType::EndMission => GameEvent::EndMission(EndMissionEvent {
            mission_id: read_u8(buf)?,
            passed: read_bool(buf)?,
            next_mission_id: read_u8(buf)?,
            xp_reward: read_u24(buf)?,
            plasma_reward: read_i16(buf)?,
        }),
        GameEventType::XpGained2 => GameEvent::XpGained2(XpGained2Event {
            player_xp: read_u24(buf)?,
            xp_chain_multiplier: read_compressed_f2(buf, CHAIN_MULTIPLIER_RANGE)? + 1.0,
            xp_gained: read_u24(buf)?,
        }),
        GameEventType::EatCake => GameEvent::EatCake(EatCakeEvent {
            plasma_amount: read_u24(buf)?,
            xp_amount: read_u24(buf)?,
        }),
        GameEventType::CoinCount => GameEvent::CoinCount(CoinCountEvent {
            player_id: read_u8(buf)?,
            coin_count: read_i16(buf)?,
        }),
        GameEventType::Speed => GameEvent::Speed(SpeedEvent {
            speed_time_ms_offset: read_i16(buf)?,
        }),
        GameEventType::Trick => GameEvent::Trick(TrickEvent {
            trick_id: read_u8(buf)?,
            trick_score: read_i16(buf)?,
            trick_xp: read_u24(buf)?,
        }),
        GameEventType::Accolade => GameEvent::Accolade(AccoladeEvent {
            accolades_gained: read_u8(buf)?,
        }),
        GameEventType::Invis => GameEvent::Invis(InvisibleEvent {
            ghost_time_ms_offset: read_i16(buf)?,
        }),
        GameEventType::KilledBy => GameEvent::KilledBy(KilledByEvent {
            killer_id: read_u8(buf)?,
        }),
        GameEventType::RadiationCloud => GameEvent::RadiationCloud(RadiationCloudEvent {
            player_id: read_u8(buf)?,
            x: read_compressed_f3(buf, map_size)?,
            y: read_compressed_f3(buf, map_size)?,
            time_remaining: read_compressed_f2(buf, RADIATION_REMAINING_RANGE)?,
        }),
        GameEventType::Charge => GameEvent::Charge(ChargeEvent {
            player_id: read_u8(buf)?,
            charge_type: read_u8(buf)?,
        }),
        GameEventType::LpCount => GameEvent::LpCount(LpCountEvent {
            lp_count: read_u8(buf)?,
        }),
        GameEventType::RlglState => GameEvent::RlglState(RlglStateEvent {
            state: read_u8(buf)?,
        }),
        GameEventType::BrBounds => {
            let mut bounds = [0f32; 4];
            for b in &mut bounds {
                *b = read_compressed_f3(buf, map_size)?;
            }
            let mut limited_bounds = [0f32; 4];
            for b in &mut limited_bounds {
                *b = read_compressed_f3(buf, map_size)?;
            }
            GameEvent::BrBounds(BrBoundsEvent {
                bounds,
                limited_bounds,
            })
        }
        // payloadless types were handled above
        _ => unreachable!(),
    })
}

/// Decode events until the datagram is exhausted or an unknown type byte is
/// hit (in which case the rest is dropped).
pub fn decode_events(buf: &mut BytesMut, map_size: f32) -> CodecResult<Vec<GameEvent>> {
    let mut events = Vec::new();
    while !buf.is_empty() {
        let type_byte = read_u8(buf)?;
        let Some(event_type) = GameEventType::from_u8(type_byte) else {
            warn!(
                type_byte,
                dropped = buf.len(),
                "Unknown game event type, discarding rest of update"
            );
            buf.clear();
            break;
        };
        events.push(read_event(event_type, buf, map_size)?);
    }
    Ok(events)
}

/// Encode a single event, tag byte included. Inverse of the decoder for
/// every payload it defines.
pub fn write_event(buf: &mut BytesMut, event: &GameEvent, map_size: f32) {
    buf.put_u8(event.event_type() as u8);
    match event {
        GameEvent::BlobExplode(e) => {
            buf.put_u8(e.player_id);
            buf.put_u8(e.blob_id);
        }
        GameEvent::Eject(e) => {
            buf.put_u8(e.player_id);
            buf.put_u8(e.blob_id);
        }
        GameEvent::Split(e) => buf.put_u8(e.player_id),
        GameEvent::Recombine(e) => buf.put_u8(e.player_id),
        GameEvent::AchievementEarned(e) => buf.put_i16(e.achievement_id),
        GameEvent::XpSet(e) => {
            buf.put_i64(e.player_xp);
            buf.put_u8(e.xp_mult_type);
            buf.put_i32(e.xp_duration_s);
            buf.put_u8(e.plasma_boost_type);
            write_u24(buf, e.click_type_duration_s);
        }
        GameEvent::DqSet(e) => {
            buf.put_u8(e.dq_id);
            buf.put_u8(e.completed as u8);
        }
        GameEvent::DqCompleted(e) => buf.put_u8(e.dq_id),
        GameEvent::DqProgress(e) => buf.put_i16(e.progress),
        GameEvent::EatSpecialObjects(e) => {
            buf.put_u8(e.so_id);
            buf.put_u8(e.so_count);
        }
        GameEvent::SoSet(e) => {
            buf.put_u8(e.so_id);
            buf.put_i32(e.so_count);
        }
        GameEvent::LevelUp(e) => buf.put_i16(e.level),
        GameEvent::ArenaRankAchieved(e) => {
            buf.put_u8(e.achieved_rank as u8);
            buf.put_u8(e.rank);
        }
        GameEvent::BlobStatus(e) => {
            buf.put_u8(e.player_id);
            buf.put_u8(e.blob_id);
            buf.put_u16(e.status);
        }
        GameEvent::Teleport(e) => buf.put_u8(e.player_id),
        GameEvent::Shoot(e) => {
            buf.put_u8(e.player_id);
            buf.put_u8(e.blob_id);
            buf.put_u8(e.spell_id);
        }
        GameEvent::ClanWarWon(e) => buf.put_i16(e.reward),
        GameEvent::PlasmaReward(e) => {
            write_u24(buf, e.reward);
            buf.put_u8(e.multiplier);
        }
        GameEvent::Emote(e) => {
            buf.put_u8(e.player_id);
            buf.put_u8(e.blob_id);
            buf.put_u8(e.emote_id);
            buf.put_i32(e.custom_emote_id);
        }
        GameEvent::EndMission(e) => {
            buf.put_u8(e.mission_id);
            buf.put_u8(e.passed as u8);
            buf.put_u8(e.next_mission_id);
            write_u24(buf, e.xp_reward);
            buf.put_i16(e.plasma_reward);
        }
        GameEvent::XpGained2(e) => {
            write_u24(buf, e.player_xp);
            write_compressed_f2(buf, e.xp_chain_multiplier - 1.0, CHAIN_MULTIPLIER_RANGE);
            write_u24(buf, e.xp_gained);
        }
        GameEvent::EatCake(e) => {
            write_u24(buf, e.plasma_amount);
            write_u24(buf, e.xp_amount);
        }
        GameEvent::CoinCount(e) => {
            buf.put_u8(e.player_id);
            buf.put_i16(e.coin_count);
        }
        GameEvent::Speed(e) => buf.put_i16(e.speed_time_ms_offset),
        GameEvent::Trick(e) => {
            buf.put_u8(e.trick_id);
            buf.put_i16(e.trick_score);
            write_u24(buf, e.trick_xp);
        }
        GameEvent::Accolade(e) => buf.put_u8(e.accolades_gained),
        GameEvent::Invis(e) => buf.put_i16(e.ghost_time_ms_offset),
        GameEvent::KilledBy(e) => buf.put_u8(e.killer_id),
        GameEvent::RadiationCloud(e) => {
            buf.put_u8(e.player_id);
            write_compressed_f3(buf, e.x, map_size);
            write_compressed_f3(buf, e.y, map_size);
            write_compressed_f2(buf, e.time_remaining, RADIATION_REMAINING_RANGE);
        }
        GameEvent::Charge(e) => {
            buf.put_u8(e.player_id);
            buf.put_u8(e.charge_type);
        }
        GameEvent::LpCount(e) => buf.put_u8(e.lp_count),
        GameEvent::BrBounds(e) => {
            for b in e.bounds.iter().chain(e.limited_bounds.iter()) {
                write_compressed_f3(buf, *b, map_size);
            }
        }
        GameEvent::RlglState(e) => buf.put_u8(e.state),
        // everything else is tag-only
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: f32 = 512.0;

    #[test]
    fn test_event_stream_roundtrip() {
        let events = vec![
            GameEvent::BlobExplode(BlobExplodeEvent {
                player_id: 1,
                blob_id: 2,
            }),
            GameEvent::EatDots,
            GameEvent::LevelUp(LevelUpEvent { level: 17 }),
            GameEvent::Shoot(ShootEvent {
                player_id: 3,
                blob_id: 0,
                spell_id: 5,
            }),
            GameEvent::EatCake(EatCakeEvent {
                plasma_amount: 1000,
                xp_amount: 2500,
            }),
            GameEvent::GameOver,
            GameEvent::KilledBy(KilledByEvent { killer_id: 8 }),
        ];

        let mut buf = BytesMut::new();
        for event in &events {
            write_event(&mut buf, event, MAP);
        }
        let decoded = decode_events(&mut buf, MAP).unwrap();
        assert_eq!(decoded, events);
    }

    #[test]
    fn test_events_delivered_in_packet_order() {
        let mut buf = BytesMut::new();
        write_event(&mut buf, &GameEvent::Split(SplitEvent { player_id: 1 }), MAP);
        write_event(&mut buf, &GameEvent::Split(SplitEvent { player_id: 2 }), MAP);
        write_event(&mut buf, &GameEvent::Split(SplitEvent { player_id: 3 }), MAP);
        let decoded = decode_events(&mut buf, MAP).unwrap();
        let ids: Vec<u8> = decoded
            .iter()
            .map(|e| match e {
                GameEvent::Split(s) => s.player_id,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_unknown_event_type_discards_rest() {
        let mut buf = BytesMut::new();
        write_event(&mut buf, &GameEvent::Teleport(TeleportEvent { player_id: 4 }), MAP);
        buf.put_u8(200); // not a known event type
        write_event(&mut buf, &GameEvent::Teleport(TeleportEvent { player_id: 5 }), MAP);

        let decoded = decode_events(&mut buf, MAP).unwrap();
        assert_eq!(
            decoded,
            vec![GameEvent::Teleport(TeleportEvent { player_id: 4 })]
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn test_xp_gained2_bias() {
        // raw multiplier 0 decodes to x1.0
        let mut full = BytesMut::new();
        full.put_u8(GameEventType::XpGained2 as u8);
        write_u24(&mut full, 300);
        full.put_u16(0);
        write_u24(&mut full, 50);

        let decoded = decode_events(&mut full, MAP).unwrap();
        match &decoded[0] {
            GameEvent::XpGained2(e) => {
                assert_eq!(e.player_xp, 300);
                assert_eq!(e.xp_gained, 50);
                assert!((e.xp_chain_multiplier - 1.0).abs() < f32::EPSILON);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_radiation_cloud_uses_map_size() {
        let event = GameEvent::RadiationCloud(RadiationCloudEvent {
            player_id: 2,
            x: 300.0,
            y: 400.0,
            time_remaining: 8.0,
        });
        let mut buf = BytesMut::new();
        write_event(&mut buf, &event, 1024.0);
        let decoded = decode_events(&mut buf, 1024.0).unwrap();
        match &decoded[0] {
            GameEvent::RadiationCloud(e) => {
                assert!((e.x - 300.0).abs() <= 1024.0 / 16777215.0);
                assert!((e.y - 400.0).abs() <= 1024.0 / 16777215.0);
                assert!((e.time_remaining - 8.0).abs() <= 16.0 / 65535.0);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_br_bounds() {
        let event = GameEvent::BrBounds(BrBoundsEvent {
            bounds: [10.0, 20.0, 500.0, 510.0],
            limited_bounds: [50.0, 60.0, 450.0, 460.0],
        });
        let mut buf = BytesMut::new();
        write_event(&mut buf, &event, MAP);
        assert_eq!(buf.len(), 1 + 8 * 3);
        let decoded = decode_events(&mut buf, MAP).unwrap();
        match &decoded[0] {
            GameEvent::BrBounds(e) => {
                for (got, want) in e
                    .bounds
                    .iter()
                    .chain(e.limited_bounds.iter())
                    .zip([10.0, 20.0, 500.0, 510.0, 50.0, 60.0, 450.0, 460.0])
                {
                    assert!((got - want).abs() <= MAP / 16777215.0);
                }
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_truncated_event_is_an_error() {
        let mut buf = BytesMut::new();
        buf.put_u8(GameEventType::BlobStatus as u8);
        buf.put_u8(1); // player id, then nothing
        assert!(decode_events(&mut buf, MAP).is_err());
    }
}
