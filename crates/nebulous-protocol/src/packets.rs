//! Typed wire packets.
//!
//! Every datagram carries exactly one packet, tagged by its first byte.
//! Decoders take a buffer positioned *after* the tag (the dispatcher strips
//! it); encoders emit the tag themselves.

use std::net::Ipv4Addr;

use bytes::{BufMut, BytesMut};
use nebulous_types::{
    ConnectResult, ControlFlags, GameDifficulty, GameMode, OnlineMode, PacketType, SplitMultiplier,
};
use tracing::debug;

use crate::codec::*;
use crate::entities::{NetDot, NetEject, NetItem, NetPlayer, SKIN_INTERPOLATION_RANGE};
use crate::events::{decode_events, write_event, GameEvent};
use crate::handshake::{shuffle_connect_payload, verify_connect_header};

/// Wire cap on the connect alias.
pub const ALIAS_MAX_BYTES: usize = 16;

/// Range of the control packet's steering angle.
const ANGLE_RANGE: f32 = std::f32::consts::TAU;

/// The one packet the client sends before it has a server-assigned
/// identity. Serialized, then shuffled (see [`crate::handshake`]).
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectRequest3 {
    pub rng_seed: i64,
    pub game_version: u16,
    pub client_id: i32,
    pub game_mode: GameMode,
    pub game_difficulty: GameDifficulty,
    pub game_id: i32,
    /// Account ticket; blank for anonymous play.
    pub ticket: String,
    pub online_mode: OnlineMode,
    pub mayhem: bool,
    pub skin: u16,
    pub eject_skin: u8,
    pub alias: String,
    pub custom_skin: i32,
    pub alias_colors: Vec<u8>,
    pub pet_id: u8,
    pub blob_color: u32,
    pub pet_name: String,
    pub hat: u8,
    pub custom_pet: i32,
    pub halo: u8,
    pub pet2_id: u8,
    pub pet2_name: String,
    pub custom_pet2: i32,
    pub custom_particle: i32,
    pub particle: u8,
    pub alias_font: u8,
    pub level_colors: Vec<u8>,
    pub alias_animation: u8,
    pub skin2: u16,
    pub skin_interpolation: f32,
    pub custom_skin2: i32,
    pub timestamp_ms: i64,
    pub secure_bytes: Vec<u8>,
}

impl ConnectRequest3 {
    fn serialize(&self) -> CodecResult<BytesMut> {
        let mut buf = BytesMut::with_capacity(128 + self.secure_bytes.len());
        buf.put_u8(PacketType::ConnectRequest3 as u8);
        // public id is always zero before the handshake completes
        buf.put_u32(0);
        buf.put_i64(self.rng_seed);
        buf.put_u16(self.game_version);
        buf.put_i32(self.client_id);
        buf.put_u8(self.game_mode as u8);
        buf.put_u8(self.game_difficulty as u8);
        buf.put_i32(self.game_id);
        write_mutf8(&mut buf, &self.ticket)?;
        buf.put_u8(self.online_mode as u8);
        buf.put_u8(self.mayhem as u8);
        buf.put_u16(self.skin);
        buf.put_u8(self.eject_skin);
        write_mutf8_capped(&mut buf, &self.alias, ALIAS_MAX_BYTES)?;
        buf.put_i32(self.custom_skin);
        write_var_array(&mut buf, 1, &self.alias_colors)?;
        buf.put_u8(self.pet_id);
        buf.put_u32(self.blob_color);
        write_mutf8(&mut buf, &self.pet_name)?;
        buf.put_u8(self.hat);
        buf.put_i32(self.custom_pet);
        buf.put_u8(self.halo);
        buf.put_u8(self.pet2_id);
        write_mutf8(&mut buf, &self.pet2_name)?;
        buf.put_i32(self.custom_pet2);
        buf.put_i32(self.custom_particle);
        buf.put_u8(self.particle);
        buf.put_u8(self.alias_font);
        write_var_array(&mut buf, 1, &self.level_colors)?;
        buf.put_u8(self.alias_animation);
        buf.put_u16(self.skin2);
        write_compressed_f2(&mut buf, self.skin_interpolation, SKIN_INTERPOLATION_RANGE);
        buf.put_i32(self.custom_skin2);
        buf.put_i64(self.timestamp_ms);
        write_var_array(&mut buf, 2, &self.secure_bytes)?;
        Ok(buf)
    }

    /// Serialize, shuffle everything past the 13-byte header, and run the
    /// header self-check.
    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        let mut packet = self.serialize()?.to_vec();
        shuffle_connect_payload(&mut packet, self.rng_seed);
        verify_connect_header(&packet, self.rng_seed)?;
        Ok(packet)
    }
}

/// Server verdict on a connect attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectResult2 {
    pub client_id: i32,
    pub result: ConnectResult,
    pub public_id: i32,
    pub private_id: i32,
    pub game_id: i32,
    pub ban_length: i32,
    /// Carried through from the wire; no documented use.
    pub ad_stuff: f32,
    pub split_multiplier: SplitMultiplier,
}

impl ConnectResult2 {
    pub fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            client_id: read_i32(buf)?,
            result: ConnectResult::from_u8(read_u8(buf)?),
            public_id: read_i32(buf)?,
            private_id: read_i32(buf)?,
            game_id: read_i32(buf)?,
            ban_length: read_i32(buf)?,
            ad_stuff: read_f32(buf)?,
            split_multiplier: SplitMultiplier::from_net(read_u8(buf)?)
                .ok_or(CodecError::InvalidValue("split_multiplier"))?,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(27);
        buf.put_u8(PacketType::ConnectResult2 as u8);
        buf.put_i32(self.client_id);
        buf.put_u8(self.result.to_u8());
        buf.put_i32(self.public_id);
        buf.put_i32(self.private_id);
        buf.put_i32(self.game_id);
        buf.put_i32(self.ban_length);
        buf.put_f32(self.ad_stuff);
        buf.put_u8(self.split_multiplier.to_net());
        buf.to_vec()
    }
}

/// Heartbeat. `server_ip` is echoed back in little-endian byte order, the
/// single place the protocol inverts endianness.
#[derive(Debug, Clone, PartialEq)]
pub struct KeepAlive {
    pub public_id: i32,
    pub private_id: i32,
    pub server_ip: Ipv4Addr,
    pub client_id: i32,
}

impl KeepAlive {
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(17);
        buf.put_u8(PacketType::KeepAlive as u8);
        buf.put_i32(self.public_id);
        buf.put_i32(self.private_id);
        let mut octets = self.server_ip.octets();
        octets.reverse();
        buf.put_slice(&octets);
        buf.put_i32(self.client_id);
        buf.to_vec()
    }

    pub fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        let public_id = read_i32(buf)?;
        let private_id = read_i32(buf)?;
        let mut octets = [
            read_u8(buf)?,
            read_u8(buf)?,
            read_u8(buf)?,
            read_u8(buf)?,
        ];
        octets.reverse();
        Ok(Self {
            public_id,
            private_id,
            server_ip: Ipv4Addr::from(octets),
            client_id: read_i32(buf)?,
        })
    }
}

/// Session teardown notice, the last packet of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Disconnect {
    pub public_id: i32,
    pub private_id: i32,
    pub client_id: i32,
}

impl Disconnect {
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(13);
        buf.put_u8(PacketType::Disconnect as u8);
        buf.put_i32(self.public_id);
        buf.put_i32(self.private_id);
        buf.put_i32(self.client_id);
        buf.to_vec()
    }

    pub fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            public_id: read_i32(buf)?,
            private_id: read_i32(buf)?,
            client_id: read_i32(buf)?,
        })
    }
}

/// Per-tick steering input.
#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub public_id: i32,
    /// Steering angle in radians, `[0, 2π]`.
    pub angle: f32,
    /// Throttle, `[0, 1]`.
    pub speed: f32,
    /// Wraps modulo 256, incremented per emitted control packet.
    pub tick: u8,
    pub flags: ControlFlags,
    /// The local player's index in the world snapshot.
    pub player_index: u8,
    pub client_id: i32,
    /// Screen aspect ratio, clamped to `[1, 3]` by the encoding.
    pub aspect_ratio: f32,
}

impl Control {
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(16);
        buf.put_u8(PacketType::Control as u8);
        buf.put_i32(self.public_id);
        write_compressed_f2(&mut buf, self.angle, ANGLE_RANGE);
        write_compressed_f1_clamped(&mut buf, self.speed, 0.0, 1.0);
        buf.put_u8(self.tick);
        buf.put_u8(self.flags.bits());
        buf.put_u8(self.player_index);
        buf.put_i32(self.client_id);
        write_compressed_f1_clamped(&mut buf, self.aspect_ratio, 1.0, 3.0);
        buf.to_vec()
    }

    pub fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            public_id: read_i32(buf)?,
            angle: read_compressed_f2(buf, ANGLE_RANGE)?,
            speed: read_compressed_f1_clamped(buf, 0.0, 1.0)?,
            tick: read_u8(buf)?,
            flags: ControlFlags(read_u8(buf)?),
            player_index: read_u8(buf)?,
            client_id: read_i32(buf)?,
            aspect_ratio: read_compressed_f1_clamped(buf, 1.0, 3.0)?,
        })
    }
}

/// Lobby chat line, both directions.
#[derive(Debug, Clone, PartialEq)]
pub struct GameChatMessage {
    pub public_id: i32,
    pub alias: String,
    pub message: String,
    /// `-1` on send; the sender's account id on receive.
    pub account_id: i32,
    pub alias_colors: Vec<u8>,
    pub show_bubble: bool,
    pub alias_font: u8,
}

impl GameChatMessage {
    pub fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        let public_id = read_i32(buf)?;
        let alias = read_mutf8(buf)?;
        let message = read_mutf8(buf)?;
        let account_id = read_i32(buf)?;
        let _ = read_bool(buf)?;
        let _ = read_i64(buf)?; // server-side message id
        let alias_colors = read_var_array(buf, 1)?;
        let show_bubble = read_bool(buf)?;
        let alias_font = read_u8(buf)?;
        Ok(Self {
            public_id,
            alias,
            message,
            account_id,
            alias_colors,
            show_bubble,
            alias_font,
        })
    }

    pub fn encode(&self, client_id: i32) -> CodecResult<Vec<u8>> {
        let mut buf = BytesMut::with_capacity(64);
        buf.put_u8(PacketType::GameChatMessage as u8);
        buf.put_i32(self.public_id);
        write_mutf8(&mut buf, &self.alias)?;
        write_mutf8(&mut buf, &self.message)?;
        buf.put_i32(-1);
        buf.put_u8(0);
        buf.put_i64(0);
        write_var_array(&mut buf, 1, &self.alias_colors)?;
        buf.put_u8(self.show_bubble as u8);
        buf.put_u8(self.alias_font);
        buf.put_i32(client_id);
        buf.put_u8(0);
        buf.put_u8(0);
        Ok(buf.to_vec())
    }
}

/// Clan chat line, both directions.
#[derive(Debug, Clone, PartialEq)]
pub struct ClanChatMessage {
    pub public_id: i32,
    /// Blank on send; filled in by the server on receive.
    pub alias: String,
    pub message: String,
    pub clan_role: u8,
    pub account_id: i32,
    pub alias_colors: Vec<u8>,
}

impl ClanChatMessage {
    pub fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        let public_id = read_i32(buf)?;
        let alias = read_mutf8(buf)?;
        let message = read_mutf8(buf)?;
        let clan_role = read_u8(buf)?;
        let account_id = read_i32(buf)?;
        let _ = read_i64(buf)?;
        let alias_colors = read_var_array(buf, 1)?;
        Ok(Self {
            public_id,
            alias,
            message,
            clan_role,
            account_id,
            alias_colors,
        })
    }

    pub fn encode(&self, client_id: i32) -> CodecResult<Vec<u8>> {
        let mut buf = BytesMut::with_capacity(48);
        buf.put_u8(PacketType::ClanChatMessage as u8);
        buf.put_i32(self.public_id);
        write_mutf8(&mut buf, "")?;
        write_mutf8(&mut buf, &self.message)?;
        buf.put_u8(0);
        buf.put_i32(-1);
        buf.put_i64(0);
        buf.put_i32(client_id);
        buf.put_u8(0);
        Ok(buf.to_vec())
    }
}

/// A complete world snapshot: everything the server wants to push this
/// tick, replacing the previous snapshot in full.
#[derive(Debug, Clone, PartialEq)]
pub struct GameData {
    pub public_id: i32,
    pub map_size: f32,
    pub players: Vec<NetPlayer>,
    pub ejects: Vec<NetEject>,
    pub dots: Vec<NetDot>,
    pub items: Vec<NetItem>,
    pub dot_id_offset: u16,
    pub item_id_offset: u8,
}

impl GameData {
    pub fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        let public_id = read_i32(buf)?;
        let map_size = read_f32(buf)?;
        let player_count = read_u8(buf)? as usize;
        let eject_count = read_u8(buf)? as usize;
        let dot_id_offset = read_u16(buf)?;
        let dot_count = read_u16(buf)? as usize;
        let item_id_offset = read_u8(buf)?;
        let item_count = read_u8(buf)? as usize;

        let mut players = Vec::with_capacity(player_count);
        for _ in 0..player_count {
            players.push(NetPlayer::read(buf)?);
        }
        let mut ejects = Vec::with_capacity(eject_count);
        for _ in 0..eject_count {
            ejects.push(NetEject::read(buf, map_size)?);
        }
        let mut dots = Vec::with_capacity(dot_count);
        for k in 0..dot_count {
            dots.push(NetDot::read(buf, dot_id_offset as u32 + k as u32, map_size)?);
        }
        let mut items = Vec::with_capacity(item_count);
        for k in 0..item_count {
            items.push(NetItem::read(buf, item_id_offset as u32 + k as u32, map_size)?);
        }

        Ok(Self {
            public_id,
            map_size,
            players,
            ejects,
            dots,
            items,
            dot_id_offset,
            item_id_offset,
        })
    }

    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        let mut buf = BytesMut::with_capacity(64);
        buf.put_u8(PacketType::GameData as u8);
        buf.put_i32(self.public_id);
        buf.put_f32(self.map_size);
        buf.put_u8(self.players.len() as u8);
        buf.put_u8(self.ejects.len() as u8);
        buf.put_u16(self.dot_id_offset);
        buf.put_u16(self.dots.len() as u16);
        buf.put_u8(self.item_id_offset);
        buf.put_u8(self.items.len() as u8);
        for player in &self.players {
            player.write(&mut buf)?;
        }
        for eject in &self.ejects {
            eject.write(&mut buf, self.map_size);
        }
        for dot in &self.dots {
            dot.write(&mut buf, self.map_size);
        }
        for item in &self.items {
            item.write(&mut buf, self.map_size);
        }
        Ok(buf.to_vec())
    }
}

/// A burst of sub-events (see [`crate::events`]).
#[derive(Debug, Clone, PartialEq)]
pub struct GameUpdate {
    pub events: Vec<GameEvent>,
}

impl GameUpdate {
    pub fn decode(buf: &mut BytesMut, map_size: f32) -> CodecResult<Self> {
        Ok(Self {
            events: decode_events(buf, map_size)?,
        })
    }

    pub fn encode(&self, map_size: f32) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(16);
        buf.put_u8(PacketType::GameUpdate as u8);
        for event in &self.events {
            write_event(&mut buf, event, map_size);
        }
        buf.to_vec()
    }
}

/// Any packet the receive path delivers.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    ConnectResult2(ConnectResult2),
    KeepAlive(KeepAlive),
    Disconnect(Disconnect),
    GameChatMessage(GameChatMessage),
    ClanChatMessage(ClanChatMessage),
    GameData(GameData),
    GameUpdate(GameUpdate),
}

impl Packet {
    /// Classify and decode one inbound datagram. Unknown or unhandled
    /// packet types are logged and yield `None`; `map_size` is the value
    /// mirrored from the latest snapshot.
    pub fn decode(buf: &mut BytesMut, map_size: f32) -> CodecResult<Option<Packet>> {
        let type_byte = read_u8(buf)?;
        let Some(packet_type) = PacketType::from_u8(type_byte) else {
            debug!(type_byte, "Dropping datagram with unknown packet type");
            return Ok(None);
        };
        Ok(match packet_type {
            PacketType::ConnectResult2 => {
                Some(Packet::ConnectResult2(ConnectResult2::decode(buf)?))
            }
            PacketType::KeepAlive => Some(Packet::KeepAlive(KeepAlive::decode(buf)?)),
            PacketType::Disconnect => Some(Packet::Disconnect(Disconnect::decode(buf)?)),
            PacketType::GameChatMessage => {
                Some(Packet::GameChatMessage(GameChatMessage::decode(buf)?))
            }
            PacketType::ClanChatMessage => {
                Some(Packet::ClanChatMessage(ClanChatMessage::decode(buf)?))
            }
            PacketType::GameData => Some(Packet::GameData(GameData::decode(buf)?)),
            PacketType::GameUpdate => Some(Packet::GameUpdate(GameUpdate::decode(buf, map_size)?)),
            other => {
                debug!(packet_type = ?other, "Ignoring unhandled packet type");
                None
            }
        })
    }

    pub fn packet_type(&self) -> PacketType {
        match self {
            Packet::ConnectResult2(_) => PacketType::ConnectResult2,
            Packet::KeepAlive(_) => PacketType::KeepAlive,
            Packet::Disconnect(_) => PacketType::Disconnect,
            Packet::GameChatMessage(_) => PacketType::GameChatMessage,
            Packet::ClanChatMessage(_) => PacketType::ClanChatMessage,
            Packet::GameData(_) => PacketType::GameData,
            Packet::GameUpdate(_) => PacketType::GameUpdate,
        }
    }
}
