//! Entity records carried inside `GameData` snapshots.

use bytes::{BufMut, BytesMut};
use nebulous_types::{ClanRole, ItemType};

use crate::codec::*;

/// Upper range of the 3-byte compressed mass field.
pub const MASS_RANGE: f32 = 500_000.0;

/// Range of the skin interpolation rate field.
pub const SKIN_INTERPOLATION_RANGE: f32 = 60.0;

/// A player as it appears in a world snapshot.
///
/// Cosmetic identifiers (skins, hats, pets, fonts, …) are carried opaque;
/// the client neither validates nor interprets them.
#[derive(Debug, Clone, PartialEq)]
pub struct NetPlayer {
    pub player_id: u8,
    pub skin: u16,
    pub eject_skin: u8,
    pub custom_skin: i32,
    pub custom_pet: i32,
    pub pet_id: u8,
    pub pet_level: u16,
    pub pet_name: String,
    pub hat: u8,
    pub halo: u8,
    pub pet2_id: u8,
    pub pet2_level: u16,
    pub pet2_name: String,
    pub custom_pet2: i32,
    pub custom_particle: i32,
    pub particle: u8,
    pub level_colors: Vec<u8>,
    pub alias_animation: u8,
    pub skin2: u16,
    pub skin_interpolation: f32,
    pub custom_skin2: i32,
    pub blob_color: u32,
    pub team_id: u8,
    pub alias: String,
    pub alias_font: u8,
    pub alias_colors: Vec<u8>,
    pub account_id: i32,
    pub player_level: u16,
    pub clan_name: String,
    pub clan_colors: Vec<u8>,
    pub clan_role: ClanRole,
    pub click_type: u8,
}

impl NetPlayer {
    pub fn read(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            player_id: read_u8(buf)?,
            skin: read_u16(buf)?,
            eject_skin: read_u8(buf)?,
            custom_skin: read_i32(buf)?,
            custom_pet: read_i32(buf)?,
            pet_id: read_u8(buf)?,
            pet_level: read_u16(buf)?,
            pet_name: read_mutf8(buf)?,
            hat: read_u8(buf)?,
            halo: read_u8(buf)?,
            pet2_id: read_u8(buf)?,
            pet2_level: read_u16(buf)?,
            pet2_name: read_mutf8(buf)?,
            custom_pet2: read_i32(buf)?,
            custom_particle: read_i32(buf)?,
            particle: read_u8(buf)?,
            level_colors: read_var_array(buf, 1)?,
            alias_animation: read_u8(buf)?,
            skin2: read_u16(buf)?,
            skin_interpolation: read_compressed_f2(buf, SKIN_INTERPOLATION_RANGE)?,
            custom_skin2: read_i32(buf)?,
            blob_color: read_u32(buf)?,
            team_id: read_u8(buf)?,
            alias: read_mutf8(buf)?,
            alias_font: read_u8(buf)?,
            alias_colors: read_var_array(buf, 1)?,
            account_id: read_i32(buf)?,
            player_level: read_u16(buf)?,
            clan_name: read_mutf8(buf)?,
            clan_colors: read_var_array(buf, 1)?,
            clan_role: ClanRole::from_u8(read_u8(buf)?),
            click_type: read_u8(buf)?,
        })
    }

    pub fn write(&self, buf: &mut BytesMut) -> CodecResult<()> {
        buf.put_u8(self.player_id);
        buf.put_u16(self.skin);
        buf.put_u8(self.eject_skin);
        buf.put_i32(self.custom_skin);
        buf.put_i32(self.custom_pet);
        buf.put_u8(self.pet_id);
        buf.put_u16(self.pet_level);
        write_mutf8(buf, &self.pet_name)?;
        buf.put_u8(self.hat);
        buf.put_u8(self.halo);
        buf.put_u8(self.pet2_id);
        buf.put_u16(self.pet2_level);
        write_mutf8(buf, &self.pet2_name)?;
        buf.put_i32(self.custom_pet2);
        buf.put_i32(self.custom_particle);
        buf.put_u8(self.particle);
        write_var_array(buf, 1, &self.level_colors)?;
        buf.put_u8(self.alias_animation);
        buf.put_u16(self.skin2);
        write_compressed_f2(buf, self.skin_interpolation, SKIN_INTERPOLATION_RANGE);
        buf.put_i32(self.custom_skin2);
        buf.put_u32(self.blob_color);
        buf.put_u8(self.team_id);
        write_mutf8(buf, &self.alias)?;
        buf.put_u8(self.alias_font);
        write_var_array(buf, 1, &self.alias_colors)?;
        buf.put_i32(self.account_id);
        buf.put_u16(self.player_level);
        write_mutf8(buf, &self.clan_name)?;
        write_var_array(buf, 1, &self.clan_colors)?;
        buf.put_u8(self.clan_role as u8);
        buf.put_u8(self.click_type);
        Ok(())
    }
}

/// An ejected-mass pellet.
#[derive(Debug, Clone, PartialEq)]
pub struct NetEject {
    pub eject_id: u8,
    pub x: f32,
    pub y: f32,
    pub mass: f32,
}

impl NetEject {
    pub fn read(buf: &mut BytesMut, map_size: f32) -> CodecResult<Self> {
        Ok(Self {
            eject_id: read_u8(buf)?,
            x: read_compressed_f3(buf, map_size)?,
            y: read_compressed_f3(buf, map_size)?,
            mass: read_compressed_f3(buf, MASS_RANGE)?,
        })
    }

    pub fn write(&self, buf: &mut BytesMut, map_size: f32) {
        buf.put_u8(self.eject_id);
        write_compressed_f3(buf, self.x, map_size);
        write_compressed_f3(buf, self.y, map_size);
        write_compressed_f3(buf, self.mass, MASS_RANGE);
    }
}

/// A food dot. Only coordinates travel on the wire; the id is recovered
/// from the snapshot's `(dot_id_offset, dot_count)` compaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NetDot {
    pub dot_id: u32,
    pub x: f32,
    pub y: f32,
}

impl NetDot {
    pub fn read(buf: &mut BytesMut, dot_id: u32, map_size: f32) -> CodecResult<Self> {
        Ok(Self {
            dot_id,
            x: read_compressed_f3(buf, map_size)?,
            y: read_compressed_f3(buf, map_size)?,
        })
    }

    pub fn write(&self, buf: &mut BytesMut, map_size: f32) {
        write_compressed_f3(buf, self.x, map_size);
        write_compressed_f3(buf, self.y, map_size);
    }
}

/// A consumable world item; id recovered the same way as dots.
#[derive(Debug, Clone, PartialEq)]
pub struct NetItem {
    pub item_id: u32,
    pub item_type: ItemType,
    pub x: f32,
    pub y: f32,
}

impl NetItem {
    pub fn read(buf: &mut BytesMut, item_id: u32, map_size: f32) -> CodecResult<Self> {
        Ok(Self {
            item_id,
            item_type: ItemType::from_u8(read_u8(buf)?),
            x: read_compressed_f3(buf, map_size)?,
            y: read_compressed_f3(buf, map_size)?,
        })
    }

    pub fn write(&self, buf: &mut BytesMut, map_size: f32) {
        buf.put_u8(self.item_type as u8);
        write_compressed_f3(buf, self.x, map_size);
        write_compressed_f3(buf, self.y, map_size);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_player(player_id: u8, alias: &str) -> NetPlayer {
        NetPlayer {
            player_id,
            skin: 0x0102,
            eject_skin: 0xFF,
            custom_skin: 0,
            custom_pet: 0,
            pet_id: 0xFF,
            pet_level: 3,
            pet_name: "pet".into(),
            hat: 0xFF,
            halo: 0,
            pet2_id: 0xFF,
            pet2_level: 0,
            pet2_name: String::new(),
            custom_pet2: 0,
            custom_particle: 0,
            particle: 0xFF,
            level_colors: vec![0x77; 5],
            alias_animation: 0,
            skin2: 0,
            skin_interpolation: 12.0,
            custom_skin2: 0,
            blob_color: 0xFF1A69E1,
            team_id: 0,
            alias: alias.to_owned(),
            alias_font: 0,
            alias_colors: vec![0xFF; 6],
            account_id: -1,
            player_level: 42,
            clan_name: "CLAN".into(),
            clan_colors: vec![1, 2, 3],
            clan_role: ClanRole::Member,
            click_type: 0,
        }
    }

    #[test]
    fn test_player_roundtrip() {
        let player = sample_player(7, "someone");
        let mut buf = BytesMut::new();
        player.write(&mut buf).unwrap();
        let mut decoded = NetPlayer::read(&mut buf).unwrap();
        assert!(buf.is_empty());

        // the interpolation rate is lossy; compare within codec tolerance
        assert!((decoded.skin_interpolation - player.skin_interpolation).abs() <= 60.0 / 65535.0);
        decoded.skin_interpolation = player.skin_interpolation;
        assert_eq!(decoded, player);
    }

    #[test]
    fn test_eject_roundtrip() {
        let eject = NetEject {
            eject_id: 9,
            x: 100.0,
            y: 250.0,
            mass: 1500.0,
        };
        let mut buf = BytesMut::new();
        eject.write(&mut buf, 512.0);
        let decoded = NetEject::read(&mut buf, 512.0).unwrap();
        assert_eq!(decoded.eject_id, 9);
        assert!((decoded.x - 100.0).abs() <= 512.0 / 16777215.0);
        assert!((decoded.mass - 1500.0).abs() <= MASS_RANGE / 16777215.0);
    }

    #[test]
    fn test_item_type_passthrough() {
        let item = NetItem {
            item_id: 3,
            item_type: ItemType::Coin,
            x: 1.0,
            y: 2.0,
        };
        let mut buf = BytesMut::new();
        item.write(&mut buf, 512.0);
        let decoded = NetItem::read(&mut buf, 3, 512.0).unwrap();
        assert_eq!(decoded.item_type, ItemType::Coin);
        assert_eq!(decoded.item_id, 3);
    }
}
