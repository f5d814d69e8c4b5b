use serde::{Deserialize, Serialize};

/// Defines a u8-tagged wire enum together with its fallible decoder.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:literal,)+ }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $($variant = $value,)+
        }

        impl $name {
            pub fn from_u8(value: u8) -> Option<Self> {
                match value {
                    $($value => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

wire_enum! {
/// Wire packet type, the first byte of every UDP datagram.
///
/// The full tag set is 120 codes; the client only implements a handful of
/// them, but it must recognize the rest so it can drop them without error.
PacketType {
    Invalid = 0,
    ConnectResult2 = 1,
    Control = 2,
    KeepAlive = 3,
    InvalidateClient = 4,
    StartGameInternal = 5,
    ConnectRequest = 6,
    Disconnect = 7,
    GameChatMessage = 8,
    ClanChatMessage = 9,
    JoinRequest = 10,
    JoinResult = 11,
    TtlRefreshResponseInternal = 12,
    ShutdownNodeInternal = 13,
    SetGsAddr = 14,
    ClientPreferences = 15,
    SpectateChange = 16,
    ClanWarListRequest = 17,
    ClanWarListResult = 18,
    ClanWarNotification = 19,
    TopScores = 20,
    ServerShutdownWarning = 21,
    GameUpdate = 22,
    GroupLobbyListRequest = 23,
    GroupLobbyListResult = 24,
    PublicChatMessage = 25,
    AdminInternal = 26,
    GroupLobbyCreateRequest = 27,
    GroupLobbyCreateResult = 28,
    GroupLobbyJoinRequest = 29,
    GroupLobbyJoinResult = 30,
    GroupLobbyUpdate = 31,
    GroupLobbyLeave = 32,
    ArenaListRequest = 33,
    ClientPreferencesInternal = 34,
    GameCrashInternal = 35,
    PrivateChatMessage = 36,
    ArenaLeaveQueueRequest = 37,
    RemoveGameInternal = 38,
    GroupLobbyWarn = 39,
    EnterGameRequest = 40,
    EnterGameResult = 41,
    PlayerSessionStatsUpdateInternal = 42,
    PlayerWsAccountUpdateInternal = 43,
    AccountStatusRequest = 44,
    AccountStatusResult = 45,
    FriendChatMessage = 46,
    ClientStatusChangeRequest = 47,
    ClientStatusChangeResult = 48,
    ClanWarControl = 49,
    ClanWarUpdate = 50,
    ArenaListResult = 51,
    AdminInternal2 = 52,
    NodeResetRequestInternal = 53,
    ClanWarResultInternal = 54,
    ClanWarForfeitInternal = 55,
    SpectateGameRequest = 56,
    GetPlayerStatsInternal = 57,
    ArenaQueueRequest = 58,
    ArenaStatus = 59,
    AdminInternal3 = 60,
    ArenaResultInternal = 61,
    AdminInternal4 = 62,
    TeamArenaResultInternal = 63,
    TeamArenaStatusResult = 64,
    TeamArenaStatusRequest = 65,
    TeamArenaListRequest = 66,
    TeamArenaListResult = 67,
    TeamArenaQueueRequest = 68,
    TeamArenaLeaveQueueRequest = 69,
    TeamArenaUpdate = 70,
    ClanHouseUpdateInternal = 71,
    AdminInternal5 = 72,
    ClanHouseUpdateInternal2 = 73,
    NodeConnectRequestInternal = 74,
    GameData = 75,
    Challenge = 76,
    ChallengeResult = 77,
    FwdToClientInternal = 78,
    TtlRefreshRequestInternal = 79,
    ConnectRequest2 = 80,
    ConnectResult = 81,
    AdminInternal6 = 82,
    ClanHouseUpdateInternal3 = 83,
    TourneyListRequest = 84,
    TourneyListResult = 85,
    TourneyAction = 86,
    TourneyMatchResultInternal = 87,
    TourneyStartInternal = 88,
    TourneyStatusUpdate = 89,
    AdminInternal7 = 90,
    MuteInternal = 91,
    JoinedGameInternal = 92,
    ClanHouseUpdateInternal4 = 93,
    ClanHouseConfig = 94,
    Invite = 95,
    DesiredDuoPartner = 96,
    EmoteRequest = 97,
    UdpKeepalive = 98,
    GroupChatCreateRequest = 99,
    GroupChatJoinRequest = 100,
    GroupChatLeaveRequest = 101,
    GroupChatResult = 102,
    GroupChatStatus = 103,
    GroupChatMessage = 104,
    SessionStats = 105,
    Accolade = 106,
    VoiceControl = 107,
    VoiceData = 108,
    MinimapUpdate = 109,
    GameStopInternal = 110,
    BattleRoyaleAction = 111,
    BattleRoyaleListRequest = 112,
    BattleRoyaleListResult = 113,
    BattleRoyaleStatusUpdate = 114,
    BattleRoyaleResultInternal = 115,
    AdminInternal8 = 116,
    PingMessage = 117,
    ConnectRequest3 = 118,
    ArenaCdInternal = 119,
}
}

wire_enum! {
/// Sub-event type inside a `GameUpdate` payload.
GameEventType {
    Unknown = 0,
    EatDots = 1,
    EatBlob = 2,
    EatSmbh = 3,
    BlobExplode = 4,
    BlobLost = 5,
    Eject = 6,
    Split = 7,
    Recombine = 8,
    TimerWarning = 9,
    CtfScore = 10,
    CtfFlagReturned = 11,
    CtfFlagStolen = 12,
    CtfFlagDropped = 13,
    AchievementEarned = 14,
    XpGained = 15,
    Unused2 = 16,
    XpSet = 17,
    DqSet = 18,
    DqCompleted = 19,
    DqProgress = 20,
    EatServerBlob = 21,
    EatSpecialObjects = 22,
    SoSet = 23,
    LevelUp = 24,
    ArenaRankAchieved = 25,
    DomCpLost = 26,
    DomCpGained = 27,
    Unused1 = 28,
    CtfGained = 29,
    GameOver = 30,
    BlobStatus = 31,
    Teleport = 32,
    Shoot = 33,
    ClanWarWon = 34,
    PlasmaReward = 35,
    Emote = 36,
    EndMission = 37,
    XpGained2 = 38,
    EatCake = 39,
    CoinCount = 40,
    ClearEffects = 41,
    Speed = 42,
    Trick = 43,
    DestroyAsteroid = 44,
    Accolade = 45,
    Invis = 46,
    KilledBy = 47,
    RadiationCloud = 48,
    Charge = 49,
    LpCount = 50,
    BrBounds = 51,
    Minimap = 52,
    RlglDeath = 53,
    RlglState = 54,
}
}

/// Server verdict inside `ConnectResult2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectResult {
    Success,
    GameNotFound,
    Unknown,
    AccountAlreadySignedIn,
}

impl ConnectResult {
    /// Unrecognized codes collapse to `Unknown`; anything but `Success`
    /// aborts the connect either way.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => ConnectResult::Success,
            1 => ConnectResult::GameNotFound,
            3 => ConnectResult::AccountAlreadySignedIn,
            _ => ConnectResult::Unknown,
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            ConnectResult::Success => 0,
            ConnectResult::GameNotFound => 1,
            ConnectResult::Unknown => 2,
            ConnectResult::AccountAlreadySignedIn => 3,
        }
    }
}

/// Server-chosen cap on simultaneous blob splits.
///
/// On the wire this is the literal cap (0x08/0x10/0x20/0x40), not an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitMultiplier {
    X8,
    X16,
    X32,
    X64,
}

impl SplitMultiplier {
    pub fn from_net(value: u8) -> Option<Self> {
        match value {
            0x08 => Some(SplitMultiplier::X8),
            0x10 => Some(SplitMultiplier::X16),
            0x20 => Some(SplitMultiplier::X32),
            0x40 => Some(SplitMultiplier::X64),
            _ => None,
        }
    }

    pub fn to_net(self) -> u8 {
        match self {
            SplitMultiplier::X8 => 0x08,
            SplitMultiplier::X16 => 0x10,
            SplitMultiplier::X32 => 0x20,
            SplitMultiplier::X64 => 0x40,
        }
    }
}

impl Default for SplitMultiplier {
    fn default() -> Self {
        SplitMultiplier::X8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum GameMode {
    Ffa = 0,
    FfaTime = 1,
    Teams = 2,
    TeamsTime = 3,
    Ctf = 4,
    Survival = 5,
    Soccer = 6,
    FfaClassic = 7,
    Domination = 8,
    FfaUltra = 9,
    ZombieApocalypse = 10,
    Paint = 11,
    TeamDeathmatch = 12,
    X = 13,
    X2 = 14,
    X3 = 15,
    X4 = 16,
    X5 = 17,
    Split16x = 18,
    X6 = 19,
    X7 = 20,
    Campaign = 21,
    RoyaleDuo = 22,
    X8 = 23,
    TrickMode = 24,
    PlasmaHunt = 25,
    X11 = 26,
    X12 = 27,
    X13 = 28,
    X14 = 29,
    X15 = 30,
    X16 = 31,
    X17 = 32,
    Dash = 33,
    X19 = 34,
    CrazySplit = 35,
    Invalid = 36,
    BattleRoyale = 37,
    X20 = 38,
    X21 = 39,
    MegaSplit = 40,
    Campaign2 = 41,
    X22 = 42,
}

impl Default for GameMode {
    fn default() -> Self {
        GameMode::Ffa
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum GameDifficulty {
    Easy = 0,
    Medium = 1,
    Hard = 2,
    Impossible = 3,
}

impl Default for GameDifficulty {
    fn default() -> Self {
        GameDifficulty::Easy
    }
}

/// Profile visibility flag sent in the connect request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum OnlineMode {
    Public = 0,
    ClanAndFriends = 1,
    Friends = 2,
}

impl Default for OnlineMode {
    fn default() -> Self {
        OnlineMode::Public
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ClanRole {
    Invalid = 0,
    Member = 1,
    Admin = 2,
    Leader = 3,
    Elder = 4,
    Diamond = 5,
    Initiate = 6,
}

impl ClanRole {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => ClanRole::Member,
            2 => ClanRole::Admin,
            3 => ClanRole::Leader,
            4 => ClanRole::Elder,
            5 => ClanRole::Diamond,
            6 => ClanRole::Initiate,
            _ => ClanRole::Invalid,
        }
    }
}

/// Consumable world item kinds carried in `GameData`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ItemType {
    Pumpkin = 0,
    Snowflake = 1,
    Heart = 2,
    Leaf = 3,
    Bigdot = 4,
    Coin = 5,
    Present = 6,
    Bead = 7,
    Egg = 8,
    Raindrop = 9,
    Nebula = 10,
    Candy = 11,
    Sun = 12,
    Moon = 13,
    Note = 14,
    CakePlasma = 15,
    CakeXp = 16,
    Unknown = 255,
}

impl ItemType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => ItemType::Pumpkin,
            1 => ItemType::Snowflake,
            2 => ItemType::Heart,
            3 => ItemType::Leaf,
            4 => ItemType::Bigdot,
            5 => ItemType::Coin,
            6 => ItemType::Present,
            7 => ItemType::Bead,
            8 => ItemType::Egg,
            9 => ItemType::Raindrop,
            10 => ItemType::Nebula,
            11 => ItemType::Candy,
            12 => ItemType::Sun,
            13 => ItemType::Moon,
            14 => ItemType::Note,
            15 => ItemType::CakePlasma,
            16 => ItemType::CakeXp,
            _ => ItemType::Unknown,
        }
    }
}

/// Lifecycle of one client session. Transitions are monotonic; a new
/// session starts over at `Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_type_table() {
        assert_eq!(PacketType::from_u8(1), Some(PacketType::ConnectResult2));
        assert_eq!(PacketType::from_u8(3), Some(PacketType::KeepAlive));
        assert_eq!(PacketType::from_u8(22), Some(PacketType::GameUpdate));
        assert_eq!(PacketType::from_u8(75), Some(PacketType::GameData));
        assert_eq!(PacketType::from_u8(118), Some(PacketType::ConnectRequest3));
        assert_eq!(PacketType::from_u8(119), Some(PacketType::ArenaCdInternal));
        assert_eq!(PacketType::from_u8(120), None);
        assert_eq!(PacketType::from_u8(255), None);
    }

    #[test]
    fn test_event_type_table() {
        assert_eq!(GameEventType::from_u8(4), Some(GameEventType::BlobExplode));
        assert_eq!(GameEventType::from_u8(38), Some(GameEventType::XpGained2));
        assert_eq!(GameEventType::from_u8(54), Some(GameEventType::RlglState));
        assert_eq!(GameEventType::from_u8(55), None);
    }

    #[test]
    fn test_split_multiplier_net_values() {
        assert_eq!(SplitMultiplier::from_net(0x08), Some(SplitMultiplier::X8));
        assert_eq!(SplitMultiplier::from_net(0x40), Some(SplitMultiplier::X64));
        assert_eq!(SplitMultiplier::from_net(0x09), None);
        assert_eq!(SplitMultiplier::X32.to_net(), 0x20);
    }

    #[test]
    fn test_connect_result_unknown_codes_collapse() {
        assert_eq!(ConnectResult::from_u8(0), ConnectResult::Success);
        assert_eq!(ConnectResult::from_u8(1), ConnectResult::GameNotFound);
        assert_eq!(
            ConnectResult::from_u8(3),
            ConnectResult::AccountAlreadySignedIn
        );
        assert_eq!(ConnectResult::from_u8(200), ConnectResult::Unknown);
    }

    #[test]
    fn test_item_type_fallback() {
        assert_eq!(ItemType::from_u8(5), ItemType::Coin);
        assert_eq!(ItemType::from_u8(16), ItemType::CakeXp);
        assert_eq!(ItemType::from_u8(17), ItemType::Unknown);
    }
}
