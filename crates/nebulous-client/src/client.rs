//! The session runtime: socket, handshake, send/receive loops, shutdown.

use std::sync::{Arc, Mutex, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::BytesMut;
use nebulous_protocol::{
    ClanChatMessage, ConnectRequest3, Control, Disconnect, GameChatMessage, KeepAlive, Packet,
};
use nebulous_types::{ClientState, ConnectResult, ControlFlags, PacketType, SessionIds};
use rand::Rng;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, timeout, Duration, Instant};
use tracing::{debug, info, warn};

use crate::account::{SecureTicket, Ticket};
use crate::callbacks::{dispatch_event, ClientCallbacks};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::world::World;

/// Ceiling on every socket read and write.
const IO_TIMEOUT: Duration = Duration::from_secs(5);

/// Wait on the connect result.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(500);

/// Largest datagram the receive loop accepts.
const RECV_BUFFER_SIZE: usize = 8192;

const PORT_BASE: u16 = 27900;

type SharedCallbacks = Arc<Mutex<Box<dyn ClientCallbacks>>>;

/// Work items drained by the send loop. Control packets are queued as raw
/// inputs so the loop can stamp them with its tick counter at send time.
enum Outbound {
    Control {
        angle: f32,
        speed: f32,
        flags: ControlFlags,
    },
    Packet(Vec<u8>),
}

/// State shared between the loops and the handle.
struct Shared {
    socket: UdpSocket,
    session: SessionIds,
    world: RwLock<World>,
    aspect_ratio: f32,
}

struct Runtime {
    shared: Arc<Shared>,
    queue_tx: mpsc::UnboundedSender<Outbound>,
    cancel_tx: Arc<watch::Sender<bool>>,
    send_task: JoinHandle<Result<(), ClientError>>,
    recv_task: JoinHandle<Result<(), ClientError>>,
}

/// A connected game session.
pub struct Client {
    config: ClientConfig,
    credentials: SecureTicket,
    ticket: Ticket,
    callbacks: SharedCallbacks,
    state: ClientState,
    /// Random wire alias used to find ourselves in the world mirror.
    session_alias: String,
    port_seed: u8,
    runtime: Option<Runtime>,
    #[cfg(test)]
    port_override: Option<u16>,
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// 16 printable ASCII code points, 0x21..=0x7E.
fn random_session_alias(rng: &mut impl Rng) -> String {
    (0..16).map(|_| rng.gen_range(0x21u8..=0x7E) as char).collect()
}

impl Client {
    pub fn new(
        config: ClientConfig,
        credentials: SecureTicket,
        ticket: Ticket,
        callbacks: Box<dyn ClientCallbacks>,
    ) -> Self {
        let mut rng = rand::thread_rng();
        Self {
            config,
            credentials,
            ticket,
            callbacks: Arc::new(Mutex::new(callbacks)),
            state: ClientState::Disconnected,
            session_alias: random_session_alias(&mut rng),
            port_seed: rng.gen_range(0..2),
            runtime: None,
            #[cfg(test)]
            port_override: None,
        }
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    /// The random alias this session carries on the wire.
    pub fn session_alias(&self) -> &str {
        &self.session_alias
    }

    pub fn session(&self) -> Option<SessionIds> {
        self.runtime.as_ref().map(|rt| rt.shared.session.clone())
    }

    /// Alternates between 27900 and 27901 across connect attempts.
    fn next_port(&mut self) -> u16 {
        let port = PORT_BASE + self.port_seed as u16;
        self.port_seed = (self.port_seed + 1) % 2;
        port
    }

    fn build_connect_request(&self, client_id: i32, rng_seed: i64) -> ConnectRequest3 {
        let cfg = &self.config;
        ConnectRequest3 {
            rng_seed,
            game_version: cfg.game_version,
            client_id,
            game_mode: cfg.game_mode,
            game_difficulty: cfg.game_difficulty,
            game_id: cfg.game_id,
            ticket: String::new(),
            online_mode: cfg.online_mode,
            mayhem: cfg.mayhem,
            skin: cfg.skin,
            eject_skin: cfg.eject_skin as u8,
            alias: self.session_alias.clone(),
            custom_skin: cfg.custom_skin,
            alias_colors: cfg.alias_colors.iter().map(|c| *c as u8).collect(),
            pet_id: cfg.pet1 as u8,
            blob_color: cfg.blob_color,
            pet_name: cfg.pet1_name.clone(),
            hat: cfg.hat as u8,
            custom_pet: cfg.custom_pet,
            halo: cfg.halo,
            pet2_id: cfg.pet2 as u8,
            pet2_name: cfg.pet2_name.clone(),
            custom_pet2: cfg.custom_pet2,
            custom_particle: cfg.custom_particle,
            particle: cfg.particle as u8,
            alias_font: cfg.alias_font,
            level_colors: cfg.level_colors.clone(),
            alias_animation: cfg.alias_animation,
            skin2: cfg.skin2,
            skin_interpolation: cfg.skin_interpolation_rate,
            custom_skin2: cfg.custom_skin2,
            timestamp_ms: now_millis(),
            secure_bytes: self.credentials.secure_bytes.clone(),
        }
    }

    /// Run the connect handshake and start the session loops.
    pub async fn connect(&mut self) -> Result<(), ClientError> {
        if self.state != ClientState::Disconnected {
            return Err(ClientError::AlreadyConnected);
        }
        self.state = ClientState::Connecting;
        match self.try_connect().await {
            Ok(()) => {
                self.state = ClientState::Connected;
                Ok(())
            }
            Err(e) => {
                self.state = ClientState::Disconnected;
                Err(e)
            }
        }
    }

    async fn try_connect(&mut self) -> Result<(), ClientError> {
        let port = self.next_port();
        #[cfg(test)]
        let port = self.port_override.unwrap_or(port);
        let server_ip = self.credentials.server_ip;
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect((server_ip, port)).await?;
        info!(%server_ip, port, "Connecting");

        // fresh identity per attempt
        let (client_id, rng_seed) = {
            let mut rng = rand::thread_rng();
            let mut client_id: i32 = rng.gen();
            while client_id == 0 {
                client_id = rng.gen();
            }
            (client_id, rng.gen::<i64>())
        };

        let mut request = self.build_connect_request(client_id, rng_seed);
        self.callbacks.lock().unwrap().on_connect(&mut request)?;
        let packet = request.encode()?;
        timeout(IO_TIMEOUT, socket.send(&packet))
            .await
            .map_err(|_| ClientError::Timeout)??;

        // exactly one result decides the attempt
        let mut buf = [0u8; RECV_BUFFER_SIZE];
        let n = timeout(CONNECT_TIMEOUT, socket.recv(&mut buf))
            .await
            .map_err(|_| ClientError::ConnectTimeout)??;
        let mut data = BytesMut::from(&buf[..n]);
        let Some(Packet::ConnectResult2(mut result)) = Packet::decode(&mut data, 0.0)? else {
            return Err(ClientError::UnexpectedPacket);
        };
        self.callbacks
            .lock()
            .unwrap()
            .on_connect_result(&mut result)?;
        if result.result != ConnectResult::Success {
            warn!(result = ?result.result, "Connect refused");
            return Err(ClientError::ConnectFailed(result.result));
        }

        let session = SessionIds {
            client_id,
            public_id: result.public_id,
            private_id: result.private_id,
            game_id: result.game_id,
            split_multiplier: result.split_multiplier,
            server_ip,
        };
        info!(
            public_id = session.public_id,
            game_id = session.game_id,
            split_multiplier = ?session.split_multiplier,
            "Connected"
        );

        let shared = Arc::new(Shared {
            socket,
            session,
            world: RwLock::new(World::new()),
            aspect_ratio: self.config.aspect_ratio(),
        });
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (gate_tx, gate_rx) = watch::channel(false);

        let send_task = tokio::spawn(send_loop(
            shared.clone(),
            self.callbacks.clone(),
            queue_rx,
            gate_rx,
            cancel_rx.clone(),
        ));
        let recv_task = tokio::spawn(recv_loop(
            shared.clone(),
            self.callbacks.clone(),
            gate_tx,
            cancel_rx,
            self.session_alias.clone(),
        ));

        self.runtime = Some(Runtime {
            shared,
            queue_tx,
            cancel_tx: Arc::new(cancel_tx),
            send_task,
            recv_task,
        });
        Ok(())
    }

    /// Enqueue and steer from host code. Only valid while connected.
    pub fn handle(&self) -> Result<ClientHandle, ClientError> {
        let runtime = self.runtime.as_ref().ok_or(ClientError::NotConnected)?;
        Ok(ClientHandle {
            shared: runtime.shared.clone(),
            queue_tx: runtime.queue_tx.clone(),
            cancel_tx: runtime.cancel_tx.clone(),
            account_id: self.ticket.account_id,
            chat_alias: self.config.alias.clone(),
            alias_colors: self.config.alias_colors.iter().map(|c| *c as u8).collect(),
            alias_font: self.config.alias_font,
        })
    }

    /// Run until a loop stops (error, cancellation, or timeout), then tear
    /// the session down: best-effort disconnect, socket close.
    pub async fn wait(&mut self) -> Result<(), ClientError> {
        let Some(runtime) = self.runtime.take() else {
            return Ok(());
        };
        let Runtime {
            shared,
            queue_tx: _queue_tx,
            cancel_tx,
            mut send_task,
            mut recv_task,
        } = runtime;

        enum First {
            Send(Result<(), ClientError>),
            Recv(Result<(), ClientError>),
        }

        let first = tokio::select! {
            r = &mut send_task => First::Send(flatten_join(r)),
            r = &mut recv_task => First::Recv(flatten_join(r)),
        };
        let _ = cancel_tx.send(true);
        let (first_result, second_result) = match first {
            First::Send(r) => (r, flatten_join(recv_task.await)),
            First::Recv(r) => (r, flatten_join(send_task.await)),
        };

        self.state = ClientState::Disconnecting;
        self.send_disconnect(&shared).await;
        self.state = ClientState::Disconnected;
        info!("Session closed");

        first_result.and(second_result)
    }

    /// Request shutdown and wait for it. Safe to call more than once.
    pub async fn stop(&mut self) -> Result<(), ClientError> {
        let Some(runtime) = self.runtime.as_ref() else {
            return Ok(());
        };
        let _ = runtime.cancel_tx.send(true);
        self.wait().await
    }

    /// The disconnect notice is the last packet of every session.
    async fn send_disconnect(&self, shared: &Shared) {
        let mut disconnect = Disconnect {
            public_id: shared.session.public_id,
            private_id: shared.session.private_id,
            client_id: shared.session.client_id,
        };
        if let Err(e) = self.callbacks.lock().unwrap().on_disconnect(&mut disconnect) {
            warn!(error = %e, "Disconnect callback failed");
        }
        match timeout(IO_TIMEOUT, shared.socket.send(&disconnect.encode())).await {
            Ok(Ok(_)) => debug!("Disconnect sent"),
            Ok(Err(e)) => warn!(error = %e, "Failed to send disconnect"),
            Err(_) => warn!("Timed out sending disconnect"),
        }
    }
}

fn flatten_join(
    result: Result<Result<(), ClientError>, tokio::task::JoinError>,
) -> Result<(), ClientError> {
    match result {
        Ok(r) => r,
        Err(e) => Err(ClientError::Callback(anyhow::anyhow!(
            "session task panicked: {e}"
        ))),
    }
}

/// Cloneable driver for a running session.
#[derive(Clone)]
pub struct ClientHandle {
    shared: Arc<Shared>,
    queue_tx: mpsc::UnboundedSender<Outbound>,
    cancel_tx: Arc<watch::Sender<bool>>,
    account_id: i32,
    chat_alias: String,
    alias_colors: Vec<u8>,
    alias_font: u8,
}

impl ClientHandle {
    /// Queue a steering input. Refused until the local player has been
    /// discovered in the world mirror.
    pub fn send_control(
        &self,
        angle: f32,
        speed: f32,
        flags: ControlFlags,
    ) -> Result<(), ClientError> {
        if self.world().local_player_index.is_none() {
            return Err(ClientError::PlayerNotFound);
        }
        self.queue_tx
            .send(Outbound::Control {
                angle,
                speed,
                flags,
            })
            .map_err(|_| ClientError::ChannelClosed)
    }

    pub fn send_game_chat(&self, message: &str) -> Result<(), ClientError> {
        let chat = GameChatMessage {
            public_id: self.shared.session.public_id,
            alias: self.chat_alias.clone(),
            message: message.to_owned(),
            account_id: -1,
            alias_colors: self.alias_colors.clone(),
            show_bubble: false,
            alias_font: self.alias_font,
        };
        let packet = chat.encode(self.shared.session.client_id)?;
        self.queue_tx
            .send(Outbound::Packet(packet))
            .map_err(|_| ClientError::ChannelClosed)
    }

    /// Clan chat requires a signed-in account.
    pub fn send_clan_chat(&self, message: &str) -> Result<(), ClientError> {
        if self.account_id < 0 {
            return Err(ClientError::NotSignedIn);
        }
        let chat = ClanChatMessage {
            public_id: self.shared.session.public_id,
            alias: String::new(),
            message: message.to_owned(),
            clan_role: 0,
            account_id: -1,
            alias_colors: Vec::new(),
        };
        let packet = chat.encode(self.shared.session.client_id)?;
        self.queue_tx
            .send(Outbound::Packet(packet))
            .map_err(|_| ClientError::ChannelClosed)
    }

    /// A copy of the latest complete world snapshot.
    pub fn world(&self) -> World {
        self.shared.world.read().unwrap().clone()
    }

    pub fn session(&self) -> &SessionIds {
        &self.shared.session
    }

    /// Request session shutdown without waiting for it.
    pub fn stop(&self) {
        let _ = self.cancel_tx.send(true);
    }
}

/// Waits until the watch value becomes `true`, or the channel closes.
///
/// Equivalent to `rx.wait_for(|v| *v)` but avoids returning a
/// `watch::Ref` (which wraps a non-`Send` lock guard) from a `select!`
/// branch, which would make the enclosing future non-`Send`.
async fn wait_until_true(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

/// Like [`wait_until_true`], but surfaces channel closure as an error
/// instead of treating it the same as becoming `true`.
async fn wait_until_true_or_closed(
    rx: &mut watch::Receiver<bool>,
) -> Result<(), watch::error::RecvError> {
    loop {
        if *rx.borrow() {
            return Ok(());
        }
        rx.changed().await?;
    }
}

async fn send_datagram(shared: &Shared, bytes: &[u8]) -> Result<(), ClientError> {
    timeout(IO_TIMEOUT, shared.socket.send(bytes))
        .await
        .map_err(|_| ClientError::Timeout)??;
    Ok(())
}

/// Emit one control packet, stamping it with the loop's tick counter.
async fn emit_control(
    shared: &Shared,
    angle: f32,
    speed: f32,
    flags: ControlFlags,
    tick: &mut u8,
) -> Result<(), ClientError> {
    let player_index = {
        let world = shared.world.read().unwrap();
        world.local_player_index.ok_or(ClientError::PlayerNotFound)?
    };
    let control = Control {
        public_id: shared.session.public_id,
        angle,
        speed,
        tick: *tick,
        flags,
        player_index,
        client_id: shared.session.client_id,
        aspect_ratio: shared.aspect_ratio,
    };
    *tick = tick.wrapping_add(1);
    send_datagram(shared, &control.encode()).await
}

/// Drains the outbound queue and keeps the heartbeat; held back until the
/// initial snapshot burst has arrived.
async fn send_loop(
    shared: Arc<Shared>,
    callbacks: SharedCallbacks,
    mut queue_rx: mpsc::UnboundedReceiver<Outbound>,
    mut gate_rx: watch::Receiver<bool>,
    mut cancel_rx: watch::Receiver<bool>,
) -> Result<(), ClientError> {
    tokio::select! {
        _ = wait_until_true(&mut cancel_rx) => return Ok(()),
        res = wait_until_true_or_closed(&mut gate_rx) => {
            if res.is_err() {
                return Err(ClientError::ChannelClosed);
            }
        }
    }
    debug!("World snapshot ready, send loop running");

    let mut tick: u8 = 0;
    let mut last_heartbeat = Instant::now();
    loop {
        let next_heartbeat = last_heartbeat + HEARTBEAT_INTERVAL;
        tokio::select! {
            biased;
            _ = wait_until_true(&mut cancel_rx) => return Ok(()),
            item = queue_rx.recv() => {
                let Some(item) = item else { return Ok(()) };
                match item {
                    Outbound::Packet(bytes) => send_datagram(&shared, &bytes).await?,
                    Outbound::Control { angle, speed, flags } => {
                        emit_control(&shared, angle, speed, flags, &mut tick).await?;
                    }
                }
            }
            _ = sleep_until(next_heartbeat) => {
                let mut keep_alive = KeepAlive {
                    public_id: shared.session.public_id,
                    private_id: shared.session.private_id,
                    server_ip: shared.session.server_ip,
                    client_id: shared.session.client_id,
                };
                callbacks.lock().unwrap().on_keep_alive(&mut keep_alive)?;
                send_datagram(&shared, &keep_alive.encode()).await?;
                // the idle control is withheld until we know who we are
                match emit_control(&shared, 0.0, 0.0, ControlFlags::NONE, &mut tick).await {
                    Ok(()) | Err(ClientError::PlayerNotFound) => {}
                    Err(e) => return Err(e),
                }
                last_heartbeat = Instant::now();
            }
        }
    }
}

/// Reads datagrams, mirrors the world, opens the gate, dispatches
/// callbacks.
async fn recv_loop(
    shared: Arc<Shared>,
    callbacks: SharedCallbacks,
    gate_tx: watch::Sender<bool>,
    mut cancel_rx: watch::Receiver<bool>,
    session_alias: String,
) -> Result<(), ClientError> {
    let mut buf = vec![0u8; RECV_BUFFER_SIZE];
    let mut snapshot_burst: u32 = 0;
    loop {
        let n = tokio::select! {
            biased;
            _ = wait_until_true(&mut cancel_rx) => return Ok(()),
            result = timeout(IO_TIMEOUT, shared.socket.recv(&mut buf)) => {
                match result {
                    Ok(Ok(n)) => n,
                    Ok(Err(e)) => return Err(e.into()),
                    Err(_) => return Err(ClientError::Timeout),
                }
            }
        };
        if n == 0 {
            continue;
        }

        // the gate opens on the first non-snapshot datagram after at least
        // one snapshot; it never closes again
        if buf[0] == PacketType::GameData as u8 {
            snapshot_burst += 1;
        } else if snapshot_burst > 0 && !*gate_tx.borrow() {
            info!(snapshots = snapshot_burst, "Initial snapshot burst complete");
            let _ = gate_tx.send(true);
        }

        let map_size = shared.world.read().unwrap().map_size;
        let mut data = BytesMut::from(&buf[..n]);
        let packet = match Packet::decode(&mut data, map_size) {
            Ok(Some(packet)) => packet,
            Ok(None) => continue,
            Err(e) => {
                warn!(error = %e, "Dropping malformed datagram");
                continue;
            }
        };
        handle_packet(&shared, &callbacks, packet, &session_alias)?;
    }
}

fn handle_packet(
    shared: &Shared,
    callbacks: &SharedCallbacks,
    packet: Packet,
    session_alias: &str,
) -> Result<(), ClientError> {
    match packet {
        Packet::GameData(mut snapshot) => {
            shared
                .world
                .write()
                .unwrap()
                .apply_snapshot(&snapshot, session_alias);
            callbacks.lock().unwrap().on_game_data(&mut snapshot)?;
        }
        Packet::GameUpdate(mut update) => {
            let mut callbacks = callbacks.lock().unwrap();
            for event in update.events.iter_mut() {
                callbacks.on_game_event(event)?;
                dispatch_event(callbacks.as_mut(), event)?;
            }
        }
        Packet::GameChatMessage(mut message) => {
            callbacks.lock().unwrap().on_game_chat_message(&mut message)?;
        }
        Packet::ClanChatMessage(mut message) => {
            callbacks.lock().unwrap().on_clan_chat_message(&mut message)?;
        }
        other => {
            debug!(packet_type = ?other.packet_type(), "Ignoring inbound packet");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::NoopCallbacks;
    use nebulous_protocol::events::LevelUpEvent;
    use nebulous_protocol::{
        unshuffle_connect_payload, ConnectResult2, GameData, GameEvent, GameUpdate, NetPlayer,
    };
    use nebulous_types::{ClanRole, SplitMultiplier};
    use std::net::Ipv4Addr;

    #[test]
    fn test_port_alternation() {
        let mut client = test_client(0);
        client.port_seed = 0;
        assert_eq!(client.next_port(), 27900);
        assert_eq!(client.next_port(), 27901);
        assert_eq!(client.next_port(), 27900);

        client.port_seed = 1;
        assert_eq!(client.next_port(), 27901);
        assert_eq!(client.next_port(), 27900);
    }

    #[test]
    fn test_session_alias_shape() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let alias = random_session_alias(&mut rng);
            assert_eq!(alias.len(), 16);
            assert!(alias.bytes().all(|b| (0x21..=0x7E).contains(&b)));
        }
    }

    #[test]
    fn test_connect_request_uses_session_alias_and_secure_bytes() {
        let client = test_client(7);
        let request = client.build_connect_request(42, 1);
        assert_eq!(request.alias, client.session_alias);
        assert_eq!(request.secure_bytes, vec![7, 7, 7]);
        assert_eq!(request.ticket, "");
        assert_eq!(request.client_id, 42);
    }

    fn test_client(secure_byte: u8) -> Client {
        let credentials = SecureTicket {
            secure_bytes: vec![secure_byte; 3],
            server_ip: Ipv4Addr::LOCALHOST,
        };
        Client::new(
            ClientConfig::default(),
            credentials,
            Ticket::anonymous(),
            Box::new(NoopCallbacks),
        )
    }

    fn test_net_player(player_id: u8, alias: &str) -> NetPlayer {
        NetPlayer {
            player_id,
            skin: 0,
            eject_skin: 0xFF,
            custom_skin: 0,
            custom_pet: 0,
            pet_id: 0xFF,
            pet_level: 0,
            pet_name: String::new(),
            hat: 0xFF,
            halo: 0,
            pet2_id: 0xFF,
            pet2_level: 0,
            pet2_name: String::new(),
            custom_pet2: 0,
            custom_particle: 0,
            particle: 0xFF,
            level_colors: vec![],
            alias_animation: 0,
            skin2: 0,
            skin_interpolation: 0.0,
            custom_skin2: 0,
            blob_color: 0,
            team_id: 0,
            alias: alias.to_owned(),
            alias_font: 0,
            alias_colors: vec![],
            account_id: -1,
            player_level: 1,
            clan_name: String::new(),
            clan_colors: vec![],
            clan_role: ClanRole::Invalid,
            click_type: 0,
        }
    }

    #[tokio::test]
    async fn test_control_tick_monotonic_and_gated_on_identity() {
        let sink = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        socket.connect(sink.local_addr().unwrap()).await.unwrap();
        let shared = Shared {
            socket,
            session: SessionIds {
                client_id: 1,
                public_id: 2,
                private_id: 3,
                game_id: 4,
                split_multiplier: SplitMultiplier::X8,
                server_ip: Ipv4Addr::LOCALHOST,
            },
            world: RwLock::new(World::new()),
            aspect_ratio: 1.5,
        };

        // no control before the local player is known
        let mut tick: u8 = 254;
        let err = emit_control(&shared, 0.0, 0.0, ControlFlags::NONE, &mut tick)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::PlayerNotFound));
        assert_eq!(tick, 254);

        shared.world.write().unwrap().local_player_index = Some(2);
        let mut buf = [0u8; 32];
        for expected in [254u8, 255, 0, 1, 2] {
            emit_control(&shared, 0.0, 0.0, ControlFlags::NONE, &mut tick)
                .await
                .unwrap();
            let (n, _) = sink.recv_from(&mut buf).await.unwrap();
            assert_eq!(n, 16);
            assert_eq!(buf[0], PacketType::Control as u8);
            // tick sits after type, public id, angle and speed
            assert_eq!(buf[8], expected);
        }
    }

    /// Emulates just enough of the region server: accept the shuffled
    /// connect request, answer it, push the snapshot burst, then forward
    /// every inbound packet type to the test.
    async fn fake_server(
        socket: UdpSocket,
        session_alias: String,
        types_tx: mpsc::UnboundedSender<u8>,
    ) {
        let mut buf = vec![0u8; RECV_BUFFER_SIZE];
        let (n, peer) = socket.recv_from(&mut buf).await.unwrap();

        let mut packet = buf[..n].to_vec();
        let rng_seed = i64::from_be_bytes(packet[5..13].try_into().unwrap());
        unshuffle_connect_payload(&mut packet, rng_seed);
        assert_eq!(packet[0], PacketType::ConnectRequest3 as u8);
        let client_id = i32::from_be_bytes(packet[15..19].try_into().unwrap());

        let reply = ConnectResult2 {
            client_id,
            result: ConnectResult::Success,
            public_id: 11,
            private_id: 22,
            game_id: 33,
            ban_length: 0,
            ad_stuff: 0.0,
            split_multiplier: SplitMultiplier::X16,
        };
        socket.send_to(&reply.encode(), peer).await.unwrap();

        let snapshot = GameData {
            public_id: 11,
            map_size: 512.0,
            players: vec![
                test_net_player(0, "someone else"),
                test_net_player(9, &session_alias),
            ],
            ejects: vec![],
            dots: vec![],
            items: vec![],
            dot_id_offset: 0,
            item_id_offset: 0,
        };
        socket
            .send_to(&snapshot.encode().unwrap(), peer)
            .await
            .unwrap();

        // a non-snapshot datagram ends the burst and opens the gate
        let update = GameUpdate {
            events: vec![GameEvent::LevelUp(LevelUpEvent { level: 2 })],
        };
        socket.send_to(&update.encode(512.0), peer).await.unwrap();

        while let Ok((n, _)) = socket.recv_from(&mut buf).await {
            if n > 0 && types_tx.send(buf[0]).is_err() {
                break;
            }
        }
    }

    #[tokio::test]
    async fn test_session_against_local_server() {
        let server_a = UdpSocket::bind("127.0.0.1:27900").await.unwrap();
        let server_b = UdpSocket::bind("127.0.0.1:27901").await.unwrap();
        let (types_tx, mut types_rx) = mpsc::unbounded_channel();

        let mut client = test_client(1);
        let alias = client.session_alias().to_owned();
        tokio::spawn(fake_server(server_a, alias.clone(), types_tx.clone()));
        tokio::spawn(fake_server(server_b, alias, types_tx));

        client.connect().await.unwrap();
        assert_eq!(client.state(), ClientState::Connected);
        let session = client.session().unwrap();
        assert_eq!(session.public_id, 11);
        assert_eq!(session.private_id, 22);
        assert_eq!(session.game_id, 33);
        assert_eq!(session.split_multiplier, SplitMultiplier::X16);

        let handle = client.handle().unwrap();
        handle.send_game_chat("hello lobby").unwrap();

        // once the gate opens we expect chat, keep-alive and control
        let mut seen = Vec::new();
        while !(seen.contains(&(PacketType::KeepAlive as u8))
            && seen.contains(&(PacketType::Control as u8))
            && seen.contains(&(PacketType::GameChatMessage as u8)))
        {
            let t = timeout(Duration::from_secs(3), types_rx.recv())
                .await
                .expect("timed out waiting for client packets")
                .expect("server task ended");
            seen.push(t);
        }

        // world mirror and local player discovery
        let world = handle.world();
        assert_eq!(world.map_size, 512.0);
        assert_eq!(world.players.len(), 2);
        assert_eq!(world.local_player_index, Some(9));

        // steering is accepted now that the identity is known
        handle.send_control(1.0, 0.5, ControlFlags::NONE).unwrap();

        client.stop().await.unwrap();
        assert_eq!(client.state(), ClientState::Disconnected);

        // the disconnect notice is the last thing on the wire
        let mut last = None;
        while let Ok(Some(t)) = timeout(Duration::from_millis(500), types_rx.recv()).await {
            last = Some(t);
        }
        if let Some(t) = last {
            assert_eq!(t, PacketType::Disconnect as u8);
        }
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = server.local_addr().unwrap().port();

        // refuse with GameNotFound
        tokio::spawn(async move {
            let mut buf = vec![0u8; RECV_BUFFER_SIZE];
            let (_, peer) = server.recv_from(&mut buf).await.unwrap();
            let reply = ConnectResult2 {
                client_id: 0,
                result: ConnectResult::GameNotFound,
                public_id: 0,
                private_id: 0,
                game_id: 0,
                ban_length: 0,
                ad_stuff: 0.0,
                split_multiplier: SplitMultiplier::X8,
            };
            server.send_to(&reply.encode(), peer).await.unwrap();
        });

        let mut client = test_client(2);
        // route the connect attempt at the ephemeral test server
        client.credentials.server_ip = Ipv4Addr::LOCALHOST;
        client.port_override = Some(port);

        let err = client.connect().await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::ConnectFailed(ConnectResult::GameNotFound)
        ));
        assert_eq!(client.state(), ClientState::Disconnected);
    }
}
