//! Two peers playing over an in-process link
//!
//! Each peer owns a [`RollbackManager`] with its own copy of the duel and a
//! scripted player. Packets between the peers are encoded with the rollback
//! wire format and held back for a random number of frames, so they arrive
//! late and out of order. Every input packet repeats the sender's inputs for
//! the last `max_delay_frames + 1` frames, which is enough to cover any frame
//! a reordered packet could have skipped.
//!
//! Peer 0 is the authority: it sends the checksum of every frame it confirms.
//! Peer 1 compares those against its own confirmed checksums.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use rollback_engine::config::ConfigError;
use rollback_engine::physics::PhysicsError;
use rollback_engine::rollback::{
    decode_batch, encode_batch, Checksum, CodecError, Frame, FrameInput, GameSimulation, InputFlags,
    NetworkEvent, PlayerId, RollbackError, RollbackManager,
};

use crate::config::{DuelConfig, SessionConfig};
use crate::game::DuelGame;

const AUTHORITY: usize = 0;

/// Errors that end a session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("physics error: {0}")]
    Physics(#[from] PhysicsError),

    #[error("rollback error: {0}")]
    Rollback(#[from] RollbackError),

    #[error("malformed packet: {0}")]
    Codec(#[from] CodecError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("tick {0} does not fit in a frame number")]
    FrameOverflow(usize),
}

/// Outcome of a finished session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    /// Frames played by each peer
    pub frames: usize,
    /// Replays run by each peer
    pub rollbacks: [u64; 2],
    /// Newest confirmed frame of each peer
    pub confirmed_frames: [Frame; 2],
    /// Frames whose checksums agreed between the peers
    pub checksum_matches: usize,
    /// Frames whose checksums disagreed
    pub desyncs: usize,
    /// Checksum of each peer's confirmed simulation
    pub confirmed_checksums: [Checksum; 2],
    /// Checksum of each peer's live simulation
    pub live_checksums: [Checksum; 2],
    /// Zone frames scored by each player, as seen by the authority
    pub scores: [u32; 2],
}

impl SessionReport {
    /// Whether both peers ended in the same state without a desync
    pub fn is_consistent(&self) -> bool {
        self.desyncs == 0
            && self.confirmed_checksums[0] == self.confirmed_checksums[1]
            && self.live_checksums == self.confirmed_checksums
    }
}

#[derive(Debug)]
struct Packet {
    deliver_at: usize,
    seq: u64,
    to: usize,
    bytes: Vec<u8>,
}

/// In-flight packets with a random delay each
#[derive(Debug)]
struct Link {
    in_flight: Vec<Packet>,
    next_seq: u64,
    max_delay: u32,
    rng: StdRng,
}

impl Link {
    fn new(config: &SessionConfig) -> Self {
        Self {
            in_flight: Vec::new(),
            next_seq: 0,
            max_delay: config.max_delay_frames,
            rng: StdRng::seed_from_u64(config.seed.rotate_left(32)),
        }
    }

    fn send(&mut self, now: usize, to: usize, bytes: Vec<u8>) {
        let delay = self.rng.gen_range(0..=self.max_delay) as usize;
        self.in_flight.push(Packet {
            deliver_at: now + delay,
            seq: self.next_seq,
            to,
            bytes,
        });
        self.next_seq += 1;
    }

    /// Packets due at `now` (all of them for `None`) in delivery order
    fn take_due(&mut self, now: Option<usize>) -> Vec<Packet> {
        let (mut due, waiting): (Vec<_>, Vec<_>) = self
            .in_flight
            .drain(..)
            .partition(|packet| now.map_or(true, |now| packet.deliver_at <= now));
        self.in_flight = waiting;
        due.sort_by_key(|packet| (packet.deliver_at, packet.seq));
        due
    }

    fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }
}

#[derive(Debug)]
struct Peer {
    id: PlayerId,
    manager: RollbackManager<DuelGame>,
    script: Vec<InputFlags>,
    local_checksums: Vec<Option<Checksum>>,
    authority_checksums: Vec<Option<Checksum>>,
    matches: usize,
    desyncs: usize,
}

impl Peer {
    fn remote(&self) -> PlayerId {
        1 - self.id
    }

    fn is_authority(&self) -> bool {
        usize::from(self.id) == AUTHORITY
    }

    /// Input packet covering the newest `window` local frames up to `tick`
    fn input_packet(&self, tick: usize, window: usize) -> Result<Vec<u8>, SessionError> {
        let first = (tick + 1).saturating_sub(window);
        let mut events = Vec::with_capacity(window);
        for past in first..=tick {
            events.push(NetworkEvent::Input {
                player: self.id,
                input: self.manager.input_at(frame_of(past)?, self.id)?,
            });
        }
        Ok(encode_batch(&events))
    }

    /// Apply one packet, returning whether it made the live simulation replay
    fn receive(&mut self, bytes: &[u8]) -> Result<bool, SessionError> {
        let mut inputs = Vec::new();
        for event in decode_batch(bytes)? {
            match event {
                NetworkEvent::Input { player, input } if player == self.remote() => inputs.push(input),
                NetworkEvent::Input { player, .. } => {
                    log::warn!("Peer {} ignored input claiming to be player {}", self.id, player);
                }
                NetworkEvent::Confirm { frame, checksum, .. } => {
                    if let Some(slot) = usize::try_from(frame).ok().and_then(|f| self.authority_checksums.get_mut(f)) {
                        *slot = Some(checksum);
                        self.compare(frame);
                    }
                }
            }
        }
        if inputs.is_empty() {
            return Ok(false);
        }
        Ok(self.manager.set_remote_player_input(&inputs, self.remote())?)
    }

    /// Confirm every confirmable frame, returning the events to send
    fn confirm_ready_frames(&mut self) -> Result<Vec<NetworkEvent>, SessionError> {
        let mut events = Vec::new();
        while self.manager.is_frame_confirmable() {
            let frame = self.manager.frame_to_confirm();
            let checksum = self.manager.confirm_frame()?;
            if let Some(slot) = usize::try_from(frame).ok().and_then(|f| self.local_checksums.get_mut(f)) {
                *slot = Some(checksum);
            }
            if self.is_authority() {
                events.push(NetworkEvent::Confirm {
                    player: self.id,
                    frame,
                    checksum,
                });
            } else {
                self.compare(frame);
            }
        }
        Ok(events)
    }

    fn compare(&mut self, frame: Frame) {
        let Ok(index) = usize::try_from(frame) else {
            return;
        };
        if let (Some(Some(local)), Some(Some(authority))) =
            (self.local_checksums.get(index), self.authority_checksums.get(index))
        {
            if local == authority {
                self.matches += 1;
            } else {
                self.desyncs += 1;
                log::error!(
                    "Desync on frame {}: peer {} has {:08x}, authority has {:08x}",
                    frame,
                    self.id,
                    local,
                    authority
                );
            }
        }
    }
}

fn frame_of(tick: usize) -> Result<Frame, SessionError> {
    Frame::try_from(tick).map_err(|_| SessionError::FrameOverflow(tick))
}

/// Scripted button runs: each run holds random buttons for
/// `1..=max_hold_frames` frames
fn script_inputs(rng: &mut StdRng, frames: usize, max_hold_frames: u32) -> Vec<InputFlags> {
    let mut script = Vec::with_capacity(frames);
    while script.len() < frames {
        let buttons = InputFlags::from_bits_truncate(rng.gen::<u8>());
        let hold = rng.gen_range(1..=max_hold_frames) as usize;
        script.extend(std::iter::repeat(buttons).take(hold.min(frames - script.len())));
    }
    script
}

/// Two rollback peers joined by a delaying link
#[derive(Debug)]
pub struct LoopbackSession {
    peers: [Peer; 2],
    link: Link,
    frames: usize,
    window: usize,
}

impl LoopbackSession {
    /// Build both peers from a validated configuration
    pub fn new(config: &DuelConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let session = &config.session;
        let mut rng = StdRng::seed_from_u64(session.seed);

        let mut make_peer = |id: PlayerId| -> Result<Peer, SessionError> {
            let game = DuelGame::new(config)?;
            Ok(Peer {
                id,
                manager: RollbackManager::new(config.engine.rollback.clone(), game)?,
                script: script_inputs(&mut rng, session.frames, session.max_hold_frames),
                local_checksums: vec![None; session.frames],
                authority_checksums: vec![None; session.frames],
                matches: 0,
                desyncs: 0,
            })
        };
        let peers = [make_peer(0)?, make_peer(1)?];

        Ok(Self {
            peers,
            link: Link::new(session),
            frames: session.frames,
            window: session.max_delay_frames as usize + 1,
        })
    }

    /// Play every frame, then deliver what is still in flight
    pub fn run(mut self) -> Result<SessionReport, SessionError> {
        log::info!(
            "Starting loopback session: {} frames, up to {} frames of delay",
            self.frames,
            self.window - 1
        );
        for tick in 0..self.frames {
            self.tick(tick)?;
        }
        self.drain()?;
        Ok(self.report())
    }

    fn tick(&mut self, tick: usize) -> Result<(), SessionError> {
        let frame = frame_of(tick)?;
        for peer in &mut self.peers {
            let input = FrameInput::new(frame, peer.script[tick]);
            peer.manager.set_local_player_input(input, peer.id)?;
        }
        for (index, peer) in self.peers.iter().enumerate() {
            let packet = peer.input_packet(tick, self.window)?;
            self.link.send(tick, 1 - index, packet);
        }

        self.deliver(Some(tick))?;
        self.confirm(tick)?;
        for peer in &mut self.peers {
            peer.manager.advance_current_frame()?;
        }
        Ok(())
    }

    fn deliver(&mut self, now: Option<usize>) -> Result<[bool; 2], SessionError> {
        let mut replayed = [false; 2];
        for packet in self.link.take_due(now) {
            replayed[packet.to] |= self.peers[packet.to].receive(&packet.bytes)?;
        }
        Ok(replayed)
    }

    fn confirm(&mut self, now: usize) -> Result<(), SessionError> {
        for index in 0..self.peers.len() {
            let events = self.peers[index].confirm_ready_frames()?;
            if !events.is_empty() {
                self.link.send(now, 1 - index, encode_batch(&events));
            }
        }
        Ok(())
    }

    /// Flush the link until every frame is confirmed on both peers
    fn drain(&mut self) -> Result<(), SessionError> {
        let mut now = self.frames;
        while !self.link.is_empty() {
            let replayed = self.deliver(None)?;
            for (peer, replayed) in self.peers.iter_mut().zip(replayed) {
                // A replay stops short of the newest frame
                if replayed {
                    peer.manager.advance_current_frame()?;
                }
            }
            self.confirm(now)?;
            now += 1;
        }
        log::debug!("Link drained after {} extra ticks", now - self.frames);
        Ok(())
    }

    fn report(&self) -> SessionReport {
        let [authority, follower] = &self.peers;
        SessionReport {
            frames: self.frames,
            rollbacks: [authority.manager.rollback_count(), follower.manager.rollback_count()],
            confirmed_frames: [authority.manager.confirmed_frame(), follower.manager.confirmed_frame()],
            checksum_matches: follower.matches,
            desyncs: follower.desyncs,
            confirmed_checksums: [
                authority.manager.confirmed().compute_checksum(),
                follower.manager.confirmed().compute_checksum(),
            ],
            live_checksums: [
                authority.manager.live().compute_checksum(),
                follower.manager.live().compute_checksum(),
            ],
            scores: [
                authority.manager.confirmed().player(0).score,
                authority.manager.confirmed().player(1).score,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(frames: usize, max_delay_frames: u32, seed: u64) -> DuelConfig {
        let mut config = DuelConfig::default();
        config.session.frames = frames;
        config.session.max_delay_frames = max_delay_frames;
        config.session.seed = seed;
        config
    }

    #[test]
    fn test_peers_agree_on_every_frame() {
        let report = LoopbackSession::new(&config(240, 4, 7)).unwrap().run().unwrap();

        assert_eq!(report.desyncs, 0);
        assert_eq!(report.checksum_matches, 240);
        assert_eq!(report.confirmed_frames, [239, 239]);
        assert!(report.is_consistent());
        assert!(report.rollbacks.iter().all(|&count| count > 0));
    }

    #[test]
    fn test_zero_delay_link_still_agrees() {
        let report = LoopbackSession::new(&config(120, 0, 3)).unwrap().run().unwrap();
        assert_eq!(report.checksum_matches, 120);
        assert!(report.is_consistent());
    }

    #[test]
    fn test_same_seed_same_report() {
        let first = LoopbackSession::new(&config(180, 6, 42)).unwrap().run().unwrap();
        let second = LoopbackSession::new(&config(180, 6, 42)).unwrap().run().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut bad = config(60, 2, 1);
        bad.engine.rollback.max_players = 3;
        assert!(matches!(LoopbackSession::new(&bad), Err(SessionError::Config(_))));
    }

    #[test]
    fn test_reordered_packets_arrive_in_order_of_due_time() {
        let mut link = Link::new(&SessionConfig {
            max_delay_frames: 0,
            ..SessionConfig::default()
        });
        link.send(3, 1, vec![3]);
        link.send(1, 0, vec![1]);
        link.send(2, 1, vec![2]);

        let due: Vec<_> = link.take_due(Some(2)).into_iter().map(|p| p.bytes[0]).collect();
        assert_eq!(due, vec![1, 2]);
        assert!(!link.is_empty());
        assert_eq!(link.take_due(None).len(), 1);
        assert!(link.is_empty());
    }

    #[test]
    fn test_script_respects_frame_count() {
        let mut rng = StdRng::seed_from_u64(9);
        let script = script_inputs(&mut rng, 50, 8);
        assert_eq!(script.len(), 50);
    }
}
