//! Rollback manager
//!
//! Keeps two copies of the game simulation:
//!
//! - the **live** copy, run ahead of the network with predicted inputs for
//!   the remote players;
//! - the **confirmed** copy, advanced one frame at a time once every player's
//!   real input for that frame is known.
//!
//! Remote inputs that contradict a prediction trigger a full replay: the live
//! copy is reset to the confirmed copy and every frame up to the local tip is
//! simulated again from the stored input history.
//!
//! # Frame cursors
//!
//! | cursor | starts at | meaning |
//! |--------|-----------|---------|
//! | `current_frame` | -1 | newest frame the local player has input for |
//! | `confirmed_frame` | -1 | newest frame stepped on the confirmed copy |
//! | `frame_to_confirm` | 0 | next frame [`RollbackManager::confirm_frame`] steps |
//! | `last_remote_input_frame` | -1 | newest frame received from a remote player |
//!
//! Cursors only move forward.

use crate::core::config::RollbackConfig;
use crate::foundation::time::Stopwatch;
use super::checksum::Checksum;
use super::error::{RollbackError, RollbackResult};
use super::input::{Frame, FrameInput, InputFlags, NO_FRAME};

/// Player index within a session
pub type PlayerId = u8;

/// Game logic driven by the rollback manager
///
/// Implementations must be deterministic: the same sequence of calls on
/// equal values must produce equal values and equal checksums.
pub trait GameSimulation: Clone {
    /// Become a copy of the confirmed simulation
    fn rollback(&mut self, confirmed: &Self) {
        self.clone_from(confirmed);
    }

    /// Input `player` holds during the next [`update_gameplay`](Self::update_gameplay)
    fn set_player_input(&mut self, input: FrameInput, player: PlayerId);

    /// Advance the simulation by one frame
    fn update_gameplay(&mut self);

    /// Checksum of the current state
    fn compute_checksum(&self) -> Checksum;
}

/// Frame-indexed input history with live and confirmed simulations
#[derive(Debug, Clone)]
pub struct RollbackManager<G> {
    config: RollbackConfig,
    live: G,
    confirmed: G,
    inputs: Vec<Vec<FrameInput>>,
    last_inputs: Vec<FrameInput>,
    current_frame: Frame,
    confirmed_frame: Frame,
    frame_to_confirm: Frame,
    last_remote_input_frame: Frame,
    rollback_count: u64,
}

impl<G: GameSimulation> RollbackManager<G> {
    /// Create a manager and register `game` as the starting state
    pub fn new(config: RollbackConfig, game: G) -> RollbackResult<Self> {
        config.validate()?;
        let history = Self::empty_history(&config);
        let mut manager = Self {
            inputs: vec![history; config.max_players],
            last_inputs: vec![FrameInput::default(); config.max_players],
            live: game.clone(),
            confirmed: game.clone(),
            current_frame: NO_FRAME,
            confirmed_frame: NO_FRAME,
            frame_to_confirm: 0,
            last_remote_input_frame: NO_FRAME,
            rollback_count: 0,
            config,
        };
        manager.register_game_manager(game);
        Ok(manager)
    }

    fn empty_history(config: &RollbackConfig) -> Vec<FrameInput> {
        (0..config.max_frames)
            .map(|frame| FrameInput::new(frame as Frame, InputFlags::empty()))
            .collect()
    }

    /// Use `game` as the starting state of both simulations and reset the cursors
    pub fn register_game_manager(&mut self, game: G) {
        self.confirmed = game.clone();
        self.live = game;
        let history = Self::empty_history(&self.config);
        for player_history in &mut self.inputs {
            player_history.clone_from(&history);
        }
        self.last_inputs.fill(FrameInput::default());
        self.current_frame = NO_FRAME;
        self.confirmed_frame = NO_FRAME;
        self.frame_to_confirm = 0;
        self.last_remote_input_frame = NO_FRAME;
        self.rollback_count = 0;
        log::debug!(
            "Registered game simulation: {} players, {} frames of history",
            self.config.max_players,
            self.config.max_frames
        );
    }

    fn check_player(&self, player: PlayerId) -> RollbackResult<usize> {
        let index = usize::from(player);
        if index < self.config.max_players {
            Ok(index)
        } else {
            Err(RollbackError::UnknownPlayer {
                player,
                max_players: self.config.max_players,
            })
        }
    }

    fn check_frame(&self, frame: impl Into<i32>) -> RollbackResult<usize> {
        let frame = frame.into();
        match usize::try_from(frame) {
            Ok(index) if index < self.config.max_frames => Ok(index),
            _ => Err(RollbackError::frame_out_of_range(frame, self.config.max_frames)),
        }
    }

    /// Record the local player's input and move `current_frame` up to it
    ///
    /// Frames newly covered by `current_frame` get a predicted entry for every
    /// other player whose real input has not arrived yet, repeating that
    /// player's last known input. Frames the local player skipped repeat the
    /// local player's previous input.
    pub fn set_local_player_input(&mut self, input: FrameInput, player: PlayerId) -> RollbackResult<()> {
        let local = self.check_player(player)?;
        let index = self.check_frame(input.frame)?;

        if input.frame > self.current_frame {
            for frame in i32::from(self.current_frame) + 1..=i32::from(input.frame) {
                let slot = frame as usize;
                for (other, history) in self.inputs.iter_mut().enumerate() {
                    let predict = if other == local {
                        slot < index
                    } else {
                        frame > i32::from(self.last_remote_input_frame)
                    };
                    if predict {
                        history[slot] = self.last_inputs[other].repeated_at(frame as Frame);
                    }
                }
            }
            self.current_frame = input.frame;
        }

        self.inputs[local][index] = input;
        self.last_inputs[local] = input;
        Ok(())
    }

    /// Merge a batch of remote inputs for `player`
    ///
    /// Frames up to the newest one in the batch are overwritten with the real
    /// inputs; later frames up to `current_frame` are predicted from the
    /// newest one. Any real input that differs from what was stored, or the
    /// very first remote batch, makes the live simulation replay from the
    /// confirmed state. Returns whether that replay happened.
    pub fn set_remote_player_input(&mut self, new_inputs: &[FrameInput], player: PlayerId) -> RollbackResult<bool> {
        let remote = self.check_player(player)?;
        let Some(newest) = new_inputs.iter().map(|input| input.frame).max() else {
            return Err(RollbackError::EmptyInputBatch(player));
        };
        self.check_frame(newest)?;

        let frame_diff = i32::from(newest) - i32::from(self.last_remote_input_frame);
        if frame_diff < 1 {
            return Ok(false);
        }

        let mut must_rollback = self.last_remote_input_frame == NO_FRAME;
        let mut latest = self.last_inputs[remote];
        for frame in i32::from(self.last_remote_input_frame) + 1..=i32::from(newest) {
            let frame = frame as Frame;
            // A frame missing from the batch keeps repeating the one before it
            let incoming = new_inputs
                .iter()
                .copied()
                .find(|input| input.frame == frame)
                .unwrap_or_else(|| latest.repeated_at(frame));
            let slot = &mut self.inputs[remote][frame as usize];
            if *slot != incoming {
                must_rollback = true;
            }
            *slot = incoming;
            latest = incoming;
        }

        for frame in i32::from(newest) + 1..=i32::from(self.current_frame) {
            self.inputs[remote][frame as usize] = latest.repeated_at(frame as Frame);
        }

        self.last_inputs[remote] = latest;
        self.last_remote_input_frame = newest;

        if must_rollback {
            self.simulate_until_current_frame();
        }
        Ok(must_rollback)
    }

    /// Reset the live simulation to the confirmed one and replay every frame
    /// after `confirmed_frame` and before `current_frame`
    pub fn simulate_until_current_frame(&mut self) {
        let stopwatch = Stopwatch::start_new();
        self.live.rollback(&self.confirmed);

        let first = i32::from(self.confirmed_frame) + 1;
        let end = i32::from(self.current_frame);
        for frame in first..end {
            self.step_live(frame as usize);
        }

        self.rollback_count += 1;
        log::debug!(
            "Rollback replayed frames {}..{} in {:.3} ms",
            first,
            end,
            stopwatch.elapsed_millis()
        );
    }

    /// Step the live simulation with the stored inputs of `current_frame`
    pub fn advance_current_frame(&mut self) -> RollbackResult<()> {
        let index = self.check_frame(self.current_frame)?;
        self.step_live(index);
        Ok(())
    }

    fn step_live(&mut self, index: usize) {
        for (player, history) in self.inputs.iter().enumerate() {
            self.live.set_player_input(history[index], player as PlayerId);
        }
        self.live.update_gameplay();
    }

    /// Whether every player's real input for `frame_to_confirm` has arrived
    pub fn is_frame_confirmable(&self) -> bool {
        self.frame_to_confirm <= self.current_frame && self.frame_to_confirm <= self.last_remote_input_frame
    }

    /// Step the confirmed simulation with the stored inputs of
    /// `frame_to_confirm` and return the checksum of the result
    ///
    /// Moves `confirmed_frame` and `frame_to_confirm` forward by one. Fails
    /// without touching either cursor when `frame_to_confirm` is past
    /// `current_frame`.
    pub fn confirm_frame(&mut self) -> RollbackResult<Checksum> {
        if self.frame_to_confirm > self.current_frame {
            return Err(RollbackError::FrameNotReached {
                frame: self.frame_to_confirm,
                current_frame: self.current_frame,
            });
        }
        let index = self.check_frame(self.frame_to_confirm)?;
        for (player, history) in self.inputs.iter().enumerate() {
            self.confirmed.set_player_input(history[index], player as PlayerId);
        }
        self.confirmed.update_gameplay();
        let checksum = self.confirmed.compute_checksum();

        log::trace!("Confirmed frame {} with checksum {:08x}", self.frame_to_confirm, checksum);
        self.confirmed_frame += 1;
        self.frame_to_confirm += 1;
        Ok(checksum)
    }

    /// Newest frame the local player has input for
    pub fn current_frame(&self) -> Frame {
        self.current_frame
    }

    /// Newest frame stepped on the confirmed simulation
    pub fn confirmed_frame(&self) -> Frame {
        self.confirmed_frame
    }

    /// Next frame [`confirm_frame`](Self::confirm_frame) will step
    pub fn frame_to_confirm(&self) -> Frame {
        self.frame_to_confirm
    }

    /// Newest frame received from a remote player
    pub fn last_remote_input_frame(&self) -> Frame {
        self.last_remote_input_frame
    }

    /// Stored (real or predicted) input of `player` at `frame`
    pub fn input_at(&self, frame: Frame, player: PlayerId) -> RollbackResult<FrameInput> {
        let player = self.check_player(player)?;
        let frame = self.check_frame(frame)?;
        Ok(self.inputs[player][frame])
    }

    /// Last input recorded for `player`
    pub fn last_known_input(&self, player: PlayerId) -> RollbackResult<FrameInput> {
        let player = self.check_player(player)?;
        Ok(self.last_inputs[player])
    }

    /// Number of replays run so far
    pub fn rollback_count(&self) -> u64 {
        self.rollback_count
    }

    /// Session bounds
    pub fn config(&self) -> &RollbackConfig {
        &self.config
    }

    /// The simulation run ahead with predicted inputs
    pub fn live(&self) -> &G {
        &self.live
    }

    /// The simulation advanced only with confirmed inputs
    pub fn confirmed(&self) -> &G {
        &self.confirmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::MAX_HISTORY_FRAMES;

    /// Sums every input it sees, weighted by frame count, so any change to
    /// the input sequence changes the state
    #[derive(Debug, Clone, Default, PartialEq)]
    struct Counter {
        frame: u32,
        held: [u8; 2],
        total: u64,
        rollbacks: u32,
    }

    impl GameSimulation for Counter {
        fn rollback(&mut self, confirmed: &Self) {
            let rollbacks = self.rollbacks + 1;
            self.clone_from(confirmed);
            self.rollbacks = rollbacks;
        }

        fn set_player_input(&mut self, input: FrameInput, player: PlayerId) {
            self.held[usize::from(player)] = input.input.bits();
        }

        fn update_gameplay(&mut self) {
            self.frame += 1;
            self.total = self
                .total
                .wrapping_mul(31)
                .wrapping_add(u64::from(self.held[0]) * 7 + u64::from(self.held[1]));
        }

        fn compute_checksum(&self) -> Checksum {
            (self.total ^ (self.total >> 32)) as u32 ^ self.frame
        }
    }

    const LOCAL: PlayerId = 0;
    const REMOTE: PlayerId = 1;

    fn manager() -> RollbackManager<Counter> {
        RollbackManager::new(RollbackConfig::new().with_max_frames(64), Counter::default()).unwrap()
    }

    fn input(frame: Frame, flags: InputFlags) -> FrameInput {
        FrameInput::new(frame, flags)
    }

    #[test]
    fn test_initial_cursors() {
        let manager = manager();
        assert_eq!(manager.current_frame(), -1);
        assert_eq!(manager.confirmed_frame(), -1);
        assert_eq!(manager.frame_to_confirm(), 0);
        assert_eq!(manager.last_remote_input_frame(), -1);
        assert!(!manager.is_frame_confirmable());
    }

    #[test]
    fn test_local_input_predicts_remote_by_repetition() {
        let mut manager = manager();
        manager.set_remote_player_input(&[input(0, InputFlags::LEFT)], REMOTE).unwrap();
        for frame in 0..4 {
            manager.set_local_player_input(input(frame, InputFlags::empty()), LOCAL).unwrap();
        }

        assert_eq!(manager.current_frame(), 3);
        for frame in 1..4 {
            assert_eq!(manager.input_at(frame, REMOTE).unwrap(), input(frame, InputFlags::LEFT));
        }
    }

    #[test]
    fn test_misprediction_triggers_replay_from_confirmed() {
        let mut manager = manager();
        manager.set_remote_player_input(&[input(0, InputFlags::empty())], REMOTE).unwrap();
        for frame in 0..8 {
            manager.set_local_player_input(input(frame, InputFlags::JUMP), LOCAL).unwrap();
            manager.advance_current_frame().unwrap();
        }
        manager.confirm_frame().unwrap();
        let before = manager.rollback_count();

        // Frames 1..=4 match the prediction; frame 5 does not
        let batch: Vec<FrameInput> = (1..=5)
            .map(|frame| input(frame, if frame == 5 { InputFlags::RIGHT } else { InputFlags::empty() }))
            .collect();
        let replayed = manager.set_remote_player_input(&batch, REMOTE).unwrap();

        assert!(replayed);
        assert_eq!(manager.rollback_count(), before + 1);
        assert_eq!(manager.live().rollbacks, 2);
        // Replay covers confirmed_frame + 1 .. current_frame
        assert_eq!(manager.live().frame, 7);
        for frame in 6..8 {
            assert_eq!(manager.input_at(frame, REMOTE).unwrap(), input(frame, InputFlags::RIGHT));
        }
    }

    #[test]
    fn test_matching_remote_input_does_not_replay() {
        let mut manager = manager();
        manager.set_remote_player_input(&[input(0, InputFlags::empty())], REMOTE).unwrap();
        for frame in 0..4 {
            manager.set_local_player_input(input(frame, InputFlags::JUMP), LOCAL).unwrap();
        }
        let before = manager.rollback_count();

        let batch = [input(1, InputFlags::empty()), input(2, InputFlags::empty())];
        assert!(!manager.set_remote_player_input(&batch, REMOTE).unwrap());
        assert_eq!(manager.rollback_count(), before);
        assert_eq!(manager.last_remote_input_frame(), 2);

        // Old news changes nothing
        assert!(!manager.set_remote_player_input(&batch, REMOTE).unwrap());
        assert_eq!(manager.last_remote_input_frame(), 2);
    }

    #[test]
    fn test_first_remote_batch_always_replays() {
        let mut manager = manager();
        assert!(manager.set_remote_player_input(&[input(0, InputFlags::empty())], REMOTE).unwrap());
    }

    #[test]
    fn test_confirm_frame_advances_by_one() {
        let mut manager = manager();
        for frame in 0..5 {
            manager.set_local_player_input(input(frame, InputFlags::ATTACK), LOCAL).unwrap();
            manager.set_remote_player_input(&[input(frame, InputFlags::LEFT)], REMOTE).unwrap();
        }

        for expected in 0..5 {
            assert!(manager.is_frame_confirmable());
            assert_eq!(manager.frame_to_confirm(), expected);
            manager.confirm_frame().unwrap();
            assert_eq!(manager.confirmed_frame(), expected);
            assert_eq!(manager.frame_to_confirm(), expected + 1);
        }
        assert!(!manager.is_frame_confirmable());
        assert!(manager.confirmed_frame() <= manager.current_frame());
    }

    #[test]
    fn test_identical_histories_give_identical_checksums() {
        let run = || {
            let mut manager = manager();
            let mut checksums = Vec::new();
            for frame in 0..20 {
                let local = if frame % 3 == 0 { InputFlags::JUMP } else { InputFlags::RIGHT };
                let remote = if frame % 4 == 0 { InputFlags::LEFT } else { InputFlags::empty() };
                manager.set_local_player_input(input(frame, local), LOCAL).unwrap();
                manager.set_remote_player_input(&[input(frame, remote)], REMOTE).unwrap();
                manager.advance_current_frame().unwrap();
                checksums.push(manager.confirm_frame().unwrap());
            }
            checksums
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_replayed_live_state_matches_confirmed_state() {
        let mut manager = manager();
        for frame in 0..6 {
            manager.set_local_player_input(input(frame, InputFlags::JUMP), LOCAL).unwrap();
            manager.advance_current_frame().unwrap();
        }
        // Remote catches up with inputs the prediction got wrong
        let batch: Vec<FrameInput> = (0..6).map(|frame| input(frame, InputFlags::RIGHT)).collect();
        manager.set_remote_player_input(&batch, REMOTE).unwrap();
        manager.advance_current_frame().unwrap();

        for _ in 0..6 {
            manager.confirm_frame().unwrap();
        }
        assert_eq!(manager.live().total, manager.confirmed().total);
        assert_eq!(manager.live().frame, manager.confirmed().frame);
    }

    #[test]
    fn test_confirm_stops_at_current_frame() {
        let mut manager = manager();
        assert!(matches!(
            manager.confirm_frame(),
            Err(RollbackError::FrameNotReached { frame: 0, current_frame: -1 })
        ));
        assert_eq!(manager.confirmed_frame(), -1);
        assert_eq!(manager.frame_to_confirm(), 0);

        manager.set_local_player_input(input(0, InputFlags::JUMP), LOCAL).unwrap();
        manager.confirm_frame().unwrap();
        assert!(manager.confirm_frame().is_err());
        assert_eq!(manager.confirmed_frame(), 0);
        assert!(manager.confirmed_frame() <= manager.current_frame());
    }

    #[test]
    fn test_confirming_the_last_history_frame_keeps_cursors_in_range() {
        let config = RollbackConfig::new().with_max_frames(MAX_HISTORY_FRAMES);
        let mut manager = RollbackManager::new(config, Counter::default()).unwrap();
        let last = (MAX_HISTORY_FRAMES - 1) as Frame;
        manager.set_local_player_input(input(last, InputFlags::JUMP), LOCAL).unwrap();
        manager.set_remote_player_input(&[input(last, InputFlags::LEFT)], REMOTE).unwrap();

        while manager.is_frame_confirmable() {
            manager.confirm_frame().unwrap();
        }
        assert_eq!(manager.confirmed_frame(), last);
        assert_eq!(manager.frame_to_confirm(), Frame::MAX);
        assert!(manager.confirm_frame().is_err());
        assert_eq!(manager.frame_to_confirm(), Frame::MAX);
    }

    #[test]
    fn test_bad_player_and_frame_are_errors() {
        let mut manager = manager();
        assert!(matches!(
            manager.set_local_player_input(input(0, InputFlags::JUMP), 5),
            Err(RollbackError::UnknownPlayer { player: 5, .. })
        ));
        assert!(matches!(
            manager.set_local_player_input(input(64, InputFlags::JUMP), LOCAL),
            Err(RollbackError::FrameOutOfRange { frame: 64, .. })
        ));
        assert!(matches!(
            manager.set_remote_player_input(&[], REMOTE),
            Err(RollbackError::EmptyInputBatch(REMOTE))
        ));
        assert!(manager.advance_current_frame().is_err());
    }
}
