//! Duel game rules
//!
//! Two circle players in a walled arena with a trigger zone floating above
//! the middle of the floor. Players run with LEFT/RIGHT, jump with JUMP when
//! standing on the floor and score one point per frame spent in the zone.
//! ATTACK presses are counted. A player that falls out of the arena respawns.

use rollback_engine::physics::{
    Body, BodyHandle, BodyType, ColliderHandle, ColliderShape, PhysicsError, World,
};
use rollback_engine::foundation::math::Vec2;
use rollback_engine::rollback::{Checksum, FrameInput, GameSimulation, InputFlags, PlayerId, StateHasher};

use crate::config::{DuelConfig, GameplayConfig};
use crate::contacts::DuelContacts;

/// Per-player game state
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    /// Physics body
    pub body: BodyHandle,
    /// Circle collider
    pub collider: ColliderHandle,
    /// Respawn position
    pub spawn: Vec2,
    /// Frames spent in the zone
    pub score: u32,
    /// ATTACK presses
    pub attacks: u32,
    /// Times fallen out of the arena
    pub falls: u32,
}

/// Complete state of one duel
#[derive(Debug, Clone)]
pub struct DuelGame {
    world: World<DuelContacts>,
    players: [Player; 2],
    held: [InputFlags; 2],
    frame: u32,
    rules: GameplayConfig,
}

impl DuelGame {
    /// Build the arena
    pub fn new(config: &DuelConfig) -> Result<Self, PhysicsError> {
        let rules = config.gameplay.clone();
        let mut world: World<DuelContacts> = World::new(config.engine.physics.clone())?;

        let half_width = rules.arena_width * 0.5;
        let floor_body = world.create_body_with(
            Body::new()
                .with_type(BodyType::Static)
                .with_position(Vec2::new(0.0, -0.5)),
        )?;
        let floor = world.create_collider(floor_body, ColliderShape::rectangle(Vec2::new(rules.arena_width, 1.0)))?;

        for side in [-1.0, 1.0] {
            let wall = world.create_body_with(
                Body::new()
                    .with_type(BodyType::Static)
                    .with_position(Vec2::new(side * (half_width + 0.5), rules.arena_height * 0.5)),
            )?;
            world.create_collider(wall, ColliderShape::rectangle(Vec2::new(1.0, rules.arena_height)))?;
        }

        let zone_body = world.create_body_with(
            Body::new()
                .with_type(BodyType::Static)
                .with_position(Vec2::new(0.0, rules.zone_radius + rules.player_radius)),
        )?;
        let zone = world.create_collider(zone_body, ColliderShape::circle(rules.zone_radius))?;
        world[zone].is_trigger = true;

        let mut spawn_player = |x: f32| -> Result<Player, PhysicsError> {
            let spawn = Vec2::new(x, rules.player_radius * 2.0);
            let body = world.create_body_with(Body::new().with_mass(rules.player_mass).with_position(spawn))?;
            let collider = world.create_collider(body, ColliderShape::circle(rules.player_radius))?;
            world[collider].restitution = rules.player_restitution;
            Ok(Player {
                body,
                collider,
                spawn,
                score: 0,
                attacks: 0,
                falls: 0,
            })
        };
        let players = [spawn_player(-half_width * 0.5)?, spawn_player(half_width * 0.5)?];

        let contacts = DuelContacts::new(
            [world[players[0].collider].id, world[players[1].collider].id],
            world[floor].id,
            world[zone].id,
        );
        world.set_contact_listener(contacts);
        log::debug!("Arena built with {} bodies", world.bodies().count());

        Ok(Self {
            world,
            players,
            held: [InputFlags::empty(); 2],
            frame: 0,
            rules,
        })
    }

    /// Frames simulated so far
    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Player state
    pub fn player(&self, index: usize) -> &Player {
        &self.players[index]
    }

    /// Physics world
    pub fn world(&self) -> &World<DuelContacts> {
        &self.world
    }

    fn contacts(&self) -> Option<&DuelContacts> {
        self.world.contact_listener()
    }

    fn drive_player(&mut self, index: usize) {
        let held = self.held[index];
        let grounded = self.contacts().is_some_and(|contacts| contacts.is_grounded(index));
        let rules = &self.rules;
        let player = &mut self.players[index];
        let Ok(body) = self.world.body_mut(player.body) else {
            return;
        };

        let mut force = Vec2::zeros();
        if held.contains(InputFlags::RIGHT) {
            force.x += rules.move_force;
        }
        if held.contains(InputFlags::LEFT) {
            force.x -= rules.move_force;
        }

        // The floor carries grounded players; contact response only runs on landing
        if grounded {
            body.velocity.y = if held.contains(InputFlags::JUMP) {
                rules.jump_speed
            } else {
                0.0
            };
        } else {
            force.y -= rules.gravity * body.mass;
        }
        body.add_force(force);
        if held.contains(InputFlags::ATTACK) {
            player.attacks += 1;
        }
    }

    fn apply_rules(&mut self) {
        let in_zone = self.contacts().map_or([false; 2], |contacts| contacts.in_zone);
        for (index, player) in self.players.iter_mut().enumerate() {
            if in_zone[index] {
                player.score += 1;
            }
            let Ok(body) = self.world.body_mut(player.body) else {
                continue;
            };
            if body.position.y < self.rules.kill_plane {
                body.set_position(player.spawn);
                body.set_velocity(Vec2::zeros());
                player.falls += 1;
                log::debug!("Player {} fell and respawned on frame {}", index, self.frame);
            }
        }
    }
}

impl GameSimulation for DuelGame {
    fn set_player_input(&mut self, input: FrameInput, player: PlayerId) {
        if let Some(held) = self.held.get_mut(usize::from(player)) {
            *held = input.input;
        }
    }

    fn update_gameplay(&mut self) {
        for index in 0..self.players.len() {
            self.drive_player(index);
        }
        self.world.update(self.rules.time_step);
        self.apply_rules();
        self.frame += 1;
    }

    fn compute_checksum(&self) -> Checksum {
        let mut hasher = StateHasher::new();
        hasher.write_u32(self.frame);
        for (_, body) in self.world.bodies() {
            hasher.write_vec2(body.position);
            hasher.write_vec2(body.velocity);
        }
        for player in &self.players {
            hasher.write_u32(player.score);
            hasher.write_u32(player.attacks);
            hasher.write_u32(player.falls);
        }
        if let Some(contacts) = self.contacts() {
            for index in 0..2 {
                hasher.write_u32(contacts.ground_contacts[index]);
                hasher.write_bool(contacts.in_zone[index]);
            }
            hasher.write_u32(contacts.clashes);
        }
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> DuelGame {
        DuelGame::new(&DuelConfig::default()).unwrap()
    }

    fn run(game: &mut DuelGame, inputs: [InputFlags; 2], frames: u32) {
        for _ in 0..frames {
            game.set_player_input(FrameInput::new(0, inputs[0]), 0);
            game.set_player_input(FrameInput::new(0, inputs[1]), 1);
            game.update_gameplay();
        }
    }

    #[test]
    fn test_players_land_on_the_floor() {
        let mut game = game();
        run(&mut game, [InputFlags::empty(); 2], 60);

        let contacts = game.world().contact_listener().unwrap();
        assert!(contacts.is_grounded(0));
        assert!(contacts.is_grounded(1));
        assert_eq!(game.world()[game.player(0).body].velocity.y, 0.0);
        assert_eq!(game.frame(), 60);
    }

    #[test]
    fn test_attack_presses_are_counted() {
        let mut game = game();
        run(&mut game, [InputFlags::ATTACK, InputFlags::empty()], 10);
        assert_eq!(game.player(0).attacks, 10);
        assert_eq!(game.player(1).attacks, 0);
    }

    #[test]
    fn test_running_right_moves_right() {
        let mut game = game();
        let start = game.world()[game.player(0).body].position.x;
        run(&mut game, [InputFlags::RIGHT, InputFlags::empty()], 30);
        assert!(game.world()[game.player(0).body].position.x > start);
    }

    #[test]
    fn test_same_inputs_same_checksum() {
        let script = |frame: u32| -> [InputFlags; 2] {
            match frame % 40 {
                0..=9 => [InputFlags::RIGHT, InputFlags::LEFT],
                10..=14 => [InputFlags::JUMP | InputFlags::RIGHT, InputFlags::ATTACK],
                15..=29 => [InputFlags::LEFT, InputFlags::JUMP],
                _ => [InputFlags::empty(), InputFlags::RIGHT | InputFlags::JUMP],
            }
        };
        let mut first = game();
        let mut second = game();
        for frame in 0..300 {
            run(&mut first, script(frame), 1);
            run(&mut second, script(frame), 1);
            assert_eq!(first.compute_checksum(), second.compute_checksum());
        }
        assert_ne!(first.compute_checksum(), game().compute_checksum());
    }

    #[test]
    fn test_rollback_restores_state() {
        let mut confirmed = game();
        run(&mut confirmed, [InputFlags::RIGHT, InputFlags::LEFT], 20);
        let mut live = confirmed.clone();
        run(&mut live, [InputFlags::JUMP, InputFlags::ATTACK], 20);
        assert_ne!(live.compute_checksum(), confirmed.compute_checksum());

        live.rollback(&confirmed);
        assert_eq!(live.compute_checksum(), confirmed.compute_checksum());
        assert_eq!(live.frame(), 20);
    }
}
