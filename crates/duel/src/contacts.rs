//! Contact bookkeeping for the duel
//!
//! The listener lives inside the physics world, so it is cloned and rolled
//! back together with the rest of the game state.

use rollback_engine::physics::{Collider, ContactListener};

/// What a collider stands for in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// One of the two players
    Player(usize),
    /// The floor
    Floor,
    /// The scoring zone trigger
    Zone,
    /// Anything else (walls)
    Scenery,
}

/// Contact state the game rules read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuelContacts {
    player_ids: [u32; 2],
    floor_id: u32,
    zone_id: u32,
    /// Floor contacts currently open, per player
    pub ground_contacts: [u32; 2],
    /// Whether each player is inside the zone
    pub in_zone: [bool; 2],
    /// Player-on-player collisions so far
    pub clashes: u32,
}

impl DuelContacts {
    /// Listener for the given collider IDs
    pub fn new(player_ids: [u32; 2], floor_id: u32, zone_id: u32) -> Self {
        Self {
            player_ids,
            floor_id,
            zone_id,
            ..Self::default()
        }
    }

    /// Role of a collider by its ID
    pub fn role(&self, collider: &Collider) -> Role {
        match collider.id {
            id if id == self.player_ids[0] => Role::Player(0),
            id if id == self.player_ids[1] => Role::Player(1),
            id if id == self.floor_id => Role::Floor,
            id if id == self.zone_id => Role::Zone,
            _ => Role::Scenery,
        }
    }

    /// Whether `player` stands on the floor
    pub fn is_grounded(&self, player: usize) -> bool {
        self.ground_contacts[player] > 0
    }

    fn roles(&self, a: &Collider, b: &Collider) -> (Role, Role) {
        (self.role(a), self.role(b))
    }
}

fn player_against(roles: (Role, Role), other: Role) -> Option<usize> {
    match roles {
        (Role::Player(player), role) | (role, Role::Player(player)) if role == other => Some(player),
        _ => None,
    }
}

impl ContactListener for DuelContacts {
    fn on_trigger_enter(&mut self, a: &Collider, b: &Collider) {
        if let Some(player) = player_against(self.roles(a, b), Role::Zone) {
            log::trace!("Player {} entered the zone", player);
            self.in_zone[player] = true;
        }
    }

    fn on_trigger_exit(&mut self, a: &Collider, b: &Collider) {
        if let Some(player) = player_against(self.roles(a, b), Role::Zone) {
            self.in_zone[player] = false;
        }
    }

    fn on_collision_enter(&mut self, a: &Collider, b: &Collider) {
        let roles = self.roles(a, b);
        if let Some(player) = player_against(roles, Role::Floor) {
            self.ground_contacts[player] += 1;
        } else if matches!(roles, (Role::Player(_), Role::Player(_))) {
            self.clashes += 1;
        }
    }

    fn on_collision_exit(&mut self, a: &Collider, b: &Collider) {
        if let Some(player) = player_against(self.roles(a, b), Role::Floor) {
            self.ground_contacts[player] = self.ground_contacts[player].saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collider(id: u32) -> Collider {
        Collider {
            id,
            ..Collider::default()
        }
    }

    #[test]
    fn test_floor_contacts_count_either_order() {
        let mut contacts = DuelContacts::new([2, 3], 0, 1);
        contacts.on_collision_enter(&collider(0), &collider(3));
        assert!(contacts.is_grounded(1));
        assert!(!contacts.is_grounded(0));

        contacts.on_collision_exit(&collider(3), &collider(0));
        assert!(!contacts.is_grounded(1));
        contacts.on_collision_exit(&collider(3), &collider(0));
        assert_eq!(contacts.ground_contacts, [0, 0]);
    }

    #[test]
    fn test_zone_and_clash_tracking() {
        let mut contacts = DuelContacts::new([2, 3], 0, 1);
        contacts.on_trigger_enter(&collider(1), &collider(2));
        assert_eq!(contacts.in_zone, [true, false]);
        contacts.on_trigger_exit(&collider(2), &collider(1));
        assert_eq!(contacts.in_zone, [false, false]);

        contacts.on_collision_enter(&collider(2), &collider(3));
        contacts.on_collision_enter(&collider(2), &collider(7));
        assert_eq!(contacts.clashes, 1);
    }
}
