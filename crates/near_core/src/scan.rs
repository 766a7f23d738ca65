//! Nearby player scan.
//!
//! Filters a world's players down to the ones a viewer may be told about.
//! Results keep the order the host enumerated the players in; they are not
//! re-sorted by distance, so the numbering a viewer sees matches the host's
//! player list.

use std::sync::Arc;

use tracing::debug;

use crate::direction;
use crate::error::{NearResult, PolicyRejection};
use crate::host::{Permissions, Presence};
use crate::permissions::BYPASS_VANISH;
use crate::settings::NearSettings;
use crate::types::{PlayerId, PlayerSnapshot};

/// One nearby player as shown to the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: PlayerId,
    pub name: String,
    /// Distance rounded to the nearest block
    pub distance: i64,
    pub direction: String,
}

pub struct ProximityScan {
    presence: Arc<dyn Presence>,
    permissions: Arc<dyn Permissions>,
}

impl ProximityScan {
    pub fn new(presence: Arc<dyn Presence>, permissions: Arc<dyn Permissions>) -> Self {
        Self {
            presence,
            permissions,
        }
    }

    /// Candidates among `world_players` within `radius` of `viewer`.
    ///
    /// When the max-players cap is enabled and exceeded the whole result is
    /// rejected rather than truncated.
    pub fn scan(
        &self,
        viewer: &PlayerSnapshot,
        radius: f64,
        world_players: &[PlayerSnapshot],
        settings: &NearSettings,
    ) -> NearResult<Vec<Candidate>> {
        let hide_vanished = settings.hide_vanished.enabled
            && !self.permissions.has_permission(viewer.id, BYPASS_VANISH);
        let ignored = settings
            .ignored_players
            .enabled
            .then_some(&settings.ignored_players.players);

        let candidates: Vec<Candidate> = world_players
            .iter()
            .filter(|target| target.id != viewer.id)
            .filter_map(|target| {
                let distance = viewer.location.distance(&target.location)?;
                (distance <= radius).then_some((target, distance))
            })
            .filter(|(target, _)| !(hide_vanished && self.is_vanished(viewer, target)))
            .filter(|(target, _)| !ignored.is_some_and(|names| names.contains(&target.name)))
            .map(|(target, distance)| Candidate {
                id: target.id,
                name: target.name.clone(),
                distance: distance.round() as i64,
                direction: direction::label_between(
                    &viewer.location,
                    &target.location,
                    &settings.directions,
                )
                .to_string(),
            })
            .collect();

        if settings.max_players.enabled && candidates.len() > settings.max_players.max as usize {
            debug!(
                "Scan for {} found {} players, over the cap of {}",
                viewer.name,
                candidates.len(),
                settings.max_players.max
            );
            return Err(PolicyRejection::TooManyCandidates {
                max: settings.max_players.max,
            }
            .into());
        }

        Ok(candidates)
    }

    fn is_vanished(&self, viewer: &PlayerSnapshot, target: &PlayerSnapshot) -> bool {
        target.invisible || !self.presence.can_see(viewer.id, target.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NearError;
    use crate::host::memory::InMemoryWorld;
    use crate::types::{Location, Position};

    fn at(x: f64, z: f64) -> Location {
        Location::new("world", Position::new(x, 64.0, z), 0.0)
    }

    fn setup() -> (Arc<InMemoryWorld>, ProximityScan, NearSettings) {
        let world = Arc::new(InMemoryWorld::new());
        let scan = ProximityScan::new(world.clone(), world.clone());
        (world, scan, NearSettings::default())
    }

    fn run(
        world: &InMemoryWorld,
        scan: &ProximityScan,
        viewer: PlayerId,
        radius: f64,
        settings: &NearSettings,
    ) -> NearResult<Vec<Candidate>> {
        let me = world.player(viewer).unwrap();
        let players = world.players_in_world(&me.location.world);
        scan.scan(&me, radius, &players, settings)
    }

    fn names(result: NearResult<Vec<Candidate>>) -> Vec<String> {
        result.unwrap().into_iter().map(|c| c.name).collect()
    }

    #[test]
    fn returns_everyone_in_range_except_self_in_enumeration_order() {
        let (world, scan, settings) = setup();
        world.join("Far", at(40.0, 0.0));
        let viewer = world.join("Me", at(0.0, 0.0));
        world.join("Edge", at(0.0, 30.0));
        world.join("Near", at(3.0, 4.0));
        world.join("Outside", at(30.1, 0.0));

        assert_eq!(
            names(run(&world, &scan, viewer, 30.0, &settings)),
            vec!["Edge", "Near"]
        );
    }

    #[test]
    fn distance_is_rounded_and_direction_labelled() {
        let (world, scan, settings) = setup();
        let viewer = world.join("Me", at(0.0, 0.0));
        world.join("Right", at(-12.6, 0.0));

        let candidates = run(&world, &scan, viewer, 50.0, &settings).unwrap();
        assert_eq!(candidates[0].distance, 13);
        assert_eq!(candidates[0].direction, settings.directions.east);
    }

    #[test]
    fn other_worlds_are_never_candidates() {
        let (world, scan, settings) = setup();
        let viewer = world.join("Me", at(0.0, 0.0));
        let other = world.join("Nether", Location::new("world_nether", Position::default(), 0.0));
        let me = world.player(viewer).unwrap();
        let everyone = world.online_players();
        let result = scan.scan(&me, 1000.0, &everyone, &settings).unwrap();
        assert!(result.iter().all(|c| c.id != other));
    }

    #[test]
    fn ignore_list_applies_only_when_enabled() {
        let (world, scan, mut settings) = setup();
        let viewer = world.join("Me", at(0.0, 0.0));
        world.join("Staff", at(1.0, 0.0));
        world.join("Guest", at(2.0, 0.0));
        settings.ignored_players.players = vec!["Staff".into()];

        assert_eq!(names(run(&world, &scan, viewer, 10.0, &settings)), vec!["Guest"]);

        settings.ignored_players.enabled = false;
        assert_eq!(
            names(run(&world, &scan, viewer, 10.0, &settings)),
            vec!["Staff", "Guest"]
        );
    }

    #[test]
    fn vanished_and_invisible_targets_hidden_without_bypass() {
        let (world, scan, mut settings) = setup();
        let viewer = world.join("Me", at(0.0, 0.0));
        let ghost = world.join("Ghost", at(1.0, 0.0));
        let potion = world.join("Potion", at(2.0, 0.0));
        world.join("Plain", at(3.0, 0.0));
        world.hide_from(viewer, ghost);
        world.set_invisible(potion, true);

        assert_eq!(names(run(&world, &scan, viewer, 10.0, &settings)), vec!["Plain"]);

        world.grant(viewer, BYPASS_VANISH);
        assert_eq!(
            names(run(&world, &scan, viewer, 10.0, &settings)),
            vec!["Ghost", "Potion", "Plain"]
        );

        world.revoke(viewer, BYPASS_VANISH);
        settings.hide_vanished.enabled = false;
        assert_eq!(run(&world, &scan, viewer, 10.0, &settings).unwrap().len(), 3);
    }

    #[test]
    fn cap_rejects_instead_of_truncating() {
        let (world, scan, mut settings) = setup();
        let viewer = world.join("Me", at(0.0, 0.0));
        for i in 0..3 {
            world.join(format!("P{i}"), at(i as f64, 1.0));
        }
        settings.max_players.max = 3;
        assert_eq!(run(&world, &scan, viewer, 10.0, &settings).unwrap().len(), 3);

        settings.max_players.max = 2;
        assert_eq!(
            run(&world, &scan, viewer, 10.0, &settings),
            Err(NearError::PolicyRejected(PolicyRejection::TooManyCandidates { max: 2 }))
        );

        settings.max_players.enabled = false;
        assert_eq!(run(&world, &scan, viewer, 10.0, &settings).unwrap().len(), 3);
    }

    #[test]
    fn empty_world_is_not_an_error() {
        let (world, scan, settings) = setup();
        let viewer = world.join("Me", at(0.0, 0.0));
        assert!(run(&world, &scan, viewer, 10.0, &settings).unwrap().is_empty());
    }
}
