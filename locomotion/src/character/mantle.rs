/*!
Ledge detection and the mantle blend.

A mantle check casts two probes: a capsule sweep along the movement
direction finds a wall the character cannot walk on, then a sphere sweep
down just past the wall finds a walkable top. If the capsule fits on that
top the mantle starts. While mantling, the actor is blended from where it
started toward the ledge through the asset's position correction curve.
The ledge is kept relative to the component it was found on, so a moving
platform carries the target along.
*/

use log::{debug, trace, warn};

use super::Character;
use crate::anim::AnimationConsumer;
use crate::collision::{CapsuleSpec, CollisionWorld, ComponentId, QueryShape, is_walkable};
use crate::config::MantleTraceSettings;
use crate::constants::{
    LOW_MANTLE_MAX_HEIGHT, MANTLE_CAPSULE_BASE_OFFSET, MANTLE_LEDGE_INSET, MANTLE_TRACE_BACKSTEP,
};
use crate::host::LocomotionHost;
use crate::math::{
    Rotator, Transform, Vec3, capsule_base_location, capsule_has_room, capsule_location_from_base,
    map_range_clamped, mantle_component_local_to_world, tlerp, transform_add, transform_sub,
    world_to_component_local,
};
use crate::net::{MantleStartParams, RemoteCall};
use crate::state::{MantleType, MovementMode, MovementState};

impl<H: LocomotionHost> Character<H> {
    /// Mantle check used by the jump action while grounded.
    pub fn mantle_check_grounded(&mut self) -> bool {
        let settings = self.config.mantle.grounded;
        self.mantle_check(&settings)
    }

    /// Ledge catch while falling.
    pub fn mantle_check_falling(&mut self) -> bool {
        let settings = self.config.mantle.falling;
        self.mantle_check(&settings)
    }

    /// Automatic vault over short obstacles while walking into them.
    ///
    /// Anything up to the max step height is left to the movement component.
    pub fn mantle_check_vault(&mut self) -> bool {
        let mut settings = self.config.mantle.automatic;
        settings.min_ledge_height = self.host.tuning().max_step_height;
        self.mantle_check(&settings)
    }

    fn mantle_direction(&self) -> Vec3 {
        self.direction.movement_direction(
            self.host.rotation(),
            self.state.kinematics.aiming_rotation,
            self.state.input.axes,
        )
    }

    fn mantle_check(&mut self, settings: &MantleTraceSettings) -> bool {
        let capsule = self.host.capsule();
        let location = self.host.location();
        let channel = self.config.world.mantle_check_channel;
        let walkable_floor_z = self.host.tuning().walkable_floor_z;
        let base = capsule_base_location(location, capsule, MANTLE_CAPSULE_BASE_OFFSET);
        let direction = self.mantle_direction();

        // Wall in front that cannot be walked on.
        let mut start = base + direction * -MANTLE_TRACE_BACKSTEP;
        start.z += (settings.max_ledge_height + settings.min_ledge_height) / 2.0;
        let end = start + direction * settings.reach_distance;
        let half_height = 1.0 + (settings.max_ledge_height - settings.min_ledge_height) / 2.0;
        let probe = CapsuleSpec::new(
            settings.forward_trace_radius,
            half_height.max(settings.forward_trace_radius),
        );
        let world = self.host.world();
        let Some(wall) = world.sweep(start, end, QueryShape::Capsule(probe), channel) else {
            return false;
        };
        if !wall.is_valid_blocking_hit() || is_walkable(&wall, walkable_floor_z) {
            trace!("mantle rejected: no wall ({:?})", wall.impact_normal);
            return false;
        }

        // Walkable top just past the wall.
        let mut down_end = wall.impact_point;
        down_end.z = base.z;
        down_end += wall.impact_normal * -MANTLE_LEDGE_INSET;
        let mut down_start = down_end;
        down_start.z += settings.max_ledge_height + settings.downward_trace_radius + 1.0;
        let sphere = QueryShape::Sphere {
            radius: settings.downward_trace_radius,
        };
        let Some(top) = world
            .sweep(down_start, down_end, sphere, channel)
            .filter(|hit| is_walkable(hit, walkable_floor_z))
        else {
            trace!("mantle rejected: no walkable ledge");
            return false;
        };

        let down_location = Vec3::new(top.location.x, top.location.y, top.impact_point.z);
        let target_location =
            capsule_location_from_base(down_location, MANTLE_CAPSULE_BASE_OFFSET, capsule);
        let room_channel = self.config.world.character_channel;
        if !capsule_has_room(world, capsule, target_location, 0.0, 0.0, room_channel) {
            trace!("mantle rejected: no room at {target_location:?}");
            return false;
        }

        let facing = wall.impact_normal.component_mul(&Vec3::new(-1.0, -1.0, 0.0));
        let target = Transform::new(target_location, Rotator::from_direction(facing));
        let height = target_location.z - location.z;

        let mantle_type = if self.state.movement_state == MovementState::Freefall {
            MantleType::FallingCatch
        } else if height > LOW_MANTLE_MAX_HEIGHT {
            MantleType::HighMantle
        } else {
            MantleType::LowMantle
        };
        if !self.policy.can_mantle(mantle_type) {
            trace!("mantle {mantle_type:?} vetoed by policy");
            return false;
        }

        let params = MantleStartParams {
            height,
            ledge: target,
            component: Some(top.component),
            mantle_type,
        };
        self.mantle_start(height, target, params.component, mantle_type);
        self.call_server(RemoteCall::ServerMantleStart(params));
        true
    }

    /// Start climbing onto `ledge` (world space). `component` is what the
    /// ledge belongs to, if anything.
    pub fn mantle_start(
        &mut self,
        height: f32,
        ledge: Transform,
        component: Option<ComponentId>,
        mantle_type: MantleType,
    ) {
        self.set_movement_mode(MovementMode::None);
        self.set_movement_state(MovementState::Mantling);

        let asset = self.policy.mantle_asset(&self.config.mantle, mantle_type);
        if asset.position_correction_curve.is_empty() {
            warn!("mantle asset {:?} has no position correction keys", asset.montage);
        }
        let heights = (asset.low_height, asset.high_height);
        let start_positions = (asset.low_start_position, asset.high_start_position);
        let starting_position = map_range_clamped(heights, start_positions, height);
        let play_rate =
            map_range_clamped(heights, (asset.low_play_rate, asset.high_play_rate), height);

        let component_pose = component.and_then(|id| self.host.world().component_to_world(id));
        let ledge_ls = match &component_pose {
            Some(pose) => world_to_component_local(&ledge, pose),
            None => ledge,
        };

        let actor = Transform::new(self.host.location(), self.host.rotation());
        let offset = asset.starting_offset();
        let mut rotated = ledge.rotation.forward() * offset.y;
        rotated.z = offset.z;
        let animated_start = Transform::new(ledge.translation - rotated, ledge.rotation);

        let (_, curve_end) = asset.position_correction_curve.time_range();
        let mantle = &mut self.state.mantle;
        mantle.params.montage = asset.montage.clone();
        mantle.params.position_correction_curve = asset.position_correction_curve;
        mantle.params.starting_offset = offset;
        mantle.params.starting_position = starting_position;
        mantle.params.play_rate = play_rate;
        mantle.ledge_ls = ledge_ls;
        mantle.component = if component_pose.is_some() { component } else { None };
        mantle.target = ledge;
        mantle.actual_start_offset = transform_sub(&actor, &ledge);
        mantle.animated_start_offset = transform_sub(&animated_start, &ledge);
        mantle.timeline.play_from_start(curve_end - starting_position, play_rate);

        if !asset.montage.is_empty() {
            if let Some(anim) = self.host.anim_mut() {
                anim.montage_play(&asset.montage, play_rate, starting_position);
            }
        }
        debug!(
            "mantle {mantle_type:?} start: height {height:.1}, \
             start position {starting_position:.2}, rate {play_rate:.2}"
        );
    }

    pub(super) fn advance_mantle(&mut self, dt: f32) {
        let finished = self.state.mantle.timeline.advance(dt);
        let position = self.state.mantle.timeline.position;
        let blend_in = self.config.mantle.timeline_curve.sample(position);
        self.mantle_update(blend_in);
        if finished {
            self.state.mantle.timeline.stop();
            self.mantle_end();
        }
    }

    fn mantle_update(&mut self, blend_in: f32) {
        let mantle = &self.state.mantle;
        let target = match mantle.component {
            Some(id) => match self.host.world().component_to_world(id) {
                Some(pose) => mantle_component_local_to_world(&mantle.ledge_ls, &pose),
                // The ledge is gone; hold the last known target.
                None => mantle.target,
            },
            None => mantle.ledge_ls,
        };

        let alphas = mantle
            .params
            .position_correction_curve
            .sample(mantle.params.starting_position + mantle.timeline.position);
        let (position_alpha, xy_alpha, z_alpha) = (alphas.x, alphas.y, alphas.z);
        let actual = mantle.actual_start_offset;
        let animated = mantle.animated_start_offset;

        let horizontal_target = Transform::new(
            Vec3::new(animated.translation.x, animated.translation.y, actual.translation.z),
            animated.rotation,
        );
        let horizontal = tlerp(&actual, &horizontal_target, xy_alpha);
        let vertical_target = Transform::new(
            Vec3::new(actual.translation.x, actual.translation.y, animated.translation.z),
            actual.rotation,
        );
        let vertical = tlerp(&actual, &vertical_target, z_alpha);
        let combined = Transform::new(
            Vec3::new(horizontal.translation.x, horizontal.translation.y, vertical.translation.z),
            horizontal.rotation,
        );

        let corrected = tlerp(&transform_add(&target, &combined), &target, position_alpha);
        let lerped = tlerp(&transform_add(&target, &actual), &corrected, blend_in);

        self.state.mantle.target = target;
        self.set_actor_location_and_target_rotation(lerped.translation, lerped.rotation);
    }

    fn mantle_end(&mut self) {
        debug!("mantle end at {:?}", self.host.location());
        self.set_movement_mode(MovementMode::Walking);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::MontageId;
    use crate::collision::{ChannelMask, StaticShape, StaticWorld};
    use crate::config::LocomotionConfig;
    use crate::curve::VectorCurve;
    use crate::host::LocomotionPolicy;
    use crate::math::Iso;
    use crate::net::{NetContext, Outbound};
    use crate::testing::{TestHost, ai, ai_with_config, ai_with_policy};

    fn near(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.5
    }

    /// Ground plus a block in front of the character (which faces +X at the origin).
    fn facing_block(top: f32) -> (TestHost, ComponentId) {
        let mut host = TestHost::on_ground();
        let block = host
            .world
            .add_box(Vec3::new(110.0, 0.0, top / 2.0), Vec3::new(50.0, 100.0, top / 2.0));
        (host, block)
    }

    #[test]
    fn grounded_check_climbs_a_one_metre_block() {
        let (host, block) = facing_block(100.0);
        let mut character = ai(host, NetContext::standalone());
        assert!(character.mantle_check_grounded());

        let state = character.state();
        assert_eq!(state.movement_state, MovementState::Mantling);
        assert_eq!(character.host().movement_mode, MovementMode::None);
        assert_eq!(state.mantle.component, Some(block));
        let target = state.mantle.target.translation;
        assert!(near(target.x, 75.0), "{target:?}");
        assert!(near(target.z, 192.0), "{target:?}");
        assert!(state.mantle.target.rotation.yaw.abs() < 1e-3);
        // Height 102 clamps to the low asset's high end.
        assert_eq!(
            character.host().anim_ref().montages,
            vec![(MontageId::new("ALS_Mantle_1m"), 1.0, 0.0)]
        );
        assert!(character.state().mantle.timeline.playing);
    }

    #[test]
    fn tall_ledges_use_the_high_mantle() {
        let (host, _) = facing_block(200.0);
        let mut character = ai(host, NetContext::standalone());
        assert!(character.mantle_check_grounded());
        let (montage, rate, start) = character.host().anim_ref().montages[0].clone();
        assert_eq!(montage, MontageId::new("ALS_Mantle_2m"));
        assert!((rate - 1.2).abs() < 1e-5);
        assert_eq!(start, 0.0);
    }

    #[test]
    fn walkable_slope_is_not_a_wall() {
        let mut host = TestHost::on_ground();
        host.world.add(
            Iso::translation(-50.0, 0.0, 0.0),
            StaticShape::HalfSpace {
                normal: Vec3::new(-0.5, 0.0, 0.866),
            },
            ChannelMask::all(),
        );
        let mut character = ai(host, NetContext::standalone());
        let before = character.state().mantle.target;

        assert!(!character.mantle_check_grounded());
        assert_eq!(character.state().mantle.target, before);
        assert_eq!(character.state().movement_state, MovementState::Grounded);
        assert!(character.host().anim_ref().montages.is_empty());
    }

    #[test]
    fn nothing_in_reach_is_no_mantle() {
        let mut character = ai(TestHost::on_ground(), NetContext::standalone());
        assert!(!character.mantle_check_grounded());
        assert!(!character.mantle_check_falling());
    }

    #[test]
    fn blocked_ledge_has_no_room() {
        let (mut host, _) = facing_block(100.0);
        // A post beside the landing spot: clear of both probes, inside the capsule.
        host.world
            .add_box(Vec3::new(75.0, 46.5, 150.0), Vec3::new(10.0, 13.5, 40.0));
        let mut character = ai(host, NetContext::standalone());
        assert!(!character.mantle_check_grounded());
        assert_eq!(character.state().movement_state, MovementState::Grounded);
    }

    #[test]
    fn policy_can_veto_a_mantle_type() {
        struct NoLowMantles;
        impl LocomotionPolicy for NoLowMantles {
            fn can_mantle(&self, mantle_type: MantleType) -> bool {
                mantle_type != MantleType::LowMantle
            }
        }
        let (host, _) = facing_block(100.0);
        let mut character = ai_with_policy(host, LocomotionConfig::default(), NoLowMantles);
        assert!(!character.mantle_check_grounded());
    }

    #[test]
    fn owning_client_mantles_locally_and_tells_the_server() {
        let (host, block) = facing_block(100.0);
        let mut character = ai(host, NetContext::owning_client());
        character.drain_outbound();
        assert!(character.mantle_check_grounded());
        let sent = character.drain_outbound();
        assert!(matches!(
            sent.as_slice(),
            [Outbound::Call(RemoteCall::ServerMantleStart(MantleStartParams {
                mantle_type: MantleType::LowMantle,
                component: Some(c),
                ..
            }))] if *c == block
        ));
    }

    #[test]
    fn walking_into_a_low_block_vaults() {
        let mut host = TestHost::on_ground();
        host.world
            .add_box(Vec3::new(90.0, 0.0, 35.0), Vec3::new(50.0, 100.0, 35.0));
        host.acceleration = Vec3::new(2048.0, 0.0, 0.0);
        let mut character = ai(host, NetContext::standalone());
        character.tick(0.01);
        assert_eq!(character.state().movement_state, MovementState::Mantling);
        let target = character.state().mantle.target.translation;
        assert!(near(target.z, 162.0), "{target:?}");
    }

    #[test]
    fn timeline_runs_to_the_ledge_and_lands() {
        let (host, _) = facing_block(100.0);
        let mut character = ai(host, NetContext::standalone());
        assert!(character.mantle_check_grounded());
        let start = character.host().location;

        character.tick(0.1);
        let early = character.host().location;
        // Blend-in is still low; the actor has barely left its start.
        assert!((early - start).norm() < 50.0, "{early:?}");

        for _ in 0..12 {
            character.tick(0.1);
        }
        let end = character.host().location;
        assert!(near(end.x, 75.0) && near(end.z, 192.0), "{end:?}");
        assert_eq!(character.host().movement_mode, MovementMode::Walking);
        assert_eq!(character.state().movement_state, MovementState::Grounded);
        assert_eq!(character.state().mantle, Default::default());
    }

    #[test]
    fn moving_ledge_carries_the_target() {
        let (host, block) = facing_block(100.0);
        let mut character = ai(host, NetContext::standalone());
        assert!(character.mantle_check_grounded());
        let before = character.state().mantle.target.translation;

        character
            .host_mut()
            .world
            .set_component_pose(block, Iso::translation(110.0, 100.0, 50.0));
        character.tick(0.05);
        let after = character.state().mantle.target.translation;
        assert!(near(after.y - before.y, 100.0), "{before:?} -> {after:?}");
        assert!(near(after.x, before.x) && near(after.z, before.z));
    }

    #[test]
    fn removed_ledge_keeps_the_last_target() {
        let (host, block) = facing_block(100.0);
        let mut character = ai(host, NetContext::standalone());
        assert!(character.mantle_check_grounded());
        let before = character.state().mantle.target;

        character.host_mut().world.remove_component(block);
        character.tick(0.05);
        assert!(character.state().mantle.target.approx_eq(&before, 1e-3));
    }

    #[test]
    fn world_space_ledges_need_no_component() {
        let mut character = ai(TestHost::on_ground(), NetContext::standalone());
        let ledge = Transform::new(Vec3::new(50.0, 0.0, 190.0), Rotator::ZERO);
        character.mantle_start(100.0, ledge, None, MantleType::LowMantle);
        assert_eq!(character.state().mantle.ledge_ls, ledge);
        assert_eq!(character.state().mantle.component, None);

        let mantle = &character.state().mantle;
        // Animation starts 65 behind and 100 below the ledge.
        assert!(near(mantle.animated_start_offset.translation.x, -65.0));
        assert!(near(mantle.animated_start_offset.translation.z, -100.0));
        assert!(near(mantle.actual_start_offset.translation.z, -100.0));
    }

    #[test]
    fn asset_without_correction_keys_ends_on_the_next_tick() {
        let mut config = LocomotionConfig::default();
        config.mantle.low.position_correction_curve = VectorCurve::default();
        let mut character = ai_with_config(TestHost::on_ground(), NetContext::standalone(), config);
        let ledge = Transform::new(Vec3::new(50.0, 0.0, 190.0), Rotator::ZERO);
        character.mantle_start(100.0, ledge, None, MantleType::LowMantle);
        assert_eq!(character.state().movement_state, MovementState::Mantling);

        character.tick(0.1);
        assert_eq!(character.state().movement_state, MovementState::Grounded);
    }

    fn exact(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn height_maps_linearly_onto_start_position_and_play_rate() {
        let mut config = LocomotionConfig::default();
        let low = &mut config.mantle.low;
        (low.low_height, low.low_play_rate, low.low_start_position) = (50.0, 1.0, 0.2);
        (low.high_height, low.high_play_rate, low.high_start_position) = (150.0, 2.0, 0.6);
        let ledge = Transform::new(Vec3::new(50.0, 0.0, 190.0), Rotator::ZERO);

        let started: Vec<(f32, f32)> = [20.0, 50.0, 100.0, 150.0, 200.0]
            .into_iter()
            .map(|height| {
                let mut character =
                    ai_with_config(TestHost::on_ground(), NetContext::standalone(), config.clone());
                character.mantle_start(height, ledge, None, MantleType::LowMantle);
                let params = &character.state().mantle.params;
                let montage = MontageId::new("ALS_Mantle_1m");
                let expected = (montage, params.play_rate, params.starting_position);
                assert_eq!(character.host().anim_ref().montages, vec![expected]);
                (params.starting_position, params.play_rate)
            })
            .collect();

        assert!(started.windows(2).all(|pair| pair[0].0 <= pair[1].0), "{started:?}");
        // Heights outside the asset bounds clamp to the nearest bound.
        assert_eq!(started[0], started[1]);
        assert_eq!(started[3], started[4]);
        assert!(exact(started[1].0, 0.2) && exact(started[1].1, 1.0));
        assert!(exact(started[3].0, 0.6) && exact(started[3].1, 2.0));
        // Halfway up the range is halfway between the bounds.
        assert!(exact(started[2].0, 0.4), "{started:?}");
        assert!(exact(started[2].1, (started[1].1 + started[3].1) / 2.0), "{started:?}");
    }

    #[test]
    fn zero_blend_in_keeps_the_actor_where_it_started() {
        let mut host = TestHost::on_ground();
        host.rotation = Rotator::from_yaw(20.0);
        let mut character = ai(host, NetContext::standalone());
        let before = Transform::new(character.host().location, character.host().rotation);
        let ledge = Transform::new(Vec3::new(50.0, 10.0, 190.0), Rotator::from_yaw(-15.0));
        character.mantle_start(100.0, ledge, None, MantleType::LowMantle);

        character.mantle_update(0.0);
        let mantle = &character.state().mantle;
        let expected = transform_add(&mantle.target, &mantle.actual_start_offset);
        let actor = Transform::new(character.host().location, character.host().rotation);
        assert!(actor.approx_eq(&expected, 1e-3), "{actor:?} vs {expected:?}");
        assert!(actor.approx_eq(&before, 1e-3), "{actor:?} vs {before:?}");
    }

    #[test]
    fn full_blend_in_and_correction_land_on_the_target() {
        let mut config = LocomotionConfig::default();
        config.mantle.low.position_correction_curve =
            VectorCurve::new(vec![(0.0, [1.0, 1.0, 1.0]), (1.0, [1.0, 1.0, 1.0])]);
        let mut character = ai_with_config(TestHost::on_ground(), NetContext::standalone(), config);
        let ledge = Transform::new(Vec3::new(50.0, 10.0, 190.0), Rotator::from_yaw(-15.0));
        character.mantle_start(100.0, ledge, None, MantleType::LowMantle);

        character.mantle_update(1.0);
        let target = character.state().mantle.target;
        let actor = Transform::new(character.host().location, character.host().rotation);
        assert!(actor.approx_eq(&target, 1e-3), "{actor:?} vs {target:?}");
        assert!(actor.approx_eq(&ledge, 1e-3), "{actor:?} vs {ledge:?}");
    }
}
