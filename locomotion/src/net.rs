/*!
Network roles and the outbound message queue.

The character never talks to a transport. Remote calls and replicated
property updates are appended to an [`Outbox`]; the embedding drains it and
delivers each message to the peer(s) it names. Inbound messages are handed
back to the character through `handle_remote_call` and `apply_replicated`.
*/

use std::collections::VecDeque;

use crate::anim::MontageId;
use crate::collision::ComponentId;
use crate::math::{Rotator, Transform, Vec3};
use crate::state::{FlightMode, Gait, MantleType, OverlayState, RotationMode, Stance, ViewMode};

/// Role of this instance for one character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetRole {
    /// Server copy, source of truth.
    Authority,
    /// Owning client; applies changes immediately and forwards them.
    LocalPredicting,
    /// Any other client's copy; only receives.
    RemoteObserving,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NetMode {
    #[default]
    Standalone,
    DedicatedServer,
    ListenServer,
    Client,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetContext {
    pub role: NetRole,
    pub mode: NetMode,
    /// Input for this character originates on this instance.
    pub locally_controlled: bool,
}

impl NetContext {
    /// Single player: authority over a locally controlled character.
    pub const fn standalone() -> Self {
        Self {
            role: NetRole::Authority,
            mode: NetMode::Standalone,
            locally_controlled: true,
        }
    }

    /// Server copy of a character owned by a remote client.
    pub const fn dedicated_server() -> Self {
        Self {
            role: NetRole::Authority,
            mode: NetMode::DedicatedServer,
            locally_controlled: false,
        }
    }

    /// Listen server's own character.
    pub const fn listen_host() -> Self {
        Self {
            role: NetRole::Authority,
            mode: NetMode::ListenServer,
            locally_controlled: true,
        }
    }

    pub const fn owning_client() -> Self {
        Self {
            role: NetRole::LocalPredicting,
            mode: NetMode::Client,
            locally_controlled: true,
        }
    }

    pub const fn observer() -> Self {
        Self {
            role: NetRole::RemoteObserving,
            mode: NetMode::Client,
            locally_controlled: false,
        }
    }

    #[inline]
    pub fn is_authority(&self) -> bool {
        self.role == NetRole::Authority
    }

    #[inline]
    pub fn is_dedicated_server(&self) -> bool {
        self.mode == NetMode::DedicatedServer
    }
}

impl Default for NetContext {
    fn default() -> Self {
        Self::standalone()
    }
}

/// Payload of a mantle start broadcast.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MantleStartParams {
    pub height: f32,
    /// Ledge transform in world space.
    pub ledge: Transform,
    /// Component the ledge belongs to, `None` for world space.
    pub component: Option<ComponentId>,
    pub mantle_type: MantleType,
}

/// Remote procedure calls. `Server*` go client to server, `Multicast*` go
/// server to every copy.
#[derive(Clone, Debug, PartialEq)]
pub enum RemoteCall {
    ServerSetDesiredStance(Stance),
    ServerSetDesiredGait(Gait),
    ServerSetDesiredRotationMode(RotationMode),
    ServerSetRotationMode(RotationMode),
    ServerSetFlightMode(FlightMode),
    ServerSetOverlayState(OverlayState),
    ServerSetViewMode(ViewMode),
    ServerMantleStart(MantleStartParams),
    MulticastMantleStart(MantleStartParams),
    ServerPlayMontage { montage: MontageId, play_rate: f32 },
    MulticastPlayMontage { montage: MontageId, play_rate: f32 },
    ServerRagdollStart,
    MulticastRagdollStart,
    ServerRagdollEnd { location: Vec3 },
    MulticastRagdollEnd { location: Vec3 },
    MulticastOnLanded,
    MulticastOnJumped,
    ServerSetMeshLocationDuringRagdoll(Vec3),
    ServerSetMaxWalkingSpeed(f32),
    ServerSetMaxFlyingSpeed(f32),
    ServerSetMaxSwimmingSpeed(f32),
}

impl RemoteCall {
    /// Unreliable calls may be dropped by the transport.
    pub fn is_reliable(&self) -> bool {
        !matches!(self, RemoteCall::ServerSetMeshLocationDuringRagdoll(_))
    }

    pub fn is_multicast(&self) -> bool {
        matches!(
            self,
            RemoteCall::MulticastMantleStart(_)
                | RemoteCall::MulticastPlayMontage { .. }
                | RemoteCall::MulticastRagdollStart
                | RemoteCall::MulticastRagdollEnd { .. }
                | RemoteCall::MulticastOnLanded
                | RemoteCall::MulticastOnJumped
        )
    }
}

/// Who receives a replicated property.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepCondition {
    All,
    SkipOwner,
}

/// Properties the authority replicates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ReplicatedProperty {
    TargetRagdollLocation(Vec3),
    ReplicatedCurrentAcceleration(Vec3),
    ReplicatedControlRotation(Rotator),
    DesiredGait(Gait),
    DesiredStance(Stance),
    DesiredRotationMode(RotationMode),
    RotationMode(RotationMode),
    OverlayState(OverlayState),
    FlightMode(FlightMode),
    ViewMode(ViewMode),
}

impl ReplicatedProperty {
    pub fn condition(&self) -> RepCondition {
        match self {
            ReplicatedProperty::TargetRagdollLocation(_) | ReplicatedProperty::DesiredGait(_) => {
                RepCondition::All
            }
            _ => RepCondition::SkipOwner,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outbound {
    Call(RemoteCall),
    Property(ReplicatedProperty),
}

/// Messages waiting for the transport.
#[derive(Debug, Default)]
pub struct Outbox {
    queue: VecDeque<Outbound>,
}

impl Outbox {
    pub fn push_call(&mut self, call: RemoteCall) {
        self.queue.push_back(Outbound::Call(call));
    }

    pub fn push_property(&mut self, property: ReplicatedProperty) {
        self.queue.push_back(Outbound::Property(property));
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Outbound> {
        self.queue.iter()
    }

    /// Take every pending message in order.
    pub fn drain(&mut self) -> impl Iterator<Item = Outbound> + '_ {
        self.queue.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_mesh_location_is_unreliable() {
        assert!(!RemoteCall::ServerSetMeshLocationDuringRagdoll(Vec3::zeros()).is_reliable());
        assert!(RemoteCall::ServerRagdollStart.is_reliable());
        assert!(RemoteCall::MulticastOnLanded.is_multicast());
        assert!(!RemoteCall::ServerSetMaxWalkingSpeed(300.0).is_multicast());
    }

    #[test]
    fn ragdoll_target_and_gait_reach_the_owner() {
        assert_eq!(
            ReplicatedProperty::TargetRagdollLocation(Vec3::zeros()).condition(),
            RepCondition::All
        );
        assert_eq!(ReplicatedProperty::DesiredGait(Gait::Fast).condition(), RepCondition::All);
        assert_eq!(
            ReplicatedProperty::DesiredStance(Stance::Crouching).condition(),
            RepCondition::SkipOwner
        );
        assert_eq!(
            ReplicatedProperty::ReplicatedControlRotation(Rotator::ZERO).condition(),
            RepCondition::SkipOwner
        );
    }

    #[test]
    fn outbox_drains_in_order() {
        let mut outbox = Outbox::default();
        outbox.push_call(RemoteCall::ServerRagdollStart);
        outbox.push_property(ReplicatedProperty::DesiredGait(Gait::Slow));
        assert_eq!(outbox.len(), 2);
        let drained: Vec<_> = outbox.drain().collect();
        assert_eq!(
            drained,
            vec![
                Outbound::Call(RemoteCall::ServerRagdollStart),
                Outbound::Property(ReplicatedProperty::DesiredGait(Gait::Slow)),
            ]
        );
        assert!(outbox.is_empty());
    }

    #[test]
    fn contexts_report_roles() {
        assert!(NetContext::standalone().is_authority());
        assert!(NetContext::dedicated_server().is_dedicated_server());
        assert!(!NetContext::observer().locally_controlled);
        assert_eq!(NetContext::owning_client().role, NetRole::LocalPredicting);
    }
}
