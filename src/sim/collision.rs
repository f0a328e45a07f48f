//! Collision detection and response
//!
//! Every obstacle shape reduces to the same question: which point on the
//! obstacle is nearest the ball, and how far apart may the two centers get
//! before they touch? Shapes answer it through [`Obstacle::contact`]; a
//! single impact law ([`bounce`]) then reflects the ball and pushes it clear.

use glam::Vec2;

use super::arc::ArcRail;
use super::state::Ball;
use crate::consts::CONTACT_EPSILON;
use crate::table::{CircleFeature, FlipperConfig, GuideRail, TableConfig};
use crate::{angle_of, reflect, unit_or_fallback};

/// An overlap between the ball and an obstacle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Point on the obstacle the ball is pushed away from
    pub anchor: Vec2,
    /// Unit normal from `anchor` toward the ball center
    pub normal: Vec2,
    /// Center distance at which ball and obstacle just touch
    pub reach: f32,
}

impl Contact {
    /// Overlap test between a ball center and an obstacle anchor
    ///
    /// A ball center sitting exactly on the anchor has no defined normal and
    /// counts as no contact.
    pub fn probe(ball_pos: Vec2, anchor: Vec2, reach: f32) -> Option<Contact> {
        let offset = ball_pos - anchor;
        let distance = offset.length();
        if distance >= reach || distance == 0.0 {
            return None;
        }
        Some(Contact {
            anchor,
            normal: unit_or_fallback(offset),
            reach,
        })
    }

    /// Ball position just clear of the obstacle along the normal
    #[inline]
    pub fn clear_position(&self) -> Vec2 {
        self.anchor + self.normal * (self.reach + CONTACT_EPSILON)
    }
}

/// Anything the ball can touch
pub trait Obstacle {
    /// Contact with a ball of `ball_radius` centered at `ball_pos`, if overlapping
    fn contact(&self, ball_pos: Vec2, ball_radius: f32) -> Option<Contact>;
}

impl Obstacle for CircleFeature {
    fn contact(&self, ball_pos: Vec2, ball_radius: f32) -> Option<Contact> {
        Contact::probe(ball_pos, self.pos, ball_radius + self.radius)
    }
}

impl Obstacle for ArcRail {
    fn contact(&self, ball_pos: Vec2, ball_radius: f32) -> Option<Contact> {
        let contact = Contact::probe(ball_pos, self.center, ball_radius + self.radius)?;
        self.contains_angle(angle_of(contact.normal)).then_some(contact)
    }
}

/// A thick line segment (guide rail or flipper blade)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Vec2,
    pub end: Vec2,
    pub thickness: f32,
}

impl Segment {
    /// Closest point on the segment to `point` (clamped parametric projection)
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        let seg = self.end - self.start;
        let len_sq = seg.length_squared();
        if len_sq == 0.0 {
            return self.start;
        }
        let t = ((point - self.start).dot(seg) / len_sq).clamp(0.0, 1.0);
        self.start + seg * t
    }
}

impl Obstacle for Segment {
    fn contact(&self, ball_pos: Vec2, ball_radius: f32) -> Option<Contact> {
        let closest = self.closest_point(ball_pos);
        Contact::probe(ball_pos, closest, self.thickness / 2.0 + ball_radius)
    }
}

impl Obstacle for GuideRail {
    fn contact(&self, ball_pos: Vec2, ball_radius: f32) -> Option<Contact> {
        Segment {
            start: self.start,
            end: self.end,
            thickness: self.thickness,
        }
        .contact(ball_pos, ball_radius)
    }
}

/// Shared impact law: reflect off the contact normal and push the ball clear
///
/// Returns false (and leaves the ball alone) when the ball is already moving
/// away from the surface.
pub fn bounce(ball: &mut Ball, contact: &Contact, boost: f32) -> bool {
    let approach = ball.vel.dot(contact.normal);
    if approach >= 0.0 {
        return false;
    }
    ball.vel = reflect(ball.vel, contact.normal, boost);
    ball.pos = contact.clear_position();
    true
}

/// Detect and resolve a bounce against any obstacle
pub fn resolve(ball: &mut Ball, obstacle: &impl Obstacle, ball_radius: f32, boost: f32) -> bool {
    match obstacle.contact(ball.pos, ball_radius) {
        Some(contact) => bounce(ball, &contact, boost),
        None => false,
    }
}

/// Flipper bounce: the impact law plus an upward kick and damping
pub fn resolve_flipper(
    ball: &mut Ball,
    blade: &Segment,
    active: bool,
    flipper: &FlipperConfig,
    ball_radius: f32,
) -> bool {
    let boost = if active { flipper.active_boost } else { 1.0 };
    if !resolve(ball, blade, ball_radius, boost) {
        return false;
    }
    let kick = if active {
        flipper.kick_active
    } else {
        flipper.kick_rest
    };
    ball.vel.y -= kick;
    ball.vel *= flipper.damping_factor();
    true
}

/// Proximity sensor: push the ball out without touching its velocity
///
/// Returns true if the ball was inside the sensor.
pub fn sense(ball: &mut Ball, sensor: &CircleFeature, ball_radius: f32) -> bool {
    match sensor.contact(ball.pos, ball_radius) {
        Some(contact) => {
            ball.pos = contact.clear_position();
            true
        }
        None => false,
    }
}

/// Keep the ball inside the side and top walls (the bottom is the drain)
pub fn clamp_to_walls(ball: &mut Ball, table: &TableConfig) {
    let left = table.wall_inset + table.ball_radius;
    let right = table.width - table.wall_inset - table.ball_radius;
    let top = table.wall_inset + table.ball_radius;

    if ball.pos.x < left {
        ball.pos.x = left;
        ball.vel.x = ball.vel.x.abs();
    }
    if ball.pos.x > right {
        ball.pos.x = right;
        ball.vel.x = -ball.vel.x.abs();
    }
    if ball.pos.y < top {
        ball.pos.y = top;
        ball.vel.y = ball.vel.y.abs();
    }
}
