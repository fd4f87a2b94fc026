//! Force-directed layout engine
//!
//! This module implements a physics simulation that positions nodes based on
//! a system of attractive and repulsive forces:
//!
//! 1. every pair of nodes repels with an inverse-square force,
//! 2. every edge pulls its endpoints together like a spring with no rest length,
//! 3. pairs closer than the minimum distance are pushed apart directly,
//! 4. velocities are damped, nudged toward the centre and integrated.
//!
//! Initial positions are random. The random source is injectable through
//! [`Engine::calculate_with_rng`] and seedable through [`Options::seed`].

use std::collections::HashMap;

use log::{debug, trace, warn};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Deserialize;

use erdlayout_core::geometry::Point;

use crate::graph::{Edge, Node};

/// Side of the square the initial positions are drawn from.
const INITIAL_EXTENT: f32 = 400.0;

/// Floor applied to distances before dividing by them.
const MIN_DISTANCE_EPSILON: f32 = 0.01;

/// Fraction of the offset from the centre added to the velocity each step.
const CENTER_PULL: f32 = 0.01;

/// Upper bound on collision passes after the simulation.
const MAX_SETTLE_PASSES: usize = 1000;

/// Extra separation added while settling so passes terminate under rounding.
const SETTLE_SLACK: f32 = 0.05;

/// Golden angle, used to spread coincident pairs deterministically.
const GOLDEN_ANGLE: f32 = 2.399_963;

/// Force-directed layout options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Options {
    pub iterations: usize,
    pub repulsion_force: f32,
    /// Scales both the repulsion force and the minimum distance
    pub repulsion_multiplier: f32,
    pub attraction_force: f32,
    pub min_distance: f32,
    pub damping: f32,
    pub center_x: f32,
    pub center_y: f32,
    /// Seed for the initial placement; a fresh one is drawn when unset
    pub seed: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            iterations: 50,
            repulsion_force: 1000.0,
            repulsion_multiplier: 1.0,
            attraction_force: 0.1,
            min_distance: 150.0,
            damping: 0.9,
            center_x: 400.0,
            center_y: 300.0,
            seed: None,
        }
    }
}

impl Options {
    /// Replaces values the simulation cannot run with by their defaults.
    ///
    /// Non-finite numbers are replaced, as are a negative minimum distance and
    /// a damping factor outside `0..=1`.
    fn resolved(self) -> Self {
        let defaults = Self::default();
        let finite_or = |value: f32, default: f32| {
            if value.is_finite() { value } else { default }
        };

        let resolved = Self {
            repulsion_force: finite_or(self.repulsion_force, defaults.repulsion_force),
            repulsion_multiplier: finite_or(
                self.repulsion_multiplier,
                defaults.repulsion_multiplier,
            ),
            attraction_force: finite_or(self.attraction_force, defaults.attraction_force),
            min_distance: if self.min_distance.is_finite() && self.min_distance >= 0.0 {
                self.min_distance
            } else {
                defaults.min_distance
            },
            damping: if (0.0..=1.0).contains(&self.damping) {
                self.damping
            } else {
                defaults.damping
            },
            center_x: finite_or(self.center_x, defaults.center_x),
            center_y: finite_or(self.center_y, defaults.center_y),
            ..self
        };
        if resolved != self {
            warn!(options:? = self; "Invalid force options replaced with defaults");
        }
        resolved
    }
}

/// Simulation state of one node.
#[derive(Debug, Clone, Copy)]
struct Body {
    position: Point,
    velocity: Point,
}

/// Force layout engine
#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: Options,
}

impl Engine {
    /// Create a new force layout engine
    pub fn new(options: Options) -> Self {
        Self {
            options: options.resolved(),
        }
    }

    /// Set the seed used for the initial placement
    pub fn set_seed(&mut self, seed: u64) -> &mut Self {
        self.options.seed = Some(seed);
        self
    }

    fn center(&self) -> Point {
        Point::new(self.options.center_x, self.options.center_y)
    }

    /// Distance below which two nodes are pushed apart
    fn min_separation(&self) -> f32 {
        self.options.min_distance * self.options.repulsion_multiplier
    }

    /// Run the simulation with the given random source.
    pub fn calculate_with_rng<R: Rng>(
        &self,
        nodes: &[Node],
        edges: &[Edge],
        rng: &mut R,
    ) -> Vec<Node> {
        if nodes.is_empty() {
            return nodes.to_vec();
        }

        let mut bodies = self.initialize_bodies(nodes.len(), rng);
        let springs = springs(nodes, edges);

        debug!(
            node_count = nodes.len(),
            spring_count = springs.len(),
            iterations = self.options.iterations;
            "Running force simulation"
        );

        for _ in 0..self.options.iterations {
            self.apply_repulsion(&mut bodies);
            self.apply_attraction(&mut bodies, &springs);
            self.resolve_collisions(&mut bodies, 0.0);
            self.integrate(&mut bodies);
        }
        self.settle(&mut bodies);

        let center = self.center();
        nodes
            .iter()
            .zip(bodies)
            .map(|(node, body)| {
                let position = if body.position.is_finite() {
                    body.position
                } else {
                    center
                };
                node.with_position(position)
            })
            .collect()
    }

    /// Uniform random positions in a square around the centre, at rest
    fn initialize_bodies<R: Rng>(&self, count: usize, rng: &mut R) -> Vec<Body> {
        let half = INITIAL_EXTENT / 2.0;
        let center = self.center();
        (0..count)
            .map(|_| Body {
                position: Point::new(
                    rng.random_range(center.x() - half..center.x() + half),
                    rng.random_range(center.y() - half..center.y() + half),
                ),
                velocity: Point::default(),
            })
            .collect()
    }

    /// Inverse-square repulsion between every unordered pair
    fn apply_repulsion(&self, bodies: &mut [Body]) {
        let strength = self.options.repulsion_force * self.options.repulsion_multiplier;
        for i in 0..bodies.len() {
            for j in (i + 1)..bodies.len() {
                let delta = bodies[j].position.sub_point(bodies[i].position);
                let distance = delta.hypot().max(MIN_DISTANCE_EPSILON);
                let force = strength / (distance * distance);
                let push = delta.scale(force / distance);

                bodies[i].velocity = bodies[i].velocity.sub_point(push);
                bodies[j].velocity = bodies[j].velocity.add_point(push);
            }
        }
    }

    /// Spring attraction along every edge, magnitude proportional to length
    fn apply_attraction(&self, bodies: &mut [Body], springs: &[(usize, usize)]) {
        for &(source, target) in springs {
            let delta = bodies[target].position.sub_point(bodies[source].position);
            let pull = delta.scale(self.options.attraction_force);

            bodies[source].velocity = bodies[source].velocity.add_point(pull);
            bodies[target].velocity = bodies[target].velocity.sub_point(pull);
        }
    }

    /// Pushes overlapping pairs apart by half the overlap each.
    ///
    /// Returns whether any pair overlapped.
    fn resolve_collisions(&self, bodies: &mut [Body], slack: f32) -> bool {
        let min_separation = self.min_separation();
        if min_separation <= 0.0 {
            return false;
        }

        let mut collided = false;
        for i in 0..bodies.len() {
            for j in (i + 1)..bodies.len() {
                let delta = bodies[j].position.sub_point(bodies[i].position);
                let distance = delta.hypot();
                if distance >= min_separation {
                    continue;
                }
                collided = true;

                let direction = if distance > MIN_DISTANCE_EPSILON {
                    delta.scale(1.0 / distance)
                } else {
                    let angle = (i + j) as f32 * GOLDEN_ANGLE;
                    Point::new(angle.cos(), angle.sin())
                };
                let shift = direction.scale((min_separation - distance) / 2.0 + slack);

                bodies[i].position = bodies[i].position.sub_point(shift);
                bodies[j].position = bodies[j].position.add_point(shift);
            }
        }
        collided
    }

    /// Damping, centring pull and explicit Euler step
    fn integrate(&self, bodies: &mut [Body]) {
        let center = self.center();
        for body in bodies {
            let pull = center.sub_point(body.position).scale(CENTER_PULL);
            body.velocity = body.velocity.scale(self.options.damping).add_point(pull);
            body.position = body.position.add_point(body.velocity);
        }
    }

    /// Repeats collision resolution until no pair overlaps
    fn settle(&self, bodies: &mut [Body]) {
        for pass in 0..MAX_SETTLE_PASSES {
            if !self.resolve_collisions(bodies, SETTLE_SLACK) {
                trace!(passes = pass; "Settled force layout");
                return;
            }
        }
        debug!(passes = MAX_SETTLE_PASSES; "Force layout did not fully settle");
    }
}

impl super::Engine for Engine {
    fn calculate(&self, nodes: &[Node], edges: &[Edge]) -> Vec<Node> {
        let mut rng = match self.options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        self.calculate_with_rng(nodes, edges, &mut rng)
    }
}

/// Index pairs of edges between two distinct known nodes.
fn springs(nodes: &[Node], edges: &[Edge]) -> Vec<(usize, usize)> {
    let indices: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| (node.id(), i))
        .collect();

    edges
        .iter()
        .filter_map(|edge| {
            let source = *indices.get(edge.source.as_str())?;
            let target = *indices.get(edge.target.as_str())?;
            (source != target).then_some((source, target))
        })
        .collect()
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;
    use crate::{
        graph::test_support::{edge, node},
        layout::engines::Engine as _,
    };

    fn options_strategy() -> impl Strategy<Value = Options> {
        (1usize..60, 0.5f32..2.0, 50.0f32..200.0, any::<u64>()).prop_map(
            |(iterations, repulsion_multiplier, min_distance, seed)| Options {
                iterations,
                repulsion_multiplier,
                min_distance,
                seed: Some(seed),
                ..Options::default()
            },
        )
    }

    /// Positions are finite and no pair ends closer than the minimum separation.
    fn check_separation_and_finiteness(
        options: Options,
        n: usize,
        pairs: Vec<(usize, usize)>,
    ) -> Result<(), TestCaseError> {
        let nodes: Vec<Node> = (0..n).map(|i| node(&format!("n{i}"), 1)).collect();
        let edges: Vec<Edge> = pairs
            .iter()
            .map(|&(s, t)| edge(&format!("n{}", s % n), &format!("n{}", t % n)))
            .collect();
        let min_separation = options.min_distance * options.repulsion_multiplier;

        let laid_out = Engine::new(options).calculate(&nodes, &edges);

        for (i, a) in laid_out.iter().enumerate() {
            prop_assert!(a.position().is_finite());
            for b in &laid_out[i + 1..] {
                prop_assert!(a.position().distance(b.position()) >= min_separation - 1e-2);
            }
        }
        Ok(())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn separation_and_finiteness(
            options in options_strategy(),
            n in 1usize..8,
            pairs in prop::collection::vec((0usize..8, 0usize..8), 0..10),
        ) {
            check_separation_and_finiteness(options, n, pairs)?;
        }
    }
}
