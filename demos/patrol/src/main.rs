//! # patrol — demo driver
//!
//! Two patrollers and a stationary beacon. A movement system integrates
//! velocities every tick; a throttled report system logs positions a few
//! times a second and, via a [`SystemObserver`], hears about every position
//! component that enters or leaves the world.
//!
//! Run with `RUST_LOG=patrol=debug` for per-tick output.

use std::any::Any;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use glam::Vec2;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use cadence_ecs::{
    Component, ComponentTag, ComponentWatcher, Ecs, EntityRef, EntityStore, System, SystemObserver,
    SystemTag,
};

struct Position(Vec2);

impl Component for Position {
    fn tag(&self) -> ComponentTag {
        "position"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct Velocity(Vec2);

impl Component for Velocity {
    fn tag(&self) -> ComponentTag {
        "velocity"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Integrates velocity into position, scaled by the time since its last run.
struct Movement;

impl System for Movement {
    fn tag(&self) -> SystemTag {
        "movement"
    }
    fn priority(&self) -> i32 {
        10
    }
    fn process(&mut self, store: &mut EntityStore, dt: Duration) {
        let step = dt.as_secs_f32();
        for entity in store.find().has(&["position", "velocity"]).get_many() {
            let (Some(position), Some(velocity)) = (entity.get("position"), entity.get("velocity"))
            else {
                continue;
            };
            let velocity_guard = velocity.borrow();
            let velocity = velocity_guard.as_any().downcast_ref::<Velocity>().unwrap();
            let mut position_guard = position.borrow_mut();
            let position = position_guard
                .as_any_mut()
                .downcast_mut::<Position>()
                .unwrap();
            position.0 += velocity.0 * step;
        }
        debug!(step, "integrated velocities");
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Logs every position a few times a second, and counts position components
/// coming and going via its watcher hooks.
struct Report {
    sightings: u64,
}

impl System for Report {
    fn tag(&self) -> SystemTag {
        "report"
    }
    fn priority(&self) -> i32 {
        -10
    }
    fn frequency(&self) -> Duration {
        Duration::from_millis(200)
    }
    fn process(&mut self, store: &mut EntityStore, _dt: Duration) {
        for entity in store.entities_with("position") {
            let Some(cell) = entity.get("position") else {
                continue;
            };
            let guard = cell.borrow();
            let position = guard.as_any().downcast_ref::<Position>().unwrap();
            info!(
                entity = %entity.id(),
                x = position.0.x,
                y = position.0.y,
                "position report"
            );
        }
    }
    fn cleanup(&mut self, _store: &mut EntityStore) {
        info!(sightings = self.sightings, "report system signing off");
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
    fn watcher(&mut self) -> Option<&mut dyn ComponentWatcher> {
        Some(self)
    }
}

impl ComponentWatcher for Report {
    fn component_attached(&mut self, tag: ComponentTag, entity: EntityRef<'_>) {
        self.sightings += 1;
        info!(tag, entity = %entity.id(), "component entered the world");
    }
    fn component_detached(&mut self, tag: ComponentTag, entity: EntityRef<'_>) {
        info!(tag, entity = %entity.id(), "component left the world");
    }
}

/// Configuration for the demo's fixed-rate driver loop.
#[derive(Debug, Clone)]
struct RunConfig {
    /// Target ticks per second.
    tick_rate: f64,
    /// Number of ticks to run (0 = unlimited).
    max_ticks: u64,
}

/// Drive the runtime at a fixed rate, sleeping away the slack per tick.
fn run(ecs: &mut Ecs, config: &RunConfig) {
    let tick_budget = Duration::from_secs_f64(1.0 / config.tick_rate);
    let mut tick_count = 0u64;

    info!(
        tick_rate = config.tick_rate,
        max_ticks = config.max_ticks,
        "starting tick loop"
    );

    loop {
        let start = Instant::now();
        ecs.process();

        tick_count += 1;
        if config.max_ticks > 0 && tick_count >= config.max_ticks {
            info!(ticks = tick_count, "tick loop complete");
            break;
        }

        let elapsed = start.elapsed();
        if elapsed < tick_budget {
            thread::sleep(tick_budget - elapsed);
        } else {
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                budget_ms = tick_budget.as_millis() as u64,
                "tick exceeded time budget"
            );
        }
    }
}

fn main() -> Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("patrol=info".parse()?))
        .init();

    info!("patrol demo starting");

    let mut ecs = Ecs::new();
    ecs.system_store.borrow_mut().add(Movement.into_shared())?;
    ecs.system_store
        .borrow_mut()
        .add(Report { sightings: 0 }.into_shared())?;

    let observer = Rc::new(
        SystemObserver::new(&ecs.system_store)
            .watch(&["position"])
            .notify(&["report"]),
    );
    ecs.entity_store.add_observer(observer);

    // Two patrollers and a stationary beacon.
    ecs.entity_store.spawn(vec![
        Position(Vec2::ZERO).into_shared(),
        Velocity(Vec2::new(1.5, 0.0)).into_shared(),
    ]);
    ecs.entity_store.spawn(vec![
        Position(Vec2::new(4.0, 4.0)).into_shared(),
        Velocity(Vec2::new(0.0, -1.0)).into_shared(),
    ]);
    ecs.entity_store
        .spawn(vec![Position(Vec2::new(-2.0, 3.0)).into_shared()]);

    ecs.setup();
    run(
        &mut ecs,
        &RunConfig {
            tick_rate: 30.0,
            max_ticks: 90,
        },
    );
    ecs.cleanup();

    info!("patrol demo finished");
    Ok(())
}
