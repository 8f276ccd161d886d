use crate::config::WorldConfig;
use crate::entity::Entity;

/// A short-lived moving entity. Ends when its lifespan runs out or when it
/// hits something; the owner drops ended projectiles.
#[derive(Debug, Clone)]
pub struct Projectile {
    body: Entity,
    damage: i32,
    lifespan_ms: u32,
    ended: bool,
}

impl Projectile {
    pub fn new(body: Entity, damage: i32, lifespan_ms: u32) -> Self {
        Self {
            body,
            damage,
            lifespan_ms,
            ended: lifespan_ms == 0,
        }
    }

    /// Copy of this projectile with its body's top-left at `(x, y)` and the
    /// given size. Used to stamp bullets out of a template.
    pub fn spawn_at(&self, x: f32, y: f32, w: f32, h: f32) -> Self {
        let mut spawned = self.clone();
        let mut dest = *spawned.body.destination();
        dest.x = x;
        dest.y = y;
        dest.w = w;
        dest.h = h;
        spawned.body.set_destination(dest);
        log::trace!("Projectile spawned at ({x:.3}, {y:.3})");
        spawned
    }

    pub fn update(&mut self, dt_ms: u32, world: &WorldConfig) {
        self.body.update(dt_ms, world);
        if self.lifespan_ms <= dt_ms {
            self.lifespan_ms = 0;
            self.ended = true;
        } else {
            self.lifespan_ms -= dt_ms;
        }
    }

    pub fn hit(&mut self) {
        log::trace!("Projectile hit after {}ms left", self.lifespan_ms);
        self.lifespan_ms = 0;
        self.ended = true;
    }

    pub fn ended_lifespan(&self) -> bool {
        self.ended
    }

    pub fn damage(&self) -> i32 {
        self.damage
    }

    pub fn lifespan_ms(&self) -> u32 {
        self.lifespan_ms
    }

    pub fn body(&self) -> &Entity {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Entity {
        &mut self.body
    }
}
