//! The firing range: one player, static targets, and the player's bullets.

use gr_core::config::WorldConfig;
use gr_core::entity::Entity;
use gr_core::geometry::RectF;
use gr_core::input::KbdEvent;
use gr_core::player::Player;
use gr_core::projectile::Projectile;
use gr_core::render::{RenderSurface, TextureSource};

use crate::animation::AnimationRegistry;
use crate::scene::SceneFile;

pub struct Target {
    pub id: String,
    pub body: Entity,
}

pub struct World {
    config: WorldConfig,
    player: Player,
    targets: Vec<Target>,
    bullets: Vec<Projectile>,
    bullet_template: Projectile,
    shots_fired: u64,
    hits: u64,
}

impl World {
    pub fn new(
        config: WorldConfig,
        player: Player,
        targets: Vec<Target>,
        bullet_template: Projectile,
    ) -> Self {
        Self {
            config,
            player,
            targets,
            bullets: Vec::new(),
            bullet_template,
            shots_fired: 0,
            hits: 0,
        }
    }

    /// Build every entity the scene describes, resolving animations through
    /// `registry` and textures through `textures`.
    pub fn from_scene(
        scene: &SceneFile,
        registry: &AnimationRegistry,
        textures: &mut dyn TextureSource,
    ) -> Result<Self, String> {
        let p = &scene.player;
        let body = scaled(Entity::new(p.rect), p.scale, "player")?
            .with_gravity(true)
            .with_animations(registry.build(&p.animation, textures)?);
        let player = Player::new(body, p.health, p.fire_rate, p.tuning)?;

        let b = &scene.projectile;
        let bullet_body = Entity::new(RectF::new(0.0, 0.0, b.w, b.h))
            .with_velocity(b.speed_x, 0.0)
            .with_animations(registry.build(&b.animation, textures)?);
        let bullet_template = Projectile::new(bullet_body, b.damage, b.lifespan_ms);

        let mut targets = Vec::with_capacity(scene.targets.len());
        for t in &scene.targets {
            let body = scaled(Entity::new(t.rect), t.scale, &t.id)?
                .with_gravity(t.gravity)
                .with_animations(registry.build(&t.animation, textures)?);
            targets.push(Target {
                id: t.id.clone(),
                body,
            });
        }

        log::info!(
            "World '{}' built: {} target(s), fire interval {}ms",
            scene.scene_id,
            targets.len(),
            player.fire_interval_ms()
        );
        Ok(Self::new(scene.world, player, targets, bullet_template))
    }

    /// One model tick: player, spawning, bullets, hits, cleanup.
    pub fn update_model(&mut self, dt_ms: u32, events: &[KbdEvent]) {
        self.player.update(dt_ms, events, &self.config);

        if self.player.should_spawn_bullet() {
            let body = self.player.body().destination();
            let template = self.bullet_template.body().destination();
            let bullet = self
                .bullet_template
                .spawn_at(body.right(), body.center_y(), template.w, template.h);
            self.bullets.push(bullet);
            self.shots_fired += 1;
        }

        for bullet in &mut self.bullets {
            bullet.update(dt_ms, &self.config);
            if let Some(target) = self
                .targets
                .iter()
                .find(|t| t.body.is_colliding(bullet.body()))
            {
                log::debug!("Bullet hit '{}' for {} damage", target.id, bullet.damage());
                bullet.hit();
                self.hits += 1;
            }
        }

        let before = self.bullets.len();
        self.bullets.retain(|b| !b.ended_lifespan());
        let removed = before - self.bullets.len();
        if removed > 0 {
            log::trace!("Removed {removed} bullet(s), {} live", self.bullets.len());
        }

        for target in &mut self.targets {
            target.body.update(dt_ms, &self.config);
        }
    }

    /// Draw the player, then targets, then bullets.
    pub fn compose_frame(&self, surface: &mut dyn RenderSurface) {
        self.player.body().render(surface, &self.config);
        for target in &self.targets {
            target.body.render(surface, &self.config);
        }
        for bullet in &self.bullets {
            bullet.body().render(surface, &self.config);
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn bullets(&self) -> &[Projectile] {
        &self.bullets
    }

    pub fn shots_fired(&self) -> u64 {
        self.shots_fired
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }
}

fn scaled(body: Entity, scale: f32, owner: &str) -> Result<Entity, String> {
    if !(scale > 0.0) {
        return Err(format!("'{owner}' scale must be > 0, got {scale}"));
    }
    Ok(body.with_scale(scale))
}
