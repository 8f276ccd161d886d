//! Simulation core for Gunrun: sprite animation, entities, the player state
//! machine, projectiles and loop timing.
//!
//! Nothing in here talks to a window or a GPU. Drawing goes through
//! [`render::RenderSurface`], texture lookup through [`render::TextureSource`],
//! and wall-clock time through [`time::Clock`].

pub mod animation;
pub mod config;
pub mod entity;
pub mod geometry;
pub mod input;
pub mod player;
pub mod projectile;
pub mod render;
pub mod time;
