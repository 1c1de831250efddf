// src/planner.rs
//! Keeps the floor, the grid overlay and the estimate in step with the input.
//!
//! Every input change runs `recompute`, which is synchronous: normalize the
//! inputs, publish the estimate, re-prepare the material maps for the new room,
//! then build and attach a new floor and grid. Selecting a tile design first
//! resolves its maps, which can suspend. Each selection takes a generation
//! token when it starts; if a newer selection has started by the time its
//! maps arrive, it drops its result, so the last selection started wins.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::catalog::{MapUrls, TileCatalog};
use crate::config::{InputField, PlannerConfig, PlannerInputs, RoomSpec, TileSpec};
use crate::error::{PlannerError, Result};
use crate::estimate::{estimate, EstimateReport};
use crate::floor::{placeholder_texture, FloorMaterial, FloorMesh, MaterialMaps};
use crate::grid::{self, GridOverlay};
use crate::resolver::{TextureCache, TextureLoader, TextureResolver};
use crate::scene::{SceneSlot, SceneSnapshot};
use crate::texture::TextureHandle;
use crate::units::{effective_step_meters, EPSILON};

/// Tiling parameters shared by the textures and the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloorLayout {
    /// Tile period across the room width (X), meters.
    pub unit_x: f64,
    /// Tile period along the room length (Z), meters.
    pub unit_z: f64,
    pub repeat_x: f64,
    pub repeat_y: f64,
    pub rotation: f64,
}

impl FloorLayout {
    pub fn compute(room: &RoomSpec, tile: &TileSpec) -> Self {
        let unit_x = effective_step_meters(tile.width_cm, tile.grout_mm);
        let unit_z = effective_step_meters(tile.length_cm, tile.grout_mm);
        Self {
            unit_x,
            unit_z,
            repeat_x: (room.width_m / unit_x).max(EPSILON),
            repeat_y: (room.length_m / unit_z).max(EPSILON),
            rotation: tile.pattern.rotation(),
        }
    }
}

/// Result of a tile selection.
#[derive(Debug, Clone)]
pub enum Selection {
    Applied(SceneSnapshot),
    /// A newer selection started while this one was loading.
    Superseded,
}

impl Selection {
    pub fn is_applied(&self) -> bool {
        matches!(self, Selection::Applied(_))
    }

    pub fn snapshot(&self) -> Option<&SceneSnapshot> {
        match self {
            Selection::Applied(snapshot) => Some(snapshot),
            Selection::Superseded => None,
        }
    }
}

pub struct FloorPlanner<L> {
    config: PlannerConfig,
    catalog: TileCatalog,
    resolver: TextureResolver<L>,

    inputs: RwLock<PlannerInputs>,
    maps: RwLock<MaterialMaps>,
    placeholder: TextureHandle,

    report: RwLock<Option<EstimateReport>>,
    floor: SceneSlot<FloorMesh>,
    grid: SceneSlot<GridOverlay>,
    snapshot: RwLock<Option<SceneSnapshot>>,

    selection_generation: AtomicU64,
    revision: AtomicU64,
}

impl<L: TextureLoader> FloorPlanner<L> {
    pub fn new(config: PlannerConfig, loader: L) -> Self {
        Self::with_cache(config, loader, Arc::new(TextureCache::new()))
    }

    pub fn with_cache(config: PlannerConfig, loader: L, cache: Arc<TextureCache>) -> Self {
        let resolver = TextureResolver::with_cache(config.asset_base.clone(), loader, cache);
        Self {
            config,
            catalog: TileCatalog::default(),
            resolver,
            inputs: RwLock::new(PlannerInputs::default()),
            maps: RwLock::new(MaterialMaps::default()),
            placeholder: placeholder_texture(),
            report: RwLock::new(None),
            floor: SceneSlot::new(),
            grid: SceneSlot::new(),
            snapshot: RwLock::new(None),
            selection_generation: AtomicU64::new(0),
            revision: AtomicU64::new(0),
        }
    }

    pub fn with_catalog(mut self, catalog: TileCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &TileCatalog {
        &self.catalog
    }

    pub fn resolver(&self) -> &TextureResolver<L> {
        &self.resolver
    }

    pub fn inputs(&self) -> PlannerInputs {
        self.inputs.read().clone()
    }

    pub fn maps(&self) -> MaterialMaps {
        self.maps.read().clone()
    }

    /// Last published estimate strings.
    pub fn report(&self) -> Option<EstimateReport> {
        self.report.read().clone()
    }

    /// Last complete scene, for the render loop.
    pub fn snapshot(&self) -> Option<SceneSnapshot> {
        self.snapshot.read().clone()
    }

    pub fn floor(&self) -> Option<Arc<FloorMesh>> {
        self.floor.current()
    }

    pub fn grid(&self) -> Option<Arc<GridOverlay>> {
        self.grid.current()
    }

    pub fn floor_replacements(&self) -> u64 {
        self.floor.replacements()
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    /// Shows the untextured floor, then loads the default design.
    pub async fn init(&self) -> SceneSnapshot {
        let first = self.recompute();
        let default = self
            .catalog
            .find(&self.config.default_tile)
            .or_else(|| self.catalog.first())
            .map(|design| (design.name.clone(), design.maps.clone()));

        let Some((name, urls)) = default else {
            log::info!("planner ready, tile catalog is empty");
            return first;
        };
        log::info!("planner ready, loading default tile {name}");
        match self.set_tile_maps(urls).await {
            Selection::Applied(snapshot) => snapshot,
            // A caller picked a tile while the default was loading.
            Selection::Superseded => self.snapshot().unwrap_or(first),
        }
    }

    // ── Input surface ────────────────────────────────────────────────────

    pub fn set_inputs(&self, inputs: PlannerInputs) -> SceneSnapshot {
        *self.inputs.write() = inputs;
        self.recompute()
    }

    pub fn set_input(&self, field: InputField, raw: &str) -> SceneSnapshot {
        self.inputs.write().set_field(field, raw);
        self.recompute()
    }

    /// `set_input` by form field name.
    pub fn set_named_input(&self, name: &str, raw: &str) -> Result<SceneSnapshot> {
        self.inputs.write().set_named(name, raw)?;
        Ok(self.recompute())
    }

    // ── Programmatic API ─────────────────────────────────────────────────

    pub fn update(&self) -> SceneSnapshot {
        self.recompute()
    }

    pub async fn set_tile_by_name(&self, name: &str) -> Result<Selection> {
        let Some(design) = self.catalog.find(name) else {
            log::warn!("tile design {name:?} is not in the catalog");
            return Err(PlannerError::UnknownTile(name.to_string()));
        };
        let urls = design.maps.clone();
        Ok(self.set_tile_maps(urls).await)
    }

    /// Uses `url` as the color map and clears the normal and roughness maps.
    pub async fn set_texture(&self, url: &str) -> Selection {
        self.set_tile_maps(MapUrls::diffuse_only(url)).await
    }

    pub async fn set_tile_maps(&self, urls: MapUrls) -> Selection {
        let token = self.selection_generation.fetch_add(1, Ordering::AcqRel) + 1;

        let (diffuse, normal, roughness) = tokio::join!(
            self.resolver.resolve_optional(urls.diffuse.as_deref(), true),
            self.resolver.resolve_optional(urls.normal.as_deref(), false),
            self.resolver.resolve_optional(urls.roughness.as_deref(), false),
        );

        if self.selection_generation.load(Ordering::Acquire) != token {
            log::debug!("tile selection #{token} superseded, dropping its maps");
            return Selection::Superseded;
        }

        // The previous maps are released here; cached textures stay alive.
        *self.maps.write() = MaterialMaps {
            diffuse,
            normal,
            roughness,
        };
        Selection::Applied(self.recompute())
    }

    // ── Recompute ────────────────────────────────────────────────────────

    /// Brings the estimate, the floor and the grid in line with the current
    /// inputs and maps. Never fails.
    pub fn recompute(&self) -> SceneSnapshot {
        let inputs = self.inputs.read().normalize();
        let room = inputs.room;

        let estimate = estimate(&inputs.room, &inputs.tile, &inputs.pricing);
        let report = EstimateReport::new(&estimate, &self.config.display);
        *self.report.write() = Some(report.clone());

        let layout = FloorLayout::compute(&room, &inputs.tile);

        // Repeat and rotation depend on the room, so maps are re-prepared even
        // when the tile has not changed.
        let maps = self.maps.read().clone();
        maps.prepare_all(
            layout.repeat_x,
            layout.repeat_y,
            layout.rotation,
            self.config.max_anisotropy,
        );

        let material = FloorMaterial::from_maps(&maps, &self.placeholder);
        let floor = self.floor.attach(FloorMesh::new(room.width_m, room.length_m, material));
        let grid = grid::rebuild(&self.grid, room.length_m, room.width_m, layout.unit_x, layout.unit_z);

        let revision = self.revision.fetch_add(1, Ordering::AcqRel) + 1;
        log::debug!(
            "recompute #{revision}: {:.2} m², {} tiles, {} boxes, repeat {:.3}x{:.3}",
            estimate.area_m2,
            estimate.tiles_needed,
            estimate.boxes,
            layout.repeat_x,
            layout.repeat_y
        );

        let snapshot = SceneSnapshot {
            inputs,
            estimate,
            report,
            floor: Some(floor),
            grid: Some(grid),
            revision,
        };
        *self.snapshot.write() = Some(snapshot.clone());
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Pattern;
    use crate::resolver::{resolve_key, MemoryTextureLoader};
    use image::RgbaImage;
    use std::collections::HashMap;
    use std::f64::consts::FRAC_PI_4;

    const BASE: &str = "https://showroom.example/planner/";

    fn config() -> PlannerConfig {
        PlannerConfig::default().with_asset_base(BASE)
    }

    fn catalog_loader() -> MemoryTextureLoader {
        let mut loader = MemoryTextureLoader::new();
        for design in TileCatalog::default().iter() {
            for url in [&design.maps.diffuse, &design.maps.normal, &design.maps.roughness]
                .into_iter()
                .flatten()
            {
                loader.insert(resolve_key(BASE, url), RgbaImage::new(4, 4));
            }
        }
        loader
    }

    /// Answers after a per-key number of scheduler yields.
    struct DelayLoader {
        delays: HashMap<String, usize>,
    }

    impl TextureLoader for DelayLoader {
        async fn load(&self, key: &str) -> anyhow::Result<RgbaImage> {
            let delay = self.delays.get(key).copied().unwrap_or(0);
            for _ in 0..delay {
                tokio::task::yield_now().await;
            }
            Ok(RgbaImage::new(2, 2))
        }
    }

    #[test]
    fn test_layout_reference_room() {
        let room = RoomSpec { length_m: 5.0, width_m: 4.0 };
        let tile = TileSpec {
            length_cm: 60.0,
            width_cm: 60.0,
            grout_mm: 2.0,
            pattern: Pattern::Straight,
        };
        let layout = FloorLayout::compute(&room, &tile);
        assert!((layout.unit_x - 0.602).abs() < 1e-12);
        assert!((layout.unit_z - 0.602).abs() < 1e-12);
        assert!((layout.repeat_x - 4.0 / 0.602).abs() < 1e-9);
        assert!((layout.repeat_y - 5.0 / 0.602).abs() < 1e-9);
        assert_eq!(layout.rotation, 0.0);
    }

    #[test]
    fn test_recompute_without_tile_uses_placeholder() {
        let planner = FloorPlanner::new(config(), MemoryTextureLoader::new());
        let snapshot = planner.update();
        assert!(snapshot.is_renderable());
        let floor = snapshot.floor.as_ref().unwrap();
        assert!(floor.material.uses_placeholder());
        assert_eq!(snapshot.report.area, "20.00 m²");
        assert_eq!(snapshot.report.tiles, "61");
        assert_eq!(snapshot.report.boxes, "11");
        assert_eq!(snapshot.report.cost, "70.000 RSD");
        assert_eq!(planner.report(), Some(snapshot.report.clone()));
    }

    #[test]
    fn test_exactly_one_floor_and_grid() {
        let planner = FloorPlanner::new(config(), MemoryTextureLoader::new());
        let first = planner.update();
        let old_floor = Arc::downgrade(first.floor.as_ref().unwrap());
        drop(first);
        planner.set_input(InputField::RoomLength, "6");
        assert!(old_floor.upgrade().is_none());
        assert_eq!(planner.floor_replacements(), 2);
        assert_eq!(planner.floor().unwrap().length_m, 6.0);
        assert_eq!(planner.snapshot().unwrap().revision, 2);
    }

    #[tokio::test]
    async fn test_init_loads_default_tile() {
        let planner = FloorPlanner::new(config(), catalog_loader());
        let snapshot = planner.init().await;

        let maps = planner.maps();
        let diffuse = maps.diffuse.as_ref().unwrap();
        assert_eq!(diffuse.key(), resolve_key(BASE, "assets/Tiles078_1K-JPG_Color.jpg"));
        assert!(!diffuse.is_fallback());
        assert!(diffuse.settings().srgb);
        assert!(maps.normal.is_some() && maps.roughness.is_some());
        assert!(!maps.normal.as_ref().unwrap().settings().srgb);

        let floor = snapshot.floor.as_ref().unwrap();
        assert!(Arc::ptr_eq(&floor.material.base_color, diffuse));
        assert_eq!(snapshot.revision, 2);
        assert_eq!(planner.resolver().cache().loads_issued(), 3);
    }

    #[tokio::test]
    async fn test_failed_textures_still_render() {
        let planner = FloorPlanner::new(config(), MemoryTextureLoader::new());
        planner.init().await;
        let snapshot = planner.set_texture("assets/does-not-exist.jpg").await;
        let snapshot = snapshot.snapshot().unwrap();

        let floor = snapshot.floor.as_ref().unwrap();
        assert!(floor.material.base_color.is_fallback());
        assert!(!floor.material.uses_placeholder());
        assert!(floor.material.normal.is_none());
        assert!(floor.material.roughness_map.is_none());
    }

    #[tokio::test]
    async fn test_room_change_reprepares_without_reload() {
        let planner = FloorPlanner::new(config(), catalog_loader());
        planner.init().await;
        let loads = planner.resolver().cache().loads_issued();
        let diffuse = planner.maps().diffuse.unwrap();
        let before = diffuse.settings().repeat;

        planner.set_input(InputField::RoomWidth, "8");
        let after = diffuse.settings().repeat;
        assert!((after.x - 2.0 * before.x).abs() < 1e-4);
        assert_eq!(after.y, before.y);
        assert_eq!(planner.resolver().cache().loads_issued(), loads);
    }

    #[tokio::test]
    async fn test_grout_changes_layout_not_estimate() {
        let planner = FloorPlanner::new(config(), catalog_loader());
        let before = planner.init().await;
        let repeat_before = planner.maps().diffuse.unwrap().settings().repeat;

        let after = planner.set_input(InputField::Grout, "10");
        assert_eq!(after.estimate, before.estimate);
        assert_eq!(after.report, before.report);

        let repeat_after = planner.maps().diffuse.unwrap().settings().repeat;
        assert!(repeat_after.x < repeat_before.x);
        let grid = after.grid.as_ref().unwrap();
        assert!((grid.step_x - 0.61).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_diagonal_rotates_only() {
        let planner = FloorPlanner::new(config(), catalog_loader());
        let before = planner.init().await;

        let after = planner.set_input(InputField::Pattern, "diagonal");
        assert_eq!(after.inputs.tile.pattern, Pattern::Diagonal);
        assert_eq!(after.estimate.tiles_needed, before.estimate.tiles_needed);
        assert_eq!(after.estimate.cost, before.estimate.cost);

        let maps = planner.maps();
        for map in [&maps.diffuse, &maps.normal, &maps.roughness].into_iter().flatten() {
            assert!((map.settings().rotation as f64 - FRAC_PI_4).abs() < 1e-6);
        }
    }

    #[tokio::test]
    async fn test_unknown_tile_leaves_state() {
        let planner = FloorPlanner::new(config(), catalog_loader());
        planner.init().await;
        let maps = planner.maps();
        let revision = planner.snapshot().unwrap().revision;

        let err = planner.set_tile_by_name("Marble Dream").await.unwrap_err();
        assert!(err.is_unknown_tile());
        assert!(Arc::ptr_eq(planner.maps().diffuse.as_ref().unwrap(), maps.diffuse.as_ref().unwrap()));
        assert_eq!(planner.snapshot().unwrap().revision, revision);
    }

    #[tokio::test]
    async fn test_set_tile_by_name_switches_maps() {
        let planner = FloorPlanner::new(config(), catalog_loader());
        planner.init().await;
        let selection = planner.set_tile_by_name("Onyx Serenity").await.unwrap();
        assert!(selection.is_applied());
        let diffuse = planner.maps().diffuse.unwrap();
        assert_eq!(diffuse.key(), resolve_key(BASE, "assets/Onyx015_1K-JPG_Color.jpg"));
    }

    #[tokio::test]
    async fn test_last_started_selection_wins() {
        let slow = resolve_key(BASE, "slow.jpg");
        let loader = DelayLoader {
            delays: HashMap::from([(slow, 10)]),
        };
        let planner = FloorPlanner::new(config(), loader);
        planner.update();

        let (first, second) = tokio::join!(planner.set_texture("slow.jpg"), planner.set_texture("fast.jpg"));
        assert!(matches!(first, Selection::Superseded));
        assert!(second.is_applied());

        let diffuse = planner.maps().diffuse.unwrap();
        assert_eq!(diffuse.key(), resolve_key(BASE, "fast.jpg"));
        let floor = planner.floor().unwrap();
        assert_eq!(floor.material.base_color.key(), resolve_key(BASE, "fast.jpg"));
    }

    #[tokio::test]
    async fn test_edit_during_pending_selection_is_kept() {
        let slow = resolve_key(BASE, "slow.jpg");
        let loader = DelayLoader {
            delays: HashMap::from([(slow.clone(), 10)]),
        };
        let planner = FloorPlanner::new(config(), loader);
        planner.update();

        let (selection, edited) = tokio::join!(planner.set_texture("slow.jpg"), async {
            tokio::task::yield_now().await;
            planner.set_input(InputField::RoomWidth, "8")
        });
        // The edit lands before the texture, so it still shows the placeholder.
        assert!(edited.floor.as_ref().unwrap().material.uses_placeholder());

        let applied = selection.snapshot().unwrap();
        assert_eq!(applied.inputs.room.width_m, 8.0);
        assert!(applied.revision > edited.revision);
        let floor = applied.floor.as_ref().unwrap();
        assert_eq!(floor.width_m, 8.0);
        assert_eq!(floor.material.base_color.key(), slow);

        let repeat = planner.maps().diffuse.unwrap().settings().repeat;
        assert!((repeat.x as f64 - 8.0 / 0.602).abs() < 1e-4);
    }

    #[test]
    fn test_named_input_errors() {
        let planner = FloorPlanner::new(config(), MemoryTextureLoader::new());
        assert!(planner.set_named_input("roomLen", "7").is_ok());
        assert_eq!(planner.inputs().room_length_m, Some(7.0));
        assert!(matches!(
            planner.set_named_input("height", "3"),
            Err(PlannerError::UnknownField(_))
        ));
    }

    #[test]
    fn test_invalid_input_uses_defaults() {
        let planner = FloorPlanner::new(config(), MemoryTextureLoader::new());
        let snapshot = planner.set_inputs(
            PlannerInputs::new()
                .with_room(f64::NAN, 0.0)
                .with_tile(0.0, 0.0)
                .with_grout(0.0),
        );
        assert_eq!(snapshot.inputs.room.length_m, 5.0);
        assert_eq!(snapshot.inputs.room.width_m, 0.5);
        let grid = snapshot.grid.as_ref().unwrap();
        assert!(grid.lines_x >= 1 && grid.lines_x <= crate::grid::MAX_LINES);
        assert!(snapshot.estimate.boxes >= 1);
    }
}
