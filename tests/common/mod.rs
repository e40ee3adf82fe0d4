//! In-memory scene used by the integration tests.

#![allow(dead_code)]

use arenamod::models::{Color, Transform, Vec3};
use arenamod::overrides::LightSettings;
use arenamod::target::{
    ArenaScene, LightTarget, MeshHandle, ObjectTarget, RendererTarget, SkyboxMaterial,
    SkyboxTarget, StateLightController,
};
use camino::{Utf8Path, Utf8PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq)]
pub struct TestRenderer {
    pub name: String,
    pub enabled: bool,
    pub mesh: Option<MeshHandle>,
}

impl TestRenderer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            enabled: true,
            mesh: Some(MeshHandle::new(format!("{name}-mesh"))),
        }
    }
}

impl RendererTarget for TestRenderer {
    fn name(&self) -> &str {
        &self.name
    }
    fn is_enabled(&self) -> bool {
        self.enabled
    }
    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
    fn mesh(&self) -> Option<MeshHandle> {
        self.mesh.clone()
    }
    fn set_mesh(&mut self, mesh: MeshHandle) {
        self.mesh = Some(mesh);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestObject {
    pub name: String,
    pub active: bool,
    pub transform: Transform,
    pub renderers: Vec<TestRenderer>,
    pub children: Vec<TestObject>,
    /// Never written by the engine; lets tests prove an object was skipped.
    pub sentinel: u32,
}

impl TestObject {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            active: true,
            transform: Transform::default(),
            renderers: Vec::new(),
            children: Vec::new(),
            sentinel: 0,
        }
    }

    pub fn at(name: &str, x: f32) -> Self {
        let mut object = Self::new(name);
        object.transform.position = Vec3::new(x, 0.0, 0.0);
        object
    }
}

impl ObjectTarget for TestObject {
    fn name(&self) -> &str {
        &self.name
    }
    fn is_active(&self) -> bool {
        self.active
    }
    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
    fn local_transform(&self) -> Transform {
        self.transform
    }
    fn set_local_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }
    fn renderer_count(&self) -> usize {
        self.renderers.len()
    }
    fn renderer(&self, index: usize) -> Option<&dyn RendererTarget> {
        self.renderers.get(index).map(|r| r as &dyn RendererTarget)
    }
    fn renderer_mut(&mut self, index: usize) -> Option<&mut dyn RendererTarget> {
        self.renderers
            .get_mut(index)
            .map(|r| r as &mut dyn RendererTarget)
    }
    fn child_count(&self) -> usize {
        self.children.len()
    }
    fn child(&self, index: usize) -> Option<&dyn ObjectTarget> {
        self.children.get(index).map(|c| c as &dyn ObjectTarget)
    }
    fn child_mut(&mut self, index: usize) -> Option<&mut dyn ObjectTarget> {
        self.children
            .get_mut(index)
            .map(|c| c as &mut dyn ObjectTarget)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestFader {
    pub enabled: bool,
    pub waiting: f32,
    pub playing: f32,
}

impl StateLightController for TestFader {
    fn is_enabled(&self) -> bool {
        self.enabled
    }
    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
    fn intensity_waiting(&self) -> f32 {
        self.waiting
    }
    fn set_intensity_waiting(&mut self, intensity: f32) {
        self.waiting = intensity;
    }
    fn intensity_playing(&self) -> f32 {
        self.playing
    }
    fn set_intensity_playing(&mut self, intensity: f32) {
        self.playing = intensity;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestLight {
    pub name: String,
    pub active: bool,
    pub enabled: bool,
    pub transform: Transform,
    pub settings: LightSettings,
    pub fader: Option<TestFader>,
}

impl TestLight {
    pub fn new(name: &str, intensity: f32) -> Self {
        Self {
            name: name.to_string(),
            active: true,
            enabled: true,
            transform: Transform::default(),
            settings: LightSettings {
                intensity,
                color: Color::rgb(1.0, 0.9, 0.8),
                ..Default::default()
            },
            fader: None,
        }
    }
}

impl LightTarget for TestLight {
    fn name(&self) -> &str {
        &self.name
    }
    fn is_active(&self) -> bool {
        self.active
    }
    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
    fn is_enabled(&self) -> bool {
        self.enabled
    }
    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
    fn local_transform(&self) -> Transform {
        self.transform
    }
    fn set_local_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }
    fn settings(&self) -> LightSettings {
        self.settings
    }
    fn set_settings(&mut self, settings: LightSettings) {
        self.settings = settings;
    }
    fn state_controller(&self) -> Option<&dyn StateLightController> {
        self.fader.as_ref().map(|f| f as &dyn StateLightController)
    }
    fn state_controller_mut(&mut self) -> Option<&mut dyn StateLightController> {
        self.fader
            .as_mut()
            .map(|f| f as &mut dyn StateLightController)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TestScene {
    pub skybox: Option<SkyboxMaterial>,
    pub refreshes: usize,
    pub objects: Vec<TestObject>,
    pub lights: Vec<TestLight>,
}

/// Everything the engine may write, for bit-for-bit comparisons.
pub type SceneState = (Option<SkyboxMaterial>, Vec<TestObject>, Vec<TestLight>);

impl TestScene {
    /// Two lights, three objects (one with renderers and children), a
    /// procedural skybox.
    pub fn arena() -> Self {
        let mut floor = TestObject::at("Floor", 0.0);
        floor.renderers = vec![TestRenderer::new("FloorTiles"), TestRenderer::new("FloorGlow")];
        floor.children = vec![TestObject::at("Rim", 1.0), TestObject::at("Pillar", 2.0)];

        let mut skybox = SkyboxMaterial::new("Procedural", "Skybox/Procedural");
        skybox.set_float("_SunSize", 0.04);

        Self {
            skybox: Some(skybox),
            refreshes: 0,
            objects: vec![floor, TestObject::at("Stage", 5.0), TestObject::at("Lasers", 9.0)],
            lights: vec![TestLight::new("Key", 1.0), TestLight::new("Fill", 0.25)],
        }
    }

    pub fn state(&self) -> SceneState {
        (self.skybox.clone(), self.objects.clone(), self.lights.clone())
    }
}

impl SkyboxTarget for TestScene {
    fn skybox(&self) -> Option<&SkyboxMaterial> {
        self.skybox.as_ref()
    }
    fn set_skybox(&mut self, material: SkyboxMaterial) {
        self.skybox = Some(material);
    }
    fn refresh_environment(&mut self) {
        self.refreshes += 1;
    }
}

impl ArenaScene for TestScene {
    fn object_count(&self) -> usize {
        self.objects.len()
    }
    fn object(&self, index: usize) -> Option<&dyn ObjectTarget> {
        self.objects.get(index).map(|o| o as &dyn ObjectTarget)
    }
    fn object_mut(&mut self, index: usize) -> Option<&mut dyn ObjectTarget> {
        self.objects
            .get_mut(index)
            .map(|o| o as &mut dyn ObjectTarget)
    }
    fn light_count(&self) -> usize {
        self.lights.len()
    }
    fn light(&self, index: usize) -> Option<&dyn LightTarget> {
        self.lights.get(index).map(|l| l as &dyn LightTarget)
    }
    fn light_mut(&mut self, index: usize) -> Option<&mut dyn LightTarget> {
        self.lights
            .get_mut(index)
            .map(|l| l as &mut dyn LightTarget)
    }
}

pub fn create_test_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, root)
}

pub fn write_json(dir: &Utf8Path, file_name: &str, json: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(file_name), json).unwrap();
}

/// Poll `condition` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(25));
    }
    condition()
}

/// Generous bound for OS file notifications.
pub const WATCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Swap `file_name` in with a single rename so watchers never see a
/// half-written document.
pub fn replace_file(dir: &Utf8Path, file_name: &str, contents: &str) {
    let staging = dir.join(format!("{file_name}.tmp"));
    std::fs::write(&staging, contents).unwrap();
    std::fs::rename(&staging, dir.join(file_name)).unwrap();
}

/// Write a small solid-color PNG.
pub fn write_png(path: &Utf8Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    image::RgbaImage::from_pixel(width, height, image::Rgba([200, 40, 90, 255]))
        .save(path.as_std_path())
        .unwrap();
}
