use cloth_core::stats::StepTimings;
use cloth_core::{ClothConfig, ClothSolver, EntityId, SceneConfig, Simulation};
use glam::Vec3;
use wasm_bindgen::prelude::*;

/// Entity id the single cloth of a world is registered under.
const CLOTH_ENTITY: EntityId = EntityId(0);

#[wasm_bindgen]
pub struct ClothWorld {
    simulation: Simulation,
    timings: StepTimings,
}

#[wasm_bindgen]
impl ClothWorld {
    #[wasm_bindgen(constructor)]
    pub fn new(
        num_x: usize,
        num_y: usize,
        spacing: f32,
        thickness: f32,
        bending_compliance: f32,
    ) -> Result<ClothWorld, JsValue> {
        let config = ClothConfig {
            num_x,
            num_y,
            spacing,
            thickness,
            bending_compliance,
            ..ClothConfig::default()
        };
        let cloth = ClothSolver::new(&config).map_err(to_js)?;
        let mut simulation = Simulation::new(SceneConfig::default()).map_err(to_js)?;
        simulation.add_cloth(CLOTH_ENTITY, cloth).map_err(to_js)?;

        web_sys::console::log_1(
            &format!(
                "WASM ClothWorld created: {} particles, {} triangles",
                num_x * num_y,
                2 * num_x.saturating_sub(1) * num_y.saturating_sub(1)
            )
            .into(),
        );

        Ok(ClothWorld {
            simulation,
            timings: StepTimings::new(),
        })
    }

    /// Advance one frame if running. Returns the elapsed wall time in ms.
    #[wasm_bindgen]
    pub fn step(&mut self) -> f32 {
        let start = js_sys::Date::now();
        if !self.simulation.update() {
            return 0.0;
        }
        let elapsed = (js_sys::Date::now() - start) as f32;
        self.timings.record(elapsed);
        elapsed
    }

    /// Average step time of the last completed window, or -1 before the first.
    #[wasm_bindgen]
    pub fn average_step_ms(&self) -> f32 {
        self.timings.average_ms().unwrap_or(-1.0)
    }

    #[wasm_bindgen]
    pub fn run(&mut self) {
        self.simulation.run();
    }

    #[wasm_bindgen]
    pub fn pause(&mut self) {
        self.simulation.pause();
    }

    #[wasm_bindgen]
    pub fn toggle_running(&mut self) {
        self.simulation.toggle_running();
    }

    #[wasm_bindgen]
    pub fn is_paused(&self) -> bool {
        self.simulation.is_paused()
    }

    #[wasm_bindgen]
    pub fn get_positions_ptr(&self) -> *const f32 {
        self.cloth().positions_flat().as_ptr()
    }

    /// Number of `f32` scalars behind `get_positions_ptr`.
    #[wasm_bindgen]
    pub fn get_positions_len(&self) -> usize {
        self.cloth().positions_flat().len()
    }

    #[wasm_bindgen]
    pub fn triangle_ids(&self) -> Vec<u32> {
        self.cloth().mesh().triangle_ids.clone()
    }

    #[wasm_bindgen]
    pub fn edge_ids(&self) -> Vec<u32> {
        self.cloth().mesh().edge_ids.clone()
    }

    #[wasm_bindgen]
    pub fn particle_count(&self) -> usize {
        self.cloth().particle_count()
    }

    #[wasm_bindgen]
    pub fn triangle_count(&self) -> usize {
        self.cloth().mesh().triangle_count()
    }

    #[wasm_bindgen]
    pub fn set_self_collision(&mut self, enabled: bool) {
        self.simulation.set_self_collision(enabled);
    }

    #[wasm_bindgen]
    pub fn toggle_self_collision(&mut self) {
        self.simulation.toggle_self_collision();
    }

    #[wasm_bindgen]
    pub fn set_bending_compliance(&mut self, compliance: f32) -> Result<(), JsValue> {
        self.simulation
            .set_bending_compliance(compliance)
            .map_err(to_js)
    }

    /// Grab the particle nearest to the picked point. Returns its id, or -1.
    #[wasm_bindgen]
    pub fn start_grab(&mut self, x: f32, y: f32, z: f32) -> Result<i32, JsValue> {
        let grabbed = self
            .simulation
            .start_grab(CLOTH_ENTITY, Vec3::new(x, y, z))
            .map_err(to_js)?;
        Ok(grabbed.map_or(-1, |id| id as i32))
    }

    #[wasm_bindgen]
    pub fn move_grabbed(&mut self, x: f32, y: f32, z: f32) {
        self.simulation.move_grab(Vec3::new(x, y, z));
    }

    #[wasm_bindgen]
    pub fn end_grab(&mut self, x: f32, y: f32, z: f32, vx: f32, vy: f32, vz: f32) {
        self.simulation
            .end_grab(Vec3::new(x, y, z), Vec3::new(vx, vy, vz));
    }
}

impl ClothWorld {
    fn cloth(&self) -> &ClothSolver {
        // Registered in the constructor and never removed.
        match self.simulation.cloth(CLOTH_ENTITY) {
            Some(cloth) => cloth,
            None => unreachable!("cloth entity is registered at construction"),
        }
    }
}

fn to_js(err: cloth_core::ClothError) -> JsValue {
    web_sys::console::error_1(&format!("cloth error: {err}").into());
    JsValue::from_str(&err.to_string())
}
