//! Test utilities and scripted mock engines for metapop development.
//!
//! Provides [`ScriptedEngine`], an in-memory [`RegionEngine`] whose
//! epidemic "dynamics" are a list of pre-scripted events, and
//! [`ScriptedFactory`], an [`EngineFactory`] that builds scripted
//! engines and exposes per-region probes so tests can observe stepping
//! and finalization from outside the scheduler.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Days, NaiveDate};

use metapop_core::{
    Day, EngineBuildSpec, EngineError, EngineFactory, EngineSummary, PopulationSource,
    RegionEngine, ScalarAttr, VariantAttr, MISSING,
};

/// Default simulated start date, matching the upstream data convention.
pub const DEFAULT_START_DATE: &str = "2020-03-01";

/// A pre-scripted epidemic event applied by [`ScriptedEngine::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptEvent {
    /// On `day`, agent `slot` becomes exposed and infectious.
    Infect { day: u32, slot: u32 },
    /// On `day`, agent `slot` dies.
    Kill { day: u32, slot: u32 },
}

/// Observation handle shared between a [`ScriptedEngine`] and the test
/// that owns its factory.
#[derive(Debug, Default)]
pub struct EngineProbe {
    steps: AtomicU32,
    initialized: AtomicBool,
    finalized: AtomicBool,
}

impl EngineProbe {
    /// Number of completed `step()` calls.
    pub fn steps(&self) -> u32 {
        self.steps.load(Ordering::SeqCst)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized.load(Ordering::SeqCst)
    }
}

/// In-memory [`RegionEngine`] driven by scripted events.
///
/// All attribute buffers start at [`MISSING`] except `susceptible`,
/// which starts at 1.0 for every agent. Stepping applies any events
/// scripted for the day being advanced and bumps the summary counters.
pub struct ScriptedEngine {
    label: String,
    n_agents: usize,
    n_variants: usize,
    configured_days: u32,
    start_date: NaiveDate,
    scalars: Vec<Vec<f64>>,
    variants: Vec<Vec<Vec<f64>>>,
    script: Vec<ScriptEvent>,
    fail_step_on: Option<u32>,
    steps_taken: u32,
    total_new_infections: u64,
    cumulative_deaths: u64,
    initialized: bool,
    probe: Arc<EngineProbe>,
}

impl ScriptedEngine {
    /// Create an engine with every buffer at its starting value.
    pub fn new(label: &str, n_agents: usize, n_variants: usize, configured_days: u32) -> Self {
        let mut scalars = vec![vec![MISSING; n_agents]; ScalarAttr::COUNT];
        scalars[ScalarAttr::Susceptible.index()] = vec![1.0; n_agents];
        Self {
            label: label.to_string(),
            n_agents,
            n_variants,
            configured_days,
            start_date: NaiveDate::parse_from_str(DEFAULT_START_DATE, "%Y-%m-%d")
                .expect("default start date parses"),
            scalars,
            variants: vec![vec![vec![MISSING; n_agents]; n_variants]; VariantAttr::COUNT],
            script: Vec::new(),
            fail_step_on: None,
            steps_taken: 0,
            total_new_infections: 0,
            cumulative_deaths: 0,
            initialized: false,
            probe: Arc::new(EngineProbe::default()),
        }
    }

    /// Script an event for a future step.
    pub fn script(&mut self, event: ScriptEvent) {
        self.script.push(event);
    }

    /// Make `step()` fail when advancing the given day.
    pub fn fail_step_on(&mut self, day: u32) {
        self.fail_step_on = Some(day);
    }

    /// Mark an agent infected immediately, before any stepping. Used to
    /// seed infections that the initial synchronization pass must
    /// propagate.
    pub fn seed_infection(&mut self, slot: u32) {
        self.apply_infection(slot, 0);
    }

    /// The probe shared with this engine's factory.
    pub fn probe(&self) -> Arc<EngineProbe> {
        Arc::clone(&self.probe)
    }

    fn apply_infection(&mut self, slot: u32, day: u32) {
        let slot = slot as usize;
        self.scalars[ScalarAttr::Susceptible.index()][slot] = 0.0;
        self.scalars[ScalarAttr::Exposed.index()][slot] = 1.0;
        self.scalars[ScalarAttr::Infectious.index()][slot] = 1.0;
        self.scalars[ScalarAttr::DateExposed.index()][slot] = f64::from(day);
        let count = &mut self.scalars[ScalarAttr::Infections.index()][slot];
        *count = if count.is_nan() { 1.0 } else { *count + 1.0 };
        if !self.variants.is_empty() && self.n_variants > 0 {
            self.variants[VariantAttr::ExposedByVariant.index()][0][slot] = 1.0;
        }
        self.total_new_infections += 1;
    }

    fn apply_kill(&mut self, slot: u32, day: u32) {
        let slot = slot as usize;
        self.scalars[ScalarAttr::Dead.index()][slot] = 1.0;
        self.scalars[ScalarAttr::DateDead.index()][slot] = f64::from(day);
        self.scalars[ScalarAttr::Infectious.index()][slot] = 0.0;
        self.cumulative_deaths += 1;
    }
}

impl RegionEngine for ScriptedEngine {
    fn label(&self) -> &str {
        &self.label
    }

    fn n_agents(&self) -> usize {
        self.n_agents
    }

    fn n_variants(&self) -> usize {
        self.n_variants
    }

    fn configured_days(&self) -> u32 {
        self.configured_days
    }

    fn date(&self, day: Day) -> String {
        self.start_date
            .checked_add_days(Days::new(u64::from(day.0)))
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| format!("day+{day}"))
    }

    fn initialize(&mut self) -> Result<(), EngineError> {
        self.initialized = true;
        self.probe.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn step(&mut self) -> Result<(), EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized {
                region: self.label.clone(),
            });
        }
        let day = self.steps_taken;
        if self.fail_step_on == Some(day) {
            return Err(EngineError::StepFailed {
                region: self.label.clone(),
                day,
                reason: "scripted failure".to_string(),
            });
        }
        let due: Vec<ScriptEvent> = self
            .script
            .iter()
            .copied()
            .filter(|event| match event {
                ScriptEvent::Infect { day: d, .. } | ScriptEvent::Kill { day: d, .. } => *d == day,
            })
            .collect();
        for event in due {
            match event {
                ScriptEvent::Infect { slot, .. } => self.apply_infection(slot, day),
                ScriptEvent::Kill { slot, .. } => self.apply_kill(slot, day),
            }
        }
        self.steps_taken += 1;
        self.probe.steps.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn scalar(&self, attr: ScalarAttr) -> &[f64] {
        &self.scalars[attr.index()]
    }

    fn scalar_mut(&mut self, attr: ScalarAttr) -> &mut [f64] {
        &mut self.scalars[attr.index()]
    }

    fn variant(&self, attr: VariantAttr, variant: usize) -> &[f64] {
        &self.variants[attr.index()][variant]
    }

    fn variant_mut(&mut self, attr: VariantAttr, variant: usize) -> &mut [f64] {
        &mut self.variants[attr.index()][variant]
    }

    fn summary(&self) -> EngineSummary {
        EngineSummary {
            total_new_infections: self.total_new_infections,
            cumulative_deaths: self.cumulative_deaths,
        }
    }

    fn finalize(&mut self) -> Result<(), EngineError> {
        self.probe.finalized.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// [`EngineFactory`] that builds [`ScriptedEngine`]s.
///
/// Region build specs drive the engine shape: agent count from the
/// augmented population size, variant count from the variant list
/// (minimum one), configured days from the `n_days` parameter. Scripted
/// events and forced failures are registered per location code before
/// the scheduler runs; probes are collected per code so tests can
/// observe engines the scheduler owns.
#[derive(Default)]
pub struct ScriptedFactory {
    default_days: u32,
    scripts: Mutex<HashMap<String, Vec<ScriptEvent>>>,
    seeds: Mutex<HashMap<String, Vec<u32>>>,
    fail_build: Mutex<Vec<String>>,
    fail_step: Mutex<HashMap<String, u32>>,
    probes: Mutex<HashMap<String, Arc<EngineProbe>>>,
    specs: Mutex<HashMap<String, EngineBuildSpec>>,
}

impl ScriptedFactory {
    /// Factory whose engines default to `default_days` configured days
    /// when the build spec carries no `n_days` parameter.
    pub fn new(default_days: u32) -> Self {
        Self {
            default_days,
            ..Self::default()
        }
    }

    /// Script an event for the engine of `code`.
    pub fn script(&self, code: &str, event: ScriptEvent) {
        self.scripts
            .lock()
            .expect("scripts lock")
            .entry(code.to_string())
            .or_default()
            .push(event);
    }

    /// Seed an infection in `code` before day 0.
    pub fn seed_infection(&self, code: &str, slot: u32) {
        self.seeds
            .lock()
            .expect("seeds lock")
            .entry(code.to_string())
            .or_default()
            .push(slot);
    }

    /// Make the build of `code` fail.
    pub fn fail_build(&self, code: &str) {
        self.fail_build
            .lock()
            .expect("fail_build lock")
            .push(code.to_string());
    }

    /// Make `code`'s engine fail when advancing `day`.
    pub fn fail_step(&self, code: &str, day: u32) {
        self.fail_step
            .lock()
            .expect("fail_step lock")
            .insert(code.to_string(), day);
    }

    /// The probe for `code`'s engine, once built.
    pub fn probe(&self, code: &str) -> Option<Arc<EngineProbe>> {
        self.probes.lock().expect("probes lock").get(code).cloned()
    }

    /// The build spec `code` was built from, once built.
    pub fn build_spec(&self, code: &str) -> Option<EngineBuildSpec> {
        self.specs.lock().expect("specs lock").get(code).cloned()
    }

    /// Location codes built so far, in build order on the sequential
    /// path (arbitrary order under concurrent construction).
    pub fn built_codes(&self) -> Vec<String> {
        self.probes.lock().expect("probes lock").keys().cloned().collect()
    }
}

impl EngineFactory for ScriptedFactory {
    fn build(&self, spec: &EngineBuildSpec) -> Result<Box<dyn RegionEngine>, EngineError> {
        if self
            .fail_build
            .lock()
            .expect("fail_build lock")
            .contains(&spec.location_code)
        {
            return Err(EngineError::BuildFailed {
                region: spec.location_code.clone(),
                reason: "scripted build failure".to_string(),
            });
        }
        if let PopulationSource::File(path) = &spec.population {
            if !path.exists() {
                return Err(EngineError::MissingPopulationFile {
                    region: spec.location_code.clone(),
                    path: path.display().to_string(),
                });
            }
        }

        let days = spec
            .parameters
            .get("n_days")
            .and_then(|v| v.as_number())
            .map(|v| v as u32)
            .unwrap_or(self.default_days);
        let n_variants = spec.variants.len().max(1);
        let mut engine = ScriptedEngine::new(
            &spec.label,
            spec.population_size as usize,
            n_variants,
            days,
        );
        if let Some(events) = self
            .scripts
            .lock()
            .expect("scripts lock")
            .get(&spec.location_code)
        {
            for &event in events {
                engine.script(event);
            }
        }
        if let Some(slots) = self.seeds.lock().expect("seeds lock").get(&spec.location_code) {
            for &slot in slots {
                engine.seed_infection(slot);
            }
        }
        if let Some(&day) = self
            .fail_step
            .lock()
            .expect("fail_step lock")
            .get(&spec.location_code)
        {
            engine.fail_step_on(day);
        }
        self.probes
            .lock()
            .expect("probes lock")
            .insert(spec.location_code.clone(), engine.probe());
        self.specs
            .lock()
            .expect("specs lock")
            .insert(spec.location_code.clone(), spec.clone());
        Ok(Box::new(engine))
    }
}
