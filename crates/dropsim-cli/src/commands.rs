//! CLI command implementations.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use dropsim_bench::{BenchmarkMetrics, BenchmarkRunner, Scenario, ScenarioKind};
use dropsim_compute::Backend;
use dropsim_io::{JsonMesh, PreparedRun, SimulationRequest};
use dropsim_material::MaterialLibrary;
use dropsim_mesh::TetMesh;
use dropsim_results::ResultsArtifact;
use dropsim_scheduler::{ExecutionMode, JobStatus, PlanTier, ProgressMessage, Scheduler, SchedulerConfig};
use dropsim_telemetry::{EventBus, EventKind, EventSender, JsonLinesSink, SimulationEvent, TracingSink};
use dropsim_types::DropError;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Poll period of the server wait loop.
const WAIT_SLICE: Duration = Duration::from_millis(200);

pub struct SimulateArgs {
    pub request: PathBuf,
    pub mesh: PathBuf,
    pub plan: PlanTier,
    pub output: PathBuf,
    pub events: Option<PathBuf>,
    pub scheduler: Option<PathBuf>,
}

/// Run one drop test, locally or through the job scheduler depending on
/// mesh size and plan.
pub fn simulate(args: &SimulateArgs) -> CliResult {
    println!("dropsim Simulation");
    println!("──────────────────");

    let library = MaterialLibrary::with_defaults();
    let request = SimulationRequest::load(&args.request)?;
    let mesh = dropsim_io::load_mesh(&args.mesh)?;
    let run = PreparedRun::prepare(&request, &mesh, &library)?;

    let config = match &args.scheduler {
        Some(path) => SchedulerConfig::from_toml_str(&std::fs::read_to_string(path)?)?,
        None => SchedulerConfig::default(),
    };
    config.validate()?;
    let mode = config.schedule(run.element_count(), args.plan)?;
    tracing::info!(
        elements = run.element_count(),
        plan = args.plan.name(),
        mode = %mode,
        "drop test scheduled"
    );

    println!("Request:   {}", args.request.display());
    println!("Mesh:      {} nodes, {} elements", mesh.node_count(), mesh.element_count());
    println!("Plan:      {}", args.plan.name());
    println!("Mode:      {mode}");
    println!("Impact:    {:.3} m/s", run.impact_speed);
    println!();

    let mut bus = EventBus::new();
    bus.add_sink(Box::new(TracingSink));
    if let Some(path) = &args.events {
        bus.add_sink(Box::new(JsonLinesSink::new(BufWriter::new(File::create(path)?))));
    }

    let (status, artifact) = if mode == ExecutionMode::Wasm {
        let sender = bus.sender();
        let outcome = dropsim_scheduler::run_local(&run, &config, Arc::new(AtomicBool::new(false)), move |msg| {
            emit_progress(&sender, msg)
        })?;
        emit_finished(
            &bus.sender(),
            outcome.steps,
            outcome.status,
            &outcome.artifact,
            outcome.error.as_ref().map(|e| e.to_string()),
        );
        (outcome.status, Some(outcome.artifact))
    } else {
        run_on_server(&mut bus, config, run, &request.name, args.plan)?
    };
    bus.finish();

    println!();
    println!("Status:    {status}");
    match artifact {
        Some(artifact) => {
            print_summary(&artifact);
            artifact.write_json(&args.output)?;
            println!("Results written to: {}", args.output.display());
        }
        None => println!("No results were recorded."),
    }
    if let Some(path) = &args.events {
        println!("Events written to:  {}", path.display());
    }

    if status == JobStatus::Completed {
        Ok(())
    } else {
        Err(format!("simulation ended as {status}").into())
    }
}

fn run_on_server(
    bus: &mut EventBus,
    config: SchedulerConfig,
    run: PreparedRun,
    name: &str,
    plan: PlanTier,
) -> Result<(JobStatus, Option<ResultsArtifact>), Box<dyn std::error::Error>> {
    let mut scheduler = Scheduler::start(config)?;
    let progress = scheduler
        .take_progress()
        .ok_or("progress channel already taken")?;
    let id = scheduler.submit(name, run, plan)?;
    tracing::debug!(job = %id, "waiting on server job");
    let sender = bus.sender();
    let mut steps = 0;
    let mut forward = |sender: &EventSender| {
        for msg in progress.try_iter() {
            steps = msg.iteration;
            emit_progress(sender, &msg);
        }
    };

    loop {
        match scheduler.wait(id, WAIT_SLICE) {
            Ok(_) => break,
            Err(DropError::Timeout { .. }) => {
                forward(&sender);
                bus.flush();
            }
            Err(e) => return Err(e.into()),
        }
    }
    forward(&sender);

    let (job, artifact) = scheduler.take_finished(id)?;
    if let Some(artifact) = &artifact {
        emit_finished(&sender, steps, job.status, artifact, job.error.clone());
    }
    scheduler.shutdown();
    Ok((job.status, artifact))
}

fn emit_progress(sender: &EventSender, msg: &ProgressMessage) {
    sender.emit(SimulationEvent::new(
        msg.iteration,
        EventKind::Progress {
            time: msg.time,
            progress_pct: msg.progress_pct,
            elapsed_time: msg.elapsed_time,
        },
    ));
}

fn emit_finished(
    sender: &EventSender,
    step: u64,
    status: JobStatus,
    artifact: &ResultsArtifact,
    error: Option<String>,
) {
    sender.emit(SimulationEvent::new(
        step,
        EventKind::Finished {
            status: status.to_string(),
            peak_g: Some(artifact.summary.peak_g),
            error,
        },
    ));
}

fn print_summary(artifact: &ResultsArtifact) {
    let summary = &artifact.summary;
    println!("Peak:      {:.2} g at {:.4} s", summary.peak_g, summary.peak_g_time);
    println!("Samples:   {}", summary.samples_used);
    if let Some(error) = &summary.error {
        println!("Error:     {error}");
    }
    for sensor in &artifact.sensors {
        match &sensor.peak {
            Some(peak) => println!("  {:<16} {:>8.2} g  ({} samples)", sensor.sensor, peak.peak_g, sensor.samples),
            None => println!("  {:<16}        -    ({} samples)", sensor.sensor, sensor.samples),
        }
    }
    if !artifact.snapshots.is_empty() {
        println!("Snapshots: {}", artifact.snapshots.len());
    }
}

/// Run benchmark suite.
pub fn benchmark(scenario_name: &str, backend: Backend, output_path: Option<&Path>) -> CliResult {
    println!("dropsim Benchmark Suite");
    println!("═══════════════════════");
    println!();

    let kinds: Vec<ScenarioKind> = if scenario_name == "all" {
        ScenarioKind::all().to_vec()
    } else {
        let kind = ScenarioKind::from_name(scenario_name).ok_or_else(|| {
            let available: Vec<&str> = ScenarioKind::all().iter().map(|k| k.name()).collect();
            format!("Unknown scenario: '{scenario_name}'. Available: {}, all", available.join(", "))
        })?;
        vec![kind]
    };

    let mut all_metrics = Vec::new();
    for &kind in &kinds {
        let scenario = Scenario::from_kind(kind)?;
        println!(
            "Running: {} ({} nodes, {} elements, {})",
            kind.name(),
            scenario.mesh.node_count(),
            scenario.mesh.element_count(),
            backend.name(),
        );

        let metrics = BenchmarkRunner::run(&scenario, backend).map_err(|e| format!("Benchmark failed: {e}"))?;

        println!("  Status:        {}", metrics.status);
        println!("  Steps:         {} (dt {:.3e}s)", metrics.timesteps, metrics.dt);
        println!("  Wall time:     {:.3}s", metrics.total_wall_time);
        println!("  Avg step:      {:.3}ms", metrics.avg_step_time * 1000.0);
        println!("  Peak:          {:.2} g", metrics.peak_g);
        match metrics.within_band {
            Some(true) => println!("  Band:          pass"),
            Some(false) => println!("  Band:          FAIL"),
            None => {}
        }
        println!();

        all_metrics.push(metrics);
    }

    let csv = BenchmarkMetrics::to_csv(&all_metrics);
    if let Some(path) = output_path {
        std::fs::write(path, &csv)?;
        println!("Results written to: {}", path.display());
    } else {
        println!("CSV Output:");
        println!("{csv}");
    }

    if all_metrics.iter().any(|m| m.within_band == Some(false)) {
        return Err("one or more scenarios fell outside their expected band".into());
    }
    Ok(())
}

/// Validate a request, and its mesh if given.
pub fn validate(request_path: &Path, mesh_path: Option<&Path>) -> CliResult {
    println!("dropsim Validator");
    println!("─────────────────");
    println!();

    let library = MaterialLibrary::with_defaults();
    println!("Validating request: {}", request_path.display());
    let request = SimulationRequest::load(request_path)?;

    let outcome = match mesh_path {
        Some(path) => {
            println!("Validating mesh:    {}", path.display());
            let mesh = dropsim_io::load_mesh(path)?;
            dropsim_io::validate_request_for_mesh(&request, &mesh, &library)
                .map(|()| format!("{} nodes, {} elements", mesh.node_count(), mesh.element_count()))
        }
        None => dropsim_io::validate_request(&request, &library).map(|()| format!("{} materials", request.materials.len())),
    };

    match outcome {
        Ok(detail) => {
            println!("✅ Valid ({detail}).");
            Ok(())
        }
        Err(e) => {
            println!("❌ Validation failed: {e}");
            Err(e.into())
        }
    }
}

/// Print the execution mode for a mesh size under a plan.
pub fn schedule(element_count: usize, plan: PlanTier) -> CliResult {
    let config = SchedulerConfig::default();
    let entitlements = plan.entitlements();
    let mode = config.schedule(element_count, plan)?;

    println!("Elements:     {element_count}");
    println!("Plan:         {} (max {} elements)", plan.name(), entitlements.max_elements);
    println!("Mode:         {mode}");
    println!("Backend:      {}", mode.backend().name());
    if mode.is_server() {
        println!("Wall clock:   {:.0}s limit", entitlements.wall_clock_limit);
    }
    Ok(())
}

/// Inspect a mesh file or a results artifact.
pub fn inspect(path: &Path) -> CliResult {
    println!("dropsim Inspector");
    println!("─────────────────");
    println!();

    let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
    if is_json {
        let text = std::fs::read_to_string(path)?;
        if let Ok(artifact) = ResultsArtifact::from_json(&text) {
            println!("Results artifact: {}", path.display());
            println!("Status:    {}", artifact.summary.status);
            print_summary(&artifact);
            return Ok(());
        }
        let mesh = JsonMesh::parse(&text)?.to_mesh()?;
        print_mesh(path, &mesh);
    } else {
        let mesh = dropsim_io::load_mesh(path)?;
        print_mesh(path, &mesh);
    }
    Ok(())
}

fn print_mesh(path: &Path, mesh: &TetMesh) {
    let (min, max) = mesh.bounding_box();
    let mut materials: Vec<u16> = mesh.material_ids.iter().map(|m| m.0).collect();
    materials.sort_unstable();
    materials.dedup();

    println!("Mesh:         {}", path.display());
    println!("Nodes:        {}", mesh.node_count());
    println!("Elements:     {}", mesh.element_count());
    println!("Fixed nodes:  {}", mesh.fixed_count());
    println!("Materials:    {materials:?}");
    println!("Volume:       {:.6e} m³", mesh.total_volume());
    println!(
        "Bounds:       [{:.4}, {:.4}, {:.4}] .. [{:.4}, {:.4}, {:.4}]",
        min.x, min.y, min.z, max.x, max.y, max.z
    );
    match mesh.validate() {
        Ok(()) => println!("✅ Mesh is valid."),
        Err(e) => println!("❌ Mesh validation failed: {e}"),
    }
}

/// List the built-in material presets.
pub fn materials() -> CliResult {
    let library = MaterialLibrary::with_defaults();
    println!("{:<18} {:<16} {:>12} {:>14} {:>12}", "preset", "model", "density", "modulus (Pa)", "wave (m/s)");
    for name in library.names() {
        if let Some(material) = library.get(name) {
            println!(
                "{:<18} {:<16} {:>12.1} {:>14.4e} {:>12.1}",
                name,
                material.model_name(),
                material.density(),
                material.effective_modulus(),
                material.wave_speed()
            );
        }
    }
    Ok(())
}
