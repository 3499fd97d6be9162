mod cli;

use ladderforge::logging;
use ladderforge::processor::{BatchProcessor, Job};
use lf_av::{FfprobeProber, ToolRegistry};
use lf_core::config::Config;
use lf_core::events::EventPayload;
use lf_core::{ExecutionKind, Resource, ResourceId};
use lf_pipeline::{
    DurationComparison, IntegrityVerifier, JsonManifestStore, ManifestAssembler, ManifestStore,
    PipelineExecutor, RunContext, Sha256ContentStore,
};
use lf_probe::Prober;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, ResourceArgs};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Directory below the bucket mount holding persisted manifests.
const MANIFEST_DIR: &str = "manifests";

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_or_default(cli.config.as_deref());
    let _log_guard = logging::init(cli.verbose, &config.logging);

    match cli.command {
        Commands::Run { resource, dry_run } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_resources(&config, &resource, dry_run))
        }
        Commands::Plan { resource, duration } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(plan_resources(&config, &resource, duration.as_deref()))
        }
        Commands::Probe { file, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(probe_file(&config, &file, json))
        }
        Commands::Verify { source, output } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(verify_files(&config, &source, &output))
        }
        Commands::Assemble { dir, id, store } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(assemble_dir(&config, &dir, &id, store))
        }
        Commands::CheckTools => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(check_tools(&config))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("ladderforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn prober_for(config: &Config, tools: &ToolRegistry) -> Arc<dyn Prober> {
    Arc::new(
        FfprobeProber::from_registry(tools)
            .with_timeout(Duration::from_secs(config.tools.probe_timeout_secs)),
    )
}

fn build_executor(
    config: &Config,
    dry_run: bool,
    cancellation: CancellationToken,
) -> PipelineExecutor {
    let tools = Arc::new(ToolRegistry::discover(&config.tools));
    let prober = prober_for(config, &tools);
    let manifests = JsonManifestStore::new(config.storage.bucket_mount.join(MANIFEST_DIR));
    let ctx = RunContext::new(tools, prober)
        .with_manifest_store(Arc::new(manifests))
        .with_dry_run(dry_run)
        .with_cancellation(cancellation);
    PipelineExecutor::new(config, ctx)
}

fn resources_from(args: &ResourceArgs) -> Result<Vec<Resource>> {
    if args.files.len() > 1 && (args.id.is_some() || args.subtitle.is_some()) {
        anyhow::bail!("--id and --subtitle apply to a single source file");
    }

    args.files
        .iter()
        .map(|file| -> Result<Resource> {
            let id = match &args.id {
                Some(id) => id.clone(),
                None => Path::new(file)
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .ok_or_else(|| anyhow::anyhow!("cannot derive a resource id from {file:?}"))?,
            };
            let mut resource = Resource::new(
                id,
                file.as_str(),
                args.directory.as_str(),
                args.tracker.as_str(),
            )
            .with_language(args.language.as_str());
            if let Some(subtitle) = &args.subtitle {
                resource = resource.with_subtitle(subtitle.clone());
            }
            Ok(resource)
        })
        .collect()
}

async fn run_resources(config: &Config, args: &ResourceArgs, dry_run: bool) -> Result<()> {
    let resources = resources_from(args)?;
    let kind = ExecutionKind::from(args.kind);

    let cancellation = CancellationToken::new();
    let token = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; stopping after the current stage");
            token.cancel();
        }
    });

    let executor = Arc::new(build_executor(config, dry_run, cancellation));
    let events = executor.context().events.clone();
    let processor = BatchProcessor::new(executor, config.pipeline.concurrency);

    let jobs = resources.into_iter().map(|r| Job::new(r, kind)).collect();
    let results = processor.run_all(jobs).await;

    let mut failed = 0;
    for job in &results {
        match &job.result {
            Ok(run) => {
                println!("\n{} ({})", job.resource_id, run.run_id);
                for event in events.events_for_run(run.run_id) {
                    if let EventPayload::StageFinished {
                        stage,
                        elapsed_ms,
                        outcome,
                        ..
                    } = event.payload
                    {
                        println!("  {stage:<28} {elapsed_ms:>8} ms  {outcome}");
                    }
                }
                match &run.manifest {
                    Some(manifest) => println!(
                        "  published {} videos, content id {}",
                        manifest.artifacts.len(),
                        manifest.content_id
                    ),
                    None if dry_run => println!("  [DRY RUN] {} stages planned", run.stages.len()),
                    None => {}
                }
            }
            Err(e) => {
                failed += 1;
                println!("\n{}: FAILED: {e}", job.resource_id);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} resources failed", results.len());
    }
    Ok(())
}

async fn plan_resources(
    config: &Config,
    args: &ResourceArgs,
    duration: Option<&str>,
) -> Result<()> {
    let resources = resources_from(args)?;
    let kind = ExecutionKind::from(args.kind);
    let executor = build_executor(config, true, CancellationToken::new());
    let tools = executor.context().tools.clone();

    for resource in &resources {
        let chain = match duration {
            Some(raw) => executor.plan_with_duration(resource, kind, raw)?,
            None => executor.plan(resource, kind).await?,
        };

        println!("{} ({kind}): {} stages", resource.id, chain.len());
        for (i, stage) in chain.iter().enumerate() {
            println!("  {}. {stage}", i + 1);
            if let Some(request) = stage.request(&tools) {
                println!("     {}", request.command_line());
            }
        }
    }
    Ok(())
}

async fn probe_file(config: &Config, file: &Path, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let tools = ToolRegistry::discover(&config.tools);
    let probe = prober_for(config, &tools).probe(file).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&probe)?);
    } else {
        println!("File: {}", probe.file_path.display());
        println!("Format: {}", probe.format_name);
        println!("Duration: {}", probe.duration.as_deref().unwrap_or("unknown"));
        println!(
            "Streams: {} ({} video, audio: {})",
            probe.stream_count,
            probe.video_streams().count(),
            if probe.has_audio() { "yes" } else { "no" }
        );
        for (i, stream) in probe.streams.iter().enumerate() {
            print!(
                "  [{}] {} {}",
                i,
                stream.codec_type.as_deref().unwrap_or("?"),
                stream.codec_name.as_deref().unwrap_or("?")
            );
            if let (Some(w), Some(h)) = (stream.width, stream.height) {
                print!(" {w}x{h}");
            }
            println!();
        }
    }

    Ok(())
}

async fn verify_files(config: &Config, source: &Path, output: &Path) -> Result<()> {
    let tools = ToolRegistry::discover(&config.tools);
    let verifier = IntegrityVerifier::new(
        prober_for(config, &tools),
        DurationComparison::from_config(&config.pipeline),
    );

    verifier.check(source, output).await?;
    println!("✓ {} matches {}", output.display(), source.display());
    Ok(())
}

async fn assemble_dir(config: &Config, dir: &Path, id: &str, store: Option<PathBuf>) -> Result<()> {
    let assembler = ManifestAssembler::new(
        Arc::new(Sha256ContentStore),
        config.pipeline.min_artifacts,
    );
    let manifest = assembler.assemble(dir, &ResourceId::from(id)).await?;

    if let Some(store_dir) = store {
        JsonManifestStore::new(store_dir).save(&manifest).await?;
    }
    println!("{}", serde_json::to_string_pretty(&manifest)?);
    Ok(())
}

async fn check_tools(config: &Config) -> Result<()> {
    println!("Checking external tools...\n");

    let tools = ToolRegistry::discover(&config.tools).check_all().await;
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to enable all features.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = Config::load(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("  Bucket mount: {}", config.storage.bucket_mount.display());
    println!("  Remote mode: {:?}", config.remote.mode);
    println!("  Verification: {:?}", config.pipeline.verification);
    println!("  Minimum artifacts: {}", config.pipeline.min_artifacts);
    println!("  Concurrency: {}", config.pipeline.concurrency);

    let warnings = config.validate();
    for warning in &warnings {
        println!("  warning: {warning}");
    }

    Ok(())
}
