use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wayfarer_input::ScriptedInput;
use wayfarer_kernel::{LevelFile, PhysicsFrame};
use wayfarer_render::{AnimationPose, DebugTextRenderer, RenderView, Renderer};
use wayfarer_runtime::{FramePacing, Host, PhysicsPacing, Runtime, RuntimeConfig};
use wayfarer_tools::{FrameInspector, check_level};

#[derive(Parser)]
#[command(name = "wayfarer-cli", about = "Fixed-tick character physics runtime")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a level headless and print frames as text
    Run {
        /// Level file; the built-in demo level when omitted
        #[arg(short, long)]
        level: Option<PathBuf>,
        /// Runtime config (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Input script (YAML); a short walk-and-jump when omitted
        #[arg(short, long)]
        script: Option<PathBuf>,
        /// Wall-clock seconds to run
        #[arg(long, default_value = "6")]
        seconds: f32,
        /// Print every Nth frame
        #[arg(long, default_value = "30")]
        print_every: u64,
        /// Run physics and frames as fast as possible
        #[arg(long)]
        unthrottled: bool,
    },
    /// Create and check level files
    Level {
        #[command(subcommand)]
        command: LevelCommands,
    },
    /// Print the effective runtime config as YAML
    Config {
        /// Config file to load instead of the defaults
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum LevelCommands {
    /// Write the demo level to a file
    New {
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Validate a level and cook its meshes
    Check { path: PathBuf },
}

/// Prints every Nth frame through the debug text renderer until the deadline.
struct TextHost {
    renderer: DebugTextRenderer,
    deadline: Instant,
    print_every: u64,
    last: Option<String>,
}

impl Host for TextHost {
    fn frame(&mut self, frame: &PhysicsFrame, alpha: f32, animation: &AnimationPose) -> bool {
        let view = frame
            .player
            .map(|p| RenderView::follow(p.foot, 25.0))
            .unwrap_or_default();
        let text = self.renderer.render(frame, alpha, Some(animation), &view);
        if self.renderer.frames() % self.print_every.max(1) == 1 {
            println!("{text}");
        }
        self.last = Some(FrameInspector::summary(frame).to_string());
        Instant::now() < self.deadline
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<RuntimeConfig> {
    match path {
        Some(path) => RuntimeConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(RuntimeConfig::default()),
    }
}

fn run(
    level: Option<PathBuf>,
    config: Option<PathBuf>,
    script: Option<PathBuf>,
    seconds: f32,
    print_every: u64,
    unthrottled: bool,
) -> anyhow::Result<()> {
    let mut config = load_config(config.as_deref())?;
    if unthrottled {
        config.physics.pacing = PhysicsPacing::Unthrottled;
        config.display.pacing = FramePacing::Uncapped;
    }
    let level = match level {
        Some(path) => LevelFile::load(&path)
            .with_context(|| format!("loading level {}", path.display()))?,
        None => LevelFile::demo(),
    };
    let mut input = match script {
        Some(path) => ScriptedInput::load(&path)
            .with_context(|| format!("loading input script {}", path.display()))?,
        None => ScriptedInput::demo(),
    };
    if !(seconds.is_finite() && seconds > 0.0) {
        bail!("--seconds must be positive, got {seconds}");
    }

    tracing::info!(level = %level.name, seconds, unthrottled, "starting headless run");
    let runtime = Runtime::new(config, &level).context("initializing runtime")?;
    let mut host = TextHost {
        renderer: DebugTextRenderer::new(),
        deadline: Instant::now() + Duration::from_secs_f32(seconds),
        print_every,
        last: None,
    };
    let report = runtime.run(&mut host, &mut input).context("running")?;

    if let Some(last) = &host.last {
        println!("{last}");
    }
    println!(
        "Ran {} frames, {} ticks ({} overruns), {} commands applied",
        report.frames,
        report.physics.ticks,
        report.physics.overruns,
        report.physics.commands_applied
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Run {
            level,
            config,
            script,
            seconds,
            print_every,
            unthrottled,
        } => run(level, config, script, seconds, print_every, unthrottled)?,
        Commands::Level { command } => match command {
            LevelCommands::New { path, force } => {
                if path.exists() && !force {
                    bail!("{} already exists (use --force to overwrite)", path.display());
                }
                let level = LevelFile::demo();
                level
                    .save(&path)
                    .with_context(|| format!("writing level {}", path.display()))?;
                println!(
                    "Wrote level '{}' with {} objects to {}",
                    level.name,
                    level.objects.len(),
                    path.display()
                );
            }
            LevelCommands::Check { path } => {
                let level = LevelFile::load(&path)
                    .with_context(|| format!("loading level {}", path.display()))?;
                let report = check_level(&level);
                println!("{report}");
                if !report.is_clean() {
                    bail!("level {} has problems", path.display());
                }
            }
        },
        Commands::Config { path } => {
            let config = load_config(path.as_deref())?;
            print!("{}", config.to_yaml().context("serializing config")?);
        }
    }

    Ok(())
}
