//! gopium CLI: reproduces `cmd/gopium`'s flag surface over the `gopium`
//! library crate.

use std::process::ExitCode;

use clap::Parser;
use gopium::config::GopiumConfig;
use gopium::context::CancelToken;
use gopium::platform::Platform;
use gopium::strategies::TagType;

/// Gopium is the tool for automating non-trivial struct layout actions:
/// cpu cache alignment, false sharing avoidance, memory packing, padding
/// annotation, and tag-group dispatch over a package of struct
/// declarations.
#[derive(Parser, Debug)]
#[command(name = "gopium", version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Walker name: json_std, xml_std, csv_std, json_files, xml_files,
    /// csv_files, md_files, sync_ast, sync_ast_std, sync_ast_gopium.
    #[arg(short = 'w', long)]
    walker_name: String,

    /// Package name, used to name combined *_files/*_std output.
    #[arg(short = 'n', long)]
    package_name: String,

    /// Strategy names to compose into the pipeline, applied in order.
    strategies: Vec<String>,

    /// Target compiler, carried for CLI compatibility; gopium itself only
    /// understands Rust source.
    #[arg(short = 'c', long, default_value = "gc")]
    target_compiler: String,

    /// Target architecture: selects the default word size when no cache
    /// line sizes override it.
    #[arg(short = 'a', long, default_value = "amd64")]
    target_architecture: String,

    /// L1,L2,L3 cache line sizes in bytes.
    #[arg(short = 'l', long, value_delimiter = ',', default_value = "64,64,64")]
    target_cpu_cache_line_sizes: Vec<u64>,

    /// Directory containing the package's source files.
    #[arg(short = 'p', long, default_value = ".")]
    package_path: String,

    #[arg(long, value_delimiter = ',')]
    package_build_envs: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    package_build_flags: Vec<String>,

    /// Only struct names matching this regexp are visited.
    #[arg(short = 'r', long, default_value = ".*")]
    walker_regexp: String,

    /// Recurse into nested scopes (inline mods, fn bodies).
    #[arg(short = 'd', long, default_value_t = true)]
    walker_deep: bool,

    /// Resolve named-struct-field sizes through previously computed results.
    #[arg(short = 'b', long, default_value_t = true)]
    walker_backref: bool,

    /// none|soft|force: whether to record the pipeline's strategy names
    /// back onto every visited field as a gopium tag.
    #[arg(short = 'g', long, default_value = "none")]
    tag_type: String,

    /// Seconds before the run is cancelled; 0 means no timeout.
    #[arg(short = 't', long, default_value_t = 0)]
    timeout: u64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let root = CancelToken::new();
    {
        let root = root.clone();
        if let Err(e) = ctrlc::set_handler(move || root.cancel()) {
            tracing::warn!(%e, "failed to install signal handler");
        }
    }

    match build_config(&cli).and_then(|cfg| gopium::orchestrator::run(&cfg, &root)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("gopium: {e}");
            ExitCode::FAILURE
        }
    }
}

fn build_config(cli: &Cli) -> Result<GopiumConfig, gopium::GopiumError> {
    let mut cache = [0u64; 3];
    for (slot, v) in cache.iter_mut().zip(cli.target_cpu_cache_line_sizes.iter()) {
        *slot = *v;
    }
    let word = if cli.target_architecture == "386" || cli.target_architecture == "arm" { 4 } else { 8 };
    let platform = Platform::new(word, word, cache);
    let tag_type = TagType::parse(&cli.tag_type)?;

    Ok(GopiumConfig {
        walker_name: cli.walker_name.clone(),
        package_name: cli.package_name.clone(),
        strategies: cli.strategies.clone(),
        package_path: cli.package_path.clone(),
        package_build_envs: cli.package_build_envs.clone(),
        package_build_flags: cli.package_build_flags.clone(),
        walker_regexp: cli.walker_regexp.clone(),
        walker_deep: cli.walker_deep,
        walker_backref: cli.walker_backref,
        tag_type,
        timeout: cli.timeout,
        platform,
    })
}
