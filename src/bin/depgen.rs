#![allow(clippy::print_stderr, clippy::print_stdout)]

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::Path;
use std::time::Instant;

use depgen::cli::args::CliArgs;
use depgen::cli::config::{effective_config, load_project, resolve_options};
use depgen::cli::driver::{self, GenerationResult};
use depgen::cli::reporter::Reporter;
use depgen::cli::watch;
use depgen::pipeline::Generator;

const EXIT_SUCCESS: i32 = 0;
const EXIT_DIAGNOSTICS_PRESENT: i32 = 1;

fn main() -> Result<()> {
    // Initialize tracing if DEPGEN_LOG or RUST_LOG is set (zero cost otherwise).
    depgen::tracing_config::init_tracing();

    let args = CliArgs::parse();
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    let (config, base_dir) = load_project(&args, &cwd)?;
    let resolved = resolve_options(&config, &args, &base_dir)?;

    if args.show_config {
        let effective = effective_config(&resolved, &config);
        println!(
            "{}",
            serde_json::to_string_pretty(&effective).context("failed to render config")?
        );
        return Ok(());
    }

    if args.list_candidates {
        print!("{}", driver::list_candidates(&resolved)?);
        return Ok(());
    }

    let pretty = args
        .pretty
        .unwrap_or_else(|| std::io::stderr().is_terminal());
    let generator = Generator::new(driver::open_cache(&resolved), resolved.generator.clone());

    if args.watch {
        return watch::run(&resolved, &generator, |result| {
            report(result, &resolved.base_dir, pretty, args.diagnostics, None);
        });
    }

    let start = Instant::now();
    let result = driver::generate(&resolved, &generator, 1)?;
    driver::persist_cache(&resolved, generator.cache())?;
    report(
        &result,
        &resolved.base_dir,
        pretty,
        args.diagnostics,
        Some(start),
    );

    if result.outcome.has_errors() {
        std::process::exit(EXIT_DIAGNOSTICS_PRESENT);
    }
    std::process::exit(EXIT_SUCCESS);
}

fn report(
    result: &GenerationResult,
    base_dir: &Path,
    pretty: bool,
    statistics: bool,
    start: Option<Instant>,
) {
    if !result.outcome.diagnostics.is_empty() {
        let mut reporter = Reporter::new(pretty).with_base_dir(base_dir.to_path_buf());
        reporter.add_compilation(&result.compilation);
        eprint!("{}", reporter.render(&result.outcome.diagnostics));
    }

    if statistics {
        let stats = result.outcome.stats;
        eprintln!("Files:          {}", stats.files);
        eprintln!("Candidates:     {}", stats.candidates);
        eprintln!("Emitted:        {}", stats.emitted);
        eprintln!("Reused:         {}", stats.reused);
        eprintln!("Skipped:        {}", stats.skipped);
        eprintln!("Excluded:       {}", stats.excluded);
        eprintln!("Evicted:        {}", stats.evicted);
        eprintln!("Written:        {}", result.written.len());
        eprintln!("Deleted:        {}", result.deleted.len());
        if let Some(start) = start {
            eprintln!("Total time:     {:.2}s", start.elapsed().as_secs_f64());
        }
    }
}
