use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the depgen binary.
#[derive(Parser, Debug)]
#[command(
    name = "depgen",
    version,
    about = "Incremental build-time dependency injection code generator"
)]
pub struct CliArgs {
    // ==================== Command-line Only Options ====================
    /// Path to depgen.json or a directory containing it.
    #[arg(short = 'p', long = "project")]
    pub project: Option<PathBuf>,

    /// Print the final configuration instead of generating.
    #[arg(long = "showConfig", alias = "show-config")]
    pub show_config: bool,

    /// Print the dependency injection candidates and their members, then stop.
    #[arg(long = "listCandidates", alias = "list-candidates")]
    pub list_candidates: bool,

    /// Watch input files and regenerate on changes.
    #[arg(short = 'w', long)]
    pub watch: bool,

    // ==================== Generation ====================
    /// Name of the assembly code is generated for.
    #[arg(long = "assemblyName", alias = "assembly-name")]
    pub assembly_name: Option<String>,

    /// Directory generated sources are written to.
    #[arg(long = "outDir", alias = "out-dir")]
    pub out_dir: Option<PathBuf>,

    /// Incremental cache file persisted between runs.
    #[arg(long = "cacheFile", alias = "cache-file")]
    pub cache_file: Option<PathBuf>,

    /// Ignore and do not write the incremental cache file.
    #[arg(long = "noCache", alias = "no-cache")]
    pub no_cache: bool,

    /// Analyze classes on the thread pool.
    #[arg(long)]
    pub parallel: Option<bool>,

    /// Line ending of generated sources.
    #[arg(long = "newLine", alias = "new-line", value_enum, ignore_case = true)]
    pub new_line: Option<NewLine>,

    // ==================== Output Formatting ====================
    /// Enable color and formatting in diagnostics.
    #[arg(long)]
    pub pretty: Option<bool>,

    /// Print pass statistics.
    #[arg(long)]
    pub diagnostics: bool,

    // ==================== Input Files ====================
    /// Input files; overrides the configured include patterns.
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum NewLine {
    #[value(name = "lf")]
    Lf,
    #[value(name = "crlf")]
    Crlf,
}
