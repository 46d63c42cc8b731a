use anyhow::{Context, Result, anyhow, bail};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::cli::args::{CliArgs, NewLine};
use crate::pipeline::GeneratorOptions;
use depgen_emitter::EmitOptions;

pub const CONFIG_FILE_NAME: &str = "depgen.json";
const DEFAULT_INCLUDE: &str = "**/*.cs";
const DEFAULT_OUT_DIR: &str = "Generated";
const DEFAULT_CACHE_FILE: &str = "obj/depgen.cache.json";

/// Custom deserializer for boolean options that accepts both bool and string values.
/// This handles cases where depgen.json contains `"parallel": "true"` instead of `"parallel": true`.
fn deserialize_bool_or_string<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match Option::<BoolOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(BoolOrString::Bool(b)) => Ok(Some(b)),
        Some(BoolOrString::String(s)) => {
            let normalized = s.trim().to_lowercase();
            match normalized.as_str() {
                "true" | "1" | "yes" | "on" => Ok(Some(true)),
                "false" | "0" | "no" | "off" => Ok(Some(false)),
                _ => Err(Error::custom(format!(
                    "invalid boolean value: '{}'. Expected true, false, 'true', or 'false'",
                    s
                ))),
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DepgenConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assembly_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<ReferenceConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_file: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_bool_or_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub parallel: Option<bool>,
    #[serde(
        default,
        deserialize_with = "deserialize_bool_or_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub incremental: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indent_size: Option<u8>,
    #[serde(
        default,
        deserialize_with = "deserialize_bool_or_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub use_tabs: Option<bool>,
}

/// Sources of a referenced assembly: visible to lookups, never generated for.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceConfig {
    pub assembly_name: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,
}

/// A set of source files rooted at one directory.
#[derive(Debug, Clone)]
pub struct SourceSet {
    pub root: PathBuf,
    pub include: GlobSet,
    pub exclude: GlobSet,
    /// Directories never walked into (the output directory).
    pub skip_dirs: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ResolvedReference {
    pub assembly_name: String,
    pub sources: SourceSet,
}

/// Configuration after defaults, `extends`, and CLI overrides.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_dir: PathBuf,
    pub assembly_name: String,
    pub sources: SourceSet,
    /// Explicit input files; replace `sources` when non-empty.
    pub files: Vec<PathBuf>,
    pub references: Vec<ResolvedReference>,
    pub out_dir: PathBuf,
    /// `None` when the cache is not persisted.
    pub cache_file: Option<PathBuf>,
    pub generator: GeneratorOptions,
}

pub fn parse_config(source: &str) -> Result<DepgenConfig> {
    let stripped = strip_jsonc(source);
    let normalized = remove_trailing_commas(&stripped);
    let config = serde_json::from_str(&normalized).context("failed to parse depgen.json")?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<DepgenConfig> {
    let mut visited = HashSet::new();
    load_config_inner(path, &mut visited)
}

fn load_config_inner(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<DepgenConfig> {
    let canonical = canonicalize_or_owned(path);
    if !visited.insert(canonical.clone()) {
        bail!("depgen.json extends cycle detected at {}", canonical.display());
    }

    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let mut config =
        parse_config(&source).with_context(|| format!("failed to parse config: {}", path.display()))?;

    if let Some(extends) = config.extends.take() {
        let base_path = resolve_extends_path(path, &extends)?;
        let base = load_config_inner(&base_path, visited)?;
        config = merge_configs(base, config);
    }

    visited.remove(&canonical);
    Ok(config)
}

fn resolve_extends_path(current_path: &Path, extends: &str) -> Result<PathBuf> {
    let base_dir = current_path
        .parent()
        .ok_or_else(|| anyhow!("config has no parent directory"))?;
    let mut candidate = PathBuf::from(extends);
    if candidate.extension().is_none() {
        candidate.set_extension("json");
    }

    if candidate.is_absolute() {
        Ok(candidate)
    } else {
        Ok(base_dir.join(candidate))
    }
}

/// Child values win; unset child values fall back to the base.
fn merge_configs(base: DepgenConfig, child: DepgenConfig) -> DepgenConfig {
    DepgenConfig {
        extends: None,
        assembly_name: child.assembly_name.or(base.assembly_name),
        include: child.include.or(base.include),
        exclude: child.exclude.or(base.exclude),
        references: child.references.or(base.references),
        out_dir: child.out_dir.or(base.out_dir),
        cache_file: child.cache_file.or(base.cache_file),
        parallel: child.parallel.or(base.parallel),
        incremental: child.incremental.or(base.incremental),
        new_line: child.new_line.or(base.new_line),
        indent_size: child.indent_size.or(base.indent_size),
        use_tabs: child.use_tabs.or(base.use_tabs),
    }
}

/// Locate the config file: `--project` (a file or a directory), else
/// `depgen.json` in `cwd` if present.
pub fn resolve_config_path(cwd: &Path, project: Option<&Path>) -> Result<Option<PathBuf>> {
    let Some(project) = project else {
        let candidate = cwd.join(CONFIG_FILE_NAME);
        return Ok(candidate
            .is_file()
            .then(|| canonicalize_or_owned(&candidate)));
    };

    let mut candidate = if project.is_absolute() {
        project.to_path_buf()
    } else {
        cwd.join(project)
    };
    if candidate.is_dir() {
        candidate = candidate.join(CONFIG_FILE_NAME);
    }
    if !candidate.exists() {
        bail!("depgen.json not found at {}", candidate.display());
    }
    if !candidate.is_file() {
        bail!("project path is not a file: {}", candidate.display());
    }
    Ok(Some(canonicalize_or_owned(&candidate)))
}

/// Load the config for `args` (if any) and apply defaults and CLI overrides.
pub fn resolve_config(args: &CliArgs, cwd: &Path) -> Result<ResolvedConfig> {
    let (config, base_dir) = load_project(args, cwd)?;
    resolve_options(&config, args, &base_dir)
}

/// The merged config file for `args` and the directory paths resolve against.
pub fn load_project(args: &CliArgs, cwd: &Path) -> Result<(DepgenConfig, PathBuf)> {
    let config_path = resolve_config_path(cwd, args.project.as_deref())?;
    let config = match config_path.as_deref() {
        Some(path) => load_config(path)?,
        None => DepgenConfig::default(),
    };
    let base_dir = config_path
        .as_deref()
        .and_then(Path::parent)
        .map_or_else(|| cwd.to_path_buf(), Path::to_path_buf);
    Ok((config, base_dir))
}

pub fn resolve_options(config: &DepgenConfig, args: &CliArgs, base_dir: &Path) -> Result<ResolvedConfig> {
    let assembly_name = args
        .assembly_name
        .clone()
        .or_else(|| config.assembly_name.clone())
        .or_else(|| {
            base_dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| anyhow!("assemblyName is not set and cannot be derived"))?;

    let out_dir = match &args.out_dir {
        Some(dir) => absolutize(base_dir, dir),
        None => base_dir.join(config.out_dir.as_deref().unwrap_or(DEFAULT_OUT_DIR)),
    };

    let incremental = config.incremental.unwrap_or(true) && !args.no_cache;
    let cache_file = incremental.then(|| match &args.cache_file {
        Some(file) => absolutize(base_dir, file),
        None => base_dir.join(config.cache_file.as_deref().unwrap_or(DEFAULT_CACHE_FILE)),
    });

    let sources = build_source_set(
        base_dir.to_path_buf(),
        config.include.as_deref(),
        config.exclude.as_deref(),
        vec![out_dir.clone()],
    )?;

    let mut references = Vec::new();
    for reference in config.references.iter().flatten() {
        let root = absolutize(base_dir, Path::new(&reference.path));
        references.push(ResolvedReference {
            assembly_name: reference.assembly_name.clone(),
            sources: build_source_set(
                root,
                reference.include.as_deref(),
                reference.exclude.as_deref(),
                Vec::new(),
            )
            .with_context(|| format!("invalid reference '{}'", reference.assembly_name))?,
        });
    }

    let new_line = match args.new_line {
        Some(NewLine::Lf) => "\n",
        Some(NewLine::Crlf) => "\r\n",
        None => parse_new_line(config.new_line.as_deref())?,
    };
    let indent = parse_indent(config.indent_size, config.use_tabs.unwrap_or(false))?;

    Ok(ResolvedConfig {
        base_dir: base_dir.to_path_buf(),
        assembly_name,
        sources,
        files: args.files.iter().map(|f| absolutize(base_dir, f)).collect(),
        references,
        out_dir,
        cache_file,
        generator: GeneratorOptions {
            parallel: args.parallel.or(config.parallel).unwrap_or(true),
            emit: EmitOptions { indent, new_line },
        },
    })
}

/// The effective configuration in `depgen.json` form, for `--showConfig`.
#[must_use]
pub fn effective_config(resolved: &ResolvedConfig, config: &DepgenConfig) -> DepgenConfig {
    let relative = |path: &Path| {
        path.strip_prefix(&resolved.base_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    };
    DepgenConfig {
        extends: None,
        assembly_name: Some(resolved.assembly_name.clone()),
        include: Some(
            config
                .include
                .clone()
                .unwrap_or_else(|| vec![DEFAULT_INCLUDE.to_string()]),
        ),
        exclude: config.exclude.clone().filter(|e| !e.is_empty()),
        references: config.references.clone().filter(|r| !r.is_empty()),
        out_dir: Some(relative(&resolved.out_dir)),
        cache_file: resolved.cache_file.as_deref().map(relative),
        parallel: Some(resolved.generator.parallel),
        incremental: Some(resolved.cache_file.is_some()),
        new_line: Some(
            if resolved.generator.emit.new_line == "\r\n" { "crlf" } else { "lf" }.to_string(),
        ),
        indent_size: (!resolved.generator.emit.indent.starts_with('\t'))
            .then_some(resolved.generator.emit.indent.len() as u8),
        use_tabs: Some(resolved.generator.emit.indent.starts_with('\t')),
    }
}

pub fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let normalized = normalize_pattern(pattern);
        let glob = Glob::new(&normalized).with_context(|| format!("invalid glob pattern '{pattern}'"))?;
        builder.add(glob);
    }
    builder.build().context("failed to build glob set")
}

fn build_source_set(
    root: PathBuf,
    include: Option<&[String]>,
    exclude: Option<&[String]>,
    skip_dirs: Vec<PathBuf>,
) -> Result<SourceSet> {
    let default_include = [DEFAULT_INCLUDE.to_string()];
    let include = match include {
        Some(patterns) if !patterns.is_empty() => build_glob_set(patterns)?,
        _ => build_glob_set(&default_include)?,
    };
    let exclude = build_glob_set(exclude.unwrap_or(&[]))?;
    Ok(SourceSet {
        root,
        include,
        exclude,
        skip_dirs,
    })
}

/// `src` means everything below `src`; `./` prefixes are dropped.
fn normalize_pattern(pattern: &str) -> String {
    let trimmed = pattern.trim().trim_start_matches("./").replace('\\', "/");
    if trimmed.is_empty() {
        return DEFAULT_INCLUDE.to_string();
    }
    let has_glob = trimmed.contains(['*', '?', '[', '{']);
    let has_extension = Path::new(&trimmed).extension().is_some();
    if !has_glob && !has_extension {
        format!("{}/**/*.cs", trimmed.trim_end_matches('/'))
    } else {
        trimmed
    }
}

fn parse_new_line(value: Option<&str>) -> Result<&'static str> {
    let Some(value) = value else {
        return Ok("\n");
    };
    match normalize_option(value).as_str() {
        "lf" => Ok("\n"),
        "crlf" => Ok("\r\n"),
        _ => bail!("unsupported newLine '{value}'; expected 'lf' or 'crlf'"),
    }
}

fn parse_indent(size: Option<u8>, use_tabs: bool) -> Result<&'static str> {
    if use_tabs {
        return Ok("\t");
    }
    match size.unwrap_or(4) {
        2 => Ok("  "),
        4 => Ok("    "),
        8 => Ok("        "),
        other => bail!("unsupported indentSize {other}; expected 2, 4, or 8"),
    }
}

fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn canonicalize_or_owned(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn normalize_option(value: &str) -> String {
    let mut normalized = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch == '-' || ch == '_' || ch.is_whitespace() {
            continue;
        }
        normalized.push(ch.to_ascii_lowercase());
    }
    normalized
}

fn strip_jsonc(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escape = false;
    let mut in_line_comment = false;
    let mut in_block_comment = false;

    while let Some(ch) = chars.next() {
        if in_line_comment {
            if ch == '\n' {
                in_line_comment = false;
                out.push(ch);
            }
            continue;
        }

        if in_block_comment {
            if ch == '*' {
                if let Some('/') = chars.peek().copied() {
                    chars.next();
                    in_block_comment = false;
                }
            } else if ch == '\n' {
                out.push(ch);
            }
            continue;
        }

        if in_string {
            out.push(ch);
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        if ch == '"' {
            in_string = true;
            out.push(ch);
            continue;
        }

        if ch == '/'
            && let Some(&next) = chars.peek()
        {
            if next == '/' {
                chars.next();
                in_line_comment = true;
                continue;
            }
            if next == '*' {
                chars.next();
                in_block_comment = true;
                continue;
            }
        }

        out.push(ch);
    }

    out
}

fn remove_trailing_commas(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escape = false;

    while let Some(ch) = chars.next() {
        if in_string {
            out.push(ch);
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        if ch == '"' {
            in_string = true;
            out.push(ch);
            continue;
        }

        if ch == ',' {
            let mut lookahead = chars.clone();
            while lookahead.peek().is_some_and(|next| next.is_whitespace()) {
                lookahead.next();
            }
            if matches!(lookahead.peek(), Some('}' | ']')) {
                continue;
            }
        }

        out.push(ch);
    }

    out
}
