//! Library interface for mixer CLI components

use anyhow::{bail, Context, Result};
use mixer_core::{Catalog, ComposeOptions, Composer, CompositionSummary, FieldPolicy, TypeSystem};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// On-disk encoding of a catalog, picked from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    Json,
    Yaml,
}

impl CatalogFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(CatalogFormat::Json),
            Some("yaml") | Some("yml") => Ok(CatalogFormat::Yaml),
            _ => bail!(
                "Cannot tell the catalog format of {}: expected a .json, .yaml or .yml file",
                path.display()
            ),
        }
    }

    pub fn parse(&self, content: &str) -> Result<Catalog> {
        let catalog = match self {
            CatalogFormat::Json => serde_json::from_str(content)?,
            CatalogFormat::Yaml => serde_yaml::from_str(content)?,
        };
        Ok(catalog)
    }

    pub fn render(&self, catalog: &Catalog) -> Result<String> {
        let content = match self {
            CatalogFormat::Json => serde_json::to_string_pretty(catalog)?,
            CatalogFormat::Yaml => serde_yaml::to_string(catalog)?,
        };
        Ok(content)
    }
}

pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let format = CatalogFormat::from_path(path)?;
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog: {:?}", path))?;
    let catalog = format
        .parse(&content)
        .with_context(|| format!("Failed to parse catalog: {:?}", path))?;
    debug!("Loaded {} unit(s) from {:?}", catalog.units.len(), path);
    Ok(catalog)
}

pub fn save_catalog(path: &Path, catalog: &Catalog) -> Result<()> {
    let content = CatalogFormat::from_path(path)?.render(catalog)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, content).with_context(|| format!("Failed to write catalog: {:?}", path))?;
    info!("Wrote {} unit(s) to {:?}", catalog.units.len(), path);
    Ok(())
}

/// Options file first, then command-line overrides
pub fn resolve_options(
    config: Option<&Path>,
    field_policy: Option<&str>,
    no_trace: bool,
) -> Result<ComposeOptions> {
    let mut options = match config {
        Some(path) => ComposeOptions::from_file(path)
            .with_context(|| format!("Failed to load options from {:?}", path))?,
        None => ComposeOptions::default(),
    };
    if let Some(policy) = field_policy {
        options.field_policy = policy.parse::<FieldPolicy>()?;
    }
    if no_trace {
        options.trace_origins = false;
    }
    Ok(options)
}

/// What to compose: every declared mixin target, or one target from explicit parts
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub target: Option<String>,
    pub parts: Vec<String>,
}

/// Compose the selection inside `catalog`, replacing composed targets in place
pub fn compose_catalog(
    catalog: &mut Catalog,
    selection: &Selection,
    options: ComposeOptions,
) -> Result<Vec<(String, CompositionSummary)>> {
    let ts = TypeSystem::new();
    let composer = Composer::new(&ts).with_options(options);

    let Some(target_name) = &selection.target else {
        if !selection.parts.is_empty() {
            bail!("--parts requires --target");
        }
        return Ok(composer.compose_catalog(catalog)?);
    };

    let mut target = catalog
        .find_unit(target_name)
        .with_context(|| format!("No unit named {} in the catalog", target_name))?
        .clone();
    let part_names = if selection.parts.is_empty() {
        target.mixins.clone()
    } else {
        selection.parts.clone()
    };
    let parts = catalog.resolve_parts(&part_names)?;
    let summary = composer.compose(&mut target, &parts)?;

    let name = target.qualified_name();
    catalog.replace_unit(target);
    Ok(vec![(name, summary)])
}

/// Human-readable listing of the units in a catalog
pub fn describe_catalog(catalog: &Catalog) -> String {
    let mut out = String::new();
    for unit in &catalog.units {
        let _ = write!(
            out,
            "{} ({} method(s), {} field(s))",
            unit.qualified_name(),
            unit.methods.len(),
            unit.fields.len()
        );
        if !unit.mixins.is_empty() {
            let _ = write!(out, " <- {}", unit.mixins.join(", "));
        }
        out.push('\n');
        for source in &unit.sources {
            let _ = writeln!(out, "  composed from {}", source);
        }
    }
    out
}
