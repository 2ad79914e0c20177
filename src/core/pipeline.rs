/// The generation pipeline: seed markdown → parsed units → generated
/// stories appended to the output file.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::core::catalog::{CatalogError, IntentCatalog};
use crate::core::generator::{GenerateError, StoryGenerator, DEFAULT_SAMPLE_CAP};
use crate::core::parser::{ParseError, StoryParser};
use crate::schema::intent_unit::IntentUnit;

/// Seed file read when no input path is given.
pub const DEFAULT_INPUT: &str = "mockStories.md";
/// Output file appended to when no output path is given.
pub const DEFAULT_OUTPUT: &str = "stories.md";
/// Sampled stories generated per run by default.
pub const DEFAULT_SAMPLED_STORIES: usize = 10;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("generation error: {0}")]
    Generate(#[from] GenerateError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Counts from a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub units: usize,
    pub sampled_stories: usize,
    pub repeated_stories: usize,
}

/// Parses a seed file and writes sampled and repeated stories. Built via
/// `StoryForge::builder()`.
pub struct StoryForge {
    input: PathBuf,
    output: PathBuf,
    catalog: IntentCatalog,
    units: Option<Vec<IntentUnit>>,
    sampled_stories: usize,
    sample_cap: usize,
    seed: Option<u64>,
}

/// Builder for constructing a `StoryForge`.
pub struct StoryForgeBuilder {
    input: PathBuf,
    output: PathBuf,
    catalog_path: Option<PathBuf>,
    sampled_stories: usize,
    sample_cap: usize,
    seed: Option<u64>,
    /// Directly provided catalog (for testing without files).
    catalog: Option<IntentCatalog>,
    /// Directly provided units, bypassing the seed file (for testing).
    units: Option<Vec<IntentUnit>>,
}

impl StoryForge {
    pub fn builder() -> StoryForgeBuilder {
        StoryForgeBuilder {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            catalog_path: None,
            sampled_stories: DEFAULT_SAMPLED_STORIES,
            sample_cap: DEFAULT_SAMPLE_CAP,
            seed: None,
            catalog: None,
            units: None,
        }
    }

    /// Parse, configure, then append the sampled pass followed by the
    /// repeated pass to the output file.
    ///
    /// Parsing finishes before the output file is opened, so a parse
    /// failure leaves it untouched. Blocks written before a generation
    /// failure stay in the file.
    pub fn run(&self) -> Result<RunSummary, PipelineError> {
        let mut units = match &self.units {
            Some(units) => units.clone(),
            None => StoryParser::parse(&self.input)?,
        };
        if !self.catalog.is_empty() {
            self.catalog.apply(&mut units);
        }

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut generator = StoryGenerator::new(&units, rng).with_sample_cap(self.sample_cap);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.output)?;
        let mut out = BufWriter::new(file);

        let result = generator
            .generate_sampled(self.sampled_stories, &mut out)
            .and_then(|sampled| {
                generator
                    .generate_repeated(&mut out)
                    .map(|repeated| (sampled, repeated))
            });
        out.flush()?;
        let (sampled_stories, repeated_stories) = result?;

        info!(output = %self.output.display(), sampled_stories, repeated_stories, "stories written");
        Ok(RunSummary {
            units: units.len(),
            sampled_stories,
            repeated_stories,
        })
    }
}

impl StoryForgeBuilder {
    pub fn input(mut self, path: impl AsRef<Path>) -> Self {
        self.input = path.as_ref().to_path_buf();
        self
    }

    pub fn output(mut self, path: impl AsRef<Path>) -> Self {
        self.output = path.as_ref().to_path_buf();
        self
    }

    /// Catalog file, loaded at build time if it exists.
    pub fn catalog(mut self, path: impl AsRef<Path>) -> Self {
        self.catalog_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn sampled_stories(mut self, quantity: usize) -> Self {
        self.sampled_stories = quantity;
        self
    }

    pub fn sample_cap(mut self, cap: usize) -> Self {
        self.sample_cap = cap;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Provide a catalog directly (for testing without files).
    pub fn with_catalog(mut self, catalog: IntentCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Provide parsed units directly (for testing without a seed file).
    pub fn with_units(mut self, units: Vec<IntentUnit>) -> Self {
        self.units = Some(units);
        self
    }

    pub fn build(self) -> Result<StoryForge, PipelineError> {
        let mut catalog = self.catalog.unwrap_or_default();

        // File entries override directly provided ones
        if let Some(ref path) = self.catalog_path {
            if path.exists() {
                catalog.merge(IntentCatalog::load_from_ron(path)?);
            }
        }

        Ok(StoryForge {
            input: self.input,
            output: self.output,
            catalog,
            units: self.units,
            sampled_stories: self.sampled_stories,
            sample_cap: self.sample_cap,
            seed: self.seed,
        })
    }
}
