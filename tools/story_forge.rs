/// Story Forge — appends generated stories to `stories.md`.
///
/// Reads `mockStories.md` from the working directory, applies
/// `intents.ron` when present, then writes ten sampled stories followed by
/// one repeated story per intent. Log verbosity follows `RUST_LOG`.

use story_forge::core::pipeline::StoryForge;
use std::process;
use tracing_subscriber::EnvFilter;

const CATALOG_PATH: &str = "intents.ron";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let forge = StoryForge::builder()
        .catalog(CATALOG_PATH)
        .build()
        .unwrap_or_else(|e| {
            eprintln!("Error loading catalog '{}': {}", CATALOG_PATH, e);
            process::exit(1);
        });

    match forge.run() {
        Ok(summary) => println!(
            "Generated {} sampled and {} repeated stories from {} intents",
            summary.sampled_stories, summary.repeated_stories, summary.units
        ),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
