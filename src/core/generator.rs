/// Story generation — renders parsed units into new story markdown.
///
/// Two passes are available: sampled stories, which combine up to
/// `sample_cap` distinct units per story, and repeated stories, which
/// render each unit `quantity` times under its own title.

use rand::Rng;
use std::io::Write;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::sampler::{sample_nonempty_subset, sample_without_replacement, SampleError};
use crate::schema::intent_unit::{IntentUnit, BLANK_LINE};

/// Upper bound on units per sampled story.
pub const DEFAULT_SAMPLE_CAP: usize = 10;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("intent line has no intent marker: {intent:?}")]
    Extraction { intent: String },
    #[error("entity sampling failed: {0}")]
    EntitySample(#[from] SampleError),
}

/// Writes synthetic stories built from a fixed set of parsed units.
pub struct StoryGenerator<'a, R> {
    units: &'a [IntentUnit],
    rng: R,
    sample_cap: usize,
}

impl<'a, R: Rng> StoryGenerator<'a, R> {
    pub fn new(units: &'a [IntentUnit], rng: R) -> Self {
        Self {
            units,
            rng,
            sample_cap: DEFAULT_SAMPLE_CAP,
        }
    }

    pub fn with_sample_cap(mut self, cap: usize) -> Self {
        self.sample_cap = cap;
        self
    }

    /// Units drawn into each sampled story.
    pub fn sample_size(&self) -> usize {
        self.units.len().min(self.sample_cap)
    }

    /// Write one occurrence of `unit`: the intent line, with an entity
    /// object when any entity was selected, followed by the responses.
    pub fn render<W: Write>(&mut self, unit: &IntentUnit, out: &mut W) -> Result<(), GenerateError> {
        render_unit(unit, out, &mut self.rng)
    }

    /// Write `quantity` stories titled `## generated story <n>`, each built
    /// from a fresh draw of distinct units. Returns the number written.
    pub fn generate_sampled<W: Write>(
        &mut self,
        quantity: usize,
        out: &mut W,
    ) -> Result<usize, GenerateError> {
        let size = self.sample_size();
        for number in 0..quantity {
            let sample = sample_without_replacement(self.units, size, &mut self.rng)?;
            writeln!(out, "## generated story {}", number)?;
            for unit in sample {
                render_unit(unit, out, &mut self.rng)?;
            }
            out.write_all(BLANK_LINE.as_bytes())?;
        }
        info!(stories = quantity, units_per_story = size, "wrote sampled stories");
        Ok(quantity)
    }

    /// Write one story per unit, in parse order, titled
    /// `## generated repeated story <intent name>` and holding `quantity`
    /// occurrences of the unit. Stops at the first unit whose intent line
    /// has no marker. Returns the number written.
    pub fn generate_repeated<W: Write>(&mut self, out: &mut W) -> Result<usize, GenerateError> {
        for unit in self.units {
            let name = unit.display_name().ok_or_else(|| GenerateError::Extraction {
                intent: unit.intent.clone(),
            })?;
            debug!(intent = name, quantity = unit.quantity, "repeating");
            writeln!(out, "## generated repeated story {}", name)?;
            for _ in 0..unit.quantity {
                render_unit(unit, out, &mut self.rng)?;
            }
            out.write_all(BLANK_LINE.as_bytes())?;
        }
        info!(stories = self.units.len(), "wrote repeated stories");
        Ok(self.units.len())
    }
}

fn render_unit<W: Write, R: Rng>(
    unit: &IntentUnit,
    out: &mut W,
    rng: &mut R,
) -> Result<(), GenerateError> {
    let mut clauses = String::new();
    for entity in &unit.necessary {
        clauses.push_str(&entity.clause());
    }
    for entity in sample_nonempty_subset(&unit.unnecessary, rng)? {
        clauses.push_str(&entity.clause());
    }

    // The raw intent keeps its terminator, so the object follows on its own line.
    out.write_all(unit.intent.as_bytes())?;
    if !clauses.is_empty() {
        clauses.pop();
        writeln!(out, "{{{}}}", clauses)?;
    }

    for response in &unit.responses {
        out.write_all(response.as_bytes())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::entity::Entity;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn unit(name: &str) -> IntentUnit {
        let mut unit = IntentUnit::new();
        unit.intent = format!("* {}\n", name);
        unit.responses.push(format!(" - utter_{}\n", name));
        unit
    }

    fn render_to_string(unit: &IntentUnit, seed: u64) -> String {
        let units: [IntentUnit; 0] = [];
        let mut generator = StoryGenerator::new(&units, StdRng::seed_from_u64(seed));
        let mut out = Vec::new();
        generator.render(unit, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn entity_count(rendered: &str) -> usize {
        rendered
            .lines()
            .find(|line| line.starts_with('{'))
            .map(|object| object.matches("\":\"").count())
            .unwrap_or(0)
    }

    #[test]
    fn render_without_entities() {
        let mut greet = IntentUnit::new();
        greet.intent = "* greet\n".to_string();
        greet.responses.push(" - Hello!\n".to_string());
        assert_eq!(render_to_string(&greet, 0), "* greet\n - Hello!\n");
    }

    #[test]
    fn render_necessary_only_is_deterministic() {
        let mut book = unit("book");
        book.necessary = vec![Entity::new("city", "Porto"), Entity::new("seats", "2")];
        for seed in 0..20 {
            assert_eq!(
                render_to_string(&book, seed),
                "* book\n{\"city\":\"Porto\",\"seats\":\"2\"}\n - utter_book\n"
            );
        }
    }

    #[test]
    fn render_unnecessary_subset_bounds() {
        let mut book = unit("book");
        book.unnecessary = vec![
            Entity::new("a", "1"),
            Entity::new("b", "2"),
            Entity::new("c", "3"),
        ];
        let units: [IntentUnit; 0] = [];
        let mut generator = StoryGenerator::new(&units, StdRng::seed_from_u64(3));
        let mut min = usize::MAX;
        let mut max = 0;
        for _ in 0..300 {
            let mut out = Vec::new();
            generator.render(&book, &mut out).unwrap();
            let count = entity_count(&String::from_utf8(out).unwrap());
            min = min.min(count);
            max = max.max(count);
        }
        assert_eq!(min, 1);
        assert_eq!(max, 3);
    }

    #[test]
    fn render_necessary_precede_unnecessary() {
        let mut book = unit("book");
        book.necessary = vec![Entity::new("city", "Porto")];
        book.unnecessary = vec![Entity::new("date", "today")];
        assert_eq!(
            render_to_string(&book, 5),
            "* book\n{\"city\":\"Porto\",\"date\":\"today\"}\n - utter_book\n"
        );
    }

    #[test]
    fn sample_size_caps_at_ten() {
        let many: Vec<IntentUnit> = (0..15).map(|i| unit(&format!("i{}", i))).collect();
        let generator = StoryGenerator::new(&many, StdRng::seed_from_u64(0));
        assert_eq!(generator.sample_size(), 10);

        let few: Vec<IntentUnit> = (0..4).map(|i| unit(&format!("i{}", i))).collect();
        let generator = StoryGenerator::new(&few, StdRng::seed_from_u64(0));
        assert_eq!(generator.sample_size(), 4);

        let generator = StoryGenerator::new(&many, StdRng::seed_from_u64(0)).with_sample_cap(3);
        assert_eq!(generator.sample_size(), 3);
    }

    #[test]
    fn sampled_with_no_units() {
        let units: Vec<IntentUnit> = Vec::new();
        let mut generator = StoryGenerator::new(&units, StdRng::seed_from_u64(0));
        let mut out = Vec::new();
        assert_eq!(generator.generate_sampled(2, &mut out).unwrap(), 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "## generated story 0\n\n## generated story 1\n\n"
        );
    }

    #[test]
    fn sampled_small_set_includes_every_unit() {
        let units: Vec<IntentUnit> = ["greet", "affirm", "goodbye"].iter().map(|n| unit(n)).collect();
        let mut generator = StoryGenerator::new(&units, StdRng::seed_from_u64(11));
        let mut out = Vec::new();
        generator.generate_sampled(5, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let blocks: Vec<&str> = text.split("## generated story ").skip(1).collect();
        assert_eq!(blocks.len(), 5);
        for block in blocks {
            assert_eq!(block.matches("* ").count(), 3);
            for name in ["greet", "affirm", "goodbye"] {
                assert!(block.contains(&format!("* {}\n", name)));
            }
        }
    }

    #[test]
    fn sampled_large_set_draws_distinct_units() {
        let units: Vec<IntentUnit> = (0..25).map(|i| unit(&format!("intent_{}", i))).collect();
        let mut generator = StoryGenerator::new(&units, StdRng::seed_from_u64(8));
        let mut out = Vec::new();
        generator.generate_sampled(10, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        for block in text.split("## generated story ").skip(1) {
            let intents: Vec<&str> = block.lines().filter(|l| l.starts_with("* ")).collect();
            assert_eq!(intents.len(), 10);
            let unique: std::collections::HashSet<&&str> = intents.iter().collect();
            assert_eq!(unique.len(), 10);
        }
    }

    #[test]
    fn repeated_renders_quantity_times() {
        let mut greet = unit("greet");
        greet.quantity = 3;
        let units = vec![greet, unit("goodbye")];
        let mut generator = StoryGenerator::new(&units, StdRng::seed_from_u64(0));
        let mut out = Vec::new();
        assert_eq!(generator.generate_repeated(&mut out).unwrap(), 2);

        let text = String::from_utf8(out).unwrap();
        let expected = format!(
            "## generated repeated story greet\n{}\n## generated repeated story goodbye\n{}\n",
            "* greet\n - utter_greet\n".repeat(3),
            "* goodbye\n - utter_goodbye\n".repeat(5),
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn repeated_fails_on_missing_marker() {
        let mut broken = unit("broken");
        broken.intent = "broken\n".to_string();
        let units = vec![unit("greet"), broken];
        let mut generator = StoryGenerator::new(&units, StdRng::seed_from_u64(0));
        let mut out = Vec::new();
        let err = generator.generate_repeated(&mut out).unwrap_err();
        assert!(matches!(err, GenerateError::Extraction { ref intent } if intent == "broken\n"));

        // The block before the failing unit is already written; no malformed title follows.
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("## generated repeated story greet\n"));
        assert_eq!(text.matches("## ").count(), 1);
    }

    #[test]
    fn same_seed_same_output() {
        let mut book = unit("book");
        book.unnecessary = vec![Entity::new("a", "1"), Entity::new("b", "2")];
        let units: Vec<IntentUnit> = vec![book, unit("greet"), unit("bye")];

        let run = |seed| {
            let mut generator = StoryGenerator::new(&units, StdRng::seed_from_u64(seed));
            let mut out = Vec::new();
            generator.generate_sampled(4, &mut out).unwrap();
            generator.generate_repeated(&mut out).unwrap();
            out
        };
        assert_eq!(run(21), run(21));
    }
}
