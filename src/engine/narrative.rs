use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

/// How the narrator chooses among equivalent phrasings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phrasing {
    /// Uniform pick from a seeded generator.
    Varied,
    /// Always the first template.
    Fixed,
}

/// Picks flavor text for lab explanations.
///
/// Owns its own generator so wording choices never perturb the model's
/// random stream.
pub struct Narrator {
    phrasing: Phrasing,
    rng: StdRng,
    seed: u64,
}

impl Narrator {
    pub fn new(phrasing: Phrasing, seed: u64) -> Self {
        Self { phrasing, rng: StdRng::seed_from_u64(seed), seed }
    }

    pub fn pick<'a>(&mut self, options: &[&'a str]) -> &'a str {
        match (self.phrasing, options.len()) {
            (_, 0) => "",
            (Phrasing::Fixed, _) | (_, 1) => options[0],
            (Phrasing::Varied, n) => options[self.rng.gen_range(0..n)],
        }
    }

    pub fn rewind(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }
}

/// Formats `value` as a percentage of `reference`, guarding a zero reference.
pub fn efficiency(value: f64, reference: f64) -> f64 {
    crate::engine::numeric::safe_div(value, reference) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPTIONS: &[&str] = &["first", "second", "third"];

    #[test]
    fn fixed_phrasing_is_deterministic() {
        let mut n = Narrator::new(Phrasing::Fixed, 9);
        for _ in 0..20 {
            assert_eq!(n.pick(OPTIONS), "first");
        }
    }

    #[test]
    fn varied_phrasing_replays_after_rewind() {
        let mut n = Narrator::new(Phrasing::Varied, 9);
        let first: Vec<&str> = (0..10).map(|_| n.pick(OPTIONS)).collect();
        n.rewind();
        let second: Vec<&str> = (0..10).map(|_| n.pick(OPTIONS)).collect();
        assert_eq!(first, second);
        assert!(first.iter().all(|s| OPTIONS.contains(s)));
    }

    #[test]
    fn empty_options_yield_empty_text() {
        let mut n = Narrator::new(Phrasing::Varied, 1);
        assert_eq!(n.pick(&[]), "");
    }
}
