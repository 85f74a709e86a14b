//! Parallel ranking.
//!
//! Candidates are split into one contiguous slice per worker and scored
//! on scoped threads. Every worker pushes its hits into a shared queue and
//! keeps its own best hit in a private slot, so the only contended lock is
//! one append per worker. The caller blocks until all workers finish.

use std::cmp::Ordering;

use parking_lot::Mutex;

use crate::candidate::Candidate;
use crate::score::{Pattern, score_candidate};
use crate::settings::SearchSettings;

/// A candidate index with its score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredCandidate {
    pub index: usize,
    pub score: f32,
}

impl ScoredCandidate {
    /// Higher score first, then lower index.
    fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then(self.index.cmp(&other.index))
    }
}

/// Ranked output of a search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    /// The single highest-scoring candidate.
    pub best: Option<ScoredCandidate>,
    /// Other candidates above the secondary threshold, best first.
    pub secondary: Vec<ScoredCandidate>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.best.is_none()
    }

    pub fn len(&self) -> usize {
        usize::from(self.best.is_some()) + self.secondary.len()
    }

    /// Best match followed by the secondary results.
    pub fn iter(&self) -> impl Iterator<Item = &ScoredCandidate> {
        self.best.iter().chain(&self.secondary)
    }
}

/// Fuzzy ranking over candidate lists.
#[derive(Debug, Clone, Default)]
pub struct SearchEngine {
    settings: SearchSettings,
}

impl SearchEngine {
    pub fn new(settings: SearchSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Ranks `candidates` against `pattern`. An empty pattern matches
    /// nothing.
    pub fn rank(&self, candidates: &[Candidate], pattern: &str) -> SearchResults {
        let pattern = Pattern::new(pattern);
        if pattern.is_empty() || candidates.is_empty() {
            return SearchResults::default();
        }

        let workers = self.settings.effective_threads().clamp(1, candidates.len());
        let (hits, best) = if workers == 1 || candidates.len() < self.settings.min_parallel {
            let mut best = None;
            let hits = score_slice(candidates, 0, &pattern, &mut best);
            (hits, best)
        } else {
            score_parallel(candidates, &pattern, workers)
        };

        log::debug!(
            "Ranked {} candidates against '{}': {} hits",
            candidates.len(),
            pattern.tokens().join(" "),
            hits.len()
        );
        merge(hits, best, self.settings.secondary_ratio)
    }
}

fn score_parallel(
    candidates: &[Candidate],
    pattern: &Pattern,
    workers: usize,
) -> (Vec<ScoredCandidate>, Option<ScoredCandidate>) {
    let chunk_size = candidates.len().div_ceil(workers);
    let queue = Mutex::new(Vec::with_capacity(candidates.len()));
    let mut slots: Vec<Option<ScoredCandidate>> = vec![None; workers];

    std::thread::scope(|scope| {
        for ((chunk_index, chunk), slot) in candidates
            .chunks(chunk_size)
            .enumerate()
            .zip(slots.iter_mut())
        {
            let queue = &queue;
            scope.spawn(move || {
                let hits = score_slice(chunk, chunk_index * chunk_size, pattern, slot);
                queue.lock().extend(hits);
            });
        }
    });

    let best = slots.into_iter().flatten().reduce(better);
    (queue.into_inner(), best)
}

fn score_slice(
    slice: &[Candidate],
    offset: usize,
    pattern: &Pattern,
    best: &mut Option<ScoredCandidate>,
) -> Vec<ScoredCandidate> {
    let mut hits = Vec::new();
    for (i, candidate) in slice.iter().enumerate() {
        let score = score_candidate(candidate, pattern);
        if score <= 0.0 {
            continue;
        }
        let hit = ScoredCandidate {
            index: offset + i,
            score,
        };
        *best = Some(match *best {
            Some(current) => better(current, hit),
            None => hit,
        });
        hits.push(hit);
    }
    hits
}

fn better(a: ScoredCandidate, b: ScoredCandidate) -> ScoredCandidate {
    if b.rank_cmp(&a) == Ordering::Less { b } else { a }
}

fn merge(
    hits: Vec<ScoredCandidate>,
    best: Option<ScoredCandidate>,
    ratio: f32,
) -> SearchResults {
    let Some(best) = best else {
        return SearchResults::default();
    };
    let threshold = best.score * ratio;
    let mut secondary: Vec<ScoredCandidate> = hits
        .into_iter()
        .filter(|hit| hit.index != best.index && hit.score > threshold)
        .collect();
    secondary.sort_by(ScoredCandidate::rank_cmp);
    SearchResults {
        best: Some(best),
        secondary,
    }
}
