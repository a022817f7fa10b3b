use crate::vector_store::ScoredVectorPoint;

/// Which search hits feed the answer context.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SelectionPolicy {
    /// The single highest-scoring hit.
    #[default]
    Best,
    /// Every hit scoring strictly above `min_score`, or the best hit when none does.
    Threshold { min_score: f32 },
}

impl SelectionPolicy {
    /// Pick hits in descending score order. Empty only when `hits` is empty.
    #[must_use]
    pub fn select<'a>(&self, hits: &'a [ScoredVectorPoint]) -> Vec<&'a ScoredVectorPoint> {
        let mut ranked: Vec<&ScoredVectorPoint> = hits.iter().collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

        match *self {
            Self::Best => ranked.into_iter().take(1).collect(),
            Self::Threshold { min_score } => {
                let above: Vec<_> = ranked.iter().copied().filter(|h| h.score > min_score).collect();
                if above.is_empty() {
                    ranked.into_iter().take(1).collect()
                } else {
                    above
                }
            }
        }
    }
}
