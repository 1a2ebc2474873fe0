use super::state::TokenId;

/// Targets one vocabulary id that collapses short inputs into empty output.
/// A top score for that id is only trusted when it leads the runner-up by
/// more than `margin`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DegenerateTokenGuard {
    token: Option<TokenId>,
    margin: f32,
}

impl DegenerateTokenGuard {
    pub fn new(token: Option<TokenId>, margin: f32) -> Self {
        Self { token, margin }
    }

    /// Position in `ranked` (sorted by descending score) to select.
    pub fn pick(&self, ranked: &[(TokenId, f32)]) -> usize {
        let Some(degenerate) = self.token else {
            return 0;
        };
        let (Some(&(top, top_score)), Some(&(second, second_score))) =
            (ranked.first(), ranked.get(1))
        else {
            return 0;
        };
        if top != degenerate {
            return 0;
        }

        let margin = top_score - second_score;
        if margin > self.margin {
            return 0;
        }
        log::debug!(
            "Degenerate token {} leads by only {:.4} (<= {:.4}), taking {} instead",
            top,
            margin,
            self.margin,
            second
        );
        1
    }
}
