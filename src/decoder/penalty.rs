use super::state::TokenId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepetitionPenalizer {
    penalty: f32,
}

impl RepetitionPenalizer {
    pub fn new(penalty: f32) -> Self {
        Self { penalty }
    }

    /// Divides the score of every id in `history` by the penalty, once per
    /// occurrence. The division ignores the sign, so a negative score moves
    /// toward zero instead of further down.
    pub fn apply(&self, scores: &mut [f32], history: &[TokenId]) {
        if self.penalty == 1.0 {
            return;
        }
        for &token in history {
            if let Some(score) = scores.get_mut(token as usize) {
                *score /= self.penalty;
            }
        }
    }
}
