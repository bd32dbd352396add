/// Tissue-specificity of one gene. Degenerate profiles are explicit variants,
/// never NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TauValue {
    Score(f64),
    /// No tissue above the noise threshold (max bin is 0).
    NotExpressed,
    /// Fewer than two tissues, so `N - 1` is zero.
    SingleTissue,
}

impl TauValue {
    pub fn score(&self) -> Option<f64> {
        match self {
            TauValue::Score(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        !matches!(self, TauValue::Score(_))
    }

    pub fn status(&self) -> &'static str {
        match self {
            TauValue::Score(_) => "scored",
            TauValue::NotExpressed => "not_expressed",
            TauValue::SingleTissue => "single_tissue",
        }
    }
}
