//! Band constraint applied while backtracking the least-cost path.

use crate::error::DtwError;

/// Constraint on the cells a least-cost path may visit.
///
/// The band is expressed as a fraction of the matrix size so the same value
/// behaves alike on sequences of any length.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum BandConstraint {
    /// Every cell is a valid candidate.
    #[default]
    Unconstrained,

    /// Sakoe-Chiba band: cell `(row, col)` is valid only if
    /// `|row - col * rows / cols| <= bandwidth * rows`.
    SakoeChiba(Bandwidth),
}

/// Sakoe-Chiba band width, a fraction of the row count in `[0, 1]`.
///
/// Only built through [`BandConstraint::sakoe_chiba`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bandwidth(f64);

impl Bandwidth {
    /// Return the width as a fraction of the row count.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl BandConstraint {
    /// Create a Sakoe-Chiba band.
    ///
    /// A bandwidth of `1.0` admits every cell; `0.0` admits only cells on the
    /// scaled diagonal.
    ///
    /// # Errors
    ///
    /// Returns [`DtwError::InvalidBandwidth`] if `bandwidth` is not in `[0, 1]`.
    pub fn sakoe_chiba(bandwidth: f64) -> Result<Self, DtwError> {
        if !(0.0..=1.0).contains(&bandwidth) {
            return Err(DtwError::InvalidBandwidth { bandwidth });
        }
        Ok(Self::SakoeChiba(Bandwidth(bandwidth)))
    }

    /// Return true if cell `(row, col)` of a `rows x cols` matrix is inside the band.
    #[must_use]
    pub fn allows(&self, row: usize, col: usize, rows: usize, cols: usize) -> bool {
        match self {
            Self::Unconstrained => true,
            Self::SakoeChiba(bandwidth) => {
                let scale = rows as f64 / cols as f64;
                let offset = (row as f64 - col as f64 * scale).abs();
                offset <= bandwidth.0 * rows as f64
            }
        }
    }

    /// Return the bandwidth, or `None` when unconstrained.
    #[must_use]
    pub fn bandwidth(&self) -> Option<f64> {
        match self {
            Self::Unconstrained => None,
            Self::SakoeChiba(bandwidth) => Some(bandwidth.0),
        }
    }
}
