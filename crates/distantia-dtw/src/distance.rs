//! Pointwise distance catalog used to compare rows of two sequences.

use std::fmt;
use std::str::FromStr;

use crate::error::DtwError;

const EXPECTED: &str =
    "euclidean, manhattan, chebyshev, canberra, cosine, hellinger, chi, jaccard, russelrao, hamming";

/// A pointwise distance between two equal-length vectors.
///
/// Selected at runtime by name via [`FromStr`]. Parsing is case-insensitive
/// and accepts either the full name or anything starting with the 3-letter
/// abbreviation (`"euc"`, `"man"`, ...). `chi` has no abbreviation.
///
/// None of the functions validate their inputs. Binary metrics (`Jaccard`,
/// `RussellRao`, `Hamming`) expect 0/1 coded vectors, `Chi` yields NaN when
/// both vectors hold a zero at the same position, and `Cosine` yields NaN
/// when either vector is all zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Distance {
    /// `sqrt(sum((x - y)^2))`
    #[default]
    Euclidean,
    /// `sum(|x - y|)`
    Manhattan,
    /// `max(|x - y|)`
    Chebyshev,
    /// `sum(|x - y| / (|x| + |y|))`, zero denominators skipped.
    Canberra,
    /// `1 - x.y / (|x| |y|)`
    Cosine,
    /// `sqrt(1/2 * sum((sqrt(x) - sqrt(y))^2))`
    Hellinger,
    /// Normalized chi distance.
    Chi,
    /// `1 - intersection / union` over entries equal to 1.
    Jaccard,
    /// `1 - matches / length`
    RussellRao,
    /// Number of mismatching positions.
    Hamming,
}

impl Distance {
    /// Every distance in the catalog.
    pub const ALL: [Distance; 10] = [
        Distance::Euclidean,
        Distance::Manhattan,
        Distance::Chebyshev,
        Distance::Canberra,
        Distance::Cosine,
        Distance::Hellinger,
        Distance::Chi,
        Distance::Jaccard,
        Distance::RussellRao,
        Distance::Hamming,
    ];

    /// Canonical lowercase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Euclidean => "euclidean",
            Self::Manhattan => "manhattan",
            Self::Chebyshev => "chebyshev",
            Self::Canberra => "canberra",
            Self::Cosine => "cosine",
            Self::Hellinger => "hellinger",
            Self::Chi => "chi",
            Self::Jaccard => "jaccard",
            Self::RussellRao => "russelrao",
            Self::Hamming => "hamming",
        }
    }

    /// 3-letter abbreviation, `None` for `chi`.
    #[must_use]
    pub fn abbreviation(self) -> Option<&'static str> {
        match self {
            Self::Chi => None,
            other => Some(&other.name()[..3]),
        }
    }

    /// Compute the distance between `x` and `y`.
    ///
    /// Both slices must have the same length; only the common prefix is
    /// compared otherwise. Use [`distance`] for a checked variant.
    #[must_use]
    pub fn compute(self, x: &[f64], y: &[f64]) -> f64 {
        match self {
            Self::Euclidean => euclidean(x, y),
            Self::Manhattan => manhattan(x, y),
            Self::Chebyshev => chebyshev(x, y),
            Self::Canberra => canberra(x, y),
            Self::Cosine => cosine(x, y),
            Self::Hellinger => hellinger(x, y),
            Self::Chi => chi(x, y),
            Self::Jaccard => jaccard(x, y),
            Self::RussellRao => russell_rao(x, y),
            Self::Hamming => hamming(x, y),
        }
    }
}

impl FromStr for Distance {
    type Err = DtwError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        if lowered == "chi" {
            return Ok(Self::Chi);
        }
        Self::ALL
            .into_iter()
            .find(|d| {
                lowered == d.name() || d.abbreviation().is_some_and(|abbr| lowered.starts_with(abbr))
            })
            .ok_or_else(|| DtwError::UnknownDistance {
                name: s.to_string(),
                expected: EXPECTED,
            })
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compute the distance named `name` between `x` and `y`.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`DtwError::UnknownDistance`] | `name` is not a known distance or abbreviation |
/// | [`DtwError::LengthMismatch`] | `x` and `y` differ in length |
pub fn distance(name: &str, x: &[f64], y: &[f64]) -> Result<f64, DtwError> {
    let metric: Distance = name.parse()?;
    if x.len() != y.len() {
        return Err(DtwError::LengthMismatch {
            x_len: x.len(),
            y_len: y.len(),
        });
    }
    Ok(metric.compute(x, y))
}

fn manhattan(x: &[f64], y: &[f64]) -> f64 {
    x.iter().zip(y).map(|(a, b)| (a - b).abs()).sum()
}

fn euclidean(x: &[f64], y: &[f64]) -> f64 {
    x.iter()
        .zip(y)
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f64>()
        .sqrt()
}

fn chebyshev(x: &[f64], y: &[f64]) -> f64 {
    x.iter()
        .zip(y)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max)
}

fn canberra(x: &[f64], y: &[f64]) -> f64 {
    x.iter()
        .zip(y)
        .filter_map(|(a, b)| {
            let denominator = a.abs() + b.abs();
            (denominator != 0.0).then(|| (a - b).abs() / denominator)
        })
        .sum()
}

fn cosine(x: &[f64], y: &[f64]) -> f64 {
    let mut dot = 0.0;
    let mut norm_x = 0.0;
    let mut norm_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        dot += a * b;
        norm_x += a * a;
        norm_y += b * b;
    }
    1.0 - dot / (norm_x.sqrt() * norm_y.sqrt())
}

fn hellinger(x: &[f64], y: &[f64]) -> f64 {
    let sum: f64 = x
        .iter()
        .zip(y)
        .map(|(a, b)| {
            let d = a.sqrt() - b.sqrt();
            d * d
        })
        .sum();
    (0.5 * sum).sqrt()
}

fn chi(x: &[f64], y: &[f64]) -> f64 {
    let x_sum: f64 = x.iter().sum();
    let y_sum: f64 = y.iter().sum();
    let xy_sum = x_sum + y_sum;
    x.iter()
        .zip(y)
        .map(|(a, b)| {
            let d = a / x_sum - b / y_sum;
            (d * d) / ((a + b) / xy_sum)
        })
        .sum::<f64>()
        .sqrt()
}

fn jaccard(x: &[f64], y: &[f64]) -> f64 {
    let mut intersection = 0.0;
    let mut union = 0.0;
    for (&a, &b) in x.iter().zip(y) {
        if a == 1.0 || b == 1.0 {
            union += 1.0;
            if a == 1.0 && b == 1.0 {
                intersection += 1.0;
            }
        }
    }
    if union == 0.0 {
        return 0.0;
    }
    1.0 - intersection / union
}

fn russell_rao(x: &[f64], y: &[f64]) -> f64 {
    let matches = x.iter().zip(y).filter(|(a, b)| a == b).count();
    1.0 - matches as f64 / x.len() as f64
}

fn hamming(x: &[f64], y: &[f64]) -> f64 {
    x.iter().zip(y).filter(|(a, b)| a != b).count() as f64
}
