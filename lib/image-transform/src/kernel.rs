use crate::{Image, Transform, TransformError, TransformResult, pipeline};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::{fmt, str::FromStr};

const IDENTITY: [f64; 9] = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
const EDGE: [f64; 9] = [0.0, -1.0, 0.0, -1.0, 4.0, -1.0, 0.0, -1.0, 0.0];
const SHARPEN: [f64; 9] = [0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0];
const AVERAGE_BLUR: [f64; 9] = [1.0 / 9.0; 9];
const GAUSSIAN_BLUR: [f64; 9] = [
    1.0 / 16.0,
    1.0 / 8.0,
    1.0 / 16.0,
    1.0 / 8.0,
    1.0 / 4.0,
    1.0 / 8.0,
    1.0 / 16.0,
    1.0 / 8.0,
    1.0 / 16.0,
];

/// A square matrix of correlation weights, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    size: usize,
    weights: Vec<f64>,
}

impl Default for Kernel {
    fn default() -> Self {
        Self::identity()
    }
}

impl Kernel {
    pub fn identity() -> Self {
        Self::from_table(&IDENTITY)
    }

    fn from_table(table: &[f64; 9]) -> Self {
        Self {
            size: 3,
            weights: table.to_vec(),
        }
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> TransformResult<Self> {
        let row_count = rows.len();
        let col_count = rows.first().map(Vec::len).unwrap_or(0);

        if row_count == 0 || col_count == 0 {
            return Err(TransformError::Parse("matrix is empty".to_string()));
        }

        if let Some(row) = rows.iter().position(|r| r.len() != col_count) {
            return Err(TransformError::Parse(format!(
                "row {row} has {} values, expected {col_count}",
                rows[row].len()
            )));
        }

        if row_count != col_count {
            return Err(TransformError::Shape {
                rows: row_count,
                cols: col_count,
            });
        }

        Ok(Self {
            size: row_count,
            weights: rows.into_iter().flatten().collect(),
        })
    }

    /// Parses a nested row-major list such as `[[0,0,0],[0,1,0],[0,0,0]]`.
    pub fn parse_custom(text: &str) -> TransformResult<Self> {
        let rows: Vec<Vec<f64>> = serde_json::from_str(text.trim())
            .map_err(|e| TransformError::Parse(e.to_string()))?;
        Self::from_rows(rows)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Offset of the anchor cell. For even sizes this is the upper-left of the
    /// four central cells.
    pub fn anchor(&self) -> usize {
        (self.size - 1) / 2
    }

    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.weights[row * self.size + col]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.weights.chunks(self.size)
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, row) in self.rows().enumerate() {
            if i > 0 {
                write!(f, ",\n ")?;
            }
            let values = row.iter().map(|v| v.to_string()).collect::<Vec<_>>();
            write!(f, "[{}]", values.join(", "))?;
        }
        write!(f, "]")
    }
}

impl Transform for Kernel {
    fn transform(&self, image: &Image) -> TransformResult<Image> {
        pipeline::convolve(image, self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum NamedKernel {
    Identity = 0,
    Edge,
    Sharpen,
    AverageBlur,
    GaussianBlur,
    Custom,
}

impl NamedKernel {
    pub fn name(&self) -> &'static str {
        match self {
            NamedKernel::Identity => "Identity",
            NamedKernel::Edge => "Edge",
            NamedKernel::Sharpen => "Sharpen",
            NamedKernel::AverageBlur => "AverageBlur",
            NamedKernel::GaussianBlur => "GaussianBlur",
            NamedKernel::Custom => "Custom",
        }
    }

    /// The built-in weights, `None` for [`NamedKernel::Custom`].
    pub fn kernel(&self) -> Option<Kernel> {
        let table = match self {
            NamedKernel::Identity => &IDENTITY,
            NamedKernel::Edge => &EDGE,
            NamedKernel::Sharpen => &SHARPEN,
            NamedKernel::AverageBlur => &AVERAGE_BLUR,
            NamedKernel::GaussianBlur => &GAUSSIAN_BLUR,
            NamedKernel::Custom => return None,
        };
        Some(Kernel::from_table(table))
    }

    pub fn all() -> &'static [NamedKernel] {
        &[
            NamedKernel::Identity,
            NamedKernel::Edge,
            NamedKernel::Sharpen,
            NamedKernel::AverageBlur,
            NamedKernel::GaussianBlur,
            NamedKernel::Custom,
        ]
    }
}

impl FromStr for NamedKernel {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_name(s);
        NamedKernel::all()
            .iter()
            .copied()
            .find(|k| normalize_name(k.name()) == wanted)
            .ok_or_else(|| TransformError::InvalidParameter(format!("unknown kernel `{s}`")))
    }
}

pub(crate) fn normalize_name(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// The kernel currently selected for application.
#[derive(Debug, Clone, PartialEq)]
pub enum KernelChoice {
    Named(NamedKernel),
    Custom(Kernel),
}

impl Default for KernelChoice {
    fn default() -> Self {
        KernelChoice::Named(NamedKernel::Identity)
    }
}

impl KernelChoice {
    /// Selects a built-in kernel. `Custom` carries no weights of its own and
    /// must go through [`KernelChoice::custom`].
    pub fn named(kernel: NamedKernel) -> TransformResult<Self> {
        match kernel {
            NamedKernel::Custom => Err(TransformError::InvalidParameter(
                "a custom kernel needs a matrix".to_string(),
            )),
            named => Ok(KernelChoice::Named(named)),
        }
    }

    pub fn custom(text: &str) -> TransformResult<Self> {
        Kernel::parse_custom(text).map(KernelChoice::Custom)
    }

    pub fn selection(&self) -> NamedKernel {
        match self {
            KernelChoice::Named(named) => *named,
            KernelChoice::Custom(_) => NamedKernel::Custom,
        }
    }

    pub fn kernel(&self) -> Kernel {
        match self {
            KernelChoice::Named(named) => named.kernel().unwrap_or_default(),
            KernelChoice::Custom(kernel) => kernel.clone(),
        }
    }
}
