use std::fmt;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatrixError {
    #[error("Row {0} is out of bounds")]
    RowOutOfBounds(usize),
    #[error("Column {0} is out of bounds")]
    ColumnOutOfBounds(usize),
    #[error("Cannot pivot on a zero element at ({row}, {col})")]
    ZeroPivot { row: usize, col: usize },
}

/// A dense, row-major grid of numbers.
///
/// Rows may have different lengths until [`Matrix::set_uniform_width`] pads
/// them. Missing entries read as zero wherever a full row is required.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Matrix {
    rows: Vec<Vec<f64>>,
}

/// Entry of a row with the largest (or smallest) value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extremum {
    pub index: usize,
    pub value: f64,
}

/// Result of the minimum-ratio test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ratio {
    pub row: usize,
    pub value: f64,
}

/// Returns a copy of `row` multiplied by `factor`.
pub fn scale_row(factor: f64, row: &[f64]) -> Vec<f64> {
    row.iter().map(|v| v * factor).collect()
}

/// Adds two rows element by element.
pub fn add_rows(row_a: &[f64], row_b: &[f64]) -> Vec<f64> {
    scale_then_add_rows(1.0, row_a, 1.0, row_b)
}

/// Computes `scale_a * row_a + scale_b * row_b`.
/// The shorter row is treated as zero-padded.
pub fn scale_then_add_rows(scale_a: f64, row_a: &[f64], scale_b: f64, row_b: &[f64]) -> Vec<f64> {
    let len = row_a.len().max(row_b.len());
    (0..len)
        .map(|i| {
            let a = row_a.get(i).copied().unwrap_or(0.0);
            let b = row_b.get(i).copied().unwrap_or(0.0);
            scale_a * a + scale_b * b
        })
        .collect()
}

/// Negates every element of a row in place.
pub fn negate_row(row: &mut [f64]) {
    for v in row.iter_mut() {
        *v = -*v;
    }
}

/// Finds the largest (`find_positive`) or smallest element of a row,
/// skipping `exclude`. Ties keep the first occurrence.
pub fn greatest_element_in_row(row: &[f64], exclude: Option<usize>, find_positive: bool) -> Option<Extremum> {
    let mut best: Option<Extremum> = None;
    for (index, &value) in row.iter().enumerate() {
        if Some(index) == exclude {
            continue;
        }
        let better = match best {
            None => true,
            Some(b) if find_positive => b.value < value,
            Some(b) => value < b.value,
        };
        if better {
            best = Some(Extremum { index, value });
        }
    }
    best
}

impl Matrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    pub fn add_row(&mut self, row: Vec<f64>) -> &mut Self {
        self.rows.push(row);
        self
    }

    /// Appends elements to the end of row `i`, or adds a new row when `i`
    /// does not exist yet.
    pub fn append_to_row(&mut self, i: usize, elements: &[f64]) -> &mut Self {
        match self.rows.get_mut(i) {
            Some(row) => row.extend_from_slice(elements),
            None => self.rows.push(elements.to_vec()),
        }
        self
    }

    pub fn remove_last_row(&mut self) -> Option<Vec<f64>> {
        self.rows.pop()
    }

    /// Removes row `i`, shifting the rows below it up
    pub fn remove_row(&mut self, i: usize) -> Option<Vec<f64>> {
        (i < self.rows.len()).then(|| self.rows.remove(i))
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Width of the longest row
    pub fn num_columns(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Returns `(columns, rows)`
    pub fn size(&self) -> (usize, usize) {
        (self.num_columns(), self.num_rows())
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, i: usize) -> Option<&[f64]> {
        self.rows.get(i).map(Vec::as_slice)
    }

    pub fn element(&self, i: usize, j: usize) -> Option<f64> {
        self.rows.get(i).and_then(|row| row.get(j)).copied()
    }

    /// Column `j`, reading missing entries of short rows as zero.
    pub fn column(&self, j: usize) -> Vec<f64> {
        self.rows
            .iter()
            .map(|row| row.get(j).copied().unwrap_or(0.0))
            .collect()
    }

    pub fn last_row(&self) -> Option<&[f64]> {
        self.rows.last().map(Vec::as_slice)
    }

    pub fn last_element_on_last_row(&self) -> Option<f64> {
        self.rows.last().and_then(|row| row.last()).copied()
    }

    /// Multiplies row `i` by `factor` in place.
    pub fn scale_row(&mut self, i: usize, factor: f64) -> Result<(), MatrixError> {
        let row = self.rows.get_mut(i).ok_or(MatrixError::RowOutOfBounds(i))?;
        for v in row.iter_mut() {
            *v *= factor;
        }
        Ok(())
    }

    pub fn negate_row(&mut self, i: usize) -> Result<(), MatrixError> {
        let row = self.rows.get_mut(i).ok_or(MatrixError::RowOutOfBounds(i))?;
        negate_row(row);
        Ok(())
    }

    /// Pads every row with zeros to the width of the longest row.
    pub fn set_uniform_width(&mut self) -> &mut Self {
        let width = self.num_columns();
        for row in &mut self.rows {
            row.resize(width, 0.0);
        }
        self
    }

    pub fn transpose(&self) -> Matrix {
        let width = self.num_columns();
        let rows = (0..width).map(|j| self.column(j)).collect();
        Matrix { rows }
    }

    /// Gauss-Jordan step around `(row, col)`: the pivot row is divided by the
    /// pivot element, then a multiple of it is subtracted from every other row
    /// so that column `col` is 1 at `row` and 0 elsewhere.
    pub fn pivot(&mut self, row: usize, col: usize) -> Result<(), MatrixError> {
        let pivot_row = self.rows.get(row).ok_or(MatrixError::RowOutOfBounds(row))?;
        let pivot = *pivot_row.get(col).ok_or(MatrixError::ColumnOutOfBounds(col))?;
        if pivot == 0.0 {
            return Err(MatrixError::ZeroPivot { row, col });
        }

        // Dividing rather than multiplying by the reciprocal keeps the pivot
        // element at exactly 1.
        let pivot_row: Vec<f64> = pivot_row.iter().map(|v| v / pivot).collect();

        for (i, current) in self.rows.iter_mut().enumerate() {
            if i == row {
                continue;
            }
            let factor = current.get(col).copied().unwrap_or(0.0);
            if factor == 0.0 {
                continue;
            }
            *current = scale_then_add_rows(-factor, &pivot_row, 1.0, current);
        }
        self.rows[row] = pivot_row;
        Ok(())
    }

    /// Most negative (or, with `find_positive`, most positive) entry of the
    /// last row among `columns`. The last entry is the right-hand side and is
    /// never considered.
    pub fn greatest_value_from_last_row(&self, find_positive: bool, columns: usize) -> Option<Extremum> {
        let row = self.rows.last()?;
        let end = columns.min(row.len().saturating_sub(1));
        greatest_element_in_row(&row[..end], None, find_positive)
    }

    /// Minimum-ratio test on column `col` over rows `0..rows`, considering
    /// only rows whose entry exceeds `tolerance`. Negative ratios are skipped
    /// and ties keep the lowest row.
    pub fn min_positive_ratio_row(&self, col: usize, rows: usize, tolerance: f64) -> Option<Ratio> {
        let mut best: Option<Ratio> = None;
        for (i, row) in self.rows.iter().take(rows).enumerate() {
            let entry = row.get(col).copied().unwrap_or(0.0);
            if entry <= tolerance {
                continue;
            }
            let rhs = row.last().copied().unwrap_or(0.0);
            let value = rhs / entry;
            if value < 0.0 {
                continue;
            }
            if best.is_none_or(|b| value < b.value) {
                best = Some(Ratio { row: i, value });
            }
        }
        best
    }

    /// If column `col` has exactly one non-zero entry and that entry is 1,
    /// returns that row and its right-hand side.
    pub fn unit_value_for_column(&self, col: usize, tolerance: f64) -> Option<(usize, f64)> {
        let mut found = None;
        let mut non_zero = 0;
        for (i, row) in self.rows.iter().enumerate() {
            let v = row.get(col).copied().unwrap_or(0.0);
            if v.abs() <= tolerance {
                continue;
            }
            non_zero += 1;
            if (v - 1.0).abs() <= tolerance {
                found = Some((i, row.last().copied().unwrap_or(0.0)));
            }
        }
        if non_zero == 1 { found } else { None }
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "[")?;
            for (j, v) in row.iter().enumerate() {
                if j > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}", v)?;
            }
            write!(f, "]")?;
        }
        write!(f, "]")
    }
}
