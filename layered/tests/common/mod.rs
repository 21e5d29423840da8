//! Seeded mock data shared by the integration tests

#![allow(dead_code)]

use layered::{CompressedSparseMatrix, DenseMatrix};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random sparse matrix held as 0-based triplets
pub struct MockMatrix {
    pub nrow: usize,
    pub ncol: usize,
    /// Entries grouped by row, in random column order within a row
    pub triplets: Vec<(usize, usize, u32)>,
}

fn draw_value(rng: &mut StdRng) -> u32 {
    match rng.gen_range(0..10) {
        0..=5 => rng.gen_range(1..=255),
        6..=8 => rng.gen_range(256..=65535),
        _ => rng.gen_range(65536..=u32::MAX),
    }
}

impl MockMatrix {
    /// One to three nonzeros per row at distinct columns, values spread
    /// across all three width classes
    pub fn generate(nrow: usize, ncol: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut triplets = Vec::new();
        for r in 0..nrow {
            let count = rng.gen_range(1..=3).min(ncol);
            for c in rand::seq::index::sample(&mut rng, ncol, count) {
                let value = draw_value(&mut rng);
                triplets.push((r, c, value));
            }
        }
        Self {
            nrow,
            ncol,
            triplets,
        }
    }

    /// Like [`MockMatrix::generate`] but with every value below 256
    pub fn generate_narrow(nrow: usize, ncol: usize, seed: u64) -> Self {
        let mut mock = Self::generate(nrow, ncol, seed);
        for entry in &mut mock.triplets {
            entry.2 = entry.2 % 255 + 1;
        }
        mock
    }

    /// Leave every `stride`-th row empty
    pub fn with_empty_rows(mut self, stride: usize) -> Self {
        self.triplets.retain(|&(r, _, _)| r % stride != 0);
        self
    }

    pub fn dense_rows(&self) -> Vec<Vec<u32>> {
        let mut rows = vec![vec![0u32; self.ncol]; self.nrow];
        for &(r, c, v) in &self.triplets {
            rows[r][c] = v;
        }
        rows
    }

    pub fn dense_columns(&self) -> Vec<Vec<u32>> {
        let mut columns = vec![vec![0u32; self.nrow]; self.ncol];
        for &(r, c, v) in &self.triplets {
            columns[c][r] = v;
        }
        columns
    }

    pub fn compressed_rows(&self) -> CompressedSparseMatrix<u32> {
        CompressedSparseMatrix::from_triplets(self.nrow, self.ncol, &self.triplets, true).unwrap()
    }

    pub fn compressed_columns(&self) -> CompressedSparseMatrix<u32> {
        CompressedSparseMatrix::from_triplets(self.nrow, self.ncol, &self.triplets, false).unwrap()
    }

    pub fn dense_row_major(&self) -> DenseMatrix<u32> {
        DenseMatrix::row_major(self.nrow, self.ncol, self.dense_rows().concat()).unwrap()
    }

    pub fn dense_column_major(&self) -> DenseMatrix<u32> {
        DenseMatrix::column_major(self.nrow, self.ncol, self.dense_columns().concat()).unwrap()
    }

    /// Matrix Market text with 1-based coordinates, in triplet order
    pub fn to_matrix_market(&self) -> String {
        let mut text = String::from("%%MatrixMarket matrix coordinate integer general\n");
        text.push_str("% generated for tests\n");
        text.push_str(&format!("{} {} {}\n", self.nrow, self.ncol, self.triplets.len()));
        for &(r, c, v) in &self.triplets {
            text.push_str(&format!("{} {} {}\n", r + 1, c + 1, v));
        }
        text
    }
}
