//! Reassembly of filled buckets into one matrix view

use crate::allocate::ChunkAllocation;
use crate::store::{CompressedRows, Store};
use crate::view::View;
use layered_core::{ChunkPlan, ColumnOffset};

/// Turn every chunk's buckets into a view and bind the chunks by column
///
/// Buckets must already be filled and sorted.
pub fn consolidate<C: ColumnOffset>(
    allocations: Vec<ChunkAllocation<C>>,
    plan: &ChunkPlan,
    nrow: usize,
) -> View<C> {
    let chunks = allocations
        .into_iter()
        .enumerate()
        .map(|(chunk, allocation)| consolidate_chunk(allocation, plan.chunk_width(chunk)))
        .collect();
    View::column_bind(chunks, nrow)
}

fn consolidate_chunk<C: ColumnOffset>(allocation: ChunkAllocation<C>, ncol: usize) -> View<C> {
    let ChunkAllocation {
        identities,
        bucket8,
        bucket16,
        bucket32,
        ..
    } = allocation;

    let mut parts = Vec::with_capacity(3);
    let mut order = Vec::new();
    if bucket8.nrow() > 0 {
        parts.push(View::Leaf(Store::U8(CompressedRows::from_bucket(bucket8, ncol))));
        order.extend_from_slice(&identities[0]);
    }
    if bucket16.nrow() > 0 {
        parts.push(View::Leaf(Store::U16(CompressedRows::from_bucket(bucket16, ncol))));
        order.extend_from_slice(&identities[1]);
    }
    if bucket32.nrow() > 0 || parts.is_empty() {
        parts.push(View::Leaf(Store::U32(CompressedRows::from_bucket(bucket32, ncol))));
        order.extend_from_slice(&identities[2]);
    }

    if parts.len() == 1 {
        // Identities of the only bucket are every row in order.
        return parts.remove(0);
    }

    // Row r of the chunk lives at position reordered[r] of the stacked buckets.
    let mut reordered = vec![0; order.len()];
    for (position, &row) in order.iter().enumerate() {
        reordered[row] = position;
    }
    View::row_subset(View::row_bind(parts, ncol), reordered)
}
