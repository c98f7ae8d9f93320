//! Ring generators with predictable shapes.

use alerts_common::Ring;

/// Closed square ring for `(west, south, east, north)`, counter-clockwise.
pub fn square_ring(b: (f64, f64, f64, f64)) -> Ring {
    let (w, s, e, n) = b;
    vec![[w, s], [e, s], [e, n], [w, n], [w, s]]
}

/// Square ring with `per_side` collinear vertices on each edge.
pub fn dense_square_ring(b: (f64, f64, f64, f64), per_side: usize) -> Ring {
    let (w, s, e, n) = b;
    let per_side = per_side.max(1);
    let step_x = (e - w) / per_side as f64;
    let step_y = (n - s) / per_side as f64;

    let mut ring = Vec::with_capacity(per_side * 4 + 1);
    for i in 0..per_side {
        ring.push([w + i as f64 * step_x, s]);
    }
    for i in 0..per_side {
        ring.push([e, s + i as f64 * step_y]);
    }
    for i in 0..per_side {
        ring.push([e - i as f64 * step_x, n]);
    }
    for i in 0..per_side {
        ring.push([w, n - i as f64 * step_y]);
    }
    ring.push([w, s]);
    ring
}

/// A row of `count` adjacent squares, each `size` degrees wide, starting
/// at `(west, south)`.
pub fn square_row(west: f64, south: f64, size: f64, count: usize) -> Vec<(f64, f64, f64, f64)> {
    (0..count)
        .map(|i| {
            let w = west + i as f64 * size;
            (w, south, w + size, south + size)
        })
        .collect()
}
