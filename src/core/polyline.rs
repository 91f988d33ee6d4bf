//! Polyline reconstruction from line cells.
//!
//! A flat cell buffer usually stores lines as independent segments. Before
//! they are written as a `LINES` section the segments are coalesced into
//! polylines with a greedy single pass: each segment either extends the
//! current chain or closes it and starts the next one. Chains found out of
//! order are never merged, so the result is not minimal, but no vertex is
//! ever dropped.

use super::CellPoints;

/// Coalesce line cells into polylines, in input order.
///
/// For every cell, with `chain` the polyline being built:
/// 1. empty chain: start it from the cell
/// 2. chain end == cell start: append the cell
/// 3. chain end == cell end: append the cell reversed
/// 4. chain is a single seed cell whose start touches one of the cell's
///    endpoints: flip the chain, then apply 2 or 3
/// 5. otherwise emit the chain and start a new one from the cell
///
/// Forward extension wins when both directions match. Cells with fewer than
/// two vertices are emitted on their own.
pub fn chain_polylines<'a, I>(lines: I) -> Vec<Vec<usize>>
where
    I: IntoIterator<Item = &'a [usize]>,
{
    let mut out = Vec::new();
    let mut chain: Vec<usize> = Vec::new();
    let mut seed = false;

    for cell in lines {
        let (first, last) = match (cell.first(), cell.last()) {
            (Some(&f), Some(&l)) if cell.len() >= 2 => (f, l),
            _ => {
                if !cell.is_empty() {
                    flush(&mut out, &mut chain);
                    out.push(cell.to_vec());
                }
                continue;
            }
        };

        if chain.is_empty() {
            chain.extend_from_slice(cell);
            seed = true;
            continue;
        }

        if seed && chain.last() != Some(&first) && chain.last() != Some(&last) {
            if chain.first() == Some(&first) || chain.first() == Some(&last) {
                chain.reverse();
            }
        }

        match chain.last() {
            Some(&end) if end == first => chain.extend_from_slice(&cell[1..]),
            Some(&end) if end == last => chain.extend(cell[..cell.len() - 1].iter().rev()),
            _ => {
                flush(&mut out, &mut chain);
                chain.extend_from_slice(cell);
                seed = true;
                continue;
            }
        }
        seed = false;
    }
    flush(&mut out, &mut chain);
    out
}

/// Chain the line cells and report `(polylines, on-disk index count)`.
pub fn chain_cells(lines: &[CellPoints]) -> (Vec<Vec<usize>>, usize) {
    let chains = chain_polylines(lines.iter().map(|c| c.as_slice()));
    let indices = chains.iter().map(|c| c.len() + 1).sum();
    (chains, indices)
}

fn flush(out: &mut Vec<Vec<usize>>, chain: &mut Vec<usize>) {
    if !chain.is_empty() {
        out.push(std::mem::take(chain));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(segments: &[&[usize]]) -> Vec<Vec<usize>> {
        chain_polylines(segments.iter().copied())
    }

    #[test]
    fn test_connected_segments() {
        assert_eq!(chain(&[&[0, 1], &[1, 2], &[2, 3]]), vec![vec![0, 1, 2, 3]]);
    }

    #[test]
    fn test_disjoint_segments() {
        assert_eq!(chain(&[&[0, 1], &[2, 3]]), vec![vec![0, 1], vec![2, 3]]);
    }

    #[test]
    fn test_shared_first_vertex() {
        assert_eq!(chain(&[&[1, 0], &[1, 2]]), vec![vec![0, 1, 2]]);
        assert_eq!(chain(&[&[1, 0], &[2, 1]]), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_reversed_segment() {
        assert_eq!(chain(&[&[0, 1], &[2, 1]]), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_forward_wins_on_degenerate_segment() {
        assert_eq!(chain(&[&[0, 1], &[1, 1]]), vec![vec![0, 1, 1]]);
    }

    #[test]
    fn test_grown_chain_is_not_flipped() {
        // [0,1,2] no longer a seed; (0,5) starts a new chain
        assert_eq!(
            chain(&[&[0, 1], &[1, 2], &[0, 5]]),
            vec![vec![0, 1, 2], vec![0, 5]]
        );
    }

    #[test]
    fn test_polyline_cells_and_singletons() {
        assert_eq!(
            chain(&[&[0, 1, 2], &[2, 3, 4], &[7], &[4, 5]]),
            vec![vec![0, 1, 2, 3, 4], vec![7], vec![4, 5]]
        );
        assert!(chain(&[]).is_empty());
    }

    #[test]
    fn test_chain_cells_counts() {
        let cells: Vec<CellPoints> = vec![
            CellPoints::from_slice(&[0, 1]),
            CellPoints::from_slice(&[1, 2]),
            CellPoints::from_slice(&[5, 6]),
        ];
        let (chains, indices) = chain_cells(&cells);
        assert_eq!(chains.len(), 2);
        assert_eq!(indices, 4 + 3);
    }

    #[test]
    fn test_no_vertex_lost() {
        let segments: &[&[usize]] = &[&[3, 4], &[9, 8], &[4, 5], &[8, 7], &[0, 1]];
        let total: usize = segments.iter().map(|s| s.len()).sum();
        let chains = chain(segments);
        let emitted: usize = chains.iter().map(|c| c.len()).sum();
        // every join saves exactly one shared vertex
        let joins = segments.len() - chains.len();
        assert_eq!(emitted + joins, total);
    }
}
