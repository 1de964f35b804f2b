//! Row partitioning regression test
//!
//! Checks coverage, remainder placement and determinism of the partition
//! table over a range of heights and worker counts.

use pixscatter_comm::{CommError, partition};
use pixscatter_test::RegParams;

#[test]
fn partition_reg() {
    let mut rp = RegParams::new("partition");

    // --- Test 1: worked examples ---
    let rows = |h: u32, n: usize| -> Vec<u32> {
        partition(h, n)
            .unwrap_or_else(|e| panic!("partition({}, {}): {}", h, n, e))
            .iter()
            .map(|p| p.rows)
            .collect()
    };
    rp.check(rows(4, 2) == vec![2, 2], "4 rows on 2 workers");
    rp.check(rows(4, 3) == vec![2, 1, 1], "4 rows on 3 workers");
    rp.check(rows(3, 3) == vec![1, 1, 1], "3 rows on 3 workers");
    rp.check(rows(1, 1) == vec![1], "1 row on 1 worker");

    // --- Test 2: coverage and ordering for every small case ---
    for h in 1..=40u32 {
        for n in 1..=h as usize {
            let table = partition(h, n).expect("valid partition");
            let mut next = 0u32;
            let mut ok = table.len() == n;
            for (rank, p) in table.iter().enumerate() {
                ok &= p.rank == rank && p.row_offset == next && p.rows >= 1;
                next = p.end_row();
            }
            ok &= next == h;

            // Remainder lands on rank 0, everyone else gets the base
            let base = h / n as u32;
            ok &= table.get(0).map(|p| p.rows).ok() == Some(base + h % n as u32);
            ok &= table.iter().skip(1).all(|p| p.rows == base);

            if !rp.check(ok, &format!("coverage for {} rows on {} workers", h, n)) {
                eprintln!("  {:?}", table);
            }
        }
    }

    // --- Test 3: independent invocations agree bit for bit ---
    for &(h, n) in &[(480u32, 7usize), (1080, 16), (5, 5), (17, 4)] {
        let a = partition(h, n).expect("partition a");
        let b = partition(h, n).expect("partition b");
        rp.check(a == b, &format!("determinism for {} rows on {} workers", h, n));
        rp.check(a.spans(33) == b.spans(33), "span determinism");
    }

    // --- Test 4: degenerate inputs ---
    rp.check(
        matches!(partition(10, 0), Err(CommError::InvalidPartition(_))),
        "zero workers rejected",
    );
    rp.check(
        matches!(partition(2, 3), Err(CommError::InvalidPartition(_))),
        "more workers than rows rejected",
    );

    // --- Test 5: halo spans stay inside the image and cover own rows ---
    for &(h, n, halo) in &[(9u32, 3usize, 1u32), (10, 4, 2), (5, 5, 1), (6, 2, 3)] {
        let table = partition(h, n).expect("partition");
        let width = 4u32;
        let own = table.spans(width);
        let ext = table.halo_spans(width, halo);
        for rank in 0..n {
            let inside = ext[rank].offset + ext[rank].count <= (h * width) as usize;
            let covers = ext[rank].offset <= own[rank].offset
                && own[rank].offset + own[rank].count <= ext[rank].offset + ext[rank].count;
            rp.check(inside && covers, &format!("halo span {} of {}x{} halo {}", rank, h, n, halo));
        }
    }

    assert!(rp.cleanup(), "partition regression test failed");
}
