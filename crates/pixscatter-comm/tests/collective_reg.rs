//! Collective regression test
//!
//! Runs broadcast, scatterv and gatherv over in-process worlds of several
//! sizes and checks that data lands where the partition table says.

use pixscatter_comm::{
    CommError, Communicator, LocalWorld, ROOT, Span, WireMessage, broadcast, gatherv, partition,
    receive_partition, scatterv, send_partition,
};
use pixscatter_core::Pixel;
use pixscatter_test::RegParams;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Dims {
    width: u32,
    height: u32,
}

impl WireMessage for Dims {
    fn to_fields(&self) -> Vec<u32> {
        vec![self.width, self.height]
    }

    fn from_fields(fields: &[u32]) -> Result<Self, CommError> {
        match *fields {
            [width, height] => Ok(Dims { width, height }),
            _ => Err(CommError::Malformed(format!("{} fields", fields.len()))),
        }
    }
}

fn pixel_at(i: usize) -> Pixel {
    Pixel::new(i as u8, (i / 7) as u8, (i * 3) as u8)
}

#[test]
fn collective_reg() {
    let mut rp = RegParams::new("collective");

    // --- Test 1: broadcast, scatter, transform, gather ---
    for size in 1..=5usize {
        let results = LocalWorld::run(size, |mut comm| -> Result<Option<Vec<Pixel>>, CommError> {
            let dims = if comm.is_root() {
                Some(Dims { width: 3, height: 11 })
            } else {
                None
            };
            let dims = broadcast(&mut comm, ROOT, dims)?;
            let table = partition(dims.height, comm.size())?;
            let spans = table.spans(dims.width);

            let global: Vec<Pixel> = (0..(dims.width * dims.height) as usize).map(pixel_at).collect();
            let source = if comm.is_root() { Some(global.as_slice()) } else { None };
            let mut local = scatterv(&mut comm, ROOT, source, &spans)?;
            for px in &mut local {
                px.b = px.b.wrapping_add(comm.rank() as u8);
            }

            let mut out = if comm.is_root() {
                Some(vec![Pixel::default(); global.len()])
            } else {
                None
            };
            gatherv(&mut comm, ROOT, &local, &spans, out.as_deref_mut())?;
            Ok(out)
        })
        .expect("world");

        let gathered = results[0].as_ref().expect("root result").as_ref().expect("root output");
        let table = partition(11, size).expect("partition");
        let mut ok = true;
        for p in &table {
            for i in p.span(3).range() {
                let mut want = pixel_at(i);
                want.b = want.b.wrapping_add(p.rank as u8);
                ok &= gathered[i] == want;
            }
        }
        rp.check(ok, &format!("round trip through {} ranks", size));
        rp.check(
            results[1..].iter().all(|r| matches!(r, Ok(None))),
            "workers return no output",
        );
    }

    // --- Test 2: overlapping scatter hands out neighbour rows ---
    let results = LocalWorld::run(3, |mut comm| -> Result<Vec<u8>, CommError> {
        let table = partition(6, comm.size())?;
        let spans = table.halo_spans(1, 1);
        let global: Vec<u8> = (10..16).collect();
        let source = if comm.is_root() { Some(global.as_slice()) } else { None };
        scatterv(&mut comm, ROOT, source, &spans)
    })
    .expect("world");
    rp.compare_strings(&[10, 11, 12], results[0].as_ref().expect("rank 0"));
    rp.compare_strings(&[11, 12, 13, 14], results[1].as_ref().expect("rank 1"));
    rp.compare_strings(&[13, 14, 15], results[2].as_ref().expect("rank 2"));

    // --- Test 3: point-to-point halves accept any length ---
    let results = LocalWorld::run(2, |mut comm| -> Result<usize, CommError> {
        if comm.is_root() {
            let spans = [Span { offset: 0, count: 1 }, Span { offset: 1, count: 4 }];
            let data = [1u8, 2, 3, 4, 5];
            let mine = scatterv(&mut comm, ROOT, Some(&data[..]), &spans)?;
            let mut back = [0u8; 5];
            gatherv(&mut comm, ROOT, &mine, &spans, Some(&mut back[..]))?;
            Ok(back.iter().map(|&b| b as usize).sum())
        } else {
            let mut part: Vec<u8> = receive_partition(&mut comm, ROOT, None)?;
            part.iter_mut().for_each(|b| *b *= 10);
            send_partition(&mut comm, ROOT, &part)?;
            Ok(part.len())
        }
    })
    .expect("world");
    rp.compare_values(141.0, *results[0].as_ref().expect("root") as f64, 0.0);
    rp.compare_values(4.0, *results[1].as_ref().expect("worker") as f64, 0.0);

    // --- Test 4: mismatched span tables are rejected ---
    let results = LocalWorld::run(2, |mut comm| -> Result<Vec<u8>, CommError> {
        let spans = [Span { offset: 0, count: 2 }];
        let data = [0u8; 2];
        scatterv(&mut comm, ROOT, Some(&data[..]), &spans)
    })
    .expect("world");
    rp.check(
        results.iter().all(|r| matches!(r, Err(CommError::InvalidPartition(_)))),
        "span count must match world size",
    );

    assert!(rp.cleanup(), "collective regression test failed");
}
