//! Inversion regression test

use pixscatter_core::{Pixel, Raster, invert_raster};
use pixscatter_test::{RegParams, random_raster};

#[test]
fn invert_reg() {
    let mut rp = RegParams::new("invert");

    let mut solid = Raster::filled(4, 4, Pixel::new(200, 100, 50)).expect("solid raster");
    invert_raster(&mut solid);
    rp.check(
        solid.pixels().iter().all(|&p| p == Pixel::new(55, 155, 205)),
        "(200, 100, 50) inverts to (55, 155, 205)",
    );

    // Inverting twice is the identity
    let original = random_raster(31, 13, 99).expect("random raster");
    let mut twice = original.clone();
    invert_raster(&mut twice);
    rp.check(twice != original, "single inversion changes the raster");
    invert_raster(&mut twice);
    rp.compare_rasters(&original, &twice);

    rp.compare_values(255.0, Pixel::gray(0).inverted().r as f64, 0.0);
    rp.compare_values(0.0, Pixel::gray(255).inverted().b as f64, 0.0);

    assert!(rp.cleanup(), "invert regression test failed");
}
