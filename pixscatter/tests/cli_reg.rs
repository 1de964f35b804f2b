//! Command-line regression test
//!
//! Runs the built binaries on thread worlds of several sizes.

use std::process::Command;

use pixscatter::io::{read_raster, write_raster};
use pixscatter::{Pixel, Raster};
use pixscatter_test::{RegParams, gradient_raster};

const INVERT: &str = env!("CARGO_BIN_EXE_pixscatter-invert");
const CONVOLVE: &str = env!("CARGO_BIN_EXE_pixscatter-convolve");

fn command(exe: &str, world_size: usize) -> Command {
    let mut cmd = Command::new(exe);
    cmd.env("PIXSCATTER_WORLD_SIZE", world_size.to_string())
        .env("PIXSCATTER_TRANSPORT", "threads");
    cmd
}

#[test]
fn cli_reg() {
    let mut rp = RegParams::new("cli");
    let dir = tempfile::tempdir().expect("temp dir");
    let input = dir.path().join("before.bmp");
    let raster = Raster::filled(6, 5, Pixel::new(200, 100, 50)).expect("solid");
    write_raster(&input, &raster).expect("write input");

    // --- Test 1: help and argument errors ---
    let status = Command::new(CONVOLVE).arg("--help").output().expect("run --help");
    rp.check(status.status.success(), "--help exits 0");
    rp.check(
        String::from_utf8_lossy(&status.stdout).contains("--iterations"),
        "--help lists the iterations flag",
    );
    let status = Command::new(CONVOLVE).output().expect("run without args");
    rp.compare_values(1.0, status.status.code().unwrap_or(-1) as f64, 0.0);
    let status = Command::new(CONVOLVE)
        .args(["a.bmp", "b.bmp", "--kernel", "sharpen"])
        .output()
        .expect("run with bad kernel");
    rp.compare_values(1.0, status.status.code().unwrap_or(-1) as f64, 0.0);

    // --- Test 2: inversion on 3 ranks, default file names ---
    let status = command(INVERT, 3)
        .current_dir(dir.path())
        .status()
        .expect("run invert");
    rp.check(status.success(), "invert on 3 ranks succeeds");
    let after = read_raster(dir.path().join("after.bmp")).expect("read after.bmp");
    rp.check(
        after.pixels().iter().all(|&p| p == Pixel::new(55, 155, 205)),
        "after.bmp is inverted",
    );

    // --- Test 3: halo convolution on 3 ranks matches one rank ---
    let gradient = gradient_raster(10, 9).expect("gradient");
    let src = dir.path().join("gradient.bmp");
    write_raster(&src, &gradient).expect("write gradient");
    let one = dir.path().join("one.bmp");
    let three = dir.path().join("three.bmp");
    for (size, out) in [(1, &one), (3, &three)] {
        let status = command(CONVOLVE, size)
            .arg(&src)
            .arg(out)
            .args(["-i", "2", "-k", "gaussian", "--halo"])
            .status()
            .expect("run convolve");
        rp.check(status.success(), &format!("convolve on {} ranks", size));
    }
    let one = read_raster(&one).expect("read one");
    let three = read_raster(&three).expect("read three");
    rp.compare_rasters(&one, &three);

    // --- Test 4: missing input fails both modes ---
    let missing = dir.path().join("missing.bmp");
    let never = dir.path().join("never.bmp");
    let mut convolve = command(CONVOLVE, 3);
    convolve.arg(&missing).arg(&never);
    let mut invert = command(INVERT, 3);
    invert.arg("--input").arg(&missing).arg("--output").arg(&never);
    for mut cmd in [convolve, invert] {
        let output = cmd.output().expect("run with missing input");
        rp.compare_values(1.0, output.status.code().unwrap_or(-1) as f64, 0.0);
        rp.check(
            String::from_utf8_lossy(&output.stderr).contains("missing.bmp"),
            "error names the input",
        );
    }

    // --- Test 5: unknown transport is a launch error ---
    let output = command(INVERT, 2)
        .env("PIXSCATTER_TRANSPORT", "carrier-pigeon")
        .current_dir(dir.path())
        .output()
        .expect("run with bad transport");
    rp.compare_values(1.0, output.status.code().unwrap_or(-1) as f64, 0.0);
    rp.check(
        String::from_utf8_lossy(&output.stderr).contains("PIXSCATTER_TRANSPORT"),
        "error names the variable",
    );

    assert!(rp.cleanup(), "cli regression test failed");
}
