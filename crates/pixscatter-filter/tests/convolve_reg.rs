//! Convolution regression test
//!
//! Single passes of catalog and hand-built kernels over small planes whose
//! results can be worked out by hand.

use pixscatter_core::ChannelPlane;
use pixscatter_filter::{Kernel, KernelName, apply_kernel, convolve_plane};
use pixscatter_test::{RegParams, random_plane};

fn plane(width: u32, samples: &[u8]) -> ChannelPlane {
    ChannelPlane::from_rows(width, samples.to_vec()).expect("plane")
}

#[test]
fn convolve_reg() {
    let mut rp = RegParams::new("convolve");

    // --- Test 1: identity leaves every plane alone ---
    let src = random_plane(23, 11, 5).expect("random plane");
    let out = convolve_plane(&src, KernelName::Identity.kernel()).expect("identity");
    rp.compare_planes(&src, &out);

    // --- Test 2: saturation clamps both ways ---
    let up = Kernel::new(1, vec![5], 1.0).expect("x5 kernel");
    let out = convolve_plane(&plane(1, &[100]), &up).expect("x5");
    rp.compare_values(255.0, out.samples()[0] as f64, 0.0);
    let down = Kernel::new(1, vec![-1], 1.0).expect("negate kernel");
    let out = convolve_plane(&plane(1, &[50]), &down).expect("negate");
    rp.compare_values(0.0, out.samples()[0] as f64, 0.0);

    // --- Test 3: factor product truncates toward zero ---
    let half = Kernel::new(1, vec![1], 0.5).expect("half kernel");
    let out = convolve_plane(&plane(3, &[3, 255, 1]), &half).expect("half");
    rp.compare_strings(&[1, 127, 0], out.samples());

    // --- Test 4: the kernel is flipped ---
    // Only the top-left weight is set; true convolution pulls each cell
    // from its lower-right neighbour
    let corner = Kernel::new(3, vec![1, 0, 0, 0, 0, 0, 0, 0, 0], 1.0).expect("corner kernel");
    let impulse = plane(3, &[0, 0, 0, 0, 10, 0, 0, 0, 0]);
    let out = convolve_plane(&impulse, &corner).expect("corner");
    rp.compare_strings(&[10, 0, 0, 0, 0, 0, 0, 0, 0], out.samples());

    // --- Test 5: zero padding at the edges ---
    let ones = Kernel::new(3, vec![1; 9], 1.0).expect("box kernel");
    let out = convolve_plane(&plane(3, &[10; 9]), &ones).expect("box");
    rp.compare_strings(&[40, 60, 40, 60, 90, 60, 40, 60, 40], out.samples());

    // --- Test 6: catalog kernels on flat and ramp inputs ---
    let flat = plane(5, &[100; 25]);
    let lap = convolve_plane(&flat, KernelName::Laplacian1.kernel()).expect("laplacian1");
    rp.compare_values(0.0, lap.get(2, 2).unwrap_or(99) as f64, 0.0);
    // Corner sees 20 - 4 - 4 - 1 of the flat value
    rp.compare_values(255.0, lap.get(0, 0).unwrap_or(0) as f64, 0.0);

    let gauss = convolve_plane(&flat, KernelName::Gaussian.kernel()).expect("gaussian");
    rp.compare_values(100.0, gauss.get(2, 2).unwrap_or(0) as f64, 0.0);
    rp.check(gauss.get(0, 0).unwrap_or(255) < 100, "gaussian darkens corners");

    let ramp: Vec<u8> = (0..15).map(|i| (i % 5) as u8 * 10).collect();
    let ramp = plane(5, &ramp);
    let sobel = convolve_plane(&ramp, KernelName::SobelX.kernel()).expect("sobel-x");
    // Both outer columns weigh -4 in total, so every response clamps to zero
    rp.check(sobel.samples().iter().all(|&v| v == 0), "sobel-x clamps ramp to zero");
    let sobel_y = convolve_plane(&ramp, KernelName::SobelY.kernel()).expect("sobel-y");
    // Top row only sees the row below, weighted negative after flipping
    rp.compare_values(0.0, sobel_y.get(2, 0).unwrap_or(99) as f64, 0.0);
    // Bottom row only sees the row above: 10 + 2 * 20 + 30 = 80
    rp.compare_values(80.0, sobel_y.get(2, 2).unwrap_or(0) as f64, 0.0);

    // --- Test 7: size mismatch ---
    let mut wrong = ChannelPlane::new(2, 2).expect("plane");
    rp.check(
        apply_kernel(&flat, &mut wrong, &ones).is_err(),
        "mismatched destination rejected",
    );

    // --- Test 8: lookup by name ---
    for name in KernelName::ALL {
        let k = Kernel::by_name(&name.to_string()).expect("lookup");
        rp.check(k.dim() % 2 == 1 && k.weights().len() == (k.dim() * k.dim()) as usize, k.name());
    }
    rp.check(Kernel::by_name("sharpen").is_err(), "unknown kernel rejected");

    assert!(rp.cleanup(), "convolve regression test failed");
}
