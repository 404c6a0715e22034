use star_instances::image::TensorF32;

/// Disk-shaped object used to synthesize network outputs.
#[derive(Clone, Copy, Debug)]
pub struct Disk {
    pub center: [f32; 2],
    pub radius: f32,
    pub peak: f32,
}

/// Distance from `p` to the boundary of `disk` along direction `(dy, dx)`.
fn ray_to_circle(p: [f32; 2], disk: &Disk, dir: [f32; 2]) -> f32 {
    let o = [p[0] - disk.center[0], p[1] - disk.center[1]];
    let b = o[0] * dir[0] + o[1] * dir[1];
    let c = o[0] * o[0] + o[1] * o[1] - disk.radius * disk.radius;
    (-b + (b * b - c).max(0.0).sqrt()).max(0.0)
}

/// Raw `h × w × (1 + n_rays)` output for a set of disks.
///
/// The probability falls off linearly from `peak` at the center to 0 at the
/// rim; pixels inside a disk carry exact ray distances to its boundary.
/// Background pixels have zero probability and unit distances.
pub fn disk_prediction(h: usize, w: usize, n_rays: usize, disks: &[Disk]) -> TensorF32 {
    let mut out = TensorF32::new(h, w, 1 + n_rays);
    let dirs: Vec<[f32; 2]> = (0..n_rays)
        .map(|k| {
            let phi = 2.0 * std::f32::consts::PI * k as f32 / n_rays as f32;
            [phi.sin(), phi.cos()]
        })
        .collect();
    for y in 0..h {
        for x in 0..w {
            let p = [y as f32, x as f32];
            let mut best: Option<(f32, &Disk)> = None;
            for disk in disks {
                let d = ((p[0] - disk.center[0]).powi(2) + (p[1] - disk.center[1]).powi(2)).sqrt();
                if d >= disk.radius {
                    continue;
                }
                let prob = disk.peak * (1.0 - d / disk.radius);
                if best.map_or(true, |(b, _)| prob > b) {
                    best = Some((prob, disk));
                }
            }
            match best {
                Some((prob, disk)) => {
                    out.set(y, x, 0, prob);
                    for (k, dir) in dirs.iter().enumerate() {
                        out.set(y, x, 1 + k, ray_to_circle(p, disk, *dir));
                    }
                }
                None => {
                    for k in 0..n_rays {
                        out.set(y, x, 1 + k, 1.0);
                    }
                }
            }
        }
    }
    out
}

/// Output with uniform distances and explicit probability peaks.
pub fn peak_prediction(h: usize, w: usize, n_rays: usize, dist: f32, peaks: &[([usize; 2], f32)]) -> TensorF32 {
    let mut out = TensorF32::new(h, w, 1 + n_rays);
    for y in 0..h {
        for x in 0..w {
            for k in 0..n_rays {
                out.set(y, x, 1 + k, dist);
            }
        }
    }
    for &([y, x], p) in peaks {
        out.set(y, x, 0, p);
    }
    out
}
