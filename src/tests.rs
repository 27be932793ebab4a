use super::*;
use glam::DVec3;

fn faces_as_sets(hull: &QuickHull3d) -> Vec<std::collections::BTreeSet<usize>> {
    hull.faces()
        .into_iter()
        .map(|f| f.into_iter().collect())
        .collect()
}

#[test]
fn four_points_coincident() {
    let points = (0..4).map(|_| DVec3::splat(1.0)).collect::<Vec<_>>();
    let mut hull = QuickHull3d::from_points(&points).unwrap();
    assert_eq!(hull.build_hull(), Err(QhullError::Coincident));
}

#[test]
fn four_points_collinear() {
    let mut points = (0..4).map(|_| DVec3::splat(1.0)).collect::<Vec<_>>();
    points[0].x += 1.0;
    points[1].x += 2.0;
    let mut hull = QuickHull3d::from_points(&points).unwrap();
    assert_eq!(hull.build_hull(), Err(QhullError::Collinear));
}

#[test]
fn four_points_coplanar() {
    let mut points = (0..4).map(|_| DVec3::splat(1.0)).collect::<Vec<_>>();
    points[0].x += 1.0;
    points[1].y += 1.0;
    let mut hull = QuickHull3d::from_points(&points).unwrap();
    assert_eq!(hull.build_hull(), Err(QhullError::Coplanar));
}

#[test]
fn malformed_input_too_few_points() {
    let points = [DVec3::ZERO, DVec3::X, DVec3::Y];
    assert_eq!(
        QuickHull3d::from_points(&points).unwrap_err(),
        QhullError::MalformedInput("at least 4 points are required to build a 3d hull")
    );
}

#[test]
fn malformed_input_length_not_multiple_of_three() {
    let coords = [0.0, 0.0, 0.0, 1.0, 0.0];
    assert_eq!(
        QuickHull3d::new(&coords).unwrap_err(),
        QhullError::MalformedInput("coordinate array length must be a multiple of 3")
    );
}

#[test]
fn tetrahedron_has_exactly_four_triangular_faces() {
    let points = [
        DVec3::new(0.0, 0.0, 0.0),
        DVec3::new(1.0, 0.0, 0.0),
        DVec3::new(0.0, 1.0, 0.0),
        DVec3::new(0.0, 0.0, 1.0),
    ];
    let mut hull = QuickHull3d::from_points(&points).unwrap();
    hull.build_hull().unwrap();
    let faces = hull.faces();
    assert_eq!(faces.len(), 4);
    for face in &faces {
        assert_eq!(face.len(), 3);
    }
    assert!(hull.check(None));
}

#[test]
fn octahedron_euler_formula() {
    let points = [
        DVec3::new(1.0, 0.0, 0.0),
        DVec3::new(0.0, 1.0, 0.0),
        DVec3::new(0.0, 0.0, 1.0),
        DVec3::new(-1.0, 0.0, 0.0),
        DVec3::new(0.0, -1.0, 0.0),
        DVec3::new(0.0, 0.0, -1.0),
    ];
    let mut hull = QuickHull3d::from_points(&points).unwrap();
    hull.build_hull().unwrap();
    let faces = hull.faces();
    assert_eq!(faces.len(), 8);
    for face in &faces {
        assert_eq!(face.len(), 3);
    }
    assert!(hull.check(None));
    assert_euler_formula(&faces);
}

#[test]
fn cube_faces_merge_into_six_quads() {
    let points = [
        DVec3::new(1.0, 1.0, 1.0),
        DVec3::new(1.0, 1.0, -1.0),
        DVec3::new(1.0, -1.0, 1.0),
        DVec3::new(1.0, -1.0, -1.0),
        DVec3::new(-1.0, 1.0, 1.0),
        DVec3::new(-1.0, 1.0, -1.0),
        DVec3::new(-1.0, -1.0, 1.0),
        DVec3::new(-1.0, -1.0, -1.0),
    ];
    let mut hull = QuickHull3d::from_points(&points).unwrap();
    hull.build_hull().unwrap();
    let faces = hull.faces();
    assert_eq!(faces.len(), 6, "corner-only cube should merge to 6 quads: {faces:?}");
    for face in &faces {
        assert_eq!(face.len(), 4);
    }
    assert!(hull.check(None));
    assert_euler_formula(&faces);
}

#[test]
fn cube_with_clipped_faces_merges_to_six_quads() {
    // Each face of the cube carries several extra coplanar points, exercising
    // the non-convex merge passes rather than landing on bare corners.
    let mut rng_state = 0x2545F4914F6CDD1Du64;
    let mut next = || {
        rng_state ^= rng_state << 13;
        rng_state ^= rng_state >> 7;
        rng_state ^= rng_state << 17;
        (rng_state >> 11) as f64 / (1u64 << 53) as f64
    };

    let mut points = vec![
        DVec3::new(1.0, 1.0, 1.0),
        DVec3::new(1.0, 1.0, -1.0),
        DVec3::new(1.0, -1.0, 1.0),
        DVec3::new(1.0, -1.0, -1.0),
        DVec3::new(-1.0, 1.0, 1.0),
        DVec3::new(-1.0, 1.0, -1.0),
        DVec3::new(-1.0, -1.0, 1.0),
        DVec3::new(-1.0, -1.0, -1.0),
    ];
    for axis in 0..3 {
        for sign in [-1.0, 1.0] {
            for _ in 0..20 {
                let mut p = DVec3::new(next() * 2.0 - 1.0, next() * 2.0 - 1.0, next() * 2.0 - 1.0);
                p[axis] = sign;
                points.push(p);
            }
        }
    }

    let mut hull = QuickHull3d::from_points(&points).unwrap();
    hull.build_hull().unwrap();
    let faces = hull.faces();
    assert_eq!(faces.len(), 6, "clipped cube should merge to 6 quads: {faces:?}");
    assert!(hull.check(None));
}

#[test]
fn scenario_a_seven_point_hull() {
    let coords = [
        0.0, 0.0, 0.0, 1.0, 0.5, 0.0, 2.0, 0.0, 0.0, 0.5, 0.5, 0.5, 0.0, 0.0, 2.0, 0.1, 0.2, 0.3,
        0.0, 2.0, 0.0,
    ];
    let mut hull = QuickHull3d::new(&coords).unwrap();
    hull.build_hull().unwrap();
    assert_eq!(hull.faces().len(), 4);
    assert!(hull.check(None));

    let expected: Vec<std::collections::BTreeSet<usize>> = [[2, 4, 0], [6, 2, 0], [6, 0, 4], [6, 4, 2]]
        .into_iter()
        .map(|s| s.into_iter().collect())
        .collect();
    let actual = faces_as_sets(&hull);
    for want in &expected {
        assert!(actual.contains(want), "expected face {want:?} not found in {actual:?}");
    }
}

#[test]
fn scenario_b_eleven_point_hull_checks_out() {
    let coords = [
        21.0, 0.0, 0.0, 0.0, 21.0, 0.0, 0.0, 0.0, 0.0, 18.0, 2.0, 6.0, 1.0, 18.0, 5.0, 2.0, 1.0,
        3.0, 14.0, 3.0, 10.0, 4.0, 14.0, 14.0, 3.0, 4.0, 10.0, 10.0, 6.0, 12.0, 5.0, 10.0, 15.0,
    ];
    let mut hull = QuickHull3d::new(&coords).unwrap();
    hull.build_hull().unwrap();
    assert!(hull.check(None));
    for face in hull.faces() {
        assert!(face.len() >= 3);
    }
}

#[test]
fn scenario_c_coincident_points_fail_with_exact_message() {
    let mut rng_state = 12345u64;
    let mut next = || {
        rng_state ^= rng_state << 13;
        rng_state ^= rng_state >> 7;
        rng_state ^= rng_state << 17;
        (rng_state >> 11) as f64 / (1u64 << 53) as f64 * f64::EPSILON
    };
    let points: Vec<_> = (0..10)
        .map(|_| DVec3::new(1.0 + next(), 1.0 + next(), 1.0 + next()))
        .collect();
    let mut hull = QuickHull3d::from_points(&points).unwrap();
    let err = hull.build_hull().unwrap_err();
    assert_eq!(err.to_string(), "Input points appear to be coincident");
}

#[test]
fn scenario_d_collinear_points_fail_with_exact_message() {
    let mut rng_state = 777u64;
    let mut next = || {
        rng_state ^= rng_state << 13;
        rng_state ^= rng_state >> 7;
        rng_state ^= rng_state << 17;
        (rng_state >> 11) as f64 / (1u64 << 53) as f64 * f64::EPSILON
    };
    let points: Vec<_> = (0..10)
        .map(|i| DVec3::new(i as f64 + next(), i as f64 + next(), i as f64 + next()))
        .collect();
    let mut hull = QuickHull3d::from_points(&points).unwrap();
    let err = hull.build_hull().unwrap_err();
    assert_eq!(err.to_string(), "Input points appear to be colinear");
}

#[test]
fn scenario_e_coplanar_points_fail_with_exact_message() {
    let mut rng_state = 99u64;
    let mut next = || {
        rng_state ^= rng_state << 13;
        rng_state ^= rng_state >> 7;
        rng_state ^= rng_state << 17;
        (rng_state >> 11) as f64 / (1u64 << 53) as f64
    };
    // x, y spread genuinely over the plane; z stays within epsilon of 0.
    let points: Vec<_> = (0..10)
        .map(|_| DVec3::new(next() * 10.0, next() * 10.0, next() * f64::EPSILON))
        .collect();
    let mut hull = QuickHull3d::from_points(&points).unwrap();
    let err = hull.build_hull().unwrap_err();
    assert_eq!(err.to_string(), "Input points appear to be coplanar");
}

#[test]
fn scenario_f_cube_cloud_with_degenerate_augmentation() {
    for seed in 0u64..100 {
        let mut rng_state = seed.wrapping_mul(0x9E3779B97F4A7C15).wrapping_add(1);
        let mut next = || {
            rng_state ^= rng_state << 13;
            rng_state ^= rng_state >> 7;
            rng_state ^= rng_state << 17;
            (rng_state >> 11) as f64 / (1u64 << 53) as f64
        };

        let mut points: Vec<DVec3> = (0..100)
            .map(|_| DVec3::new(next() * 2.0 - 1.0, next() * 2.0 - 1.0, next() * 2.0 - 1.0))
            .collect();

        let mut hull = QuickHull3d::from_points(&points).unwrap();
        hull.build_hull().unwrap();

        // Add one degenerate point per current face, sitting exactly on that
        // face's plane at its centroid.
        for face in hull.faces() {
            let centroid = face.iter().fold(DVec3::ZERO, |acc, &i| acc + points[i]) / face.len() as f64;
            points.push(centroid);
        }

        let mut hull = QuickHull3d::from_points(&points).unwrap();
        hull.build_hull()
            .unwrap_or_else(|e| panic!("seed {seed} failed to build: {e}"));
        assert!(hull.check(None), "seed {seed} failed consistency check");
    }
}

#[test]
fn rigid_rotation_preserves_combinatorial_hull() {
    let points = [
        DVec3::new(0.0, 0.0, 0.0),
        DVec3::new(2.0, 0.0, 0.0),
        DVec3::new(0.0, 2.0, 0.0),
        DVec3::new(0.0, 0.0, 2.0),
        DVec3::new(1.0, 1.0, 1.0),
        DVec3::new(0.5, 0.5, 1.5),
    ];

    let mut hull = QuickHull3d::from_points(&points).unwrap();
    hull.build_hull().unwrap();
    let original: std::collections::BTreeSet<_> = faces_as_sets(&hull).into_iter().collect();

    // A fixed orthonormal rotation (90 degrees about the z axis).
    let rotated_points: Vec<DVec3> = points.iter().map(|p| DVec3::new(-p.y, p.x, p.z)).collect();
    let mut rotated_hull = QuickHull3d::from_points(&rotated_points).unwrap();
    rotated_hull.build_hull().unwrap();
    let rotated: std::collections::BTreeSet<_> = faces_as_sets(&rotated_hull).into_iter().collect();

    assert_eq!(original, rotated);
}

#[test]
fn explicit_tolerance_round_trips_and_restores_automatic() {
    let points = [
        DVec3::new(0.0, 0.0, 0.0),
        DVec3::new(1.0, 0.0, 0.0),
        DVec3::new(0.0, 1.0, 0.0),
        DVec3::new(0.0, 0.0, 1.0),
    ];
    let mut hull = QuickHull3d::from_points(&points).unwrap();
    hull.build_hull().unwrap();
    let automatic = hull.distance_tolerance();
    assert!(automatic >= 0.0);

    hull.set_explicit_distance_tolerance(1e-3);
    assert_eq!(hull.distance_tolerance(), 1e-3);

    hull.set_explicit_distance_tolerance(-1.0);
    hull.build_hull().unwrap();
    assert_eq!(hull.distance_tolerance(), automatic);
}

#[test]
fn build_hull_is_safe_to_call_more_than_once() {
    let points = [
        DVec3::new(0.0, 0.0, 0.0),
        DVec3::new(1.0, 0.0, 0.0),
        DVec3::new(0.0, 1.0, 0.0),
        DVec3::new(0.0, 0.0, 1.0),
        DVec3::new(0.3, 0.3, 0.3),
    ];
    let mut hull = QuickHull3d::from_points(&points).unwrap();
    hull.build_hull().unwrap();
    let first = hull.faces().len();
    hull.build_hull().unwrap();
    let second = hull.faces().len();
    assert_eq!(first, second);
}

fn init_logger() {
    let _ = env_logger::try_init();
}

#[test]
fn debug_toggle_defaults_off() {
    let points = [
        DVec3::new(0.0, 0.0, 0.0),
        DVec3::new(1.0, 0.0, 0.0),
        DVec3::new(0.0, 1.0, 0.0),
        DVec3::new(0.0, 0.0, 1.0),
    ];
    let mut hull = QuickHull3d::from_points(&points).unwrap();
    assert!(!hull.debug());
    hull.set_debug(true);
    assert!(hull.debug());

    // With debug on, build_hull should emit log::info!/debug! through
    // whatever logger the caller installs; exercise that path with
    // env_logger the way the bench does.
    init_logger();
    hull.build_hull().unwrap();
}

#[test]
fn sphere_hull_is_consistent() {
    let points = sphere_points(40);
    let mut hull = QuickHull3d::from_points(&points).unwrap();
    hull.build_hull().unwrap();
    assert!(hull.check(None));
    let faces = hull.faces();
    for face in &faces {
        assert!(face.len() >= 3);
    }
    assert_euler_formula(&faces);
}

/// Useful for fuzzing and profiling: a sea-urchin-like point cloud with
/// points distributed arbitrarily within a sphere.
#[test]
fn heavy_sea_urchin_test() {
    let mut rng_state = 0xA5A5A5A5A5A5A5A5u64;
    let mut next = || {
        rng_state ^= rng_state << 13;
        rng_state ^= rng_state >> 7;
        rng_state ^= rng_state << 17;
        (rng_state >> 11) as f64 / (1u64 << 53) as f64
    };

    fn rot_z(point: DVec3, angle: f64) -> DVec3 {
        let e1 = angle.cos() * point[0] - angle.sin() * point[1];
        let e2 = angle.sin() * point[0] + angle.cos() * point[1];
        let e3 = point[2];
        DVec3::new(e1, e2, e3)
    }

    fn rot_x(point: DVec3, angle: f64) -> DVec3 {
        let e1 = point[0];
        let e2 = angle.cos() * point[1] - angle.sin() * point[2];
        let e3 = angle.sin() * point[1] + angle.cos() * point[2];
        DVec3::new(e1, e2, e3)
    }

    let mut points = Vec::new();
    let dev = 60;
    let unit_y = DVec3::Y;
    for step_x in 0..dev {
        let angle_x = 2.0 * std::f64::consts::PI * (step_x as f64 / dev as f64);
        let p = rot_x(unit_y, angle_x);
        for step_z in 0..dev {
            let angle_z = 2.0 * std::f64::consts::PI * (step_z as f64 / dev as f64);
            let p = rot_z(p, angle_z);
            let rand_offset = 0.2 + 0.8 * next();
            points.push(p * rand_offset);
        }
    }

    let mut hull = QuickHull3d::from_points(&points).unwrap();
    hull.build_hull().unwrap();
    assert!(hull.check(None));
}

fn sphere_points(divisions: usize) -> Vec<DVec3> {
    fn rot_z(point: DVec3, angle: f64) -> DVec3 {
        let e1 = angle.cos() * point[0] - angle.sin() * point[1];
        let e2 = angle.sin() * point[0] + angle.cos() * point[1];
        let e3 = point[2];
        DVec3::new(e1, e2, e3)
    }

    fn rot_x(point: DVec3, angle: f64) -> DVec3 {
        let e1 = point[0];
        let e2 = angle.cos() * point[1] - angle.sin() * point[2];
        let e3 = angle.sin() * point[1] + angle.cos() * point[2];
        DVec3::new(e1, e2, e3)
    }

    let mut points = Vec::with_capacity(divisions * divisions);
    let unit_y = DVec3::Y;
    for step_x in 0..divisions {
        let angle_x = 2.0 * std::f64::consts::PI * (step_x as f64 / divisions as f64);
        let p = rot_x(unit_y, angle_x);
        for step_z in 0..divisions {
            let angle_z = 2.0 * std::f64::consts::PI * (step_z as f64 / divisions as f64);
            let p = rot_z(p, angle_z);
            points.push(p);
        }
    }
    points
}

/// V - E + F == 2, with E counted as undirected edges.
fn assert_euler_formula(faces: &[Vec<usize>]) {
    let mut vertices = std::collections::BTreeSet::new();
    let mut directed_edges = 0usize;
    let mut undirected = std::collections::BTreeSet::new();
    for face in faces {
        let n = face.len();
        for i in 0..n {
            let a = face[i];
            let b = face[(i + 1) % n];
            vertices.insert(a);
            directed_edges += 1;
            undirected.insert((a.min(b), a.max(b)));
        }
    }
    let v = vertices.len() as isize;
    let e = undirected.len() as isize;
    let f = faces.len() as isize;
    assert_eq!(directed_edges, 2 * undirected.len(), "every undirected edge should appear exactly twice");
    assert_eq!(v - e + f, 2, "Euler's formula violated: V={v} E={e} F={f}");
}
