//! Collision detection tests

use highway_sim::simulation::{all_hits, check_collision, first_hit, Aabb};
use proptest::prelude::*;

#[test]
fn test_overlapping_boxes_collide() {
    let a = Aabb::new(0.0, 0.0, 50.0, 80.0);
    let b = Aabb::new(30.0, 60.0, 50.0, 80.0);
    assert!(check_collision(&a, &b));
}

#[test]
fn test_touching_edges_do_not_collide() {
    let a = Aabb::new(0.0, 0.0, 50.0, 80.0);
    let right = Aabb::new(50.0, 0.0, 50.0, 80.0);
    let below = Aabb::new(0.0, 80.0, 50.0, 80.0);
    assert!(!check_collision(&a, &right));
    assert!(!check_collision(&a, &below));
}

#[test]
fn test_hits_report_keys_in_iteration_order() {
    let subject = Aabb::new(100.0, 100.0, 50.0, 80.0);
    let others = [
        (1usize, Aabb::new(0.0, 0.0, 10.0, 10.0)),
        (2, Aabb::new(120.0, 90.0, 40.0, 20.0)),
        (3, Aabb::new(140.0, 170.0, 40.0, 20.0)),
    ];
    let pairs = others.iter().map(|(k, b)| (k, b));
    assert_eq!(first_hit(&subject, pairs.clone()), Some(2));
    assert_eq!(all_hits(&subject, pairs), vec![2, 3]);
}

fn boxes() -> impl Strategy<Value = Aabb> {
    (-500.0f32..500.0, -500.0f32..500.0, 1.0f32..200.0, 1.0f32..200.0)
        .prop_map(|(x, y, w, h)| Aabb::new(x, y, w, h))
}

proptest! {
    #[test]
    fn collision_is_symmetric(a in boxes(), b in boxes()) {
        prop_assert_eq!(check_collision(&a, &b), check_collision(&b, &a));
    }

    #[test]
    fn box_collides_with_itself(a in boxes()) {
        prop_assert!(check_collision(&a, &a));
    }

    #[test]
    fn separated_boxes_never_collide(a in boxes(), gap in 0.0f32..100.0) {
        let b = Aabb::new(a.x + a.width + gap, a.y, a.width, a.height);
        prop_assert!(!check_collision(&a, &b));
    }
}
