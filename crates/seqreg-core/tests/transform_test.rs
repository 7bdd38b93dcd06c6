use burn::tensor::{Tensor, TensorData};
use burn_ndarray::NdArray;
use proptest::prelude::*;
use seqreg_core::spatial::{Point2, Vector2};
use seqreg_core::transform::{
    Rigid2DTransform, Transform, Transform2D, TransformGroup, Translation2DTransform,
};
use std::f64::consts::PI;

type B = NdArray<f32>;

#[test]
fn test_rigid_transform_tensor_path() {
    let device = Default::default();

    // Rotate 90 degrees about the origin and translate by (1, 1)
    // Point (1, 0) -> (0, 1) -> (1, 2)
    let points = Tensor::<B, 2>::from_data(TensorData::from([[1.0f32, 0.0]]), &device);
    let transform = Transform2D::Rigid2D(Rigid2DTransform::new(
        PI / 2.0,
        Point2::origin(),
        Vector2::new(1.0, 1.0),
    ));

    let actual: Vec<f32> = transform.transform_points(points).into_data().iter::<f32>().collect();
    let expected = [1.0, 2.0];
    for axis in 0..2 {
        assert!(
            (actual[axis] - expected[axis]).abs() < 1e-5,
            "axis {} mismatch: got {}, expected {}",
            axis,
            actual[axis],
            expected[axis]
        );
    }
}

#[test]
fn test_mixed_compose_is_rigid() {
    let rigid = Transform2D::Rigid2D(Rigid2DTransform::new(
        0.25,
        Point2::new(3.0, 4.0),
        Vector2::new(1.0, 0.0),
    ));
    let shift = Transform2D::Translation2D(Translation2DTransform::new(Vector2::new(-2.0, 5.0)));
    for (a, b) in [(rigid, shift), (shift, rigid)] {
        for pre in [true, false] {
            let c = Transform2D::compose(&a, &b, pre);
            assert_eq!(c.type_name(), "Rigid2D");
            let p = Point2::new(-1.0, 2.5);
            let expected = if pre {
                a.transform_point(&b.transform_point(&p))
            } else {
                b.transform_point(&a.transform_point(&p))
            };
            assert!((c.transform_point(&p) - expected).norm() < 1e-10);
        }
    }
}

fn rigid_strategy() -> impl Strategy<Value = Transform2D> {
    (
        -PI..PI,
        -50.0f64..50.0,
        -50.0f64..50.0,
        -20.0f64..20.0,
        -20.0f64..20.0,
    )
        .prop_map(|(angle, cx, cy, tx, ty)| {
            let center = Point2::new(cx, cy);
            Transform2D::Rigid2D(Rigid2DTransform::new(angle, center, Vector2::new(tx, ty)))
        })
}

proptest! {
    #[test]
    fn test_compose_with_identity_preserves_parameters(t in rigid_strategy(), pre in any::<bool>()) {
        let identity = Transform2D::identity();
        prop_assert_eq!(Transform2D::compose(&t, &identity, pre).parameters(), t.parameters());
        prop_assert_eq!(Transform2D::compose(&identity, &t, pre).parameters(), t.parameters());
    }

    #[test]
    fn test_compose_matches_sequential_application(
        a in rigid_strategy(),
        b in rigid_strategy(),
        x in -100.0f64..100.0,
        y in -100.0f64..100.0,
    ) {
        let p = Point2::new(x, y);
        let c = Transform2D::compose(&a, &b, true);
        let expected = a.transform_point(&b.transform_point(&p));
        prop_assert!((c.transform_point(&p) - expected).norm() < 1e-8);
    }

    #[test]
    fn test_inverse_round_trip(t in rigid_strategy(), x in -100.0f64..100.0, y in -100.0f64..100.0) {
        let p = Point2::new(x, y);
        let back = t.inverse().transform_point(&t.transform_point(&p));
        prop_assert!((back - p).norm() < 1e-8);
    }

    #[test]
    fn test_accumulated_matches_chain(transforms in prop::collection::vec(rigid_strategy(), 1..6)) {
        let group: TransformGroup = transforms.iter().copied().collect();
        let accumulated = group.accumulated();
        prop_assert_eq!(accumulated.len(), transforms.len() + 1);

        let p = Point2::new(7.0, -3.0);
        let mut expected = p;
        for (k, t) in transforms.iter().enumerate() {
            expected = t.transform_point(&expected);
            prop_assert!((accumulated[k + 1].transform_point(&p) - expected).norm() < 1e-7);
        }
    }
}
