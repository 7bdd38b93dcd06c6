use proptest::prelude::*;
use seqreg_core::spatial::{Point2, Vector2};
use seqreg_core::{Rigid2DTransform, Transform2D, TransformGroup, Translation2DTransform};
use seqreg_io::{load_transform_group, read_transform_group, save_transform_group};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_save_and_read_rigid() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("transforms.txt");
    let group = TransformGroup::from_transforms(vec![Transform2D::Rigid2D(Rigid2DTransform::new(
        0.0,
        Point2::new(0.0, 0.0),
        Vector2::new(11.0, 12.0),
    ))]);

    save_transform_group(&path, &group).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "Rigid2D 5; 0, 0, 0, 11, 12");

    let loaded = read_transform_group(&path).unwrap();
    assert_eq!(loaded, group);
    assert_eq!(loaded.get(0).unwrap().parameters(), vec![0.0, 0.0, 0.0, 11.0, 12.0]);
}

#[test]
fn test_lenient_load_keeps_prefix() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("partial.txt");
    fs::write(
        &path,
        "Translation2D 2; 1, 2\nRigid2D 5; 0.1, 5, 5, -1, 3\nRigid2D 5; 0, 0\nTranslation2D 2; 7, 8",
    )
    .unwrap();

    let loaded = load_transform_group(&path);
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.get(0).unwrap().type_name(), "Translation2D");
    assert_eq!(loaded.get(1).unwrap().parameters(), vec![0.1, 5.0, 5.0, -1.0, 3.0]);

    assert!(read_transform_group(&path).is_err());
}

#[test]
fn test_foreign_type_names_load_as_rigid() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("foreign.txt");
    fs::write(
        &path,
        "CenteredRigid2DTransform 5; 0, 0, 0, 11, 12
Euler2DTransform 5; 0.25, 1, 2, 3, 4",
    )
    .unwrap();

    let loaded = load_transform_group(&path);
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.get(0).unwrap().type_name(), "Rigid2D");
    assert_eq!(loaded.get(0).unwrap().parameters(), vec![0.0, 0.0, 0.0, 11.0, 12.0]);
    assert_eq!(loaded.get(1).unwrap().parameters(), vec![0.25, 1.0, 2.0, 3.0, 4.0]);
    assert_eq!(read_transform_group(&path).unwrap(), loaded);
}

#[test]
fn test_missing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.txt");
    assert!(load_transform_group(&path).is_empty());
    assert!(read_transform_group(&path).is_err());
}

#[test]
fn test_save_into_missing_directory_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("no-such-dir").join("t.txt");
    let group = TransformGroup::from_transforms(vec![Transform2D::identity()]);
    assert!(save_transform_group(&path, &group).is_err());
    assert!(!path.exists());
}

fn transform_strategy() -> impl Strategy<Value = Transform2D> {
    prop_oneof![
        (-3.1f64..3.1, -500.0f64..500.0, -500.0f64..500.0, -50.0f64..50.0, -50.0f64..50.0).prop_map(
            |(a, cx, cy, tx, ty)| Transform2D::Rigid2D(Rigid2DTransform::new(
                a,
                Point2::new(cx, cy),
                Vector2::new(tx, ty)
            ))
        ),
        (-50.0f64..50.0, -50.0f64..50.0)
            .prop_map(|(x, y)| {
                Transform2D::Translation2D(Translation2DTransform::new(Vector2::new(x, y)))
            }),
    ]
}

proptest! {
    #[test]
    fn saved_groups_read_back_exactly(transforms in prop::collection::vec(transform_strategy(), 0..8)) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("group.txt");
        let group = TransformGroup::from_transforms(transforms);

        save_transform_group(&path, &group).unwrap();
        let loaded = read_transform_group(&path).unwrap();
        prop_assert_eq!(loaded.len(), group.len());
        for (a, b) in loaded.iter().zip(group.iter()) {
            prop_assert_eq!(a.type_name(), b.type_name());
            prop_assert_eq!(a.parameters(), b.parameters());
        }
    }
}
