use approx::assert_relative_eq;

#[test]
fn test_tree() {
    let tree = cspace::Chain::<f64>::from(
        &urdf_rs::read_from_string(include_str!("../urdf/sample.urdf")).unwrap(),
    );
    assert_eq!(tree.dof(), 4);
    let all_names = tree
        .iter()
        .map(|node| node.joint().name.clone())
        .collect::<Vec<_>>();
    assert_eq!(
        all_names,
        ["root", "pan", "tilt", "slide", "wheel", "sensor_mount"]
    );

    let names = tree
        .iter_joints()
        .map(|j| j.name.clone())
        .collect::<Vec<_>>();
    assert_eq!(names, ["pan", "tilt", "slide", "wheel"]);
    assert_eq!(tree.joint_link_index(2), Some(3));
    assert_eq!(tree.link_index("wheel_link"), Some(4));
    assert!(tree.is_ancestor_or_self(1, 3));
    assert!(!tree.is_ancestor_or_self(4, 3));
}

#[test]
fn test_set_joint_positions() {
    let tree = cspace::Chain::<f64>::from(
        &urdf_rs::read_from_string(include_str!("../urdf/sample.urdf")).unwrap(),
    );
    // out of the limit of "slide"
    assert!(tree.set_joint_positions(&[0.0, 0.0, 0.8, 0.0]).is_err());
    assert!(tree.set_joint_positions(&[0.0, 0.0]).is_err());

    tree.set_joint_positions(&[std::f64::consts::FRAC_PI_2, 0.0, 0.5, 1.0])
        .unwrap();
    let transforms = tree.update_transforms();
    // pan turns the slide towards +y
    let slide = transforms[3].translation.vector;
    assert_relative_eq!(slide.x, 0.0, epsilon = 1e-10);
    assert_relative_eq!(slide.y, 1.0, epsilon = 1e-10);
    assert_relative_eq!(slide.z, 0.5, epsilon = 1e-10);

    tree.set_joint_positions_unchecked(&[0.0, 0.0, 3.0, 0.0]);
    assert_eq!(tree.joint_positions(), vec![0.0, 0.0, 3.0, 0.0]);
}

#[test]
fn test_body_from_urdf_str() {
    let body = cspace::Body::from_urdf_str(include_str!("../urdf/sample.urdf")).unwrap();
    assert_eq!(body.name(), "sample");
    assert_eq!(body.num_links(), 6);
    assert!(matches!(
        cspace::Body::from_urdf_str("<robot"),
        Err(cspace::Error::UrdfError(_))
    ));
}
