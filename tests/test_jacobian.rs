use approx::assert_relative_eq;
use cspace::*;
use std::rc::Rc;

const EPS: f64 = 1e-6;

fn load_sample(env: &Environment) -> Rc<Body> {
    let body = env.add_body(Body::from_urdf_file("urdf/sample.urdf").unwrap());
    body.set_transform(Isometry3::from_parts(
        Translation3::new(0.3, -0.2, 0.1),
        UnitQuaternion::from_euler_angles(0.2, -0.1, 0.4),
    ));
    body
}

/// central difference of the world position of a point fixed on the link
fn numerical_position_jacobian(
    config: &dyn Configuration,
    body: &Body,
    link_index: usize,
    local: &Point3<f64>,
) -> DMatrix<f64> {
    let values = config.get_dof_values();
    let mut jacobian = DMatrix::zeros(config.dof(), 3);
    for i in 0..config.dof() {
        let mut diff = Vector3::zeros();
        for (sign, eps) in [(1.0, EPS), (-1.0, -EPS)] {
            let mut moved = values.clone();
            moved[i] += eps;
            config.set_dof_values(&moved).unwrap();
            diff += (body.link_transform(link_index).unwrap() * local).coords * sign;
        }
        for c in 0..3 {
            jacobian[(i, c)] = diff[c] / (2.0 * EPS);
        }
    }
    config.set_dof_values(&values).unwrap();
    jacobian
}

/// central difference of the link orientation as an angular velocity
fn numerical_rotation_jacobian(
    config: &dyn Configuration,
    body: &Body,
    link_index: usize,
) -> DMatrix<f64> {
    let values = config.get_dof_values();
    let mut jacobian = DMatrix::zeros(config.dof(), 3);
    for i in 0..config.dof() {
        let mut plus = values.clone();
        plus[i] += EPS;
        config.set_dof_values(&plus).unwrap();
        let r_plus = body.link_transform(link_index).unwrap().rotation;
        let mut minus = values.clone();
        minus[i] -= EPS;
        config.set_dof_values(&minus).unwrap();
        let r_minus = body.link_transform(link_index).unwrap().rotation;
        // small rotation: q ~ (1, w dt / 2)
        let dq = r_plus * r_minus.inverse();
        let omega = dq.imag() * dq.w.signum() / EPS;
        for c in 0..3 {
            jacobian[(i, c)] = omega[c];
        }
    }
    config.set_dof_values(&values).unwrap();
    jacobian
}

#[test]
fn test_active_joint_jacobians() {
    let env = Environment::new();
    let body = load_sample(&env);
    let config = ActiveJointConfiguration::new(body.clone(), vec![2, 0, 1, 3])
        .unwrap()
        .with_affine(AffineOverlay::new(AffineDofs::TRANSFORM, Vector3::z_axis()).unwrap());
    config
        .set_dof_values(&[0.2, 0.7, -0.4, 1.0, 0.3, 0.1, -0.2, 0.5, -0.3, 0.8])
        .unwrap();
    let local = Point3::new(0.05, -0.02, 0.1);
    for link_index in 0..body.num_links() {
        let point = body.link_transform(link_index).unwrap() * local;
        let analytic = config.position_jacobian(link_index, &point).unwrap();
        let numerical = numerical_position_jacobian(&config, &body, link_index, &local);
        assert_eq!(analytic.shape(), (10, 3));
        assert_relative_eq!(analytic, numerical, epsilon = 1e-6);

        let analytic = config.rotation_jacobian(link_index, &Vector3::x()).unwrap();
        let numerical = numerical_rotation_jacobian(&config, &body, link_index);
        assert_relative_eq!(analytic, numerical, epsilon = 1e-6);
    }
}

#[test]
fn test_rotation_jacobian_ignores_axis() {
    let env = Environment::new();
    let body = load_sample(&env);
    let config = ActiveJointConfiguration::new(body, vec![0, 1])
        .unwrap()
        .with_affine(AffineOverlay::new(AffineDofs::PLANAR, Vector3::y_axis()).unwrap());
    config.set_dof_values(&[0.3, 0.4, 1.0, 2.0, 0.5]).unwrap();
    let jx = config.rotation_jacobian(2, &Vector3::x()).unwrap();
    let jz = config.rotation_jacobian(2, &Vector3::z()).unwrap();
    assert_eq!(jx, jz);
    // planar rotation row is the world axis
    assert_eq!((jx[(4, 0)], jx[(4, 1)], jx[(4, 2)]), (0.0, 1.0, 0.0));
    // translation rows do not rotate
    assert_eq!(jx.row(2).norm(), 0.0);
    assert_eq!(jx.row(3).norm(), 0.0);
}

#[test]
fn test_body_configuration_jacobian() {
    let env = Environment::new();
    let body = load_sample(&env);
    let config = BodyConfiguration::new(body.clone())
        .with_affine(AffineOverlay::new(AffineDofs::PLANAR, Vector3::z_axis()).unwrap());
    config
        .set_dof_values(&[0.4, -0.3, 0.25, 0.0, 0.5, 0.5, 1.2])
        .unwrap();
    let local = Point3::new(0.0, 0.1, 0.0);
    let slide_link = body.chain().link_index("slide_link").unwrap();
    let point = body.link_transform(slide_link).unwrap() * local;
    let analytic = config.position_jacobian(slide_link, &point).unwrap();
    let numerical = numerical_position_jacobian(&config, &body, slide_link, &local);
    assert_eq!(analytic.shape(), (7, 3));
    assert_relative_eq!(analytic, numerical, epsilon = 1e-6);
    // wheel does not move the slide
    assert_eq!(analytic.row(3).norm(), 0.0);
}

#[test]
fn test_invalid_link_index() {
    let env = Environment::new();
    let body = load_sample(&env);
    let config = ActiveJointConfiguration::new(body, vec![0]).unwrap();
    assert!(matches!(
        config.position_jacobian(6, &Point3::origin()),
        Err(Error::LinkIndexError {
            index: 6,
            num_links: 6,
            ..
        })
    ));
}
