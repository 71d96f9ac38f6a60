use approx::assert_relative_eq;
use cspace::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::rc::Rc;

fn load_sample(env: &Environment) -> Rc<Body> {
    env.add_body(Body::from_urdf_str(include_str!("../urdf/sample.urdf")).unwrap())
}

fn planar() -> AffineOverlay {
    AffineOverlay::new(AffineDofs::PLANAR, Vector3::z_axis()).unwrap()
}

fn transform_overlay() -> AffineOverlay {
    AffineOverlay::new(AffineDofs::TRANSFORM, Vector3::z_axis()).unwrap()
}

fn all_configurations(body: &Rc<Body>) -> Vec<Box<dyn Configuration>> {
    vec![
        Box::new(BodyConfiguration::new(body.clone())),
        Box::new(BodyConfiguration::new(body.clone()).with_affine(planar())),
        Box::new(ActiveJointConfiguration::new(body.clone(), vec![2, 0, 1]).unwrap()),
        Box::new(
            ActiveJointConfiguration::new(body.clone(), vec![1])
                .unwrap()
                .with_affine(transform_overlay()),
        ),
    ]
}

#[test]
fn test_dimensions_agree() {
    let env = Environment::new();
    let body = load_sample(&env);
    let dofs = all_configurations(&body)
        .iter()
        .map(|config| {
            let (lower, upper) = config.get_dof_limits();
            assert_eq!(config.get_dof_values().len(), config.dof());
            assert_eq!(lower.len(), config.dof());
            assert_eq!(upper.len(), config.dof());
            config.dof()
        })
        .collect::<Vec<_>>();
    assert_eq!(dofs, vec![4, 7, 3, 7]);
}

#[test]
fn test_round_trip() {
    let env = Environment::new();
    let body = load_sample(&env);

    let config = BodyConfiguration::new(body.clone()).with_affine(planar());
    // pan and slide are outside of their limits
    let values = vec![2.5, -0.3, 0.9, 4.0, 1.0, -2.0, 0.7];
    config.set_dof_values(&values).unwrap();
    let out = config.get_dof_values();
    assert_eq!(out[..6], values[..6]);
    assert_relative_eq!(out[6], values[6], epsilon = 1e-12);
    assert_eq!(body.chain().joint_positions(), vec![2.5, -0.3, 0.9, 4.0]);

    let config = ActiveJointConfiguration::new(body.clone(), vec![3])
        .unwrap()
        .with_affine(transform_overlay());
    let values = vec![-1.0, 0.1, 0.2, 0.3, 0.4, -0.5, 0.6];
    config.set_dof_values(&values).unwrap();
    let out = config.get_dof_values();
    assert_eq!(out[..4], values[..4]);
    for i in 4..7 {
        assert_relative_eq!(out[i], values[i], epsilon = 1e-12);
    }
}

#[test]
fn test_order_sensitivity() {
    let env = Environment::new();
    let body = load_sample(&env);
    let config = ActiveJointConfiguration::new(body.clone(), vec![2, 0, 1]).unwrap();
    assert_eq!(config.joint_indices(), &[2, 0, 1]);
    config.set_dof_values(&[0.3, 0.1, 0.2]).unwrap();
    assert_eq!(body.chain().joint_positions(), vec![0.1, 0.2, 0.3, 0.0]);
    let (lower, upper) = config.get_dof_limits();
    assert_eq!(lower, vec![0.0, -2.0, -1.5]);
    assert_eq!(upper, vec![0.5, 2.0, 1.5]);
}

#[test]
fn test_interleaved_configurations() {
    let env = Environment::new();
    let body = load_sample(&env);
    let arm = ActiveJointConfiguration::new(body.clone(), vec![0, 1, 2]).unwrap();
    let wheel = ActiveJointConfiguration::new(body.clone(), vec![3])
        .unwrap()
        .with_affine(planar());
    arm.set_dof_values(&[0.1, 0.2, 0.3]).unwrap();
    wheel.set_dof_values(&[1.0, 2.0, 3.0, 0.5]).unwrap();
    assert_eq!(arm.get_dof_values(), vec![0.1, 0.2, 0.3]);
    arm.set_dof_values(&[-0.1, -0.2, 0.4]).unwrap();
    let wheel_values = wheel.get_dof_values();
    assert_eq!(wheel_values[..3], [1.0, 2.0, 3.0]);
    assert_relative_eq!(wheel_values[3], 0.5, epsilon = 1e-12);
    assert_eq!(body.active_dofs().joint_indices(), &[3]);
    assert_eq!(body.chain().joint_positions(), vec![-0.1, -0.2, 0.4, 1.0]);
}

#[test]
fn test_size_mismatch_keeps_state() {
    let env = Environment::new();
    let body = load_sample(&env);
    body.set_transform(Isometry3::translation(0.0, 0.0, 1.0));
    for config in all_configurations(&body) {
        let before = config.get_dof_values();
        let mut values = before.clone();
        values.push(0.1);
        match config.set_dof_values(&values) {
            Err(Error::SizeMismatchError { input, required }) => {
                assert_eq!(input, config.dof() + 1);
                assert_eq!(required, config.dof());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(config.get_dof_values(), before);
    }
}

fn failing_update(config: &dyn Configuration) -> Result<(), Error> {
    let _saver = config.save();
    let values = vec![0.4; config.dof()];
    config.set_dof_values(&values)?;
    config.set_dof_values(&[])?;
    Ok(())
}

#[test]
fn test_save_restore() {
    let env = Environment::new();
    let body = load_sample(&env);
    let start = Isometry3::translation(0.5, -0.5, 0.0);
    body.set_transform(start);
    body.chain().set_joint_positions(&[0.1, 0.2, 0.3, 0.4]).unwrap();
    for config in all_configurations(&body) {
        let before = config.get_dof_values();
        assert!(failing_update(config.as_ref()).is_err());
        let after = config.get_dof_values();
        for (a, b) in before.iter().zip(after.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
        assert_eq!(body.chain().joint_positions(), vec![0.1, 0.2, 0.3, 0.4]);
    }
    assert_relative_eq!(body.transform(), start, epsilon = 1e-12);
}

#[test]
fn test_saver_scope() {
    let env = Environment::new();
    let body = load_sample(&env);
    let native = BodyConfiguration::new(body.clone()).with_affine(
        AffineOverlay::new(AffineDofs::X, Vector3::z_axis()).unwrap(),
    );
    body.set_transform(Isometry3::translation(0.0, 1.0, 2.0));
    {
        let saver = native.save();
        assert_eq!(saver.scope(), SaverScope::BodyState);
        // y and z are not DOFs of the configuration, but restored anyway
        body.set_transform(Isometry3::translation(3.0, 3.0, 3.0));
    }
    assert_eq!(body.transform(), Isometry3::translation(0.0, 1.0, 2.0));

    // the generic saver covers only the DOF vector
    {
        let saver = GenericSaver::new(&native);
        assert_eq!(saver.scope(), SaverScope::DofValues);
        body.set_transform(Isometry3::translation(3.0, 3.0, 3.0));
    }
    assert_eq!(body.transform(), Isometry3::translation(0.0, 3.0, 3.0));
}

#[test]
fn test_random_dof_values() {
    let env = Environment::new();
    let body = load_sample(&env);
    let config = ActiveJointConfiguration::new(body, vec![0, 2, 3])
        .unwrap()
        .with_affine(planar());
    let (lower, upper) = config.get_dof_limits();
    assert_eq!(upper[2], f64::INFINITY);
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for _ in 0..200 {
        let values = config.random_dof_values_with(&mut rng);
        assert_eq!(values.len(), config.dof());
        for ((v, lo), hi) in values.iter().zip(lower.iter()).zip(upper.iter()) {
            assert!(v.is_finite());
            assert!(lo <= v && v <= hi);
            assert!(v.abs() <= 2.0 * std::f64::consts::PI);
        }
    }
    let values = config.random_dof_values().unwrap();
    assert_eq!(values.len(), 6);
}

#[test]
fn test_random_rotation_round_trip() {
    let env = Environment::new();
    let body = load_sample(&env);
    let configs = [
        ActiveJointConfiguration::new(body.clone(), vec![3])
            .unwrap()
            .with_affine(planar()),
        ActiveJointConfiguration::new(body.clone(), vec![0])
            .unwrap()
            .with_affine(transform_overlay()),
    ];
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    for config in &configs {
        let (lower, upper) = config.get_dof_limits();
        for _ in 0..100 {
            let values = config.random_dof_values_with(&mut rng);
            config.set_dof_values(&values).unwrap();
            let out = config.get_dof_values();
            for (((v, o), lo), hi) in values.iter().zip(out.iter()).zip(&lower).zip(&upper) {
                assert_relative_eq!(*v, *o, epsilon = 1e-9);
                assert!(lo <= o && o <= hi);
            }
        }
    }
}

#[test]
fn test_unsupported_operations() {
    let env = Environment::new();
    let body = load_sample(&env);
    let config = BodyConfiguration::new(body);
    assert!(matches!(
        config.rotation_jacobian(1, &Vector3::z()),
        Err(Error::UnsupportedOperationError {
            operation: "rotation_jacobian",
            ..
        })
    ));
    assert!(matches!(
        config.random_dof_values(),
        Err(Error::UnsupportedOperationError {
            operation: "random_dof_values",
            configuration: "BodyConfiguration",
        })
    ));
}

#[test]
fn test_env_and_bodies() {
    let env = Environment::new();
    let body = load_sample(&env);
    let config = ActiveJointConfiguration::new(body.clone(), vec![0]).unwrap();
    assert!(config.env().unwrap().ptr_eq(&env));
    assert_eq!(config.affine_dofs(), AffineDofs::empty());
    let bodies = config.bodies();
    assert_eq!(bodies.len(), 1);
    assert!(Rc::ptr_eq(&bodies[0], &body));

    let orphan = Rc::new(Body::from_urdf_str(include_str!("../urdf/sample.urdf")).unwrap());
    let config = BodyConfiguration::new(orphan);
    assert!(matches!(
        config.env(),
        Err(Error::EnvironmentDroppedError { .. })
    ));
}
