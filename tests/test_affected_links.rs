use cspace::link::*;
use cspace::*;
use std::rc::Rc;

fn load_sample(env: &Environment) -> Rc<Body> {
    env.add_body(Body::from_urdf_file("urdf/sample.urdf").unwrap())
}

fn create_cup(env: &Environment) -> Rc<Body> {
    let node = JointBuilder::new()
        .name("cup_root")
        .link(
            LinkBuilder::new()
                .name("cup")
                .add_collision(Collision::new(
                    "cup",
                    Isometry3::identity(),
                    Geometry::Cylinder {
                        radius: 0.03,
                        length: 0.1,
                    },
                ))
                .finalize(),
        )
        .into_node();
    env.add_body(Body::new("cup", Chain::from_root(node)))
}

fn indices(links: &[LinkRef]) -> Vec<usize> {
    links.iter().map(|link| link.index()).collect()
}

#[test]
fn test_does_affect_joints() {
    let env = Environment::new();
    let body = load_sample(&env);
    let links = body.links();

    let tilt = ActiveJointConfiguration::new(body.clone(), vec![1]).unwrap();
    let affected = links
        .iter()
        .map(|link| tilt.does_affect(link))
        .collect::<Vec<_>>();
    assert_eq!(affected, [false, false, true, true, false, false]);
    assert_eq!(indices(&tilt.affected_links()), vec![2, 3]);

    let wheel = ActiveJointConfiguration::new(body.clone(), vec![3]).unwrap();
    assert_eq!(indices(&wheel.affected_links()), vec![4]);

    let whole = BodyConfiguration::new(body.clone());
    assert_eq!(indices(&whole.affected_links()), vec![1, 2, 3, 4]);
    assert!(!whole.does_affect(&LinkRef::find(&body, "sensor_link").unwrap()));
}

#[test]
fn test_does_affect_affine() {
    let env = Environment::new();
    let body = load_sample(&env);
    let other = load_sample(&env);
    let translation = AffineOverlay::new(AffineDofs::TRANSLATION, Vector3::z_axis()).unwrap();

    let whole = BodyConfiguration::new(body.clone()).with_affine(translation.clone());
    assert!(body.links().iter().all(|link| whole.does_affect(link)));
    assert!(!other.links().iter().any(|link| whole.does_affect(link)));

    let only_affine = ActiveJointConfiguration::new(body.clone(), vec![])
        .unwrap()
        .with_affine(translation);
    assert_eq!(only_affine.dof(), 3);
    let affected = only_affine.affected_links_filtered(false);
    assert_eq!(affected.len(), 6);
    assert!(affected.iter().all(|a| a.dof_index == 0));
}

#[test]
fn test_affected_links_with_geometry() {
    let env = Environment::new();
    let body = load_sample(&env);

    let config = BodyConfiguration::new(body.clone());
    let affected = config.affected_links_filtered(true);
    let summary = affected
        .iter()
        .map(|a| (a.link.name(), a.jacobian_link_index, a.dof_index))
        .collect::<Vec<_>>();
    assert_eq!(
        summary,
        vec![
            ("pan_link".to_owned(), 1, 0),
            ("tilt_link".to_owned(), 2, 1),
            ("slide_link".to_owned(), 3, 2),
        ]
    );
    assert!(affected.iter().all(|a| a.link.has_geometry()));

    let config = ActiveJointConfiguration::new(body, vec![2, 0]).unwrap();
    let dof_indices = config
        .affected_links_filtered(true)
        .iter()
        .map(|a| a.dof_index)
        .collect::<Vec<_>>();
    // pan_link and tilt_link are moved by pan first, slide_link by slide
    assert_eq!(dof_indices, vec![1, 1, 0]);
}

#[test]
fn test_grabbed_body() {
    let env = Environment::new();
    let body = load_sample(&env);
    let cup = create_cup(&env);
    let slide_link = body.chain().link_index("slide_link").unwrap();
    cup.set_transform(body.link_transform(slide_link).unwrap());
    body.grab(&cup, slide_link).unwrap();
    let cup_link = LinkRef::new(&cup, 0).unwrap();

    let tilt = ActiveJointConfiguration::new(body.clone(), vec![1]).unwrap();
    assert!(tilt.does_affect(&cup_link));
    let bodies = tilt.bodies();
    assert_eq!(bodies.len(), 2);
    assert!(Rc::ptr_eq(&bodies[1], &cup));
    let affected = tilt.affected_links_filtered(true);
    let grabbed = affected.last().unwrap();
    assert_eq!(grabbed.link, cup_link);
    assert_eq!(grabbed.jacobian_link_index, slide_link);
    assert_eq!(grabbed.dof_index, 0);

    let wheel = ActiveJointConfiguration::new(body.clone(), vec![3]).unwrap();
    assert!(!wheel.does_affect(&cup_link));
    assert!(wheel
        .affected_links()
        .iter()
        .all(|link| !Rc::ptr_eq(link.body(), &cup)));

    // the cup follows the hand
    tilt.set_dof_values(&[0.5]).unwrap();
    let hand = body.link_transform(slide_link).unwrap();
    assert!((cup_link.world_transform().translation.vector - hand.translation.vector).norm() < 1e-10);

    assert!(body.release(&cup));
    assert!(!tilt.does_affect(&cup_link));
}
