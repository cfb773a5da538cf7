use cgmath::{EuclideanSpace, Matrix4, Point3, Vector3, Vector4, assert_abs_diff_eq};

use reflect_ngin::{
    config::{CameraConfig, LightingConfig},
    cube_map::{CubeFace, build_cube_face_cameras},
    data_structures::uniform::Lighting,
    scene::{OBJECT_COUNT, PASS_COUNT, Pass, SceneObject, main_camera, object_uniform, uniform_slot},
};

fn lighting() -> Lighting {
    Lighting::from(&LightingConfig::default())
}

#[test]
fn bridge_is_scaled_down_and_moved_beside_the_sphere() {
    let camera = main_camera(&CameraConfig::default(), 16.0 / 9.0);
    let uniform = object_uniform(SceneObject::Bridge, camera.camera(), &lighting(), 0.0);
    assert_abs_diff_eq!(uniform.world[0][0], 0.05, epsilon = 1e-6);
    assert_abs_diff_eq!(uniform.world[1][1], 0.05, epsilon = 1e-6);
    assert_eq!(uniform.world[3], [4.5, -1.2, 4.0, 1.0]);
}

#[test]
fn sphere_spins_about_x_with_game_time() {
    let camera = main_camera(&CameraConfig::default(), 1.0);
    let t = std::f32::consts::FRAC_PI_2;
    let uniform = object_uniform(SceneObject::Sphere, camera.camera(), &lighting(), t);
    let world = Matrix4::from(uniform.world);
    let up = world * Vector4::new(0.0, 1.0, 0.0, 0.0);
    assert_abs_diff_eq!(up, Vector4::new(0.0, 0.0, 1.0, 0.0), epsilon = 1e-5);
    assert_eq!(uniform.timer, t);
}

#[test]
fn uniform_carries_the_eye_and_lighting_of_the_pass() {
    let config = CameraConfig::default();
    let camera = main_camera(&config, 4.0 / 3.0);
    let uniform = object_uniform(SceneObject::Skybox, camera.camera(), &lighting(), 1.5);
    let eye = camera.camera().pos();
    assert_abs_diff_eq!(uniform.eye_pos[0], eye.x, epsilon = 1e-4);
    assert_abs_diff_eq!(uniform.eye_pos[1], eye.y, epsilon = 1e-4);
    assert_abs_diff_eq!(uniform.eye_pos[2], eye.z, epsilon = 1e-4);
    assert_eq!(uniform.eye_pos[3], 1.0);
    assert_eq!(uniform.light_vec, LightingConfig::default().light_vec);

    let expected = camera.camera().view_proj() * Matrix4::from_scale(100.0);
    assert_abs_diff_eq!(Matrix4::from(uniform.world_view_proj), expected, epsilon = 1e-3);
}

#[test]
fn main_camera_uses_the_configured_lens() {
    let config = CameraConfig::default();
    let camera = main_camera(&config, 2.0);
    let lens = camera.camera().lens().unwrap();
    assert_eq!(lens.fov_y.0, config.fov_y);
    assert_eq!(lens.aspect, 2.0);
    assert_eq!(lens.near, config.near);
    assert_eq!(lens.far, config.far);
    assert_abs_diff_eq!(camera.target(), Point3::from(config.target), epsilon = 1e-6);
}

#[test]
fn face_cameras_see_straight_ahead_and_not_behind() {
    let centre = Point3::from_vec(SceneObject::Sphere.instance(0.0).position);
    let cameras = build_cube_face_cameras(centre, 0.1, 1000.0);
    for (face, camera) in CubeFace::ALL.iter().zip(&cameras) {
        let ahead = (centre + face.direction() * 10.0).to_homogeneous();
        let clip = camera.view_proj() * ahead;
        assert!(clip.w > 0.0, "{face:?}");
        assert_abs_diff_eq!(clip.x / clip.w, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(clip.y / clip.w, 0.0, epsilon = 1e-5);
        let depth = clip.z / clip.w;
        assert!(depth > 0.0 && depth < 1.0, "{face:?} depth {depth}");

        let behind = (centre - face.direction() * 10.0).to_homogeneous();
        assert!((camera.view_proj() * behind).w < 0.0, "{face:?}");
    }
}

#[test]
fn face_camera_edges_are_forty_five_degrees_off_axis() {
    let cameras = build_cube_face_cameras(Point3::new(0.0, 0.0, 0.0), 0.1, 1000.0);
    let camera = &cameras[CubeFace::PositiveZ.layer() as usize];
    // A point at 45 degrees to the right lands on the right edge of the face.
    let edge = camera.view_proj() * Vector4::new(5.0, 0.0, 5.0, 1.0);
    assert_abs_diff_eq!(edge.x / edge.w, 1.0, epsilon = 1e-4);
    assert_abs_diff_eq!(camera.right(), Vector3::unit_x(), epsilon = 1e-6);
}

#[test]
fn slots_follow_pass_order() {
    assert_eq!(uniform_slot(Pass::Face(CubeFace::PositiveX), SceneObject::Bridge), 0);
    assert_eq!(uniform_slot(Pass::Face(CubeFace::NegativeZ), SceneObject::Skybox), 16);
    assert_eq!(
        uniform_slot(Pass::Main, SceneObject::Sphere),
        PASS_COUNT * OBJECT_COUNT - 1
    );
}
