//! Cameras and projection math.
//!
//! The renderer works in a left-handed world (+Y up, +Z into the screen) with a
//! zero-to-one depth range, which is also the orientation wgpu expects when it
//! samples cube maps. Everything here is plain `cgmath` and has no GPU dependency.
//!
//! - [`Camera`] holds a position and an orthonormal look/up basis, derives a view
//!   matrix and keeps a separately cached projection matrix
//! - [`LookAtCamera`] orbits a target and drives a [`Camera`] from mouse input

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3};

/// Builds a left-handed perspective projection that maps `near` to depth 0 and
/// `far` to depth 1.
pub fn perspective_fov_lh(fov_y: Rad<f32>, aspect: f32, near: f32, far: f32) -> Matrix4<f32> {
    let y_scale = 1.0 / (fov_y.0 * 0.5).tan();
    let x_scale = y_scale / aspect;
    let range = far / (far - near);

    #[rustfmt::skip]
    let proj = Matrix4::new(
        x_scale, 0.0,     0.0,           0.0,
        0.0,     y_scale, 0.0,           0.0,
        0.0,     0.0,     range,         1.0,
        0.0,     0.0,     -near * range, 0.0,
    );
    proj
}

/// Lens parameters remembered by [`Camera::set_lens`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lens {
    pub fov_y: Rad<f32>,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub near_window_height: f32,
    pub far_window_height: f32,
}

/// A camera described by its position and a unit look direction plus up vector.
///
/// The projection is not derived from the camera state. It is cached and only
/// changes through [`set_proj_matrix`](Self::set_proj_matrix) or
/// [`set_lens`](Self::set_lens), so a viewport rebuild can swap it independently.
#[derive(Clone, Debug)]
pub struct Camera {
    pos: Point3<f32>,
    look: Vector3<f32>,
    up: Vector3<f32>,
    proj: Matrix4<f32>,
    lens: Option<Lens>,
}

impl Camera {
    pub fn new(pos: Point3<f32>, look: Vector3<f32>, up: Vector3<f32>) -> Self {
        let mut camera = Self {
            pos,
            look: Vector3::unit_z(),
            up: Vector3::unit_y(),
            proj: cgmath::SquareMatrix::identity(),
            lens: None,
        };
        camera.look_at(pos, pos + look, up);
        camera
    }

    /// Points the camera from `pos` at `target`.
    ///
    /// forward = normalize(target - pos), right = normalize(world_up x forward),
    /// up = forward x right. `world_up` must not be parallel to the view direction.
    pub fn look_at(&mut self, pos: Point3<f32>, target: Point3<f32>, world_up: Vector3<f32>) {
        let look = (target - pos).normalize();
        let right = world_up.cross(look).normalize();
        let up = look.cross(right);

        self.pos = pos;
        self.look = look;
        self.up = up;
    }

    /// Caches the lens and stores the matching projection matrix.
    pub fn set_lens(&mut self, fov_y: Rad<f32>, aspect: f32, near: f32, far: f32) {
        let half_tan = (0.5 * fov_y.0).tan();
        self.lens = Some(Lens {
            fov_y,
            aspect,
            near,
            far,
            near_window_height: 2.0 * near * half_tan,
            far_window_height: 2.0 * far * half_tan,
        });
        self.proj = perspective_fov_lh(fov_y, aspect, near, far);
    }

    pub fn set_proj_matrix(&mut self, proj: Matrix4<f32>) {
        self.proj = proj;
    }

    pub fn proj_matrix(&self) -> Matrix4<f32> {
        self.proj
    }

    pub fn lens(&self) -> Option<&Lens> {
        self.lens.as_ref()
    }

    pub fn pos(&self) -> Point3<f32> {
        self.pos
    }

    pub fn set_pos(&mut self, pos: Point3<f32>) {
        self.pos = pos;
    }

    pub fn look(&self) -> Vector3<f32> {
        self.look
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn right(&self) -> Vector3<f32> {
        self.up.cross(self.look)
    }

    /// Left-handed view matrix built straight from the camera basis.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        // Re-orthonormalise so accumulated drift never skews the view.
        let look = self.look.normalize();
        let up = look.cross(self.right()).normalize();
        let right = up.cross(look);
        let p = Vector3::new(self.pos.x, self.pos.y, self.pos.z);

        #[rustfmt::skip]
        let view = Matrix4::new(
            right.x,       up.x,       look.x,       0.0,
            right.y,       up.y,       look.y,       0.0,
            right.z,       up.z,       look.z,       0.0,
            -p.dot(right), -p.dot(up), -p.dot(look), 1.0,
        );
        view
    }

    pub fn view_proj(&self) -> Matrix4<f32> {
        self.proj * self.view_matrix()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Point3::new(0.0, 0.0, -10.0), Vector3::unit_z(), Vector3::unit_y())
    }
}

/// Orbit camera that keeps looking at a fixed target.
///
/// Position is kept in spherical coordinates around the target: `distance`,
/// `azimuth` (rotation about +Y) and `elevation` (angle above the XZ plane).
#[derive(Clone, Debug)]
pub struct LookAtCamera {
    target: Point3<f32>,
    distance: f32,
    azimuth: f32,
    elevation: f32,
    min_distance: f32,
    camera: Camera,
}

impl LookAtCamera {
    /// Elevation stays this far away from the poles so the up vector stays valid.
    const POLE_MARGIN: f32 = 0.01;

    pub fn new(pos: Point3<f32>, target: Point3<f32>) -> Self {
        let offset = pos - target;
        let distance = offset.magnitude().max(f32::EPSILON);
        let elevation = (offset.y / distance).clamp(-1.0, 1.0).asin();
        let azimuth = offset.z.atan2(offset.x);

        let mut orbit = Self {
            target,
            distance,
            azimuth,
            elevation,
            min_distance: 0.5,
            camera: Camera::default(),
        };
        orbit.elevation = orbit.clamp_elevation(elevation);
        orbit.sync();
        orbit
    }

    pub fn with_min_distance(mut self, min_distance: f32) -> Self {
        self.min_distance = min_distance;
        self.distance = self.distance.max(min_distance);
        self.sync();
        self
    }

    pub fn rotate_elevation(&mut self, angle: f32) {
        self.elevation = self.clamp_elevation(self.elevation + angle);
        self.sync();
    }

    pub fn rotate_on_y_axis(&mut self, angle: f32) {
        self.azimuth += angle;
        self.sync();
    }

    /// Multiplies the distance to the target by `factor`.
    pub fn zoom(&mut self, factor: f32) {
        if factor <= 0.0 {
            log::warn!("ignoring non-positive zoom factor {}", factor);
            return;
        }
        self.distance = (self.distance * factor).max(self.min_distance);
        self.sync();
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn target(&self) -> Point3<f32> {
        self.target
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    fn clamp_elevation(&self, elevation: f32) -> f32 {
        let limit = std::f32::consts::FRAC_PI_2 - Self::POLE_MARGIN;
        elevation.clamp(-limit, limit)
    }

    fn sync(&mut self) {
        let (sin_e, cos_e) = self.elevation.sin_cos();
        let (sin_a, cos_a) = self.azimuth.sin_cos();
        let offset = Vector3::new(cos_e * cos_a, sin_e, cos_e * sin_a) * self.distance;
        self.camera
            .look_at(self.target + offset, self.target, Vector3::unit_y());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Vector4, assert_abs_diff_eq};

    #[test]
    fn look_at_builds_orthonormal_basis() {
        let mut camera = Camera::default();
        camera.look_at(
            Point3::new(3.0, 4.0, -5.0),
            Point3::new(0.0, 0.0, 0.0),
            Vector3::unit_y(),
        );
        let (l, u, r) = (camera.look(), camera.up(), camera.right());
        assert_abs_diff_eq!(l.magnitude(), 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(u.magnitude(), 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(r.magnitude(), 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(l.dot(u), 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(l.dot(r), 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(u.dot(r), 0.0, epsilon = 1e-5);
        assert!(u.y > 0.0);
    }

    #[test]
    fn view_matrix_moves_eye_to_origin_and_look_to_plus_z() {
        let pos = Point3::new(25.0, 2.0, -14.5);
        let mut camera = Camera::default();
        camera.look_at(pos, Point3::new(0.0, 0.0, 0.0), Vector3::unit_y());
        let view = camera.view_matrix();

        let eye = view * Vector4::new(pos.x, pos.y, pos.z, 1.0);
        assert_abs_diff_eq!(eye, Vector4::new(0.0, 0.0, 0.0, 1.0), epsilon = 1e-4);

        let l = camera.look();
        let forward = view * l.extend(0.0);
        assert_abs_diff_eq!(forward, Vector4::new(0.0, 0.0, 1.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn perspective_maps_near_and_far_to_unit_depth() {
        let proj = perspective_fov_lh(Rad(std::f32::consts::FRAC_PI_2), 1.0, 0.1, 1000.0);
        let near = proj * Vector4::new(0.0, 0.0, 0.1, 1.0);
        let far = proj * Vector4::new(0.0, 0.0, 1000.0, 1.0);
        assert_abs_diff_eq!(near.z / near.w, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(far.z / far.w, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn set_lens_caches_window_heights() {
        let mut camera = Camera::default();
        camera.set_lens(Rad(std::f32::consts::FRAC_PI_2), 1.0, 0.1, 1000.0);
        let lens = camera.lens().copied().expect("lens is cached");
        assert_abs_diff_eq!(lens.near_window_height, 0.2, epsilon = 1e-5);
        assert_abs_diff_eq!(lens.far_window_height, 2000.0, epsilon = 1e-2);
    }

    #[test]
    fn orbit_keeps_distance_and_target() {
        let mut orbit = LookAtCamera::new(Point3::new(25.0, 2.0, -14.5), Point3::new(0.0, 0.0, 0.0));
        let start = orbit.distance();
        orbit.rotate_on_y_axis(0.7);
        orbit.rotate_elevation(0.3);
        let camera = orbit.camera();
        let to_target = Point3::new(0.0, 0.0, 0.0) - camera.pos();
        assert_abs_diff_eq!(to_target.magnitude(), start, epsilon = 1e-3);
        assert_abs_diff_eq!(to_target.normalize(), camera.look(), epsilon = 1e-4);
    }

    #[test]
    fn orbit_elevation_never_reaches_the_pole() {
        let mut orbit = LookAtCamera::new(Point3::new(0.0, 0.0, -10.0), Point3::new(0.0, 0.0, 0.0));
        orbit.rotate_elevation(10.0);
        let look = orbit.camera().look();
        assert!(look.y > -1.0);
        assert!(orbit.camera().up().magnitude() > 0.99);
    }

    #[test]
    fn zoom_scales_distance_and_respects_minimum() {
        let mut orbit = LookAtCamera::new(Point3::new(0.0, 0.0, -10.0), Point3::new(0.0, 0.0, 0.0))
            .with_min_distance(2.0);
        orbit.zoom(1.2);
        assert_abs_diff_eq!(orbit.distance(), 12.0, epsilon = 1e-4);
        orbit.zoom(0.01);
        assert_abs_diff_eq!(orbit.distance(), 2.0, epsilon = 1e-6);
        orbit.zoom(-1.0);
        assert_abs_diff_eq!(orbit.distance(), 2.0, epsilon = 1e-6);
    }
}
