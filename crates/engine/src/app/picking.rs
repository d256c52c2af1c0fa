use super::input::{PickTarget, Vec2, Vec3};
use crate::world::FortressId;

pub const DEFAULT_FORTRESS_PICK_RADIUS_PX: f32 = 12.0;
pub const DEFAULT_PATH_PICK_THRESHOLD_PX: f32 = 4.0;

/// Scene query used by the order controller. Implementations answer for the
/// current frame; callers re-pick on every pointer event.
pub trait ScenePicker {
    fn pick(&self, pointer_px: Vec2) -> PickTarget;

    fn world_point(&self, _pointer_px: Vec2) -> Option<Vec3> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedFortress {
    pub id: FortressId,
    pub screen_px: Vec2,
    pub world: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPath {
    pub source: FortressId,
    pub target: FortressId,
    pub from_px: Vec2,
    pub to_px: Vec2,
}

/// Screen-space picker over markers a renderer has already projected.
///
/// Fortresses win over paths. Among fortresses the closest marker inside the
/// radius wins, ties going to the lower id.
#[derive(Debug, Clone)]
pub struct ProjectedScenePicker {
    fortresses: Vec<ProjectedFortress>,
    paths: Vec<ProjectedPath>,
    fortress_radius_px: f32,
    path_threshold_px: f32,
}

impl Default for ProjectedScenePicker {
    fn default() -> Self {
        Self::new(
            DEFAULT_FORTRESS_PICK_RADIUS_PX,
            DEFAULT_PATH_PICK_THRESHOLD_PX,
        )
    }
}

impl ProjectedScenePicker {
    pub fn new(fortress_radius_px: f32, path_threshold_px: f32) -> Self {
        Self {
            fortresses: Vec::new(),
            paths: Vec::new(),
            fortress_radius_px,
            path_threshold_px,
        }
    }

    pub fn set_fortresses(&mut self, fortresses: Vec<ProjectedFortress>) {
        self.fortresses = fortresses;
    }

    pub fn push_fortress(&mut self, fortress: ProjectedFortress) {
        self.fortresses.push(fortress);
    }

    pub fn push_path(&mut self, path: ProjectedPath) {
        self.paths.push(path);
    }

    fn nearest_fortress(&self, pointer_px: Vec2) -> Option<&ProjectedFortress> {
        let mut best: Option<(f32, &ProjectedFortress)> = None;
        for marker in &self.fortresses {
            let distance = marker.screen_px.distance(pointer_px);
            if distance > self.fortress_radius_px {
                continue;
            }
            match best {
                Some((best_distance, best_marker))
                    if best_distance < distance
                        || (best_distance == distance && best_marker.id <= marker.id) => {}
                _ => best = Some((distance, marker)),
            }
        }
        best.map(|(_, marker)| marker)
    }

    fn nearest_path(&self, pointer_px: Vec2) -> Option<&ProjectedPath> {
        self.paths
            .iter()
            .map(|path| (distance_to_segment(pointer_px, path.from_px, path.to_px), path))
            .filter(|(distance, _)| *distance <= self.path_threshold_px)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, path)| path)
    }
}

impl ScenePicker for ProjectedScenePicker {
    fn pick(&self, pointer_px: Vec2) -> PickTarget {
        if let Some(marker) = self.nearest_fortress(pointer_px) {
            return PickTarget::Fortress(marker.id);
        }
        if let Some(path) = self.nearest_path(pointer_px) {
            return PickTarget::Path {
                source: path.source,
                target: path.target,
            };
        }
        PickTarget::None
    }

    fn world_point(&self, pointer_px: Vec2) -> Option<Vec3> {
        self.nearest_fortress(pointer_px).map(|marker| marker.world)
    }
}

fn distance_to_segment(point: Vec2, from: Vec2, to: Vec2) -> f32 {
    let seg_x = to.x - from.x;
    let seg_y = to.y - from.y;
    let length_sq = seg_x * seg_x + seg_y * seg_y;
    if length_sq <= f32::EPSILON {
        return point.distance(from);
    }
    let t = (((point.x - from.x) * seg_x + (point.y - from.y) * seg_y) / length_sq).clamp(0.0, 1.0);
    point.distance(Vec2::new(from.x + t * seg_x, from.y + t * seg_y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(id: u32, x: f32, y: f32) -> ProjectedFortress {
        ProjectedFortress {
            id: FortressId(id),
            screen_px: Vec2::new(x, y),
            world: Vec3::new(x / 100.0, y / 100.0, 1.0),
        }
    }

    #[test]
    fn pick_returns_none_for_empty_space() {
        let mut picker = ProjectedScenePicker::default();
        picker.push_fortress(marker(1, 100.0, 100.0));
        assert_eq!(picker.pick(Vec2::new(300.0, 300.0)), PickTarget::None);
        assert_eq!(picker.world_point(Vec2::new(300.0, 300.0)), None);
    }

    #[test]
    fn pick_prefers_closest_fortress() {
        let mut picker = ProjectedScenePicker::default();
        picker.set_fortresses(vec![marker(1, 100.0, 100.0), marker(2, 108.0, 100.0)]);
        assert_eq!(
            picker.pick(Vec2::new(106.0, 100.0)),
            PickTarget::Fortress(FortressId(2))
        );
        assert_eq!(
            picker.world_point(Vec2::new(101.0, 100.0)),
            Some(Vec3::new(1.0, 1.0, 1.0))
        );
    }

    #[test]
    fn equal_distance_tie_goes_to_lower_id() {
        let mut picker = ProjectedScenePicker::default();
        picker.set_fortresses(vec![marker(7, 110.0, 100.0), marker(3, 90.0, 100.0)]);
        assert_eq!(
            picker.pick(Vec2::new(100.0, 100.0)),
            PickTarget::Fortress(FortressId(3))
        );
    }

    #[test]
    fn fortress_wins_over_path_under_pointer() {
        let mut picker = ProjectedScenePicker::default();
        picker.push_fortress(marker(1, 100.0, 100.0));
        picker.push_path(ProjectedPath {
            source: FortressId(1),
            target: FortressId(2),
            from_px: Vec2::new(100.0, 100.0),
            to_px: Vec2::new(200.0, 100.0),
        });

        assert_eq!(
            picker.pick(Vec2::new(104.0, 101.0)),
            PickTarget::Fortress(FortressId(1))
        );
        assert_eq!(
            picker.pick(Vec2::new(150.0, 102.0)),
            PickTarget::Path {
                source: FortressId(1),
                target: FortressId(2)
            }
        );
        assert_eq!(picker.pick(Vec2::new(150.0, 110.0)), PickTarget::None);
    }

    #[test]
    fn degenerate_segment_measures_to_endpoint() {
        let point = Vec2::new(3.0, 4.0);
        let distance = distance_to_segment(point, Vec2::default(), Vec2::default());
        assert!((distance - 5.0).abs() < 1e-5);
    }
}
