//! Scene tree with explicit transform propagation.
//!
//! Each parent owns an ordered list of children; one root-down traversal
//! recomputes accumulated world transforms and effective visibility.
//! This replaces the broadcast/observer chains of signal-based scene
//! graphs with a single "recompute and push" pass, so there is no
//! implicit registration-order dependency.

use glam::Mat4;

/// What a scene node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeKind {
    /// Pure grouping/transform node.
    #[default]
    Group,
    /// Camera placeholder (orbit math lives outside this crate).
    Camera,
    /// A polygon mesh; its accumulated transform feeds the deform mesh's
    /// model matrix.
    Mesh,
}

/// A node in the scene tree.
#[derive(Debug, Clone)]
pub struct SceneNode {
    name: String,
    kind: NodeKind,
    /// Local transform relative to the parent.
    pub local: Mat4,
    /// Whether this node itself is marked visible.
    pub visible: bool,
    /// Drawn even when an ancestor is hidden.
    pub always_visible: bool,
    world: Mat4,
    effective_visible: bool,
    children: Vec<SceneNode>,
}

impl SceneNode {
    /// Create a node with an identity local transform.
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            local: Mat4::IDENTITY,
            visible: true,
            always_visible: false,
            world: Mat4::IDENTITY,
            effective_visible: true,
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Accumulated world transform as of the last propagation.
    pub fn world(&self) -> Mat4 {
        self.world
    }

    /// Visibility after ancestor visibility is applied, as of the last
    /// propagation.
    pub fn effective_visible(&self) -> bool {
        self.effective_visible
    }

    /// Append a child, returning a handle to the stored node.
    pub fn add_child(&mut self, child: SceneNode) -> &mut SceneNode {
        self.children.push(child);
        self.children.last_mut().expect("just pushed")
    }

    pub fn children(&self) -> &[SceneNode] {
        &self.children
    }

    /// Recompute accumulated transforms and visibility for the whole
    /// subtree rooted here, in one pre-order pass.
    pub fn propagate(&mut self) {
        self.propagate_from(Mat4::IDENTITY, true);
    }

    fn propagate_from(&mut self, parent_world: Mat4, parent_visible: bool) {
        self.world = parent_world * self.local;
        self.effective_visible = (parent_visible && self.visible) || self.always_visible;
        for child in &mut self.children {
            child.propagate_from(self.world, self.effective_visible);
        }
    }

    /// Look up a descendant by slash-separated path, e.g.
    /// `"group/mesh"`. An empty path returns this node.
    pub fn find(&self, path: &str) -> Option<&SceneNode> {
        let mut node = self;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            node = node.children.iter().find(|c| c.name == segment)?;
        }
        Some(node)
    }

    /// Mutable path lookup.
    pub fn find_mut(&mut self, path: &str) -> Option<&mut SceneNode> {
        let mut node = self;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            node = node.children.iter_mut().find(|c| c.name == segment)?;
        }
        Some(node)
    }

    /// Pre-order traversal over the subtree, in child insertion order.
    pub fn visit(&self, f: &mut impl FnMut(&SceneNode)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn sample_tree() -> SceneNode {
        let mut root = SceneNode::new("root", NodeKind::Group);
        let mut group = SceneNode::new("group", NodeKind::Group);
        group.local = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let mut mesh = SceneNode::new("mesh", NodeKind::Mesh);
        mesh.local = Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0));
        group.add_child(mesh);
        root.add_child(group);
        root
    }

    #[test]
    fn test_propagation_accumulates_parent_transforms() {
        let mut root = sample_tree();
        root.propagate();

        let mesh = root.find("group/mesh").unwrap();
        let origin = mesh.world().transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_repropagation_after_local_change() {
        let mut root = sample_tree();
        root.propagate();

        root.find_mut("group").unwrap().local =
            Mat4::from_translation(Vec3::new(-3.0, 0.0, 0.0));
        root.propagate();

        let mesh = root.find("group/mesh").unwrap();
        let origin = mesh.world().transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(-3.0, 2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_visibility_inherits_unless_always_visible() {
        let mut root = sample_tree();
        root.find_mut("group").unwrap().visible = false;
        root.propagate();
        assert!(!root.find("group/mesh").unwrap().effective_visible());

        root.find_mut("group/mesh").unwrap().always_visible = true;
        root.propagate();
        assert!(root.find("group/mesh").unwrap().effective_visible());
    }

    #[test]
    fn test_visit_is_preorder() {
        let root = sample_tree();
        let mut names = Vec::new();
        root.visit(&mut |node| names.push(node.name().to_string()));
        assert_eq!(names, vec!["root", "group", "mesh"]);
    }

    #[test]
    fn test_find_missing_path() {
        let root = sample_tree();
        assert!(root.find("group/nope").is_none());
        assert_eq!(root.find("").unwrap().name(), "root");
    }
}
