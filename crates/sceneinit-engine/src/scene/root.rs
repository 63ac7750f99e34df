use nalgebra::Point3;

use super::Color;

/// A named element placed in the scene.
///
/// The bootstrap never adds nodes itself; embedders populate the root.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub position: Point3<f32>,
    pub visible: bool,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: Point3::origin(),
            visible: true,
        }
    }

    pub fn at(mut self, position: Point3<f32>) -> Self {
        self.position = position;
        self
    }
}

/// Root of the scene graph.
#[derive(Debug, Clone)]
pub struct SceneRoot {
    /// Clear color for every frame.
    pub background: Color,
    children: Vec<SceneNode>,
}

impl SceneRoot {
    /// Creates an empty scene with a black background.
    pub fn new() -> Self {
        Self {
            background: Color::BLACK,
            children: Vec::new(),
        }
    }

    pub fn add(&mut self, node: SceneNode) {
        self.children.push(node);
    }

    /// Removes every node with the given name. Returns how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.children.len();
        self.children.retain(|n| n.name != name);
        before - self.children.len()
    }

    #[inline]
    pub fn children(&self) -> &[SceneNode] {
        &self.children
    }

    /// Number of visible nodes.
    pub fn visible_count(&self) -> usize {
        self.children.iter().filter(|n| n.visible).count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Default for SceneRoot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_scene_is_empty_and_black() {
        let scene = SceneRoot::new();
        assert!(scene.is_empty());
        assert_eq!(scene.background, Color::BLACK);
    }

    #[test]
    fn remove_drops_all_nodes_with_name() {
        let mut scene = SceneRoot::new();
        scene.add(SceneNode::new("a"));
        scene.add(SceneNode::new("b").at(Point3::new(1.0, 0.0, 0.0)));
        scene.add(SceneNode::new("a"));

        assert_eq!(scene.remove("a"), 2);
        assert_eq!(scene.children().len(), 1);
        assert_eq!(scene.children()[0].name, "b");
    }

    #[test]
    fn hidden_nodes_are_not_counted_as_visible() {
        let mut scene = SceneRoot::new();
        let mut hidden = SceneNode::new("hidden");
        hidden.visible = false;
        scene.add(hidden);
        scene.add(SceneNode::new("shown"));

        assert_eq!(scene.visible_count(), 1);
    }
}
