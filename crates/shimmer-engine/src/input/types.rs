use crate::coords::Viewport;

/// Event categories a surface can subscribe to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum EventKind {
    Resize,
    PointerMove,
}

/// Pointer move in page coordinates (logical px, origin at top-left).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerMoveEvent {
    pub page_x: f32,
    pub page_y: f32,
}

impl PointerMoveEvent {
    /// Maps the pointer into clip space for a surface of the given size.
    ///
    /// `x` grows to the right and `y` grows upwards, both in `[-1, 1]` while the
    /// pointer is inside the box.
    pub fn to_clip(self, size: Viewport) -> [f32; 2] {
        if !size.is_valid() {
            return [0.0, 0.0];
        }
        [
            self.page_x / size.width * 2.0 - 1.0,
            self.page_y / size.height * -2.0 + 1.0,
        ]
    }
}

/// Events delivered by a host to subscribed listeners.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum HostEvent {
    Resize,
    PointerMove(PointerMoveEvent),
}

impl HostEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            HostEvent::Resize => EventKind::Resize,
            HostEvent::PointerMove(_) => EventKind::PointerMove,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_corners() {
        let size = Viewport::new(800.0, 600.0);
        let top_left = PointerMoveEvent { page_x: 0.0, page_y: 0.0 }.to_clip(size);
        let bottom_right = PointerMoveEvent { page_x: 800.0, page_y: 600.0 }.to_clip(size);
        assert_eq!(top_left, [-1.0, 1.0]);
        assert_eq!(bottom_right, [1.0, -1.0]);
    }

    #[test]
    fn clip_center_is_origin() {
        let size = Viewport::new(400.0, 200.0);
        let c = PointerMoveEvent { page_x: 200.0, page_y: 100.0 }.to_clip(size);
        assert_eq!(c, [0.0, 0.0]);
    }

    #[test]
    fn degenerate_size_maps_to_origin() {
        let c = PointerMoveEvent { page_x: 5.0, page_y: 5.0 }.to_clip(Viewport::default());
        assert_eq!(c, [0.0, 0.0]);
    }
}
