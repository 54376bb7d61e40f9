//! Frame-latched input state. The shell feeds events in as they arrive;
//! `end_frame` snapshots the state so hit (pressed this frame) and up
//! (released this frame) edges can be queried until the next frame.

use std::collections::HashSet;

use winit::keyboard::KeyCode;

#[derive(Default, Debug, Clone, Copy)]
struct ButtonLatch {
    down: bool,
    last: bool,
}

impl ButtonLatch {
    fn hit(&self) -> bool {
        self.down && !self.last
    }

    fn up(&self) -> bool {
        !self.down && self.last
    }

    fn end_frame(&mut self) {
        self.last = self.down;
    }
}

#[derive(Default)]
pub struct InputHandler {
    keys_down: HashSet<KeyCode>,
    keys_last: HashSet<KeyCode>,
    left: ButtonLatch,
    middle: ButtonLatch,
    right: ButtonLatch,
    cursor: Option<(f64, f64)>,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key(&mut self, key: KeyCode, down: bool) {
        if down {
            self.keys_down.insert(key);
        } else {
            self.keys_down.remove(&key);
        }
    }

    pub fn set_left_mouse(&mut self, down: bool) {
        self.left.down = down;
    }

    pub fn set_middle_mouse(&mut self, down: bool) {
        self.middle.down = down;
    }

    pub fn set_right_mouse(&mut self, down: bool) {
        self.right.down = down;
    }

    pub fn set_cursor(&mut self, position: Option<(f64, f64)>) {
        self.cursor = position;
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Pressed this frame.
    pub fn is_key_hit(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key) && !self.keys_last.contains(&key)
    }

    /// Released this frame.
    pub fn is_key_up(&self, key: KeyCode) -> bool {
        !self.keys_down.contains(&key) && self.keys_last.contains(&key)
    }

    pub fn is_left_mouse_down(&self) -> bool {
        self.left.down
    }

    pub fn is_left_mouse_hit(&self) -> bool {
        self.left.hit()
    }

    pub fn is_left_mouse_up(&self) -> bool {
        self.left.up()
    }

    pub fn is_middle_mouse_down(&self) -> bool {
        self.middle.down
    }

    pub fn is_middle_mouse_hit(&self) -> bool {
        self.middle.hit()
    }

    pub fn is_middle_mouse_up(&self) -> bool {
        self.middle.up()
    }

    pub fn is_right_mouse_down(&self) -> bool {
        self.right.down
    }

    pub fn is_right_mouse_hit(&self) -> bool {
        self.right.hit()
    }

    pub fn is_right_mouse_up(&self) -> bool {
        self.right.up()
    }

    pub fn cursor(&self) -> Option<(f64, f64)> {
        self.cursor
    }

    /// Roll the latches over; call once per frame after polling.
    pub fn end_frame(&mut self) {
        self.keys_last = self.keys_down.clone();
        self.left.end_frame();
        self.middle.end_frame();
        self.right.end_frame();
    }
}
