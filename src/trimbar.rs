// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Hover/drag/release handling for the two trim markers drawn over a waveform.
//!
//! Each marker is independently idle, hovering or dragging. Only one marker may be
//! hovering or dragging at a time so that handles sitting on top of each other don't
//! both respond. Positions are canvas pixels; conversion to seconds is linear over the
//! canvas width.

use tracing::debug;

use crate::trim::TrimWindow;

/// Hit radius around a marker handle at a device pixel ratio of 1.
pub const DEFAULT_HOVER_RADIUS: f64 = 18.0;

/// Which of the two markers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Interaction state of a single marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarState {
    Idle,
    Hovering,
    Dragging,
}

#[derive(Clone, Copy, Debug)]
struct Bar {
    x: f64,
    state: BarState,
}

/// The pair of trim markers over a canvas.
#[derive(Clone, Debug)]
pub struct Trimbar {
    left: Bar,
    right: Bar,
    canvas_width: f64,
    hover_radius: f64,
}

impl Trimbar {
    /// Creates markers spanning the whole canvas.
    pub fn new(canvas_width: f64, device_pixel_ratio: f64) -> Trimbar {
        let canvas_width = canvas_width.max(0.0);
        let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        Trimbar {
            left: Bar {
                x: 0.0,
                state: BarState::Idle,
            },
            right: Bar {
                x: canvas_width,
                state: BarState::Idle,
            },
            canvas_width,
            hover_radius: DEFAULT_HOVER_RADIUS * dpr,
        }
    }

    pub fn canvas_width(&self) -> f64 {
        self.canvas_width
    }

    pub fn hover_radius(&self) -> f64 {
        self.hover_radius
    }

    /// Pixel position of a marker.
    pub fn x(&self, side: Side) -> f64 {
        self.bar(side).x
    }

    pub fn state(&self, side: Side) -> BarState {
        self.bar(side).state
    }

    /// The marker currently being dragged, if any.
    pub fn dragging(&self) -> Option<Side> {
        [Side::Left, Side::Right]
            .into_iter()
            .find(|side| self.bar(*side).state == BarState::Dragging)
    }

    /// The marker currently highlighted, if any.
    pub fn hovering(&self) -> Option<Side> {
        [Side::Left, Side::Right]
            .into_iter()
            .find(|side| self.bar(*side).state == BarState::Hovering)
    }

    /// Handles pointer movement. While dragging, the dragged marker follows the pointer;
    /// otherwise hover states are updated. Returns true if anything visible changed.
    pub fn pointer_move(&mut self, x: f64) -> bool {
        if let Some(side) = self.dragging() {
            let before = self.bar(side).x;
            self.drag_to(side, x);
            return before != self.bar(side).x;
        }

        let mut changed = false;

        // Release first so a marker the pointer just left doesn't block its neighbour.
        for side in [Side::Left, Side::Right] {
            let near = self.is_near(side, x);
            let bar = self.bar_mut(side);
            if bar.state == BarState::Hovering && !near {
                bar.state = BarState::Idle;
                changed = true;
            }
        }

        for side in [Side::Left, Side::Right] {
            let near = self.is_near(side, x);
            let other_busy = self.bar(side.other()).state != BarState::Idle;
            let bar = self.bar_mut(side);
            if bar.state == BarState::Idle && near && !other_busy {
                bar.state = BarState::Hovering;
                changed = true;
            }
        }

        changed
    }

    /// Starts dragging the hovered marker, if there is one.
    pub fn pointer_down(&mut self) -> Option<Side> {
        let side = self.hovering()?;
        self.bar_mut(side).state = BarState::Dragging;
        debug!(side = ?side, "Trim marker drag started");
        Some(side)
    }

    /// Ends a drag wherever the pointer is and returns the resulting window in seconds.
    /// Returns None if nothing was being dragged.
    pub fn pointer_up(&mut self, duration: f64) -> Option<TrimWindow> {
        let side = self.dragging()?;
        self.bar_mut(side).state = BarState::Idle;

        if self.left.x > self.right.x {
            let other = self.bar(side.other()).x;
            self.bar_mut(side).x = other;
        }

        let window = self.window(duration);
        debug!(
            side = ?side,
            start = window.start,
            end = window.end,
            "Trim marker released"
        );
        Some(window)
    }

    /// Moves one marker to `x` as a complete grab, drag and release, without going
    /// through hover detection. Used by non-pointer input.
    pub fn drag_marker(&mut self, side: Side, x: f64, duration: f64) -> Option<TrimWindow> {
        self.left.state = BarState::Idle;
        self.right.state = BarState::Idle;
        self.bar_mut(side).state = BarState::Dragging;
        self.drag_to(side, x);
        self.pointer_up(duration)
    }

    /// Converts a canvas x position to seconds for a buffer of `duration` seconds.
    pub fn x_to_seconds(&self, x: f64, duration: f64) -> f64 {
        if self.canvas_width <= 0.0 {
            return 0.0;
        }
        x * duration / self.canvas_width
    }

    /// Converts seconds to a canvas x position for a buffer of `duration` seconds.
    pub fn seconds_to_x(&self, seconds: f64, duration: f64) -> f64 {
        if duration <= 0.0 {
            return 0.0;
        }
        seconds * self.canvas_width / duration
    }

    /// The window the markers currently describe.
    pub fn window(&self, duration: f64) -> TrimWindow {
        TrimWindow::new(
            self.x_to_seconds(self.left.x, duration),
            self.x_to_seconds(self.right.x, duration),
        )
    }

    /// Positions the markers to show a stored window.
    pub fn set_window(&mut self, window: &TrimWindow, duration: f64) {
        let left = self.clamp_x(self.seconds_to_x(window.start, duration));
        let right = self.clamp_x(self.seconds_to_x(window.end, duration));
        self.left.x = left.min(right);
        self.right.x = right.max(left);
    }

    /// Moves the markers back to the canvas edges.
    pub fn reset(&mut self) {
        self.left.x = 0.0;
        self.right.x = self.canvas_width;
    }

    /// Changes the canvas width, keeping marker positions proportional.
    pub fn resize(&mut self, canvas_width: f64) {
        let canvas_width = canvas_width.max(0.0);
        if self.canvas_width > 0.0 {
            let scale = canvas_width / self.canvas_width;
            self.left.x *= scale;
            self.right.x *= scale;
        } else {
            self.left.x = 0.0;
            self.right.x = canvas_width;
        }
        self.canvas_width = canvas_width;
    }

    fn drag_to(&mut self, side: Side, x: f64) {
        let x = self.clamp_x(x);
        match side {
            Side::Left => self.left.x = x.min(self.right.x),
            Side::Right => self.right.x = x.max(self.left.x),
        }
    }

    fn clamp_x(&self, x: f64) -> f64 {
        if x.is_nan() {
            return 0.0;
        }
        x.clamp(0.0, self.canvas_width)
    }

    fn is_near(&self, side: Side, x: f64) -> bool {
        (x - self.bar(side).x).abs() <= self.hover_radius
    }

    fn bar(&self, side: Side) -> &Bar {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    fn bar_mut(&mut self, side: Side) -> &mut Bar {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn drag(trimbar: &mut Trimbar, from: f64, to: f64, duration: f64) -> Option<TrimWindow> {
        trimbar.pointer_move(from);
        trimbar.pointer_down()?;
        trimbar.pointer_move(to);
        trimbar.pointer_up(duration)
    }

    #[test]
    fn test_hover_and_leave() {
        let mut trimbar = Trimbar::new(400.0, 1.0);
        assert!(trimbar.pointer_move(10.0));
        assert_eq!(BarState::Hovering, trimbar.state(Side::Left));
        assert_eq!(BarState::Idle, trimbar.state(Side::Right));

        assert!(trimbar.pointer_move(200.0));
        assert_eq!(BarState::Idle, trimbar.state(Side::Left));
        assert!(!trimbar.pointer_move(201.0));
    }

    #[test]
    fn test_hover_radius_scales_with_dpr() {
        let trimbar = Trimbar::new(400.0, 2.0);
        assert_eq!(36.0, trimbar.hover_radius());

        let mut trimbar = Trimbar::new(400.0, 2.0);
        trimbar.pointer_move(30.0);
        assert_eq!(BarState::Hovering, trimbar.state(Side::Left));
    }

    #[test]
    fn test_hover_mutual_exclusion() {
        let mut trimbar = Trimbar::new(400.0, 1.0);
        trimbar.set_window(&TrimWindow::new(1.0, 1.05), 4.0);
        // Markers are 5px apart; the pointer is near both.
        trimbar.pointer_move(102.0);
        assert_eq!(BarState::Hovering, trimbar.state(Side::Left));
        assert_eq!(BarState::Idle, trimbar.state(Side::Right));

        // Still near both: the left one keeps the highlight.
        trimbar.pointer_move(104.0);
        assert_eq!(BarState::Hovering, trimbar.state(Side::Left));
        assert_eq!(BarState::Idle, trimbar.state(Side::Right));
    }

    #[test]
    fn test_pointer_down_without_hover() {
        let mut trimbar = Trimbar::new(400.0, 1.0);
        trimbar.pointer_move(200.0);
        assert_eq!(None, trimbar.pointer_down());
        assert_eq!(None, trimbar.pointer_up(1.0));
    }

    #[test]
    fn test_drag_left_marker() {
        let mut trimbar = Trimbar::new(400.0, 1.0);
        let window = drag(&mut trimbar, 5.0, 100.0, 2.0).expect("expected a window");
        assert_eq!(100.0, trimbar.x(Side::Left));
        assert_eq!(TrimWindow::new(0.5, 2.0), window);
        assert_eq!(BarState::Idle, trimbar.state(Side::Left));
    }

    #[test]
    fn test_drag_clamped_to_canvas() {
        let mut trimbar = Trimbar::new(400.0, 1.0);
        drag(&mut trimbar, 395.0, 1000.0, 1.0);
        assert_eq!(400.0, trimbar.x(Side::Right));
        drag(&mut trimbar, 0.0, -50.0, 1.0);
        assert_eq!(0.0, trimbar.x(Side::Left));
    }

    #[test]
    fn test_drag_left_past_right() {
        let mut trimbar = Trimbar::new(400.0, 1.0);
        trimbar.set_window(&TrimWindow::new(0.0, 2.0), 4.0);
        assert_eq!(200.0, trimbar.x(Side::Right));

        drag(&mut trimbar, 0.0, 350.0, 4.0);
        assert_eq!(trimbar.x(Side::Left), trimbar.x(Side::Right));
        assert!(trimbar.x(Side::Left) <= trimbar.x(Side::Right));
    }

    #[test]
    fn test_drag_right_below_left() {
        let mut trimbar = Trimbar::new(400.0, 1.0);
        trimbar.set_window(&TrimWindow::new(2.0, 4.0), 4.0);
        drag(&mut trimbar, 400.0, 10.0, 4.0);
        assert_eq!(200.0, trimbar.x(Side::Right));
        assert_eq!(200.0, trimbar.x(Side::Left));
    }

    #[test]
    fn test_release_corrects_crossing() {
        let mut trimbar = Trimbar::new(400.0, 1.0);
        trimbar.pointer_move(2.0);
        trimbar.pointer_down();
        // Force a crossed state mid-drag, as a resize could.
        trimbar.left.x = 300.0;
        trimbar.right.x = 250.0;
        let window = trimbar.pointer_up(4.0).expect("expected a window");
        assert_eq!(250.0, trimbar.x(Side::Left));
        assert_eq!(250.0, trimbar.x(Side::Right));
        assert_eq!(window.start, window.end);
    }

    #[test]
    fn test_seconds_pixel_conversion() {
        let trimbar = Trimbar::new(800.0, 1.0);
        assert_eq!(1.5, trimbar.x_to_seconds(400.0, 3.0));
        assert_eq!(400.0, trimbar.seconds_to_x(1.5, 3.0));
        assert_eq!(0.0, trimbar.seconds_to_x(1.0, 0.0));
    }

    #[test]
    fn test_resize_keeps_proportions() {
        let mut trimbar = Trimbar::new(400.0, 1.0);
        trimbar.set_window(&TrimWindow::new(1.0, 3.0), 4.0);
        trimbar.resize(800.0);
        assert_eq!(200.0, trimbar.x(Side::Left));
        assert_eq!(600.0, trimbar.x(Side::Right));
    }

    #[test]
    fn test_drag_marker_with_overlapping_handles() {
        let mut trimbar = Trimbar::new(400.0, 1.0);
        trimbar.set_window(&TrimWindow::new(1.0, 1.0), 4.0);
        // Hover detection would pick the left marker here.
        let window = trimbar
            .drag_marker(Side::Right, 300.0, 4.0)
            .expect("expected a window");
        assert_eq!(TrimWindow::new(1.0, 3.0), window);
        assert_eq!(BarState::Idle, trimbar.state(Side::Right));
        assert_eq!(None, trimbar.dragging());
    }
}
