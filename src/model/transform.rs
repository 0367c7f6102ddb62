use tracing::debug;

use crate::controller::input::ControlAction;

pub const MAX_SPEED: f64 = 180.0;
pub const SPEED_STEP: f64 = 0.5;
pub const MAX_ZOOM_SPEED: i32 = 25;
pub const MIN_ZOOM: f64 = 0.04;
pub const MAX_ZOOM: f64 = 100.0;
/// Distance `zoom` is pushed back inside the range after touching a bound
pub const ZOOM_REBOUND: f64 = 0.1;

/// Rotation and zoom state driven by the keyboard, one instance per program run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformState {
    /// Degrees, accumulates without wrapping
    pub angle: f64,
    /// Degrees per frame
    pub speed: f64,
    pub zoom: f64,
    /// Hundredths of `zoom` per frame
    pub zoom_speed: i32,
}

/// Values handed to the shader each frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderParams {
    pub angle_rad: f32,
    pub scale: f32,
}

/// Accept a starting rotation speed only if it lies in the allowed range.
pub fn sanitize_speed(speed: f64) -> f64 {
    if speed.is_finite() && (-MAX_SPEED..=MAX_SPEED).contains(&speed) {
        speed
    } else {
        0.0
    }
}

impl TransformState {
    pub fn new(initial_speed: f64) -> Self {
        Self {
            angle: 0.0,
            speed: sanitize_speed(initial_speed),
            zoom: 1.0,
            zoom_speed: 0,
        }
    }

    pub fn apply(&mut self, action: ControlAction) {
        match action {
            ControlAction::SpeedUp => {
                self.speed = (self.speed + SPEED_STEP).min(MAX_SPEED);
            }
            ControlAction::SpeedDown => {
                self.speed = (self.speed - SPEED_STEP).max(-MAX_SPEED);
            }
            ControlAction::ZoomSpeedUp => {
                if self.zoom_speed < MAX_ZOOM_SPEED {
                    self.zoom_speed += 1;
                }
            }
            ControlAction::ZoomSpeedDown => {
                if self.zoom_speed > -MAX_ZOOM_SPEED {
                    self.zoom_speed -= 1;
                }
            }
            ControlAction::Stop => {
                self.speed = 0.0;
                self.zoom_speed = 0;
            }
        }
        debug!(?action, speed = self.speed, zoom_speed = self.zoom_speed, "control action applied");
    }

    /// Advance one frame: rotate by `speed`, zoom by `zoom_speed / 100`,
    /// bouncing off the zoom bounds.
    pub fn step(&mut self) {
        self.angle += self.speed;

        if self.zoom > MIN_ZOOM && self.zoom < MAX_ZOOM {
            self.zoom += f64::from(self.zoom_speed) / 100.0;
        }
        if self.zoom <= MIN_ZOOM {
            debug!(zoom = self.zoom, "zoom hit lower bound");
            self.zoom_speed = 0;
            self.zoom = MIN_ZOOM + ZOOM_REBOUND;
        }
        if self.zoom >= MAX_ZOOM {
            debug!(zoom = self.zoom, "zoom hit upper bound");
            self.zoom_speed = 0;
            self.zoom = MAX_ZOOM - ZOOM_REBOUND;
        }
    }

    pub fn shader_params(&self) -> ShaderParams {
        ShaderParams {
            angle_rad: self.angle.to_radians() as f32,
            scale: self.zoom as f32,
        }
    }

    /// Window caption. Speeds are shown negated, matching the on-screen
    /// direction of rotation and zoom.
    pub fn title(&self) -> String {
        format!(
            "Zoom {:.3} rotation speed {} deg zoom_speed {}",
            1.0 / self.zoom,
            format_decimal(-self.speed),
            format_decimal(f64::from(-self.zoom_speed) / 100.0),
        )
    }
}

impl Default for TransformState {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Shortest round-trip float rendering with a decimal point ("1.0", not "1").
/// Magnitudes below 1e-4 or from 1e16 up switch to exponent form with a
/// signed, two-digit exponent ("1e-07", "2.5e+16").
fn format_decimal(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value != 0.0 {
        let sci = format!("{value:e}");
        if let Some((mantissa, exp)) = sci.split_once('e') {
            if let Ok(exp) = exp.parse::<i32>() {
                if !(-4..16).contains(&exp) {
                    let sign = if exp < 0 { '-' } else { '+' };
                    return format!("{mantissa}e{sign}{:02}", exp.abs());
                }
            }
        }
    }
    let s = value.to_string();
    if s.contains('.') {
        s
    } else {
        format!("{s}.0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::input::ControlAction::*;

    #[test]
    fn test_left_presses_never_exceed_max_speed() {
        let mut state = TransformState::new(170.0);
        let mut prev = state.speed;
        for _ in 0..100 {
            state.apply(SpeedUp);
            assert!(state.speed <= MAX_SPEED);
            assert!(state.speed >= prev, "speed decreased on a left press");
            prev = state.speed;
        }
        assert_eq!(state.speed, MAX_SPEED);
    }

    #[test]
    fn test_off_grid_speed_clamps_at_limits() {
        let mut state = TransformState::new(179.7);
        state.apply(SpeedUp);
        assert_eq!(state.speed, MAX_SPEED);
        state.apply(SpeedUp);
        assert_eq!(state.speed, MAX_SPEED);

        let mut state = TransformState::new(-179.7);
        state.apply(SpeedDown);
        assert_eq!(state.speed, -MAX_SPEED);
        state.apply(SpeedUp);
        assert_eq!(state.speed, -179.5);
    }

    #[test]
    fn test_right_presses_never_go_below_min_speed() {
        let mut state = TransformState::new(-179.0);
        for _ in 0..10 {
            state.apply(SpeedDown);
        }
        assert_eq!(state.speed, -MAX_SPEED);
    }

    #[test]
    fn test_zoom_speed_stays_in_range() {
        let mut state = TransformState::default();
        let sequence = [ZoomSpeedUp; 40]
            .into_iter()
            .chain([ZoomSpeedDown; 80])
            .chain([Stop, ZoomSpeedDown, ZoomSpeedUp, ZoomSpeedUp]);
        for action in sequence {
            state.apply(action);
            assert!((-MAX_ZOOM_SPEED..=MAX_ZOOM_SPEED).contains(&state.zoom_speed));
        }
        assert_eq!(state.zoom_speed, 1);
    }

    #[test]
    fn test_stop_resets_speeds_only() {
        let mut state = TransformState {
            angle: 42.0,
            speed: -12.5,
            zoom: 3.2,
            zoom_speed: -7,
        };
        state.apply(Stop);
        assert_eq!(state.speed, 0.0);
        assert_eq!(state.zoom_speed, 0);
        assert_eq!(state.angle, 42.0);
        assert_eq!(state.zoom, 3.2);
    }

    #[test]
    fn test_three_left_presses_then_one_frame() {
        let mut state = TransformState::default();
        for _ in 0..3 {
            state.apply(SpeedUp);
        }
        assert_eq!(state.speed, 1.5);

        let before = state.angle;
        state.step();
        assert_eq!(state.angle - before, 1.5);
        assert_eq!(state.zoom, 1.0);
    }

    #[test]
    fn test_angle_accumulates_without_wrapping() {
        let mut state = TransformState::new(180.0);
        for _ in 0..5 {
            state.step();
        }
        assert_eq!(state.angle, 900.0);
    }

    #[test]
    fn test_upper_zoom_bound_rebounds() {
        let mut state = TransformState {
            zoom: MAX_ZOOM - 0.05,
            zoom_speed: 10,
            ..TransformState::default()
        };
        state.step();
        assert_eq!(state.zoom_speed, 0);
        assert_eq!(state.zoom, MAX_ZOOM - ZOOM_REBOUND);
        assert!((state.zoom - 99.9).abs() < 1e-12);
    }

    #[test]
    fn test_lower_zoom_bound_rebounds() {
        let mut state = TransformState {
            zoom: 0.1,
            zoom_speed: -25,
            ..TransformState::default()
        };
        state.step();
        assert_eq!(state.zoom_speed, 0);
        assert_eq!(state.zoom, MIN_ZOOM + ZOOM_REBOUND);
    }

    #[test]
    fn test_zoom_stays_strictly_inside_for_any_start() {
        let starts = [0.0401, 0.05, 0.14, 0.5, 1.0, 10.0, 50.0, 99.0, 99.76, 99.9999];
        for &zoom in &starts {
            for zoom_speed in -MAX_ZOOM_SPEED..=MAX_ZOOM_SPEED {
                let mut state = TransformState {
                    zoom,
                    zoom_speed,
                    ..TransformState::default()
                };
                let unclamped = zoom + f64::from(zoom_speed) / 100.0;
                state.step();
                assert!(state.zoom > MIN_ZOOM && state.zoom < MAX_ZOOM, "zoom {zoom} speed {zoom_speed}");
                if unclamped <= MIN_ZOOM {
                    assert_eq!(state.zoom_speed, 0);
                    assert_eq!(state.zoom, MIN_ZOOM + ZOOM_REBOUND);
                } else if unclamped >= MAX_ZOOM {
                    assert_eq!(state.zoom_speed, 0);
                    assert_eq!(state.zoom, MAX_ZOOM - ZOOM_REBOUND);
                } else {
                    assert_eq!(state.zoom_speed, zoom_speed);
                }
            }
        }
    }

    #[test]
    fn test_initial_speed_out_of_range_is_rejected() {
        assert_eq!(TransformState::new(200.0).speed, 0.0);
        assert_eq!(TransformState::new(-180.5).speed, 0.0);
        assert_eq!(TransformState::new(f64::NAN).speed, 0.0);
        assert_eq!(TransformState::new(-180.0).speed, -180.0);
        assert_eq!(TransformState::new(12.25).speed, 12.25);
    }

    #[test]
    fn test_shader_params_convert_to_radians() {
        let state = TransformState {
            angle: 180.0,
            zoom: 2.0,
            ..TransformState::default()
        };
        let params = state.shader_params();
        assert!((params.angle_rad - std::f32::consts::PI).abs() < 1e-6);
        assert_eq!(params.scale, 2.0);
    }

    #[test]
    fn test_title_format() {
        let state = TransformState::default();
        assert_eq!(state.title(), "Zoom 1.000 rotation speed -0.0 deg zoom_speed 0.0");

        let state = TransformState {
            speed: 1.5,
            zoom: 0.5,
            zoom_speed: -25,
            ..TransformState::default()
        };
        assert_eq!(state.title(), "Zoom 2.000 rotation speed -1.5 deg zoom_speed 0.25");

        let state = TransformState {
            speed: -3.0,
            zoom: 3.0,
            zoom_speed: 10,
            ..TransformState::default()
        };
        assert_eq!(state.title(), "Zoom 0.333 rotation speed 3.0 deg zoom_speed -0.1");
    }

    #[test]
    fn test_title_uses_exponent_form_for_tiny_speeds() {
        let state = TransformState {
            speed: 1e-7,
            ..TransformState::default()
        };
        assert_eq!(state.title(), "Zoom 1.000 rotation speed -1e-07 deg zoom_speed 0.0");

        assert_eq!(format_decimal(1.5e-5), "1.5e-05");
        assert_eq!(format_decimal(0.0001), "0.0001");
        assert_eq!(format_decimal(-0.00012), "-0.00012");
        assert_eq!(format_decimal(2.5e16), "2.5e+16");
        assert_eq!(format_decimal(1e15), "1000000000000000.0");
        assert_eq!(format_decimal(-0.0), "-0.0");
    }
}
