use serde::{Deserialize, Serialize};

pub const CONTROL_COUNT: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    Left = 0,
    Right = 1,
    Thrust = 2,
    Fire = 3,
    Hyperspace = 4,
}

impl Control {
    pub const ALL: [Control; CONTROL_COUNT] = [
        Control::Left,
        Control::Right,
        Control::Thrust,
        Control::Fire,
        Control::Hyperspace,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Analog controls carry partial values; the rest are on or off.
    pub const fn is_analog(self) -> bool {
        matches!(self, Control::Left | Control::Right | Control::Thrust)
    }
}

/// Quantises a control value onto the byte grid used by the input log.
pub fn quantize(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

pub fn dequantize(value: u8) -> f64 {
    f64::from(value) / 255.0
}

/// One polled frame of player input, every control in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputState {
    values: [f64; CONTROL_COUNT],
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, control: Control, value: f64) -> Self {
        self.set(control, value);
        self
    }

    pub fn set(&mut self, control: Control, value: f64) {
        let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        self.values[control.index()] = if control.is_analog() {
            value
        } else if value >= 0.5 {
            1.0
        } else {
            0.0
        };
    }

    pub fn get(&self, control: Control) -> f64 {
        self.values[control.index()]
    }

    pub fn pressed(&self, control: Control) -> bool {
        self.get(control) > 0.0
    }

    pub fn is_idle(&self) -> bool {
        self.values.iter().all(|value| *value == 0.0)
    }

    /// Zeroes analog values below `threshold`.
    pub fn apply_deadzone(&mut self, threshold: f64) {
        for control in Control::ALL {
            if control.is_analog() && self.values[control.index()] < threshold {
                self.values[control.index()] = 0.0;
            }
        }
    }

    /// Positive turns clockwise (towards +y in screen space).
    pub fn turn(&self) -> f64 {
        self.get(Control::Right) - self.get(Control::Left)
    }

    pub fn thrust(&self) -> f64 {
        self.get(Control::Thrust)
    }

    /// Snaps every value onto the byte grid the log stores.
    pub fn quantized(&self) -> Self {
        let mut out = *self;
        for value in &mut out.values {
            *value = dequantize(quantize(*value));
        }
        out
    }
}
