//! Easing functions.
//!
//! Every function maps a progress value `t` in `[0, 1]` to an eased progress value with
//! `f(0) = 0` and `f(1) = 1`. The `back` and `elastic` families overshoot in between.

use std::f64::consts::PI;

const BACK_C1: f64 = 1.70158;
const BACK_C2: f64 = BACK_C1 * 1.525;
const BACK_C3: f64 = BACK_C1 + 1.0;
const ELASTIC_C4: f64 = (2.0 * PI) / 3.0;
const ELASTIC_C5: f64 = (2.0 * PI) / 4.5;

/// A named easing function.
///
/// Paths and scenes store an `Easing` rather than a function pointer so configurations stay
/// `Copy` and can be parsed from the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Easing {
    #[default]
    Linear,
    InSine,
    OutSine,
    InOutSine,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
    InQuart,
    OutQuart,
    InOutQuart,
    InQuint,
    OutQuint,
    InOutQuint,
    InExpo,
    OutExpo,
    InOutExpo,
    InCirc,
    OutCirc,
    InOutCirc,
    InBack,
    OutBack,
    InOutBack,
    InElastic,
    OutElastic,
    InOutElastic,
    InBounce,
    OutBounce,
    InOutBounce,
}

impl Easing {
    /// Applies the easing function to `t`.
    pub fn apply(self, t: f64) -> f64 {
        match self {
            Easing::Linear => linear(t),
            Easing::InSine => in_sine(t),
            Easing::OutSine => out_sine(t),
            Easing::InOutSine => in_out_sine(t),
            Easing::InQuad => in_quad(t),
            Easing::OutQuad => out_quad(t),
            Easing::InOutQuad => in_out_quad(t),
            Easing::InCubic => in_cubic(t),
            Easing::OutCubic => out_cubic(t),
            Easing::InOutCubic => in_out_cubic(t),
            Easing::InQuart => in_quart(t),
            Easing::OutQuart => out_quart(t),
            Easing::InOutQuart => in_out_quart(t),
            Easing::InQuint => in_quint(t),
            Easing::OutQuint => out_quint(t),
            Easing::InOutQuint => in_out_quint(t),
            Easing::InExpo => in_expo(t),
            Easing::OutExpo => out_expo(t),
            Easing::InOutExpo => in_out_expo(t),
            Easing::InCirc => in_circ(t),
            Easing::OutCirc => out_circ(t),
            Easing::InOutCirc => in_out_circ(t),
            Easing::InBack => in_back(t),
            Easing::OutBack => out_back(t),
            Easing::InOutBack => in_out_back(t),
            Easing::InElastic => in_elastic(t),
            Easing::OutElastic => out_elastic(t),
            Easing::InOutElastic => in_out_elastic(t),
            Easing::InBounce => in_bounce(t),
            Easing::OutBounce => out_bounce(t),
            Easing::InOutBounce => in_out_bounce(t),
        }
    }
}

pub fn linear(t: f64) -> f64 {
    t
}

pub fn in_sine(t: f64) -> f64 {
    if t >= 1.0 {
        return 1.0;
    }
    1.0 - (t * PI / 2.0).cos()
}

pub fn out_sine(t: f64) -> f64 {
    (t * PI / 2.0).sin()
}

pub fn in_out_sine(t: f64) -> f64 {
    -((PI * t).cos() - 1.0) / 2.0
}

pub fn in_quad(t: f64) -> f64 {
    t * t
}

pub fn out_quad(t: f64) -> f64 {
    1.0 - (1.0 - t) * (1.0 - t)
}

pub fn in_out_quad(t: f64) -> f64 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

pub fn in_cubic(t: f64) -> f64 {
    t.powi(3)
}

pub fn out_cubic(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}

pub fn in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t.powi(3)
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

pub fn in_quart(t: f64) -> f64 {
    t.powi(4)
}

pub fn out_quart(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(4)
}

pub fn in_out_quart(t: f64) -> f64 {
    if t < 0.5 {
        8.0 * t.powi(4)
    } else {
        1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
    }
}

pub fn in_quint(t: f64) -> f64 {
    t.powi(5)
}

pub fn out_quint(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(5)
}

pub fn in_out_quint(t: f64) -> f64 {
    if t < 0.5 {
        16.0 * t.powi(5)
    } else {
        1.0 - (-2.0 * t + 2.0).powi(5) / 2.0
    }
}

pub fn in_expo(t: f64) -> f64 {
    if t <= 0.0 {
        0.0
    } else if t >= 1.0 {
        1.0
    } else {
        2f64.powf(10.0 * t - 10.0)
    }
}

pub fn out_expo(t: f64) -> f64 {
    if t >= 1.0 {
        1.0
    } else {
        1.0 - 2f64.powf(-10.0 * t)
    }
}

pub fn in_out_expo(t: f64) -> f64 {
    if t <= 0.0 {
        0.0
    } else if t >= 1.0 {
        1.0
    } else if t < 0.5 {
        2f64.powf(20.0 * t - 10.0) / 2.0
    } else {
        (2.0 - 2f64.powf(-20.0 * t + 10.0)) / 2.0
    }
}

pub fn in_circ(t: f64) -> f64 {
    1.0 - (1.0 - t * t).max(0.0).sqrt()
}

pub fn out_circ(t: f64) -> f64 {
    (1.0 - (t - 1.0).powi(2)).max(0.0).sqrt()
}

pub fn in_out_circ(t: f64) -> f64 {
    if t < 0.5 {
        (1.0 - (1.0 - (2.0 * t).powi(2)).max(0.0).sqrt()) / 2.0
    } else {
        ((1.0 - (-2.0 * t + 2.0).powi(2)).max(0.0).sqrt() + 1.0) / 2.0
    }
}

pub fn in_back(t: f64) -> f64 {
    BACK_C3 * t.powi(3) - BACK_C1 * t * t
}

pub fn out_back(t: f64) -> f64 {
    1.0 + BACK_C3 * (t - 1.0).powi(3) + BACK_C1 * (t - 1.0).powi(2)
}

pub fn in_out_back(t: f64) -> f64 {
    if t < 0.5 {
        ((2.0 * t).powi(2) * ((BACK_C2 + 1.0) * 2.0 * t - BACK_C2)) / 2.0
    } else {
        ((2.0 * t - 2.0).powi(2) * ((BACK_C2 + 1.0) * (t * 2.0 - 2.0) + BACK_C2) + 2.0) / 2.0
    }
}

pub fn in_elastic(t: f64) -> f64 {
    if t <= 0.0 {
        0.0
    } else if t >= 1.0 {
        1.0
    } else {
        -(2f64.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * ELASTIC_C4).sin()
    }
}

pub fn out_elastic(t: f64) -> f64 {
    if t <= 0.0 {
        0.0
    } else if t >= 1.0 {
        1.0
    } else {
        2f64.powf(-10.0 * t) * ((t * 10.0 - 0.75) * ELASTIC_C4).sin() + 1.0
    }
}

pub fn in_out_elastic(t: f64) -> f64 {
    if t <= 0.0 {
        0.0
    } else if t >= 1.0 {
        1.0
    } else if t < 0.5 {
        -(2f64.powf(20.0 * t - 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin()) / 2.0
    } else {
        (2f64.powf(-20.0 * t + 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin()) / 2.0 + 1.0
    }
}

pub fn in_bounce(t: f64) -> f64 {
    1.0 - out_bounce(1.0 - t)
}

pub fn out_bounce(t: f64) -> f64 {
    const N1: f64 = 7.5625;
    const D1: f64 = 2.75;
    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

pub fn in_out_bounce(t: f64) -> f64 {
    if t < 0.5 {
        (1.0 - out_bounce(1.0 - 2.0 * t)) / 2.0
    } else {
        (1.0 + out_bounce(2.0 * t - 1.0)) / 2.0
    }
}
