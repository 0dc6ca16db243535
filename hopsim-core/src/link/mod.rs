mod id;

use crate::{defaults, node::Position};
use std::fmt;
use thiserror::Error;

pub use self::id::LinkId;

/// Decides whether two stations can hear each other.
///
/// A `LinkModel` is a pure function of the two positions and of the
/// parameters of the variant: it has no hidden state and does not depend on
/// time. Every variant is symmetric, `reachable(a, b) == reachable(b, a)`.
///
/// # Example
///
/// ```
/// use hopsim_core::{link::LinkModel, node::Position};
///
/// let model = LinkModel::range_threshold(120.0).unwrap();
///
/// let ue1 = Position::on_x_axis(0.0);
/// let relay = Position::on_x_axis(40.0);
/// let ue2 = Position::on_x_axis(160.0);
///
/// assert!(model.reachable(&ue1, &relay));
/// assert!(!model.reachable(&ue1, &ue2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinkModel {
    /// Every pair of stations can communicate.
    Unbounded,
    /// Stations communicate if they are at most `max_range_m` meters apart.
    ///
    /// Use [`LinkModel::range_threshold`] to construct this variant, it
    /// validates the range.
    RangeThreshold { max_range_m: f64 },
    /// Stations communicate if the power received over a log-distance
    /// path loss is at least the receiver sensitivity.
    ///
    /// ```text
    /// loss(d) = L0                               if d <= d0
    ///         = L0 + 10 * n * log10(d / d0)      otherwise
    /// reachable  <=>  tx_power - loss(d) >= rx_sensitivity
    /// ```
    LogDistance(LogDistance),
}

/// Parameters of the [`LinkModel::LogDistance`] power budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogDistance {
    pub tx_power_dbm: f64,
    pub rx_sensitivity_dbm: f64,
    /// `L0`, the path loss at the reference distance
    pub reference_loss_db: f64,
    /// `d0`, in meters
    pub reference_distance_m: f64,
    /// `n`, the path loss exponent
    pub exponent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum LinkModelError {
    #[error("maximum range must be finite and non negative, got {0}")]
    InvalidRange(f64),
    #[error("path loss exponent and reference distance must be strictly positive")]
    InvalidLogDistance,
}

impl Default for LinkModel {
    fn default() -> Self {
        Self::LogDistance(LogDistance::default())
    }
}

impl LinkModel {
    /// Create a [`LinkModel::RangeThreshold`] with a validated range.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_range_m` is NaN, infinite or negative.
    pub fn range_threshold(max_range_m: f64) -> Result<Self, LinkModelError> {
        if !max_range_m.is_finite() || max_range_m < 0.0 {
            return Err(LinkModelError::InvalidRange(max_range_m));
        }
        Ok(Self::RangeThreshold { max_range_m })
    }

    /// Create a [`LinkModel::LogDistance`] with validated parameters.
    pub fn log_distance(params: LogDistance) -> Result<Self, LinkModelError> {
        if !(params.exponent > 0.0 && params.reference_distance_m > 0.0) {
            return Err(LinkModelError::InvalidLogDistance);
        }
        Ok(Self::LogDistance(params))
    }

    /// Returns `true` if stations at `a` and `b` can exchange packets.
    pub fn reachable(&self, a: &Position, b: &Position) -> bool {
        let distance = a.distance_to(b);
        match self {
            Self::Unbounded => true,
            Self::RangeThreshold { max_range_m } => distance <= *max_range_m,
            Self::LogDistance(params) => params.rx_power_dbm(distance) >= params.rx_sensitivity_dbm,
        }
    }

    /// The largest distance at which two stations are still reachable,
    /// `None` for [`LinkModel::Unbounded`].
    pub fn max_range_m(&self) -> Option<f64> {
        match self {
            Self::Unbounded => None,
            Self::RangeThreshold { max_range_m } => Some(*max_range_m),
            Self::LogDistance(params) => Some(params.max_range_m()),
        }
    }
}

impl LogDistance {
    /// Power received at `distance_m` meters from the transmitter.
    pub fn rx_power_dbm(&self, distance_m: f64) -> f64 {
        self.tx_power_dbm - self.path_loss_db(distance_m)
    }

    pub fn path_loss_db(&self, distance_m: f64) -> f64 {
        if distance_m <= self.reference_distance_m {
            self.reference_loss_db
        } else {
            self.reference_loss_db
                + 10.0 * self.exponent * (distance_m / self.reference_distance_m).log10()
        }
    }

    /// Distance at which the received power equals the sensitivity.
    pub fn max_range_m(&self) -> f64 {
        let budget = self.tx_power_dbm - self.rx_sensitivity_dbm - self.reference_loss_db;
        if budget < 0.0 {
            return 0.0;
        }
        self.reference_distance_m * 10f64.powf(budget / (10.0 * self.exponent))
    }
}

impl Default for LogDistance {
    fn default() -> Self {
        Self {
            tx_power_dbm: defaults::DEFAULT_TX_POWER_DBM,
            rx_sensitivity_dbm: defaults::DEFAULT_RX_SENSITIVITY_DBM,
            reference_loss_db: defaults::DEFAULT_REFERENCE_LOSS_DB,
            reference_distance_m: defaults::DEFAULT_REFERENCE_DISTANCE_M,
            exponent: defaults::DEFAULT_PATH_LOSS_EXPONENT,
        }
    }
}

impl fmt::Display for LinkModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => write!(f, "unbounded"),
            Self::RangeThreshold { max_range_m } => write!(f, "range <= {max_range_m}m"),
            Self::LogDistance(params) => write!(
                f,
                "log-distance (tx {}dBm, sensitivity {}dBm, range ~{:.1}m)",
                params.tx_power_dbm,
                params.rx_sensitivity_dbm,
                params.max_range_m()
            ),
        }
    }
}
